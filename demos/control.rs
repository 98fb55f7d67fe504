// SPDX-License-Identifier: MPL-2.0

//! Single-device control example.
//!
//! Exits with 100 if the device cannot be reached, 101 if the exchange
//! fails midway and 102 if the device rejects the command.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example control -- <host> on|off [child_id]
//! cargo run --example control -- <host> dimmer <0-100>
//! cargo run --example control -- <host> state|info
//! cargo run --example control -- <host> raw [json]
//! ```
//!
//! # Example
//!
//! ```bash
//! cargo run --example control -- 192.168.0.102 on
//! cargo run --example control -- 192.168.0.110 off 8006C3D401
//! cargo run --example control -- 192.168.0.121 dimmer 40
//! RUST_LOG=kasa_lan=trace cargo run --example control -- 192.168.0.102 raw '{"system":{"get_sysinfo":{}}}'
//! ```

use std::env;

use kasa_lan::response::pretty;
use kasa_lan::{Brightness, Device, RelayState, RelayStates};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        usage(&args[0]);
    }

    if let Err(e) = run(&args[1], &args[2], args.get(3).map(String::as_str)).await {
        eprintln!("{e}");
        std::process::exit(e.exit_code());
    }
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} <host> on|off [child_id]");
    eprintln!("       {program} <host> dimmer <0-100>");
    eprintln!("       {program} <host> state|info");
    eprintln!("       {program} <host> raw [json]");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  cargo run --example control -- 192.168.0.102 on");
    std::process::exit(1);
}

async fn run(host: &str, action: &str, arg: Option<&str>) -> kasa_lan::Result<()> {
    let device = Device::parse(host)?;

    match (action, arg) {
        ("on" | "off", child) => {
            let state = if action == "on" {
                RelayState::On
            } else {
                RelayState::Off
            };
            match child {
                Some(child) => device.set_child_relay(child, state).await?,
                None => device.set_relay(state).await?,
            }
        }
        ("dimmer", Some(level)) => {
            let Ok(level) = level.parse::<u8>() else {
                eprintln!("Brightness must be a number between 0 and 100");
                std::process::exit(1);
            };
            device
                .set_dimmer(Brightness::new(level)?, RelayState::On)
                .await?;
        }
        ("state", _) => match device.relay_states().await? {
            RelayStates::Single(state) => println!("{state}"),
            RelayStates::Outlets(states) => {
                for (i, state) in states.iter().enumerate() {
                    println!("outlet {i}: {state}");
                }
            }
        },
        ("info", _) => println!("{}", pretty(&device.sysinfo_raw().await?)),
        ("raw", json) => {
            let json = json.unwrap_or(r#"{"system":{"get_sysinfo":{}}}"#);
            println!("{}", pretty(&device.send_raw(json).await?));
        }
        _ => {
            eprintln!("Unknown or incomplete action: {action}");
            std::process::exit(1);
        }
    }
    Ok(())
}
