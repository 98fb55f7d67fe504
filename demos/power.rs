// SPDX-License-Identifier: MPL-2.0

//! Power monitoring example.
//!
//! Prints a timestamped current/voltage/power line roughly once a second
//! until the sample count is reached or Ctrl-C is pressed.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example power -- <host> [count]
//! ```
//!
//! # Example
//!
//! ```bash
//! cargo run --example power -- 192.168.0.102 60
//! ```

use std::env;

use kasa_lan::{Device, MonitorOptions, PowerMonitor};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <host> [count]", args[0]);
        eprintln!();
        eprintln!("Example:");
        eprintln!("  cargo run --example power -- 192.168.0.102 60");
        std::process::exit(1);
    }

    let device = match Device::parse(&args[1]) {
        Ok(device) => device,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(e.exit_code());
        }
    };

    let mut options = MonitorOptions::new();
    if let Some(count) = args.get(2).and_then(|c| c.parse().ok()) {
        options = options.with_count(count);
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let monitor = PowerMonitor::new(device, options);
    if let Err(e) = monitor.run(&cancel, |sample| println!("{sample}")).await {
        eprintln!("{e}");
        std::process::exit(e.exit_code());
    }
}
