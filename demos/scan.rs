// SPDX-License-Identifier: MPL-2.0

//! Discovery example.
//!
//! Sweeps a /24 network and prints one line per device, in address order,
//! as soon as it is known. Ctrl-C stops the sweep.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example scan -- <subnet> [first] [last]
//! ```
//!
//! # Example
//!
//! ```bash
//! cargo run --example scan -- 192.168.0.0
//! RUST_LOG=kasa_lan=debug cargo run --example scan -- 10.0.1.0 2 254
//! ```

use std::env;
use std::net::Ipv4Addr;

use kasa_lan::{ScanOptions, Scanner};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() != 2 && args.len() != 4 {
        eprintln!("Usage: {} <subnet> [first] [last]", args[0]);
        eprintln!();
        eprintln!("Example:");
        eprintln!("  cargo run --example scan -- 192.168.0.0 100 254");
        std::process::exit(1);
    }

    let subnet: Ipv4Addr = args[1].parse()?;
    let mut options = ScanOptions::new(subnet);
    if args.len() == 4 {
        options = options.with_host_range(args[2].parse()?, args[3].parse()?)?;
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let (first, last) = options.host_range();
    eprintln!("Scanning {subnet} hosts {first}..={last}...");

    let devices = Scanner::new(options)
        .scan_each(&cancel, |device| println!("{device}"))
        .await?;

    eprintln!("{} device(s) found", devices.len());
    Ok(())
}
