// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `kasa_lan` - A Rust library to control TP-Link Kasa devices on the LAN.
//!
//! Kasa smart plugs, power strips and dimmers accept JSON commands on TCP
//! port 9999, obfuscated with a byte-chained XOR cipher. This library speaks
//! that protocol directly, without any cloud account.
//!
//! # Supported Features
//!
//! - **Relay control**: Switch plugs on/off, per outlet on power strips
//! - **Dimmer control**: Brightness with on/off state
//! - **Status queries**: Alias, model, signal strength, relay states
//! - **Energy monitoring**: Current, voltage and power, in either unit scale
//! - **Discovery**: Concurrent subnet sweep with results in address order
//!
//! # Quick Start
//!
//! ## Switching a Plug
//!
//! ```no_run
//! use kasa_lan::Device;
//!
//! #[tokio::main]
//! async fn main() -> kasa_lan::Result<()> {
//!     let plug = Device::parse("192.168.0.102")?;
//!
//!     plug.power_on().await?;
//!     let id = plug.identity().await?;
//!     println!("{} ({}) at {} dBm", id.alias, id.model, id.rssi);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Reading the Energy Meter
//!
//! ```no_run
//! use kasa_lan::Device;
//!
//! #[tokio::main]
//! async fn main() -> kasa_lan::Result<()> {
//!     let plug = Device::parse("192.168.0.102")?;
//!
//!     // Re-reads once if the first value is above 2500 W
//!     let reading = plug.read_power_checked().await?;
//!     println!("{reading}");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Discovering Devices
//!
//! ```no_run
//! use kasa_lan::{ScanOptions, Scanner};
//! use std::net::Ipv4Addr;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> kasa_lan::Result<()> {
//!     let options = ScanOptions::new(Ipv4Addr::new(192, 168, 0, 0));
//!     let cancel = CancellationToken::new();
//!
//!     for device in Scanner::new(options).scan(&cancel).await? {
//!         println!("{device}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Errors
//!
//! Every fallible operation returns [`Error`]. Failures split into three
//! kinds callers usually handle differently: the device was unreachable
//! ([`Error::is_unreachable`]), the device refused the command
//! ([`Error::is_rejected`]), or the answer could not be interpreted
//! ([`Error::Parse`]). [`Error::exit_code`] maps them to process exit codes
//! for command-line tools.

pub mod command;
mod device;
pub mod discovery;
pub mod error;
mod monitor;
pub mod protocol;
pub mod response;
pub mod types;

pub use command::{
    Command, DimmerCommand, RawCommand, RealtimeCommand, RelayCommand, SysInfoCommand,
};
pub use device::Device;
pub use discovery::{ProbeOutcome, ScanOptions, Scanner, discover};
pub use error::{DeviceError, Error, ParseError, ProtocolError, Result, ValueError};
pub use monitor::{MonitorOptions, PowerMonitor, PowerSample};
pub use protocol::{ClientConfig, TcpTransport, Transport};
pub use response::{DeviceSummary, Identity, RelayStates, SysInfo, Telemetry};
pub use types::{Brightness, ChildId, RelayState};
