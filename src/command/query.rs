// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Query commands.

use crate::command::Command;

/// Command to query the device's system information.
///
/// The response carries the alias, model, signal strength and relay state
/// (or the `children` list of a multi-outlet device).
///
/// # Examples
///
/// ```
/// use kasa_lan::command::{Command, SysInfoCommand};
///
/// assert_eq!(SysInfoCommand.to_json(), r#"{"system":{"get_sysinfo":{}}}"#);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SysInfoCommand;

impl SysInfoCommand {
    /// Wire form of the query.
    pub const JSON: &'static str = r#"{"system":{"get_sysinfo":{}}}"#;
}

impl Command for SysInfoCommand {
    fn to_json(&self) -> String {
        Self::JSON.to_string()
    }
}

/// Command to read the energy meter.
///
/// Only power-metering models answer this successfully. The response reports
/// current, voltage and power either in base units or, on newer firmware,
/// in milli-units (`current_ma`, `voltage_mv`, `power_mw`).
///
/// # Examples
///
/// ```
/// use kasa_lan::command::{Command, RealtimeCommand};
///
/// assert_eq!(RealtimeCommand.to_json(), r#"{"emeter":{"get_realtime":{}}}"#);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RealtimeCommand;

impl RealtimeCommand {
    /// Wire form of the query.
    pub const JSON: &'static str = r#"{"emeter":{"get_realtime":{}}}"#;
}

impl Command for RealtimeCommand {
    fn to_json(&self) -> String {
        Self::JSON.to_string()
    }
}
