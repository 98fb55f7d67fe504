// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Kasa command definitions.
//!
//! Commands are JSON documents addressed to a module (`system`, `emeter`,
//! `smartlife.iot.dimmer`) and a method within it.
//!
//! | Command Type | Purpose | Wire form |
//! |-------------|---------|-----------|
//! | [`RelayCommand`] | Switch a relay or one child outlet | `system.set_relay_state` |
//! | [`DimmerCommand`] | Set brightness and relay together | `smartlife.iot.dimmer.set_brightness` |
//! | [`SysInfoCommand`] | Query identity and relay state | `system.get_sysinfo` |
//! | [`RealtimeCommand`] | Query the energy meter | `emeter.get_realtime` |
//! | [`RawCommand`] | Send arbitrary JSON text | as given |
//!
//! # Examples
//!
//! ```
//! use kasa_lan::command::{Command, RelayCommand};
//! use kasa_lan::types::RelayState;
//!
//! let cmd = RelayCommand::new(RelayState::On);
//! assert_eq!(cmd.to_json(), r#"{"system":{"set_relay_state":{"state":1}}}"#);
//! ```

mod query;
mod relay;

pub use query::{RealtimeCommand, SysInfoCommand};
pub use relay::{DimmerCommand, RelayCommand};

/// A command that can be sent to a Kasa device.
pub trait Command {
    /// Returns the JSON request body.
    fn to_json(&self) -> String;
}

/// A command given as literal JSON text.
///
/// The text is sent unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommand(String);

impl RawCommand {
    /// Wraps a JSON request body.
    #[must_use]
    pub fn new(json: impl Into<String>) -> Self {
        Self(json.into())
    }
}

impl Command for RawCommand {
    fn to_json(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_command_is_sent_verbatim() {
        let cmd = RawCommand::new(r#"{"system":{"reboot":{"delay":1}}}"#);
        assert_eq!(cmd.to_json(), r#"{"system":{"reboot":{"delay":1}}}"#);
    }
}
