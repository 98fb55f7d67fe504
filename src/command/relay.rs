// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relay and dimmer control commands.

use crate::command::Command;
use crate::types::{Brightness, ChildId, RelayState};

/// Command to switch a relay.
///
/// Without a child id the command targets the device's only relay. With one,
/// it targets a single outlet of a multi-outlet device.
///
/// # Examples
///
/// ```
/// use kasa_lan::command::{Command, RelayCommand};
/// use kasa_lan::types::RelayState;
///
/// let off = RelayCommand::new(RelayState::Off);
/// assert_eq!(off.to_json(), r#"{"system":{"set_relay_state":{"state":0}}}"#);
///
/// let child = RelayCommand::new(RelayState::On).for_child("80061E01");
/// assert_eq!(
///     child.to_json(),
///     r#"{"system":{"set_relay_state":{"state":1}},"context":{"child_ids":["80061E01"]}}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayCommand {
    state: RelayState,
    child: Option<ChildId>,
}

impl RelayCommand {
    /// Creates a command for the device's relay.
    #[must_use]
    pub const fn new(state: RelayState) -> Self {
        Self { state, child: None }
    }

    /// Creates a command to turn the relay on.
    #[must_use]
    pub const fn on() -> Self {
        Self::new(RelayState::On)
    }

    /// Creates a command to turn the relay off.
    #[must_use]
    pub const fn off() -> Self {
        Self::new(RelayState::Off)
    }

    /// Restricts the command to one child outlet.
    #[must_use]
    pub fn for_child(mut self, child: impl Into<ChildId>) -> Self {
        self.child = Some(child.into());
        self
    }

    /// Returns the requested state.
    #[must_use]
    pub const fn state(&self) -> RelayState {
        self.state
    }

    /// Returns the targeted child outlet, if any.
    #[must_use]
    pub fn child(&self) -> Option<&ChildId> {
        self.child.as_ref()
    }
}

impl Command for RelayCommand {
    fn to_json(&self) -> String {
        let body = format!(
            r#""system":{{"set_relay_state":{{"state":{}}}}}"#,
            self.state.as_num()
        );
        match &self.child {
            None => format!("{{{body}}}"),
            Some(child) => format!(
                r#"{{{body},"context":{{"child_ids":[{}]}}}}"#,
                json_string(child.as_str())
            ),
        }
    }
}

/// Command to set the brightness of a dimmer switch.
///
/// The relay state is sent in the same request; it defaults to on.
///
/// # Examples
///
/// ```
/// use kasa_lan::command::{Command, DimmerCommand};
/// use kasa_lan::types::Brightness;
///
/// let cmd = DimmerCommand::new(Brightness::new(40).unwrap());
/// assert_eq!(
///     cmd.to_json(),
///     r#"{"smartlife.iot.dimmer":{"set_brightness":{"brightness":40}},"system":{"set_relay_state":{"state":1}}}"#
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimmerCommand {
    brightness: Brightness,
    state: RelayState,
}

impl DimmerCommand {
    /// Creates a command that sets the brightness and turns the relay on.
    #[must_use]
    pub const fn new(brightness: Brightness) -> Self {
        Self {
            brightness,
            state: RelayState::On,
        }
    }

    /// Sets the relay state sent alongside the brightness.
    #[must_use]
    pub const fn with_state(mut self, state: RelayState) -> Self {
        self.state = state;
        self
    }

    /// Returns the requested brightness.
    #[must_use]
    pub const fn brightness(&self) -> Brightness {
        self.brightness
    }
}

impl Command for DimmerCommand {
    fn to_json(&self) -> String {
        format!(
            r#"{{"smartlife.iot.dimmer":{{"set_brightness":{{"brightness":{}}}}},"system":{{"set_relay_state":{{"state":{}}}}}}}"#,
            self.brightness.value(),
            self.state.as_num()
        )
    }
}

/// Quotes and escapes a string for inclusion in a JSON body.
fn json_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}
