// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relay types for Kasa switches.
//!
//! This module provides the on/off state of a relay and the identifier used
//! to address one outlet of a multi-outlet device.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// The on/off status of a switch output.
///
/// On the wire a relay state is a single digit: `0` for off, `1` for on.
///
/// # Examples
///
/// ```
/// use kasa_lan::types::RelayState;
///
/// assert_eq!(RelayState::On.as_num(), 1);
/// assert_eq!(RelayState::from_num(0), Some(RelayState::Off));
/// assert_eq!("on".parse::<RelayState>().unwrap(), RelayState::On);
/// assert_eq!(RelayState::Off.to_string(), "off");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RelayState {
    /// Relay is open.
    Off,
    /// Relay is closed.
    On,
}

impl RelayState {
    /// Returns the numeric value used on the wire.
    #[must_use]
    pub const fn as_num(&self) -> u8 {
        match self {
            Self::Off => 0,
            Self::On => 1,
        }
    }

    /// Converts a wire value into a state.
    #[must_use]
    pub const fn from_num(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Off),
            1 => Some(Self::On),
            _ => None,
        }
    }

    /// Returns the display label: `"ON"` when on, `"off"` when off.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "ON",
        }
    }

    /// Returns `true` if the relay is on.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RelayState {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "0" | "false" => Ok(Self::Off),
            "on" | "1" | "true" => Ok(Self::On),
            _ => Err(ValueError::InvalidRelayState(s.to_string())),
        }
    }
}

impl From<bool> for RelayState {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

impl TryFrom<u8> for RelayState {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_num(value).ok_or(ValueError::OutOfRange {
            min: 0,
            max: 1,
            actual: u16::from(value),
        })
    }
}

impl From<RelayState> for u8 {
    fn from(state: RelayState) -> Self {
        state.as_num()
    }
}

/// Identifier of one outlet on a multi-outlet device.
///
/// Child ids are opaque strings reported in the `children` list of the
/// device's system information.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChildId(String);

impl ChildId {
    /// Wraps a child identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChildId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ChildId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_state_from_str() {
        assert_eq!("ON".parse::<RelayState>().unwrap(), RelayState::On);
        assert_eq!("off".parse::<RelayState>().unwrap(), RelayState::Off);
        assert_eq!("1".parse::<RelayState>().unwrap(), RelayState::On);
        assert_eq!("false".parse::<RelayState>().unwrap(), RelayState::Off);
    }

    #[test]
    fn relay_state_from_str_invalid() {
        let result = "toggle".parse::<RelayState>();
        assert!(matches!(
            result.unwrap_err(),
            ValueError::InvalidRelayState(_)
        ));
    }

    #[test]
    fn relay_state_numeric() {
        assert_eq!(RelayState::from_num(1), Some(RelayState::On));
        assert_eq!(RelayState::from_num(2), None);
        assert!(RelayState::try_from(7).is_err());
        assert_eq!(u8::from(RelayState::On), 1);
    }

    #[test]
    fn relay_state_labels() {
        assert_eq!(RelayState::On.label(), "ON");
        assert_eq!(RelayState::Off.label(), "off");
        assert!(RelayState::from(true).is_on());
    }

    #[test]
    fn relay_state_serde_uses_digits() {
        assert_eq!(serde_json::to_string(&RelayState::On).unwrap(), "1");
        let state: RelayState = serde_json::from_str("0").unwrap();
        assert_eq!(state, RelayState::Off);
        assert!(serde_json::from_str::<RelayState>("3").is_err());
    }

    #[test]
    fn child_id_display() {
        let id = ChildId::from("8006AB01");
        assert_eq!(id.as_str(), "8006AB01");
        assert_eq!(id.to_string(), "8006AB01");
    }
}
