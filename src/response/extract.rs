// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Targeted field extraction from raw responses.
//!
//! Device firmware does not always emit strictly valid JSON, so these helpers
//! locate a known key by substring search and read the value that follows
//! it. Anything else in the response is ignored; only a missing requested
//! field is an error.

use serde::Serialize;

use crate::error::ParseError;
use crate::types::RelayState;

/// Relay state(s) reported by a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RelayStates {
    /// A single-relay device.
    Single(RelayState),
    /// A multi-outlet device, one entry per child outlet in document order.
    Outlets(Vec<RelayState>),
}

impl RelayStates {
    /// Returns the states as a slice, one entry per relay.
    #[must_use]
    pub fn as_slice(&self) -> &[RelayState] {
        match self {
            Self::Single(state) => std::slice::from_ref(state),
            Self::Outlets(states) => states,
        }
    }
}

/// Identity fields of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// User-assigned name.
    pub alias: String,
    /// Model identifier.
    pub model: String,
    /// Wi-Fi signal strength in dBm.
    pub rssi: i32,
}

/// Returns the raw value token following `"key":`.
///
/// Strings are returned with their quotes; numbers and literals end at the
/// next `,`, `}` or `]`.
///
/// # Examples
///
/// ```
/// use kasa_lan::response::extract::raw_value;
///
/// let body = r#"{"alias":"Desk \"lamp\"","rssi":-61,"err_code":0}"#;
/// assert_eq!(raw_value(body, "rssi"), Some("-61"));
/// assert_eq!(raw_value(body, "alias"), Some(r#""Desk \"lamp\"""#));
/// assert_eq!(raw_value(body, "model"), None);
/// ```
#[must_use]
pub fn raw_value<'a>(response: &'a str, key: &str) -> Option<&'a str> {
    let anchor = format!("\"{key}\":");
    let start = response.find(&anchor)? + anchor.len();
    let rest = response[start..].trim_start();

    if rest.starts_with('"') {
        let mut escaped = false;
        for (i, c) in rest.char_indices().skip(1) {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => return Some(&rest[..=i]),
                _ => {}
            }
        }
        None
    } else {
        let end = rest
            .find([',', '}', ']'])
            .unwrap_or(rest.len());
        let token = rest[..end].trim_end();
        (!token.is_empty()).then_some(token)
    }
}

/// Extracts a string field.
///
/// # Errors
///
/// Returns `ParseError::MissingField` if the key is absent and
/// `ParseError::InvalidValue` if its value is not a string.
pub fn string_field(response: &str, key: &str) -> Result<String, ParseError> {
    let token = raw_value(response, key).ok_or_else(|| ParseError::MissingField(key.into()))?;
    serde_json::from_str(token).map_err(|e| ParseError::InvalidValue {
        field: key.into(),
        message: e.to_string(),
    })
}

/// Extracts an integer field.
///
/// # Errors
///
/// Returns `ParseError::MissingField` if the key is absent and
/// `ParseError::InvalidValue` if its value is not an integer.
pub fn int_field(response: &str, key: &str) -> Result<i64, ParseError> {
    let token = raw_value(response, key).ok_or_else(|| ParseError::MissingField(key.into()))?;
    token.parse().map_err(|_| ParseError::InvalidValue {
        field: key.into(),
        message: format!("expected an integer, found {token}"),
    })
}

/// Extracts the device alias.
///
/// # Errors
///
/// See [`string_field`].
pub fn alias(response: &str) -> Result<String, ParseError> {
    string_field(response, "alias")
}

/// Extracts the model identifier, e.g. `HS110(EU)`.
///
/// # Errors
///
/// See [`string_field`].
pub fn model(response: &str) -> Result<String, ParseError> {
    string_field(response, "model")
}

/// Extracts the Wi-Fi signal strength in dBm.
///
/// # Errors
///
/// See [`int_field`].
pub fn rssi(response: &str) -> Result<i32, ParseError> {
    let value = int_field(response, "rssi")?;
    i32::try_from(value).map_err(|e| ParseError::InvalidValue {
        field: "rssi".into(),
        message: e.to_string(),
    })
}

/// Extracts alias, model and signal strength.
///
/// # Errors
///
/// Fails if any of the three fields is missing or malformed.
pub fn identity(response: &str) -> Result<Identity, ParseError> {
    Ok(Identity {
        alias: alias(response)?,
        model: model(response)?,
        rssi: rssi(response)?,
    })
}

/// Extracts the state of a single-relay device.
///
/// # Errors
///
/// Returns `ParseError::MissingField` if the response has no `relay_state`.
pub fn relay_state(response: &str) -> Result<RelayState, ParseError> {
    let anchor = r#""relay_state":"#;
    let start = response
        .find(anchor)
        .ok_or_else(|| ParseError::MissingField("relay_state".into()))?;
    digit_state(&response[start + anchor.len()..], "relay_state")
}

/// Extracts the per-outlet states of a multi-outlet device.
///
/// Every `"state":` occurrence contributes one entry, in document order.
///
/// # Errors
///
/// Returns `ParseError::MissingField` if no `state` field occurs.
pub fn child_states(response: &str) -> Result<Vec<RelayState>, ParseError> {
    let states = response
        .split(r#""state":"#)
        .skip(1)
        .map(|segment| digit_state(segment, "state"))
        .collect::<Result<Vec<_>, _>>()?;

    if states.is_empty() {
        return Err(ParseError::MissingField("state".into()));
    }
    Ok(states)
}

/// Extracts relay state from a system-info response.
///
/// Single-relay devices report a flat `relay_state`; multi-outlet devices
/// report one `state` per child instead.
///
/// # Errors
///
/// Returns `ParseError::MissingField` if neither form is present.
///
/// # Examples
///
/// ```
/// use kasa_lan::response::extract::{relay_states, RelayStates};
/// use kasa_lan::types::RelayState::{Off, On};
///
/// let plug = r#"{"system":{"get_sysinfo":{"relay_state":1,"err_code":0}}}"#;
/// assert_eq!(relay_states(plug).unwrap(), RelayStates::Single(On));
///
/// let strip = r#"{"children":[{"state":1},{"state":0},{"state":1}],"err_code":0}"#;
/// assert_eq!(relay_states(strip).unwrap(), RelayStates::Outlets(vec![On, Off, On]));
/// ```
pub fn relay_states(response: &str) -> Result<RelayStates, ParseError> {
    if response.contains(r#""relay_state":"#) {
        relay_state(response).map(RelayStates::Single)
    } else {
        child_states(response).map(RelayStates::Outlets)
    }
}

fn digit_state(rest: &str, field: &str) -> Result<RelayState, ParseError> {
    let rest = rest.trim_start();
    rest.chars()
        .next()
        .and_then(|c| c.to_digit(10))
        .and_then(|d| u8::try_from(d).ok())
        .and_then(RelayState::from_num)
        .ok_or_else(|| ParseError::InvalidValue {
            field: field.into(),
            message: format!(
                "expected 0 or 1, found {:?}",
                rest.chars().take(8).collect::<String>()
            ),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RelayState::{Off, On};

    const PLUG: &str = r#"{"system":{"get_sysinfo":{"sw_ver":"1.5.4 Build 180815 Rel.121440","hw_ver":"2.0","model":"HS110(EU)","deviceId":"8006","alias":"Fridge","relay_state":0,"on_time":0,"rssi":-57,"led_off":0,"err_code":0}}}"#;

    const STRIP: &str = r#"{"system":{"get_sysinfo":{"model":"KP200(US)","alias":"TP-LINK_Power Strip_1A2B","child_num":3,"children":[{"id":"800601","state":1,"alias":"Lamp","on_time":12},{"id":"800602","state":0,"alias":"Fan","on_time":0},{"id":"800603","state":1,"alias":"Radio","on_time":40}],"rssi":-48,"err_code":0}}}"#;

    #[test]
    fn single_relay_state() {
        assert_eq!(relay_state(PLUG).unwrap(), Off);
        assert_eq!(relay_states(PLUG).unwrap(), RelayStates::Single(Off));
    }

    #[test]
    fn multi_outlet_states_in_document_order() {
        assert_eq!(child_states(STRIP).unwrap(), vec![On, Off, On]);
        assert_eq!(
            relay_states(STRIP).unwrap().as_slice(),
            &[On, Off, On]
        );
    }

    #[test]
    fn relay_state_is_not_mistaken_for_child_state() {
        assert!(matches!(
            child_states(PLUG),
            Err(ParseError::MissingField(_))
        ));
    }

    #[test]
    fn missing_state_fields() {
        let err = relay_states(r#"{"system":{"get_sysinfo":{"err_code":0}}}"#).unwrap_err();
        assert!(matches!(err, ParseError::MissingField(f) if f == "state"));
    }

    #[test]
    fn non_digit_state_is_invalid() {
        let err = relay_state(r#"{"relay_state":"on"}"#).unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { .. }));
    }

    #[test]
    fn identity_fields() {
        assert_eq!(alias(PLUG).unwrap(), "Fridge");
        assert_eq!(model(PLUG).unwrap(), "HS110(EU)");
        assert_eq!(rssi(PLUG).unwrap(), -57);
    }

    #[test]
    fn identity_of_strip_uses_device_alias() {
        let id = identity(STRIP).unwrap();
        assert_eq!(id.alias, "TP-LINK_Power Strip_1A2B");
        assert_eq!(id.model, "KP200(US)");
        assert_eq!(id.rssi, -48);
    }

    #[test]
    fn string_field_unescapes() {
        let body = r#"{"alias":"Café \"corner\""}"#;
        assert_eq!(alias(body).unwrap(), "Café \"corner\"");
    }

    #[test]
    fn raw_value_tolerates_whitespace_and_trailing_structure() {
        let body = r#"{ "rssi": -70 , "x":[1,2]}"#;
        assert_eq!(raw_value(body, "rssi"), Some("-70"));
        assert_eq!(int_field(body, "rssi").unwrap(), -70);
    }

    #[test]
    fn wrong_type_is_invalid_value() {
        let err = int_field(PLUG, "alias").unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { field, .. } if field == "alias"));
    }
}
