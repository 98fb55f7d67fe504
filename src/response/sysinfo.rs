// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! System information parsing and device summaries.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::types::{ChildId, RelayState};

/// Parsed `system.get_sysinfo` object.
///
/// Only the fields needed for identification are modelled; everything else
/// in the response is ignored.
///
/// # Examples
///
/// ```
/// use kasa_lan::response::SysInfo;
///
/// let body = r#"{"system":{"get_sysinfo":{"model":"HS100(UK)","alias":"Heater","rssi":-62,"relay_state":1,"err_code":0}}}"#;
/// let info = SysInfo::parse(body).unwrap();
/// assert_eq!(info.model, "HS100(UK)");
/// assert_eq!(info.rssi, -62);
/// assert!(info.children.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SysInfo {
    /// Model identifier, e.g. `HS110(EU)`.
    pub model: String,

    /// Wi-Fi signal strength in dBm.
    pub rssi: i32,

    /// User-assigned name of the device.
    #[serde(default)]
    pub alias: String,

    /// Device identifier.
    #[serde(default, rename = "deviceId")]
    pub device_id: String,

    /// Relay state of a single-relay device.
    #[serde(default)]
    pub relay_state: Option<RelayState>,

    /// Outlets of a multi-outlet device, in the order the device lists them.
    /// `None` if the response has no `children` key.
    #[serde(default)]
    pub children: Option<Vec<ChildInfo>>,
}

/// One outlet of a multi-outlet device.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChildInfo {
    /// Identifier used to address this outlet.
    pub id: ChildId,
    /// User-assigned name of the outlet.
    #[serde(default)]
    pub alias: String,
    /// Relay state of the outlet.
    pub state: RelayState,
}

#[derive(Deserialize)]
struct Envelope {
    system: SystemModule,
}

#[derive(Deserialize)]
struct SystemModule {
    get_sysinfo: SysInfo,
}

impl SysInfo {
    /// Parses a decoded `get_sysinfo` response.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if the response is not valid JSON or lacks
    /// `model`, `rssi` or a well-formed `children` list.
    pub fn parse(response: &str) -> Result<Self, ParseError> {
        let envelope: Envelope = serde_json::from_str(response)?;
        Ok(envelope.system.get_sysinfo)
    }

    /// Returns `true` for devices that report a `children` list, even an
    /// empty one.
    #[must_use]
    pub fn is_multi_outlet(&self) -> bool {
        self.children.is_some()
    }
}

/// Identity and state of one device found on the network.
///
/// For multi-outlet devices `alias` and `state` aggregate the children:
/// `"(Lamp,Fan)"` and `"(ON,off)"`. For single-relay devices `alias` is the
/// device alias and `state` is `"ON"` or empty.
///
/// # Examples
///
/// ```
/// use kasa_lan::response::{DeviceSummary, SysInfo};
///
/// let body = r#"{"system":{"get_sysinfo":{"model":"KP200(US)","rssi":-48,"children":[{"id":"01","state":1,"alias":"Lamp"},{"id":"02","state":0,"alias":"Fan"}],"err_code":0}}}"#;
/// let info = SysInfo::parse(body).unwrap();
/// let summary = DeviceSummary::from_sysinfo("192.168.0.120".parse().unwrap(), &info).unwrap();
///
/// assert_eq!(summary.alias, "(Lamp,Fan)");
/// assert_eq!(summary.state, "(ON,off)");
/// assert_eq!(summary.to_string(), "192.168.0.120, KP200(US), -48, (Lamp,Fan), (ON,off)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
    /// Address the device answered on.
    pub ip: IpAddr,
    /// Model identifier.
    pub model: String,
    /// Wi-Fi signal strength in dBm.
    pub rssi: i32,
    /// Device alias, or the parenthesized child aliases.
    pub alias: String,
    /// `"ON"`/empty, or the parenthesized child states.
    pub state: String,
}

impl DeviceSummary {
    /// Builds a summary from parsed system information.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingField` for a single-relay device without a
    /// `relay_state`.
    pub fn from_sysinfo(ip: IpAddr, info: &SysInfo) -> Result<Self, ParseError> {
        let (alias, state) = if let Some(children) = &info.children {
            let aliases = children
                .iter()
                .map(|child| child.alias.as_str())
                .collect::<Vec<_>>()
                .join(",");
            let states = children
                .iter()
                .map(|child| child.state.label())
                .collect::<Vec<_>>()
                .join(",");
            (format!("({aliases})"), format!("({states})"))
        } else {
            let relay = info
                .relay_state
                .ok_or_else(|| ParseError::MissingField("relay_state".into()))?;
            let state = if relay.is_on() { "ON" } else { "" };
            (info.alias.clone(), state.to_string())
        };

        Ok(Self {
            ip,
            model: info.model.clone(),
            rssi: info.rssi,
            alias,
            state,
        })
    }

    /// Parses a decoded `get_sysinfo` response into a summary.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingField` if the response carries no system
    /// information, otherwise as [`SysInfo::parse`] and
    /// [`DeviceSummary::from_sysinfo`].
    pub fn parse(ip: IpAddr, response: &str) -> Result<Self, ParseError> {
        if !response.contains(r#""get_sysinfo""#) {
            return Err(ParseError::MissingField("get_sysinfo".into()));
        }
        let info = SysInfo::parse(response)?;
        Self::from_sysinfo(ip, &info)
    }
}

impl fmt::Display for DeviceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {:3}, {}, {}",
            self.ip, self.model, self.rssi, self.alias, self.state
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLUG_ON: &str = r#"{"system":{"get_sysinfo":{"sw_ver":"1.2.5","model":"HS105(US)","alias":"Kettle","deviceId":"80061234","relay_state":1,"rssi":-9,"led_off":0,"latitude":0,"err_code":0}}}"#;

    fn ip() -> IpAddr {
        "192.168.0.105".parse().unwrap()
    }

    #[test]
    fn single_relay_summary() {
        let summary = DeviceSummary::parse(ip(), PLUG_ON).unwrap();
        assert_eq!(summary.model, "HS105(US)");
        assert_eq!(summary.alias, "Kettle");
        assert_eq!(summary.state, "ON");
        assert_eq!(summary.to_string(), "192.168.0.105, HS105(US),  -9, Kettle, ON");
    }

    #[test]
    fn single_relay_off_renders_empty() {
        let body = PLUG_ON.replace(r#""relay_state":1"#, r#""relay_state":0"#);
        let summary = DeviceSummary::parse(ip(), &body).unwrap();
        assert_eq!(summary.state, "");
    }

    #[test]
    fn sysinfo_fields() {
        let info = SysInfo::parse(PLUG_ON).unwrap();
        assert_eq!(info.device_id, "80061234");
        assert_eq!(info.relay_state, Some(RelayState::On));
        assert!(!info.is_multi_outlet());
    }

    #[test]
    fn children_keep_order() {
        let body = r#"{"system":{"get_sysinfo":{"model":"HS300(US)","rssi":-40,"alias":"Strip","children":[{"id":"A0","state":0,"alias":"TV"},{"id":"A1","state":1,"alias":"Lamp"},{"id":"A2","state":0,"alias":"Router"}],"err_code":0}}}"#;
        let info = SysInfo::parse(body).unwrap();
        let children = info.children.as_deref().unwrap();
        assert_eq!(children[1].id, ChildId::new("A1"));

        let summary = DeviceSummary::from_sysinfo(ip(), &info).unwrap();
        assert_eq!(summary.alias, "(TV,Lamp,Router)");
        assert_eq!(summary.state, "(off,ON,off)");
    }

    #[test]
    fn empty_children_list_is_still_multi_outlet() {
        let body = r#"{"system":{"get_sysinfo":{"model":"HS300(US)","rssi":-40,"alias":"Strip","children":[],"err_code":0}}}"#;
        let info = SysInfo::parse(body).unwrap();
        assert!(info.is_multi_outlet());

        let summary = DeviceSummary::from_sysinfo(ip(), &info).unwrap();
        assert_eq!(summary.alias, "()");
        assert_eq!(summary.state, "()");
        assert_eq!(summary.to_string(), "192.168.0.105, HS300(US), -40, (), ()");
    }

    #[test]
    fn missing_sysinfo_is_missing_field() {
        let err = DeviceSummary::parse(ip(), r#"{"emeter":{"err_code":0}}"#).unwrap_err();
        assert!(matches!(err, ParseError::MissingField(f) if f == "get_sysinfo"));
    }

    #[test]
    fn missing_model_is_json_error() {
        let body = r#"{"system":{"get_sysinfo":{"rssi":-50,"relay_state":0,"err_code":0}}}"#;
        assert!(matches!(
            DeviceSummary::parse(ip(), body),
            Err(ParseError::Json(_))
        ));
    }

    #[test]
    fn missing_relay_state_on_single_device() {
        let body = r#"{"system":{"get_sysinfo":{"model":"HS200","rssi":-50,"err_code":0}}}"#;
        assert!(matches!(
            DeviceSummary::parse(ip(), body),
            Err(ParseError::MissingField(f)) if f == "relay_state"
        ));
    }

    #[test]
    fn summary_serializes() {
        let summary = DeviceSummary::parse(ip(), PLUG_ON).unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["ip"], "192.168.0.105");
        assert_eq!(json["rssi"], -9);
    }
}
