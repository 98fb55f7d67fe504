// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Energy meter readings.

use std::fmt;

use serde::Serialize;

use crate::error::ParseError;
use crate::response::extract::raw_value;

/// One energy meter reading, always in base units.
///
/// Older firmware reports `current`, `voltage` and `power` in A, V and W.
/// Newer firmware (e.g. KP115) reports `current_ma`, `voltage_mv` and
/// `power_mw`; those are scaled down by 1000 on parsing.
///
/// # Examples
///
/// ```
/// use kasa_lan::response::Telemetry;
///
/// let body = r#"{"emeter":{"get_realtime":{"current_ma":65,"voltage_mv":230512,"power_mw":15000,"total_wh":12,"err_code":0}}}"#;
/// let reading = Telemetry::parse(body).unwrap();
/// assert!((reading.power - 15.0).abs() < 1e-9);
/// assert!((reading.voltage - 230.512).abs() < 1e-9);
/// assert!(reading.is_plausible());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Telemetry {
    /// Current in amperes.
    pub current: f64,
    /// Voltage in volts.
    pub voltage: f64,
    /// Active power in watts.
    pub power: f64,
}

/// Field names and truncation widths of one unit scale.
struct Layout {
    current: &'static str,
    voltage: &'static str,
    power: &'static str,
    scale: f64,
}

const BASE_UNITS: Layout = Layout {
    current: "current",
    voltage: "voltage",
    power: "power",
    scale: 1.0,
};

const MILLI_UNITS: Layout = Layout {
    current: "current_ma",
    voltage: "voltage_mv",
    power: "power_mw",
    scale: 0.001,
};

/// Significant characters kept from the current and voltage tokens.
const CURRENT_WIDTH: usize = 6;
const VOLTAGE_WIDTH: usize = 6;
/// Significant characters kept from the power token.
const POWER_WIDTH: usize = 7;

impl Telemetry {
    /// Readings above this many watts are treated as spurious.
    pub const PLAUSIBLE_POWER_LIMIT: f64 = 2500.0;

    /// Extracts a reading from a decoded `emeter.get_realtime` response.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingField` if a reading is absent and
    /// `ParseError::InvalidValue` if one is not a non-negative number.
    pub fn parse(response: &str) -> Result<Self, ParseError> {
        let layout = if response.contains(r#""power_mw""#) {
            &MILLI_UNITS
        } else {
            &BASE_UNITS
        };

        Ok(Self {
            current: reading(response, layout.current, CURRENT_WIDTH)? * layout.scale,
            voltage: reading(response, layout.voltage, VOLTAGE_WIDTH)? * layout.scale,
            power: reading(response, layout.power, POWER_WIDTH)? * layout.scale,
        })
    }

    /// Returns `false` if the power value exceeds
    /// [`PLAUSIBLE_POWER_LIMIT`](Self::PLAUSIBLE_POWER_LIMIT).
    #[must_use]
    pub fn is_plausible(&self) -> bool {
        self.power <= Self::PLAUSIBLE_POWER_LIMIT
    }
}

impl fmt::Display for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:6.3}A  {:5.1}V {:6.1}W",
            self.current, self.voltage, self.power
        )
    }
}

fn reading(response: &str, key: &str, width: usize) -> Result<f64, ParseError> {
    let token = raw_value(response, key).ok_or_else(|| ParseError::MissingField(key.into()))?;
    let digits: String = token.chars().take(width).collect();

    let value: f64 = digits.parse().map_err(|_| ParseError::InvalidValue {
        field: key.into(),
        message: format!("expected a number, found {token}"),
    })?;

    if !value.is_finite() || value < 0.0 {
        return Err(ParseError::InvalidValue {
            field: key.into(),
            message: format!("expected a non-negative reading, found {token}"),
        });
    }
    Ok(value)
}
