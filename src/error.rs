// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `kasa_lan` library.
//!
//! Failures fall into four families:
//!
//! - [`ProtocolError`]: the device could not be reached, or the exchange
//!   failed on the wire (refused connection, timeout, I/O error).
//! - [`DeviceError`]: the device answered but rejected the command. The raw
//!   response is kept for diagnosis.
//! - [`ParseError`]: the response did not contain a field the caller needed.
//! - [`ValueError`]: a constructor argument was out of range.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The device could not be reached or the exchange failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while extracting a field from a response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The device answered but did not accept the command.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
}

impl Error {
    /// Returns `true` if the device was unreachable or the exchange failed
    /// on the wire.
    ///
    /// Discovery swallows these per address; direct commands surface them.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Protocol(e) if !matches!(e, ProtocolError::Cancelled))
    }

    /// Returns `true` if the device rejected the command.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Device(DeviceError::CommandRejected { .. }))
    }

    /// Returns `true` if the operation was aborted through a cancellation token.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Protocol(ProtocolError::Cancelled))
    }

    /// Returns the process exit code a command-line front end should use.
    ///
    /// | Failure | Code |
    /// |---------|------|
    /// | connection could not be opened | 100 |
    /// | send or receive failed | 101 |
    /// | device rejected the command | 102 |
    /// | anything else | 1 |
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Protocol(ProtocolError::ConnectionFailed(_) | ProtocolError::InvalidAddress(_)) => {
                100
            }
            Self::Protocol(ProtocolError::Timeout(_) | ProtocolError::Io(_)) => 101,
            Self::Device(DeviceError::CommandRejected { .. }) => 102,
            _ => 1,
        }
    }
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u16,
        /// Maximum allowed value.
        max: u16,
        /// The actual value that was provided.
        actual: u16,
    },

    /// An invalid relay state string was provided.
    #[error("invalid relay state: {0}")]
    InvalidRelayState(String),

    /// A host range whose start lies after its end.
    #[error("invalid host range {start}..={end}")]
    InvalidHostRange {
        /// First host octet.
        start: u8,
        /// Last host octet.
        end: u8,
    },
}

/// Errors raised while talking to a device over TCP.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The TCP connection could not be opened (refused, unroutable or timed out).
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Sending the request or receiving the response timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Sending the request or receiving the response failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid device address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The operation was aborted before it completed.
    #[error("operation cancelled")]
    Cancelled,
}

/// Errors related to extracting values from device responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Structural parsing of the response failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// Errors reported by the device itself.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The response did not carry a zero error code.
    #[error("command rejected: {response}")]
    CommandRejected {
        /// The decoded response, verbatim.
        response: String,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::OutOfRange {
            min: 0,
            max: 100,
            actual: 150,
        };
        assert_eq!(err.to_string(), "value 150 is out of range [0, 100]");
    }

    #[test]
    fn parse_error_display() {
        let err = ParseError::MissingField("relay_state".to_string());
        assert_eq!(err.to_string(), "missing field in response: relay_state");
    }

    #[test]
    fn rejected_error_keeps_response() {
        let err: Error = DeviceError::CommandRejected {
            response: r#"{"err_code":-1}"#.to_string(),
        }
        .into();
        assert!(err.is_rejected());
        assert!(!err.is_unreachable());
        assert!(err.to_string().contains(r#"{"err_code":-1}"#));
    }

    #[test]
    fn exit_codes_distinguish_failures() {
        let connect: Error = ProtocolError::ConnectionFailed("refused".into()).into();
        let timeout: Error = ProtocolError::Timeout(5000).into();
        let rejected: Error = DeviceError::CommandRejected {
            response: String::new(),
        }
        .into();
        let missing: Error = ParseError::MissingField("power".into()).into();

        assert_eq!(connect.exit_code(), 100);
        assert_eq!(timeout.exit_code(), 101);
        assert_eq!(rejected.exit_code(), 102);
        assert_eq!(missing.exit_code(), 1);
    }

    #[test]
    fn cancelled_is_not_unreachable() {
        let err: Error = ProtocolError::Cancelled.into();
        assert!(err.is_cancelled());
        assert!(!err.is_unreachable());
    }
}
