// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Protocol implementation for talking to Kasa devices.
//!
//! Devices listen on TCP port 9999. Every command is a single
//! request/response exchange on a fresh connection that is closed as soon
//! as the response has been read.
//!
//! - [`codec`]: the length-prefixed XOR framing.
//! - [`TcpTransport`]: the production [`Transport`].
//! - [`ClientConfig`]: port and timeout for direct commands.

pub mod codec;
mod tcp;

pub use tcp::{ClientConfig, TcpTransport};

use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;

use crate::command::Command;
use crate::error::{DeviceError, Error, ProtocolError};

/// Substring every accepted response carries somewhere in its body.
pub const SUCCESS_MARKER: &str = r#""err_code":0"#;

/// A way of performing one request/response exchange with a device.
///
/// [`TcpTransport`] is the real implementation. Tests substitute their own
/// to script responses and timing.
pub trait Transport: Send + Sync {
    /// Sends `command` to the device at `addr` and returns the decoded
    /// response text.
    ///
    /// Implementations must finish (successfully or not) within `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the device cannot be reached or the
    /// exchange fails.
    fn exchange(
        &self,
        addr: IpAddr,
        command: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<String, ProtocolError>> + Send;

    /// Performs an exchange and checks the response for [`SUCCESS_MARKER`].
    ///
    /// # Errors
    ///
    /// Returns `Error::Protocol` on network failure and
    /// `Error::Device(DeviceError::CommandRejected)` if the device answered
    /// without a zero error code.
    fn send(
        &self,
        addr: IpAddr,
        command: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<String, Error>> + Send {
        async move {
            let response = self.exchange(addr, command, timeout).await?;
            ensure_success(response)
        }
    }

    /// Sends a typed command. See [`Transport::send`].
    ///
    /// # Errors
    ///
    /// Same as [`Transport::send`].
    fn send_command<C: Command + Sync>(
        &self,
        addr: IpAddr,
        command: &C,
        timeout: Duration,
    ) -> impl Future<Output = Result<String, Error>> + Send {
        async move { self.send(addr, &command.to_json(), timeout).await }
    }
}

/// Accepts a response carrying [`SUCCESS_MARKER`], rejects anything else.
///
/// # Errors
///
/// Returns `DeviceError::CommandRejected` holding the response verbatim.
///
/// # Examples
///
/// ```
/// use kasa_lan::protocol::ensure_success;
///
/// assert!(ensure_success(r#"{"system":{"set_relay_state":{"err_code":0}}}"#.into()).is_ok());
/// assert!(ensure_success(r#"{"system":{"err_code":-2,"err_msg":"member not support"}}"#.into()).is_err());
/// ```
pub fn ensure_success(response: String) -> Result<String, Error> {
    if response.contains(SUCCESS_MARKER) {
        Ok(response)
    } else {
        tracing::warn!(response = %response, "Device rejected command");
        Err(DeviceError::CommandRejected { response }.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_marker_anywhere_is_accepted() {
        let body = r#"{"system":{"get_sysinfo":{"alias":"Lamp","relay_state":1,"err_code":0}}}"#;
        assert_eq!(ensure_success(body.to_string()).unwrap(), body);
    }

    #[test]
    fn nonzero_error_code_is_rejected() {
        let body = r#"{"system":{"set_relay_state":{"err_code":-1}}}"#;
        let err = ensure_success(body.to_string()).unwrap_err();
        match err {
            Error::Device(DeviceError::CommandRejected { response }) => assert_eq!(response, body),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_error_code_is_rejected() {
        let err = ensure_success(r#"{"system":{}}"#.to_string()).unwrap_err();
        assert!(err.is_rejected());
    }
}
