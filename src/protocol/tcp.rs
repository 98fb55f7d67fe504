// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! TCP transport for Kasa devices.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::Instant;

use crate::error::ProtocolError;
use crate::protocol::{Transport, codec};

// ============================================================================
// ClientConfig - Connection parameters for direct commands
// ============================================================================

/// Connection parameters for talking to a device.
///
/// Each command opens its own connection, so there is nothing here beyond
/// where to connect and how long to wait.
///
/// # Examples
///
/// ```
/// use kasa_lan::protocol::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new();
/// assert_eq!(config.port(), 9999);
/// assert_eq!(config.timeout(), Duration::from_secs(5));
///
/// let config = ClientConfig::new()
///     .with_port(10_000)
///     .with_timeout(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    port: u16,
    timeout: Duration,
}

impl ClientConfig {
    /// Port every device listens on.
    pub const DEFAULT_PORT: u16 = 9999;
    /// Overall deadline for one direct command.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a configuration with the default port and timeout.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            port: Self::DEFAULT_PORT,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the overall timeout of one exchange.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Creates a `TcpTransport` connecting to this configuration's port.
    #[must_use]
    pub const fn into_transport(self) -> TcpTransport {
        TcpTransport::with_port(self.port)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TcpTransport
// ============================================================================

/// Talks to devices over plain TCP.
///
/// Every exchange connects, writes one frame, reads one frame and drops the
/// socket. The timeout covers the whole exchange.
///
/// # Examples
///
/// ```no_run
/// use kasa_lan::protocol::{TcpTransport, Transport};
/// use std::time::Duration;
///
/// # async fn example() -> kasa_lan::Result<()> {
/// let transport = TcpTransport::new();
/// let body = transport
///     .send(
///         "192.168.0.102".parse().unwrap(),
///         r#"{"system":{"get_sysinfo":{}}}"#,
///         Duration::from_secs(5),
///     )
///     .await?;
/// println!("{body}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpTransport {
    port: u16,
}

impl TcpTransport {
    /// Creates a transport for the standard port.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_port(ClientConfig::DEFAULT_PORT)
    }

    /// Creates a transport for a non-standard port.
    #[must_use]
    pub const fn with_port(port: u16) -> Self {
        Self { port }
    }

    /// Returns the port devices are contacted on.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    async fn round_trip(
        &self,
        addr: IpAddr,
        command: &str,
        timeout: Duration,
    ) -> Result<String, ProtocolError> {
        let target = SocketAddr::new(addr, self.port);
        let deadline = Instant::now() + timeout;
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

        let mut stream = tokio::time::timeout_at(deadline, TcpStream::connect(target))
            .await
            .map_err(|_| {
                ProtocolError::ConnectionFailed(format!("{target}: timed out after {millis} ms"))
            })?
            .map_err(|e| ProtocolError::ConnectionFailed(format!("{target}: {e}")))?;

        let request = codec::encode(command);
        tracing::debug!(%target, bytes = request.len(), "Sending command");

        let frame = tokio::time::timeout_at(deadline, async {
            stream.write_all(&request).await?;
            codec::read_frame(&mut stream).await
        })
        .await
        .map_err(|_| ProtocolError::Timeout(millis))??;

        let response = codec::decode(&frame);
        tracing::debug!(%target, bytes = frame.len(), "Received response");
        tracing::trace!(%target, body = %response, "Decoded response");

        Ok(response)
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for TcpTransport {
    async fn exchange(
        &self,
        addr: IpAddr,
        command: &str,
        timeout: Duration,
    ) -> Result<String, ProtocolError> {
        self.round_trip(addr, command, timeout).await
    }
}
