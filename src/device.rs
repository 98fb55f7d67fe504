// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! High-level handle for one Kasa device.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::command::{
    Command, DimmerCommand, RawCommand, RealtimeCommand, RelayCommand, SysInfoCommand,
};
use crate::error::{Error, ProtocolError};
use crate::protocol::{ClientConfig, TcpTransport, Transport};
use crate::response::{self, DeviceSummary, Identity, RelayStates, SysInfo, Telemetry};
use crate::types::{Brightness, ChildId, RelayState};

/// A Kasa device at a known address.
///
/// Every method is one independent request/response exchange on a fresh
/// connection. Nothing is cached between calls.
///
/// # Examples
///
/// ```no_run
/// use kasa_lan::Device;
///
/// # async fn example() -> kasa_lan::Result<()> {
/// let plug = Device::parse("192.168.0.102")?;
///
/// plug.power_on().await?;
/// println!("{:?}", plug.relay_states().await?);
///
/// let reading = plug.read_power_checked().await?;
/// println!("{reading}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Device<T: Transport = TcpTransport> {
    addr: IpAddr,
    transport: Arc<T>,
    timeout: Duration,
}

impl<T: Transport> Clone for Device<T> {
    fn clone(&self) -> Self {
        Self {
            addr: self.addr,
            transport: Arc::clone(&self.transport),
            timeout: self.timeout,
        }
    }
}

impl Device<TcpTransport> {
    /// Creates a handle using the default port and timeout.
    #[must_use]
    pub fn new(addr: impl Into<IpAddr>) -> Self {
        Self::with_config(addr, ClientConfig::default())
    }

    /// Creates a handle using a custom port and timeout.
    #[must_use]
    pub fn with_config(addr: impl Into<IpAddr>, config: ClientConfig) -> Self {
        Self::with_transport(addr, config.into_transport(), config.timeout())
    }

    /// Creates a handle from a textual IP address.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidAddress` if `host` is not an IP address.
    pub fn parse(host: &str) -> Result<Self, Error> {
        let addr: IpAddr = host
            .trim()
            .parse()
            .map_err(|_| ProtocolError::InvalidAddress(host.to_string()))?;
        Ok(Self::new(addr))
    }
}

impl<T: Transport> Device<T> {
    /// Creates a handle over an arbitrary transport.
    #[must_use]
    pub fn with_transport(addr: impl Into<IpAddr>, transport: T, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            transport: Arc::new(transport),
            timeout,
        }
    }

    /// Returns the device address.
    #[must_use]
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    /// Returns the per-command timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends a command and returns the decoded response.
    ///
    /// # Errors
    ///
    /// Returns `Error::Protocol` if the device is unreachable and
    /// `Error::Device` if it rejects the command.
    pub async fn send_command<C: Command + Sync>(&self, command: &C) -> Result<String, Error> {
        self.transport
            .send_command(self.addr, command, self.timeout)
            .await
    }

    /// Sends literal JSON text.
    ///
    /// # Errors
    ///
    /// Same as [`Device::send_command`].
    pub async fn send_raw(&self, json: &str) -> Result<String, Error> {
        self.send_command(&RawCommand::new(json)).await
    }

    /// Sends a command, giving up early if `cancel` fires.
    ///
    /// The connection is dropped as soon as cancellation is observed.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Cancelled` if cancelled, otherwise as
    /// [`Device::send_command`].
    pub async fn send_cancellable<C: Command + Sync>(
        &self,
        command: &C,
        cancel: &CancellationToken,
    ) -> Result<String, Error> {
        tokio::select! {
            () = cancel.cancelled() => Err(ProtocolError::Cancelled.into()),
            result = self.send_command(command) => result,
        }
    }

    // ========== Relay Control ==========

    /// Turns the relay on.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails.
    pub async fn power_on(&self) -> Result<(), Error> {
        self.set_relay(RelayState::On).await
    }

    /// Turns the relay off.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails.
    pub async fn power_off(&self) -> Result<(), Error> {
        self.set_relay(RelayState::Off).await
    }

    /// Sets the relay state.
    ///
    /// On a multi-outlet device this switches every outlet.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails.
    pub async fn set_relay(&self, state: RelayState) -> Result<(), Error> {
        self.send_command(&RelayCommand::new(state)).await?;
        tracing::debug!(addr = %self.addr, %state, "Relay switched");
        Ok(())
    }

    /// Sets the state of one outlet of a multi-outlet device.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails.
    pub async fn set_child_relay(
        &self,
        child: impl Into<ChildId>,
        state: RelayState,
    ) -> Result<(), Error> {
        let command = RelayCommand::new(state).for_child(child);
        self.send_command(&command).await?;
        tracing::debug!(addr = %self.addr, child = ?command.child(), %state, "Outlet switched");
        Ok(())
    }

    /// Sets the brightness of a dimmer switch together with its relay state.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails.
    pub async fn set_dimmer(&self, brightness: Brightness, state: RelayState) -> Result<(), Error> {
        self.send_command(&DimmerCommand::new(brightness).with_state(state))
            .await?;
        Ok(())
    }

    // ========== Queries ==========

    /// Returns the raw decoded system information response.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails.
    pub async fn sysinfo_raw(&self) -> Result<String, Error> {
        self.send_command(&SysInfoCommand).await
    }

    /// Returns the parsed system information.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` if the response lacks identity fields.
    pub async fn sysinfo(&self) -> Result<SysInfo, Error> {
        let body = self.sysinfo_raw().await?;
        Ok(SysInfo::parse(&body)?)
    }

    /// Returns the relay state, or the per-outlet states of a multi-outlet
    /// device.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` if the response carries no relay state.
    pub async fn relay_states(&self) -> Result<RelayStates, Error> {
        let body = self.sysinfo_raw().await?;
        Ok(response::extract::relay_states(&body)?)
    }

    /// Returns alias, model and signal strength.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` if any of them is missing.
    pub async fn identity(&self) -> Result<Identity, Error> {
        let body = self.sysinfo_raw().await?;
        Ok(response::extract::identity(&body)?)
    }

    /// Returns the same summary a discovery scan would produce for this
    /// device.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` if the response cannot be summarized.
    pub async fn summary(&self) -> Result<DeviceSummary, Error> {
        let body = self.sysinfo_raw().await?;
        Ok(DeviceSummary::parse(self.addr, &body)?)
    }

    // ========== Energy Monitoring ==========

    /// Reads current, voltage and power in base units.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` if the device has no energy meter or the
    /// reading is malformed.
    pub async fn read_power(&self) -> Result<Telemetry, Error> {
        let body = self.send_command(&RealtimeCommand).await?;
        Ok(Telemetry::parse(&body)?)
    }

    /// Reads power, reading once more if the first value is implausible.
    ///
    /// A power value above [`Telemetry::PLAUSIBLE_POWER_LIMIT`] triggers
    /// exactly one re-read of this same device; the second reading is
    /// returned as is.
    ///
    /// # Errors
    ///
    /// Same as [`Device::read_power`].
    pub async fn read_power_checked(&self) -> Result<Telemetry, Error> {
        let first = self.read_power().await?;
        if first.is_plausible() {
            return Ok(first);
        }

        tracing::warn!(
            addr = %self.addr,
            power = first.power,
            "Implausible power reading, reading again"
        );
        self.read_power().await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replays canned responses and records what was sent.
    #[derive(Default)]
    struct Scripted {
        replies: Mutex<VecDeque<String>>,
        sent: Mutex<Vec<(IpAddr, String)>>,
    }

    impl Scripted {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().map(ToString::to_string).collect()),
                sent: Mutex::default(),
            }
        }
    }

    impl Transport for Scripted {
        async fn exchange(
            &self,
            addr: IpAddr,
            command: &str,
            _timeout: Duration,
        ) -> Result<String, ProtocolError> {
            self.sent.lock().unwrap().push((addr, command.to_string()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ProtocolError::ConnectionFailed("no reply scripted".into()))
        }
    }

    fn device(replies: &[&str]) -> Device<Scripted> {
        Device::with_transport(
            IpAddr::from([192, 168, 0, 132]),
            Scripted::new(replies),
            Duration::from_secs(5),
        )
    }

    fn emeter(power: f64) -> String {
        format!(
            r#"{{"emeter":{{"get_realtime":{{"current":1.5,"voltage":230.1,"power":{power},"err_code":0}}}}}}"#
        )
    }

    #[tokio::test]
    async fn power_on_sends_relay_command() {
        let dev = device(&[r#"{"system":{"set_relay_state":{"err_code":0}}}"#]);
        dev.power_on().await.unwrap();

        let sent = dev.transport.sent.lock().unwrap();
        assert_eq!(sent[0].1, r#"{"system":{"set_relay_state":{"state":1}}}"#);
    }

    #[tokio::test]
    async fn rejected_command_carries_response() {
        let body = r#"{"system":{"set_relay_state":{"err_code":-3,"err_msg":"invalid argument"}}}"#;
        let dev = device(&[body]);
        let err = dev.power_off().await.unwrap_err();
        assert!(err.is_rejected());
        assert!(err.to_string().contains("invalid argument"));
    }

    #[tokio::test]
    async fn child_relay_includes_context() {
        let dev = device(&[r#"{"system":{"set_relay_state":{"err_code":0}}}"#]);
        dev.set_child_relay("800602", RelayState::On).await.unwrap();

        let sent = dev.transport.sent.lock().unwrap();
        assert!(sent[0].1.ends_with(r#","context":{"child_ids":["800602"]}}"#));
    }

    #[tokio::test]
    async fn implausible_reading_is_read_again_from_same_device() {
        let first = emeter(3000.0);
        let second = emeter(42.5);
        let dev = device(&[&first, &second]);

        let reading = dev.read_power_checked().await.unwrap();
        assert!((reading.power - 42.5).abs() < 1e-9);

        let sent = dev.transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|(addr, _)| *addr == dev.addr()));
    }

    #[tokio::test]
    async fn plausible_reading_is_not_read_again() {
        let first = emeter(2500.0);
        let dev = device(&[&first]);

        let reading = dev.read_power_checked().await.unwrap();
        assert!((reading.power - 2500.0).abs() < 1e-9);
        assert_eq!(dev.transport.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_implausible_reading_is_reported() {
        let first = emeter(3000.0);
        let second = emeter(2600.0);
        let dev = device(&[&first, &second]);

        let reading = dev.read_power_checked().await.unwrap();
        assert!((reading.power - 2600.0).abs() < 1e-9);
        assert_eq!(dev.transport.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn cancelled_send_returns_cancelled() {
        struct Hanging;
        impl Transport for Hanging {
            async fn exchange(
                &self,
                _addr: IpAddr,
                _command: &str,
                _timeout: Duration,
            ) -> Result<String, ProtocolError> {
                std::future::pending().await
            }
        }

        let dev = Device::with_transport([10, 0, 0, 1], Hanging, Duration::from_secs(60));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = dev
            .send_cancellable(&SysInfoCommand, &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn parse_rejects_hostnames() {
        let err = Device::parse("not-an-ip").unwrap_err();
        assert_eq!(err.exit_code(), 100);
    }
}
