// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device discovery by sweeping a subnet.
//!
//! Kasa devices do not announce themselves over TCP, so discovery asks every
//! address in a host range for its system information and keeps the ones
//! that answer.
//!
//! # Scheduling
//!
//! A fixed number of workers pull the next unprobed address from a shared
//! cursor, so no more than [`ScanOptions::concurrency`] probes are ever in
//! flight. Finished probes land in a result buffer indexed by position and
//! are released strictly in address order: a device is reported only once
//! every lower address has completed. Unreachable addresses and responses
//! without system information are skipped silently.
//!
//! # Examples
//!
//! ```no_run
//! use kasa_lan::discovery::{ScanOptions, Scanner};
//! use std::net::Ipv4Addr;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> kasa_lan::Result<()> {
//! let options = ScanOptions::new(Ipv4Addr::new(192, 168, 0, 0));
//! let cancel = CancellationToken::new();
//!
//! let devices = Scanner::new(options)
//!     .scan_each(&cancel, |device| println!("{device}"))
//!     .await?;
//! println!("{} devices", devices.len());
//! # Ok(())
//! # }
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::command::SysInfoCommand;
use crate::error::{Error, ProtocolError, ValueError};
use crate::protocol::{ClientConfig, TcpTransport, Transport};
use crate::response::DeviceSummary;

/// Parameters of a discovery sweep.
///
/// # Examples
///
/// ```
/// use kasa_lan::discovery::ScanOptions;
/// use std::net::Ipv4Addr;
/// use std::time::Duration;
///
/// let options = ScanOptions::new(Ipv4Addr::new(10, 0, 1, 0))
///     .with_host_range(2, 50)
///     .unwrap()
///     .with_concurrency(16)
///     .with_probe_timeout(Duration::from_millis(500));
///
/// assert_eq!(options.addresses().count(), 49);
/// assert_eq!(options.addresses().next(), Some(Ipv4Addr::new(10, 0, 1, 2)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    subnet: [u8; 3],
    first_host: u8,
    last_host: u8,
    concurrency: usize,
    probe_timeout: Duration,
    port: u16,
}

impl ScanOptions {
    /// First host probed by default. DHCP pools commonly start here.
    pub const DEFAULT_FIRST_HOST: u8 = 100;
    /// Last host probed by default.
    pub const DEFAULT_LAST_HOST: u8 = 254;
    /// Default number of probes in flight.
    pub const DEFAULT_CONCURRENCY: usize = 80;
    /// Default deadline for one probe.
    pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

    /// Creates options for the `/24` network containing `subnet`.
    ///
    /// Only the first three octets of `subnet` are used.
    #[must_use]
    pub fn new(subnet: Ipv4Addr) -> Self {
        let [a, b, c, _] = subnet.octets();
        Self {
            subnet: [a, b, c],
            first_host: Self::DEFAULT_FIRST_HOST,
            last_host: Self::DEFAULT_LAST_HOST,
            concurrency: Self::DEFAULT_CONCURRENCY,
            probe_timeout: Self::DEFAULT_PROBE_TIMEOUT,
            port: ClientConfig::DEFAULT_PORT,
        }
    }

    /// Sets the inclusive range of host octets to probe.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidHostRange` if `first` is after `last`.
    pub fn with_host_range(mut self, first: u8, last: u8) -> Result<Self, ValueError> {
        if first > last {
            return Err(ValueError::InvalidHostRange {
                start: first,
                end: last,
            });
        }
        self.first_host = first;
        self.last_host = last;
        Ok(self)
    }

    /// Sets the maximum number of probes in flight. Zero is treated as one.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Sets the deadline of each probe.
    #[must_use]
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Sets the port devices are probed on.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Returns the maximum number of probes in flight.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns the deadline of each probe.
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Returns the probe port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the inclusive host range.
    #[must_use]
    pub fn host_range(&self) -> (u8, u8) {
        (self.first_host, self.last_host)
    }

    /// Returns the addresses to probe, in ascending order.
    pub fn addresses(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        let [a, b, c] = self.subnet;
        (self.first_host..=self.last_host).map(move |host| Ipv4Addr::new(a, b, c, host))
    }
}

/// Result of probing one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// A device answered with usable system information.
    Found(DeviceSummary),
    /// Nothing answered, or the exchange failed on the wire.
    Unreachable,
    /// Something answered, but not with system information we could read.
    NotADevice,
}

impl ProbeOutcome {
    /// Returns the summary if a device was found.
    #[must_use]
    pub fn into_summary(self) -> Option<DeviceSummary> {
        match self {
            Self::Found(summary) => Some(summary),
            Self::Unreachable | Self::NotADevice => None,
        }
    }
}

/// Sweeps a host range for devices.
#[derive(Debug)]
pub struct Scanner<T: Transport = TcpTransport> {
    transport: Arc<T>,
    options: ScanOptions,
}

impl Scanner<TcpTransport> {
    /// Creates a scanner that probes over TCP.
    #[must_use]
    pub fn new(options: ScanOptions) -> Self {
        Self::with_transport(TcpTransport::with_port(options.port()), options)
    }
}

impl<T: Transport + 'static> Scanner<T> {
    /// Creates a scanner over an arbitrary transport.
    #[must_use]
    pub fn with_transport(transport: T, options: ScanOptions) -> Self {
        Self {
            transport: Arc::new(transport),
            options,
        }
    }

    /// Returns the scan options.
    #[must_use]
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Probes a single address.
    pub async fn probe(&self, addr: Ipv4Addr) -> ProbeOutcome {
        probe_host(self.transport.as_ref(), addr, self.options.probe_timeout).await
    }

    /// Sweeps the range and returns the devices found, in address order.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Cancelled` if `cancel` fires before the sweep
    /// completes.
    pub async fn scan(&self, cancel: &CancellationToken) -> Result<Vec<DeviceSummary>, Error> {
        self.scan_each(cancel, |_| {}).await
    }

    /// Sweeps the range, calling `on_device` for each device as soon as every
    /// lower address has been probed.
    ///
    /// Returns all devices found, in address order.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Cancelled` if `cancel` fires before the sweep
    /// completes. Devices already passed to `on_device` stay reported.
    pub async fn scan_each<F>(
        &self,
        cancel: &CancellationToken,
        mut on_device: F,
    ) -> Result<Vec<DeviceSummary>, Error>
    where
        F: FnMut(&DeviceSummary),
    {
        let addresses: Arc<[Ipv4Addr]> = self.options.addresses().collect();
        let workers = self.options.concurrency.min(addresses.len());

        tracing::info!(
            first = %addresses[0],
            count = addresses.len(),
            workers,
            timeout = ?self.options.probe_timeout,
            "Starting discovery scan"
        );

        let cursor = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::channel::<(usize, ProbeOutcome)>(workers);
        let mut tasks = JoinSet::new();

        for _ in 0..workers {
            let transport = Arc::clone(&self.transport);
            let addresses = Arc::clone(&addresses);
            let cursor = Arc::clone(&cursor);
            let cancel = cancel.clone();
            let tx = tx.clone();
            let timeout = self.options.probe_timeout;

            tasks.spawn(async move {
                while !cancel.is_cancelled() {
                    let index = cursor.fetch_add(1, Ordering::Relaxed);
                    let Some(&addr) = addresses.get(index) else {
                        break;
                    };

                    // Own task per probe, so a panicking transport costs
                    // one address. Dropping the set aborts the probe.
                    let mut probe = JoinSet::new();
                    let probe_transport = Arc::clone(&transport);
                    probe.spawn(async move {
                        probe_host(probe_transport.as_ref(), addr, timeout).await
                    });

                    let outcome = tokio::select! {
                        () = cancel.cancelled() => None,
                        joined = probe.join_next() => Some(match joined {
                            Some(Ok(outcome)) => outcome,
                            Some(Err(e)) => {
                                tracing::warn!(ip = %addr, error = %e, "Probe task failed");
                                ProbeOutcome::NotADevice
                            }
                            None => ProbeOutcome::NotADevice,
                        }),
                    };
                    let Some(outcome) = outcome else {
                        break;
                    };

                    if tx.send((index, outcome)).await.is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        let mut slots: Vec<Option<ProbeOutcome>> = vec![None; addresses.len()];
        let mut released = 0;
        let mut found = Vec::new();

        loop {
            let received = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tasks.abort_all();
                    tracing::info!(reported = found.len(), "Discovery scan cancelled");
                    return Err(ProtocolError::Cancelled.into());
                }
                received = rx.recv() => received,
            };
            let Some((index, outcome)) = received else {
                break;
            };
            slots[index] = Some(outcome);

            while let Some(outcome) = slots.get_mut(released).and_then(Option::take) {
                released += 1;
                if let Some(summary) = outcome.into_summary() {
                    on_device(&summary);
                    found.push(summary);
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "Discovery worker failed");
            }
        }

        // Slots a failed worker never filled are skipped.
        for outcome in slots.drain(released..) {
            match outcome {
                Some(outcome) => {
                    if let Some(summary) = outcome.into_summary() {
                        on_device(&summary);
                        found.push(summary);
                    }
                }
                None => {
                    tracing::warn!(ip = %addresses[released], "Address left unprobed");
                }
            }
            released += 1;
        }

        tracing::info!(
            probed = released,
            discovered = found.len(),
            "Discovery scan completed"
        );

        Ok(found)
    }
}

async fn probe_host<T: Transport>(
    transport: &T,
    addr: Ipv4Addr,
    timeout: Duration,
) -> ProbeOutcome {
    let ip = IpAddr::V4(addr);
    match transport.send(ip, SysInfoCommand::JSON, timeout).await {
        Ok(body) => match DeviceSummary::parse(ip, &body) {
            Ok(summary) => {
                tracing::debug!(%ip, model = %summary.model, "Device found");
                ProbeOutcome::Found(summary)
            }
            Err(e) => {
                tracing::debug!(%ip, error = %e, "Response without usable system information");
                ProbeOutcome::NotADevice
            }
        },
        Err(e) if e.is_unreachable() => {
            tracing::trace!(%ip, error = %e, "No device");
            ProbeOutcome::Unreachable
        }
        Err(e) => {
            tracing::debug!(%ip, error = %e, "Probe rejected");
            ProbeOutcome::NotADevice
        }
    }
}

/// Sweeps the default host range of `subnet` with default options.
///
/// # Errors
///
/// Returns `ProtocolError::Cancelled` if `cancel` fires before the sweep
/// completes.
pub async fn discover(
    subnet: Ipv4Addr,
    cancel: &CancellationToken,
) -> Result<Vec<DeviceSummary>, Error> {
    Scanner::new(ScanOptions::new(subnet)).scan(cancel).await
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn scan_options_default() {
        let options = ScanOptions::new(Ipv4Addr::new(192, 168, 0, 77));
        assert_eq!(options.host_range(), (100, 254));
        assert_eq!(options.concurrency(), 80);
        assert_eq!(options.probe_timeout(), Duration::from_secs(2));
        assert_eq!(options.port(), 9999);
        assert_eq!(options.addresses().count(), 155);
        assert_eq!(
            options.addresses().last(),
            Some(Ipv4Addr::new(192, 168, 0, 254))
        );
    }

    #[test]
    fn scan_options_invalid_range() {
        let err = ScanOptions::new(Ipv4Addr::LOCALHOST)
            .with_host_range(200, 100)
            .unwrap_err();
        assert_eq!(err, ValueError::InvalidHostRange { start: 200, end: 100 });
    }

    #[test]
    fn scan_options_zero_concurrency_is_one() {
        let options = ScanOptions::new(Ipv4Addr::LOCALHOST).with_concurrency(0);
        assert_eq!(options.concurrency(), 1);
    }

    struct Fixed(HashMap<Ipv4Addr, Result<String, ()>>);

    impl Transport for Fixed {
        async fn exchange(
            &self,
            addr: IpAddr,
            _command: &str,
            _timeout: Duration,
        ) -> Result<String, ProtocolError> {
            let IpAddr::V4(v4) = addr else {
                return Err(ProtocolError::InvalidAddress(addr.to_string()));
            };
            match self.0.get(&v4) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(())) => Err(ProtocolError::Timeout(2000)),
                None => Err(ProtocolError::ConnectionFailed("refused".into())),
            }
        }
    }

    #[tokio::test]
    async fn probe_classifies_outcomes() {
        let plug = r#"{"system":{"get_sysinfo":{"model":"HS100","alias":"a","rssi":-50,"relay_state":1,"err_code":0}}}"#;
        let mut map = HashMap::new();
        map.insert(Ipv4Addr::new(10, 0, 0, 1), Ok(plug.to_string()));
        map.insert(
            Ipv4Addr::new(10, 0, 0, 2),
            Ok(r#"{"system":{"err_code":-1}}"#.to_string()),
        );
        map.insert(
            Ipv4Addr::new(10, 0, 0, 3),
            Ok(r#"{"hello":"world","err_code":0}"#.to_string()),
        );
        map.insert(Ipv4Addr::new(10, 0, 0, 4), Err(()));

        let options = ScanOptions::new(Ipv4Addr::new(10, 0, 0, 0));
        let scanner = Scanner::with_transport(Fixed(map), options);

        assert!(matches!(
            scanner.probe(Ipv4Addr::new(10, 0, 0, 1)).await,
            ProbeOutcome::Found(_)
        ));
        assert_eq!(
            scanner.probe(Ipv4Addr::new(10, 0, 0, 2)).await,
            ProbeOutcome::NotADevice
        );
        assert_eq!(
            scanner.probe(Ipv4Addr::new(10, 0, 0, 3)).await,
            ProbeOutcome::NotADevice
        );
        assert_eq!(
            scanner.probe(Ipv4Addr::new(10, 0, 0, 4)).await,
            ProbeOutcome::Unreachable
        );
        assert_eq!(
            scanner.probe(Ipv4Addr::new(10, 0, 0, 5)).await,
            ProbeOutcome::Unreachable
        );
    }
}
