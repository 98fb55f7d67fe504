// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic power sampling.
//!
//! [`PowerMonitor`] reads a device's energy meter on a fixed interval and
//! hands each timestamped reading to a callback. Readings go through
//! [`Device::read_power_checked`], so a single implausible spike is re-read
//! before it is reported.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::device::Device;
use crate::error::Error;
use crate::protocol::{TcpTransport, Transport};
use crate::response::Telemetry;

/// Sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorOptions {
    interval: Duration,
    count: u32,
}

impl MonitorOptions {
    /// Default time between readings.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(960);
    /// Default number of readings.
    pub const DEFAULT_COUNT: u32 = 1000;

    /// Creates the default options.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            count: Self::DEFAULT_COUNT,
        }
    }

    /// Sets the time between readings.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the number of readings to take.
    #[must_use]
    pub const fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Returns the time between readings.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the number of readings to take.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// A timestamped reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerSample {
    /// Local time the reading completed.
    pub time: DateTime<Local>,
    /// The reading.
    pub telemetry: Telemetry,
}

impl fmt::Display for PowerSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {}",
            self.time.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.telemetry
        )
    }
}

/// Samples one device's energy meter.
#[derive(Debug)]
pub struct PowerMonitor<T: Transport = TcpTransport> {
    device: Device<T>,
    options: MonitorOptions,
}

impl<T: Transport> PowerMonitor<T> {
    /// Creates a monitor for `device`.
    #[must_use]
    pub fn new(device: Device<T>, options: MonitorOptions) -> Self {
        Self { device, options }
    }

    /// Returns the monitored device.
    #[must_use]
    pub fn device(&self) -> &Device<T> {
        &self.device
    }

    /// Takes readings until the configured count is reached or `cancel`
    /// fires, and returns how many were taken.
    ///
    /// The first reading is taken immediately. If a reading takes longer
    /// than the interval, the next one starts right after it instead of
    /// bursting to catch up.
    ///
    /// # Errors
    ///
    /// Stops at the first failed reading and returns its error.
    pub async fn run<F>(&self, cancel: &CancellationToken, mut on_sample: F) -> Result<u32, Error>
    where
        F: FnMut(&PowerSample),
    {
        let mut ticker = tokio::time::interval(self.options.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            addr = %self.device.addr(),
            interval = ?self.options.interval,
            count = self.options.count,
            "Starting power monitor"
        );

        let mut taken = 0;
        while taken < self.options.count {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let reading = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                reading = self.device.read_power_checked() => reading?,
            };

            let sample = PowerSample {
                time: Local::now(),
                telemetry: reading,
            };
            on_sample(&sample);
            taken += 1;
        }

        tracing::info!(addr = %self.device.addr(), taken, "Power monitor stopped");
        Ok(taken)
    }
}
