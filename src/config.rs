// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration types for the bridge.
//!
//! Defaults reproduce the behavior of the stock Lighthouse V2 manager: three
//! attempts per device with a 500 ms settle delay, and the
//! `valvelighthouseblemqtt/*` topic pair.

use std::time::Duration;

/// Default command topic.
pub const DEFAULT_COMMAND_TOPIC: &str = "valvelighthouseblemqtt/command";

/// Default status topic.
pub const DEFAULT_STATUS_TOPIC: &str = "valvelighthouseblemqtt/state";

/// Retry policy for the confirm-by-readback protocol.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use lighthouse_bridge::config::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts, 3);
/// assert_eq!(policy.settle_delay, Duration::from_millis(500));
///
/// let policy = RetryPolicy::new()
///     .with_max_attempts(5)
///     .with_settle_delay(Duration::from_millis(250));
/// assert_eq!(policy.max_attempts, 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Write/read cycles per device before giving up. Always at least one.
    pub max_attempts: u32,
    /// Pause between a write and its confirmation read.
    pub settle_delay: Duration,
}

impl RetryPolicy {
    /// Creates a retry policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of attempts. Zero is raised to one.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Sets the settle delay.
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            settle_delay: Duration::from_millis(500),
        }
    }
}

/// What to report for a device that never confirmed the requested state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnconfirmedPolicy {
    /// Publish nothing; only confirmed outcomes reach the status topic.
    #[default]
    Suppress,
    /// Publish the state that was requested.
    ReportTarget,
    /// Publish the state the device last reported, or nothing if that value
    /// was not a known power state.
    ReportObserved,
}

/// Command and status topic names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicConfig {
    /// Topic the bridge subscribes to for commands.
    pub command: String,
    /// Topic the bridge publishes status events to.
    pub status: String,
}

impl TopicConfig {
    /// Creates a topic configuration.
    #[must_use]
    pub fn new(command: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            status: status.into(),
        }
    }
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TOPIC, DEFAULT_STATUS_TOPIC)
    }
}

/// Bluetooth transport settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BleConfig {
    /// How long to scan for a device before reporting it as not found.
    pub scan_timeout: Duration,
    /// Upper bound on establishing the link once the device is found.
    pub connect_timeout: Duration,
}

impl BleConfig {
    /// Creates a BLE configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scan timeout.
    #[must_use]
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

impl Default for BleConfig {
    fn default() -> Self {
        Self {
            scan_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
        }
    }
}
