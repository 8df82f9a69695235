// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bluetooth LE sessions via `btleplug`.

use std::time::Duration;

use btleplug::api::{
    BDAddr, Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};

use crate::config::BleConfig;
use crate::error::SessionError;
use crate::session::{Connector, DeviceSession, POWER_CHARACTERISTIC_UUID};
use crate::types::{DeviceAddress, PowerState};

/// How often the peripheral list is checked while scanning.
const SCAN_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Opens BLE sessions on the first Bluetooth adapter of the host.
///
/// # Examples
///
/// ```no_run
/// use lighthouse_bridge::config::BleConfig;
/// use lighthouse_bridge::session::{BleConnector, Connector, DeviceSession};
/// use lighthouse_bridge::types::{DeviceAddress, PowerState};
///
/// # async fn example() -> lighthouse_bridge::Result<()> {
/// let connector = BleConnector::new(BleConfig::default()).await?;
/// let address = DeviceAddress::new("AA:BB:CC:DD:EE:FF")?;
///
/// let mut session = connector.connect(&address).await?;
/// session.write_power(PowerState::On).await?;
/// session.disconnect().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BleConnector {
    adapter: Adapter,
    config: BleConfig,
}

impl BleConnector {
    /// Opens the default adapter.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AdapterUnavailable` if the host has no
    /// Bluetooth adapter, or a BLE error if the stack cannot be reached.
    pub async fn new(config: BleConfig) -> Result<Self, SessionError> {
        let manager = Manager::new().await?;
        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or(SessionError::AdapterUnavailable)?;

        tracing::debug!(?config, "Bluetooth adapter ready");
        Ok(Self { adapter, config })
    }

    /// Returns the transport settings.
    #[must_use]
    pub fn config(&self) -> &BleConfig {
        &self.config
    }

    /// Returns an already known peripheral with the given address.
    async fn lookup(&self, target: BDAddr) -> Result<Option<Peripheral>, SessionError> {
        Ok(self
            .adapter
            .peripherals()
            .await?
            .into_iter()
            .find(|p| p.address() == target))
    }

    /// Finds the peripheral for `target`, scanning if the adapter has not
    /// seen it yet.
    async fn find_peripheral(&self, address: &DeviceAddress) -> Result<Peripheral, SessionError> {
        let target = BDAddr::from(address.octets());
        if let Some(peripheral) = self.lookup(target).await? {
            return Ok(peripheral);
        }

        tracing::debug!(address = %address, "Scanning for device");
        self.adapter.start_scan(ScanFilter::default()).await?;

        let found = tokio::time::timeout(self.config.scan_timeout, async {
            loop {
                if let Some(peripheral) = self.lookup(target).await? {
                    return Ok::<_, SessionError>(peripheral);
                }
                tokio::time::sleep(SCAN_POLL_INTERVAL).await;
            }
        })
        .await;

        if let Err(e) = self.adapter.stop_scan().await {
            tracing::warn!(error = %e, "Failed to stop BLE scan");
        }

        match found {
            Ok(result) => result,
            Err(_) => Err(SessionError::DeviceNotFound(address.to_string())),
        }
    }
}

impl Connector for BleConnector {
    type Session = BleSession;

    async fn connect(&self, address: &DeviceAddress) -> Result<BleSession, SessionError> {
        let peripheral = self.find_peripheral(address).await?;

        let timeout = self.config.connect_timeout;
        tokio::time::timeout(timeout, peripheral.connect())
            .await
            .map_err(|_| SessionError::Timeout(millis(timeout)))?
            .map_err(|e| SessionError::Connect(e.to_string()))?;

        // The link is up from here on; tear it down if the profile is unusable.
        match resolve_power_characteristic(&peripheral).await {
            Ok(characteristic) => Ok(BleSession {
                peripheral,
                characteristic,
            }),
            Err(e) => {
                if let Err(disconnect_err) = peripheral.disconnect().await {
                    tracing::warn!(
                        address = %address,
                        error = %disconnect_err,
                        "Failed to disconnect after setup error"
                    );
                }
                Err(e)
            }
        }
    }
}

/// Discovers services and returns the power characteristic.
async fn resolve_power_characteristic(
    peripheral: &Peripheral,
) -> Result<Characteristic, SessionError> {
    peripheral.discover_services().await?;
    peripheral
        .characteristics()
        .into_iter()
        .find(|c| c.uuid == POWER_CHARACTERISTIC_UUID)
        .ok_or(SessionError::CharacteristicNotFound(POWER_CHARACTERISTIC_UUID))
}

/// An open BLE link to one base station.
#[derive(Debug)]
pub struct BleSession {
    peripheral: Peripheral,
    characteristic: Characteristic,
}

impl DeviceSession for BleSession {
    async fn write_power(&mut self, state: PowerState) -> Result<(), SessionError> {
        self.peripheral
            .write(
                &self.characteristic,
                &[state.as_byte()],
                WriteType::WithResponse,
            )
            .await
            .map_err(|e| SessionError::Write(e.to_string()))
    }

    async fn read_power(&mut self) -> Result<PowerState, SessionError> {
        let value = self
            .peripheral
            .read(&self.characteristic)
            .await
            .map_err(|e| SessionError::Read(e.to_string()))?;
        PowerState::from_bytes(&value)
    }

    async fn disconnect(self) -> Result<(), SessionError> {
        self.peripheral.disconnect().await?;
        Ok(())
    }
}

// Safe: connect timeouts are seconds, far below u64::MAX milliseconds
#[allow(clippy::cast_possible_truncation)]
fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}
