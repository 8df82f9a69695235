// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wireless control sessions with base stations.
//!
//! The controller only needs four operations from the transport: connect by
//! address, write the power attribute, read it back, and disconnect. They are
//! split over two traits:
//!
//! - [`Connector`] opens a [`DeviceSession`] for an address
//! - [`DeviceSession`] owns one open link until [`DeviceSession::disconnect`]
//!   consumes it
//!
//! The `ble` feature provides [`BleConnector`], backed by `btleplug`.

#[cfg(feature = "ble")]
mod ble;

#[cfg(feature = "ble")]
pub use ble::{BleConnector, BleSession};

use uuid::Uuid;

use crate::error::SessionError;
use crate::types::{DeviceAddress, PowerState};

/// GATT service exposing base station power control.
pub const POWER_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_1523_1212_efde_1523_785f_eabc_d124);

/// GATT characteristic holding the power state (`0x01` on, `0x00` standby).
pub const POWER_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x0000_1525_1212_efde_1523_785f_eabc_d124);

/// Opens control sessions with devices.
#[allow(async_fn_in_trait)]
pub trait Connector {
    /// The session type this connector produces.
    type Session: DeviceSession;

    /// Establishes a session with the device at `address`.
    ///
    /// Bounded by the transport's own timeouts.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the device cannot be reached. No session is
    /// left open on failure.
    async fn connect(&self, address: &DeviceAddress) -> Result<Self::Session, SessionError>;
}

/// One open control session with one device.
#[allow(async_fn_in_trait)]
pub trait DeviceSession {
    /// Writes the power attribute.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the write is not acknowledged.
    async fn write_power(&mut self, state: PowerState) -> Result<(), SessionError>;

    /// Reads the power state the device currently reports.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the read fails or the value is not a known
    /// power state.
    async fn read_power(&mut self) -> Result<PowerState, SessionError>;

    /// Releases the session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the transport reports a failure while
    /// tearing down the link. The session is gone either way.
    async fn disconnect(self) -> Result<(), SessionError>;
}
