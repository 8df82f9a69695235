// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status event type.

use serde::Serialize;

use crate::types::{DeviceAddress, PowerState};

/// The externally observable record of one device outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    address: DeviceAddress,
    state: PowerState,
}

/// Wire shape of a status event.
#[derive(Serialize)]
struct StatusPayload<'a> {
    mac: &'a str,
    state: &'static str,
}

impl StatusEvent {
    /// Creates a status event.
    #[must_use]
    pub fn new(address: DeviceAddress, state: PowerState) -> Self {
        Self { address, state }
    }

    /// Returns the device address.
    #[must_use]
    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    /// Returns the reported power state.
    #[must_use]
    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Serializes the event to its JSON payload.
    #[must_use]
    pub fn to_payload(&self) -> String {
        let payload = StatusPayload {
            mac: self.address.as_str(),
            state: self.state.as_str(),
        };
        // Two string fields; serialization cannot fail.
        serde_json::to_string(&payload).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> DeviceAddress {
        DeviceAddress::new("AA:BB:CC:DD:EE:FF").unwrap()
    }

    #[test]
    fn payload_for_on() {
        let event = StatusEvent::new(address(), PowerState::On);
        assert_eq!(
            event.to_payload(),
            r#"{"mac":"AA:BB:CC:DD:EE:FF","state":"ON"}"#
        );
    }

    #[test]
    fn payload_for_standby_uses_off_label() {
        let event = StatusEvent::new(address(), PowerState::Standby);
        let value: serde_json::Value = serde_json::from_str(&event.to_payload()).unwrap();
        assert_eq!(value["state"], "OFF");
        assert_eq!(value["mac"], "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn payload_keeps_address_spelling() {
        let event = StatusEvent::new(
            DeviceAddress::new("aa:bb:cc:dd:ee:ff").unwrap(),
            PowerState::On,
        );
        assert!(event.to_payload().contains("aa:bb:cc:dd:ee:ff"));
    }

    #[test]
    fn accessors() {
        let event = StatusEvent::new(address(), PowerState::Standby);
        assert_eq!(event.address(), &address());
        assert_eq!(event.state(), PowerState::Standby);
    }
}
