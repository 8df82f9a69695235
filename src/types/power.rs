// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power state of a base station.
//!
//! The same type describes both a requested target and a state read back
//! from the device, so the two can be compared directly.

use std::fmt;
use std::str::FromStr;

use crate::error::{SessionError, ValueError};

/// Represents the power state of a base station.
///
/// # Examples
///
/// ```
/// use lighthouse_bridge::types::PowerState;
///
/// assert_eq!(PowerState::On.as_str(), "ON");
/// assert_eq!(PowerState::Standby.as_str(), "OFF");
/// assert_eq!(PowerState::On.as_byte(), 0x01);
/// assert_eq!("OFF".parse::<PowerState>().unwrap(), PowerState::Standby);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerState {
    /// The base station is powered and sweeping.
    On,
    /// The base station is in standby.
    Standby,
}

impl PowerState {
    /// Returns the command/status label (`ON` or `OFF`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Standby => "OFF",
        }
    }

    /// Returns the single-byte encoding written to the power characteristic.
    #[must_use]
    pub const fn as_byte(&self) -> u8 {
        match self {
            Self::On => 0x01,
            Self::Standby => 0x00,
        }
    }

    /// Decodes a value read from the power characteristic.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnexpectedValue` unless the value is exactly one
    /// byte holding `0x00` or `0x01`.
    pub fn from_bytes(value: &[u8]) -> Result<Self, SessionError> {
        match value {
            [0x01] => Ok(Self::On),
            [0x00] => Ok(Self::Standby),
            other => Err(SessionError::UnexpectedValue(other.to_vec())),
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parses a command word. Only the exact labels `ON` and `OFF` are accepted.
impl FromStr for PowerState {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ON" => Ok(Self::On),
            "OFF" => Ok(Self::Standby),
            _ => Err(ValueError::InvalidPowerState(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_state_labels() {
        assert_eq!(PowerState::On.to_string(), "ON");
        assert_eq!(PowerState::Standby.to_string(), "OFF");
    }

    #[test]
    fn power_state_from_str() {
        assert_eq!("ON".parse::<PowerState>().unwrap(), PowerState::On);
        assert_eq!("OFF".parse::<PowerState>().unwrap(), PowerState::Standby);
    }

    #[test]
    fn power_state_from_str_is_case_sensitive() {
        for word in ["on", "Off", "oFf", " ON"] {
            assert_eq!(
                word.parse::<PowerState>().unwrap_err(),
                ValueError::InvalidPowerState(word.to_string())
            );
        }
    }

    #[test]
    fn power_state_from_str_invalid() {
        let result = "STANDBY".parse::<PowerState>();
        assert!(matches!(
            result.unwrap_err(),
            ValueError::InvalidPowerState(_)
        ));
    }

    #[test]
    fn power_state_from_bytes() {
        assert_eq!(PowerState::from_bytes(&[0x01]).unwrap(), PowerState::On);
        assert_eq!(PowerState::from_bytes(&[0x00]).unwrap(), PowerState::Standby);
    }

    #[test]
    fn power_state_from_bytes_rejects_unknown_values() {
        assert!(matches!(
            PowerState::from_bytes(&[0x0b]),
            Err(SessionError::UnexpectedValue(v)) if v == vec![0x0b]
        ));
        assert!(PowerState::from_bytes(&[]).is_err());
        assert!(PowerState::from_bytes(&[0x01, 0x00]).is_err());
    }

    #[test]
    fn power_state_byte_encoding_matches_decoding() {
        for state in [PowerState::On, PowerState::Standby] {
            assert_eq!(PowerState::from_bytes(&[state.as_byte()]).unwrap(), state);
        }
    }
}
