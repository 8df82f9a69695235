// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bluetooth hardware address of a base station.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Number of octets in a hardware address.
const OCTETS: usize = 6;

/// Returns whether `candidate` is six two-digit hexadecimal octets separated
/// by colons, e.g. `AA:BB:CC:DD:EE:FF`.
///
/// The check is case-insensitive and rejects any leading or trailing
/// characters.
///
/// # Examples
///
/// ```
/// use lighthouse_bridge::types::is_valid_address;
///
/// assert!(is_valid_address("AA:BB:CC:DD:EE:FF"));
/// assert!(is_valid_address("aa:bb:cc:dd:ee:ff"));
/// assert!(!is_valid_address("AA:BB:CC:DD:EE"));
/// assert!(!is_valid_address("GG:BB:CC:DD:EE:FF"));
/// ```
#[must_use]
pub fn is_valid_address(candidate: &str) -> bool {
    let mut octets = 0;
    for octet in candidate.split(':') {
        if octet.len() != 2 || !octet.bytes().all(|b| b.is_ascii_hexdigit()) {
            return false;
        }
        octets += 1;
    }
    octets == OCTETS
}

/// A validated base station address.
///
/// The original spelling is kept so status events echo the address exactly as
/// it was requested.
///
/// # Examples
///
/// ```
/// use lighthouse_bridge::types::DeviceAddress;
///
/// let addr: DeviceAddress = "aa:bb:cc:dd:ee:ff".parse().unwrap();
/// assert_eq!(addr.as_str(), "aa:bb:cc:dd:ee:ff");
/// assert_eq!(addr.octets(), [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
///
/// assert!("AA-BB-CC-DD-EE-FF".parse::<DeviceAddress>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceAddress(String);

impl DeviceAddress {
    /// Validates and wraps an address string.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidAddress` if the string is not in
    /// six-octet colon-hex form.
    pub fn new(candidate: impl Into<String>) -> Result<Self, ValueError> {
        let candidate = candidate.into();
        if is_valid_address(&candidate) {
            Ok(Self(candidate))
        } else {
            Err(ValueError::InvalidAddress(candidate))
        }
    }

    /// Returns the address as it was given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the six octets, most significant first.
    #[must_use]
    pub fn octets(&self) -> [u8; OCTETS] {
        let mut out = [0u8; OCTETS];
        for (slot, octet) in out.iter_mut().zip(self.0.split(':')) {
            // Validated at construction
            *slot = u8::from_str_radix(octet, 16).unwrap_or_default();
        }
        out
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceAddress {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for DeviceAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
