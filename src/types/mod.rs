// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for base station control.
//!
//! - [`DeviceAddress`] - Validated Bluetooth hardware address
//! - [`PowerState`] - On/Standby, both as a request and as a device report

mod address;
mod power;

pub use address::{DeviceAddress, is_valid_address};
pub use power::PowerState;
