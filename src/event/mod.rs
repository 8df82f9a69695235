// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status events reported on the status topic.
//!
//! Every device outcome worth reporting becomes one [`StatusEvent`], which is
//! serialized as `{"mac": "<address>", "state": "ON"|"OFF"}`.
//!
//! # Examples
//!
//! ```
//! use lighthouse_bridge::event::StatusEvent;
//! use lighthouse_bridge::types::{DeviceAddress, PowerState};
//!
//! let address = DeviceAddress::new("AA:BB:CC:DD:EE:FF").unwrap();
//! let event = StatusEvent::new(address, PowerState::On);
//! assert_eq!(event.to_payload(), r#"{"mac":"AA:BB:CC:DD:EE:FF","state":"ON"}"#);
//! ```

mod status_event;

pub use status_event::StatusEvent;
