// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lighthouse Bridge - switch Lighthouse V2 base stations over MQTT.
//!
//! Commands (`ON`/`OFF` plus one or more Bluetooth addresses) come from the
//! command line or from a JSON message on an MQTT command topic. Each base
//! station is switched over Bluetooth LE, the new state is confirmed by
//! reading it back, and confirmed outcomes are published on a status topic.
//!
//! # Protocol
//!
//! For every device, in order:
//!
//! 1. Connect (not retried)
//! 2. Write the power characteristic, wait 500 ms, read it back
//! 3. Repeat step 2 up to three times until the device reports the target
//! 4. Disconnect, on every path
//!
//! # Topics
//!
//! | Topic | Direction | Payload |
//! |-------|-----------|---------|
//! | `valvelighthouseblemqtt/command` | in | `{"mac": "AA:BB:CC:DD:EE:FF", "command": "ON"}` |
//! | `valvelighthouseblemqtt/state` | out | `{"mac": "AA:BB:CC:DD:EE:FF", "state": "ON"}` |
//!
//! # Quick Start
//!
//! ```no_run
//! use lighthouse_bridge::config::{BleConfig, TopicConfig};
//! use lighthouse_bridge::protocol::MqttBridge;
//! use lighthouse_bridge::session::BleConnector;
//! use lighthouse_bridge::{Bridge, CommandDispatcher, PowerController};
//!
//! #[tokio::main]
//! async fn main() -> lighthouse_bridge::Result<()> {
//!     let connector = BleConnector::new(BleConfig::default()).await?;
//!     let dispatcher = CommandDispatcher::new(PowerController::new(connector));
//!
//!     let (broker, inbound) = MqttBridge::builder()
//!         .host("192.168.14.12")
//!         .topics(TopicConfig::default())
//!         .build()
//!         .await?;
//!
//!     Bridge::new(dispatcher, broker).serve(inbound).await;
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod command;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod protocol;
pub mod session;
pub mod types;

pub use bridge::Bridge;
pub use command::{Command, CommandMessage};
pub use config::{BleConfig, RetryPolicy, TopicConfig, UnconfirmedPolicy};
pub use controller::{ControlOutcome, ControlState, PowerController};
pub use dispatcher::{CommandDispatcher, Dispatch, DispatchSummary};
pub use error::{Error, ParseError, ProtocolError, Result, SessionError, ValueError};
pub use event::StatusEvent;
#[cfg(feature = "mqtt")]
pub use protocol::MqttBridge;
pub use protocol::StatusPublisher;
#[cfg(feature = "ble")]
pub use session::BleConnector;
pub use session::{Connector, DeviceSession};
pub use types::{DeviceAddress, PowerState, is_valid_address};
