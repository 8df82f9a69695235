// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Message broker side of the bridge.
//!
//! - [`StatusPublisher`]: where status events go
//! - [`MqttBridge`]: the process-wide MQTT connection, which both receives
//!   commands and publishes status (feature `mqtt`)

#[cfg(feature = "mqtt")]
mod mqtt_bridge;

#[cfg(feature = "mqtt")]
pub use mqtt_bridge::{
    DEFAULT_COMMAND_QUEUE_CAPACITY, InboundCommands, MqttBridge, MqttBridgeBuilder, MqttBridgeConfig,
};

use crate::error::ProtocolError;
use crate::event::StatusEvent;

/// Destination for status events.
#[allow(async_fn_in_trait)]
pub trait StatusPublisher {
    /// Publishes one status event.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the event could not be handed to the broker.
    async fn publish_status(&self, event: &StatusEvent) -> Result<(), ProtocolError>;
}

impl<P: StatusPublisher> StatusPublisher for &P {
    async fn publish_status(&self, event: &StatusEvent) -> Result<(), ProtocolError> {
        (**self).publish_status(event).await
    }
}
