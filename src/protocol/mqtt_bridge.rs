// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT broker connection for the bridge.
//!
//! One connection serves both directions: payloads arriving on the command
//! topic are queued on an [`InboundCommands`] channel, and status events are
//! published on the status topic.
//!
//! The command topic is subscribed on every CONNACK, so the subscription
//! survives broker restarts. Transport errors do not end the event loop; it
//! waits for the reconnect delay and polls again.
//!
//! # Examples
//!
//! ```no_run
//! use lighthouse_bridge::protocol::MqttBridge;
//!
//! # async fn example() -> lighthouse_bridge::Result<()> {
//! let (broker, mut inbound) = MqttBridge::builder()
//!     .host("192.168.14.12")
//!     .credentials("user", "password")
//!     .build()
//!     .await?;
//!
//! while let Some(payload) = inbound.recv().await {
//!     println!("command: {}", String::from_utf8_lossy(&payload));
//! }
//!
//! broker.disconnect().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use tokio::sync::{mpsc, oneshot};

use crate::config::TopicConfig;
use crate::error::ProtocolError;
use crate::event::StatusEvent;
use crate::protocol::StatusPublisher;

/// Global counter for generating unique client IDs.
static BRIDGE_CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Default number of command payloads buffered while a command is being
/// applied.
pub const DEFAULT_COMMAND_QUEUE_CAPACITY: usize = 32;

/// Receiver for raw command topic payloads, in arrival order.
pub type InboundCommands = mpsc::Receiver<Vec<u8>>;

/// Configuration for the broker connection.
#[derive(Debug, Clone)]
pub struct MqttBridgeConfig {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    keep_alive: Duration,
    connection_timeout: Duration,
    reconnect_delay: Duration,
    client_id_prefix: String,
    topics: TopicConfig,
    command_queue_capacity: usize,
}

impl Default for MqttBridgeConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 1883,
            credentials: None,
            keep_alive: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(5),
            client_id_prefix: "lighthouse".to_string(),
            topics: TopicConfig::default(),
            command_queue_capacity: DEFAULT_COMMAND_QUEUE_CAPACITY,
        }
    }
}

impl MqttBridgeConfig {
    /// Returns the topic pair.
    #[must_use]
    pub fn topics(&self) -> &TopicConfig {
        &self.topics
    }

    /// Returns how many command payloads may wait while one is applied.
    #[must_use]
    pub fn command_queue_capacity(&self) -> usize {
        self.command_queue_capacity
    }
}

/// The bridge's connection to an MQTT broker.
///
/// Cheaply cloneable; clones share the same connection.
#[derive(Clone)]
pub struct MqttBridge {
    inner: Arc<MqttBridgeInner>,
}

struct MqttBridgeInner {
    client: AsyncClient,
    config: MqttBridgeConfig,
    connected: AtomicBool,
}

impl MqttBridge {
    /// Creates a new builder for configuring the connection.
    #[must_use]
    pub fn builder() -> MqttBridgeBuilder {
        MqttBridgeBuilder::default()
    }

    /// Returns whether the broker connection is currently up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Returns the host address of the broker.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.inner.config.host
    }

    /// Returns the port of the broker.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.inner.config.port
    }

    /// Returns the topic pair.
    #[must_use]
    pub fn topics(&self) -> &TopicConfig {
        &self.inner.config.topics
    }

    /// Disconnects from the broker and stops the event loop.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request cannot be queued.
    pub async fn disconnect(&self) -> Result<(), ProtocolError> {
        tracing::info!(
            host = %self.inner.config.host,
            port = %self.inner.config.port,
            "Disconnecting from MQTT broker"
        );

        self.inner
            .client
            .disconnect()
            .await
            .map_err(ProtocolError::Mqtt)?;

        self.inner.connected.store(false, Ordering::Release);
        Ok(())
    }

    /// Subscribes to the command topic without waiting for queue space.
    fn subscribe_commands(&self) {
        let topic = &self.inner.config.topics.command;
        match self.inner.client.try_subscribe(topic, QoS::AtLeastOnce) {
            Ok(()) => tracing::debug!(topic = %topic, "Subscribing to command topic"),
            Err(e) => tracing::warn!(topic = %topic, error = %e, "Failed to subscribe"),
        }
    }
}

impl StatusPublisher for MqttBridge {
    async fn publish_status(&self, event: &StatusEvent) -> Result<(), ProtocolError> {
        let topic = &self.inner.config.topics.status;
        let payload = event.to_payload();

        tracing::debug!(topic = %topic, payload = %payload, "Publishing status");

        self.inner
            .client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(ProtocolError::Mqtt)
    }
}

impl std::fmt::Debug for MqttBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttBridge")
            .field("host", &self.inner.config.host)
            .field("port", &self.inner.config.port)
            .field("topics", &self.inner.config.topics)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Builder for the broker connection.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use lighthouse_bridge::protocol::MqttBridge;
///
/// # async fn example() -> lighthouse_bridge::Result<()> {
/// let (broker, inbound) = MqttBridge::builder()
///     .broker_url("mqtt://192.168.14.12:1883")?
///     .keep_alive(Duration::from_secs(60))
///     .connection_timeout(Duration::from_secs(5))
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MqttBridgeBuilder {
    config: MqttBridgeConfig,
}

impl MqttBridgeBuilder {
    /// Sets the broker host address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the broker port (default: 1883).
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets host and port from a URL such as `mqtt://host:1883`.
    ///
    /// The `mqtt://` and `tcp://` schemes are accepted. Without a port in the
    /// URL the configured port is kept.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidAddress` if the port is not a number.
    pub fn broker_url(mut self, url: &str) -> Result<Self, ProtocolError> {
        let (host, port) = parse_mqtt_url(url)?;
        self.config.host = host;
        if let Some(port) = port {
            self.config.port = port;
        }
        Ok(self)
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the keep-alive interval (default: 30 seconds).
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.config.keep_alive = duration;
        self
    }

    /// Sets the connection timeout (default: 10 seconds).
    #[must_use]
    pub fn connection_timeout(mut self, duration: Duration) -> Self {
        self.config.connection_timeout = duration;
        self
    }

    /// Sets the pause before polling again after a transport error
    /// (default: 5 seconds).
    #[must_use]
    pub fn reconnect_delay(mut self, duration: Duration) -> Self {
        self.config.reconnect_delay = duration;
        self
    }

    /// Sets the client ID prefix (default: `lighthouse`).
    #[must_use]
    pub fn client_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.client_id_prefix = prefix.into();
        self
    }

    /// Sets the command and status topics.
    #[must_use]
    pub fn topics(mut self, topics: TopicConfig) -> Self {
        self.config.topics = topics;
        self
    }

    /// Sets how many command payloads may wait while one is being applied
    /// (default: 32, minimum: 1).
    ///
    /// Payloads arriving while the queue is full are dropped and logged.
    #[must_use]
    pub fn command_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.command_queue_capacity = capacity.max(1);
        self
    }

    /// Connects to the broker and subscribes to the command topic.
    ///
    /// Returns the connection and the channel carrying command payloads.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Host is not set
    /// - A topic is empty or the status topic contains wildcards
    /// - No CONNACK arrives within the connection timeout
    pub async fn build(self) -> Result<(MqttBridge, InboundCommands), ProtocolError> {
        self.validate()?;

        let counter = BRIDGE_CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let client_id = format!(
            "{}_{}_{}",
            self.config.client_id_prefix,
            std::process::id(),
            counter
        );

        let mut mqtt_options = MqttOptions::new(&client_id, &self.config.host, self.config.port);
        mqtt_options.set_keep_alive(self.config.keep_alive);
        mqtt_options.set_clean_session(true);

        if let Some((ref username, ref password)) = self.config.credentials {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, 10);

        let broker = MqttBridge {
            inner: Arc::new(MqttBridgeInner {
                client,
                config: self.config.clone(),
                connected: AtomicBool::new(false),
            }),
        };

        let (inbound_tx, inbound_rx) = mpsc::channel(self.config.command_queue_capacity);
        let (connack_tx, connack_rx) = oneshot::channel();

        let broker_clone = broker.clone();
        tokio::spawn(async move {
            handle_bridge_events(event_loop, broker_clone, inbound_tx, Some(connack_tx)).await;
        });

        let timeout = self.config.connection_timeout;
        match tokio::time::timeout(timeout, connack_rx).await {
            Ok(Ok(())) => {
                tracing::info!(
                    host = %self.config.host,
                    port = %self.config.port,
                    "Connected to MQTT broker"
                );
            }
            Ok(Err(_)) => {
                return Err(ProtocolError::ConnectionFailed(
                    "MQTT event loop terminated unexpectedly".to_string(),
                ));
            }
            Err(_) => {
                // Stop the background reconnect attempts.
                let _ = broker.inner.client.try_disconnect();
                return Err(ProtocolError::ConnectionFailed(format!(
                    "MQTT connection timeout after {}s",
                    timeout.as_secs()
                )));
            }
        }

        Ok((broker, inbound_rx))
    }

    fn validate(&self) -> Result<(), ProtocolError> {
        if self.config.host.is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "MQTT broker host is required".to_string(),
            ));
        }
        let topics = &self.config.topics;
        if topics.command.is_empty() || topics.status.is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "command and status topics are required".to_string(),
            ));
        }
        if topics.status.contains(['+', '#']) {
            return Err(ProtocolError::InvalidAddress(format!(
                "status topic may not contain wildcards: {}",
                topics.status
            )));
        }
        Ok(())
    }
}

/// Parses an MQTT URL into host and optional port.
fn parse_mqtt_url(url: &str) -> Result<(String, Option<u16>), ProtocolError> {
    let url = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    match url.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse()
                .map_err(|_| ProtocolError::InvalidAddress(format!("Invalid port: {port}")))?;
            Ok((host.to_string(), Some(port)))
        }
        None => Ok((url.to_string(), None)),
    }
}

/// Drives the MQTT event loop until the bridge disconnects or the command
/// receiver is dropped.
async fn handle_bridge_events(
    mut event_loop: EventLoop,
    broker: MqttBridge,
    inbound_tx: mpsc::Sender<Vec<u8>>,
    connack_tx: Option<oneshot::Sender<()>>,
) {
    let mut connack_tx = connack_tx;

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT broker connected");
                broker.inner.connected.store(true, Ordering::Release);
                broker.subscribe_commands();
                if let Some(tx) = connack_tx.take() {
                    let _ = tx.send(());
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                if publish.topic != broker.inner.config.topics.command {
                    continue;
                }
                tracing::debug!(
                    topic = %publish.topic,
                    payload = %String::from_utf8_lossy(&publish.payload),
                    "Command received"
                );
                match inbound_tx.try_send(publish.payload.to_vec()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(payload)) => {
                        tracing::warn!(
                            capacity = broker.inner.config.command_queue_capacity,
                            payload = %String::from_utf8_lossy(&payload),
                            "Command queue full, dropping command"
                        );
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        tracing::debug!("Command receiver dropped, stopping event loop");
                        break;
                    }
                }
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                tracing::info!("MQTT broker disconnected");
                broker.inner.connected.store(false, Ordering::Release);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "MQTT broker event loop error");
                broker.inner.connected.store(false, Ordering::Release);
                if inbound_tx.is_closed() {
                    break;
                }
                tokio::time::sleep(broker.inner.config.reconnect_delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_default_values() {
        let builder = MqttBridgeBuilder::default();
        assert_eq!(builder.config.port, 1883);
        assert!(builder.config.host.is_empty());
        assert!(builder.config.credentials.is_none());
        assert_eq!(builder.config.keep_alive, Duration::from_secs(30));
        assert_eq!(builder.config.connection_timeout, Duration::from_secs(10));
        assert_eq!(builder.config.reconnect_delay, Duration::from_secs(5));
        assert_eq!(builder.config.topics, TopicConfig::default());
        assert_eq!(
            builder.config.command_queue_capacity(),
            DEFAULT_COMMAND_QUEUE_CAPACITY
        );
    }

    #[test]
    fn builder_command_queue_capacity() {
        let builder = MqttBridgeBuilder::default().command_queue_capacity(128);
        assert_eq!(builder.config.command_queue_capacity(), 128);

        let builder = MqttBridgeBuilder::default().command_queue_capacity(0);
        assert_eq!(builder.config.command_queue_capacity(), 1);
    }

    #[test]
    fn builder_chain() {
        let builder = MqttBridgeBuilder::default()
            .host("192.168.14.12")
            .port(8883)
            .credentials("admin", "secret")
            .keep_alive(Duration::from_secs(45))
            .reconnect_delay(Duration::from_secs(1))
            .client_id_prefix("bridge")
            .topics(TopicConfig::new("lh/cmd", "lh/state"));

        assert_eq!(builder.config.host, "192.168.14.12");
        assert_eq!(builder.config.port, 8883);
        assert!(builder.config.credentials.is_some());
        assert_eq!(builder.config.keep_alive, Duration::from_secs(45));
        assert_eq!(builder.config.reconnect_delay, Duration::from_secs(1));
        assert_eq!(builder.config.client_id_prefix, "bridge");
        assert_eq!(builder.config.topics().status, "lh/state");
    }

    #[test]
    fn builder_broker_url() {
        let builder = MqttBridgeBuilder::default()
            .broker_url("mqtt://broker.local:8883")
            .unwrap();
        assert_eq!(builder.config.host, "broker.local");
        assert_eq!(builder.config.port, 8883);
    }

    #[test]
    fn builder_broker_url_without_port_keeps_port() {
        let builder = MqttBridgeBuilder::default()
            .port(1999)
            .broker_url("192.168.14.12")
            .unwrap();
        assert_eq!(builder.config.host, "192.168.14.12");
        assert_eq!(builder.config.port, 1999);
    }

    #[test]
    fn parse_mqtt_url_without_port() {
        let (host, port) = parse_mqtt_url("192.168.14.12").unwrap();
        assert_eq!(host, "192.168.14.12");
        assert_eq!(port, None);
    }

    #[test]
    fn parse_mqtt_url_tcp_scheme() {
        let (host, port) = parse_mqtt_url("tcp://broker.local:1884").unwrap();
        assert_eq!(host, "broker.local");
        assert_eq!(port, Some(1884));
    }

    #[test]
    fn parse_mqtt_url_bad_port() {
        let err = parse_mqtt_url("mqtt://broker:abc").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidAddress(_)));
    }

    #[tokio::test]
    async fn builder_missing_host_fails() {
        let result = MqttBridgeBuilder::default().build().await;
        assert!(matches!(result, Err(ProtocolError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn builder_wildcard_status_topic_fails() {
        let result = MqttBridgeBuilder::default()
            .host("127.0.0.1")
            .topics(TopicConfig::new("lh/cmd", "lh/#"))
            .build()
            .await;
        assert!(matches!(result, Err(ProtocolError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn builder_empty_command_topic_fails() {
        let result = MqttBridgeBuilder::default()
            .host("127.0.0.1")
            .topics(TopicConfig::new("", "lh/state"))
            .build()
            .await;
        assert!(matches!(result, Err(ProtocolError::InvalidAddress(_))));
    }
}
