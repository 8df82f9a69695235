// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the bridge.
//!
//! Failures are grouped by where they happen: value validation, decoding of
//! inbound messages, the wireless device session, and the MQTT broker
//! connection. None of them is fatal to a running bridge; each is recovered
//! at the level of the command or device it belongs to.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred while decoding an inbound message.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error occurred while talking to a base station.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Error occurred on the broker connection.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Errors related to value validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The string is not a six-octet colon-separated hardware address.
    #[error("invalid MAC address format: {0}")]
    InvalidAddress(String),

    /// An invalid power state string was provided.
    #[error("invalid power state: {0}")]
    InvalidPowerState(String),

    /// The batch command word is neither `ON` nor `OFF`.
    #[error("unrecognized command: {0}")]
    UnrecognizedCommand(String),

    /// No command word was given at all.
    #[error("no command given")]
    MissingCommand,
}

/// Errors related to decoding command messages.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is absent from the message.
    #[error("missing field in message: {0}")]
    MissingField(&'static str),
}

/// Errors raised by a wireless device session.
///
/// Any of these aborts the current device attempt; the dispatcher moves on
/// to the next address.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No Bluetooth adapter is available on this host.
    #[error("no Bluetooth adapter found")]
    AdapterUnavailable,

    /// No peripheral with the requested address was seen while scanning.
    #[error("device {0} not found")]
    DeviceNotFound(String),

    /// The link could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Writing the power attribute failed.
    #[error("write failed: {0}")]
    Write(String),

    /// Reading the power attribute failed.
    #[error("read failed: {0}")]
    Read(String),

    /// The device does not expose the power characteristic.
    #[error("characteristic {0} not found")]
    CharacteristicNotFound(uuid::Uuid),

    /// The device reported a value outside the power state encoding.
    #[error("unexpected power value: {0:02x?}")]
    UnexpectedValue(Vec<u8>),

    /// A transport step did not complete in time.
    #[error("operation timed out after {0} ms")]
    Timeout(u64),

    /// Error from the BLE stack.
    #[cfg(feature = "ble")]
    #[error("BLE error: {0}")]
    Ble(#[from] btleplug::Error),
}

/// Errors related to the MQTT broker connection.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// MQTT client request failed.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Connection to the broker failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid broker address or topic configuration.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Internal channel was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::InvalidAddress("AA:BB".to_string());
        assert_eq!(err.to_string(), "invalid MAC address format: AA:BB");
    }

    #[test]
    fn error_from_value_error() {
        let err: Error = ValueError::MissingCommand.into();
        assert!(matches!(err, Error::Value(ValueError::MissingCommand)));
    }

    #[test]
    fn parse_error_display() {
        let err = ParseError::MissingField("command");
        assert_eq!(err.to_string(), "missing field in message: command");
    }

    #[test]
    fn session_error_unexpected_value_display() {
        let err = SessionError::UnexpectedValue(vec![0x02]);
        assert_eq!(err.to_string(), "unexpected power value: [02]");
    }
}
