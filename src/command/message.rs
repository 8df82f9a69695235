// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire format of the command topic.

use serde::Deserialize;

use crate::error::ParseError;

/// A decoded command topic message.
///
/// The payload is a JSON object `{"mac": "<address>", "command": "ON"|"OFF"}`.
/// Unknown fields are ignored. Both fields are required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMessage {
    /// Candidate device address, not yet validated.
    pub mac: String,
    /// Command word, not yet interpreted.
    pub command: String,
}

/// Raw shape with optional fields so a missing field is reported by name.
#[derive(Debug, Deserialize)]
struct RawCommandMessage {
    mac: Option<String>,
    command: Option<String>,
}

impl CommandMessage {
    /// Decodes a message from a raw payload.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` for a payload that is not a JSON object with
    /// string fields, and `ParseError::MissingField` when `mac` or `command`
    /// is absent.
    pub fn from_slice(payload: &[u8]) -> Result<Self, ParseError> {
        let raw: RawCommandMessage = serde_json::from_slice(payload)?;
        let mac = raw.mac.ok_or(ParseError::MissingField("mac"))?;
        let command = raw.command.ok_or(ParseError::MissingField("command"))?;
        Ok(Self { mac, command })
    }
}
