// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power commands and the two sources they come from.
//!
//! A [`Command`] pairs a target [`PowerState`] with the candidate addresses
//! it applies to. Commands are built either once from the process arguments
//! ([`Command::from_args`]) or once per message received on the command topic
//! ([`Command::from_message`]).
//!
//! | Source | Input | Addresses |
//! |--------|-------|-----------|
//! | Batch | `ON AA:BB:CC:DD:EE:FF 11:22:33:44:55:66` | one or more |
//! | Subscription | `{"mac": "AA:BB:CC:DD:EE:FF", "command": "OFF"}` | exactly one |
//!
//! # Examples
//!
//! ```
//! use lighthouse_bridge::command::Command;
//! use lighthouse_bridge::types::PowerState;
//!
//! let cmd = Command::from_args(["ON", "AA:BB:CC:DD:EE:FF"]).unwrap();
//! assert_eq!(cmd.target(), PowerState::On);
//! assert_eq!(cmd.addresses(), ["AA:BB:CC:DD:EE:FF"]);
//!
//! let cmd = Command::from_message(br#"{"mac":"11:22:33:44:55:66","command":"OFF"}"#).unwrap();
//! assert_eq!(cmd.target(), PowerState::Standby);
//! ```

mod message;

pub use message::CommandMessage;

use crate::error::{Error, ValueError};
use crate::types::PowerState;

/// A requested power state for an ordered list of candidate addresses.
///
/// Addresses are kept exactly as received, in order and including duplicates.
/// Validation happens at dispatch time so that each invalid candidate gets its
/// own diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    target: PowerState,
    addresses: Vec<String>,
}

impl Command {
    /// Creates a command from a target and candidate addresses.
    #[must_use]
    pub fn new<I, S>(target: PowerState, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target,
            addresses: addresses.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds the batch command from process arguments (program name excluded).
    ///
    /// The first argument is the command word, `ON` or `OFF`; the rest are
    /// candidate addresses.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::MissingCommand` when there are no arguments and
    /// `ValueError::UnrecognizedCommand` when the first one is not a command
    /// word.
    pub fn from_args<I, S>(args: I) -> Result<Self, ValueError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let word = args.next().ok_or(ValueError::MissingCommand)?;
        let target = parse_command_word(&word)?;
        Ok(Self {
            target,
            addresses: args.collect(),
        })
    }

    /// Decodes a single-address command from a command topic payload.
    ///
    /// # Errors
    ///
    /// Returns a parse error if the payload is not a JSON object carrying both
    /// `mac` and `command`, and a value error if `command` is not a command
    /// word.
    pub fn from_message(payload: &[u8]) -> Result<Self, Error> {
        let message = CommandMessage::from_slice(payload)?;
        let target = parse_command_word(&message.command)?;
        Ok(Self {
            target,
            addresses: vec![message.mac],
        })
    }

    /// Returns the requested power state.
    #[must_use]
    pub fn target(&self) -> PowerState {
        self.target
    }

    /// Returns the candidate addresses in the order they were given.
    #[must_use]
    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    /// Returns whether the command names no address at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Consumes the command, returning its parts.
    #[must_use]
    pub fn into_parts(self) -> (PowerState, Vec<String>) {
        (self.target, self.addresses)
    }
}

/// Maps a command word to its target state. The match is case-sensitive.
fn parse_command_word(word: &str) -> Result<PowerState, ValueError> {
    word.parse::<PowerState>()
        .map_err(|_| ValueError::UnrecognizedCommand(word.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;

    #[test]
    fn from_args_on() {
        let cmd = Command::from_args(["ON", "AA:BB:CC:DD:EE:FF", "11:22:33:44:55:66"]).unwrap();
        assert_eq!(cmd.target(), PowerState::On);
        assert_eq!(cmd.addresses(), ["AA:BB:CC:DD:EE:FF", "11:22:33:44:55:66"]);
    }

    #[test]
    fn from_args_off_is_standby() {
        let cmd = Command::from_args(["OFF", "AA:BB:CC:DD:EE:FF"]).unwrap();
        assert_eq!(cmd.target(), PowerState::Standby);
    }

    #[test]
    fn from_args_keeps_duplicates_and_order() {
        let cmd = Command::from_args(["ON", "b", "a", "b"]).unwrap();
        assert_eq!(cmd.addresses(), ["b", "a", "b"]);
    }

    #[test]
    fn from_args_without_addresses() {
        let cmd = Command::from_args(["OFF"]).unwrap();
        assert!(cmd.is_empty());
    }

    #[test]
    fn from_args_empty() {
        let err = Command::from_args(Vec::<String>::new()).unwrap_err();
        assert_eq!(err, ValueError::MissingCommand);
    }

    #[test]
    fn from_args_unrecognized() {
        let err = Command::from_args(["TOGGLE", "AA:BB:CC:DD:EE:FF"]).unwrap_err();
        assert_eq!(err, ValueError::UnrecognizedCommand("TOGGLE".to_string()));
    }

    #[test]
    fn from_args_command_word_is_case_sensitive() {
        let err = Command::from_args(["on", "AA:BB:CC:DD:EE:FF"]).unwrap_err();
        assert_eq!(err, ValueError::UnrecognizedCommand("on".to_string()));
        assert!(Command::from_args(["Off", "AA:BB:CC:DD:EE:FF"]).is_err());
    }

    #[test]
    fn from_message_command_word_is_case_sensitive() {
        let err = Command::from_message(br#"{"mac":"AA:BB:CC:DD:EE:FF","command":"oFf"}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Value(ValueError::UnrecognizedCommand(ref word)) if word == "oFf"
        ));
    }

    #[test]
    fn from_message_single_address() {
        let cmd =
            Command::from_message(br#"{"mac":"AA:BB:CC:DD:EE:FF","command":"ON"}"#).unwrap();
        assert_eq!(cmd, Command::new(PowerState::On, ["AA:BB:CC:DD:EE:FF"]));
    }

    #[test]
    fn from_message_missing_command() {
        let err = Command::from_message(br#"{"mac":"11:22:33:44:55:66"}"#).unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ParseError::MissingField("command"))
        ));
    }

    #[test]
    fn from_message_unrecognized_command() {
        let err = Command::from_message(br#"{"mac":"11:22:33:44:55:66","command":"BLINK"}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Value(ValueError::UnrecognizedCommand(ref word)) if word == "BLINK"
        ));
    }

    #[test]
    fn into_parts() {
        let (target, addresses) = Command::new(PowerState::Standby, ["x"]).into_parts();
        assert_eq!(target, PowerState::Standby);
        assert_eq!(addresses, vec!["x".to_string()]);
    }
}
