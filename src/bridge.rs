// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The bridge service: commands in, device control, status out.
//!
//! A [`Bridge`] joins a [`CommandDispatcher`] to a [`StatusPublisher`]. Commands
//! arrive either once, from the process arguments ([`Bridge::run_batch`]), or
//! as a stream of command topic payloads ([`Bridge::serve`]). Each command is
//! applied to all of its devices before the next one is looked at, so at most
//! one wireless session is open at any time.
//!
//! Shutdown ([`Bridge::serve_until`]) only stops intake. A command that has
//! started is always applied to every device and every session it opened is
//! closed.

use std::future::Future;

use tokio::sync::mpsc;

use crate::command::Command;
use crate::dispatcher::{CommandDispatcher, DispatchSummary};
use crate::protocol::StatusPublisher;
use crate::session::Connector;
use crate::types::is_valid_address;

/// Routes commands to devices and outcomes to the status topic.
#[derive(Debug)]
pub struct Bridge<C, P> {
    dispatcher: CommandDispatcher<C>,
    publisher: P,
}

impl<C: Connector, P: StatusPublisher> Bridge<C, P> {
    /// Creates a bridge.
    #[must_use]
    pub fn new(dispatcher: CommandDispatcher<C>, publisher: P) -> Self {
        Self {
            dispatcher,
            publisher,
        }
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &CommandDispatcher<C> {
        &self.dispatcher
    }

    /// Returns the status publisher.
    #[must_use]
    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Applies one command and publishes a status event per reported device.
    ///
    /// Publish failures are logged; the remaining devices are still processed.
    pub async fn handle_command(&self, command: Command) -> DispatchSummary {
        let mut dispatch = self.dispatcher.dispatch(command);
        while let Some(event) = dispatch.next_event().await {
            match self.publisher.publish_status(&event).await {
                Ok(()) => tracing::info!(
                    address = %event.address(),
                    state = %event.state(),
                    "Status published"
                ),
                Err(e) => tracing::warn!(
                    address = %event.address(),
                    error = %e,
                    "Failed to publish status"
                ),
            }
        }

        let summary = dispatch.summary();
        tracing::debug!(?summary, "Command finished");
        summary
    }

    /// Applies the command given on the command line.
    ///
    /// Lists the addresses that will be switched first, and reports when
    /// none of the given addresses is valid.
    pub async fn run_batch(&self, command: Command) -> DispatchSummary {
        tracing::info!(state = %command.target(), "Switching base stations");

        let valid: Vec<&str> = command
            .addresses()
            .iter()
            .map(String::as_str)
            .filter(|a| is_valid_address(a))
            .collect();
        if valid.is_empty() {
            tracing::error!("No (valid) base station MAC addresses given");
        }
        for address in valid {
            tracing::info!(address = %address, "Queued");
        }

        self.handle_command(command).await
    }

    /// Decodes and applies one command topic payload.
    ///
    /// Returns `None` if the payload did not decode to a command; nothing is
    /// sent to any device in that case.
    pub async fn handle_message(&self, payload: &[u8]) -> Option<DispatchSummary> {
        match Command::from_message(payload) {
            Ok(command) => Some(self.handle_command(command).await),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    payload = %String::from_utf8_lossy(payload),
                    "Bad message structure"
                );
                None
            }
        }
    }

    /// Applies command payloads in arrival order until the channel closes.
    pub async fn serve(&self, inbound: mpsc::Receiver<Vec<u8>>) {
        self.serve_until(inbound, std::future::pending()).await;
    }

    /// Applies command payloads in arrival order until the channel closes or
    /// `shutdown` completes.
    ///
    /// `shutdown` is only checked between commands: a command being applied
    /// when it completes runs to the end first.
    pub async fn serve_until<F>(&self, mut inbound: mpsc::Receiver<Vec<u8>>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        tracing::info!("Waiting for commands");

        loop {
            let payload = tokio::select! {
                biased;
                () = &mut shutdown => {
                    tracing::info!("Shutdown requested, no longer accepting commands");
                    return;
                }
                payload = inbound.recv() => payload,
            };

            let Some(payload) = payload else {
                tracing::info!("Command channel closed");
                return;
            };
            self.handle_message(&payload).await;
        }
    }
}
