// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Confirm-by-readback power control of a single base station.
//!
//! [`PowerController::apply`] drives one [`DeviceSession`] through an explicit
//! state machine:
//!
//! ```text
//! Connecting ──fail──────────────────────────────────────────▶ Failed
//!     │
//!     ▼
//! Writing(n) ──▶ Settling(n) ──▶ Reading(n) ──observed == target──▶ Confirmed
//!     ▲                             │
//!     └──────── n < max_attempts ◀──┤
//!                                   └── n == max_attempts ──▶ Unconfirmed
//!
//! any write/read transport failure ──▶ Failed
//! ```
//!
//! A read that returns a value other than on or standby counts as not
//! confirmed, like a read of the other state.
//!
//! The session is disconnected exactly once whenever `Connecting` succeeded,
//! whatever terminal state is reached.

mod outcome;
mod state;

pub use outcome::ControlOutcome;
pub use state::ControlState;

use crate::config::RetryPolicy;
use crate::error::SessionError;
use crate::session::{Connector, DeviceSession};
use crate::types::{DeviceAddress, PowerState};

/// Applies power states to devices reached through a [`Connector`].
#[derive(Debug)]
pub struct PowerController<C> {
    connector: C,
    policy: RetryPolicy,
}

impl<C: Connector> PowerController<C> {
    /// Creates a controller with the default retry policy.
    #[must_use]
    pub fn new(connector: C) -> Self {
        Self::with_policy(connector, RetryPolicy::default())
    }

    /// Creates a controller with a custom retry policy.
    #[must_use]
    pub fn with_policy(connector: C, policy: RetryPolicy) -> Self {
        Self { connector, policy }
    }

    /// Returns the retry policy.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Returns the underlying connector.
    #[must_use]
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Drives the device at `address` to `target` and reports the outcome.
    ///
    /// The connection step is not retried. Write/read cycles are retried up to
    /// the policy's attempt limit, with the settle delay between each write
    /// and its confirmation read.
    pub async fn apply(&self, address: &DeviceAddress, target: PowerState) -> ControlOutcome {
        tracing::info!(address = %address, "Connecting to base station");
        tracing::trace!(address = %address, state = ControlState::Connecting.name(), "Control state");

        let mut session = match self.connector.connect(address).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(address = %address, error = %e, "Connection failed");
                return ControlOutcome::ConnectionFailed(e);
            }
        };
        tracing::info!(address = %address, target = %target, "Connected, applying power state");

        let mut state = ControlState::Writing { attempt: 1 };
        let outcome = loop {
            tracing::trace!(
                address = %address,
                state = state.name(),
                attempt = state.attempt(),
                "Control state"
            );
            match state {
                ControlState::Confirmed => break ControlOutcome::Confirmed(target),
                ControlState::Unconfirmed { observed } => {
                    break ControlOutcome::Unconfirmed {
                        attempted: target,
                        observed,
                    };
                }
                ControlState::Failed(e) => break ControlOutcome::ConnectionFailed(e),
                pending => {
                    state = self.step(pending, &mut session, address, target).await;
                }
            }
        };

        match session.disconnect().await {
            Ok(()) => tracing::debug!(address = %address, "Disconnected"),
            Err(e) => tracing::warn!(address = %address, error = %e, "Disconnect failed"),
        }

        outcome
    }

    /// Performs the work of one non-terminal state and returns the next one.
    ///
    /// Terminal states and `Connecting` are returned unchanged; connecting is
    /// handled by [`Self::apply`] because it produces the session.
    async fn step<S: DeviceSession>(
        &self,
        state: ControlState,
        session: &mut S,
        address: &DeviceAddress,
        target: PowerState,
    ) -> ControlState {
        match state {
            ControlState::Writing { attempt } => {
                tracing::debug!(address = %address, attempt, target = %target, "Writing power state");
                match session.write_power(target).await {
                    Ok(()) => ControlState::Settling { attempt },
                    Err(e) => ControlState::Failed(e),
                }
            }
            ControlState::Settling { attempt } => {
                tokio::time::sleep(self.policy.settle_delay).await;
                ControlState::Reading { attempt }
            }
            ControlState::Reading { attempt } => {
                let observed = match session.read_power().await {
                    Ok(state) => Some(state),
                    Err(SessionError::UnexpectedValue(value)) => {
                        tracing::debug!(
                            address = %address,
                            attempt,
                            value = ?value,
                            "Unrecognized power state"
                        );
                        None
                    }
                    Err(e) => return ControlState::Failed(e),
                };

                if observed == Some(target) {
                    tracing::debug!(address = %address, attempt, "Power state confirmed");
                    ControlState::Confirmed
                } else if attempt < self.policy.max_attempts {
                    tracing::debug!(
                        address = %address,
                        attempt,
                        observed = ?observed,
                        "Power state not confirmed, retrying"
                    );
                    ControlState::Writing {
                        attempt: attempt + 1,
                    }
                } else {
                    ControlState::Unconfirmed { observed }
                }
            }
            other => other,
        }
    }
}
