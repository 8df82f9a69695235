// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Result of one control attempt.

use crate::error::SessionError;
use crate::types::PowerState;

/// Per-device result of [`PowerController::apply`](super::PowerController::apply).
#[derive(Debug)]
pub enum ControlOutcome {
    /// The device reported the requested state.
    Confirmed(PowerState),
    /// Retries ran out while the device kept reporting another state.
    Unconfirmed {
        /// The requested state.
        attempted: PowerState,
        /// The state reported by the last read, `None` if the device returned
        /// a value that is neither on nor standby.
        observed: Option<PowerState>,
    },
    /// The session could not be opened or broke mid-protocol.
    ConnectionFailed(SessionError),
}

impl ControlOutcome {
    /// Returns `true` if the device confirmed the requested state.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }

    /// Returns `true` if retries ran out without confirmation.
    #[must_use]
    pub fn is_unconfirmed(&self) -> bool {
        matches!(self, Self::Unconfirmed { .. })
    }

    /// Returns `true` if the transport failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_))
    }
}
