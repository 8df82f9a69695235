// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! States of the power control state machine.

use crate::error::SessionError;
use crate::types::PowerState;

/// A state of one control attempt.
///
/// `attempt` counts write/read cycles from 1.
#[derive(Debug)]
pub enum ControlState {
    /// Opening the session.
    Connecting,
    /// Writing the target state.
    Writing {
        /// Current cycle.
        attempt: u32,
    },
    /// Waiting for the device to settle after a write.
    Settling {
        /// Current cycle.
        attempt: u32,
    },
    /// Reading back the reported state.
    Reading {
        /// Current cycle.
        attempt: u32,
    },
    /// The device reported the target state.
    Confirmed,
    /// Every cycle ended with the device reporting another state.
    Unconfirmed {
        /// State reported by the last read, `None` if it was not a known
        /// power state.
        observed: Option<PowerState>,
    },
    /// The transport failed.
    Failed(SessionError),
}

impl ControlState {
    /// Returns the current cycle, if the state belongs to one.
    #[must_use]
    pub fn attempt(&self) -> Option<u32> {
        match self {
            Self::Writing { attempt } | Self::Settling { attempt } | Self::Reading { attempt } => {
                Some(*attempt)
            }
            _ => None,
        }
    }

    /// Returns a short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Writing { .. } => "writing",
            Self::Settling { .. } => "settling",
            Self::Reading { .. } => "reading",
            Self::Confirmed => "confirmed",
            Self::Unconfirmed { .. } => "unconfirmed",
            Self::Failed(_) => "failed",
        }
    }
}
