// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan-out of one command over its addresses.
//!
//! [`CommandDispatcher::dispatch`] returns a [`Dispatch`], a lazy sequence
//! that controls one device per call to [`Dispatch::next_event`]. Devices are
//! handled strictly one after another, in command order:
//!
//! - an invalid address is skipped with a diagnostic
//! - a confirmed device yields a [`StatusEvent`]
//! - an unconfirmed device yields an event or nothing, per [`UnconfirmedPolicy`]
//! - a transport failure yields nothing and a diagnostic
//!
//! # Examples
//!
//! ```ignore
//! let dispatcher = CommandDispatcher::new(PowerController::new(connector));
//! let mut dispatch = dispatcher.dispatch(Command::from_args(["ON", "AA:BB:CC:DD:EE:FF"])?);
//! while let Some(event) = dispatch.next_event().await {
//!     println!("{}", event.to_payload());
//! }
//! ```

use crate::command::Command;
use crate::config::UnconfirmedPolicy;
use crate::controller::{ControlOutcome, PowerController};
use crate::event::StatusEvent;
use crate::session::Connector;
use crate::types::{DeviceAddress, PowerState};

/// Runs commands through a [`PowerController`].
#[derive(Debug)]
pub struct CommandDispatcher<C> {
    controller: PowerController<C>,
    unconfirmed: UnconfirmedPolicy,
}

impl<C: Connector> CommandDispatcher<C> {
    /// Creates a dispatcher that reports only confirmed outcomes.
    #[must_use]
    pub fn new(controller: PowerController<C>) -> Self {
        Self {
            controller,
            unconfirmed: UnconfirmedPolicy::default(),
        }
    }

    /// Sets what to report for unconfirmed devices.
    #[must_use]
    pub fn with_unconfirmed_policy(mut self, policy: UnconfirmedPolicy) -> Self {
        self.unconfirmed = policy;
        self
    }

    /// Returns the controller.
    #[must_use]
    pub fn controller(&self) -> &PowerController<C> {
        &self.controller
    }

    /// Starts dispatching `command`.
    ///
    /// Nothing happens until the returned sequence is polled.
    #[must_use]
    pub fn dispatch(&self, command: Command) -> Dispatch<'_, C> {
        let (target, addresses) = command.into_parts();
        Dispatch {
            dispatcher: self,
            target,
            remaining: addresses.into_iter(),
            summary: DispatchSummary::default(),
        }
    }

    /// Maps a device outcome to the event to report, if any.
    fn report(&self, address: DeviceAddress, outcome: ControlOutcome) -> Option<StatusEvent> {
        match outcome {
            ControlOutcome::Confirmed(state) => {
                tracing::info!(address = %address, state = %state, "Power state confirmed");
                Some(StatusEvent::new(address, state))
            }
            ControlOutcome::Unconfirmed {
                attempted,
                observed,
            } => {
                tracing::warn!(
                    address = %address,
                    attempted = %attempted,
                    observed = ?observed,
                    "Power state not confirmed after retries"
                );
                match self.unconfirmed {
                    UnconfirmedPolicy::Suppress => None,
                    UnconfirmedPolicy::ReportTarget => Some(StatusEvent::new(address, attempted)),
                    UnconfirmedPolicy::ReportObserved => {
                        observed.map(|state| StatusEvent::new(address, state))
                    }
                }
            }
            ControlOutcome::ConnectionFailed(e) => {
                tracing::warn!(address = %address, error = %e, "Device control failed");
                None
            }
        }
    }
}

/// Counters for one dispatched command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Candidates rejected by address validation.
    pub invalid: usize,
    /// Devices that confirmed the requested state.
    pub confirmed: usize,
    /// Devices that never confirmed it.
    pub unconfirmed: usize,
    /// Devices whose session failed.
    pub failed: usize,
    /// Status events produced.
    pub events: usize,
}

/// Lazy sequence of status events for one command.
///
/// Each call to [`Dispatch::next_event`] controls devices until one produces
/// an event or the addresses run out. Once exhausted it stays exhausted.
#[derive(Debug)]
pub struct Dispatch<'a, C> {
    dispatcher: &'a CommandDispatcher<C>,
    target: PowerState,
    remaining: std::vec::IntoIter<String>,
    summary: DispatchSummary,
}

impl<C: Connector> Dispatch<'_, C> {
    /// Returns the state being applied.
    #[must_use]
    pub fn target(&self) -> PowerState {
        self.target
    }

    /// Returns the counters accumulated so far.
    #[must_use]
    pub fn summary(&self) -> DispatchSummary {
        self.summary
    }

    /// Controls the next devices until one yields a status event.
    ///
    /// Returns `None` once every address has been processed.
    pub async fn next_event(&mut self) -> Option<StatusEvent> {
        while let Some(candidate) = self.remaining.next() {
            let address = match DeviceAddress::new(candidate) {
                Ok(address) => address,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping address");
                    self.summary.invalid += 1;
                    continue;
                }
            };

            let outcome = self
                .dispatcher
                .controller
                .apply(&address, self.target)
                .await;
            match &outcome {
                ControlOutcome::Confirmed(_) => self.summary.confirmed += 1,
                ControlOutcome::Unconfirmed { .. } => self.summary.unconfirmed += 1,
                ControlOutcome::ConnectionFailed(_) => self.summary.failed += 1,
            }

            if let Some(event) = self.dispatcher.report(address, outcome) {
                self.summary.events += 1;
                return Some(event);
            }
        }
        None
    }

    /// Drains the sequence into a vector.
    pub async fn collect_events(mut self) -> (Vec<StatusEvent>, DispatchSummary) {
        let mut events = Vec::new();
        while let Some(event) = self.next_event().await {
            events.push(event);
        }
        (events, self.summary)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    use super::*;
    use crate::config::RetryPolicy;
    use crate::error::SessionError;
    use crate::session::DeviceSession;

    /// Devices keyed by upper-case address. Each one either always reports a
    /// fixed state or is unreachable when absent.
    #[derive(Default)]
    struct FakeRadio {
        reports: HashMap<String, PowerState>,
        connected: RefCell<Vec<String>>,
        disconnects: Cell<u32>,
    }

    impl FakeRadio {
        fn with(mut self, address: &str, report: PowerState) -> Self {
            self.reports.insert(address.to_uppercase(), report);
            self
        }
    }

    struct FakeSession<'a> {
        radio: &'a FakeRadio,
        report: PowerState,
    }

    impl<'a> Connector for &'a FakeRadio {
        type Session = FakeSession<'a>;

        async fn connect(&self, address: &DeviceAddress) -> Result<FakeSession<'a>, SessionError> {
            self.connected.borrow_mut().push(address.to_string());
            let report = self
                .reports
                .get(&address.as_str().to_uppercase())
                .copied()
                .ok_or_else(|| SessionError::DeviceNotFound(address.to_string()))?;
            Ok(FakeSession {
                radio: *self,
                report,
            })
        }
    }

    impl DeviceSession for FakeSession<'_> {
        async fn write_power(&mut self, _state: PowerState) -> Result<(), SessionError> {
            Ok(())
        }

        async fn read_power(&mut self) -> Result<PowerState, SessionError> {
            Ok(self.report)
        }

        async fn disconnect(self) -> Result<(), SessionError> {
            self.radio.disconnects.set(self.radio.disconnects.get() + 1);
            Ok(())
        }
    }

    fn dispatcher(radio: &FakeRadio) -> CommandDispatcher<&FakeRadio> {
        CommandDispatcher::new(PowerController::with_policy(radio, RetryPolicy::default()))
    }

    #[tokio::test(start_paused = true)]
    async fn one_valid_one_invalid_address() {
        let radio = FakeRadio::default().with("AA:BB:CC:DD:EE:FF", PowerState::On);
        let dispatcher = dispatcher(&radio);

        let command = Command::new(PowerState::On, ["AA:BB:CC:DD:EE:FF", "AA:BB:CC:DD:EE"]);
        let (events, summary) = dispatcher.dispatch(command).collect_events().await;

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].address().as_str(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(events[0].state(), PowerState::On);
        assert_eq!(summary.invalid, 1);
        assert_eq!(summary.confirmed, 1);
        assert_eq!(*radio.connected.borrow(), ["AA:BB:CC:DD:EE:FF"]);
    }

    #[tokio::test(start_paused = true)]
    async fn events_follow_command_order_with_duplicates() {
        let radio = FakeRadio::default()
            .with("11:11:11:11:11:11", PowerState::Standby)
            .with("22:22:22:22:22:22", PowerState::Standby);
        let dispatcher = dispatcher(&radio);

        let command = Command::new(
            PowerState::Standby,
            ["22:22:22:22:22:22", "11:11:11:11:11:11", "22:22:22:22:22:22"],
        );
        let (events, _) = dispatcher.dispatch(command).collect_events().await;

        let order: Vec<&str> = events.iter().map(|e| e.address().as_str()).collect();
        assert_eq!(
            order,
            ["22:22:22:22:22:22", "11:11:11:11:11:11", "22:22:22:22:22:22"]
        );
        assert_eq!(radio.disconnects.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn connection_failure_yields_no_event_and_continues() {
        let radio = FakeRadio::default().with("22:22:22:22:22:22", PowerState::On);
        let dispatcher = dispatcher(&radio);

        let command = Command::new(PowerState::On, ["11:11:11:11:11:11", "22:22:22:22:22:22"]);
        let (events, summary) = dispatcher.dispatch(command).collect_events().await;

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].address().as_str(), "22:22:22:22:22:22");
        assert_eq!(summary.failed, 1);
        assert_eq!(radio.connected.borrow().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unconfirmed_is_suppressed_by_default() {
        let radio = FakeRadio::default().with("AA:BB:CC:DD:EE:FF", PowerState::Standby);
        let dispatcher = dispatcher(&radio);

        let command = Command::new(PowerState::On, ["AA:BB:CC:DD:EE:FF"]);
        let (events, summary) = dispatcher.dispatch(command).collect_events().await;

        assert!(events.is_empty());
        assert_eq!(summary.unconfirmed, 1);
        assert_eq!(summary.events, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unconfirmed_report_policies() {
        let radio = FakeRadio::default().with("AA:BB:CC:DD:EE:FF", PowerState::Standby);
        let command = Command::new(PowerState::On, ["AA:BB:CC:DD:EE:FF"]);

        let target = dispatcher(&radio).with_unconfirmed_policy(UnconfirmedPolicy::ReportTarget);
        let (events, _) = target.dispatch(command.clone()).collect_events().await;
        assert_eq!(events[0].state(), PowerState::On);

        let observed =
            dispatcher(&radio).with_unconfirmed_policy(UnconfirmedPolicy::ReportObserved);
        let (events, _) = observed.dispatch(command).collect_events().await;
        assert_eq!(events[0].state(), PowerState::Standby);
    }

    #[test]
    fn unrecognized_observation_is_never_reported_as_observed() {
        let radio = FakeRadio::default();
        let address = DeviceAddress::new("AA:BB:CC:DD:EE:FF").unwrap();
        let outcome = || ControlOutcome::Unconfirmed {
            attempted: PowerState::On,
            observed: None,
        };

        let observed =
            dispatcher(&radio).with_unconfirmed_policy(UnconfirmedPolicy::ReportObserved);
        assert!(observed.report(address.clone(), outcome()).is_none());

        let target = dispatcher(&radio).with_unconfirmed_policy(UnconfirmedPolicy::ReportTarget);
        let event = target.report(address, outcome()).unwrap();
        assert_eq!(event.state(), PowerState::On);
    }

    #[tokio::test]
    async fn empty_command_touches_no_device() {
        let radio = FakeRadio::default();
        let dispatcher = dispatcher(&radio);

        let command = Command::new(PowerState::On, ["not-an-address"]);
        let mut dispatch = dispatcher.dispatch(command);

        assert!(dispatch.next_event().await.is_none());
        assert!(dispatch.next_event().await.is_none());
        assert_eq!(dispatch.summary().invalid, 1);
        assert!(radio.connected.borrow().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dispatch_is_lazy() {
        let radio = FakeRadio::default()
            .with("11:11:11:11:11:11", PowerState::On)
            .with("22:22:22:22:22:22", PowerState::On);
        let dispatcher = dispatcher(&radio);

        let command = Command::new(PowerState::On, ["11:11:11:11:11:11", "22:22:22:22:22:22"]);
        let mut dispatch = dispatcher.dispatch(command);
        assert!(radio.connected.borrow().is_empty());

        dispatch.next_event().await;
        assert_eq!(radio.connected.borrow().len(), 1);
        assert_eq!(dispatch.target(), PowerState::On);
    }
}
