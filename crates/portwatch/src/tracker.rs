use std::time::{Duration, SystemTime};

use crate::registry::{Endpoint, Registry};
use crate::types::{EndpointId, EndpointSnapshot, PortStatus, ProbeResult, StateTransition};

/// Live monitoring state for one endpoint.
///
/// `closed_since` is set exactly while the settled status is closed;
/// `escalation_sent` marks that the one notification for the current
/// closed episode has already fired. Both clear together on recovery.
#[derive(Debug, Clone)]
pub struct EndpointState {
    pub status: PortStatus,
    pub closed_since: Option<SystemTime>,
    pub escalation_sent: bool,
    pub alarm_active: bool,
    pub last_elapsed_ms: Option<u64>,
    pub last_detail: Option<String>,
    /// Last settled (non-checking) status, used to classify transitions
    /// while `status` reads `checking`.
    settled: PortStatus,
}

impl EndpointState {
    fn new() -> Self {
        Self {
            status: PortStatus::Unknown,
            closed_since: None,
            escalation_sent: false,
            alarm_active: false,
            last_elapsed_ms: None,
            last_detail: None,
            settled: PortStatus::Unknown,
        }
    }
}

/// Per-endpoint state machine for the whole registry.
///
/// The original closure-tracking maps (closed timestamps, escalation flags
/// keyed by concatenated strings) live here as fields of each endpoint's
/// own state record. Only the scheduler pipeline mutates this, one
/// endpoint at a time.
#[derive(Debug)]
pub struct StateTracker {
    states: Vec<(Endpoint, EndpointState)>,
}

impl StateTracker {
    /// One state record per registered endpoint, all starting `unknown`.
    pub fn new(registry: &Registry) -> Self {
        let states = registry
            .endpoints()
            .iter()
            .map(|endpoint| (endpoint.clone(), EndpointState::new()))
            .collect();
        Self { states }
    }

    /// Flag an endpoint as being probed right now. Preserves the closed
    /// bookkeeping; `checking` is a transient overlay, not a settled state.
    pub fn mark_checking(&mut self, id: &EndpointId) {
        if let Some(state) = self.state_mut(id) {
            state.status = PortStatus::Checking;
        }
    }

    /// Apply a probe result and classify the transition.
    ///
    /// Unconfigured endpoints never reach this; they are skipped by the
    /// scheduler and stay `unknown`.
    pub fn apply_result(
        &mut self,
        id: &EndpointId,
        result: &ProbeResult,
        now: SystemTime,
    ) -> StateTransition {
        let Some(state) = self.state_mut(id) else {
            return StateTransition::None;
        };

        let prev = state.settled;
        state.last_elapsed_ms = Some(result.elapsed_ms);
        state.last_detail = Some(result.detail.clone());

        let transition = if result.open {
            state.status = PortStatus::Open;
            state.settled = PortStatus::Open;
            match prev {
                PortStatus::Closed => {
                    state.closed_since = None;
                    state.escalation_sent = false;
                    StateTransition::ClosedToOpen
                }
                PortStatus::Open => StateTransition::StillOpen,
                // First observation; nothing to react to.
                _ => StateTransition::None,
            }
        } else {
            state.status = PortStatus::Closed;
            state.settled = PortStatus::Closed;
            if prev == PortStatus::Closed {
                StateTransition::StillClosed
            } else {
                state.closed_since = Some(now);
                state.escalation_sent = false;
                StateTransition::OpenedToClosed
            }
        };

        transition
    }

    pub fn state(&self, id: &EndpointId) -> Option<&EndpointState> {
        self.states.iter().find(|(e, _)| e.id == *id).map(|(_, s)| s)
    }

    pub fn state_mut(&mut self, id: &EndpointId) -> Option<&mut EndpointState> {
        self.states.iter_mut().find(|(e, _)| e.id == *id).map(|(_, s)| s)
    }

    /// How long the endpoint has been continuously closed, if it is.
    pub fn closed_duration(&self, id: &EndpointId, now: SystemTime) -> Option<Duration> {
        let since = self.state(id)?.closed_since?;
        Some(now.duration_since(since).unwrap_or_default())
    }

    /// Registry-ordered view of every endpoint for the UI boundary.
    pub fn snapshot(&self) -> Vec<EndpointSnapshot> {
        self.states
            .iter()
            .map(|(endpoint, state)| EndpointSnapshot {
                id: endpoint.id.clone(),
                host: endpoint.host.clone(),
                port: endpoint.port,
                status: state.status,
                closed_since: state.closed_since,
                alarm_active: state.alarm_active,
                last_elapsed_ms: state.last_elapsed_ms,
                last_detail: state.last_detail.clone(),
            })
            .collect()
    }
}
