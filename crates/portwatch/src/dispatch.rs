use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::alarm::AlarmRegistry;
use crate::registry::Endpoint;
use crate::tracker::EndpointState;
use crate::types::{EscalationAlert, MonitorEvent, StateTransition};

/// External notification sink. Delivery is best effort: the dispatcher
/// logs failures and moves on without retrying within the episode.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_outage(&self, alert: &EscalationAlert) -> Result<()>;
}

/// Default dwell threshold before an outage escalates to the notifier.
pub const DEFAULT_ESCALATION_THRESHOLD: Duration = Duration::from_millis(120_000);

/// Reacts to state transitions: local alarm lifecycle plus at most one
/// notifier escalation per continuous closed episode.
pub struct AlertDispatcher {
    notifier: Arc<dyn Notifier>,
    alarms: AlarmRegistry,
    escalation_threshold: Duration,
    events: broadcast::Sender<MonitorEvent>,
}

impl AlertDispatcher {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        alarms: AlarmRegistry,
        escalation_threshold: Duration,
        events: broadcast::Sender<MonitorEvent>,
    ) -> Self {
        Self { notifier, alarms, escalation_threshold, events }
    }

    /// Handle one transition for one endpoint.
    ///
    /// The endpoint is guaranteed configured here (unconfigured roles never
    /// enter the pipeline), so a missing host only yields an empty string
    /// in the surfaced notices.
    pub async fn handle(
        &mut self,
        endpoint: &Endpoint,
        transition: StateTransition,
        state: &mut EndpointState,
        now: SystemTime,
    ) {
        let host = endpoint.host.clone().unwrap_or_default();

        match transition {
            StateTransition::OpenedToClosed => {
                warn!(endpoint = %endpoint.id, host = %host, port = endpoint.port, "port closed");
                self.alarms.start(&endpoint.id);
                state.alarm_active = true;
                self.publish(MonitorEvent::PortClosed {
                    id: endpoint.id.clone(),
                    host,
                    port: endpoint.port,
                });
            }
            StateTransition::StillClosed => {
                self.maybe_escalate(endpoint, state, now).await;
            }
            StateTransition::ClosedToOpen => {
                info!(endpoint = %endpoint.id, host = %host, port = endpoint.port, "port recovered");
                self.alarms.stop(&endpoint.id);
                state.alarm_active = false;
                self.publish(MonitorEvent::Recovered {
                    id: endpoint.id.clone(),
                    host,
                    port: endpoint.port,
                });
            }
            StateTransition::StillOpen | StateTransition::None => {}
        }
    }

    /// Escalate once the closed dwell crosses the threshold. The check only
    /// runs when the scheduler observes `StillClosed`, so the effective
    /// notification delay is threshold-to-threshold-plus-one-cycle.
    async fn maybe_escalate(
        &mut self,
        endpoint: &Endpoint,
        state: &mut EndpointState,
        now: SystemTime,
    ) {
        if state.escalation_sent {
            return;
        }
        let Some(closed_since) = state.closed_since else {
            return;
        };
        let closed_for = now.duration_since(closed_since).unwrap_or_default();
        if closed_for < self.escalation_threshold {
            return;
        }

        let alert = EscalationAlert {
            brand: endpoint.id.brand.clone(),
            role: endpoint.id.role,
            host: endpoint.host.clone().unwrap_or_default(),
            port: endpoint.port,
            closed_since,
        };

        // Mark before sending: a failed notification is not retried
        // within the same episode.
        state.escalation_sent = true;

        info!(
            endpoint = %endpoint.id,
            closed_for_secs = closed_for.as_secs(),
            "escalating outage to notifier"
        );

        if let Err(e) = self.notifier.notify_outage(&alert).await {
            warn!(endpoint = %endpoint.id, error = %e, "notifier failed, not retrying this episode");
        }
    }

    /// Abort all alarm tasks; used on shutdown.
    pub fn stop_alarms(&mut self) {
        self.alarms.stop_all();
    }

    pub fn alarm_active(&self, id: &crate::types::EndpointId) -> bool {
        self.alarms.is_active(id)
    }

    fn publish(&self, ev: MonitorEvent) {
        let _ = self.events.send(ev);
    }
}
