use std::time::{Duration, SystemTime};

use tokio::sync::{broadcast, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::dispatch::AlertDispatcher;
use crate::probe::probe;
use crate::registry::Registry;
use crate::tracker::StateTracker;
use crate::types::{EndpointSnapshot, MonitorEvent};

/// Default re-probe cadence.
pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_secs(30);

/// Drives periodic probing of every registered endpoint.
///
/// Endpoints are probed sequentially in registry order; each one runs the
/// full mark-checking -> probe -> tracker -> dispatcher pipeline before
/// the next starts, so per-endpoint state never sees concurrent probes.
pub struct Scheduler {
    registry: Registry,
    tracker: StateTracker,
    dispatcher: AlertDispatcher,
    cycle_interval: Duration,
    probe_timeout: Duration,
    events: broadcast::Sender<MonitorEvent>,
}

impl Scheduler {
    pub fn new(
        registry: Registry,
        dispatcher: AlertDispatcher,
        cycle_interval: Duration,
        probe_timeout: Duration,
        events: broadcast::Sender<MonitorEvent>,
    ) -> Self {
        let tracker = StateTracker::new(&registry);
        Self { registry, tracker, dispatcher, cycle_interval, probe_timeout, events }
    }

    /// Run one full probe cycle over the registry and publish a snapshot.
    ///
    /// Unconfigured endpoints are skipped and remain `unknown`.
    pub async fn run_cycle(&mut self) {
        let endpoints: Vec<_> = self.registry.endpoints().to_vec();

        for endpoint in endpoints {
            let Some(host) = endpoint.host.clone() else {
                continue;
            };

            self.tracker.mark_checking(&endpoint.id);
            let result = probe(&host, endpoint.port, self.probe_timeout).await;
            let now = SystemTime::now();

            debug!(
                endpoint = %endpoint.id,
                open = result.open,
                elapsed_ms = result.elapsed_ms,
                detail = %result.detail,
                "probe finished"
            );

            let transition = self.tracker.apply_result(&endpoint.id, &result, now);
            if let Some(state) = self.tracker.state_mut(&endpoint.id) {
                self.dispatcher.handle(&endpoint, transition, state, now).await;
            }
        }

        let snapshot = self.tracker.snapshot();
        let _ = self.events.send(MonitorEvent::Snapshot(snapshot));
    }

    /// Periodic driver loop. The first cycle runs immediately; a tick that
    /// lands while a cycle is still running is skipped, so cycles never
    /// overlap. Returns once `shutdown` flips to true or its sender drops.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            brands = self.registry.brand_count(),
            interval_secs = self.cycle_interval.as_secs(),
            "scheduler started"
        );

        let mut timer = tokio::time::interval(self.cycle_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.run_cycle().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.dispatcher.stop_alarms();
        info!("scheduler stopped");
    }

    /// Current registry-ordered view of all endpoint states.
    pub fn snapshot(&self) -> Vec<EndpointSnapshot> {
        self.tracker.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::AlarmRegistry;
    use crate::dispatch::Notifier;
    use crate::registry::BrandSpec;
    use crate::types::{EndpointId, EscalationAlert, PortStatus, Role};
    use anyhow::Result;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    struct NullNotifier;

    #[async_trait::async_trait]
    impl Notifier for NullNotifier {
        async fn notify_outage(&self, _alert: &EscalationAlert) -> Result<()> {
            Ok(())
        }
    }

    fn scheduler_for(brands: Vec<BrandSpec>) -> (Scheduler, broadcast::Receiver<MonitorEvent>) {
        let registry = Registry::from_brands(&brands);
        let (alarm_tx, _alarm_rx) = broadcast::channel(32);
        let (event_tx, event_rx) = broadcast::channel(32);
        let alarms = AlarmRegistry::new(Duration::from_secs(2), alarm_tx);
        let dispatcher = AlertDispatcher::new(
            Arc::new(NullNotifier),
            alarms,
            Duration::from_secs(120),
            event_tx.clone(),
        );
        let scheduler = Scheduler::new(
            registry,
            dispatcher,
            DEFAULT_CYCLE_INTERVAL,
            Duration::from_secs(1),
            event_tx,
        );
        (scheduler, event_rx)
    }

    #[tokio::test]
    async fn test_cycle_probes_live_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let brands = vec![BrandSpec {
            name: "acme".to_string(),
            port,
            primary_ip: "127.0.0.1".to_string(),
            secondary_ip: String::new(),
        }];
        let (mut scheduler, mut events) = scheduler_for(brands);

        scheduler.run_cycle().await;

        let snapshot = scheduler.snapshot();
        let primary = snapshot
            .iter()
            .find(|s| s.id == EndpointId::new("acme", Role::Primary))
            .unwrap();
        assert_eq!(primary.status, PortStatus::Open);
        assert!(primary.closed_since.is_none());

        // Unconfigured secondary is untouched.
        let secondary = snapshot
            .iter()
            .find(|s| s.id == EndpointId::new("acme", Role::Secondary))
            .unwrap();
        assert_eq!(secondary.status, PortStatus::Unknown);

        assert!(matches!(events.recv().await.unwrap(), MonitorEvent::Snapshot(_)));
    }

    #[tokio::test]
    async fn test_cycle_marks_dead_port_closed_and_starts_alarm() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let brands = vec![BrandSpec {
            name: "acme".to_string(),
            port,
            primary_ip: "127.0.0.1".to_string(),
            secondary_ip: String::new(),
        }];
        let (mut scheduler, _events) = scheduler_for(brands);

        scheduler.run_cycle().await;

        let id = EndpointId::new("acme", Role::Primary);
        let snapshot = scheduler.snapshot();
        let primary = snapshot.iter().find(|s| s.id == id).unwrap();
        assert_eq!(primary.status, PortStatus::Closed);
        assert!(primary.closed_since.is_some());
        assert!(primary.alarm_active);
        assert!(scheduler.dispatcher.alarm_active(&id));
    }

    #[tokio::test]
    async fn test_unconfigured_brand_never_alarms() {
        let brands = vec![BrandSpec {
            name: "ghost".to_string(),
            port: 9,
            primary_ip: String::new(),
            secondary_ip: String::new(),
        }];
        let (mut scheduler, mut events) = scheduler_for(brands);

        scheduler.run_cycle().await;
        scheduler.run_cycle().await;

        for snapshot in scheduler.snapshot() {
            assert_eq!(snapshot.status, PortStatus::Unknown);
            assert!(!snapshot.alarm_active);
        }

        // Only snapshots were published, no closed/recovered notices.
        while let Ok(ev) = events.try_recv() {
            assert!(matches!(ev, MonitorEvent::Snapshot(_)));
        }
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let brands = vec![BrandSpec {
            name: "ghost".to_string(),
            port: 9,
            primary_ip: String::new(),
            secondary_ip: String::new(),
        }];
        let (scheduler, _events) = scheduler_for(brands);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler.run(shutdown_rx));

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("scheduler should stop promptly")
            .unwrap();
    }
}
