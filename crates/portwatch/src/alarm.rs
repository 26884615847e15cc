use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::types::{AlarmEvent, EndpointId};

/// Repeating local alarms, one task per endpoint currently closed.
///
/// Each active alarm is a tokio task publishing a `Ring` event on a fixed
/// cadence until its handle is aborted. The voice of the ring is keyed by
/// the endpoint's role so the audio collaborator can distinguish primary
/// from secondary outages.
pub struct AlarmRegistry {
    cadence: Duration,
    events: broadcast::Sender<AlarmEvent>,
    handles: HashMap<EndpointId, JoinHandle<()>>,
}

impl AlarmRegistry {
    pub fn new(cadence: Duration, events: broadcast::Sender<AlarmEvent>) -> Self {
        Self { cadence, events, handles: HashMap::new() }
    }

    /// Start the repeating alarm for an endpoint. Idempotent: an endpoint
    /// that is already ringing keeps its existing timer.
    pub fn start(&mut self, id: &EndpointId) {
        if self.handles.contains_key(id) {
            return;
        }

        let voice = id.role.voice();
        info!(endpoint = %id, ?voice, "starting alarm");
        self.publish(AlarmEvent::Started { id: id.clone(), voice });

        let events = self.events.clone();
        let cadence = self.cadence;
        let ring_id = id.clone();
        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(cadence);
            loop {
                timer.tick().await;
                // Ignore errors if there are no receivers
                let _ = events.send(AlarmEvent::Ring { id: ring_id.clone(), voice });
            }
        });

        self.handles.insert(id.clone(), handle);
    }

    /// Stop the alarm for an endpoint, if one is ringing.
    pub fn stop(&mut self, id: &EndpointId) {
        if let Some(handle) = self.handles.remove(id) {
            handle.abort();
            info!(endpoint = %id, "stopping alarm");
            self.publish(AlarmEvent::Stopped { id: id.clone() });
        }
    }

    /// Abort every active alarm task; used on shutdown.
    pub fn stop_all(&mut self) {
        let active: Vec<EndpointId> = self.handles.keys().cloned().collect();
        debug!(count = active.len(), "stopping all alarms");
        for id in active {
            self.stop(&id);
        }
    }

    pub fn is_active(&self, id: &EndpointId) -> bool {
        self.handles.contains_key(id)
    }

    pub fn active_count(&self) -> usize {
        self.handles.len()
    }

    fn publish(&self, ev: AlarmEvent) {
        let _ = self.events.send(ev);
    }
}

impl Drop for AlarmRegistry {
    fn drop(&mut self) {
        for handle in self.handles.values() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlarmVoice, Role};

    #[tokio::test]
    async fn test_alarm_rings_until_stopped() {
        let (tx, mut rx) = broadcast::channel(32);
        let mut alarms = AlarmRegistry::new(Duration::from_millis(10), tx);
        let id = EndpointId::new("acme", Role::Primary);

        alarms.start(&id);
        assert!(alarms.is_active(&id));

        match rx.recv().await.unwrap() {
            AlarmEvent::Started { id: started, voice } => {
                assert_eq!(started, id);
                assert_eq!(voice, AlarmVoice::LowPulse);
            }
            other => panic!("expected Started, got {other:?}"),
        }

        // The interval fires immediately, so a ring follows right away.
        match rx.recv().await.unwrap() {
            AlarmEvent::Ring { id: rung, .. } => assert_eq!(rung, id),
            other => panic!("expected Ring, got {other:?}"),
        }

        alarms.stop(&id);
        assert!(!alarms.is_active(&id));
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let (tx, _rx) = broadcast::channel(32);
        let mut alarms = AlarmRegistry::new(Duration::from_secs(2), tx);
        let id = EndpointId::new("acme", Role::Secondary);

        alarms.start(&id);
        alarms.start(&id);
        assert_eq!(alarms.active_count(), 1);
    }

    #[tokio::test]
    async fn test_stop_without_start_is_a_noop() {
        let (tx, mut rx) = broadcast::channel(32);
        let mut alarms = AlarmRegistry::new(Duration::from_secs(2), tx);

        alarms.stop(&EndpointId::new("acme", Role::Primary));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stop_all() {
        let (tx, _rx) = broadcast::channel(32);
        let mut alarms = AlarmRegistry::new(Duration::from_secs(2), tx);

        alarms.start(&EndpointId::new("acme", Role::Primary));
        alarms.start(&EndpointId::new("acme", Role::Secondary));
        assert_eq!(alarms.active_count(), 2);

        alarms.stop_all();
        assert_eq!(alarms.active_count(), 0);
    }
}
