use std::sync::OnceLock;

use tokio::sync::broadcast;
use tracing::debug;

use portwatch::{AlarmEvent, MonitorEvent};

/// UI-facing events: per-cycle snapshots and notices plus the alarm
/// start/ring/stop stream for audio feedback.
#[derive(Debug, Clone)]
pub enum UiEvent {
    Monitor(MonitorEvent),
    Alarm(AlarmEvent),
}

static BUS_TX: OnceLock<broadcast::Sender<UiEvent>> = OnceLock::new();

fn bus() -> &'static broadcast::Sender<UiEvent> {
    BUS_TX.get_or_init(|| {
        let (tx, _rx) = broadcast::channel::<UiEvent>(64);
        tx
    })
}

pub fn subscribe() -> broadcast::Receiver<UiEvent> {
    bus().subscribe()
}

pub fn publish_monitor(ev: MonitorEvent) {
    if let MonitorEvent::Snapshot(snapshot) = &ev {
        debug!(endpoints = snapshot.len(), "UI bus: publishing cycle snapshot");
    }
    publish(UiEvent::Monitor(ev));
}

pub fn publish_alarm(ev: AlarmEvent) {
    publish(UiEvent::Alarm(ev));
}

fn publish(ev: UiEvent) {
    // Ignore errors if there are no receivers
    let _ = bus().send(ev);
}
