mod bus;
mod config;
mod notify;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

use portwatch::alarm::AlarmRegistry;
use portwatch::{AlarmEvent, AlertDispatcher, MonitorEvent, Registry, Scheduler};

use crate::config::Config;
use crate::notify::ServiceNotifier;

#[derive(Debug, Parser)]
#[command(name = "portwatch-service", about = "Brand port liveness monitor")]
struct Args {
    /// Path to the TOML configuration file (defaults to the XDG location).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    logger::init_tracing();

    let args = Args::parse();
    let config = Config::from_config(args.config.as_deref())
        .map_err(|e| anyhow!("failed to load configuration: {e:?}"))?;
    info!("{config}");

    let registry = Registry::from_brands(&config.brands);
    if registry.is_empty() {
        warn!("no brands configured; the scheduler will idle until brands are added");
    }

    let (monitor_tx, monitor_rx) = broadcast::channel::<MonitorEvent>(64);
    let (alarm_tx, alarm_rx) = broadcast::channel::<AlarmEvent>(64);

    let notifier = Arc::new(
        ServiceNotifier::from_config(&config.notify)
            .context("failed to build notification channels")?,
    );
    let alarms = AlarmRegistry::new(
        Duration::from_secs(config.monitor.alarm_interval_seconds),
        alarm_tx,
    );
    let dispatcher = AlertDispatcher::new(
        notifier,
        alarms,
        Duration::from_secs(config.monitor.escalation_threshold_seconds),
        monitor_tx.clone(),
    );
    let scheduler = Scheduler::new(
        registry,
        dispatcher,
        Duration::from_secs(config.monitor.interval_seconds),
        Duration::from_secs(config.monitor.timeout_seconds),
        monitor_tx,
    );

    forward_monitor_events(monitor_rx);
    forward_alarm_events(alarm_rx);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let engine = tokio::spawn(scheduler.run(shutdown_rx));

    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
    info!("shutdown requested");

    shutdown_tx.send(true).ok();
    engine.await.context("scheduler task failed")?;

    Ok(())
}

/// Republish pipeline events onto the UI bus and keep a readable log of
/// cycle outcomes in lieu of the status table.
fn forward_monitor_events(mut rx: broadcast::Receiver<MonitorEvent>) {
    tokio::spawn(async move {
        while let Ok(ev) = rx.recv().await {
            if let MonitorEvent::Snapshot(snapshot) = &ev {
                for entry in snapshot {
                    info!(
                        endpoint = %entry.id,
                        status = %entry.status,
                        elapsed_ms = entry.last_elapsed_ms,
                        alarm = entry.alarm_active,
                        "cycle result"
                    );
                }
            }
            bus::publish_monitor(ev);
        }
    });
}

/// Alarm events drive the audio collaborator; until one is attached they
/// are surfaced on the bus and logged.
fn forward_alarm_events(mut rx: broadcast::Receiver<AlarmEvent>) {
    tokio::spawn(async move {
        while let Ok(ev) = rx.recv().await {
            if let AlarmEvent::Ring { id, voice } = &ev {
                info!(endpoint = %id, ?voice, "alarm ring");
            }
            bus::publish_alarm(ev);
        }
    });
}
