//! Portwatch core - continuous TCP liveness monitoring.
//!
//! The engine probes every registered brand endpoint on a fixed cycle,
//! tracks open/closed transitions per endpoint, rings a local repeating
//! alarm while a port stays closed, and escalates to an external notifier
//! at most once per continuous outage episode.
//!
//! Pipeline: [`scheduler::Scheduler`] -> [`probe::probe`] ->
//! [`tracker::StateTracker`] -> [`dispatch::AlertDispatcher`].

pub mod alarm;
pub mod check;
pub mod dispatch;
pub mod error;
pub mod probe;
pub mod registry;
pub mod scheduler;
pub mod tracker;
pub mod types;


pub use check::{ProbeReport, check};
pub use dispatch::{AlertDispatcher, Notifier};
pub use error::InvalidInput;
pub use registry::{BrandSpec, Endpoint, Registry};
pub use scheduler::Scheduler;
pub use types::{
    AlarmEvent, AlarmVoice, EndpointId, EndpointSnapshot, EscalationAlert, MonitorEvent,
    PortStatus, ProbeResult, Role, StateTransition,
};
