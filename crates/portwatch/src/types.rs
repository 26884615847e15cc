use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// Which of a brand's two monitoring targets an endpoint is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Primary,
    Secondary,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Primary => "primary",
            Role::Secondary => "secondary",
        }
    }

    /// Alarm voice assigned to this role so the audio collaborator can
    /// tell the two targets of a brand apart.
    pub fn voice(&self) -> AlarmVoice {
        match self {
            Role::Primary => AlarmVoice::LowPulse,
            Role::Secondary => AlarmVoice::Siren,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Identity of a monitoring target: a brand plus the role its address plays.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointId {
    pub brand: String,
    pub role: Role,
}

impl EndpointId {
    pub fn new(brand: impl Into<String>, role: Role) -> Self {
        Self { brand: brand.into(), role }
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.brand, self.role)
    }
}

/// Status of a monitored port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortStatus {
    Unknown,
    Open,
    Closed,
    Checking,
}

impl fmt::Display for PortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortStatus::Unknown => write!(f, "unknown"),
            PortStatus::Open => write!(f, "open"),
            PortStatus::Closed => write!(f, "closed"),
            PortStatus::Checking => write!(f, "checking"),
        }
    }
}

/// Outcome of a single TCP probe. Produced fresh each probe, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    pub open: bool,
    pub elapsed_ms: u64,
    pub detail: String,
}

impl ProbeResult {
    /// The connection was established before the timeout fired.
    pub fn connected(elapsed_ms: u64) -> Self {
        Self { open: true, elapsed_ms, detail: "connected".to_string() }
    }

    /// The timeout fired before the connect attempt resolved.
    pub fn timed_out(elapsed_ms: u64) -> Self {
        Self { open: false, elapsed_ms, detail: "timed out".to_string() }
    }

    /// The connect attempt failed outright (refused, unreachable, DNS).
    pub fn failed(elapsed_ms: u64, error: String) -> Self {
        Self { open: false, elapsed_ms, detail: error }
    }
}

/// How an endpoint's status moved when a probe result was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateTransition {
    /// First observation of an endpoint that came up open; nothing to react to.
    None,
    OpenedToClosed,
    ClosedToOpen,
    StillClosed,
    StillOpen,
}

/// Per-cycle view of one endpoint for the UI boundary.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointSnapshot {
    pub id: EndpointId,
    pub host: Option<String>,
    pub port: u16,
    pub status: PortStatus,
    pub closed_since: Option<SystemTime>,
    pub alarm_active: bool,
    pub last_elapsed_ms: Option<u64>,
    pub last_detail: Option<String>,
}

/// Payload handed to the external notifier when an outage escalates.
#[derive(Debug, Clone, Serialize)]
pub struct EscalationAlert {
    pub brand: String,
    pub role: Role,
    pub host: String,
    pub port: u16,
    pub closed_since: SystemTime,
}

/// Distinct alarm patterns, keyed by endpoint role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmVoice {
    LowPulse,
    Siren,
}

/// Alarm lifecycle events for the audio/UI collaborator.
#[derive(Debug, Clone)]
pub enum AlarmEvent {
    Started { id: EndpointId, voice: AlarmVoice },
    Ring { id: EndpointId, voice: AlarmVoice },
    Stopped { id: EndpointId },
}

/// Events surfaced by the monitoring pipeline for rendering.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// Full registry view, published once per completed cycle.
    Snapshot(Vec<EndpointSnapshot>),
    PortClosed { id: EndpointId, host: String, port: u16 },
    Recovered { id: EndpointId, host: String, port: u16 },
}
