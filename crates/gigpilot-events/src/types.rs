use serde::{Deserialize, Serialize};

/// Every notification the scheduler can publish.
///
/// Wire names use the `subject:verb` form consumed by dashboards and CLIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "system:started")]
    SystemStarted,
    #[serde(rename = "system:stopped")]
    SystemStopped,
    #[serde(rename = "platform:connected")]
    PlatformConnected,
    #[serde(rename = "platform:disconnected")]
    PlatformDisconnected,
    /// A platform's discovery call failed during a tick.
    #[serde(rename = "platform:error")]
    PlatformError,
    #[serde(rename = "strategy:changed")]
    StrategyChanged,
    #[serde(rename = "job:admitted")]
    JobAdmitted,
    #[serde(rename = "job:pending_approval")]
    JobPendingApproval,
    #[serde(rename = "job:approved")]
    JobApproved,
    #[serde(rename = "job:rejected")]
    JobRejected,
    #[serde(rename = "job:completed")]
    JobCompleted,
    #[serde(rename = "job:failed")]
    JobFailed,
    #[serde(rename = "job:cancelled")]
    JobCancelled,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SystemStarted => "system:started",
            EventKind::SystemStopped => "system:stopped",
            EventKind::PlatformConnected => "platform:connected",
            EventKind::PlatformDisconnected => "platform:disconnected",
            EventKind::PlatformError => "platform:error",
            EventKind::StrategyChanged => "strategy:changed",
            EventKind::JobAdmitted => "job:admitted",
            EventKind::JobPendingApproval => "job:pending_approval",
            EventKind::JobApproved => "job:approved",
            EventKind::JobRejected => "job:rejected",
            EventKind::JobCompleted => "job:completed",
            EventKind::JobFailed => "job:failed",
            EventKind::JobCancelled => "job:cancelled",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a subscription listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFilter {
    /// A single event kind.
    Only(EventKind),
    /// Every event — used by dashboards mirroring the full stream.
    Any,
}

impl EventFilter {
    pub fn matches(&self, kind: EventKind) -> bool {
        match self {
            EventFilter::Only(k) => *k == kind,
            EventFilter::Any => true,
        }
    }
}

impl From<EventKind> for EventFilter {
    fn from(kind: EventKind) -> Self {
        EventFilter::Only(kind)
    }
}

/// A published notification.
///
/// Payload is untyped JSON so the bus stays decoupled from domain structs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub payload: serde_json::Value,
    /// Monotonically increasing per-bus sequence number.
    pub seq: u64,
    /// Unix timestamp (ms) when the event was published.
    pub timestamp: u64,
}

/// Synchronous event handler.
///
/// Handlers run on the emitter's task in subscription order, so they must
/// be cheap and non-blocking. A returned `Err` is logged and isolated —
/// it never reaches the emitter or later handlers.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &Event) -> Result<(), String>;
}

impl<F> EventHandler for F
where
    F: Fn(&Event) -> Result<(), String> + Send + Sync,
{
    fn handle(&self, event: &Event) -> Result<(), String> {
        self(event)
    }
}
