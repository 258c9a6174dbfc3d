use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gigpilot_core::types::{JobDescriptor, JobId, PlatformId, Strategy};
use gigpilot_platforms::ConnectionStatus;

/// Lifecycle state of a job occupying an active slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveJobStatus {
    /// Handed to the approval service; occupies a slot but is excluded
    /// from re-selection until it resolves.
    PendingApproval,
    /// Admitted and executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Removed by an operator or by emergency stop.
    Cancelled,
    /// Execution failed.
    Failed,
}

impl std::fmt::Display for ActiveJobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActiveJobStatus::PendingApproval => "pending_approval",
            ActiveJobStatus::Running => "running",
            ActiveJobStatus::Completed => "completed",
            ActiveJobStatus::Cancelled => "cancelled",
            ActiveJobStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// A job occupying a slot in the capacity-bounded active set.
#[derive(Debug, Clone)]
pub struct ActiveJob {
    pub descriptor: JobDescriptor,
    pub started_at: DateTime<Utc>,
    pub status: ActiveJobStatus,
}

impl ActiveJob {
    pub fn new(descriptor: JobDescriptor, status: ActiveJobStatus) -> Self {
        Self {
            descriptor,
            started_at: Utc::now(),
            status,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.descriptor.id
    }
}

/// Cumulative run statistics. Derived counts (active jobs, free slots)
/// live on the status snapshot, not here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stats {
    /// Jobs admitted to `Running` since construction.
    pub total_jobs: u64,
    pub completed_jobs: u64,
    pub failed_jobs: u64,
    /// Sum of payments for completed jobs, USD.
    pub total_earnings: f64,
    /// Per-platform discovery failures observed across all ticks.
    pub discovery_errors: u64,
}

/// Read-only view of one platform connection. Never carries the
/// credential blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformStatusView {
    pub platform: PlatformId,
    pub status: ConnectionStatus,
    pub connected_at: DateTime<Utc>,
}

/// Read-only view of the effective configuration. The encryption key is
/// reduced to a presence flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigView {
    pub strategy: Strategy,
    pub scan_interval_ms: u64,
    pub max_concurrent_jobs: usize,
    pub min_payment: f64,
    pub encryption_key_configured: bool,
}

/// Complete point-in-time snapshot returned by `Scheduler::status`.
///
/// Safe to poll at any rate — building it never mutates scheduler state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub is_running: bool,
    pub strategy: Strategy,
    pub platforms: Vec<PlatformStatusView>,
    pub stats: Stats,
    /// Jobs currently in `Running`.
    pub active_jobs: usize,
    /// Jobs currently awaiting approval (still occupy slots).
    pub pending_approval: usize,
    /// `max_concurrent_jobs` minus every occupied slot.
    pub available_slots: usize,
    pub config: ConfigView,
}

/// Outcome of `Scheduler::emergency_stop` — always a success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyStopReport {
    /// Number of active entries (running and pending) forced to cancelled.
    pub cancelled_jobs: usize,
}
