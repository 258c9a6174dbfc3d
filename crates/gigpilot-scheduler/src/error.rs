use thiserror::Error;

use gigpilot_core::error::ConfigError;
use gigpilot_core::types::JobId;
use gigpilot_platforms::PlatformError;
use gigpilot_vault::VaultError;

/// Errors surfaced by scheduler operations.
///
/// Two families share this enum: expected state races (`AlreadyRunning`,
/// `NotRunning`, `JobNotFound`, `CapacityExhausted`) that callers match on
/// and recover from, and fail-fast configuration/platform errors wrapped
/// from the leaf crates.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// `start` was called while the scheduler is already running.
    #[error("Already running")]
    AlreadyRunning,

    /// `stop` was called while the scheduler is stopped.
    #[error("Not running")]
    NotRunning,

    /// The job id is not in the current catalog or active set.
    #[error("Job not found: {id}")]
    JobNotFound { id: JobId },

    /// The job already occupies an active slot.
    #[error("Job already active: {id}")]
    AlreadyActive { id: JobId },

    /// Admission would exceed `max_concurrent_jobs`.
    #[error("Capacity exhausted: {active} of {max} slots in use")]
    CapacityExhausted { active: usize, max: usize },

    /// The strategy name is not one of the four valid policies.
    #[error("Invalid strategy: {name}")]
    InvalidStrategy { name: String },

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SchedulerError {
    /// Short error code string for embedding applications and dashboards.
    pub fn code(&self) -> &'static str {
        match self {
            SchedulerError::AlreadyRunning => "ALREADY_RUNNING",
            SchedulerError::NotRunning => "NOT_RUNNING",
            SchedulerError::JobNotFound { .. } => "JOB_NOT_FOUND",
            SchedulerError::AlreadyActive { .. } => "JOB_ALREADY_ACTIVE",
            SchedulerError::CapacityExhausted { .. } => "CAPACITY_EXHAUSTED",
            SchedulerError::InvalidStrategy { .. } => "INVALID_STRATEGY",
            SchedulerError::Platform(_) => "UNKNOWN_PLATFORM",
            SchedulerError::Vault(_) => "VAULT_ERROR",
            SchedulerError::Config(_) => "CONFIG_ERROR",
        }
    }
}

/// A job-discovery call against one platform failed.
///
/// Always caught per platform inside the tick — never aborts the scan.
#[derive(Debug, Error)]
#[error("Discovery failed: {0}")]
pub struct DiscoveryError(pub String);

/// The approval collaborator failed to resolve a pending job.
#[derive(Debug, Error)]
#[error("Approval failed: {0}")]
pub struct ApprovalError(pub String);

pub type Result<T> = std::result::Result<T, SchedulerError>;
