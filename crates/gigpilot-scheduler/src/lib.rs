//! `gigpilot-scheduler` — the job automation orchestrator.
//!
//! # Overview
//!
//! The [`Scheduler`] composes the platform registry, credential vault and
//! event bus around a periodic scan loop: each tick asks the injected
//! [`JobSource`] for fresh jobs per connected platform, ranks them with the
//! active [`Strategy`](gigpilot_core::types::Strategy) via [`select`], and
//! admits the winners into a capacity-bounded active set. Jobs flagged
//! `requires_approval` pass through the injected [`ApprovalService`] first,
//! clamped to a fixed wall-clock bound.
//!
//! Ticks never overlap, every public operation is serialized against the
//! tick, and `emergency_stop` is safe from any state — including mid-tick.

pub mod error;
pub mod scheduler;
pub mod strategy;
pub mod traits;
pub mod types;

pub use error::{ApprovalError, DiscoveryError, Result, SchedulerError};
pub use scheduler::{Scheduler, APPROVAL_TIMEOUT};
pub use strategy::select;
pub use traits::{ApprovalDecision, ApprovalService, JobSource};
pub use types::{
    ActiveJob, ActiveJobStatus, ConfigView, EmergencyStopReport, PlatformStatusView,
    SchedulerStatus, Stats,
};
