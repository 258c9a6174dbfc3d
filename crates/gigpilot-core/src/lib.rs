//! `gigpilot-core` — shared vocabulary for the gigpilot workspace.
//!
//! Holds the data model every other crate speaks (platforms, jobs,
//! strategies), the scheduler configuration with its figment loader, and
//! the configuration error type. No I/O beyond config loading lives here.

pub mod config;
pub mod error;
pub mod types;

pub use config::SchedulerConfig;
pub use error::ConfigError;
pub use types::{
    ConnectionId, Difficulty, JobDescriptor, JobId, PayoutSpeed, PlatformDescriptor, PlatformId,
    Strategy,
};
