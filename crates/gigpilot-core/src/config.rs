use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::types::Strategy;

/// Default pause between scan ticks.
pub const DEFAULT_SCAN_INTERVAL_MS: u64 = 30_000;
/// Default capacity of the active-job set.
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 5;
/// Default minimum payment (USD) a job must offer to be selectable.
pub const DEFAULT_MIN_PAYMENT: f64 = 0.01;

/// Scheduler configuration (gigpilot.toml + GIGPILOT_* env overrides).
///
/// Every field is optional in the file; defaults match the values above.
/// `encryption_key` has no default — credential operations fail until one
/// is configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default)]
    pub strategy: Strategy,

    /// Milliseconds between scan ticks. Must be positive.
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,

    /// Capacity of the active-job set. Must be positive.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// Jobs paying less than this (USD) are never selected.
    #[serde(default = "default_min_payment")]
    pub min_payment: f64,

    /// Opaque secret the credential vault derives its key from.
    /// Never included in status snapshots.
    #[serde(default)]
    pub encryption_key: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            scan_interval_ms: DEFAULT_SCAN_INTERVAL_MS,
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
            min_payment: DEFAULT_MIN_PAYMENT,
            encryption_key: None,
        }
    }
}

impl SchedulerConfig {
    /// Load config from a TOML file with GIGPILOT_* env var overrides.
    ///
    /// A missing file is not an error — defaults apply, and env vars can
    /// still override them.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path.unwrap_or("gigpilot.toml");

        let config: SchedulerConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("GIGPILOT_"))
            .extract()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Enforce the numeric bounds the scheduler relies on.
    pub fn validate(&self) -> Result<()> {
        if self.scan_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "scan_interval_ms must be positive".to_string(),
            ));
        }
        if self.max_concurrent_jobs == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_jobs must be positive".to_string(),
            ));
        }
        if !self.min_payment.is_finite() || self.min_payment < 0.0 {
            return Err(ConfigError::Invalid(
                "min_payment must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_scan_interval_ms() -> u64 {
    DEFAULT_SCAN_INTERVAL_MS
}

fn default_max_concurrent_jobs() -> usize {
    DEFAULT_MAX_CONCURRENT_JOBS
}

fn default_min_payment() -> f64 {
    DEFAULT_MIN_PAYMENT
}
