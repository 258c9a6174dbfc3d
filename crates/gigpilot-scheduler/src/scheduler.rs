use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

use gigpilot_core::config::SchedulerConfig;
use gigpilot_core::types::{JobDescriptor, JobId, PlatformId, Strategy};
use gigpilot_events::{EventBus, EventKind};
use gigpilot_platforms::{
    ConnectionStatus, PlatformConnection, PlatformError, PlatformRegistry,
};
use gigpilot_vault::CredentialVault;

use crate::error::{Result, SchedulerError};
use crate::strategy::select;
use crate::traits::{ApprovalDecision, ApprovalService, JobSource};
use crate::types::{
    ActiveJob, ActiveJobStatus, ConfigView, EmergencyStopReport, PlatformStatusView,
    SchedulerStatus, Stats,
};

/// Upper bound on a single approval suspension, regardless of the job's
/// own time estimate. Keeps every tick bounded even against a stalled
/// approval collaborator.
pub const APPROVAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything the scheduler mutates, behind one mutex.
///
/// The lock is only ever held for short synchronous sections — never
/// across discovery or approval awaits.
struct SchedulerState {
    config: SchedulerConfig,
    connections: HashMap<PlatformId, PlatformConnection>,
    /// Capacity-bounded active set: `Running` plus `PendingApproval`.
    active: HashMap<JobId, ActiveJob>,
    /// Merged catalog from the most recent scan tick, for manual approval
    /// lookups. Replaced wholesale every tick.
    catalog: HashMap<JobId, JobDescriptor>,
    stats: Stats,
    running: bool,
}

/// Handle to the spawned scan loop.
struct TickRunner {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// The job automation scheduler.
///
/// Owns all mutable state (connections, active set, stats); external
/// callers observe it only through [`status`](Scheduler::status) snapshots
/// and the event bus. Every public operation is serialized against the
/// scan tick through the internal state mutex.
pub struct Scheduler {
    registry: Arc<PlatformRegistry>,
    vault: CredentialVault,
    bus: Arc<EventBus>,
    source: Arc<dyn JobSource>,
    approvals: Arc<dyn ApprovalService>,
    state: Arc<Mutex<SchedulerState>>,
    runner: Mutex<Option<TickRunner>>,
}

impl Scheduler {
    /// Build a stopped scheduler. Fails fast on invalid configuration.
    pub fn new(
        config: SchedulerConfig,
        registry: PlatformRegistry,
        source: Arc<dyn JobSource>,
        approvals: Arc<dyn ApprovalService>,
    ) -> Result<Self> {
        config.validate()?;
        let vault = CredentialVault::new(config.encryption_key.as_deref());

        Ok(Self {
            registry: Arc::new(registry),
            vault,
            bus: Arc::new(EventBus::new()),
            source,
            approvals,
            state: Arc::new(Mutex::new(SchedulerState {
                config,
                connections: HashMap::new(),
                active: HashMap::new(),
                catalog: HashMap::new(),
                stats: Stats::default(),
                running: false,
            })),
            runner: Mutex::new(None),
        })
    }

    /// The bus dashboards and CLIs subscribe to.
    pub fn events(&self) -> Arc<EventBus> {
        Arc::clone(&self.bus)
    }

    /// Store encrypted credentials for a registered platform and mark it
    /// connected.
    ///
    /// Fails with `UnknownPlatform` for ids absent from the registry and
    /// with a vault error when no encryption key is configured; the
    /// connection map is untouched on every failure path.
    pub fn connect_platform(&self, id: impl Into<PlatformId>, api_key: &str) -> Result<()> {
        let id = id.into();
        if !self.registry.contains(&id) {
            return Err(PlatformError::UnknownPlatform { id: id.to_string() }.into());
        }

        let blob = self.vault.encrypt(api_key)?;
        let connection = PlatformConnection::new(id.clone(), blob);
        let connection_id = connection.connection_id.clone();

        {
            let mut state = self.lock_state();
            state.connections.insert(id.clone(), connection);
        }

        info!(platform = %id, connection = %connection_id, "platform connected");
        self.bus.emit(
            EventKind::PlatformConnected,
            json!({ "platform": id.as_str(), "connection_id": connection_id.as_str() }),
        );
        Ok(())
    }

    /// Drop a platform's stored credentials. Returns whether a connection
    /// existed.
    pub fn disconnect_platform(&self, id: &PlatformId) -> bool {
        let removed = self.lock_state().connections.remove(id).is_some();
        if removed {
            info!(platform = %id, "platform disconnected");
            self.bus.emit(
                EventKind::PlatformDisconnected,
                json!({ "platform": id.as_str() }),
            );
        }
        removed
    }

    /// Begin periodic scanning. Must be called within a Tokio runtime.
    ///
    /// Returns `AlreadyRunning` when the scan loop is already active —
    /// an expected caller race, not a fault.
    pub fn start(&self) -> Result<()> {
        let mut runner = self.runner.lock().expect("scheduler runner poisoned");
        if runner.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let scan_interval = {
            let mut state = self.lock_state();
            state.running = true;
            Duration::from_millis(state.config.scan_interval_ms)
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let ctx = TickContext {
            registry: Arc::clone(&self.registry),
            vault: self.vault.clone(),
            bus: Arc::clone(&self.bus),
            source: Arc::clone(&self.source),
            approvals: Arc::clone(&self.approvals),
            state: Arc::clone(&self.state),
        };
        let handle = tokio::spawn(ctx.run(shutdown_rx, scan_interval));
        *runner = Some(TickRunner {
            shutdown: shutdown_tx,
            handle,
        });

        info!(scan_interval_ms = scan_interval.as_millis() as u64, "scheduler started");
        self.bus.emit(
            EventKind::SystemStarted,
            json!({ "scan_interval_ms": scan_interval.as_millis() as u64 }),
        );
        Ok(())
    }

    /// Halt periodic scanning. Active jobs are left untouched.
    ///
    /// Returns `NotRunning` when the scheduler is already stopped.
    pub fn stop(&self) -> Result<()> {
        let mut runner = self.runner.lock().expect("scheduler runner poisoned");
        let Some(tick) = runner.take() else {
            return Err(SchedulerError::NotRunning);
        };
        // Signal rather than abort: an in-flight tick finishes its current
        // admission and the loop exits at its next select point.
        let _ = tick.shutdown.send(true);

        self.lock_state().running = false;

        info!("scheduler stopped");
        self.bus
            .emit(EventKind::SystemStopped, json!({ "reason": "stop" }));
        Ok(())
    }

    /// Stop scanning and force-cancel every active job, including jobs
    /// awaiting approval. Idempotent and safe from any state, mid-tick
    /// included.
    pub fn emergency_stop(&self) -> EmergencyStopReport {
        {
            let mut runner = self.runner.lock().expect("scheduler runner poisoned");
            if let Some(tick) = runner.take() {
                let _ = tick.shutdown.send(true);
                // Abort outright — the state mutex is never held across an
                // await, so the task can only die at a safe point.
                tick.handle.abort();
            }
        }

        let cancelled: Vec<JobId> = {
            let mut state = self.lock_state();
            state.running = false;
            state.active.drain().map(|(id, _)| id).collect()
        };

        warn!(cancelled = cancelled.len(), "emergency stop");
        for id in &cancelled {
            self.bus.emit(
                EventKind::JobCancelled,
                json!({ "job_id": id.as_str(), "reason": "emergency_stop" }),
            );
        }
        self.bus
            .emit(EventKind::SystemStopped, json!({ "reason": "emergency_stop" }));

        EmergencyStopReport {
            cancelled_jobs: cancelled.len(),
        }
    }

    /// Switch the selection policy. Takes the wire name so config UIs can
    /// pass user input straight through; unknown names are rejected and
    /// the configuration is left unchanged.
    pub fn change_strategy(&self, name: &str) -> Result<()> {
        let new: Strategy = name
            .parse()
            .map_err(|_| SchedulerError::InvalidStrategy {
                name: name.to_string(),
            })?;

        let old = {
            let mut state = self.lock_state();
            let old = state.config.strategy;
            state.config.strategy = new;
            old
        };

        info!(%old, %new, "strategy changed");
        self.bus.emit(
            EventKind::StrategyChanged,
            json!({ "old": old.as_str(), "new": new.as_str() }),
        );
        Ok(())
    }

    /// Manually resolve a job's approval.
    ///
    /// A `PendingApproval` entry is promoted to `Running` in place. A job
    /// known from the current catalog but not yet active is admitted if
    /// capacity allows; otherwise `CapacityExhausted`. Unknown ids are
    /// `JobNotFound`.
    pub fn approve_job(&self, id: &JobId) -> Result<()> {
        {
            let mut state = self.lock_state();
            match state.active.get(id).map(|entry| entry.status) {
                Some(ActiveJobStatus::PendingApproval) => {
                    if let Some(entry) = state.active.get_mut(id) {
                        entry.status = ActiveJobStatus::Running;
                    }
                    state.stats.total_jobs += 1;
                }
                Some(_) => return Err(SchedulerError::AlreadyActive { id: id.clone() }),
                None => {
                    let Some(descriptor) = state.catalog.get(id).cloned() else {
                        return Err(SchedulerError::JobNotFound { id: id.clone() });
                    };
                    let max = state.config.max_concurrent_jobs;
                    if state.active.len() >= max {
                        return Err(SchedulerError::CapacityExhausted {
                            active: state.active.len(),
                            max,
                        });
                    }
                    state
                        .active
                        .insert(id.clone(), ActiveJob::new(descriptor, ActiveJobStatus::Running));
                    state.stats.total_jobs += 1;
                }
            }
        }

        info!(job_id = %id, "job approved");
        self.bus
            .emit(EventKind::JobApproved, json!({ "job_id": id.as_str() }));
        self.bus
            .emit(EventKind::JobAdmitted, json!({ "job_id": id.as_str() }));
        Ok(())
    }

    /// Remove a job from the active set. Returns whether it was present.
    pub fn cancel_job(&self, id: &JobId) -> bool {
        let removed = self.lock_state().active.remove(id).is_some();
        if removed {
            info!(job_id = %id, "job cancelled");
            self.bus.emit(
                EventKind::JobCancelled,
                json!({ "job_id": id.as_str(), "reason": "cancelled" }),
            );
        }
        removed
    }

    /// Mark an active job as finished and credit its payment to earnings.
    pub fn complete_job(&self, id: &JobId) -> Result<()> {
        let payment = {
            let mut state = self.lock_state();
            let Some(job) = state.active.remove(id) else {
                return Err(SchedulerError::JobNotFound { id: id.clone() });
            };
            state.stats.completed_jobs += 1;
            state.stats.total_earnings += job.descriptor.payment;
            job.descriptor.payment
        };

        info!(job_id = %id, payment, "job completed");
        self.bus.emit(
            EventKind::JobCompleted,
            json!({ "job_id": id.as_str(), "payment": payment }),
        );
        Ok(())
    }

    /// Mark an active job as failed.
    pub fn fail_job(&self, id: &JobId, reason: &str) -> Result<()> {
        {
            let mut state = self.lock_state();
            if state.active.remove(id).is_none() {
                return Err(SchedulerError::JobNotFound { id: id.clone() });
            }
            state.stats.failed_jobs += 1;
        }

        warn!(job_id = %id, reason, "job failed");
        self.bus.emit(
            EventKind::JobFailed,
            json!({ "job_id": id.as_str(), "reason": reason }),
        );
        Ok(())
    }

    /// Whether the scan loop is active.
    pub fn is_running(&self) -> bool {
        self.lock_state().running
    }

    /// Snapshot of the active set, sorted by job id.
    pub fn list_active_jobs(&self) -> Vec<ActiveJob> {
        let state = self.lock_state();
        let mut jobs: Vec<ActiveJob> = state.active.values().cloned().collect();
        jobs.sort_by(|a, b| a.id().as_str().cmp(b.id().as_str()));
        jobs
    }

    /// Read-only point-in-time snapshot. Never mutates state and never
    /// exposes credential material.
    pub fn status(&self) -> SchedulerStatus {
        let state = self.lock_state();

        let mut platforms: Vec<PlatformStatusView> = state
            .connections
            .values()
            .map(|c| PlatformStatusView {
                platform: c.platform.clone(),
                status: c.status.clone(),
                connected_at: c.connected_at,
            })
            .collect();
        platforms.sort_by(|a, b| a.platform.as_str().cmp(b.platform.as_str()));

        let running = state
            .active
            .values()
            .filter(|j| j.status == ActiveJobStatus::Running)
            .count();
        let pending = state
            .active
            .values()
            .filter(|j| j.status == ActiveJobStatus::PendingApproval)
            .count();

        SchedulerStatus {
            is_running: state.running,
            strategy: state.config.strategy,
            platforms,
            stats: state.stats.clone(),
            active_jobs: running,
            pending_approval: pending,
            available_slots: state
                .config
                .max_concurrent_jobs
                .saturating_sub(state.active.len()),
            config: ConfigView {
                strategy: state.config.strategy,
                scan_interval_ms: state.config.scan_interval_ms,
                max_concurrent_jobs: state.config.max_concurrent_jobs,
                min_payment: state.config.min_payment,
                encryption_key_configured: self.vault.has_key(),
            },
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SchedulerState> {
        self.state.lock().expect("scheduler state poisoned")
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        // Releases the scan task with the scheduler; in-memory maps go
        // down with the struct itself.
        if let Ok(mut runner) = self.runner.lock() {
            if let Some(tick) = runner.take() {
                let _ = tick.shutdown.send(true);
                tick.handle.abort();
            }
        }
    }
}

/// Arc bundle the scan loop runs on, detached from the `Scheduler` value.
struct TickContext {
    registry: Arc<PlatformRegistry>,
    vault: CredentialVault,
    bus: Arc<EventBus>,
    source: Arc<dyn JobSource>,
    approvals: Arc<dyn ApprovalService>,
    state: Arc<Mutex<SchedulerState>>,
}

impl TickContext {
    /// Scan loop: discovery → selection → admission, once per interval.
    ///
    /// `MissedTickBehavior::Skip` guarantees ticks never overlap — a tick
    /// that outlives the interval simply swallows the missed firings.
    async fn run(self, mut shutdown: watch::Receiver<bool>, scan_interval: Duration) {
        info!("scan loop started");

        let mut ticker = interval(scan_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.run_tick().await,
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("scan loop shutting down");
                        break;
                    }
                }
            }
        }
    }

    async fn run_tick(&self) {
        // Snapshot connected platforms so the state lock is never held
        // across discovery I/O.
        let connected: Vec<(PlatformId, String)> = {
            let state = self.lock_state();
            if !state.running {
                return;
            }
            state
                .connections
                .values()
                .filter(|c| c.is_connected())
                .map(|c| (c.platform.clone(), c.encrypted_credentials.clone()))
                .collect()
        };

        if connected.is_empty() {
            debug!("no connected platforms; skipping scan");
            return;
        }

        let mut catalog: Vec<JobDescriptor> = Vec::new();
        for (platform_id, blob) in connected {
            // A connection can only exist for a registered platform.
            let Some(descriptor) = self.registry.get(&platform_id).cloned() else {
                continue;
            };

            let fetched = match self.vault.decrypt(&blob) {
                Ok(api_key) => self
                    .source
                    .fetch_jobs(&descriptor, &api_key)
                    .await
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };

            match fetched {
                Ok(jobs) => {
                    debug!(platform = %platform_id, count = jobs.len(), "discovery succeeded");
                    {
                        let mut state = self.lock_state();
                        if let Some(conn) = state.connections.get_mut(&platform_id) {
                            // A platform that recovered clears its error marker.
                            if !conn.is_connected() {
                                conn.status = ConnectionStatus::Connected;
                            }
                        }
                    }
                    catalog.extend(jobs);
                }
                Err(reason) => {
                    warn!(
                        platform = %platform_id,
                        reason = %reason,
                        "discovery failed; continuing with remaining platforms"
                    );
                    {
                        let mut state = self.lock_state();
                        state.stats.discovery_errors += 1;
                        if let Some(conn) = state.connections.get_mut(&platform_id) {
                            conn.status = ConnectionStatus::Error(reason.clone());
                        }
                    }
                    self.bus.emit(
                        EventKind::PlatformError,
                        json!({ "platform": platform_id.as_str(), "reason": reason }),
                    );
                }
            }
        }

        // Selection and admission run under one lock acquisition, so the
        // capacity bound holds against concurrent public operations.
        let (admitted, needs_approval) = {
            let mut state = self.lock_state();
            if !state.running {
                return;
            }

            state.catalog = catalog
                .iter()
                .map(|job| (job.id.clone(), job.clone()))
                .collect();

            let free_slots = state
                .config
                .max_concurrent_jobs
                .saturating_sub(state.active.len());
            if free_slots == 0 {
                debug!("no free slots; skipping selection this tick");
                return;
            }

            // Jobs already active (running or awaiting approval) are not
            // candidates again — prevents double admission.
            let fresh: Vec<JobDescriptor> = catalog
                .into_iter()
                .filter(|job| !state.active.contains_key(&job.id))
                .collect();

            let selected = select(
                &fresh,
                state.config.strategy,
                state.config.min_payment,
                free_slots,
            );

            let mut admitted = Vec::new();
            let mut needs_approval = Vec::new();
            for job in selected {
                if job.requires_approval {
                    state.active.insert(
                        job.id.clone(),
                        ActiveJob::new(job.clone(), ActiveJobStatus::PendingApproval),
                    );
                    needs_approval.push(job);
                } else {
                    state.active.insert(
                        job.id.clone(),
                        ActiveJob::new(job.clone(), ActiveJobStatus::Running),
                    );
                    state.stats.total_jobs += 1;
                    admitted.push(job);
                }
            }
            (admitted, needs_approval)
        };

        for job in &admitted {
            info!(job_id = %job.id, platform = %job.platform, payment = job.payment, "job admitted");
            self.bus.emit(
                EventKind::JobAdmitted,
                json!({ "job_id": job.id.as_str(), "platform": job.platform.as_str() }),
            );
        }
        for job in &needs_approval {
            info!(job_id = %job.id, platform = %job.platform, "job awaiting approval");
            self.bus.emit(
                EventKind::JobPendingApproval,
                json!({ "job_id": job.id.as_str(), "platform": job.platform.as_str() }),
            );
        }

        // The only designed suspension point in a tick.
        for job in needs_approval {
            self.resolve_approval(job).await;
        }
    }

    /// Await the approval collaborator for one pending job, clamped to
    /// [`APPROVAL_TIMEOUT`].
    async fn resolve_approval(&self, job: JobDescriptor) {
        let (approved, reason) = match timeout(APPROVAL_TIMEOUT, self.approvals.resolve(&job)).await
        {
            Ok(Ok(ApprovalDecision::Approved)) => (true, "approved"),
            Ok(Ok(ApprovalDecision::Rejected)) => (false, "rejected"),
            Ok(Err(e)) => {
                warn!(job_id = %job.id, error = %e, "approval service failed");
                (false, "error")
            }
            Err(_) => {
                warn!(job_id = %job.id, "approval timed out");
                (false, "timeout")
            }
        };

        // The entry may have been cancelled (or manually approved) while
        // we waited — only act on a still-pending slot.
        let outcome = {
            let mut state = self.lock_state();
            let still_pending = matches!(
                state.active.get(&job.id).map(|entry| entry.status),
                Some(ActiveJobStatus::PendingApproval)
            );
            if !still_pending {
                None
            } else if approved {
                if let Some(entry) = state.active.get_mut(&job.id) {
                    entry.status = ActiveJobStatus::Running;
                }
                state.stats.total_jobs += 1;
                Some(true)
            } else {
                state.active.remove(&job.id);
                Some(false)
            }
        };

        match outcome {
            Some(true) => {
                info!(job_id = %job.id, "job approved");
                self.bus
                    .emit(EventKind::JobApproved, json!({ "job_id": job.id.as_str() }));
                self.bus
                    .emit(EventKind::JobAdmitted, json!({ "job_id": job.id.as_str() }));
            }
            Some(false) => {
                info!(job_id = %job.id, reason, "job rejected");
                self.bus.emit(
                    EventKind::JobRejected,
                    json!({ "job_id": job.id.as_str(), "reason": reason }),
                );
            }
            None => {
                debug!(job_id = %job.id, "pending slot resolved elsewhere; dropping approval result");
            }
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SchedulerState> {
        self.state.lock().expect("scheduler state poisoned")
    }
}
