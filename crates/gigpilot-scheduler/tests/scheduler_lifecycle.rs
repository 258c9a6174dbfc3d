// End-to-end lifecycle tests driving a real scheduler against scripted
// collaborators. Time is paused, so interval ticks and the approval clamp
// run on the virtual clock.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use gigpilot_core::config::SchedulerConfig;
use gigpilot_core::types::{
    Difficulty, JobDescriptor, PayoutSpeed, PlatformDescriptor, Strategy,
};
use gigpilot_events::{Event, EventFilter, EventKind};
use gigpilot_platforms::PlatformRegistry;
use gigpilot_scheduler::{
    ActiveJobStatus, ApprovalDecision, ApprovalError, ApprovalService, DiscoveryError, JobSource,
    Scheduler, SchedulerError,
};

// --- Test doubles ---

/// Job source serving a fixed per-platform catalog, with optional
/// per-platform failure injection.
struct ScriptedSource {
    jobs: Mutex<HashMap<String, Vec<JobDescriptor>>>,
    failing: Mutex<HashSet<String>>,
    calls: AtomicUsize,
    last_api_key: Mutex<Option<String>>,
}

impl ScriptedSource {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            jobs: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            calls: AtomicUsize::new(0),
            last_api_key: Mutex::new(None),
        })
    }

    fn serve(&self, platform: &str, jobs: Vec<JobDescriptor>) {
        self.jobs.lock().unwrap().insert(platform.to_string(), jobs);
    }

    fn fail_platform(&self, platform: &str) {
        self.failing.lock().unwrap().insert(platform.to_string());
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobSource for ScriptedSource {
    async fn fetch_jobs(
        &self,
        platform: &PlatformDescriptor,
        api_key: &str,
    ) -> Result<Vec<JobDescriptor>, DiscoveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_api_key.lock().unwrap() = Some(api_key.to_string());

        if self.failing.lock().unwrap().contains(platform.id.as_str()) {
            return Err(DiscoveryError("simulated outage".to_string()));
        }
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .get(platform.id.as_str())
            .cloned()
            .unwrap_or_default())
    }
}

/// Approval service answering immediately with a fixed decision.
struct Decide(ApprovalDecision);

#[async_trait]
impl ApprovalService for Decide {
    async fn resolve(&self, _job: &JobDescriptor) -> Result<ApprovalDecision, ApprovalError> {
        Ok(self.0)
    }
}

/// Approval service that never answers — exercises the timeout clamp.
struct NeverResolves;

#[async_trait]
impl ApprovalService for NeverResolves {
    async fn resolve(&self, _job: &JobDescriptor) -> Result<ApprovalDecision, ApprovalError> {
        std::future::pending().await
    }
}

/// Collects every event kind the bus publishes, in order.
struct EventLog {
    kinds: Arc<Mutex<Vec<EventKind>>>,
}

impl EventLog {
    fn attach(scheduler: &Scheduler) -> Self {
        let kinds = Arc::new(Mutex::new(Vec::new()));
        let sink = kinds.clone();
        scheduler.events().subscribe(
            "test-log",
            EventFilter::Any,
            Arc::new(move |event: &Event| {
                sink.lock().unwrap().push(event.kind);
                Ok(())
            }),
        );
        Self { kinds }
    }

    fn kinds(&self) -> Vec<EventKind> {
        self.kinds.lock().unwrap().clone()
    }

    fn count(&self, kind: EventKind) -> usize {
        self.kinds().iter().filter(|k| **k == kind).count()
    }
}

// --- Fixtures ---

fn descriptor(id: &str) -> PlatformDescriptor {
    PlatformDescriptor {
        id: id.into(),
        name: id.to_uppercase(),
        signup_url: format!("https://{id}.example/signup"),
        api_url: format!("https://api.{id}.example"),
        login_url: format!("https://{id}.example/login"),
        requirements: String::new(),
        auto_approval: true,
        payout_speed: PayoutSpeed::Weekly,
        average_payout: 0.10,
        success_rate: 0.9,
        difficulty: Difficulty::Easy,
    }
}

fn registry() -> PlatformRegistry {
    PlatformRegistry::new(vec![descriptor("alpha"), descriptor("beta")])
}

fn job(id: &str, platform: &str, payment: f64, speed: PayoutSpeed) -> JobDescriptor {
    JobDescriptor {
        id: id.into(),
        title: format!("job {id}"),
        payment,
        estimated_time_mins: 10,
        platform: platform.into(),
        payout_speed: speed,
        success_rate: 0.9,
        difficulty: Difficulty::Easy,
        requires_approval: false,
    }
}

fn config(strategy: Strategy, max_concurrent_jobs: usize) -> SchedulerConfig {
    SchedulerConfig {
        strategy,
        scan_interval_ms: 100,
        max_concurrent_jobs,
        min_payment: 0.01,
        encryption_key: Some("test-secret".to_string()),
    }
}

fn scheduler_with(
    config: SchedulerConfig,
    source: Arc<ScriptedSource>,
    approvals: Arc<dyn ApprovalService>,
) -> Scheduler {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Scheduler::new(config, registry(), source, approvals).unwrap()
}

/// Let the virtual clock run past a few scan ticks.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(350)).await;
}

// --- Lifecycle ---

#[tokio::test(start_paused = true)]
async fn start_twice_reports_already_running() {
    let scheduler = scheduler_with(
        config(Strategy::Balanced, 5),
        ScriptedSource::new(),
        Arc::new(Decide(ApprovalDecision::Approved)),
    );

    scheduler.start().unwrap();
    assert!(matches!(
        scheduler.start(),
        Err(SchedulerError::AlreadyRunning)
    ));
    assert!(scheduler.is_running());
}

#[tokio::test(start_paused = true)]
async fn stop_on_fresh_scheduler_reports_not_running() {
    let scheduler = scheduler_with(
        config(Strategy::Balanced, 5),
        ScriptedSource::new(),
        Arc::new(Decide(ApprovalDecision::Approved)),
    );

    assert!(matches!(scheduler.stop(), Err(SchedulerError::NotRunning)));
    assert!(!scheduler.is_running());
}

#[tokio::test(start_paused = true)]
async fn stop_then_start_resumes_ticking() {
    let source = ScriptedSource::new();
    let scheduler = scheduler_with(
        config(Strategy::Balanced, 5),
        source.clone(),
        Arc::new(Decide(ApprovalDecision::Approved)),
    );
    scheduler.connect_platform("alpha", "key-1").unwrap();

    scheduler.start().unwrap();
    settle().await;
    let calls_while_running = source.calls();
    assert!(calls_while_running > 0, "expected discovery while running");

    scheduler.stop().unwrap();
    settle().await;
    let calls_after_stop = source.calls();
    settle().await;
    assert_eq!(source.calls(), calls_after_stop, "ticking after stop");

    scheduler.start().unwrap();
    settle().await;
    assert!(source.calls() > calls_after_stop, "expected ticking to resume");
}

#[tokio::test(start_paused = true)]
async fn emergency_stop_cancels_everything_from_any_state() {
    let source = ScriptedSource::new();
    source.serve(
        "alpha",
        vec![
            job("j1", "alpha", 1.0, PayoutSpeed::Weekly),
            job("j2", "alpha", 2.0, PayoutSpeed::Weekly),
        ],
    );
    let scheduler = scheduler_with(
        config(Strategy::Balanced, 5),
        source,
        Arc::new(Decide(ApprovalDecision::Approved)),
    );
    let log = EventLog::attach(&scheduler);
    scheduler.connect_platform("alpha", "key-1").unwrap();

    scheduler.start().unwrap();
    settle().await;
    assert_eq!(scheduler.status().active_jobs, 2);

    let report = scheduler.emergency_stop();
    assert_eq!(report.cancelled_jobs, 2);

    let status = scheduler.status();
    assert!(!status.is_running);
    assert_eq!(status.active_jobs, 0);
    assert_eq!(status.pending_approval, 0);
    assert_eq!(log.count(EventKind::JobCancelled), 2);

    // Idempotent — a second call from Stopped still succeeds.
    let report = scheduler.emergency_stop();
    assert_eq!(report.cancelled_jobs, 0);
}

#[tokio::test(start_paused = true)]
async fn emergency_stop_works_on_never_started_scheduler() {
    let scheduler = scheduler_with(
        config(Strategy::Balanced, 5),
        ScriptedSource::new(),
        Arc::new(Decide(ApprovalDecision::Approved)),
    );

    let report = scheduler.emergency_stop();
    assert_eq!(report.cancelled_jobs, 0);
    assert!(!scheduler.is_running());
}

// --- Admission and capacity ---

#[tokio::test(start_paused = true)]
async fn quick_payout_admits_by_speed_up_to_capacity() {
    let source = ScriptedSource::new();
    source.serve(
        "alpha",
        vec![
            job("instant", "alpha", 0.05, PayoutSpeed::Instant),
            job("weekly", "alpha", 0.15, PayoutSpeed::Weekly),
            job("monthly", "alpha", 0.50, PayoutSpeed::Monthly),
        ],
    );
    let scheduler = scheduler_with(
        config(Strategy::QuickPayout, 2),
        source,
        Arc::new(Decide(ApprovalDecision::Approved)),
    );
    scheduler.connect_platform("alpha", "key-1").unwrap();

    scheduler.start().unwrap();
    settle().await;

    let active = scheduler.list_active_jobs();
    let ids: Vec<&str> = active.iter().map(|j| j.id().as_str()).collect();
    // The monthly job is excluded purely by capacity.
    assert_eq!(ids, vec!["instant", "weekly"]);

    let status = scheduler.status();
    assert_eq!(status.active_jobs, 2);
    assert_eq!(status.available_slots, 0);
}

#[tokio::test(start_paused = true)]
async fn capacity_invariant_holds_across_many_ticks() {
    let source = ScriptedSource::new();
    source.serve(
        "alpha",
        (0..20)
            .map(|i| job(&format!("j{i}"), "alpha", 1.0, PayoutSpeed::Weekly))
            .collect(),
    );
    let scheduler = scheduler_with(
        config(Strategy::Balanced, 3),
        source,
        Arc::new(Decide(ApprovalDecision::Approved)),
    );
    scheduler.connect_platform("alpha", "key-1").unwrap();

    scheduler.start().unwrap();
    for _ in 0..5 {
        settle().await;
        let status = scheduler.status();
        assert!(status.active_jobs + status.pending_approval <= 3);
    }

    // The same catalog keeps being served; admitted jobs must not be
    // admitted twice.
    assert_eq!(scheduler.status().stats.total_jobs, 3);
}

#[tokio::test(start_paused = true)]
async fn min_payment_excludes_cheap_jobs() {
    let source = ScriptedSource::new();
    source.serve(
        "alpha",
        vec![
            job("cheap", "alpha", 0.001, PayoutSpeed::Instant),
            job("fine", "alpha", 0.05, PayoutSpeed::Instant),
        ],
    );
    let scheduler = scheduler_with(
        config(Strategy::Balanced, 5),
        source,
        Arc::new(Decide(ApprovalDecision::Approved)),
    );
    scheduler.connect_platform("alpha", "key-1").unwrap();

    scheduler.start().unwrap();
    settle().await;

    let ids: Vec<String> = scheduler
        .list_active_jobs()
        .iter()
        .map(|j| j.id().to_string())
        .collect();
    assert_eq!(ids, vec!["fine".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn discovery_failure_is_isolated_per_platform() {
    let source = ScriptedSource::new();
    source.serve("alpha", vec![job("good", "alpha", 1.0, PayoutSpeed::Weekly)]);
    source.fail_platform("beta");
    let scheduler = scheduler_with(
        config(Strategy::Balanced, 5),
        source,
        Arc::new(Decide(ApprovalDecision::Approved)),
    );
    let log = EventLog::attach(&scheduler);
    scheduler.connect_platform("alpha", "key-a").unwrap();
    scheduler.connect_platform("beta", "key-b").unwrap();

    scheduler.start().unwrap();
    settle().await;

    // The healthy platform's job was admitted despite beta failing.
    let status = scheduler.status();
    assert_eq!(status.active_jobs, 1);
    assert!(status.stats.discovery_errors > 0);
    assert!(status.is_running);
    assert!(log.count(EventKind::PlatformError) > 0);
}

// --- Approval flow ---

fn approval_job(id: &str) -> JobDescriptor {
    let mut j = job(id, "alpha", 1.0, PayoutSpeed::Weekly);
    j.requires_approval = true;
    j
}

#[tokio::test(start_paused = true)]
async fn approved_job_is_admitted_to_running() {
    let source = ScriptedSource::new();
    source.serve("alpha", vec![approval_job("needs-ok")]);
    let scheduler = scheduler_with(
        config(Strategy::Balanced, 5),
        source,
        Arc::new(Decide(ApprovalDecision::Approved)),
    );
    let log = EventLog::attach(&scheduler);
    scheduler.connect_platform("alpha", "key-1").unwrap();

    scheduler.start().unwrap();
    settle().await;

    let active = scheduler.list_active_jobs();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].status, ActiveJobStatus::Running);
    assert!(log.count(EventKind::JobPendingApproval) > 0);
    assert!(log.count(EventKind::JobApproved) > 0);
}

#[tokio::test(start_paused = true)]
async fn rejected_job_frees_its_slot() {
    let source = ScriptedSource::new();
    source.serve("alpha", vec![approval_job("denied")]);
    let scheduler = scheduler_with(
        config(Strategy::Balanced, 5),
        source,
        Arc::new(Decide(ApprovalDecision::Rejected)),
    );
    let log = EventLog::attach(&scheduler);
    scheduler.connect_platform("alpha", "key-1").unwrap();

    scheduler.start().unwrap();
    settle().await;

    let status = scheduler.status();
    assert_eq!(status.active_jobs, 0);
    assert_eq!(status.pending_approval, 0);
    assert_eq!(status.available_slots, 5);
    assert!(log.count(EventKind::JobRejected) > 0);
    assert_eq!(status.stats.total_jobs, 0);
}

#[tokio::test(start_paused = true)]
async fn stalled_approval_is_clamped_and_rejected() {
    let source = ScriptedSource::new();
    source.serve("alpha", vec![approval_job("stuck")]);
    // One tick per hour: only the first scan runs inside this test's
    // window, so the rejected job is not re-selected before we assert.
    let mut cfg = config(Strategy::Balanced, 5);
    cfg.scan_interval_ms = 3_600_000;
    let scheduler = scheduler_with(cfg, source, Arc::new(NeverResolves));
    let log = EventLog::attach(&scheduler);
    scheduler.connect_platform("alpha", "key-1").unwrap();

    scheduler.start().unwrap();
    // Run the virtual clock well past the approval clamp.
    tokio::time::sleep(Duration::from_secs(40)).await;

    let status = scheduler.status();
    assert_eq!(status.pending_approval, 0);
    assert_eq!(status.active_jobs, 0);
    assert!(log.count(EventKind::JobRejected) > 0);
}

// --- Manual operations ---

#[tokio::test(start_paused = true)]
async fn approve_job_unknown_id_is_not_found() {
    let scheduler = scheduler_with(
        config(Strategy::Balanced, 5),
        ScriptedSource::new(),
        Arc::new(Decide(ApprovalDecision::Approved)),
    );

    assert!(matches!(
        scheduler.approve_job(&"ghost".into()),
        Err(SchedulerError::JobNotFound { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn approve_job_beyond_capacity_fails() {
    let source = ScriptedSource::new();
    source.serve(
        "alpha",
        vec![
            job("first", "alpha", 2.0, PayoutSpeed::Weekly),
            job("second", "alpha", 1.0, PayoutSpeed::Weekly),
        ],
    );
    let scheduler = scheduler_with(
        config(Strategy::BigYield, 1),
        source,
        Arc::new(Decide(ApprovalDecision::Approved)),
    );
    scheduler.connect_platform("alpha", "key-1").unwrap();

    scheduler.start().unwrap();
    settle().await;

    // "first" fills the single slot; "second" is still in the catalog.
    assert_eq!(scheduler.status().active_jobs, 1);
    assert!(matches!(
        scheduler.approve_job(&"second".into()),
        Err(SchedulerError::CapacityExhausted { .. })
    ));

    // Freeing the slot makes the same manual approval succeed.
    assert!(scheduler.cancel_job(&"first".into()));
    scheduler.approve_job(&"second".into()).unwrap();
    let active = scheduler.list_active_jobs();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id().as_str(), "second");
    assert_eq!(active[0].status, ActiveJobStatus::Running);
}

#[tokio::test(start_paused = true)]
async fn cancel_job_reports_presence() {
    let source = ScriptedSource::new();
    source.serve("alpha", vec![job("j1", "alpha", 1.0, PayoutSpeed::Weekly)]);
    let scheduler = scheduler_with(
        config(Strategy::Balanced, 5),
        source,
        Arc::new(Decide(ApprovalDecision::Approved)),
    );
    scheduler.connect_platform("alpha", "key-1").unwrap();

    scheduler.start().unwrap();
    settle().await;

    assert!(scheduler.cancel_job(&"j1".into()));
    assert!(!scheduler.cancel_job(&"j1".into()));
    assert_eq!(scheduler.status().active_jobs, 0);
}

#[tokio::test(start_paused = true)]
async fn complete_job_credits_earnings() {
    let source = ScriptedSource::new();
    source.serve("alpha", vec![job("payday", "alpha", 2.5, PayoutSpeed::Weekly)]);
    let scheduler = scheduler_with(
        config(Strategy::Balanced, 5),
        source,
        Arc::new(Decide(ApprovalDecision::Approved)),
    );
    scheduler.connect_platform("alpha", "key-1").unwrap();

    scheduler.start().unwrap();
    settle().await;

    scheduler.complete_job(&"payday".into()).unwrap();

    let stats = scheduler.status().stats;
    assert_eq!(stats.completed_jobs, 1);
    assert!((stats.total_earnings - 2.5).abs() < f64::EPSILON);
    assert!(matches!(
        scheduler.complete_job(&"payday".into()),
        Err(SchedulerError::JobNotFound { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn change_strategy_validates_names() {
    let scheduler = scheduler_with(
        config(Strategy::Balanced, 5),
        ScriptedSource::new(),
        Arc::new(Decide(ApprovalDecision::Approved)),
    );
    let log = EventLog::attach(&scheduler);

    assert!(matches!(
        scheduler.change_strategy("turbo-mode"),
        Err(SchedulerError::InvalidStrategy { .. })
    ));
    assert_eq!(scheduler.status().strategy, Strategy::Balanced);
    assert_eq!(log.count(EventKind::StrategyChanged), 0);

    scheduler.change_strategy("quick-payout").unwrap();
    assert_eq!(scheduler.status().strategy, Strategy::QuickPayout);
    assert_eq!(log.count(EventKind::StrategyChanged), 1);
}

// --- Platform connections and credentials ---

#[tokio::test(start_paused = true)]
async fn connect_unknown_platform_leaves_map_unmodified() {
    let scheduler = scheduler_with(
        config(Strategy::Balanced, 5),
        ScriptedSource::new(),
        Arc::new(Decide(ApprovalDecision::Approved)),
    );

    let result = scheduler.connect_platform("not-a-real-platform", "key");
    assert!(matches!(result, Err(SchedulerError::Platform(_))));
    assert!(scheduler.status().platforms.is_empty());
}

#[tokio::test(start_paused = true)]
async fn connect_without_encryption_key_fails() {
    let mut cfg = config(Strategy::Balanced, 5);
    cfg.encryption_key = None;
    let scheduler = scheduler_with(
        cfg,
        ScriptedSource::new(),
        Arc::new(Decide(ApprovalDecision::Approved)),
    );

    assert!(matches!(
        scheduler.connect_platform("alpha", "key"),
        Err(SchedulerError::Vault(_))
    ));
    assert!(!scheduler.status().config.encryption_key_configured);
}

#[tokio::test(start_paused = true)]
async fn discovery_receives_decrypted_credentials() {
    let source = ScriptedSource::new();
    let scheduler = scheduler_with(
        config(Strategy::Balanced, 5),
        source.clone(),
        Arc::new(Decide(ApprovalDecision::Approved)),
    );
    scheduler.connect_platform("alpha", "plain-api-key").unwrap();

    scheduler.start().unwrap();
    settle().await;

    assert_eq!(
        source.last_api_key.lock().unwrap().as_deref(),
        Some("plain-api-key")
    );
}

#[tokio::test(start_paused = true)]
async fn status_never_exposes_credentials() {
    let source = ScriptedSource::new();
    let scheduler = scheduler_with(
        config(Strategy::Balanced, 5),
        source,
        Arc::new(Decide(ApprovalDecision::Approved)),
    );
    scheduler.connect_platform("alpha", "super-secret-key").unwrap();

    let status = scheduler.status();
    let serialized = serde_json::to_string(&status).unwrap();
    assert!(!serialized.contains("super-secret-key"));
    assert!(!serialized.contains("test-secret"));
    assert_eq!(status.platforms.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn lifecycle_events_are_published_in_order() {
    let scheduler = scheduler_with(
        config(Strategy::Balanced, 5),
        ScriptedSource::new(),
        Arc::new(Decide(ApprovalDecision::Approved)),
    );
    let log = EventLog::attach(&scheduler);

    scheduler.connect_platform("alpha", "key").unwrap();
    scheduler.start().unwrap();
    scheduler.stop().unwrap();

    let kinds = log.kinds();
    assert_eq!(
        kinds,
        vec![
            EventKind::PlatformConnected,
            EventKind::SystemStarted,
            EventKind::SystemStopped,
        ]
    );
}
