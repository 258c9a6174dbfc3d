use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identifier for a platform (e.g. "mturk", "clickworker").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformId(pub String);

impl PlatformId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlatformId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PlatformId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier for a job, assigned by the platform that advertised it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Per-connection identifier (random UUID, not persisted).
///
/// Used only for log correlation — the connection map itself is keyed by
/// [`PlatformId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How quickly a platform pays out completed work.
///
/// `rank()` gives the ordering used by the quick-payout strategy:
/// instant < weekly < monthly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutSpeed {
    Instant,
    Weekly,
    Monthly,
}

impl PayoutSpeed {
    /// Lower is faster. Instant = 0, Weekly = 1, Monthly = 2.
    pub fn rank(&self) -> u8 {
        match self {
            PayoutSpeed::Instant => 0,
            PayoutSpeed::Weekly => 1,
            PayoutSpeed::Monthly => 2,
        }
    }
}

impl fmt::Display for PayoutSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PayoutSpeed::Instant => "instant",
            PayoutSpeed::Weekly => "weekly",
            PayoutSpeed::Monthly => "monthly",
        };
        write!(f, "{s}")
    }
}

/// How hard the platform's typical task is to complete successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Lower is easier. Easy = 0, Medium = 1, Hard = 2.
    pub fn rank(&self) -> u8 {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        write!(f, "{s}")
    }
}

/// Named policy determining how available jobs are ranked for admission.
///
/// This is a closed enumeration — unknown names are rejected at every
/// string boundary (`FromStr`, config load, `change_strategy`) rather than
/// silently mapped to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Fastest payout first (instant < weekly < monthly), ties broken by
    /// descending success rate.
    QuickPayout,
    /// Highest payment first, ties broken by ascending estimated time.
    BigYield,
    /// Easiest first (easy < medium < hard), ties broken by descending
    /// success rate.
    GuaranteedCompletion,
    /// Weighted composite of payment, success rate, inverse estimated time
    /// and payout speed.
    #[default]
    Balanced,
}

impl Strategy {
    /// All valid strategies, in documentation order.
    pub const ALL: [Strategy; 4] = [
        Strategy::QuickPayout,
        Strategy::BigYield,
        Strategy::GuaranteedCompletion,
        Strategy::Balanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::QuickPayout => "quick-payout",
            Strategy::BigYield => "big-yield",
            Strategy::GuaranteedCompletion => "guaranteed-completion",
            Strategy::Balanced => "balanced",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "quick-payout" => Ok(Strategy::QuickPayout),
            "big-yield" => Ok(Strategy::BigYield),
            "guaranteed-completion" => Ok(Strategy::GuaranteedCompletion),
            "balanced" => Ok(Strategy::Balanced),
            other => Err(format!("unknown strategy: {other}")),
        }
    }
}

/// Immutable description of an external gig/task platform.
///
/// Created once at process start from the built-in catalog table (or a
/// test-supplied table) and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformDescriptor {
    pub id: PlatformId,
    /// Human-readable display name.
    pub name: String,
    pub signup_url: String,
    pub api_url: String,
    pub login_url: String,
    /// Free-form requirement text shown to operators (age, region, gear).
    pub requirements: String,
    /// True when the platform approves new workers without manual review.
    pub auto_approval: bool,
    pub payout_speed: PayoutSpeed,
    /// Average payout per task in USD.
    pub average_payout: f64,
    /// Observed task acceptance rate, 0.0 ..= 1.0.
    pub success_rate: f64,
    pub difficulty: Difficulty,
}

/// A short-lived work item advertised by a platform.
///
/// Produced fresh on every scan tick by the job-discovery collaborator and
/// discarded at the end of the tick unless admitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub id: JobId,
    pub title: String,
    /// Payment for completing the job, in USD. Never negative.
    pub payment: f64,
    /// Estimated completion time in minutes. Always positive.
    pub estimated_time_mins: u32,
    pub platform: PlatformId,
    pub payout_speed: PayoutSpeed,
    /// Expected probability of successful completion, 0.0 ..= 1.0.
    pub success_rate: f64,
    pub difficulty: Difficulty,
    /// True when admission must first pass through the approval service.
    pub requires_approval: bool,
}
