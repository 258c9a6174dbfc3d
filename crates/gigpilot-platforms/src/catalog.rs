//! Built-in platform catalog — maps well-known micro-task platforms to
//! their URLs, payout characteristics and difficulty. Supplied to
//! [`PlatformRegistry`](crate::registry::PlatformRegistry) at construction
//! so tests can swap in their own table.

use gigpilot_core::types::{Difficulty, PayoutSpeed, PlatformDescriptor};

/// A well-known micro-task platform.
pub struct KnownPlatform {
    /// Short identifier used as the registry key (e.g. "mturk").
    pub id: &'static str,
    /// Human-readable display name.
    pub name: &'static str,
    pub signup_url: &'static str,
    pub api_url: &'static str,
    pub login_url: &'static str,
    /// Free-form requirement text shown to operators.
    pub requirements: &'static str,
    /// True if the platform approves new workers without manual review.
    pub auto_approval: bool,
    pub payout_speed: PayoutSpeed,
    /// Average payout per task in USD.
    pub average_payout: f64,
    /// Observed task acceptance rate, 0.0 ..= 1.0.
    pub success_rate: f64,
    pub difficulty: Difficulty,
}

impl KnownPlatform {
    /// Materialise the owned descriptor handed to the registry.
    pub fn descriptor(&self) -> PlatformDescriptor {
        PlatformDescriptor {
            id: self.id.into(),
            name: self.name.to_string(),
            signup_url: self.signup_url.to_string(),
            api_url: self.api_url.to_string(),
            login_url: self.login_url.to_string(),
            requirements: self.requirements.to_string(),
            auto_approval: self.auto_approval,
            payout_speed: self.payout_speed,
            average_payout: self.average_payout,
            success_rate: self.success_rate,
            difficulty: self.difficulty,
        }
    }
}

pub const KNOWN_PLATFORMS: &[KnownPlatform] = &[
    KnownPlatform {
        id: "mturk",
        name: "Amazon Mechanical Turk",
        signup_url: "https://www.mturk.com/get-started",
        api_url: "https://mturk-requester.us-east-1.amazonaws.com",
        login_url: "https://worker.mturk.com",
        requirements: "US bank account or Amazon balance; worker approval can take days",
        auto_approval: false,
        payout_speed: PayoutSpeed::Weekly,
        average_payout: 0.08,
        success_rate: 0.92,
        difficulty: Difficulty::Easy,
    },
    KnownPlatform {
        id: "clickworker",
        name: "Clickworker",
        signup_url: "https://www.clickworker.com/clickworker-job",
        api_url: "https://api.clickworker.com/v2",
        login_url: "https://workplace.clickworker.com",
        requirements: "Short assessment per task category; PayPal or SEPA account",
        auto_approval: true,
        payout_speed: PayoutSpeed::Weekly,
        average_payout: 0.12,
        success_rate: 0.88,
        difficulty: Difficulty::Easy,
    },
    KnownPlatform {
        id: "microworkers",
        name: "Microworkers",
        signup_url: "https://www.microworkers.com/signup",
        api_url: "https://api.microworkers.com",
        login_url: "https://www.microworkers.com/login",
        requirements: "One account per household; payout above $9 balance",
        auto_approval: true,
        payout_speed: PayoutSpeed::Weekly,
        average_payout: 0.10,
        success_rate: 0.85,
        difficulty: Difficulty::Easy,
    },
    KnownPlatform {
        id: "toloka",
        name: "Toloka",
        signup_url: "https://toloka.ai/tolokers",
        api_url: "https://toloka.dev/api/v1",
        login_url: "https://platform.toloka.ai",
        requirements: "Mobile or desktop; some tasks require locale match",
        auto_approval: true,
        payout_speed: PayoutSpeed::Instant,
        average_payout: 0.05,
        success_rate: 0.90,
        difficulty: Difficulty::Easy,
    },
    KnownPlatform {
        id: "prolific",
        name: "Prolific",
        signup_url: "https://www.prolific.com/participants",
        api_url: "https://api.prolific.com/v1",
        login_url: "https://app.prolific.com",
        requirements: "Waitlisted signup; demographic screening per study",
        auto_approval: false,
        payout_speed: PayoutSpeed::Weekly,
        average_payout: 1.50,
        success_rate: 0.95,
        difficulty: Difficulty::Medium,
    },
    KnownPlatform {
        id: "remotasks",
        name: "Remotasks",
        signup_url: "https://www.remotasks.com/signup",
        api_url: "https://api.remotasks.com",
        login_url: "https://www.remotasks.com/login",
        requirements: "Training course per task type before first assignment",
        auto_approval: true,
        payout_speed: PayoutSpeed::Weekly,
        average_payout: 0.15,
        success_rate: 0.80,
        difficulty: Difficulty::Medium,
    },
    KnownPlatform {
        id: "usertesting",
        name: "UserTesting",
        signup_url: "https://www.usertesting.com/get-paid-to-test",
        api_url: "https://api.usertesting.com",
        login_url: "https://app.usertesting.com",
        requirements: "Practice test review; microphone and screen recording",
        auto_approval: false,
        payout_speed: PayoutSpeed::Weekly,
        average_payout: 10.0,
        success_rate: 0.70,
        difficulty: Difficulty::Hard,
    },
    KnownPlatform {
        id: "spare5",
        name: "Spare5",
        signup_url: "https://app.spare5.com/fives/sign_up",
        api_url: "https://api.spare5.com",
        login_url: "https://app.spare5.com",
        requirements: "Qualification tasks unlock paid work; PayPal payout",
        auto_approval: true,
        payout_speed: PayoutSpeed::Instant,
        average_payout: 0.04,
        success_rate: 0.85,
        difficulty: Difficulty::Easy,
    },
];

/// Owned descriptors for every built-in platform.
pub fn builtin_catalog() -> Vec<PlatformDescriptor> {
    KNOWN_PLATFORMS.iter().map(KnownPlatform::descriptor).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_unique() {
        let mut ids: Vec<&str> = KNOWN_PLATFORMS.iter().map(|p| p.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), KNOWN_PLATFORMS.len());
    }

    #[test]
    fn catalog_values_are_in_bounds() {
        for platform in KNOWN_PLATFORMS {
            assert!(platform.average_payout > 0.0, "{}", platform.id);
            assert!(
                (0.0..=1.0).contains(&platform.success_rate),
                "{}",
                platform.id
            );
        }
    }
}
