use std::collections::HashMap;

use tracing::debug;

use gigpilot_core::types::{PlatformDescriptor, PlatformId};

use crate::catalog::builtin_catalog;

/// Immutable catalog of platform descriptors, keyed by platform id.
///
/// Built once at construction and never mutated — "not found" is reported
/// through `Option`, and callers decide whether that is an error.
pub struct PlatformRegistry {
    platforms: HashMap<PlatformId, PlatformDescriptor>,
}

impl PlatformRegistry {
    /// Build a registry from an explicit descriptor table.
    ///
    /// A duplicate id replaces the earlier entry, matching last-write-wins
    /// table semantics.
    pub fn new(descriptors: Vec<PlatformDescriptor>) -> Self {
        let mut platforms = HashMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            if platforms.insert(descriptor.id.clone(), descriptor).is_some() {
                debug!("duplicate platform id in catalog — later entry wins");
            }
        }
        Self { platforms }
    }

    /// Registry over the built-in platform catalog.
    pub fn builtin() -> Self {
        Self::new(builtin_catalog())
    }

    /// Look up a platform descriptor by id.
    pub fn get(&self, id: &PlatformId) -> Option<&PlatformDescriptor> {
        self.platforms.get(id)
    }

    pub fn contains(&self, id: &PlatformId) -> bool {
        self.platforms.contains_key(id)
    }

    /// Snapshot of every descriptor, sorted by id for deterministic output.
    pub fn list_all(&self) -> Vec<&PlatformDescriptor> {
        let mut all: Vec<&PlatformDescriptor> = self.platforms.values().collect();
        all.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        all
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gigpilot_core::types::{Difficulty, PayoutSpeed};

    fn descriptor(id: &str, payout: f64) -> PlatformDescriptor {
        PlatformDescriptor {
            id: id.into(),
            name: id.to_uppercase(),
            signup_url: format!("https://{id}.example/signup"),
            api_url: format!("https://api.{id}.example"),
            login_url: format!("https://{id}.example/login"),
            requirements: String::new(),
            auto_approval: true,
            payout_speed: PayoutSpeed::Weekly,
            average_payout: payout,
            success_rate: 0.9,
            difficulty: Difficulty::Easy,
        }
    }

    #[test]
    fn get_finds_known_platform() {
        let registry = PlatformRegistry::new(vec![descriptor("alpha", 0.1)]);
        assert!(registry.get(&"alpha".into()).is_some());
        assert!(registry.contains(&"alpha".into()));
    }

    #[test]
    fn get_returns_none_for_unknown_platform() {
        let registry = PlatformRegistry::new(vec![descriptor("alpha", 0.1)]);
        assert!(registry.get(&"not-a-real-platform".into()).is_none());
    }

    #[test]
    fn list_all_is_sorted_by_id() {
        let registry = PlatformRegistry::new(vec![
            descriptor("zulu", 0.1),
            descriptor("alpha", 0.2),
            descriptor("mike", 0.3),
        ]);
        let ids: Vec<&str> = registry.list_all().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "mike", "zulu"]);
    }

    #[test]
    fn duplicate_id_replaces_earlier_entry() {
        let registry =
            PlatformRegistry::new(vec![descriptor("alpha", 0.1), descriptor("alpha", 0.9)]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&"alpha".into()).unwrap().average_payout, 0.9);
    }

    #[test]
    fn builtin_catalog_is_nonempty_and_stable() {
        let registry = PlatformRegistry::builtin();
        assert!(!registry.is_empty());

        let first: Vec<String> = registry
            .list_all()
            .iter()
            .map(|p| p.id.to_string())
            .collect();
        let second: Vec<String> = registry
            .list_all()
            .iter()
            .map(|p| p.id.to_string())
            .collect();
        assert_eq!(first, second);
    }
}
