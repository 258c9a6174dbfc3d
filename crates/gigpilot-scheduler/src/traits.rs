use async_trait::async_trait;

use gigpilot_core::types::{JobDescriptor, PlatformDescriptor};

use crate::error::{ApprovalError, DiscoveryError};

/// Job-discovery collaborator — one network client behind a trait.
///
/// Implementations must be `Send + Sync` so a single source can serve the
/// tick task and be shared with the embedding application.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Fetch fresh job descriptors advertised by `platform`.
    ///
    /// `api_key` is the decrypted credential for this platform; it exists
    /// only for the duration of the call and must not be retained.
    async fn fetch_jobs(
        &self,
        platform: &PlatformDescriptor,
        api_key: &str,
    ) -> Result<Vec<JobDescriptor>, DiscoveryError>;
}

/// Terminal outcome of an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    Approved,
    Rejected,
}

/// Approval collaborator for jobs with `requires_approval` set.
///
/// The scheduler clamps every `resolve` call to a fixed wall-clock bound,
/// so implementations may take arbitrarily long without hurting liveness —
/// an overrun simply counts as a rejection.
#[async_trait]
pub trait ApprovalService: Send + Sync {
    async fn resolve(&self, job: &JobDescriptor) -> Result<ApprovalDecision, ApprovalError>;
}
