use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gigpilot_core::types::{ConnectionId, PlatformId};

/// Runtime connection state of a platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// No credentials recorded, or the connection was closed cleanly.
    Disconnected,

    /// Credentials are stored and the platform is eligible for discovery.
    Connected,

    /// The most recent platform interaction failed.
    Error(String),
}

/// A platform connection record, owned exclusively by the scheduler.
///
/// The credential blob is always the vault's encrypted form — plaintext
/// credentials only exist transiently inside a discovery call.
#[derive(Debug, Clone)]
pub struct PlatformConnection {
    pub platform: PlatformId,
    /// Random per-connection id, used only for log correlation.
    pub connection_id: ConnectionId,
    pub status: ConnectionStatus,
    /// Encrypted credential blob (`nonce:tag:ciphertext` hex).
    pub encrypted_credentials: String,
    pub connected_at: DateTime<Utc>,
}

impl PlatformConnection {
    pub fn new(platform: PlatformId, encrypted_credentials: String) -> Self {
        Self {
            platform,
            connection_id: ConnectionId::new(),
            status: ConnectionStatus::Connected,
            encrypted_credentials,
            connected_at: Utc::now(),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.status, ConnectionStatus::Connected)
    }
}
