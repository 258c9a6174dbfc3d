//! `gigpilot-vault` — authenticated encryption for platform credentials.
//!
//! Credentials are sealed with AES-256-GCM under a key derived from the
//! operator-configured secret. Tampering is detected by the GCM tag, and
//! the vault refuses every operation until a secret is configured.

pub mod error;
pub mod vault;

pub use error::VaultError;
pub use vault::CredentialVault;
