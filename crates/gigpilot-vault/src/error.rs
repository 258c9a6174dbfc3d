use thiserror::Error;

/// Errors that can occur within the credential vault.
#[derive(Debug, Error)]
pub enum VaultError {
    /// No encryption key has been configured — every credential operation
    /// requires one.
    #[error("encryption key not configured")]
    KeyNotConfigured,

    /// The ciphertext is not in the expected `nonce:tag:ciphertext` hex
    /// format, or one of its parts has the wrong length.
    #[error("Malformed ciphertext: {0}")]
    Malformed(String),

    /// The authentication tag did not verify — the blob was tampered with
    /// or encrypted under a different key.
    #[error("Decryption failed: integrity check failed")]
    DecryptFailed,

    /// The cipher itself failed (key setup or encryption).
    #[error("Encryption failed: {0}")]
    Crypto(String),

    /// Decrypted bytes were not valid UTF-8.
    #[error("Decrypted credential is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, VaultError>;
