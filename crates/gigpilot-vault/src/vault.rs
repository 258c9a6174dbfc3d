use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{Result, VaultError};

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;
/// AES-GCM authentication tag length in bytes.
const TAG_LEN: usize = 16;

/// Encrypts and decrypts platform credentials with AES-256-GCM.
///
/// The 256-bit cipher key is derived as SHA-256 of the configured opaque
/// secret, so any non-empty secret string works. Without a secret every
/// operation fails with [`VaultError::KeyNotConfigured`].
///
/// Ciphertext wire format: `nonce:tag:ciphertext`, all parts hex-encoded.
#[derive(Clone)]
pub struct CredentialVault {
    key: Option<[u8; 32]>,
}

impl CredentialVault {
    /// Build a vault from the configured secret, if any.
    pub fn new(secret: Option<&str>) -> Self {
        let key = secret.filter(|s| !s.is_empty()).map(|s| {
            let digest = Sha256::digest(s.as_bytes());
            let mut key = [0u8; 32];
            key.copy_from_slice(&digest);
            key
        });
        Self { key }
    }

    /// A vault with no key — every credential operation fails.
    pub fn unconfigured() -> Self {
        Self { key: None }
    }

    /// True when a key is configured and credential operations can succeed.
    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    /// Encrypt `plaintext`, returning `nonce:tag:ciphertext` in hex.
    ///
    /// A fresh random nonce is drawn per call, so encrypting the same
    /// plaintext twice yields different blobs.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let key = self.key.ok_or(VaultError::KeyNotConfigured)?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| VaultError::Crypto(format!("cipher setup failed: {e}")))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| VaultError::Crypto(format!("encryption failed: {e}")))?;

        // AES-GCM appends the 16-byte tag to the ciphertext.
        // Split into (ciphertext, tag) for storage clarity.
        let tag_offset = ciphertext.len() - TAG_LEN;
        let ct = &ciphertext[..tag_offset];
        let tag = &ciphertext[tag_offset..];

        Ok(format!(
            "{}:{}:{}",
            hex::encode(nonce_bytes),
            hex::encode(tag),
            hex::encode(ct)
        ))
    }

    /// Decrypt a `nonce:tag:ciphertext` hex blob back to the plaintext.
    pub fn decrypt(&self, encrypted: &str) -> Result<String> {
        let key = self.key.ok_or(VaultError::KeyNotConfigured)?;

        let parts: Vec<&str> = encrypted.splitn(3, ':').collect();
        if parts.len() != 3 {
            return Err(VaultError::Malformed(
                "expected nonce:tag:ciphertext".to_string(),
            ));
        }

        let nonce_bytes =
            hex::decode(parts[0]).map_err(|e| VaultError::Malformed(format!("bad nonce: {e}")))?;
        let tag_bytes =
            hex::decode(parts[1]).map_err(|e| VaultError::Malformed(format!("bad tag: {e}")))?;
        let ct_bytes = hex::decode(parts[2])
            .map_err(|e| VaultError::Malformed(format!("bad ciphertext: {e}")))?;

        if nonce_bytes.len() != NONCE_LEN {
            return Err(VaultError::Malformed(format!(
                "nonce length {} (expected {NONCE_LEN})",
                nonce_bytes.len()
            )));
        }
        if tag_bytes.len() != TAG_LEN {
            return Err(VaultError::Malformed(format!(
                "tag length {} (expected {TAG_LEN})",
                tag_bytes.len()
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| VaultError::Crypto(format!("cipher setup failed: {e}")))?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        // Reconstruct ciphertext+tag as AES-GCM expects.
        let mut combined = ct_bytes;
        combined.extend_from_slice(&tag_bytes);

        let plaintext = cipher
            .decrypt(nonce, combined.as_ref())
            .map_err(|_| VaultError::DecryptFailed)?;

        Ok(String::from_utf8(plaintext)?)
    }
}

// Key material must never leak through Debug formatting or logs.
impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVault")
            .field("key", &self.key.map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault() -> CredentialVault {
        CredentialVault::new(Some("test-secret"))
    }

    #[test]
    fn round_trip_recovers_plaintext() {
        let v = vault();
        for input in ["api-key-123", "x", "unicode ✓ value", "a:b:c"] {
            let blob = v.encrypt(input).unwrap();
            assert_eq!(v.decrypt(&blob).unwrap(), input);
        }
    }

    #[test]
    fn encrypt_without_key_fails() {
        let v = CredentialVault::unconfigured();
        assert!(matches!(
            v.encrypt("secret"),
            Err(VaultError::KeyNotConfigured)
        ));
    }

    #[test]
    fn decrypt_without_key_fails() {
        let blob = vault().encrypt("secret").unwrap();
        let v = CredentialVault::unconfigured();
        assert!(matches!(v.decrypt(&blob), Err(VaultError::KeyNotConfigured)));
    }

    #[test]
    fn empty_secret_counts_as_unconfigured() {
        let v = CredentialVault::new(Some(""));
        assert!(!v.has_key());
        assert!(matches!(v.encrypt("x"), Err(VaultError::KeyNotConfigured)));
    }

    #[test]
    fn nonce_makes_blobs_unique() {
        let v = vault();
        let a = v.encrypt("same input").unwrap();
        let b = v.encrypt("same input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn tampered_ciphertext_is_rejected() {
        let v = vault();
        let blob = v.encrypt("credential").unwrap();

        // Flip the last hex digit of the ciphertext part.
        let mut chars: Vec<char> = blob.chars().collect();
        let last = *chars.last().unwrap();
        *chars.last_mut().unwrap() = if last == '0' { '1' } else { '0' };
        let tampered: String = chars.into_iter().collect();

        assert!(matches!(
            v.decrypt(&tampered),
            Err(VaultError::DecryptFailed)
        ));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let blob = vault().encrypt("credential").unwrap();
        let other = CredentialVault::new(Some("different-secret"));
        assert!(matches!(other.decrypt(&blob), Err(VaultError::DecryptFailed)));
    }

    #[test]
    fn malformed_blob_is_rejected() {
        let v = vault();
        for bad in ["", "abc", "aa:bb", "zz:zz:zz", "aa:bb:cc:dd-extra"] {
            match v.decrypt(bad) {
                Err(VaultError::Malformed(_)) => {}
                other => panic!("expected Malformed for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn debug_output_redacts_key() {
        let formatted = format!("{:?}", vault());
        assert!(!formatted.contains("test-secret"));
        assert!(formatted.contains("redacted"));
    }
}
