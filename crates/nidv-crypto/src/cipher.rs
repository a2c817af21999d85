//! # Audit Display Cipher
//!
//! AES-256-GCM encryption of credential secrets, kept only so an operator
//! can reveal an issued key from the audit tooling. The ciphertext is never
//! consulted during authentication.
//!
//! ## Wire Format
//!
//! ```text
//! base64( nonce[12] || ciphertext || tag[16] )
//! ```
//!
//! A fresh random nonce is drawn from the OS CSPRNG for every encryption.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::secret::SecretToken;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Symmetric cipher for audit-display copies of secrets.
///
/// Constructed [`disabled`](AuditCipher::disabled) when no key material is
/// configured; every operation then fails with [`CryptoError::MissingKey`].
#[derive(Clone)]
pub struct AuditCipher {
    key: Option<Zeroizing<[u8; KEY_LEN]>>,
}

impl AuditCipher {
    /// Cipher over a raw 32-byte key.
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self {
            key: Some(Zeroizing::new(key)),
        }
    }

    /// Cipher with no key material.
    pub fn disabled() -> Self {
        Self { key: None }
    }

    /// Parse base64-encoded key material (must decode to exactly 32 bytes).
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let raw = Zeroizing::new(BASE64.decode(encoded.trim().as_bytes())?);
        let key: [u8; KEY_LEN] = raw.as_slice().try_into().map_err(|_| {
            CryptoError::InvalidKey(format!(
                "audit key must decode to {KEY_LEN} bytes, got {}",
                raw.len()
            ))
        })?;
        Ok(Self::new(key))
    }

    /// Generate a fresh random key, returned base64-encoded for configuration.
    pub fn generate_key_base64() -> String {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        OsRng.fill_bytes(&mut key[..]);
        BASE64.encode(&key[..])
    }

    /// Whether key material is present.
    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }

    fn aead(&self) -> Result<Aes256Gcm, CryptoError> {
        let key = self.key.as_ref().ok_or(CryptoError::MissingKey)?;
        Aes256Gcm::new_from_slice(&key[..])
            .map_err(|_| CryptoError::InvalidKey("AES-256 key must be 32 bytes".into()))
    }

    /// Encrypt a secret for audit display.
    pub fn encrypt(&self, secret: &SecretToken) -> Result<String, CryptoError> {
        let aead = self.aead()?;
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let ciphertext = aead
            .encrypt(Nonce::from_slice(&nonce_bytes), secret.as_str().as_bytes())
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(sealed))
    }

    /// Decrypt a value produced by [`encrypt`](AuditCipher::encrypt).
    pub fn decrypt(&self, sealed: &str) -> Result<SecretToken, CryptoError> {
        let aead = self.aead()?;
        let raw = BASE64.decode(sealed.as_bytes())?;
        if raw.len() <= NONCE_LEN {
            return Err(CryptoError::DecryptionFailed);
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = Zeroizing::new(
            aead.decrypt(Nonce::from_slice(nonce), ciphertext)
                .map_err(|_| CryptoError::DecryptionFailed)?,
        );
        let text = std::str::from_utf8(&plaintext).map_err(|_| CryptoError::DecryptionFailed)?;
        SecretToken::new(text)
    }
}

impl std::fmt::Debug for AuditCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditCipher")
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> AuditCipher {
        AuditCipher::new([7u8; KEY_LEN])
    }

    #[test]
    fn encrypt_then_decrypt_recovers_secret() {
        let secret = SecretToken::new("integration_test_key_123456").unwrap();
        let sealed = cipher().encrypt(&secret).unwrap();
        assert!(!sealed.contains("integration_test_key"));
        assert_eq!(cipher().decrypt(&sealed).unwrap(), secret);
    }

    #[test]
    fn nonces_are_fresh() {
        let secret = SecretToken::new("same-secret").unwrap();
        assert_ne!(cipher().encrypt(&secret).unwrap(), cipher().encrypt(&secret).unwrap());
    }

    #[test]
    fn disabled_cipher_reports_missing_key() {
        let secret = SecretToken::new("whatever").unwrap();
        let disabled = AuditCipher::disabled();
        assert!(!disabled.is_enabled());
        assert!(matches!(disabled.encrypt(&secret), Err(CryptoError::MissingKey)));
        assert!(matches!(disabled.decrypt("AAAA"), Err(CryptoError::MissingKey)));
    }

    #[test]
    fn wrong_key_fails_to_decrypt() {
        let secret = SecretToken::new("whatever").unwrap();
        let sealed = cipher().encrypt(&secret).unwrap();
        let other = AuditCipher::new([9u8; KEY_LEN]);
        assert!(matches!(other.decrypt(&sealed), Err(CryptoError::DecryptionFailed)));
    }

    #[test]
    fn truncated_ciphertext_fails() {
        assert!(matches!(cipher().decrypt("AAAA"), Err(CryptoError::DecryptionFailed)));
        assert!(matches!(cipher().decrypt("!!!"), Err(CryptoError::Encoding(_))));
    }

    #[test]
    fn base64_key_parsing() {
        let encoded = AuditCipher::generate_key_base64();
        assert!(AuditCipher::from_base64(&encoded).unwrap().is_enabled());
        assert!(matches!(
            AuditCipher::from_base64(&BASE64.encode([1u8; 16])),
            Err(CryptoError::InvalidKey(_))
        ));
    }

    #[test]
    fn debug_redacts_key() {
        let rendered = format!("{:?}", cipher());
        assert!(rendered.contains("REDACTED"));
    }
}
