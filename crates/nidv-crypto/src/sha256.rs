//! # SHA-256 Lookup Hashes
//!
//! A [`KeyHash`] is the lowercase hex SHA-256 digest of a secret token. It is
//! the credential's authentication key and its rate-limit identity.
//!
//! ## Security Invariant
//!
//! `KeyHash` can only be produced from a [`SecretToken`] via
//! [`hash_secret()`] or parsed from an already-hex string. There is no path
//! back from a hash to the plaintext.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::CryptoError;
use crate::secret::SecretToken;

/// Length of a hex-encoded SHA-256 digest.
pub const KEY_HASH_HEX_LEN: usize = 64;

/// Hex-encoded SHA-256 digest of a secret token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct KeyHash(String);

impl KeyHash {
    /// Parse a stored hash, requiring exactly 64 lowercase hex characters.
    pub fn parse(value: impl Into<String>) -> Result<Self, CryptoError> {
        let s = value.into();
        if s.len() != KEY_HASH_HEX_LEN
            || !s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(CryptoError::InvalidKey(format!(
                "lookup hash must be {KEY_HASH_HEX_LEN} lowercase hex characters"
            )));
        }
        Ok(Self(s))
    }

    /// Access the hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time equality against another hash.
    pub fn ct_eq(&self, other: &KeyHash) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl<'de> Deserialize<'de> for KeyHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(raw).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for KeyHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the lookup hash of a secret token.
pub fn hash_secret(secret: &SecretToken) -> KeyHash {
    let digest = Sha256::digest(secret.as_str().as_bytes());
    KeyHash(digest.iter().map(|b| format!("{b:02x}")).collect())
}
