//! # Secret Tokens
//!
//! [`SecretToken`] holds a plaintext API secret for the short window in
//! which it must exist: while hashing an inbound request header, or between
//! issuance and the one-time display to the operator.

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Length of secrets generated when the operator does not supply one.
pub const GENERATED_SECRET_LENGTH: usize = 32;

/// Shortest secret the generator will produce.
pub const MIN_GENERATED_SECRET_LENGTH: usize = 20;

/// Longest secret accepted anywhere (issuance or authentication).
pub const MAX_SECRET_LENGTH: usize = 64;

/// Number of trailing characters kept for masked display.
const PREVIEW_LEN: usize = 4;

/// A plaintext secret. Zeroized on drop, redacted in `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretToken(Zeroizing<String>);

impl SecretToken {
    /// Wrap a secret, enforcing the credential policy: 1 to
    /// [`MAX_SECRET_LENGTH`] visible ASCII characters, no whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, CryptoError> {
        let s = Zeroizing::new(value.into());
        if s.is_empty() {
            return Err(CryptoError::InvalidSecret("secret must not be empty".into()));
        }
        if s.len() > MAX_SECRET_LENGTH {
            return Err(CryptoError::InvalidSecret(format!(
                "secret must not exceed {MAX_SECRET_LENGTH} characters"
            )));
        }
        if !s.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(CryptoError::InvalidSecret(
                "secret must contain only visible ASCII characters".into(),
            ));
        }
        Ok(Self(s))
    }

    /// Generate a [`GENERATED_SECRET_LENGTH`]-character alphanumeric secret.
    pub fn generate() -> Self {
        Self(Zeroizing::new(random_alphanumeric(GENERATED_SECRET_LENGTH)))
    }

    /// Generate an alphanumeric secret of the given length.
    pub fn generate_with_length(len: usize) -> Result<Self, CryptoError> {
        if !(MIN_GENERATED_SECRET_LENGTH..=MAX_SECRET_LENGTH).contains(&len) {
            return Err(CryptoError::InvalidSecret(format!(
                "generated secret length must be between {MIN_GENERATED_SECRET_LENGTH} and {MAX_SECRET_LENGTH}"
            )));
        }
        Ok(Self(Zeroizing::new(random_alphanumeric(len))))
    }

    /// Expose the plaintext.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last four characters (or the whole secret when shorter), stored
    /// directly for `****XXXX` display.
    pub fn preview_suffix(&self) -> String {
        let start = self.0.len().saturating_sub(PREVIEW_LEN);
        self.0[start..].to_string()
    }
}

impl std::fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretToken([REDACTED])")
    }
}

fn random_alphanumeric(len: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
