//! # Cryptographic Errors

use thiserror::Error;

/// Error in cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// No audit encryption key is configured.
    #[error("audit encryption key is not configured")]
    MissingKey,

    /// Key material is malformed (wrong length or encoding).
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    /// AEAD encryption failed.
    #[error("encryption failed")]
    EncryptionFailed,

    /// AEAD decryption failed (wrong key, tampered or truncated ciphertext).
    #[error("decryption failed")]
    DecryptionFailed,

    /// A supplied or requested secret does not meet the credential policy.
    #[error("invalid secret: {0}")]
    InvalidSecret(String),

    /// Base64 decoding failed.
    #[error("encoding error: {0}")]
    Encoding(#[from] base64::DecodeError),
}
