//! # nidv-crypto — Cryptographic Primitives
//!
//! Provides the cryptographic building blocks behind API credentials:
//!
//! - **SHA-256 lookup hashes.** The only representation of a secret that is
//!   used to authenticate. One-way and deterministic.
//! - **AES-256-GCM audit encryption.** A reversible copy of a secret kept
//!   solely so an operator can display it once. Never used to authenticate.
//! - **Secret generation.** Alphanumeric secrets drawn from the OS CSPRNG.
//!
//! ## Crate Policy
//!
//! - Plaintext secrets only ever live inside [`SecretToken`], which zeroizes
//!   on drop and redacts itself in `Debug` output.
//! - Hash comparisons are constant-time.
//! - No mocking of cryptographic operations in tests.

pub mod cipher;
pub mod error;
pub mod secret;
pub mod sha256;

pub use cipher::AuditCipher;
pub use error::CryptoError;
pub use secret::{
    SecretToken, GENERATED_SECRET_LENGTH, MAX_SECRET_LENGTH, MIN_GENERATED_SECRET_LENGTH,
};
pub use sha256::{hash_secret, KeyHash};
