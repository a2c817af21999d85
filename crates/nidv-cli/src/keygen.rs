//! # Audit Key Generation
//!
//! Prints a fresh base64-encoded AES-256 key suitable for `NIDV_AUDIT_KEY`.

use anyhow::Result;

use nidv_crypto::AuditCipher;

/// Execute `nidv keygen`.
pub fn run_keygen() -> Result<u8> {
    println!("{}", AuditCipher::generate_key_base64());
    Ok(0)
}
