//! # nidv-cli — Credential Provisioning CLI
//!
//! Provides the `nidv` command-line interface used by operators to manage
//! the API credentials that the validation service authenticates against.
//!
//! ## Subcommands
//!
//! - `nidv issue` — issue a credential and print its secret once.
//! - `nidv list` — list credentials with masked previews.
//! - `nidv activate` / `nidv deactivate` — toggle a credential.
//! - `nidv reveal` — decrypt a credential's audit copy for display.
//! - `nidv keygen` — generate a fresh audit encryption key.
//!
//! All subcommands operate on the JSON credentials document the server
//! hydrates from:
//!
//! ```bash
//! export NIDV_CREDENTIALS_FILE=/var/lib/nidv/credentials.json
//! export NIDV_AUDIT_KEY=$(nidv keygen)
//! nidv issue --owner "Billing Service"
//! nidv list
//! ```

pub mod credential;
pub mod keygen;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use nidv_api::credentials::{CredentialStore, JsonFileCredentialRepository};
use nidv_crypto::AuditCipher;

/// Options shared by every credential subcommand.
#[derive(Args, Clone)]
pub struct StoreOptions {
    /// Path to the JSON credentials document.
    #[arg(
        long,
        global = true,
        env = "NIDV_CREDENTIALS_FILE",
        default_value = "credentials.json"
    )]
    pub credentials_file: PathBuf,

    /// Base64 AES-256 key used to encrypt secrets for audit display.
    #[arg(long, global = true, env = "NIDV_AUDIT_KEY", hide_env_values = true)]
    pub audit_key: Option<String>,
}

impl std::fmt::Debug for StoreOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreOptions")
            .field("credentials_file", &self.credentials_file)
            .field("audit_key", &self.audit_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl StoreOptions {
    /// Open the credential store described by these options.
    pub fn open(&self) -> Result<CredentialStore> {
        let cipher = match &self.audit_key {
            Some(key) => AuditCipher::from_base64(key).context("invalid audit key")?,
            None => AuditCipher::disabled(),
        };
        let repo = JsonFileCredentialRepository::open(&self.credentials_file).with_context(|| {
            format!(
                "failed to open credentials file: {}",
                self.credentials_file.display()
            )
        })?;
        tracing::debug!(path = %self.credentials_file.display(), "credentials file opened");
        Ok(CredentialStore::new(Arc::new(repo), cipher))
    }
}
