//! # Bootstrap
//!
//! Builds [`AppState`] from [`AppConfig`]: opens the credential document
//! and the audit log when configured, otherwise falls back to in-memory
//! stores with a warning.

use std::sync::Arc;

use thiserror::Error;

use crate::audit::{AuditError, AuditSink, InMemoryAuditSink, JsonlAuditSink};
use crate::config::AppConfig;
use crate::credentials::{
    CredentialRepository, CredentialStore, InMemoryCredentialRepository,
    JsonFileCredentialRepository, StoreError,
};
use crate::state::AppState;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("failed to open credential store: {0}")]
    Credentials(#[from] StoreError),

    #[error("failed to open audit log: {0}")]
    Audit(#[from] AuditError),
}

pub fn bootstrap(config: &AppConfig) -> Result<AppState, BootstrapError> {
    let repo: Arc<dyn CredentialRepository> = match &config.credentials_file {
        Some(path) => {
            let repo = JsonFileCredentialRepository::open(path)?;
            let count = repo.list()?.len();
            tracing::info!(path = %path.display(), count, "credential store hydrated");
            Arc::new(repo)
        }
        None => {
            tracing::warn!("NIDV_CREDENTIALS_FILE not set; using an empty in-memory credential store");
            Arc::new(InMemoryCredentialRepository::new())
        }
    };

    let audit: Arc<dyn AuditSink> = match &config.audit_log {
        Some(path) => {
            tracing::info!(path = %path.display(), "audit log opened");
            Arc::new(JsonlAuditSink::open(path)?)
        }
        None => {
            tracing::warn!("NIDV_AUDIT_LOG not set; audit records are kept in memory only");
            Arc::new(InMemoryAuditSink::new())
        }
    };

    if !config.audit_cipher.is_enabled() {
        tracing::warn!("NIDV_AUDIT_KEY not set; new credentials will not be displayable");
    }

    let credentials = CredentialStore::new(repo, config.audit_cipher.clone());
    Ok(AppState::new(credentials, audit, config.rate_limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_defaults() {
        let state = bootstrap(&AppConfig::default()).unwrap();
        assert!(state.credentials.list().unwrap().is_empty());
    }

    #[test]
    fn hydrates_from_credentials_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        {
            let repo = Arc::new(JsonFileCredentialRepository::open(&path).unwrap());
            let store = CredentialStore::new(repo, nidv_crypto::AuditCipher::disabled());
            store.issue("first", None).unwrap();
            store.issue("second", None).unwrap();
        }
        let config = AppConfig {
            credentials_file: Some(path),
            audit_log: Some(dir.path().join("audit.jsonl")),
            ..AppConfig::default()
        };
        let state = bootstrap(&config).unwrap();
        assert_eq!(state.credentials.list().unwrap().len(), 2);
        assert!(dir.path().join("audit.jsonl").exists());
    }

    #[test]
    fn corrupt_credentials_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "{ not json").unwrap();
        let config = AppConfig {
            credentials_file: Some(path),
            ..AppConfig::default()
        };
        assert!(matches!(bootstrap(&config), Err(BootstrapError::Credentials(_))));
    }
}
