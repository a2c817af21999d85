//! # Validation Audit Log
//!
//! Every request that passes authentication and the rate gate produces one
//! [`ValidationAttempt`]. Records are append-only: sinks expose no update or
//! delete path.
//!
//! Records identify the caller only by the masked `****XXXX` preview. The
//! secret and its lookup hash never reach the audit trail.
//!
//! Audit writes are best-effort from the caller's point of view:
//! [`AuditLogger::record_best_effort`] logs and counts a failure but never
//! changes the response.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use nidv_core::{DecodedIdentity, Timestamp, ValidationError};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::credentials::Credential;
use crate::middleware::metrics::ApiMetrics;

/// Identifier of a written audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogHandle(pub Uuid);

impl std::fmt::Display for LogHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One audited validation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationAttempt {
    pub id: LogHandle,
    pub timestamp: Timestamp,
    /// The raw submitted string, exactly as received.
    pub input_id: String,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted: Option<DecodedIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub credential_preview: String,
}

impl ValidationAttempt {
    fn new(
        input_id: &str,
        result: &Result<DecodedIdentity, ValidationError>,
        credential: &Credential,
    ) -> Self {
        let (extracted, error) = match result {
            Ok(identity) => (Some(identity.clone()), None),
            Err(err) => (None, Some(err.to_string())),
        };
        Self {
            id: LogHandle(Uuid::new_v4()),
            timestamp: Timestamp::now(),
            input_id: input_id.to_string(),
            valid: result.is_ok(),
            extracted,
            error,
            credential_preview: credential.masked_preview(),
        }
    }
}

/// Audit write failure.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("audit I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Append-only destination for audit records.
pub trait AuditSink: Send + Sync {
    fn append(&self, attempt: &ValidationAttempt) -> Result<(), AuditError>;
}

/// Process-local sink, used when no audit file is configured and in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditSink {
    records: Arc<RwLock<Vec<ValidationAttempt>>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records in write order.
    pub fn records(&self) -> Vec<ValidationAttempt> {
        self.records.read().clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for InMemoryAuditSink {
    fn append(&self, attempt: &ValidationAttempt) -> Result<(), AuditError> {
        self.records.write().push(attempt.clone());
        Ok(())
    }
}

/// JSON Lines file sink. One record per line, opened in append mode.
#[derive(Debug)]
pub struct JsonlAuditSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlAuditSink {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AuditError> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonlAuditSink {
    fn append(&self, attempt: &ValidationAttempt) -> Result<(), AuditError> {
        let mut line = serde_json::to_vec(attempt)?;
        line.push(b'\n');
        let mut file = self.file.lock();
        file.write_all(&line)?;
        file.flush()?;
        Ok(())
    }
}

/// Read every record from a JSON Lines audit file.
pub fn read_jsonl(path: &Path) -> Result<Vec<ValidationAttempt>, AuditError> {
    let contents = std::fs::read_to_string(path)?;
    contents
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).map_err(AuditError::from))
        .collect()
}

/// Builds and writes [`ValidationAttempt`] records.
#[derive(Clone)]
pub struct AuditLogger {
    sink: Arc<dyn AuditSink>,
    metrics: ApiMetrics,
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger").finish_non_exhaustive()
    }
}

impl AuditLogger {
    pub fn new(sink: Arc<dyn AuditSink>, metrics: ApiMetrics) -> Self {
        Self { sink, metrics }
    }

    /// Write one attempt record.
    pub fn record(
        &self,
        input_id: &str,
        result: &Result<DecodedIdentity, ValidationError>,
        credential: &Credential,
    ) -> Result<LogHandle, AuditError> {
        let attempt = ValidationAttempt::new(input_id, result, credential);
        self.sink.append(&attempt)?;
        Ok(attempt.id)
    }

    /// Write one attempt record, absorbing any failure.
    pub fn record_best_effort(
        &self,
        input_id: &str,
        result: &Result<DecodedIdentity, ValidationError>,
        credential: &Credential,
    ) -> Option<LogHandle> {
        match self.record(input_id, result, credential) {
            Ok(handle) => Some(handle),
            Err(err) => {
                self.metrics.record_audit_failure();
                tracing::error!(
                    error = %err,
                    credential_id = %credential.id,
                    "failed to write audit record"
                );
                None
            }
        }
    }
}
