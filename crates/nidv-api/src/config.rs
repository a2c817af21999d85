//! # Process Configuration
//!
//! Read once at startup from environment variables:
//!
//! | Variable                | Default       | Meaning                                   |
//! |-------------------------|---------------|-------------------------------------------|
//! | `PORT`                  | `8080`        | Listen port                               |
//! | `NIDV_AUDIT_KEY`        | unset         | Base64 AES-256 key for audit display      |
//! | `NIDV_RATE_LIMIT`       | `100/minute`  | Per-credential quota                      |
//! | `NIDV_CREDENTIALS_FILE` | unset         | JSON credential document                  |
//! | `NIDV_AUDIT_LOG`        | unset         | JSON Lines audit file                     |
//! | `LOG_FORMAT`            | `text`        | `text` or `json`                          |
//!
//! Unset optional paths fall back to in-memory stores. Invalid values fail
//! startup.

use std::path::PathBuf;
use std::str::FromStr;

use nidv_crypto::{AuditCipher, CryptoError};
use thiserror::Error;

use crate::middleware::rate_limit::RateLimitConfig;

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid PORT {0:?}")]
    InvalidPort(String),

    #[error("invalid NIDV_AUDIT_KEY: {0}")]
    InvalidAuditKey(#[source] CryptoError),

    #[error("invalid NIDV_RATE_LIMIT: {0}")]
    InvalidRateLimit(String),

    #[error("invalid LOG_FORMAT {0:?} (expected \"text\" or \"json\")")]
    InvalidLogFormat(String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidLogFormat(s.to_string())),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub audit_cipher: AuditCipher,
    pub rate_limit: RateLimitConfig,
    pub credentials_file: Option<PathBuf>,
    pub audit_log: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            audit_cipher: AuditCipher::disabled(),
            rate_limit: RateLimitConfig::default(),
            credentials_file: None,
            audit_log: None,
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => 8080,
        };

        let audit_cipher = match var("NIDV_AUDIT_KEY") {
            Some(raw) => AuditCipher::from_base64(&raw).map_err(ConfigError::InvalidAuditKey)?,
            None => AuditCipher::disabled(),
        };

        let rate_limit = match var("NIDV_RATE_LIMIT") {
            Some(raw) => raw.parse().map_err(ConfigError::InvalidRateLimit)?,
            None => RateLimitConfig::default(),
        };

        let log_format = match var("LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => LogFormat::Text,
        };

        Ok(Self {
            port,
            audit_cipher,
            rate_limit,
            credentials_file: var("NIDV_CREDENTIALS_FILE").map(PathBuf::from),
            audit_log: var("NIDV_AUDIT_LOG").map(PathBuf::from),
            log_format,
        })
    }
}
