//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types shared across the validator. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - [`ValidationError`] messages are user-facing and returned verbatim in
//!   API responses, so their wording is part of the external contract.
//! - [`NidvError`] covers everything that is not an identity-number
//!   validation failure and is never shown to API callers.

use thiserror::Error;

/// A specific reason a national identity number failed validation.
///
/// Variants are listed in the order the decoder evaluates them.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationError {
    /// Input is not exactly 14 characters long.
    #[error("National ID must be exactly 14 digits")]
    InvalidLength,

    /// Input contains a character that is not an ASCII digit.
    #[error("National ID must contain only digits")]
    InvalidFormat,

    /// Leading century digit is neither `2` nor `3`.
    #[error("Invalid century digit (must be 2 or 3)")]
    InvalidCentury,

    /// Month/day fields do not form a real calendar date.
    #[error("Invalid birth date format or values")]
    InvalidDateFormat,

    /// Birth date lies after the reference date.
    #[error("Birth date cannot be in the future")]
    FutureDate,

    /// Governorate code is not in the code table.
    #[error("Invalid governorate code")]
    InvalidGovernorate,
}

impl ValidationError {
    /// Machine-readable code for logs and metrics labels.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidLength => "invalid_length",
            Self::InvalidFormat => "invalid_format",
            Self::InvalidCentury => "invalid_century",
            Self::InvalidDateFormat => "invalid_date_format",
            Self::FutureDate => "future_date",
            Self::InvalidGovernorate => "invalid_governorate",
        }
    }
}

/// Top-level error type for non-validation failures in core types.
#[derive(Error, Debug)]
pub enum NidvError {
    /// A timestamp could not be parsed or was not UTC.
    #[error("invalid timestamp: {0}")]
    Timestamp(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_external_contract() {
        assert_eq!(
            ValidationError::InvalidLength.to_string(),
            "National ID must be exactly 14 digits"
        );
        assert_eq!(
            ValidationError::InvalidCentury.to_string(),
            "Invalid century digit (must be 2 or 3)"
        );
        assert_eq!(
            ValidationError::FutureDate.to_string(),
            "Birth date cannot be in the future"
        );
    }

    #[test]
    fn codes_are_distinct() {
        let all = [
            ValidationError::InvalidLength,
            ValidationError::InvalidFormat,
            ValidationError::InvalidCentury,
            ValidationError::InvalidDateFormat,
            ValidationError::FutureDate,
            ValidationError::InvalidGovernorate,
        ];
        let codes: std::collections::HashSet<_> = all.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), all.len());
    }
}
