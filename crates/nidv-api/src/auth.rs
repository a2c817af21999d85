//! # API Key Authentication
//!
//! Resolves the `X-API-KEY` request header to a live [`Credential`].
//!
//! The outcome is a tagged [`AuthOutcome`] rather than an error path, so the
//! request pipeline dispatches on it with a single `match`. Callers see the
//! same 401 body for a missing key and a wrong key; the distinction is kept
//! for logs only.

use axum::http::HeaderMap;
use nidv_crypto::{SecretToken, MAX_SECRET_LENGTH};
use thiserror::Error;

use crate::credentials::{Credential, CredentialStore};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Why a request failed to authenticate.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("API key header missing or empty")]
    MissingCredential,

    #[error("API key not recognised")]
    InvalidCredential,

    #[error("credential store unavailable")]
    ServiceUnavailable,
}

/// Result of authenticating one request.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    Authenticated(Credential),
    Unauthenticated(AuthError),
}

/// Extract the presented API key.
///
/// Returns `None` unless the header appears exactly once with a non-empty,
/// UTF-8 value.
pub fn presented_key(headers: &HeaderMap) -> Option<&str> {
    let mut values = headers.get_all(API_KEY_HEADER).iter();
    let first = values.next()?;
    if values.next().is_some() {
        return None;
    }
    first.to_str().ok().filter(|v| !v.is_empty())
}

/// Token-to-credential resolver.
#[derive(Debug, Clone)]
pub struct Authenticator {
    store: CredentialStore,
}

impl Authenticator {
    pub fn new(store: CredentialStore) -> Self {
        Self { store }
    }

    /// Authenticate a presented token (`None` when no usable header was sent).
    pub fn authenticate(&self, token: Option<&str>) -> AuthOutcome {
        let Some(raw) = token.filter(|t| !t.is_empty()) else {
            tracing::debug!(reason = "missing", "authentication failed");
            return AuthOutcome::Unauthenticated(AuthError::MissingCredential);
        };

        if raw.len() > MAX_SECRET_LENGTH {
            tracing::debug!(reason = "oversized", "authentication failed");
            return AuthOutcome::Unauthenticated(AuthError::InvalidCredential);
        }
        let Ok(secret) = SecretToken::new(raw) else {
            tracing::debug!(reason = "malformed", "authentication failed");
            return AuthOutcome::Unauthenticated(AuthError::InvalidCredential);
        };

        match self.store.authenticate(&secret) {
            Ok(Some(credential)) => {
                tracing::debug!(credential_id = %credential.id, "authenticated");
                AuthOutcome::Authenticated(credential)
            }
            Ok(None) => {
                tracing::debug!(reason = "unknown_or_inactive", "authentication failed");
                AuthOutcome::Unauthenticated(AuthError::InvalidCredential)
            }
            Err(err) => {
                tracing::error!(error = %err, "credential lookup failed");
                AuthOutcome::Unauthenticated(AuthError::ServiceUnavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::HeaderValue;
    use nidv_crypto::{AuditCipher, KeyHash};
    use uuid::Uuid;

    use super::*;
    use crate::credentials::{CredentialRepository, StoreError};

    fn authenticator() -> (Authenticator, CredentialStore) {
        let store = CredentialStore::in_memory(AuditCipher::disabled());
        (Authenticator::new(store.clone()), store)
    }

    #[test]
    fn presented_key_requires_exactly_one_value() {
        let mut headers = HeaderMap::new();
        assert_eq!(presented_key(&headers), None);

        headers.insert(API_KEY_HEADER, HeaderValue::from_static(""));
        assert_eq!(presented_key(&headers), None);

        headers.insert(API_KEY_HEADER, HeaderValue::from_static("abc"));
        assert_eq!(presented_key(&headers), Some("abc"));

        headers.append(API_KEY_HEADER, HeaderValue::from_static("def"));
        assert_eq!(presented_key(&headers), None);
    }

    #[test]
    fn header_name_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("X-API-KEY", HeaderValue::from_static("abc"));
        assert_eq!(presented_key(&headers), Some("abc"));
    }

    #[test]
    fn valid_token_authenticates() {
        let (auth, store) = authenticator();
        let issued = store.issue("owner", None).unwrap();
        match auth.authenticate(Some(issued.secret.as_str())) {
            AuthOutcome::Authenticated(c) => assert_eq!(c.id, issued.credential.id),
            other => panic!("expected authenticated, got {other:?}"),
        }
    }

    #[test]
    fn missing_token() {
        let (auth, _) = authenticator();
        assert!(matches!(
            auth.authenticate(None),
            AuthOutcome::Unauthenticated(AuthError::MissingCredential)
        ));
        assert!(matches!(
            auth.authenticate(Some("")),
            AuthOutcome::Unauthenticated(AuthError::MissingCredential)
        ));
    }

    #[test]
    fn oversized_and_malformed_tokens_are_invalid() {
        let (auth, _) = authenticator();
        let long = "k".repeat(MAX_SECRET_LENGTH + 1);
        assert!(matches!(
            auth.authenticate(Some(&long)),
            AuthOutcome::Unauthenticated(AuthError::InvalidCredential)
        ));
        assert!(matches!(
            auth.authenticate(Some("has space")),
            AuthOutcome::Unauthenticated(AuthError::InvalidCredential)
        ));
    }

    #[test]
    fn inactive_matches_unknown() {
        let (auth, store) = authenticator();
        let issued = store.issue("owner", None).unwrap();
        store.set_active(issued.credential.id, false).unwrap();
        let inactive = auth.authenticate(Some(issued.secret.as_str()));
        let unknown = auth.authenticate(Some("never-issued-key"));
        assert!(matches!(inactive, AuthOutcome::Unauthenticated(AuthError::InvalidCredential)));
        assert!(matches!(unknown, AuthOutcome::Unauthenticated(AuthError::InvalidCredential)));
    }

    struct BrokenRepository;

    impl CredentialRepository for BrokenRepository {
        fn find_by_hash(&self, _: &KeyHash) -> Result<Option<Credential>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        fn get(&self, _: Uuid) -> Result<Option<Credential>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        fn insert(&self, _: Credential) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        fn set_active(&self, id: Uuid, _: bool) -> Result<Credential, StoreError> {
            Err(StoreError::NotFound(id))
        }
        fn list(&self) -> Result<Vec<Credential>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn repository_fault_is_service_unavailable() {
        let store = CredentialStore::new(Arc::new(BrokenRepository), AuditCipher::disabled());
        let auth = Authenticator::new(store);
        assert!(matches!(
            auth.authenticate(Some("some-key")),
            AuthOutcome::Unauthenticated(AuthError::ServiceUnavailable)
        ));
    }
}
