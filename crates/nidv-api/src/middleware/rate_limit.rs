//! # Per-Credential Rate Limiting
//!
//! Fixed-window request quota keyed by a credential's lookup hash.
//!
//! A key's window opens on its first request and lasts `window_secs`. The
//! counter store increments and compares inside one critical section, so
//! concurrent requests for the same credential can never both take the last
//! slot. Unauthenticated requests never reach the limiter.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::credentials::Credential;
use crate::middleware::metrics::ApiMetrics;

const MAX_WINDOW_SECS: u64 = 366 * 86_400;

/// Rate limiter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u64,
    /// Window duration in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 60,
        }
    }
}

impl RateLimitConfig {
    /// Window length, clamped to one year.
    pub fn window(&self) -> Duration {
        Duration::seconds(self.window_secs.min(MAX_WINDOW_SECS) as i64)
    }
}

/// Parse `"N/unit"`, e.g. `100/minute`. Units are matched on their first
/// letter, so `s`, `sec`, `second` all mean one second.
impl FromStr for RateLimitConfig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (count, unit) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| format!("rate limit must look like N/unit, got {s:?}"))?;
        let max_requests: u64 = count
            .trim()
            .parse()
            .map_err(|_| format!("invalid request count {count:?}"))?;
        if max_requests == 0 {
            return Err("request count must be positive".into());
        }
        let window_secs = match unit.trim().chars().next() {
            Some('s') => 1,
            Some('m') => 60,
            Some('h') => 3_600,
            Some('d') => 86_400,
            _ => return Err(format!("unknown rate limit unit {unit:?}")),
        };
        Ok(Self {
            max_requests,
            window_secs,
        })
    }
}

/// Shared counter storage.
///
/// `increment` must be atomic per key: it returns the count *including* this
/// request for the window containing `now`, opening a new window when the
/// previous one has elapsed.
pub trait CounterStore: Send + Sync {
    fn increment(&self, key: &str, window: Duration, now: DateTime<Utc>) -> u64;

    /// Drop windows that ended before `now`, returning how many were removed.
    fn purge_expired(&self, window: Duration, now: DateTime<Utc>) -> usize;
}

#[derive(Debug, Clone, Copy)]
struct WindowState {
    count: u64,
    window_start: DateTime<Utc>,
}

/// Process-local counter store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCounterStore {
    windows: Arc<Mutex<HashMap<String, WindowState>>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys with an open window.
    pub fn len(&self) -> usize {
        self.windows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CounterStore for InMemoryCounterStore {
    fn increment(&self, key: &str, window: Duration, now: DateTime<Utc>) -> u64 {
        let mut windows = self.windows.lock();
        let state = windows.entry(key.to_string()).or_insert(WindowState {
            count: 0,
            window_start: now,
        });
        if now - state.window_start >= window {
            state.count = 0;
            state.window_start = now;
        }
        state.count = state.count.saturating_add(1);
        state.count
    }

    fn purge_expired(&self, window: Duration, now: DateTime<Utc>) -> usize {
        let mut windows = self.windows.lock();
        let before = windows.len();
        windows.retain(|_, w| now - w.window_start < window);
        before - windows.len()
    }
}

/// Quota gate consulted once per authenticated request.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    store: Arc<dyn CounterStore>,
    metrics: ApiMetrics,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Limiter over a fresh in-memory counter store.
    pub fn new(config: RateLimitConfig, metrics: ApiMetrics) -> Self {
        Self::with_store(config, Arc::new(InMemoryCounterStore::new()), metrics)
    }

    pub fn with_store(
        config: RateLimitConfig,
        store: Arc<dyn CounterStore>,
        metrics: ApiMetrics,
    ) -> Self {
        Self {
            config,
            store,
            metrics,
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Count this request against the credential's quota.
    pub fn allow(&self, credential: &Credential) -> bool {
        self.allow_at(credential, Utc::now())
    }

    pub fn allow_at(&self, credential: &Credential, now: DateTime<Utc>) -> bool {
        let count = self.store.increment(
            credential.lookup_hash.as_str(),
            self.config.window(),
            now,
        );
        if count > self.config.max_requests {
            self.metrics.record_rate_limited();
            tracing::warn!(
                credential_id = %credential.id,
                count,
                limit = self.config.max_requests,
                "rate limit exceeded"
            );
            return false;
        }
        true
    }

    /// Forget counters whose window has elapsed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        self.store.purge_expired(self.config.window(), now)
    }
}

/// Sweep elapsed windows once per window length so idle keys do not
/// accumulate. The first sweep runs immediately.
pub fn spawn_sweeper(limiter: RateLimiter) -> JoinHandle<()> {
    let period = limiter
        .config()
        .window()
        .to_std()
        .unwrap_or(std::time::Duration::from_secs(60));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let purged = limiter.purge_expired(Utc::now());
            if purged > 0 {
                tracing::debug!(purged, "expired rate-limit windows purged");
            }
        }
    })
}
