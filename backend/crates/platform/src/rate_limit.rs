//! Rate Limiting Infrastructure
//!
//! Fixed-window counters keyed by client identity.
//!
//! On each check the counter for `key` starts a new window when none exists
//! or the stored window has elapsed, then increments. A request is denied
//! once the count exceeds `max_requests`. Fixed windows admit up to twice
//! the budget in a burst straddling a boundary; good enough for abuse
//! deterrence, not for quota billing.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;
use tokio::sync::Mutex;

/// Rate limit policy
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Policy name, used to namespace keys and in logs
    pub name: &'static str,
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::general()
    }
}

impl RateLimitConfig {
    pub fn new(name: &'static str, max_requests: u32, window: Duration) -> Self {
        Self {
            name,
            max_requests,
            window,
        }
    }

    /// Credential endpoints: 5 requests per 15 minutes
    pub fn auth() -> Self {
        Self::new("auth", 5, Duration::from_secs(15 * 60))
    }

    /// Everything else: 100 requests per 15 minutes
    pub fn general() -> Self {
        Self::new("general", 100, Duration::from_secs(15 * 60))
    }

    /// Sensitive but non-credential endpoints: 10 requests per 15 minutes
    pub fn strict() -> Self {
        Self::new("strict", 10, Duration::from_secs(15 * 60))
    }

    pub fn window_ms(&self) -> i64 {
        i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX)
    }

    fn window_delta(&self) -> TimeDelta {
        TimeDelta::try_milliseconds(self.window_ms()).unwrap_or(TimeDelta::MAX)
    }

    /// Counter key for a client under this policy
    pub fn key_for(&self, client: &str) -> String {
        format!("{}:{}", self.name, client)
    }
}

/// Outcome of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allow,
    Deny { retry_after_secs: u64 },
}

/// Check result, exposed on allow and deny alike so the boundary can emit
/// `X-RateLimit-*` headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub decision: RateLimitDecision,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self.decision, RateLimitDecision::Allow)
    }

    pub fn retry_after_secs(&self) -> Option<u64> {
        match self.decision {
            RateLimitDecision::Allow => None,
            RateLimitDecision::Deny { retry_after_secs } => Some(retry_after_secs),
        }
    }
}

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("Rate limit backend failure: {0}")]
    Backend(String),
}

/// Trait for rate limit storage backends
#[trait_variant::make(RateLimitStore: Send)]
pub trait LocalRateLimitStore {
    /// Count one request against `key` and report the outcome
    async fn check(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, RateLimitError>;

    /// Drop counters whose window has closed. Returns how many were dropped.
    async fn purge_expired(&self) -> Result<usize, RateLimitError>;
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Counter {
    count: u32,
    reset_at: DateTime<Utc>,
}

impl Counter {
    fn fresh(now: DateTime<Utc>, config: &RateLimitConfig) -> Self {
        Self {
            count: 0,
            reset_at: now
                .checked_add_signed(config.window_delta())
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    fn is_elapsed(&self, now: DateTime<Utc>) -> bool {
        now >= self.reset_at
    }
}

/// Process-local store: one mutex over the whole counter map.
#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    counters: Mutex<HashMap<String, Counter>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// [`LocalRateLimitStore::check`] against an explicit clock
    pub async fn check_at(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now: DateTime<Utc>,
    ) -> RateLimitResult {
        let mut counters = self.counters.lock().await;

        let counter = counters
            .entry(key.to_string())
            .and_modify(|c| {
                if c.is_elapsed(now) {
                    *c = Counter::fresh(now, config);
                }
            })
            .or_insert_with(|| Counter::fresh(now, config));

        counter.count = counter.count.saturating_add(1);

        let decision = if counter.count > config.max_requests {
            let remaining_ms = (counter.reset_at - now).num_milliseconds().max(0);
            // ceil to whole seconds
            let retry_after_secs = u64::try_from((remaining_ms + 999) / 1000).unwrap_or(0);
            RateLimitDecision::Deny { retry_after_secs }
        } else {
            RateLimitDecision::Allow
        };

        RateLimitResult {
            decision,
            limit: config.max_requests,
            remaining: config.max_requests.saturating_sub(counter.count),
            reset_at: counter.reset_at,
        }
    }

    /// [`LocalRateLimitStore::purge_expired`] against an explicit clock
    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut counters = self.counters.lock().await;
        let before = counters.len();
        counters.retain(|_, c| !c.is_elapsed(now));
        before - counters.len()
    }

    pub async fn len(&self) -> usize {
        self.counters.lock().await.len()
    }
}

impl RateLimitStore for MemoryRateLimitStore {
    async fn check(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, RateLimitError> {
        let result = self.check_at(key, config, Utc::now()).await;
        if !result.is_allowed() {
            tracing::warn!(
                key = %key,
                limit = result.limit,
                "Rate limit exceeded"
            );
        }
        Ok(result)
    }

    async fn purge_expired(&self) -> Result<usize, RateLimitError> {
        Ok(self.purge_expired_at(Utc::now()).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_requests: u32, window_ms: u64) -> RateLimitConfig {
        RateLimitConfig::new("test", max_requests, Duration::from_millis(window_ms))
    }

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_000 + ms).unwrap()
    }

    #[tokio::test]
    async fn test_window_allows_budget_then_denies() {
        let store = MemoryRateLimitStore::new();
        let cfg = config(3, 1000);

        for (i, remaining) in [2, 1, 0].into_iter().enumerate() {
            let r = store.check_at("k", &cfg, at(i as i64 * 100)).await;
            assert!(r.is_allowed());
            assert_eq!(r.remaining, remaining);
            assert_eq!(r.limit, 3);
        }

        let denied = store.check_at("k", &cfg, at(300)).await;
        assert!(!denied.is_allowed());
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.retry_after_secs(), Some(1));
    }

    #[tokio::test]
    async fn test_new_window_after_elapsed() {
        let store = MemoryRateLimitStore::new();
        let cfg = config(3, 1000);

        for i in 0..4 {
            store.check_at("k", &cfg, at(i)).await;
        }

        let fresh = store.check_at("k", &cfg, at(1000)).await;
        assert!(fresh.is_allowed());
        assert_eq!(fresh.remaining, 2);
        assert_eq!(fresh.reset_at, at(2000));
    }

    #[tokio::test]
    async fn test_retry_after_rounds_up() {
        let store = MemoryRateLimitStore::new();
        let cfg = config(1, 60_000);

        store.check_at("k", &cfg, at(0)).await;
        let denied = store.check_at("k", &cfg, at(500)).await;
        // 59.5 s left
        assert_eq!(denied.retry_after_secs(), Some(60));
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let store = MemoryRateLimitStore::new();
        let cfg = config(1, 1000);

        assert!(store.check_at("a", &cfg, at(0)).await.is_allowed());
        assert!(!store.check_at("a", &cfg, at(1)).await.is_allowed());
        assert!(store.check_at("b", &cfg, at(2)).await.is_allowed());
    }

    #[tokio::test]
    async fn test_purge_drops_only_closed_windows() {
        let store = MemoryRateLimitStore::new();
        let short = config(5, 1000);
        let long = config(5, 10_000);

        store.check_at("short", &short, at(0)).await;
        store.check_at("long", &long, at(0)).await;

        assert_eq!(store.purge_expired_at(at(999)).await, 0);
        assert_eq!(store.purge_expired_at(at(1000)).await, 1);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.purge_expired_at(at(1000)).await, 0);
    }

    #[tokio::test]
    async fn test_trait_check_uses_wall_clock() {
        let store = MemoryRateLimitStore::new();
        let cfg = RateLimitConfig::auth();
        let key = cfg.key_for("127.0.0.1");
        assert_eq!(key, "auth:127.0.0.1");

        let r = RateLimitStore::check(&store, &key, &cfg).await.unwrap();
        assert!(r.is_allowed());
        assert_eq!(r.remaining, 4);
        assert!(r.reset_at > Utc::now());
    }

    #[test]
    fn test_presets() {
        assert_eq!(RateLimitConfig::auth().max_requests, 5);
        assert_eq!(RateLimitConfig::general().max_requests, 100);
        assert_eq!(RateLimitConfig::strict().max_requests, 10);
        assert_eq!(RateLimitConfig::strict().window_ms(), 900_000);
    }
}
