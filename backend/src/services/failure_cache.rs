use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::external::market_data_provider::MarketDataError;

/// Which provider call failed; history and fundamentals are tracked apart
/// because a ticker may have prices but no company profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    History,
    Fundamentals,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailureType {
    NotFound,       // Ticker doesn't exist at the provider
    RateLimited,    // Temporary throttle
    Timeout,        // Provider too slow for this request
    ApiError,       // Everything else
}

impl FailureType {
    fn ttl(self) -> Duration {
        match self {
            FailureType::NotFound => Duration::hours(24),
            FailureType::RateLimited => Duration::minutes(5),
            FailureType::Timeout => Duration::minutes(2),
            FailureType::ApiError => Duration::minutes(30),
        }
    }
}

impl From<&MarketDataError> for FailureType {
    fn from(error: &MarketDataError) -> Self {
        match error {
            MarketDataError::NotFound(_) => FailureType::NotFound,
            MarketDataError::RateLimited => FailureType::RateLimited,
            MarketDataError::Timeout(_) => FailureType::Timeout,
            _ => FailureType::ApiError,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FailureInfo {
    pub failed_at: DateTime<Utc>,
    pub failure_type: FailureType,
    pub message: String,
}

impl FailureInfo {
    pub fn retry_after(&self) -> DateTime<Utc> {
        self.failed_at + self.failure_type.ttl()
    }
}

/// Thread-safe record of recent provider failures.
///
/// A ticker listed here is skipped (and treated as excluded) until its
/// retry time passes, so one bad symbol does not cost a timeout on every
/// request.
#[derive(Clone, Default)]
pub struct FailureCache {
    cache: Arc<DashMap<(FetchKind, String), FailureInfo>>,
}

impl FailureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active failure for `ticker`, if any. Expired entries are evicted.
    pub fn active_failure(&self, kind: FetchKind, ticker: &str, now: DateTime<Utc>) -> Option<FailureInfo> {
        let key = (kind, ticker.to_string());
        let info = self.cache.get(&key).map(|entry| entry.value().clone())?;

        if now < info.retry_after() {
            Some(info)
        } else {
            self.cache.remove(&key);
            None
        }
    }

    pub fn record_failure(&self, kind: FetchKind, ticker: &str, error: &MarketDataError, now: DateTime<Utc>) {
        let info = FailureInfo {
            failed_at: now,
            failure_type: FailureType::from(error),
            message: error.to_string(),
        };
        self.cache.insert((kind, ticker.to_string()), info);
    }

    pub fn clear(&self, kind: FetchKind, ticker: &str) {
        self.cache.remove(&(kind, ticker.to_string()));
    }

    pub fn cleanup_expired(&self, now: DateTime<Utc>) {
        self.cache.retain(|_, info| now < info.retry_after());
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
