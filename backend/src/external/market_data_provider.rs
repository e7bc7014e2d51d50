use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{Fundamentals, PriceSeries};

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("ticker not found: {0}")]
    NotFound(String),

    #[error("rate limited")]
    RateLimited,

    #[error("timed out after {0}s")]
    Timeout(u64),
}

/// Source of daily price history and static fundamentals.
///
/// Errors are per ticker; callers treat them as "ticker unavailable" rather
/// than failing a whole batch.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily closes for `ticker` between `start` and `end`, both inclusive.
    async fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, MarketDataError>;

    async fn fetch_fundamentals(&self, ticker: &str) -> Result<Fundamentals, MarketDataError>;

    fn name(&self) -> &'static str;
}
