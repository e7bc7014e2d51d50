use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::external::market_data_provider::{MarketDataError, MarketDataProvider};
use crate::models::{Fundamentals, PriceSeries};
use crate::services::failure_cache::{FailureCache, FetchKind};
use crate::services::rate_limiter::RateLimiter;

/// Result of a batch fetch: what arrived, and which tickers were dropped.
#[derive(Debug, Clone)]
pub struct FetchOutcome<T> {
    pub found: HashMap<String, T>,
    pub failed: Vec<String>,
}

impl<T> Default for FetchOutcome<T> {
    fn default() -> Self {
        Self {
            found: HashMap::new(),
            failed: Vec::new(),
        }
    }
}

/// Fans provider calls out with bounded concurrency.
///
/// Every per-ticker problem (error, timeout, cached failure, empty series)
/// turns into an entry in `failed`; a batch never fails as a whole.
/// Dropping the returned future cancels all in-flight calls.
pub struct HistoricalDataService {
    provider: Arc<dyn MarketDataProvider>,
    limiter: Arc<RateLimiter>,
    failure_cache: FailureCache,
    clock: Arc<dyn Clock>,
    max_in_flight: usize,
    fetch_timeout: Duration,
}

impl HistoricalDataService {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        limiter: Arc<RateLimiter>,
        failure_cache: FailureCache,
        clock: Arc<dyn Clock>,
        max_in_flight: usize,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            limiter,
            failure_cache,
            clock,
            max_in_flight: max_in_flight.max(1),
            fetch_timeout,
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Daily closes for each ticker over `[start, end]`.
    pub async fn fetch_histories(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> FetchOutcome<PriceSeries> {
        let provider = self.provider.clone();
        let outcome = self
            .fan_out(FetchKind::History, tickers, move |ticker| {
                let provider = provider.clone();
                async move { provider.fetch_history(&ticker, start, end).await }
            })
            .await;

        // An empty series is as useless as an error
        let (found, empty): (HashMap<_, _>, HashMap<_, _>) =
            outcome.found.into_iter().partition(|(_, s)| !s.is_empty());
        let mut failed = outcome.failed;
        for ticker in empty.into_keys() {
            warn!("No price history for {} between {} and {}", ticker, start, end);
            failed.push(ticker);
        }

        info!(
            "📈 Fetched history for {}/{} tickers ({} to {})",
            found.len(),
            tickers.len(),
            start,
            end
        );
        FetchOutcome { found, failed }
    }

    pub async fn fetch_fundamentals(&self, tickers: &[String]) -> FetchOutcome<Fundamentals> {
        let provider = self.provider.clone();
        let outcome = self
            .fan_out(FetchKind::Fundamentals, tickers, move |ticker| {
                let provider = provider.clone();
                async move { provider.fetch_fundamentals(&ticker).await }
            })
            .await;

        info!("🏢 Fetched fundamentals for {}/{} tickers", outcome.found.len(), tickers.len());
        outcome
    }

    async fn fan_out<T, F, Fut>(&self, kind: FetchKind, tickers: &[String], fetch: F) -> FetchOutcome<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, MarketDataError>>,
    {
        let now = self.clock.now();
        let mut outcome = FetchOutcome::default();
        let mut pending = Vec::with_capacity(tickers.len());

        for ticker in tickers {
            if let Some(failure) = self.failure_cache.active_failure(kind, ticker, now) {
                info!(
                    "⚠️ Skipping {} ({:?}) - recent failure: {}. Will retry after {}",
                    ticker,
                    kind,
                    failure.message,
                    failure.retry_after()
                );
                outcome.failed.push(ticker.clone());
            } else {
                pending.push(ticker.clone());
            }
        }

        let timeout = self.fetch_timeout;
        let results: Vec<(String, Result<T, MarketDataError>)> = stream::iter(pending)
            .map(|ticker| {
                let call = fetch(ticker.clone());
                async move {
                    // The deadline covers the wait for a limiter slot as well as the call
                    let limited = async {
                        match self.limiter.acquire().await {
                            Ok(_guard) => call.await,
                            Err(e) => Err(MarketDataError::BadResponse(e.to_string())),
                        }
                    };
                    let result = match tokio::time::timeout(timeout, limited).await {
                        Ok(result) => result,
                        Err(_) => Err(MarketDataError::Timeout(timeout.as_secs())),
                    };
                    (ticker, result)
                }
            })
            .buffer_unordered(self.max_in_flight)
            .collect()
            .await;

        let finished_at = self.clock.now();
        for (ticker, result) in results {
            match result {
                Ok(value) => {
                    debug!("✓ {:?} for {} from {}", kind, ticker, self.provider.name());
                    self.failure_cache.clear(kind, &ticker);
                    outcome.found.insert(ticker, value);
                }
                Err(e) => {
                    warn!("✗ {:?} fetch failed for {}: {} - excluding", kind, ticker, e);
                    self.failure_cache.record_failure(kind, &ticker, &e, finished_at);
                    outcome.failed.push(ticker);
                }
            }
        }

        outcome.failed.sort();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::PricePoint;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl MarketDataProvider for CountingProvider {
        async fn fetch_history(
            &self,
            ticker: &str,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<PriceSeries, MarketDataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(current, Ordering::SeqCst);

            let delay = if ticker == "SLOW" { 500 } else { 20 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match ticker {
                "BAD" => Err(MarketDataError::NotFound(ticker.to_string())),
                "EMPTY" => Ok(PriceSeries::from_points(ticker, vec![])),
                _ => Ok(PriceSeries::from_points(ticker, vec![PricePoint::new(start, 50.0)])),
            }
        }

        async fn fetch_fundamentals(&self, ticker: &str) -> Result<Fundamentals, MarketDataError> {
            Ok(Fundamentals::new(ticker))
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn service(provider: Arc<CountingProvider>, max_in_flight: usize) -> HistoricalDataService {
        limited_service(provider, RateLimiter::unlimited_rate(16), max_in_flight)
    }

    fn limited_service(
        provider: Arc<CountingProvider>,
        limiter: RateLimiter,
        max_in_flight: usize,
    ) -> HistoricalDataService {
        HistoricalDataService::new(
            provider,
            Arc::new(limiter),
            FailureCache::new(),
            Arc::new(FixedClock::at_date(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap())),
            max_in_flight,
            Duration::from_millis(200),
        )
    }

    fn provider() -> Arc<CountingProvider> {
        Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    fn tickers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    #[tokio::test]
    async fn test_failures_and_timeouts_are_excluded() {
        let svc = service(provider(), 4);
        let outcome = svc
            .fetch_histories(&tickers(&["AAPL", "BAD", "SLOW", "EMPTY"]), day(), day())
            .await;

        assert_eq!(outcome.found.len(), 1);
        assert!(outcome.found.contains_key("AAPL"));
        assert_eq!(outcome.failed, tickers(&["BAD", "EMPTY", "SLOW"]));
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let p = provider();
        let svc = service(p.clone(), 2);
        let names: Vec<String> = (0..8).map(|i| format!("T{i}")).collect();

        let outcome = svc.fetch_histories(&names, day(), day()).await;

        assert_eq!(outcome.found.len(), 8);
        assert!(p.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_cached_failure_skips_provider() {
        let p = provider();
        let svc = service(p.clone(), 2);

        svc.fetch_histories(&tickers(&["BAD"]), day(), day()).await;
        svc.fetch_histories(&tickers(&["BAD"]), day(), day()).await;

        assert_eq!(p.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_covers_rate_limit_wait() {
        // 60 per minute: the second and third calls would wait 1s and 2s for a slot
        let p = provider();
        let svc = limited_service(p.clone(), RateLimiter::new(4, 60), 4);
        let started = tokio::time::Instant::now();

        let outcome = svc
            .fetch_histories(&tickers(&["A", "B", "C"]), day(), day())
            .await;

        assert_eq!(outcome.found.len(), 1);
        assert_eq!(outcome.failed.len(), 2);
        assert_eq!(p.calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_millis(900));
    }
}
