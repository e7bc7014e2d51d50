#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Weekday};

use rustfolio_analytics::clock::FixedClock;
use rustfolio_analytics::config::{AnalyticsConfig, ProviderKind};
use rustfolio_analytics::external::market_data_provider::{MarketDataError, MarketDataProvider};
use rustfolio_analytics::models::{Fundamentals, PricePoint, PriceSeries};
use rustfolio_analytics::services::failure_cache::FailureCache;
use rustfolio_analytics::services::history_service::HistoricalDataService;
use rustfolio_analytics::services::rate_limiter::RateLimiter;
use rustfolio_analytics::state::AppState;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
}

/// Weekday closes over the last `days` calendar days, driven by `f(i)`.
pub fn weekday_series(days: i64, f: impl Fn(usize) -> f64) -> Vec<PricePoint> {
    let start = today() - chrono::Duration::days(days);
    let mut points = Vec::new();
    let mut date = start;
    let mut i = 0;
    while date <= today() {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            points.push(PricePoint::new(date, f(i)));
            i += 1;
        }
        date = date.succ_opt().unwrap();
    }
    points
}

/// Provider serving fixed series and fundamentals from memory.
#[derive(Default)]
pub struct InMemoryProvider {
    pub history: HashMap<String, Vec<PricePoint>>,
    pub fundamentals: HashMap<String, Fundamentals>,
}

impl InMemoryProvider {
    pub fn with_history(mut self, ticker: &str, points: Vec<PricePoint>) -> Self {
        self.history.insert(ticker.to_string(), points);
        self
    }

    pub fn with_fundamentals(mut self, fundamentals: Fundamentals) -> Self {
        self.fundamentals.insert(fundamentals.ticker.clone(), fundamentals);
        self
    }
}

#[async_trait]
impl MarketDataProvider for InMemoryProvider {
    async fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, MarketDataError> {
        let points = self
            .history
            .get(ticker)
            .ok_or_else(|| MarketDataError::NotFound(ticker.to_string()))?;
        let window = points
            .iter()
            .filter(|p| p.date >= start && p.date <= end)
            .cloned()
            .collect();
        Ok(PriceSeries::from_points(ticker, window))
    }

    async fn fetch_fundamentals(&self, ticker: &str) -> Result<Fundamentals, MarketDataError> {
        self.fundamentals
            .get(ticker)
            .cloned()
            .ok_or_else(|| MarketDataError::NotFound(ticker.to_string()))
    }

    fn name(&self) -> &'static str {
        "in-memory"
    }
}

/// Smooth, gently trending prices with a ticker-specific wiggle.
pub fn market() -> InMemoryProvider {
    let days = 2 * 365;
    InMemoryProvider::default()
        .with_history("AAPL", weekday_series(days, |i| 150.0 * (1.0 + 0.0006 * i as f64) + 4.0 * (i as f64 * 0.7).sin()))
        .with_history("MSFT", weekday_series(days, |i| 300.0 * (1.0 + 0.0004 * i as f64) + 6.0 * (i as f64 * 0.3).cos()))
        .with_history("SPY", weekday_series(days, |i| 400.0 * (1.0 + 0.0003 * i as f64) + 5.0 * (i as f64 * 0.5).sin()))
        .with_fundamentals(Fundamentals {
            country: Some("United States".to_string()),
            market_cap: Some(3.0e12),
            dividend_rate: Some(0.96),
            current_price: Some(210.0),
            ..Fundamentals::new("AAPL")
        })
        .with_fundamentals(Fundamentals {
            country: Some("United States".to_string()),
            market_cap: Some(3.1e12),
            dividend_rate: Some(3.0),
            current_price: Some(420.0),
            ..Fundamentals::new("MSFT")
        })
        .with_fundamentals(Fundamentals {
            country: Some("United States".to_string()),
            market_cap: Some(6.0e11),
            dividend_rate: None,
            current_price: Some(180.0),
            ..Fundamentals::new("AMZN")
        })
        .with_fundamentals(Fundamentals {
            country: Some("United States".to_string()),
            market_cap: Some(7.0e11),
            dividend_rate: Some(0.0),
            current_price: Some(200.0),
            ..Fundamentals::new("TSLA")
        })
}

pub fn history_service(provider: InMemoryProvider) -> HistoricalDataService {
    HistoricalDataService::new(
        Arc::new(provider),
        Arc::new(RateLimiter::unlimited_rate(8)),
        FailureCache::new(),
        Arc::new(FixedClock::at_date(today())),
        4,
        Duration::from_secs(2),
    )
}

pub fn config() -> AnalyticsConfig {
    AnalyticsConfig {
        provider: ProviderKind::Synthetic,
        ..AnalyticsConfig::default()
    }
}

pub fn app_state(provider: InMemoryProvider) -> AppState {
    AppState {
        history: Arc::new(history_service(provider)),
        config: Arc::new(config()),
    }
}
