use std::sync::Arc;

use crate::clock::Clock;
use crate::external::market_data_provider::{MarketDataError, MarketDataProvider};
use crate::models::{Fundamentals, PricePoint, PriceSeries};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const COUNTRIES: [&str; 6] = [
    "United States",
    "United States",
    "United States",
    "Canada",
    "Germany",
    "India",
];

/// Offline provider producing a deterministic random walk per ticker.
///
/// The same ticker always yields the same path, so a local run behaves like
/// a stable market. Used with `PRICE_PROVIDER=synthetic`.
pub struct SyntheticProvider {
    anchor: NaiveDate,
    clock: Arc<dyn Clock>,
}

impl SyntheticProvider {
    /// `clock` dates the walk behind `current_price`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            anchor: NaiveDate::from_ymd_opt(2010, 1, 4).unwrap_or_default(),
            clock,
        }
    }

    fn seed(ticker: &str) -> u64 {
        // FNV-1a, stable across builds
        ticker.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |hash, b| {
            (hash ^ b as u64).wrapping_mul(0x0100_0000_01b3)
        })
    }

    fn walk(&self, ticker: &str, end: NaiveDate) -> Vec<PricePoint> {
        let mut rng = StdRng::seed_from_u64(Self::seed(ticker));
        let drift = rng.random_range(-0.0002..0.0008);
        let vol = rng.random_range(0.008..0.025);
        let mut price = rng.random_range(20.0..400.0);

        let mut points = Vec::new();
        let mut date = self.anchor;
        while date <= end {
            if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                let shock: f64 = rng.random::<f64>() - 0.5;
                price *= 1.0 + drift + shock * vol * 2.0;
                points.push(PricePoint::new(date, price.max(0.01)));
            }
            date = match date.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }
        points
    }
}

#[async_trait]
impl MarketDataProvider for SyntheticProvider {
    async fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, MarketDataError> {
        let points: Vec<PricePoint> = self
            .walk(ticker, end)
            .into_iter()
            .filter(|p| p.date >= start)
            .collect();
        Ok(PriceSeries::from_points(ticker, points))
    }

    async fn fetch_fundamentals(&self, ticker: &str) -> Result<Fundamentals, MarketDataError> {
        let mut rng = StdRng::seed_from_u64(Self::seed(ticker).rotate_left(17));
        let country = COUNTRIES[rng.random_range(0..COUNTRIES.len())];
        let market_cap = 10f64.powf(rng.random_range(8.5..12.5));
        let pays_dividend = rng.random_bool(0.6);

        let today = self.clock.today();
        let current_price = self.walk(ticker, today).last().map(|p| p.close);
        let dividend_rate = if pays_dividend {
            current_price.map(|p| p * rng.random_range(0.005..0.05))
        } else {
            Some(0.0)
        };

        Ok(Fundamentals {
            ticker: ticker.to_string(),
            name: Some(format!("{ticker} Synthetic Corp")),
            country: Some(country.to_string()),
            sector: None,
            market_cap: Some(market_cap),
            dividend_rate,
            current_price,
        })
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}
