use crate::external::market_data_provider::{MarketDataError, MarketDataProvider};
use crate::models::{Fundamentals, PriceSeries};
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, warn};

/// MultiProvider tries the primary provider first and falls back to the
/// secondary one when the primary errors or returns an empty series.
///
/// Fundamentals are merged field by field: anything the primary leaves
/// `None` is filled from the fallback.
pub struct MultiProvider {
    primary: Box<dyn MarketDataProvider>,
    fallback: Box<dyn MarketDataProvider>,
}

impl MultiProvider {
    pub fn new(primary: Box<dyn MarketDataProvider>, fallback: Box<dyn MarketDataProvider>) -> Self {
        Self { primary, fallback }
    }
}

fn is_complete(f: &Fundamentals) -> bool {
    f.country.is_some() && f.market_cap.is_some() && f.dividend_rate.is_some() && f.current_price.is_some()
}

fn merge(primary: Fundamentals, fallback: Fundamentals) -> Fundamentals {
    Fundamentals {
        ticker: primary.ticker,
        name: primary.name.or(fallback.name),
        country: primary.country.or(fallback.country),
        sector: primary.sector.or(fallback.sector),
        market_cap: primary.market_cap.or(fallback.market_cap),
        dividend_rate: primary.dividend_rate.or(fallback.dividend_rate),
        current_price: primary.current_price.or(fallback.current_price),
    }
}

#[async_trait]
impl MarketDataProvider for MultiProvider {
    async fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, MarketDataError> {
        match self.primary.fetch_history(ticker, start, end).await {
            Ok(series) if !series.is_empty() => {
                debug!("✓ Fetched {} from {}", ticker, self.primary.name());
                return Ok(series);
            }
            Ok(_) => {
                debug!("{} returned no history for {}, trying {}", self.primary.name(), ticker, self.fallback.name());
            }
            Err(MarketDataError::RateLimited) => {
                warn!("⚠️ {} rate limited, trying {}", self.primary.name(), self.fallback.name());
            }
            Err(e) => {
                warn!("{} error for {}: {}", self.primary.name(), ticker, e);
            }
        }

        let series = self.fallback.fetch_history(ticker, start, end).await?;
        debug!("✓ Fetched {} from fallback {}", ticker, self.fallback.name());
        Ok(series)
    }

    async fn fetch_fundamentals(&self, ticker: &str) -> Result<Fundamentals, MarketDataError> {
        match self.primary.fetch_fundamentals(ticker).await {
            Ok(f) if is_complete(&f) => Ok(f),
            Ok(partial) => match self.fallback.fetch_fundamentals(ticker).await {
                Ok(other) => Ok(merge(partial, other)),
                Err(e) => {
                    debug!("Fallback fundamentals failed for {}: {}; keeping partial data", ticker, e);
                    Ok(partial)
                }
            },
            Err(e) => {
                warn!("{} fundamentals error for {}: {}", self.primary.name(), ticker, e);
                self.fallback.fetch_fundamentals(ticker).await
            }
        }
    }

    fn name(&self) -> &'static str {
        "multi"
    }
}
