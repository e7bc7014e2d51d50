use crate::external::market_data_provider::{MarketDataError, MarketDataProvider};
use crate::models::{Fundamentals, PricePoint, PriceSeries};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;

const BASE_URL: &str = "https://www.alphavantage.co/query";

pub struct AlphaVantageProvider {
    client: reqwest::Client,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    async fn query<T: DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<T, MarketDataError> {
        let mut query: Vec<(&str, &str)> = params.to_vec();
        query.push(("apikey", self.api_key.as_str()));

        let resp = self
            .client
            .get(BASE_URL)
            .query(&query)
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited);
        }

        resp.json::<T>()
            .await
            .map_err(|e| MarketDataError::Parse(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct AvDailyResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<BTreeMap<String, AvDailyBar>>,

    // When rate-limited Alpha Vantage returns:
    // { "Note": "Thank you for using Alpha Vantage! ... 5 calls per minute ..." }
    #[serde(rename = "Note")]
    note: Option<String>,

    #[serde(rename = "Information")]
    information: Option<String>,

    // When invalid:
    // { "Error Message": "Invalid API call. ..." }
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvDailyBar {
    #[serde(rename = "4. close")]
    close: String,
}

#[derive(Debug, Deserialize)]
struct AvOverview {
    #[serde(rename = "Symbol")]
    symbol: Option<String>,
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Country")]
    country: Option<String>,
    #[serde(rename = "Sector")]
    sector: Option<String>,
    #[serde(rename = "MarketCapitalization")]
    market_cap: Option<String>,
    #[serde(rename = "DividendPerShare")]
    dividend_per_share: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvGlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    quote: Option<AvGlobalQuote>,
}

#[derive(Debug, Deserialize)]
struct AvGlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
}

/// Alpha Vantage encodes missing numbers as "None", "-" or "".
fn parse_number(value: &Option<String>) -> Option<f64> {
    value
        .as_deref()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Alpha Vantage reports US listings as "USA"; everything downstream uses
/// full country names.
fn normalize_country(country: Option<String>) -> Option<String> {
    let country = country?.trim().to_string();
    match country.as_str() {
        "" | "None" | "-" => None,
        "USA" | "US" => Some("United States".to_string()),
        _ => Some(country),
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty() && s != "None")
}

#[async_trait]
impl MarketDataProvider for AlphaVantageProvider {
    async fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, MarketDataError> {
        // outputsize=compact (latest ~100 points) or full (~20+ years)
        let span = (end - start).num_days();
        let outputsize = if span <= 140 { "compact" } else { "full" };

        let body: AvDailyResponse = self
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", ticker),
                ("outputsize", outputsize),
            ])
            .await?;

        if body.note.is_some() || body.information.is_some() {
            // This is the throttle response
            return Err(MarketDataError::RateLimited);
        }

        if let Some(msg) = body.error_message {
            return Err(MarketDataError::BadResponse(msg));
        }

        let series = body
            .time_series
            .ok_or_else(|| MarketDataError::BadResponse("missing time series".into()))?;

        let mut points = Vec::with_capacity(series.len());
        for (date_str, bar) in series {
            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .map_err(|e| MarketDataError::Parse(e.to_string()))?;
            if date < start || date > end {
                continue;
            }

            let close = bar
                .close
                .parse::<f64>()
                .map_err(|e| MarketDataError::Parse(e.to_string()))?;

            points.push(PricePoint::new(date, close));
        }

        Ok(PriceSeries::from_points(ticker, points))
    }

    async fn fetch_fundamentals(&self, ticker: &str) -> Result<Fundamentals, MarketDataError> {
        let overview: AvOverview = self
            .query(&[("function", "OVERVIEW"), ("symbol", ticker)])
            .await?;

        if overview.note.is_some() || overview.information.is_some() {
            return Err(MarketDataError::RateLimited);
        }

        // Unknown symbols come back as an empty object
        if overview.symbol.is_none() {
            return Err(MarketDataError::NotFound(ticker.to_string()));
        }

        let quote: AvGlobalQuoteResponse = self
            .query(&[("function", "GLOBAL_QUOTE"), ("symbol", ticker)])
            .await?;
        let current_price = quote.quote.as_ref().and_then(|q| parse_number(&q.price));

        Ok(Fundamentals {
            ticker: ticker.to_string(),
            market_cap: parse_number(&overview.market_cap),
            dividend_rate: parse_number(&overview.dividend_per_share),
            name: blank_to_none(overview.name),
            country: normalize_country(overview.country),
            sector: blank_to_none(overview.sector),
            current_price,
        })
    }

    fn name(&self) -> &'static str {
        "alphavantage"
    }
}
