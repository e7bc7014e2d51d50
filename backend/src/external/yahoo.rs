use crate::external::market_data_provider::{MarketDataError, MarketDataProvider};
use crate::models::{Fundamentals, PricePoint, PriceSeries};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";

pub struct YahooProvider {
    client: reqwest::Client,
}

impl YahooProvider {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    result: Option<Vec<QuoteSummaryResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    asset_profile: Option<AssetProfile>,
    summary_detail: Option<SummaryDetail>,
    price: Option<PriceModule>,
}

#[derive(Debug, Deserialize)]
struct AssetProfile {
    country: Option<String>,
    sector: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    market_cap: Option<RawValue>,
    dividend_rate: Option<RawValue>,
    trailing_annual_dividend_rate: Option<RawValue>,
    previous_close: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    long_name: Option<String>,
    short_name: Option<String>,
    regular_market_price: Option<RawValue>,
    market_cap: Option<RawValue>,
}

// Yahoo wraps numbers as {"raw": 1.23, "fmt": "1.23"}; empty objects mean "no value".
#[derive(Debug, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

fn raw(v: &Option<RawValue>) -> Option<f64> {
    v.as_ref().and_then(|r| r.raw)
}

fn unix_seconds(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

fn describe(error: &YahooError) -> String {
    format!(
        "{}: {}",
        error.code.as_deref().unwrap_or("error"),
        error.description.as_deref().unwrap_or("no description")
    )
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, MarketDataError> {
        // period2 is exclusive on Yahoo's side
        let period1 = unix_seconds(start);
        let period2 = unix_seconds(end + chrono::Duration::days(1));

        let resp = self.client
            .get(format!("{CHART_URL}/{ticker}"))
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
            ])
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        match resp.status() {
            reqwest::StatusCode::TOO_MANY_REQUESTS => return Err(MarketDataError::RateLimited),
            reqwest::StatusCode::NOT_FOUND => return Err(MarketDataError::NotFound(ticker.to_string())),
            _ => {}
        }

        let body = resp
            .json::<YahooChartResponse>()
            .await
            .map_err(|e| MarketDataError::Parse(e.to_string()))?;

        if let Some(err) = &body.chart.error {
            return Err(MarketDataError::BadResponse(describe(err)));
        }

        let result = body.chart.result
            .and_then(|mut r| r.pop())
            .ok_or_else(|| MarketDataError::BadResponse("missing result".into()))?;

        // timestamp aligns with close list by index
        let closes = result.indicators.quote
            .first()
            .map(|q| q.close.as_slice())
            .ok_or_else(|| MarketDataError::BadResponse("missing quote".into()))?;

        let mut points = Vec::with_capacity(result.timestamp.len());
        for (i, ts) in result.timestamp.iter().enumerate() {
            let Some(close) = closes.get(i).copied().flatten() else { continue };

            let date = DateTime::from_timestamp(*ts, 0)
                .ok_or_else(|| MarketDataError::Parse("bad timestamp".into()))?
                .date_naive();

            if date < start || date > end {
                continue;
            }
            points.push(PricePoint::new(date, close));
        }

        Ok(PriceSeries::from_points(ticker, points))
    }

    async fn fetch_fundamentals(&self, ticker: &str) -> Result<Fundamentals, MarketDataError> {
        let resp = self.client
            .get(format!("{QUOTE_SUMMARY_URL}/{ticker}"))
            .query(&[("modules", "assetProfile,summaryDetail,price")])
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        match resp.status() {
            reqwest::StatusCode::TOO_MANY_REQUESTS => return Err(MarketDataError::RateLimited),
            reqwest::StatusCode::NOT_FOUND => return Err(MarketDataError::NotFound(ticker.to_string())),
            _ => {}
        }

        let body = resp
            .json::<QuoteSummaryResponse>()
            .await
            .map_err(|e| MarketDataError::Parse(e.to_string()))?;

        if let Some(err) = &body.quote_summary.error {
            return Err(MarketDataError::BadResponse(describe(err)));
        }

        let result = body.quote_summary.result
            .and_then(|mut r| r.pop())
            .ok_or_else(|| MarketDataError::BadResponse("missing result".into()))?;

        let profile = result.asset_profile;
        let detail = result.summary_detail;
        let price = result.price;

        let market_cap = detail.as_ref().and_then(|d| raw(&d.market_cap))
            .or_else(|| price.as_ref().and_then(|p| raw(&p.market_cap)));
        let dividend_rate = detail.as_ref().and_then(|d| {
            raw(&d.dividend_rate).or_else(|| raw(&d.trailing_annual_dividend_rate))
        });
        let current_price = price.as_ref().and_then(|p| raw(&p.regular_market_price))
            .or_else(|| detail.as_ref().and_then(|d| raw(&d.previous_close)));

        Ok(Fundamentals {
            ticker: ticker.to_string(),
            name: price.as_ref().and_then(|p| p.long_name.clone().or_else(|| p.short_name.clone())),
            country: profile.as_ref().and_then(|p| p.country.clone()),
            sector: profile.and_then(|p| p.sector),
            market_cap,
            dividend_rate,
            current_price,
        })
    }

    fn name(&self) -> &'static str {
        "yahoo"
    }
}
