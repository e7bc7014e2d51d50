use serde::{Deserialize, Serialize};

/// Tolerance allowed on the sum of allocation weights at the API boundary.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.1;

/// A target weight (in percent) assigned to a ticker within a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub ticker: String,
    #[serde(rename = "allocationPercentage", alias = "weightPercent")]
    pub weight_percent: f64,
}

impl Allocation {
    pub fn new(ticker: impl Into<String>, weight_percent: f64) -> Self {
        Self {
            ticker: ticker.into(),
            weight_percent,
        }
    }
}

/// An actual position, used by the dividend calculator in income mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: String,
    pub shares: f64,
}

impl Holding {
    pub fn new(ticker: impl Into<String>, shares: f64) -> Self {
        Self {
            ticker: ticker.into(),
            shares,
        }
    }
}

/// Lookback period requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum TimePeriod {
    #[serde(rename = "6m")]
    SixMonths,
    #[default]
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "3y")]
    ThreeYears,
    #[serde(rename = "5y")]
    FiveYears,
}

impl TimePeriod {
    pub const ALL: [TimePeriod; 4] = [
        TimePeriod::SixMonths,
        TimePeriod::OneYear,
        TimePeriod::ThreeYears,
        TimePeriod::FiveYears,
    ];

    /// Calendar days of history fetched for this period.
    pub fn calendar_days(self) -> i64 {
        match self {
            TimePeriod::SixMonths => 182,
            TimePeriod::OneYear => 365,
            TimePeriod::ThreeYears => 3 * 365,
            TimePeriod::FiveYears => 5 * 365,
        }
    }

    /// Approximate number of trading days in this period.
    pub fn trading_days(self) -> usize {
        match self {
            TimePeriod::SixMonths => 126,
            TimePeriod::OneYear => 252,
            TimePeriod::ThreeYears => 756,
            TimePeriod::FiveYears => 1260,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimePeriod::SixMonths => "6m",
            TimePeriod::OneYear => "1y",
            TimePeriod::ThreeYears => "3y",
            TimePeriod::FiveYears => "5y",
        }
    }
}

/// Body accepted by every analytics endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRequest {
    #[serde(default)]
    pub allocations: Vec<Allocation>,
    #[serde(default)]
    pub time_period: TimePeriod,
    #[serde(default)]
    pub benchmark_ticker: Option<String>,
    #[serde(default)]
    pub holdings: Option<Vec<Holding>>,
}

impl AnalyticsRequest {
    pub fn new(allocations: Vec<Allocation>, time_period: TimePeriod) -> Self {
        Self {
            allocations,
            time_period,
            benchmark_ticker: None,
            holdings: None,
        }
    }

    /// Boundary checks. An empty allocation list is valid.
    pub fn validate(&self) -> Result<(), String> {
        for allocation in &self.allocations {
            if allocation.ticker.trim().is_empty() {
                return Err("Allocation ticker must not be empty".to_string());
            }
            let w = allocation.weight_percent;
            if !w.is_finite() || w <= 0.0 || w > 100.0 {
                return Err(format!(
                    "Allocation for {} must be in (0, 100], got {}",
                    allocation.ticker, w
                ));
            }
        }

        if !self.allocations.is_empty() {
            let total: f64 = self.allocations.iter().map(|a| a.weight_percent).sum();
            if (total - 100.0).abs() > WEIGHT_SUM_TOLERANCE {
                return Err(format!(
                    "Allocations must sum to 100 (±{}), got {:.4}",
                    WEIGHT_SUM_TOLERANCE, total
                ));
            }
        }

        if let Some(holdings) = &self.holdings {
            for holding in holdings {
                if holding.ticker.trim().is_empty() {
                    return Err("Holding ticker must not be empty".to_string());
                }
                if !holding.shares.is_finite() || holding.shares < 0.0 {
                    return Err(format!(
                        "Shares for {} must be a non-negative number, got {}",
                        holding.ticker, holding.shares
                    ));
                }
            }
        }

        if let Some(benchmark) = &self.benchmark_ticker {
            if benchmark.trim().is_empty() {
                return Err("benchmarkTicker must not be empty when provided".to_string());
            }
        }

        Ok(())
    }
}

pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Merge repeated tickers by summing their weights, keeping first-seen order.
pub fn reconcile_allocations(allocations: &[Allocation]) -> Vec<Allocation> {
    let mut merged: Vec<Allocation> = Vec::with_capacity(allocations.len());
    for allocation in allocations {
        let ticker = normalize_ticker(&allocation.ticker);
        if ticker.is_empty() {
            continue;
        }
        match merged.iter_mut().find(|a| a.ticker == ticker) {
            Some(existing) => existing.weight_percent += allocation.weight_percent,
            None => merged.push(Allocation::new(ticker, allocation.weight_percent)),
        }
    }
    merged
}

/// Merge repeated holdings by summing their share counts, keeping first-seen order.
pub fn reconcile_holdings(holdings: &[Holding]) -> Vec<Holding> {
    let mut merged: Vec<Holding> = Vec::with_capacity(holdings.len());
    for holding in holdings {
        let ticker = normalize_ticker(&holding.ticker);
        if ticker.is_empty() {
            continue;
        }
        match merged.iter_mut().find(|h| h.ticker == ticker) {
            Some(existing) => existing.shares += holding.shares,
            None => merged.push(Holding::new(ticker, holding.shares)),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserializes_api_shape() {
        let json = r#"{
            "allocations": [{"ticker": "AAPL", "allocationPercentage": 60}, {"ticker": "MSFT", "allocationPercentage": 40}],
            "timePeriod": "3y",
            "benchmarkTicker": "QQQ",
            "holdings": [{"ticker": "AAPL", "shares": 10}]
        }"#;

        let req: AnalyticsRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.allocations.len(), 2);
        assert_eq!(req.allocations[0].weight_percent, 60.0);
        assert_eq!(req.time_period, TimePeriod::ThreeYears);
        assert_eq!(req.benchmark_ticker.as_deref(), Some("QQQ"));
        assert_eq!(req.holdings.unwrap()[0].shares, 10.0);
    }

    #[test]
    fn test_time_period_defaults_to_one_year() {
        let req: AnalyticsRequest = serde_json::from_str(r#"{"allocations": []}"#).unwrap();
        assert_eq!(req.time_period, TimePeriod::OneYear);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_weight_sum() {
        let req = AnalyticsRequest::new(
            vec![Allocation::new("AAPL", 60.0), Allocation::new("MSFT", 30.0)],
            TimePeriod::OneYear,
        );
        assert!(req.validate().is_err());

        let ok = AnalyticsRequest::new(
            vec![Allocation::new("AAPL", 60.05), Allocation::new("MSFT", 40.0)],
            TimePeriod::OneYear,
        );
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_weight() {
        let req = AnalyticsRequest::new(
            vec![Allocation::new("AAPL", 0.0), Allocation::new("MSFT", 100.0)],
            TimePeriod::OneYear,
        );
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_reconcile_merges_duplicates_in_order() {
        let merged = reconcile_allocations(&[
            Allocation::new("msft", 20.0),
            Allocation::new("AAPL", 50.0),
            Allocation::new(" MSFT ", 30.0),
        ]);

        assert_eq!(
            merged,
            vec![Allocation::new("MSFT", 50.0), Allocation::new("AAPL", 50.0)]
        );
    }

    #[test]
    fn test_reconcile_holdings_sums_shares() {
        let merged = reconcile_holdings(&[Holding::new("ko", 10.0), Holding::new("KO", 5.0)]);
        assert_eq!(merged, vec![Holding::new("KO", 15.0)]);
    }
}
