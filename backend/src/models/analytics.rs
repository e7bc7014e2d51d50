use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::portfolio::TimePeriod;

/// One point of the reconstructed portfolio curve, as a cumulative return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    pub date: NaiveDate,
    pub return_percentage: f64,
}

/// Trailing returns keyed by period; `None` when history is too short.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    #[serde(rename = "6m_return")]
    pub six_month: Option<f64>,
    #[serde(rename = "1y_return")]
    pub one_year: Option<f64>,
    #[serde(rename = "3y_return")]
    pub three_year: Option<f64>,
    #[serde(rename = "5y_return")]
    pub five_year: Option<f64>,
}

impl PeriodStats {
    pub fn set(&mut self, period: TimePeriod, value: Option<f64>) {
        match period {
            TimePeriod::SixMonths => self.six_month = value,
            TimePeriod::OneYear => self.one_year = value,
            TimePeriod::ThreeYears => self.three_year = value,
            TimePeriod::FiveYears => self.five_year = value,
        }
    }
}

/// Weight (in percent) actually applied to a ticker after renormalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedWeight {
    pub ticker: String,
    pub weight_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceResponse {
    pub return_percentage: f64,
    pub time_series: Vec<TimeSeriesPoint>,
    pub period_stats: PeriodStats,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub weights: Vec<AppliedWeight>,
    pub excluded_tickers: Vec<String>,
}

impl PerformanceResponse {
    /// Well-formed zero result for an empty or fully unresolved portfolio.
    pub fn empty() -> Self {
        Self {
            return_percentage: 0.0,
            time_series: Vec::new(),
            period_stats: PeriodStats::default(),
            start_date: None,
            end_date: None,
            weights: Vec::new(),
            excluded_tickers: Vec::new(),
        }
    }
}
