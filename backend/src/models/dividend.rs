use serde::{Deserialize, Serialize};

/// Per-ticker dividend detail.
///
/// `allocation_or_shares` is the allocation percentage in projection mode
/// and the share count in actual mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividendStock {
    pub ticker: String,
    pub dividend_per_share: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_income: Option<f64>,
    pub yield_percent: f64,
    pub allocation_or_shares: f64,
}

/// Income is only known when share counts are supplied; in projection mode
/// the totals are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividendSummary {
    pub total_annual_income: Option<f64>,
    pub monthly_income: Option<f64>,
    pub dividend_yield_percent: f64,
    pub dividend_stocks: Vec<DividendStock>,
}
