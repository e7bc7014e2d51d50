use serde::{Deserialize, Serialize};

/// Static company data used for composition and dividend breakdowns.
///
/// Providers leave a field `None` when they cannot supply it; each consumer
/// decides its own default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fundamentals {
    pub ticker: String,
    pub name: Option<String>,
    pub country: Option<String>,
    pub sector: Option<String>,
    /// Market capitalization in the quote currency
    pub market_cap: Option<f64>,
    /// Trailing annual dividend per share
    pub dividend_rate: Option<f64>,
    pub current_price: Option<f64>,
}

impl Fundamentals {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Self::default()
        }
    }
}
