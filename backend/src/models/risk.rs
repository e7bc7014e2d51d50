use serde::{Deserialize, Serialize};

/// Portfolio risk relative to a benchmark.
///
/// Percentages are expressed in percent (e.g., 18.5 for 18.5%). Every field
/// is `None` when the portfolio and benchmark share fewer than two daily
/// returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    /// Covariance with the benchmark over benchmark variance
    pub beta: Option<f64>,

    /// Annualized Sharpe ratio
    pub sharpe_ratio: Option<f64>,

    /// Annualized standard deviation of daily returns
    pub volatility_percent: Option<f64>,

    /// Largest peak-to-trough decline, as a non-positive percentage
    pub max_drawdown_percent: Option<f64>,
}

impl RiskMetrics {
    pub fn unavailable() -> Self {
        Self::default()
    }
}

/// Pairwise Pearson correlation of daily returns.
///
/// `tickers` defines row and column order of `correlations`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub tickers: Vec<String>,
    pub correlations: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.tickers.iter().position(|t| t == a)?;
        let j = self.tickers.iter().position(|t| t == b)?;
        Some(self.correlations[i][j])
    }
}

/// Summary of the off-diagonal entries of a correlation matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationStatistics {
    pub average_correlation: f64,
    pub max_correlation: f64,
    pub min_correlation: f64,
    pub high_correlation_pairs: usize,
}
