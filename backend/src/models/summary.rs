use serde::{Deserialize, Serialize};

use crate::models::{
    CompositionResponse, CorrelationMatrix, CorrelationStatistics, DividendSummary,
    PerformanceResponse, RiskMetrics,
};

/// Every analytics view of one portfolio, built from a single fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub benchmark_ticker: String,
    pub performance: PerformanceResponse,
    pub risk: RiskMetrics,
    pub correlation: CorrelationMatrix,
    pub correlation_statistics: Option<CorrelationStatistics>,
    pub composition: CompositionResponse,
    pub dividends: DividendSummary,
}
