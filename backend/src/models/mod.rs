mod analytics;
mod composition;
mod dividend;
mod fundamentals;
mod price_point;
pub mod portfolio;
pub mod risk;
mod summary;

pub use analytics::{AppliedWeight, PerformanceResponse, PeriodStats, TimeSeriesPoint};
pub use composition::{CompositionBucket, CompositionResponse};
pub use dividend::{DividendStock, DividendSummary};
pub use fundamentals::Fundamentals;
pub use portfolio::{AnalyticsRequest, Allocation, Holding, TimePeriod};
pub use price_point::{PricePoint, PriceSeries};
pub use risk::{CorrelationMatrix, CorrelationStatistics, RiskMetrics};
pub use summary::PortfolioSummary;
