pub mod alignment;
pub mod analytics_service;
pub mod composition_service;
pub mod correlation_service;
pub mod dividend_service;
pub mod failure_cache;
pub mod history_service;
pub mod performance_service;
pub mod rate_limiter;
pub mod risk_service;
pub mod statistics;
