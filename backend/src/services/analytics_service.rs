use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use tracing::{info, warn};

use crate::config::AnalyticsConfig;
use crate::models::portfolio::{normalize_ticker, reconcile_allocations, reconcile_holdings};
use crate::models::{
    Allocation, AnalyticsRequest, CompositionResponse, CorrelationMatrix, DividendSummary,
    Holding, PerformanceResponse, PortfolioSummary, PriceSeries, RiskMetrics, TimePeriod,
};
use crate::services::alignment::{align, Alignment};
use crate::services::history_service::HistoricalDataService;
use crate::services::{
    composition_service, correlation_service, dividend_service, performance_service, risk_service,
};

/// A request after duplicate reconciliation and default resolution.
#[derive(Debug, Clone)]
struct PortfolioInput {
    allocations: Vec<Allocation>,
    holdings: Option<Vec<Holding>>,
    period: TimePeriod,
    benchmark: String,
}

impl PortfolioInput {
    fn resolve(request: &AnalyticsRequest, config: &AnalyticsConfig) -> Self {
        let benchmark = request
            .benchmark_ticker
            .as_deref()
            .map(normalize_ticker)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| normalize_ticker(&config.default_benchmark));

        Self {
            allocations: reconcile_allocations(&request.allocations),
            holdings: request.holdings.as_deref().map(reconcile_holdings),
            period: request.time_period,
            benchmark,
        }
    }

    fn tickers(&self) -> Vec<String> {
        self.allocations.iter().map(|a| a.ticker.clone()).collect()
    }

    /// Tickers whose fundamentals the dividend and composition views need.
    fn fundamental_tickers(&self) -> Vec<String> {
        let mut tickers = self.tickers();
        for holding in self.holdings.iter().flatten() {
            if !tickers.contains(&holding.ticker) {
                tickers.push(holding.ticker.clone());
            }
        }
        tickers
    }

    fn with_benchmark(&self) -> Vec<String> {
        let mut tickers = self.tickers();
        if !tickers.contains(&self.benchmark) {
            tickers.push(self.benchmark.clone());
        }
        tickers
    }

    fn period_start(&self, today: NaiveDate) -> NaiveDate {
        today - Duration::days(self.period.calendar_days())
    }
}

/// Align only the portfolio's own tickers, in allocation order.
fn align_portfolio(found: &HashMap<String, PriceSeries>, tickers: &[String]) -> Alignment {
    let subset: HashMap<String, PriceSeries> = tickers
        .iter()
        .filter_map(|t| found.get(t).map(|s| (t.clone(), s.clone())))
        .collect();
    align(&subset, tickers)
}

fn risk_against(
    curve: Option<&performance_service::PortfolioCurve>,
    benchmark: Option<&PriceSeries>,
    benchmark_ticker: &str,
    risk_free_rate: f64,
) -> RiskMetrics {
    match (curve, benchmark) {
        (Some(curve), Some(bench)) => risk_service::compute_risk_metrics(curve, bench, risk_free_rate),
        (Some(_), None) => {
            warn!("Benchmark {} unavailable - risk metrics omitted", benchmark_ticker);
            RiskMetrics::unavailable()
        }
        _ => RiskMetrics::unavailable(),
    }
}

pub async fn get_performance(
    history: &HistoricalDataService,
    config: &AnalyticsConfig,
    request: &AnalyticsRequest,
) -> PerformanceResponse {
    let input = PortfolioInput::resolve(request, config);
    let tickers = input.tickers();
    if tickers.is_empty() {
        return PerformanceResponse::empty();
    }

    let today = history.clock().today();
    let outcome = history
        .fetch_histories(&tickers, input.period_start(today), today)
        .await;
    let alignment = align_portfolio(&outcome.found, &tickers);

    performance_service::calculate_performance(&alignment, &input.allocations, input.period).response
}

pub async fn get_risk(
    history: &HistoricalDataService,
    config: &AnalyticsConfig,
    request: &AnalyticsRequest,
) -> RiskMetrics {
    let input = PortfolioInput::resolve(request, config);
    let tickers = input.tickers();
    if tickers.is_empty() {
        return RiskMetrics::unavailable();
    }

    let today = history.clock().today();
    let outcome = history
        .fetch_histories(&input.with_benchmark(), input.period_start(today), today)
        .await;
    let alignment = align_portfolio(&outcome.found, &tickers);
    let performance =
        performance_service::calculate_performance(&alignment, &input.allocations, input.period);

    risk_against(
        performance.curve.as_ref(),
        outcome.found.get(&input.benchmark),
        &input.benchmark,
        config.risk_free_rate,
    )
}

pub async fn get_correlation(
    history: &HistoricalDataService,
    config: &AnalyticsConfig,
    request: &AnalyticsRequest,
) -> CorrelationMatrix {
    let input = PortfolioInput::resolve(request, config);
    let tickers = input.tickers();
    if tickers.len() < 2 {
        return CorrelationMatrix::empty();
    }

    let today = history.clock().today();
    let outcome = history
        .fetch_histories(&tickers, correlation_service::window_start(today), today)
        .await;

    match align_portfolio(&outcome.found, &tickers).matrix() {
        Some(matrix) => correlation_service::compute_correlation_matrix(matrix, today),
        None => CorrelationMatrix::empty(),
    }
}

pub async fn get_composition(
    history: &HistoricalDataService,
    config: &AnalyticsConfig,
    request: &AnalyticsRequest,
) -> CompositionResponse {
    let input = PortfolioInput::resolve(request, config);
    let outcome = history.fetch_fundamentals(&input.tickers()).await;
    composition_service::compute_composition(&input.allocations, &outcome.found)
}

pub async fn get_dividends(
    history: &HistoricalDataService,
    config: &AnalyticsConfig,
    request: &AnalyticsRequest,
) -> DividendSummary {
    let input = PortfolioInput::resolve(request, config);
    let outcome = history.fetch_fundamentals(&input.fundamental_tickers()).await;
    dividend_service::compute_dividends(&input.allocations, input.holdings.as_deref(), &outcome.found)
}

/// Every view from one history fetch and one fundamentals fetch, run
/// concurrently.
pub async fn get_summary(
    history: &HistoricalDataService,
    config: &AnalyticsConfig,
    request: &AnalyticsRequest,
) -> PortfolioSummary {
    let input = PortfolioInput::resolve(request, config);
    let tickers = input.tickers();
    let today = history.clock().today();

    let history_tickers = if tickers.is_empty() { Vec::new() } else { input.with_benchmark() };
    let fundamental_tickers = input.fundamental_tickers();
    let (prices, fundamentals) = tokio::join!(
        history.fetch_histories(&history_tickers, input.period_start(today), today),
        history.fetch_fundamentals(&fundamental_tickers),
    );

    let alignment = align_portfolio(&prices.found, &tickers);
    let performance =
        performance_service::calculate_performance(&alignment, &input.allocations, input.period);

    let risk = risk_against(
        performance.curve.as_ref(),
        prices.found.get(&input.benchmark),
        &input.benchmark,
        config.risk_free_rate,
    );

    let correlation = alignment
        .matrix()
        .map(|m| correlation_service::compute_correlation_matrix(m, today))
        .unwrap_or_else(CorrelationMatrix::empty);
    let correlation_statistics = correlation_service::calculate_correlation_statistics(&correlation);

    let composition = composition_service::compute_composition(&input.allocations, &fundamentals.found);
    let dividends = dividend_service::compute_dividends(
        &input.allocations,
        input.holdings.as_deref(),
        &fundamentals.found,
    );

    info!(
        "📊 Summary for {} tickers: return {:.2}%, {} excluded",
        tickers.len(),
        performance.response.return_percentage,
        performance.response.excluded_tickers.len()
    );

    PortfolioSummary {
        benchmark_ticker: input.benchmark,
        performance: performance.response,
        risk,
        correlation,
        correlation_statistics,
        composition,
        dividends,
    }
}
