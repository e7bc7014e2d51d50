use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{PriceSeries, RiskMetrics};
use crate::services::performance_service::PortfolioCurve;
use crate::services::statistics::{
    daily_returns, mean, sample_covariance, sample_std_dev, sample_variance,
    TRADING_DAYS_PER_YEAR, ZERO_TOLERANCE,
};

/// Risk of the portfolio curve relative to a benchmark series.
///
/// Only dates present in both are used. All metrics are `None` when fewer
/// than two overlapping daily returns remain.
///
/// # Arguments
/// * `curve` - Reconstructed portfolio value curve
/// * `benchmark` - Benchmark closes (e.g., SPY)
/// * `risk_free_rate` - Annual risk-free rate (e.g., 0.02 for 2%)
pub fn compute_risk_metrics(
    curve: &PortfolioCurve,
    benchmark: &PriceSeries,
    risk_free_rate: f64,
) -> RiskMetrics {
    let (portfolio_levels, bench_levels) = intersect_levels(curve, benchmark);

    let returns = daily_returns(&portfolio_levels);
    let bench_returns = daily_returns(&bench_levels);

    if returns.len() < 2 {
        debug!(
            "Only {} overlapping returns against {} - risk metrics unavailable",
            returns.len(),
            benchmark.ticker()
        );
        return RiskMetrics::unavailable();
    }

    RiskMetrics {
        beta: compute_beta(&returns, &bench_returns),
        sharpe_ratio: compute_sharpe(&returns, risk_free_rate),
        volatility_percent: compute_volatility(&returns),
        max_drawdown_percent: Some(compute_max_drawdown(&returns)),
    }
}

/// Curve and benchmark levels on their shared dates, in date order.
fn intersect_levels(curve: &PortfolioCurve, benchmark: &PriceSeries) -> (Vec<f64>, Vec<f64>) {
    let bench_by_date: HashMap<NaiveDate, f64> = benchmark
        .dates()
        .iter()
        .copied()
        .zip(benchmark.closes().iter().copied())
        .collect();

    curve
        .dates
        .iter()
        .zip(curve.values.iter())
        .filter_map(|(date, value)| bench_by_date.get(date).map(|b| (*value, *b)))
        .unzip()
}

/// Covariance with the benchmark over benchmark variance.
///
/// A flat benchmark has no variance to measure against; beta falls back to 1.0.
fn compute_beta(returns: &[f64], bench_returns: &[f64]) -> Option<f64> {
    let var_b = sample_variance(bench_returns)?;
    if var_b.abs() < ZERO_TOLERANCE {
        return Some(1.0);
    }
    let cov = sample_covariance(returns, bench_returns)?;
    Some(cov / var_b)
}

/// Annualized Sharpe ratio of daily excess returns.
fn compute_sharpe(returns: &[f64], risk_free_rate: f64) -> Option<f64> {
    let risk_free_daily = risk_free_rate / TRADING_DAYS_PER_YEAR;
    let excess: Vec<f64> = returns.iter().map(|r| r - risk_free_daily).collect();

    let std = sample_std_dev(&excess)?;
    if std < ZERO_TOLERANCE {
        return None;
    }
    Some(mean(&excess)? / std * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Annualized volatility as a percentage.
fn compute_volatility(returns: &[f64]) -> Option<f64> {
    sample_std_dev(returns).map(|std| std * TRADING_DAYS_PER_YEAR.sqrt() * 100.0)
}

/// Largest peak-to-trough decline of the compounded returns, in percent (<= 0).
fn compute_max_drawdown(returns: &[f64]) -> f64 {
    let mut cumulative = 1.0;
    let mut peak = 1.0;
    let mut max_dd: f64 = 0.0;

    for r in returns {
        cumulative *= 1.0 + r;
        if cumulative > peak {
            peak = cumulative;
        }
        let dd = (cumulative - peak) / peak;
        if dd < max_dd {
            max_dd = dd;
        }
    }

    max_dd * 100.0
}
