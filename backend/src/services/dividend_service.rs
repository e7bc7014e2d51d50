use std::collections::HashMap;

use tracing::debug;

use crate::models::{Allocation, DividendStock, DividendSummary, Fundamentals, Holding};

/// Annual dividend per share, treating a missing or invalid rate as zero.
fn dividend_rate(f: &Fundamentals) -> f64 {
    f.dividend_rate.filter(|r| r.is_finite() && *r > 0.0).unwrap_or(0.0)
}

/// Current price, `None` when missing or non-positive.
fn current_price(f: &Fundamentals) -> Option<f64> {
    f.current_price.filter(|p| p.is_finite() && *p > 0.0)
}

fn yield_percent(f: &Fundamentals) -> f64 {
    match current_price(f) {
        Some(price) => dividend_rate(f) / price * 100.0,
        None => 0.0,
    }
}

/// Dividend view of a target-weight portfolio.
///
/// No share counts exist, so income totals are `None`. The portfolio yield
/// is the weight-averaged yield over tickers whose fundamentals resolved.
pub fn project_dividends(
    allocations: &[Allocation],
    fundamentals: &HashMap<String, Fundamentals>,
) -> DividendSummary {
    let mut stocks = Vec::new();
    let mut weighted_yield = 0.0;
    let mut resolved_weight = 0.0;

    for allocation in allocations {
        let Some(info) = fundamentals.get(&allocation.ticker) else {
            continue;
        };
        let rate = dividend_rate(info);
        let yld = yield_percent(info);

        weighted_yield += yld * allocation.weight_percent;
        resolved_weight += allocation.weight_percent;

        if rate > 0.0 {
            stocks.push(DividendStock {
                ticker: allocation.ticker.clone(),
                dividend_per_share: rate,
                annual_income: None,
                yield_percent: yld,
                allocation_or_shares: allocation.weight_percent,
            });
        }
    }

    stocks.sort_by(|a, b| {
        b.yield_percent
            .total_cmp(&a.yield_percent)
            .then_with(|| a.ticker.cmp(&b.ticker))
    });

    let dividend_yield_percent = if resolved_weight > 0.0 {
        weighted_yield / resolved_weight
    } else {
        0.0
    };

    DividendSummary {
        total_annual_income: None,
        monthly_income: None,
        dividend_yield_percent,
        dividend_stocks: stocks,
    }
}

/// Dividend income of actual share holdings.
pub fn actual_dividends(
    holdings: &[Holding],
    fundamentals: &HashMap<String, Fundamentals>,
) -> DividendSummary {
    let mut stocks = Vec::new();
    let mut total_income = 0.0;
    let mut total_value = 0.0;

    for holding in holdings {
        let Some(info) = fundamentals.get(&holding.ticker) else {
            debug!("No fundamentals for {} - counted as zero income", holding.ticker);
            continue;
        };
        let rate = dividend_rate(info);
        let income = rate * holding.shares;
        total_income += income;
        total_value += current_price(info).map_or(0.0, |p| p * holding.shares);

        if rate > 0.0 {
            stocks.push(DividendStock {
                ticker: holding.ticker.clone(),
                dividend_per_share: rate,
                annual_income: Some(income),
                yield_percent: yield_percent(info),
                allocation_or_shares: holding.shares,
            });
        }
    }

    stocks.sort_by(|a, b| {
        b.annual_income
            .unwrap_or(0.0)
            .total_cmp(&a.annual_income.unwrap_or(0.0))
            .then_with(|| a.ticker.cmp(&b.ticker))
    });

    let dividend_yield_percent = if total_value > 0.0 {
        total_income / total_value * 100.0
    } else {
        0.0
    };

    DividendSummary {
        total_annual_income: Some(total_income),
        monthly_income: Some(total_income / 12.0),
        dividend_yield_percent,
        dividend_stocks: stocks,
    }
}

/// Actual mode when holdings are supplied, projection otherwise.
pub fn compute_dividends(
    allocations: &[Allocation],
    holdings: Option<&[Holding]>,
    fundamentals: &HashMap<String, Fundamentals>,
) -> DividendSummary {
    match holdings {
        Some(holdings) => actual_dividends(holdings, fundamentals),
        None => project_dividends(allocations, fundamentals),
    }
}
