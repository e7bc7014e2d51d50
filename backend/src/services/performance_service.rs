use chrono::NaiveDate;
use ndarray::Array1;
use tracing::debug;

use crate::models::{Allocation, AppliedWeight, PerformanceResponse, PeriodStats, TimePeriod, TimeSeriesPoint};
use crate::services::alignment::{AlignedMatrix, Alignment};

/// Value every per-ticker index and the portfolio curve start at.
pub const BASE_VALUE: f64 = 100.0;

/// Synthetic portfolio value, starting at [`BASE_VALUE`].
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioCurve {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl PortfolioCurve {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    pub fn total_return_percent(&self) -> f64 {
        self.last_value()
            .map(|last| (last - BASE_VALUE) / BASE_VALUE * 100.0)
            .unwrap_or(0.0)
    }
}

/// Curve plus the API view of it.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceResult {
    pub curve: Option<PortfolioCurve>,
    pub response: PerformanceResponse,
}

/// Weights as fractions summing to 1.0 over the tickers present in the
/// matrix, in matrix column order. Missing tickers drop out and the rest
/// scale up proportionally.
pub fn renormalize_weights(present: &[String], allocations: &[Allocation]) -> Vec<(String, f64)> {
    let raw: Vec<(String, f64)> = present
        .iter()
        .map(|ticker| {
            let w: f64 = allocations
                .iter()
                .filter(|a| &a.ticker == ticker)
                .map(|a| a.weight_percent)
                .filter(|w| w.is_finite() && *w > 0.0)
                .sum();
            (ticker.clone(), w)
        })
        .filter(|(_, w)| *w > 0.0)
        .collect();

    let total: f64 = raw.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return Vec::new();
    }

    raw.into_iter().map(|(t, w)| (t, w / total)).collect()
}

/// Weighted sum of per-ticker indices `price[t] / price[0] * 100`.
pub fn build_curve(matrix: &AlignedMatrix, weights: &[(String, f64)]) -> Option<PortfolioCurve> {
    if matrix.nrows() == 0 || weights.is_empty() {
        return None;
    }

    let w: Array1<f64> = matrix
        .tickers()
        .iter()
        .map(|t| {
            weights
                .iter()
                .find(|(ticker, _)| ticker == t)
                .map(|(_, w)| *w)
                .unwrap_or(0.0)
        })
        .collect();

    let prices = matrix.values();
    let base = prices.row(0);
    let indexed = prices / &base * BASE_VALUE;
    let mut values = indexed.dot(&w).to_vec();

    // Pin the base so rounding in the weighted sum cannot move it
    values[0] = BASE_VALUE;

    Some(PortfolioCurve {
        dates: matrix.dates().to_vec(),
        values,
    })
}

/// Share of a period's calendar span the curve must cover before the overall
/// return stands in for a trailing stat.
const MIN_SPAN_COVERAGE: f64 = 0.9;

/// Trailing returns over 126/252/756/1260 observations.
///
/// With enough history a stat is `values[last] - values[last + 1 - N]`.
/// Without it, a period no longer than `requested` falls back to the overall
/// return only if the curve spans at least 90% of the period's calendar
/// days. Everything else is `None`.
pub fn period_stats(dates: &[NaiveDate], values: &[f64], requested: TimePeriod) -> PeriodStats {
    let mut stats = PeriodStats::default();
    let (Some(&last), Some(first_date), Some(last_date)) = (values.last(), dates.first(), dates.last())
    else {
        return stats;
    };
    let overall = last - BASE_VALUE;
    let span_days = (*last_date - *first_date).num_days() as f64;

    for period in TimePeriod::ALL {
        let n = period.trading_days();
        let covered = span_days >= MIN_SPAN_COVERAGE * period.calendar_days() as f64;
        let value = if values.len() >= n {
            Some(last - values[values.len() - n])
        } else if period <= requested && covered {
            Some(overall)
        } else {
            None
        };
        stats.set(period, value);
    }
    stats
}

/// Reconstruct the portfolio curve and its return statistics.
///
/// `allocations` should already be reconciled. Pure: identical input gives
/// identical output.
pub fn calculate_performance(
    alignment: &Alignment,
    allocations: &[Allocation],
    requested: TimePeriod,
) -> PerformanceResult {
    let excluded_tickers: Vec<String> = allocations
        .iter()
        .filter(|a| {
            alignment
                .matrix()
                .map_or(true, |m| !m.tickers().contains(&a.ticker))
        })
        .map(|a| a.ticker.clone())
        .collect();

    let empty = || PerformanceResult {
        curve: None,
        response: PerformanceResponse {
            excluded_tickers: excluded_tickers.clone(),
            ..PerformanceResponse::empty()
        },
    };

    let Some(matrix) = alignment.matrix() else {
        return empty();
    };

    let weights = renormalize_weights(matrix.tickers(), allocations);
    let Some(curve) = build_curve(matrix, &weights) else {
        return empty();
    };

    debug!(
        "Built portfolio curve: {} points, {} tickers, {} excluded",
        curve.len(),
        weights.len(),
        excluded_tickers.len()
    );

    let time_series = curve
        .dates
        .iter()
        .zip(curve.values.iter())
        .map(|(date, value)| TimeSeriesPoint {
            date: *date,
            return_percentage: value - BASE_VALUE,
        })
        .collect();

    let response = PerformanceResponse {
        return_percentage: curve.total_return_percent(),
        time_series,
        period_stats: period_stats(&curve.dates, &curve.values, requested),
        start_date: curve.dates.first().copied(),
        end_date: curve.dates.last().copied(),
        weights: weights
            .iter()
            .map(|(ticker, w)| AppliedWeight {
                ticker: ticker.clone(),
                weight_percent: w * 100.0,
            })
            .collect(),
        excluded_tickers,
    };

    PerformanceResult {
        curve: Some(curve),
        response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PricePoint, PriceSeries};
    use crate::services::alignment::align;
    use chrono::Duration;
    use std::collections::HashMap;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
    }

    fn series(ticker: &str, closes: &[f64]) -> PriceSeries {
        PriceSeries::from_points(
            ticker,
            closes
                .iter()
                .enumerate()
                .map(|(i, c)| PricePoint::new(start() + Duration::days(i as i64), *c))
                .collect(),
        )
    }

    fn aligned(list: Vec<PriceSeries>) -> Alignment {
        let order: Vec<String> = list.iter().map(|s| s.ticker().to_string()).collect();
        let map: HashMap<String, PriceSeries> =
            list.into_iter().map(|s| (s.ticker().to_string(), s)).collect();
        align(&map, &order)
    }

    #[test]
    fn test_renormalized_weights_sum_to_one() {
        let present = vec!["AAPL".to_string(), "MSFT".to_string()];
        let allocations = vec![
            Allocation::new("AAPL", 30.0),
            Allocation::new("MSFT", 20.0),
            Allocation::new("FAIL", 50.0),
        ];

        let weights = renormalize_weights(&present, &allocations);
        let total: f64 = weights.iter().map(|(_, w)| w).sum();

        assert!((total - 1.0).abs() < 1e-12);
        assert!((weights[0].1 - 0.6).abs() < 1e-12);
        assert!((weights[1].1 - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_curve_is_weighted_index() {
        let alignment = aligned(vec![series("A", &[10.0, 11.0, 12.0]), series("B", &[50.0, 50.0, 40.0])]);
        let allocations = vec![Allocation::new("A", 50.0), Allocation::new("B", 50.0)];

        let result = calculate_performance(&alignment, &allocations, TimePeriod::OneYear);
        let curve = result.curve.unwrap();

        assert_eq!(curve.values[0], 100.0);
        assert!((curve.values[1] - 105.0).abs() < 1e-9);
        // A: 120, B: 80
        assert!((curve.values[2] - 100.0).abs() < 1e-9);
        assert!((result.response.return_percentage - 0.0).abs() < 1e-9);
        assert_eq!(result.response.time_series[0].return_percentage, 0.0);
    }

    #[test]
    fn test_base_is_exactly_one_hundred_with_awkward_weights() {
        let alignment = aligned(vec![
            series("A", &[3.3, 3.4]),
            series("B", &[7.7, 7.1]),
            series("C", &[1.1, 1.2]),
        ]);
        let allocations = vec![
            Allocation::new("A", 33.3),
            Allocation::new("B", 33.3),
            Allocation::new("C", 33.4),
        ];

        let curve = calculate_performance(&alignment, &allocations, TimePeriod::SixMonths).curve.unwrap();
        assert_eq!(curve.values[0], 100.0);
    }

    #[test]
    fn test_excluded_ticker_reported_and_weights_scale_up() {
        let alignment = aligned(vec![series("A", &[10.0, 12.0])]);
        let allocations = vec![Allocation::new("A", 40.0), Allocation::new("GONE", 60.0)];

        let response = calculate_performance(&alignment, &allocations, TimePeriod::OneYear).response;

        assert_eq!(response.excluded_tickers, vec!["GONE".to_string()]);
        assert_eq!(response.weights.len(), 1);
        assert!((response.weights[0].weight_percent - 100.0).abs() < 1e-9);
        assert!((response.return_percentage - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_alignment_gives_zero_result() {
        let allocations = vec![Allocation::new("GONE", 100.0)];
        let result = calculate_performance(&Alignment::Empty, &allocations, TimePeriod::OneYear);

        assert!(result.curve.is_none());
        assert_eq!(result.response.return_percentage, 0.0);
        assert!(result.response.time_series.is_empty());
        assert_eq!(result.response.period_stats, PeriodStats::default());
        assert_eq!(result.response.excluded_tickers, vec!["GONE".to_string()]);
    }

    fn every(step_days: i64, n: usize) -> Vec<NaiveDate> {
        (0..n).map(|i| start() + Duration::days(i as i64 * step_days)).collect()
    }

    #[test]
    fn test_period_stats_with_short_history() {
        // 200 observations over ~400 days: 6m computable, 1y falls back when requested
        let values: Vec<f64> = (0..200).map(|i| 100.0 + i as f64 * 0.1).collect();
        let dates = every(2, 200);

        let stats = period_stats(&dates, &values, TimePeriod::OneYear);
        let expected_6m = values[199] - values[200 - 126];
        assert!((stats.six_month.unwrap() - expected_6m).abs() < 1e-9);
        assert!((stats.one_year.unwrap() - (values[199] - 100.0)).abs() < 1e-9);
        assert_eq!(stats.three_year, None);
        assert_eq!(stats.five_year, None);

        let stats = period_stats(&dates, &values, TimePeriod::SixMonths);
        assert_eq!(stats.one_year, None);
    }

    #[test]
    fn test_young_listing_does_not_report_long_periods() {
        // 250 daily observations: well short of a year, let alone five
        let values: Vec<f64> = (0..250).map(|i| 100.0 + i as f64 * 0.2).collect();
        let dates = every(1, 250);

        let stats = period_stats(&dates, &values, TimePeriod::FiveYears);

        assert!(stats.six_month.is_some());
        assert_eq!(stats.one_year, None);
        assert_eq!(stats.three_year, None);
        assert_eq!(stats.five_year, None);
    }

    #[test]
    fn test_fallback_requires_most_of_the_period() {
        let values: Vec<f64> = (0..100).map(|i| 100.0 + i as f64).collect();

        // 99 * 3 = 297 days is under 90% of a year
        let stats = period_stats(&every(3, 100), &values, TimePeriod::OneYear);
        assert_eq!(stats.one_year, None);

        // 99 * 4 = 396 days covers it
        let stats = period_stats(&every(4, 100), &values, TimePeriod::OneYear);
        assert_eq!(stats.one_year, Some(99.0));
        // Too few observations for six months too, so it falls back the same way
        assert_eq!(stats.six_month, Some(99.0));
    }

    #[test]
    fn test_period_stats_with_full_year() {
        let values: Vec<f64> = (0..260).map(|i| 100.0 + i as f64).collect();
        let stats = period_stats(&every(1, 260), &values, TimePeriod::OneYear);

        assert_eq!(stats.one_year, Some(259.0 + 100.0 - (100.0 + 8.0)));
        assert_eq!(stats.six_month, Some(125.0));
    }

    #[test]
    fn test_calculation_is_idempotent() {
        let alignment = aligned(vec![series("A", &[10.0, 11.0, 9.0]), series("B", &[5.0, 5.5, 6.0])]);
        let allocations = vec![Allocation::new("A", 70.0), Allocation::new("B", 30.0)];

        let first = calculate_performance(&alignment, &allocations, TimePeriod::OneYear);
        let second = calculate_performance(&alignment, &allocations, TimePeriod::OneYear);
        assert_eq!(first, second);
    }
}
