use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::models::{CorrelationMatrix, CorrelationStatistics};
use crate::services::alignment::AlignedMatrix;
use crate::services::statistics::{daily_returns, pearson};

/// Calendar days of history the correlation matrix looks at.
pub const CORRELATION_WINDOW_DAYS: i64 = 182;

/// Pairs above this count as highly correlated.
pub const HIGH_CORRELATION_THRESHOLD: f64 = 0.7;

/// First date inside the correlation window ending on `today`.
pub fn window_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(CORRELATION_WINDOW_DAYS)
}

/// Pearson correlation of daily returns for every pair of tickers, over the
/// rows of `matrix` dated on or after `window_start(today)`.
///
/// The diagonal is exactly 1.0 and the matrix is mirrored from its upper
/// triangle. A pair where either side never moves gets 0.0. With fewer than
/// two tickers or fewer than two returns the result is empty.
pub fn compute_correlation_matrix(matrix: &AlignedMatrix, today: NaiveDate) -> CorrelationMatrix {
    if matrix.ncols() < 2 {
        return CorrelationMatrix::empty();
    }
    let Some(window) = matrix.since(window_start(today)) else {
        return CorrelationMatrix::empty();
    };
    if window.nrows() < 3 {
        debug!("Correlation window has {} rows - not enough returns", window.nrows());
        return CorrelationMatrix::empty();
    }

    let returns: Vec<Vec<f64>> = window
        .values()
        .columns()
        .into_iter()
        .map(|col| daily_returns(&col.to_vec()))
        .collect();

    let n = window.ncols();
    let mut correlations = vec![vec![0.0; n]; n];
    for i in 0..n {
        correlations[i][i] = 1.0;
        for j in (i + 1)..n {
            let c = pearson(&returns[i], &returns[j]).unwrap_or(0.0);
            correlations[i][j] = c;
            correlations[j][i] = c;
        }
    }

    CorrelationMatrix {
        tickers: window.tickers().to_vec(),
        correlations,
    }
}

/// Summary of the off-diagonal pairs; `None` when there are no pairs.
pub fn calculate_correlation_statistics(matrix: &CorrelationMatrix) -> Option<CorrelationStatistics> {
    let n = matrix.tickers.len();
    let correlations: Vec<f64> = (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .map(|(i, j)| matrix.correlations[i][j])
        .collect();

    if correlations.is_empty() {
        return None;
    }

    let count = correlations.len() as f64;
    let average_correlation = correlations.iter().sum::<f64>() / count;
    let max_correlation = correlations.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min_correlation = correlations.iter().cloned().fold(f64::INFINITY, f64::min);
    let high_correlation_pairs = correlations
        .iter()
        .filter(|&&c| c > HIGH_CORRELATION_THRESHOLD)
        .count();

    Some(CorrelationStatistics {
        average_correlation,
        max_correlation,
        min_correlation,
        high_correlation_pairs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PricePoint, PriceSeries};
    use crate::services::alignment::align;
    use std::collections::HashMap;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn series(ticker: &str, closes: &[f64]) -> PriceSeries {
        let start = today() - Duration::days(closes.len() as i64);
        PriceSeries::from_points(
            ticker,
            closes
                .iter()
                .enumerate()
                .map(|(i, c)| PricePoint::new(start + Duration::days(i as i64), *c))
                .collect(),
        )
    }

    fn matrix(list: Vec<PriceSeries>) -> AlignedMatrix {
        let order: Vec<String> = list.iter().map(|s| s.ticker().to_string()).collect();
        let map: HashMap<String, PriceSeries> =
            list.into_iter().map(|s| (s.ticker().to_string(), s)).collect();
        align(&map, &order).into_matrix().unwrap()
    }

    #[test]
    fn test_matrix_is_symmetric_with_unit_diagonal() {
        let m = matrix(vec![
            series("A", &[10.0, 11.0, 10.5, 12.0, 11.8, 12.5]),
            series("B", &[20.0, 21.0, 21.5, 22.5, 22.0, 23.5]),
            series("C", &[5.0, 4.8, 5.1, 4.7, 4.9, 4.6]),
        ]);

        let result = compute_correlation_matrix(&m, today());

        assert_eq!(result.tickers, vec!["A", "B", "C"]);
        for i in 0..3 {
            assert_eq!(result.correlations[i][i], 1.0);
            for j in 0..3 {
                assert_eq!(result.correlations[i][j], result.correlations[j][i]);
                assert!(result.correlations[i][j].abs() <= 1.0);
            }
        }
    }

    #[test]
    fn test_single_ticker_is_empty() {
        let m = matrix(vec![series("A", &[10.0, 11.0, 12.0, 13.0])]);
        assert_eq!(compute_correlation_matrix(&m, today()), CorrelationMatrix::empty());
    }

    #[test]
    fn test_flat_series_correlates_zero() {
        let m = matrix(vec![
            series("A", &[10.0, 11.0, 10.5, 12.0]),
            series("FLAT", &[7.0, 7.0, 7.0, 7.0]),
        ]);

        let result = compute_correlation_matrix(&m, today());
        assert_eq!(result.get("A", "FLAT"), Some(0.0));
        assert_eq!(result.get("FLAT", "FLAT"), Some(1.0));
    }

    #[test]
    fn test_window_excludes_old_rows() {
        // Perfectly correlated inside the window, anti-correlated long before it
        let start = today() - Duration::days(400);
        let mut a = Vec::new();
        let mut b = Vec::new();
        for i in 0..400 {
            let date = start + Duration::days(i);
            let recent = date >= window_start(today());
            let wiggle = if i % 2 == 0 { 1.0 } else { -1.0 };
            a.push(PricePoint::new(date, 100.0 + wiggle));
            b.push(PricePoint::new(date, if recent { 50.0 + wiggle } else { 50.0 - wiggle }));
        }
        let m = matrix(vec![PriceSeries::from_points("A", a), PriceSeries::from_points("B", b)]);

        let result = compute_correlation_matrix(&m, today());
        assert!((result.get("A", "B").unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_statistics_over_pairs() {
        let matrix = CorrelationMatrix {
            tickers: vec!["A".into(), "B".into(), "C".into()],
            correlations: vec![
                vec![1.0, 0.9, 0.1],
                vec![0.9, 1.0, -0.4],
                vec![0.1, -0.4, 1.0],
            ],
        };

        let stats = calculate_correlation_statistics(&matrix).unwrap();
        assert!((stats.average_correlation - 0.2).abs() < 1e-12);
        assert_eq!(stats.max_correlation, 0.9);
        assert_eq!(stats.min_correlation, -0.4);
        assert_eq!(stats.high_correlation_pairs, 1);

        assert_eq!(calculate_correlation_statistics(&CorrelationMatrix::empty()), None);
    }
}
