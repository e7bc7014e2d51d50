use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single daily close as returned by a market data provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Daily close history for one ticker.
///
/// `dates` is strictly ascending and `closes` has the same length with only
/// positive, finite values. The only way to build one is through
/// [`PriceSeries::from_points`], which enforces both.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    ticker: String,
    dates: Vec<NaiveDate>,
    closes: Vec<f64>,
}

impl PriceSeries {
    /// Sort by date, drop unusable closes, and keep the last value for any
    /// duplicated date.
    pub fn from_points(ticker: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.retain(|p| p.close.is_finite() && p.close > 0.0);
        points.sort_by_key(|p| p.date);

        let mut dates: Vec<NaiveDate> = Vec::with_capacity(points.len());
        let mut closes: Vec<f64> = Vec::with_capacity(points.len());
        for p in points {
            if dates.last() == Some(&p.date) {
                if let Some(last) = closes.last_mut() {
                    *last = p.close;
                }
                continue;
            }
            dates.push(p.date);
            closes.push(p.close);
        }

        Self {
            ticker: ticker.into(),
            dates,
            closes,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_from_points_sorts_and_dedups() {
        let series = PriceSeries::from_points(
            "AAPL",
            vec![
                PricePoint::new(d("2024-01-03"), 102.0),
                PricePoint::new(d("2024-01-02"), 100.0),
                PricePoint::new(d("2024-01-03"), 103.0),
            ],
        );

        assert_eq!(series.dates(), &[d("2024-01-02"), d("2024-01-03")]);
        assert_eq!(series.closes(), &[100.0, 103.0]);
    }

    #[test]
    fn test_from_points_drops_bad_closes() {
        let series = PriceSeries::from_points(
            "AAPL",
            vec![
                PricePoint::new(d("2024-01-02"), 0.0),
                PricePoint::new(d("2024-01-03"), f64::NAN),
                PricePoint::new(d("2024-01-04"), -5.0),
                PricePoint::new(d("2024-01-05"), 10.0),
            ],
        );

        assert_eq!(series.len(), 1);
        assert_eq!(series.first_date(), Some(d("2024-01-05")));
    }
}
