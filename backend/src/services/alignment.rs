use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use ndarray::{s, Array2, ArrayView1};

use crate::models::PriceSeries;

/// Closes for several tickers on one shared, ascending date index.
///
/// Rows are dates, columns are tickers. Every cell holds a positive close:
/// gaps are forward-filled from the previous observation, and dates before
/// a ticker's first observation carry its first known close.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedMatrix {
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    values: Array2<f64>,
}

/// Alignment either produces a matrix or says explicitly that nothing came back.
#[derive(Debug, Clone, PartialEq)]
pub enum Alignment {
    Aligned(AlignedMatrix),
    Empty,
}

impl Alignment {
    pub fn matrix(&self) -> Option<&AlignedMatrix> {
        match self {
            Alignment::Aligned(m) => Some(m),
            Alignment::Empty => None,
        }
    }

    pub fn into_matrix(self) -> Option<AlignedMatrix> {
        match self {
            Alignment::Aligned(m) => Some(m),
            Alignment::Empty => None,
        }
    }
}

impl AlignedMatrix {
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn nrows(&self) -> usize {
        self.dates.len()
    }

    pub fn ncols(&self) -> usize {
        self.tickers.len()
    }

    pub fn column(&self, ticker: &str) -> Option<ArrayView1<'_, f64>> {
        let idx = self.tickers.iter().position(|t| t == ticker)?;
        Some(self.values.column(idx))
    }

    /// Rows dated on or after `start`; `None` if no row qualifies.
    pub fn since(&self, start: NaiveDate) -> Option<AlignedMatrix> {
        let first = self.dates.iter().position(|d| *d >= start)?;
        Some(AlignedMatrix {
            dates: self.dates[first..].to_vec(),
            tickers: self.tickers.clone(),
            values: self.values.slice(s![first.., ..]).to_owned(),
        })
    }
}

/// Put every fetched series on the union of their dates.
///
/// Columns follow `order`; tickers present in `series` but missing from
/// `order` are appended alphabetically. Series with no observations are
/// skipped. Returns [`Alignment::Empty`] when nothing is left.
pub fn align(series: &HashMap<String, PriceSeries>, order: &[String]) -> Alignment {
    let mut tickers: Vec<String> = Vec::with_capacity(series.len());
    for ticker in order {
        let has_data = series.get(ticker).is_some_and(|s| !s.is_empty());
        if has_data && !tickers.contains(ticker) {
            tickers.push(ticker.clone());
        }
    }
    let mut extra: Vec<String> = series
        .iter()
        .filter(|(t, s)| !s.is_empty() && !tickers.contains(*t))
        .map(|(t, _)| t.clone())
        .collect();
    extra.sort();
    tickers.extend(extra);

    if tickers.is_empty() {
        return Alignment::Empty;
    }

    let dates: Vec<NaiveDate> = tickers
        .iter()
        .flat_map(|t| series[t].dates().iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut values = Array2::<f64>::zeros((dates.len(), tickers.len()));
    for (col, ticker) in tickers.iter().enumerate() {
        let s = &series[ticker];
        let filled = forward_fill(s.dates(), s.closes(), &dates);
        values.column_mut(col).assign(&ArrayView1::from(&filled[..]));
    }

    Alignment::Aligned(AlignedMatrix {
        dates,
        tickers,
        values,
    })
}

/// Sample `(dates, closes)` on `index`, carrying the latest known close
/// forward and the first close backward.
fn forward_fill(dates: &[NaiveDate], closes: &[f64], index: &[NaiveDate]) -> Vec<f64> {
    let first = closes.first().copied().unwrap_or_default();
    let mut out = Vec::with_capacity(index.len());
    let mut cursor = 0;
    let mut last: Option<f64> = None;

    for date in index {
        while cursor < dates.len() && dates[cursor] <= *date {
            last = Some(closes[cursor]);
            cursor += 1;
        }
        out.push(last.unwrap_or(first));
    }
    out
}
