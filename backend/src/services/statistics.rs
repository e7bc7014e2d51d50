//! Small sample-statistics helpers shared by the calculators.
//!
//! Every function returns `None` instead of NaN when the input is too short.

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Below this a variance or deviation is treated as zero.
pub const ZERO_TOLERANCE: f64 = f64::EPSILON;

/// Simple returns `v[t] / v[t-1] - 1` for consecutive levels.
pub fn daily_returns(levels: &[f64]) -> Vec<f64> {
    levels
        .windows(2)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance (n - 1 denominator).
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss = values.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    Some(ss / (values.len() as f64 - 1.0))
}

pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// Sample covariance of two equally long series.
pub fn sample_covariance(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let (ma, mb) = (mean(a)?, mean(b)?);
    let sum = a
        .iter()
        .zip(b.iter())
        .fold(0.0, |acc, (x, y)| acc + (x - ma) * (y - mb));
    Some(sum / (a.len() as f64 - 1.0))
}

/// Pearson correlation; `None` when either side has no variance.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let cov = sample_covariance(a, b)?;
    let sa = sample_std_dev(a)?;
    let sb = sample_std_dev(b)?;
    if sa < ZERO_TOLERANCE || sb < ZERO_TOLERANCE {
        return None;
    }
    Some((cov / (sa * sb)).clamp(-1.0, 1.0))
}
