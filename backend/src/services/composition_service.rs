use std::collections::HashMap;

use crate::models::{Allocation, CompositionBucket, CompositionResponse, Fundamentals};

pub const US: &str = "US";
pub const INTERNATIONAL_DEVELOPED: &str = "International Developed";
pub const EMERGING_MARKETS: &str = "Emerging Markets";
pub const UNKNOWN: &str = "Unknown";

pub const MEGA_CAP: &str = "Mega Cap";
pub const LARGE_CAP: &str = "Large Cap";
pub const MID_CAP: &str = "Mid Cap";
pub const SMALL_CAP: &str = "Small Cap";

const MEGA_CAP_MIN: f64 = 200_000_000_000.0;
const LARGE_CAP_MIN: f64 = 10_000_000_000.0;
const MID_CAP_MIN: f64 = 2_000_000_000.0;

const EMERGING_MARKET_COUNTRIES: &[&str] = &[
    "China",
    "India",
    "Brazil",
    "Russia",
    "South Africa",
    "Mexico",
    "Indonesia",
    "Turkey",
    "Saudi Arabia",
    "Thailand",
    "Malaysia",
    "Philippines",
    "Chile",
    "Colombia",
    "Peru",
    "Egypt",
    "Poland",
    "Hungary",
    "Czech Republic",
    "Qatar",
    "United Arab Emirates",
    "Kuwait",
    "Greece",
    "Taiwan",
    "South Korea",
];

pub fn classify_geography(country: Option<&str>) -> &'static str {
    match country.map(str::trim) {
        None | Some("") => UNKNOWN,
        Some("United States") => US,
        Some(c) if EMERGING_MARKET_COUNTRIES.contains(&c) => EMERGING_MARKETS,
        Some(_) => INTERNATIONAL_DEVELOPED,
    }
}

pub fn classify_market_cap(market_cap: Option<f64>) -> &'static str {
    match market_cap {
        Some(cap) if cap >= MEGA_CAP_MIN => MEGA_CAP,
        Some(cap) if cap >= LARGE_CAP_MIN => LARGE_CAP,
        Some(cap) if cap >= MID_CAP_MIN => MID_CAP,
        Some(cap) if cap > 0.0 => SMALL_CAP,
        _ => UNKNOWN,
    }
}

/// Geography and market-cap breakdown of the raw allocation weights.
///
/// A ticker without fundamentals puts its whole weight into `Unknown` in
/// both taxonomies, so each side sums to the total input weight.
pub fn compute_composition(
    allocations: &[Allocation],
    fundamentals: &HashMap<String, Fundamentals>,
) -> CompositionResponse {
    let mut geography: HashMap<&'static str, f64> = HashMap::new();
    let mut market_cap: HashMap<&'static str, f64> = HashMap::new();

    for allocation in allocations {
        let info = fundamentals.get(&allocation.ticker);
        let region = classify_geography(info.and_then(|f| f.country.as_deref()));
        let tier = classify_market_cap(info.and_then(|f| f.market_cap));

        *geography.entry(region).or_default() += allocation.weight_percent;
        *market_cap.entry(tier).or_default() += allocation.weight_percent;
    }

    CompositionResponse {
        geography: into_buckets(geography),
        market_cap: into_buckets(market_cap),
    }
}

fn into_buckets(totals: HashMap<&'static str, f64>) -> Vec<CompositionBucket> {
    let mut buckets: Vec<CompositionBucket> = totals
        .into_iter()
        .map(|(name, value)| CompositionBucket {
            name: name.to_string(),
            value,
        })
        .collect();

    buckets.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    buckets
}
