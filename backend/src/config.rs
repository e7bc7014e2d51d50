use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set when PRICE_PROVIDER={1}")]
    Missing(&'static str, String),
}

/// Which market data backend to wire into the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Yahoo,
    AlphaVantage,
    Multi,
    Synthetic,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yahoo" => Ok(ProviderKind::Yahoo),
            "alphavantage" => Ok(ProviderKind::AlphaVantage),
            "multi" => Ok(ProviderKind::Multi),
            "synthetic" => Ok(ProviderKind::Synthetic),
            other => Err(format!(
                "unknown provider '{other}', expected yahoo, alphavantage, multi or synthetic"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    pub bind_addr: SocketAddr,
    pub provider: ProviderKind,
    pub alphavantage_api_key: Option<String>,
    pub default_benchmark: String,
    /// Annual risk-free rate as a fraction (0.02 = 2%)
    pub risk_free_rate: f64,
    pub max_concurrent_fetches: usize,
    /// 0 disables the per-minute limit
    pub requests_per_minute: u32,
    pub fetch_timeout: Duration,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            provider: ProviderKind::Multi,
            alphavantage_api_key: None,
            default_benchmark: "SPY".to_string(),
            risk_free_rate: 0.02,
            max_concurrent_fetches: 5,
            requests_per_minute: 0,
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

fn parse_var<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        _ => Ok(default),
    }
}

impl AnalyticsConfig {
    /// Read configuration from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            bind_addr: parse_var("BIND_ADDR", defaults.bind_addr)?,
            provider: parse_var("PRICE_PROVIDER", defaults.provider)?,
            alphavantage_api_key: std::env::var("ALPHAVANTAGE_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            default_benchmark: std::env::var("DEFAULT_BENCHMARK")
                .ok()
                .map(|b| b.trim().to_uppercase())
                .filter(|b| !b.is_empty())
                .unwrap_or(defaults.default_benchmark),
            risk_free_rate: parse_var("RISK_FREE_RATE", defaults.risk_free_rate)?,
            max_concurrent_fetches: parse_var("MAX_CONCURRENT_FETCHES", defaults.max_concurrent_fetches)?,
            requests_per_minute: parse_var("REQUESTS_PER_MINUTE", defaults.requests_per_minute)?,
            fetch_timeout: Duration::from_secs(parse_var("FETCH_TIMEOUT_SECS", 10u64)?),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.risk_free_rate.is_finite() || !(0.0..1.0).contains(&self.risk_free_rate) {
            return Err(ConfigError::Invalid {
                key: "RISK_FREE_RATE",
                value: self.risk_free_rate.to_string(),
                reason: "must be a fraction in [0, 1)".to_string(),
            });
        }
        if self.max_concurrent_fetches == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_CONCURRENT_FETCHES",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: "FETCH_TIMEOUT_SECS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if matches!(self.provider, ProviderKind::AlphaVantage | ProviderKind::Multi)
            && self.alphavantage_api_key.is_none()
        {
            let name = format!("{:?}", self.provider).to_lowercase();
            return Err(ConfigError::Missing("ALPHAVANTAGE_API_KEY", name));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parses_case_insensitively() {
        assert_eq!("Yahoo".parse::<ProviderKind>(), Ok(ProviderKind::Yahoo));
        assert_eq!("SYNTHETIC".parse::<ProviderKind>(), Ok(ProviderKind::Synthetic));
        assert!("bloomberg".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_multi_requires_api_key() {
        let config = AnalyticsConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::Missing(..))));

        let config = AnalyticsConfig {
            alphavantage_api_key: Some("demo".to_string()),
            ..AnalyticsConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let config = AnalyticsConfig {
            provider: ProviderKind::Synthetic,
            max_concurrent_fetches: 0,
            ..AnalyticsConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
