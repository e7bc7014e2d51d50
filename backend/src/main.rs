use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;

use rustfolio_analytics::app;
use rustfolio_analytics::clock::{Clock, SystemClock};
use rustfolio_analytics::config::{AnalyticsConfig, ProviderKind};
use rustfolio_analytics::external::alphavantage::AlphaVantageProvider;
use rustfolio_analytics::external::market_data_provider::MarketDataProvider;
use rustfolio_analytics::external::multi_provider::MultiProvider;
use rustfolio_analytics::external::synthetic::SyntheticProvider;
use rustfolio_analytics::external::yahoo::YahooProvider;
use rustfolio_analytics::logging::{init_logging, LoggingConfig};
use rustfolio_analytics::services::failure_cache::FailureCache;
use rustfolio_analytics::services::history_service::HistoricalDataService;
use rustfolio_analytics::services::rate_limiter::RateLimiter;
use rustfolio_analytics::state::AppState;

const FAILURE_CACHE_SWEEP: Duration = Duration::from_secs(600);

fn build_provider(
    config: &AnalyticsConfig,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<Arc<dyn MarketDataProvider>> {
    let api_key = || {
        config
            .alphavantage_api_key
            .clone()
            .context("ALPHAVANTAGE_API_KEY is required for this provider")
    };

    let provider: Arc<dyn MarketDataProvider> = match config.provider {
        ProviderKind::Yahoo => {
            tracing::info!("📊 Using market data provider: Yahoo Finance only");
            Arc::new(YahooProvider::new())
        }
        ProviderKind::AlphaVantage => {
            tracing::info!("📊 Using market data provider: Alpha Vantage only");
            Arc::new(AlphaVantageProvider::new(api_key()?))
        }
        ProviderKind::Multi => {
            tracing::info!("📊 Using market data provider: Multi-provider (Yahoo + Alpha Vantage fallback)");
            Arc::new(MultiProvider::new(
                Box::new(YahooProvider::new()),
                Box::new(AlphaVantageProvider::new(api_key()?)),
            ))
        }
        ProviderKind::Synthetic => {
            tracing::info!("📊 Using market data provider: synthetic random walk");
            Arc::new(SyntheticProvider::new(clock))
        }
    };
    Ok(provider)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    let logging = LoggingConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    init_logging(logging).map_err(|e| anyhow::anyhow!("logging setup failed: {e}"))?;

    let config = AnalyticsConfig::from_env().context("invalid configuration")?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let provider = build_provider(&config, clock.clone())?;

    let failure_cache = FailureCache::new();
    let limiter = Arc::new(RateLimiter::new(
        config.max_concurrent_fetches,
        config.requests_per_minute,
    ));

    let history = HistoricalDataService::new(
        provider,
        limiter,
        failure_cache.clone(),
        clock.clone(),
        config.max_concurrent_fetches,
        config.fetch_timeout,
    );

    // Periodically drop expired failure entries
    {
        let failure_cache = failure_cache.clone();
        let clock = clock.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(FAILURE_CACHE_SWEEP);
            loop {
                interval.tick().await;
                failure_cache.cleanup_expired(clock.now());
            }
        });
    }

    let addr = config.bind_addr;
    let state = AppState {
        history: Arc::new(history),
        config: Arc::new(config),
    };
    let app = app::create_app(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("🚀 Rustfolio analytics running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
