use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset. Provider HTTP chatter stays at warn.
const DEFAULT_FILTER: &str = "info,hyper=warn,reqwest=warn";

/// Where and how this service logs.
///
/// Read from `RUST_LOG`, `SERVICE_NAME`, `ENVIRONMENT`, and, when
/// `LOKI_ENABLED=true`, `LOKI_URL`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: String,
    pub service_name: String,
    pub environment: String,
    /// Loki push endpoint; `None` means console only
    pub loki_url: Option<url::Url>,
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, String> {
        let env_or = |key: &str, default: &str| {
            std::env::var(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let loki_enabled = env_or("LOKI_ENABLED", "false").eq_ignore_ascii_case("true");
        let loki_url = if loki_enabled {
            let raw = std::env::var("LOKI_URL")
                .map_err(|_| "LOKI_ENABLED is true but LOKI_URL is not set".to_string())?;
            Some(parse_loki_url(&raw)?)
        } else {
            None
        };

        Ok(Self {
            filter: env_or("RUST_LOG", DEFAULT_FILTER),
            service_name: env_or("SERVICE_NAME", "rustfolio-analytics"),
            environment: env_or("ENVIRONMENT", "development"),
            loki_url,
        })
    }

    fn env_filter(&self) -> Result<EnvFilter, String> {
        EnvFilter::try_new(&self.filter).map_err(|e| format!("invalid RUST_LOG '{}': {e}", self.filter))
    }
}

fn parse_loki_url(raw: &str) -> Result<url::Url, String> {
    url::Url::parse(raw.trim()).map_err(|e| format!("invalid LOKI_URL '{raw}': {e}"))
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(config: LoggingConfig) -> Result<(), String> {
    let filter = config.env_filter()?;
    let fmt = tracing_subscriber::fmt::layer().with_target(false);

    #[cfg(feature = "loki")]
    {
        if let Some(url) = config.loki_url.clone() {
            let (loki_layer, task) = tracing_loki::builder()
                .label("service", &config.service_name)
                .and_then(|b| b.label("environment", &config.environment))
                .and_then(|b| b.build_url(url.clone()))
                .map_err(|e| format!("failed to build Loki layer: {e}"))?;

            // Ships buffered events to Loki in the background
            tokio::spawn(task);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt)
                .with(loki_layer)
                .try_init()
                .map_err(|e| e.to_string())?;

            tracing::info!("✅ Logging to console and Loki at {} as {}", url, config.service_name);
            return Ok(());
        }
    }

    #[cfg(not(feature = "loki"))]
    {
        if config.loki_url.is_some() {
            eprintln!("LOKI_ENABLED is set but the binary was built without the `loki` feature");
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt)
        .try_init()
        .map_err(|e| e.to_string())?;

    tracing::info!(
        "📊 Console logging for {} ({}) with filter '{}'",
        config.service_name,
        config.environment,
        config.filter
    );
    Ok(())
}
