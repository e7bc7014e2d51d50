use std::sync::Arc;

use crate::config::AnalyticsConfig;
use crate::services::history_service::HistoricalDataService;

#[derive(Clone)]
pub struct AppState {
    pub history: Arc<HistoricalDataService>,
    pub config: Arc<AnalyticsConfig>,
}
