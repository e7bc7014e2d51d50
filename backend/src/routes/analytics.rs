use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::info;

use crate::errors::AppError;
use crate::models::{
    AnalyticsRequest, CompositionResponse, CorrelationMatrix, DividendSummary,
    PerformanceResponse, PortfolioSummary, RiskMetrics,
};
use crate::services::analytics_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/performance", post(get_performance))
        .route("/risk", post(get_risk))
        .route("/correlation", post(get_correlation))
        .route("/composition", post(get_composition))
        .route("/dividends", post(get_dividends))
        .route("/summary", post(get_summary))
}

/// Unwrap and validate the body shared by every endpoint.
fn accept(
    endpoint: &str,
    body: Result<Json<AnalyticsRequest>, JsonRejection>,
) -> Result<AnalyticsRequest, AppError> {
    let Json(request) = body?;
    request.validate()?;
    info!(
        "POST /api/analytics/{} - {} allocations, period {}",
        endpoint,
        request.allocations.len(),
        request.time_period.as_str()
    );
    Ok(request)
}

async fn get_performance(
    State(state): State<AppState>,
    body: Result<Json<AnalyticsRequest>, JsonRejection>,
) -> Result<Json<PerformanceResponse>, AppError> {
    let request = accept("performance", body)?;
    Ok(Json(analytics_service::get_performance(&state.history, &state.config, &request).await))
}

async fn get_risk(
    State(state): State<AppState>,
    body: Result<Json<AnalyticsRequest>, JsonRejection>,
) -> Result<Json<RiskMetrics>, AppError> {
    let request = accept("risk", body)?;
    Ok(Json(analytics_service::get_risk(&state.history, &state.config, &request).await))
}

async fn get_correlation(
    State(state): State<AppState>,
    body: Result<Json<AnalyticsRequest>, JsonRejection>,
) -> Result<Json<CorrelationMatrix>, AppError> {
    let request = accept("correlation", body)?;
    Ok(Json(analytics_service::get_correlation(&state.history, &state.config, &request).await))
}

async fn get_composition(
    State(state): State<AppState>,
    body: Result<Json<AnalyticsRequest>, JsonRejection>,
) -> Result<Json<CompositionResponse>, AppError> {
    let request = accept("composition", body)?;
    Ok(Json(analytics_service::get_composition(&state.history, &state.config, &request).await))
}

async fn get_dividends(
    State(state): State<AppState>,
    body: Result<Json<AnalyticsRequest>, JsonRejection>,
) -> Result<Json<DividendSummary>, AppError> {
    let request = accept("dividends", body)?;
    Ok(Json(analytics_service::get_dividends(&state.history, &state.config, &request).await))
}

async fn get_summary(
    State(state): State<AppState>,
    body: Result<Json<AnalyticsRequest>, JsonRejection>,
) -> Result<Json<PortfolioSummary>, AppError> {
    let request = accept("summary", body)?;
    Ok(Json(analytics_service::get_summary(&state.history, &state.config, &request).await))
}
