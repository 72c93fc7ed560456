//! Stock Routes
//!
//! Per-symbol overview, charts and indicator overlays, the multi-symbol
//! comparison and movement alerts, and cache invalidation.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use dashboard_orchestrator::{AlertReport, PriceComparison, PriceVolumeChart, StockOverview};
use market_core::HistoryRange;
use serde::{Deserialize, Serialize};
use technical_analysis::MovingAverageOverlay;

use crate::{market_error, ApiResponse, AppError, AppState};

const MAX_COMPARE_SYMBOLS: usize = 20;

#[derive(Deserialize)]
pub struct ChartQuery {
    pub range: Option<String>,
}

#[derive(Deserialize)]
pub struct CompareQuery {
    /// Comma separated symbols
    pub symbols: String,
}

#[derive(Deserialize)]
pub struct AlertsRequest {
    pub symbols: Vec<String>,
    #[serde(default = "default_threshold")]
    pub threshold_pct: f64,
}

fn default_threshold() -> f64 {
    5.0
}

#[derive(Serialize)]
pub struct CacheInvalidation {
    pub removed: usize,
}

pub fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/api/stocks/compare", get(compare_prices))
        .route("/api/stocks/alerts", post(movement_alerts))
        .route("/api/stocks/:symbol", get(get_overview))
        .route("/api/stocks/:symbol/chart", get(get_chart))
        .route("/api/stocks/:symbol/moving-averages", get(get_moving_averages))
        .route("/api/cache", delete(clear_cache))
        .route("/api/cache/:symbol", delete(invalidate_symbol))
}

async fn get_overview(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<StockOverview>>, AppError> {
    let overview = state
        .orchestrator
        .stock_overview(&symbol)
        .await
        .map_err(market_error)?;
    Ok(Json(ApiResponse::success(overview)))
}

/// `range` is `1d` (5-minute bars) or `1y` (daily bars, the default).
async fn get_chart(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<ApiResponse<PriceVolumeChart>>, AppError> {
    let range: HistoryRange = query
        .range
        .as_deref()
        .unwrap_or("1y")
        .parse()
        .map_err(market_error)?;

    let chart = state
        .orchestrator
        .chart(&symbol, range)
        .await
        .map_err(market_error)?;
    Ok(Json(ApiResponse::success(chart)))
}

async fn get_moving_averages(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<MovingAverageOverlay>>, AppError> {
    let overlay = state
        .orchestrator
        .moving_averages(&symbol)
        .await
        .map_err(market_error)?;
    Ok(Json(ApiResponse::success(overlay)))
}

async fn compare_prices(
    State(state): State<AppState>,
    Query(query): Query<CompareQuery>,
) -> Result<Json<ApiResponse<Vec<PriceComparison>>>, AppError> {
    let symbols: Vec<String> = query
        .symbols
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if symbols.is_empty() {
        return Err(AppError::bad_request("At least one symbol is required"));
    }
    if symbols.len() > MAX_COMPARE_SYMBOLS {
        return Err(AppError::bad_request(format!(
            "At most {} symbols can be compared",
            MAX_COMPARE_SYMBOLS
        )));
    }

    let comparisons = state.orchestrator.price_comparison(&symbols).await;
    Ok(Json(ApiResponse::success(comparisons)))
}

async fn movement_alerts(
    State(state): State<AppState>,
    Json(req): Json<AlertsRequest>,
) -> Result<Json<ApiResponse<AlertReport>>, AppError> {
    if req.symbols.is_empty() {
        return Err(AppError::bad_request("At least one symbol is required"));
    }

    let report = state
        .orchestrator
        .movement_alerts(&req.symbols, req.threshold_pct)
        .await
        .map_err(market_error)?;

    for alert in report.significant() {
        tracing::info!(
            "Significant movement in {}: {:?}% from low, {:?}% from high",
            alert.symbol,
            alert.gain_from_low_pct,
            alert.drop_from_high_pct
        );
    }

    Ok(Json(ApiResponse::success(report)))
}

async fn clear_cache(State(state): State<AppState>) -> Json<ApiResponse<CacheInvalidation>> {
    let removed = state.orchestrator.invalidate_all();
    Json(ApiResponse::success(CacheInvalidation { removed }))
}

async fn invalidate_symbol(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Json<ApiResponse<CacheInvalidation>> {
    let removed = state.orchestrator.invalidate(&symbol);
    Json(ApiResponse::success(CacheInvalidation { removed }))
}
