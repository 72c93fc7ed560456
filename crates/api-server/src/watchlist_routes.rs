//! Watchlist API Routes
//!
//! Valuation, add, remove and clear over the file-backed watchlist. Every
//! operation holds the store lock until its write has finished.

use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use watchlist_store::{ValuationRecord, WatchlistEntry};

use crate::{watchlist_error, ApiResponse, AppError, AppState};

#[derive(Deserialize)]
pub struct AddToWatchlistRequest {
    pub symbol: String,
    pub purchase_price: f64,
}

#[derive(Serialize)]
pub struct WatchlistResponse {
    pub entries: Vec<ValuationRecord>,
    /// Set when the watchlist file could not be loaded at startup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Serialize)]
pub struct RemovedResponse {
    pub symbol: String,
    pub removed: bool,
}

pub fn watchlist_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/watchlist",
            get(get_watchlist).post(add_to_watchlist).delete(clear_watchlist),
        )
        .route("/api/watchlist/:symbol", delete(remove_from_watchlist))
}

async fn get_watchlist(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<WatchlistResponse>>, AppError> {
    let watchlist = state.watchlist.lock().await;
    let entries = watchlist.store.valuate(state.quotes.as_ref()).await;

    Ok(Json(ApiResponse::success(WatchlistResponse {
        entries,
        warning: watchlist.load_warning.clone(),
    })))
}

async fn add_to_watchlist(
    State(state): State<AppState>,
    Json(req): Json<AddToWatchlistRequest>,
) -> Result<Json<ApiResponse<WatchlistEntry>>, AppError> {
    let mut watchlist = state.watchlist.lock().await;
    let entry = watchlist
        .store
        .add(&req.symbol, req.purchase_price, state.quotes.as_ref())
        .await
        .map_err(watchlist_error)?;
    watchlist.load_warning = None;

    Ok(Json(ApiResponse::success(entry)))
}

async fn remove_from_watchlist(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<RemovedResponse>>, AppError> {
    let mut watchlist = state.watchlist.lock().await;
    let removed = watchlist.store.remove(&symbol).map_err(watchlist_error)?;
    if !removed {
        return Err(AppError::not_found(format!(
            "{} is not in the watchlist",
            symbol.trim().to_uppercase()
        )));
    }
    watchlist.load_warning = None;

    Ok(Json(ApiResponse::success(RemovedResponse {
        symbol: symbol.trim().to_uppercase(),
        removed,
    })))
}

async fn clear_watchlist(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, AppError> {
    let mut watchlist = state.watchlist.lock().await;
    watchlist.store.clear().map_err(watchlist_error)?;
    watchlist.load_warning = None;

    Ok(Json(ApiResponse::success("Watchlist cleared".to_string())))
}
