use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use market_core::NewsArticle;

use crate::{market_error, ApiResponse, AppError, AppState};

pub fn news_routes() -> Router<AppState> {
    Router::new().route("/api/news/:symbol", get(get_news))
}

/// Latest headlines for `symbol`, at most five. 503 when no news API key is set.
async fn get_news(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<Vec<NewsArticle>>>, AppError> {
    let articles = state
        .orchestrator
        .news(&symbol)
        .await
        .map_err(market_error)?;
    Ok(Json(ApiResponse::success(articles)))
}
