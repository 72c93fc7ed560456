//! Index catalogue routes.

use axum::{extract::Path, routing::get, Json, Router};
use market_core::{IndexFilter, MarketIndex};
use serde::Serialize;

use crate::{market_error, ApiResponse, AppError, AppState};

#[derive(Serialize)]
pub struct IndexSummary {
    pub slug: &'static str,
    pub name: &'static str,
    pub constituents: usize,
}

#[derive(Serialize)]
pub struct IndexStocksResponse {
    pub index: String,
    pub symbols: Vec<&'static str>,
    pub default_symbol: Option<&'static str>,
}

pub fn index_routes() -> Router<AppState> {
    Router::new()
        .route("/api/indices", get(list_indices))
        .route("/api/indices/:index/stocks", get(index_stocks))
}

async fn list_indices() -> Json<ApiResponse<Vec<IndexSummary>>> {
    let indices = MarketIndex::ALL
        .iter()
        .map(|idx| IndexSummary {
            slug: idx.slug(),
            name: idx.display_name(),
            constituents: idx.constituents().len(),
        })
        .collect();
    Json(ApiResponse::success(indices))
}

/// `:index` is an index slug or `all`.
async fn index_stocks(
    Path(index): Path<String>,
) -> Result<Json<ApiResponse<IndexStocksResponse>>, AppError> {
    let filter: IndexFilter = index.parse().map_err(market_error)?;
    let index = match filter {
        IndexFilter::All => "all".to_string(),
        IndexFilter::Index(idx) => idx.slug().to_string(),
    };

    Ok(Json(ApiResponse::success(IndexStocksResponse {
        index,
        symbols: filter.symbols(),
        default_symbol: filter.default_symbol(),
    })))
}
