//! Nifty dashboard HTTP API.
//!
//! Thin JSON layer over the watchlist store, the dashboard orchestrator and
//! the per-session UI state.

pub mod config;
pub mod index_routes;
pub mod news_routes;
pub mod request_id;
pub mod session;
pub mod session_routes;
pub mod stock_routes;
pub mod watchlist_routes;

#[cfg(test)]
mod router_tests;

use anyhow::Context;
use axum::{
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Duration;
use dashboard_orchestrator::DashboardOrchestrator;
use market_core::{HistorySource, MarketDataError, NewsSource, QuoteSource};
use news_client::NewsApiClient;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use watchlist_store::{WatchlistError, WatchlistStore};
use yahoo_client::YahooFinanceClient;

use config::{LogFormat, ServerConfig};
use session::SessionRegistry;

const CACHE_PURGE_INTERVAL_SECS: u64 = 600;

/// Standard response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Handler error carrying the HTTP status to answer with.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, anyhow::anyhow!(message.into()))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, anyhow::anyhow!(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed ({}): {:#}", self.status, self.error);
        } else {
            tracing::warn!("Request rejected ({}): {:#}", self.status, self.error);
        }
        let body = ApiResponse::<()>::error(format!("{:#}", self.error));
        (self.status, Json(body)).into_response()
    }
}

/// Map a market data failure onto the status the client sees.
pub fn market_error(e: MarketDataError) -> AppError {
    let status = match &e {
        MarketDataError::InvalidData(_) => StatusCode::BAD_REQUEST,
        MarketDataError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        MarketDataError::QuoteUnavailable(_)
        | MarketDataError::ApiError(_)
        | MarketDataError::InsufficientData(_) => StatusCode::BAD_GATEWAY,
    };
    AppError::with_status(status, e.into())
}

pub fn watchlist_error(e: WatchlistError) -> AppError {
    let status = if e.is_persistence() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::BAD_REQUEST
    };
    AppError::with_status(status, e.into())
}

/// The watchlist together with the problem hit while loading it, if any.
pub struct WatchlistState {
    pub store: WatchlistStore,
    /// Cleared once a mutation has rewritten the file.
    pub load_warning: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub orchestrator: Arc<DashboardOrchestrator>,
    pub quotes: Arc<dyn QuoteSource>,
    pub watchlist: Arc<Mutex<WatchlistState>>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        history: Arc<dyn HistorySource>,
        quotes: Arc<dyn QuoteSource>,
        news: Arc<dyn NewsSource>,
    ) -> Self {
        let (store, load_error) = WatchlistStore::load_or_empty(&config.watchlist_path);
        let store = store.with_exchange(config.exchange);

        let orchestrator = DashboardOrchestrator::new(history, quotes.clone(), news)
            .with_exchange(config.exchange)
            .with_cache_ttl(Duration::seconds(config.cache_ttl_secs));

        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            quotes,
            watchlist: Arc::new(Mutex::new(WatchlistState {
                store,
                load_warning: load_error.map(|e| e.to_string()),
            })),
            sessions: Arc::new(SessionRegistry::new()),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health_check))
        .merge(index_routes::index_routes())
        .merge(stock_routes::stock_routes())
        .merge(watchlist_routes::watchlist_routes())
        .merge(news_routes::news_routes())
        .merge(session_routes::session_routes())
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    exchange: String,
    watchlist_entries: usize,
}

async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<ApiResponse<HealthResponse>> {
    let watchlist_entries = state.watchlist.lock().await.store.len();
    Json(ApiResponse::success(HealthResponse {
        status: "ok",
        exchange: state.config.exchange.to_string(),
        watchlist_entries,
    }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(allowed))
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env()?;
    init_tracing(config.log_format);

    let yahoo = Arc::new(YahooFinanceClient::with_rate_limit(config.yahoo_rate_limit));
    let news = Arc::new(NewsApiClient::new(config.news_api_key.clone()));
    if !news.is_configured() {
        tracing::warn!("NEWS_API_KEY not set, news endpoints will answer 503");
    }

    let state = AppState::new(config, yahoo.clone(), yahoo, news);
    if let Some(warning) = &state.watchlist.lock().await.load_warning {
        tracing::warn!("Starting with an empty watchlist: {}", warning);
    }

    let orchestrator = state.orchestrator.clone();
    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(CACHE_PURGE_INTERVAL_SECS));
        loop {
            interval.tick().await;
            let purged = orchestrator.purge_expired();
            if purged > 0 {
                tracing::debug!("Purged {} expired cache entries", purged);
            }
            let evicted = sessions.evict_idle();
            if evicted > 0 {
                tracing::debug!("Evicted {} idle sessions", evicted);
            }
        }
    });

    let addr = state.config.bind_addr();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
