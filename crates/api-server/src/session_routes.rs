//! Session UI state routes.

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::session::{validate_session_id, DisplaySettings, Panel, SessionState, SymbolPanels};
use crate::{ApiResponse, AppError, AppState};

#[derive(Deserialize)]
pub struct SettingsRequest {
    pub auto_refresh: bool,
    pub refresh_interval_secs: u64,
}

#[derive(Serialize)]
pub struct PanelToggleResponse {
    pub symbol: String,
    pub panel: Panel,
    pub visible: bool,
    pub panels: SymbolPanels,
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sessions/:session_id", get(get_session))
        .route(
            "/api/sessions/:session_id/panels/:symbol/:panel/toggle",
            post(toggle_panel),
        )
        .route("/api/sessions/:session_id/settings", put(update_settings))
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<SessionState>>, AppError> {
    validate_session_id(&session_id).map_err(AppError::bad_request)?;
    Ok(Json(ApiResponse::success(state.sessions.get(&session_id))))
}

async fn toggle_panel(
    State(state): State<AppState>,
    Path((session_id, symbol, panel)): Path<(String, String, String)>,
) -> Result<Json<ApiResponse<PanelToggleResponse>>, AppError> {
    validate_session_id(&session_id).map_err(AppError::bad_request)?;
    let panel: Panel = panel.parse().map_err(AppError::bad_request)?;
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AppError::bad_request("Symbol must not be empty"));
    }

    let panels = state
        .sessions
        .toggle_panel(&session_id, &symbol, panel)
        .map_err(AppError::bad_request)?;
    Ok(Json(ApiResponse::success(PanelToggleResponse {
        visible: panels.is_visible(panel),
        symbol,
        panel,
        panels,
    })))
}

/// Interval outside 5..=60 seconds is clamped, not rejected.
async fn update_settings(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<SettingsRequest>,
) -> Result<Json<ApiResponse<DisplaySettings>>, AppError> {
    validate_session_id(&session_id).map_err(AppError::bad_request)?;
    let applied = state.sessions.update_settings(
        &session_id,
        DisplaySettings::new(req.auto_refresh, req.refresh_interval_secs),
    );
    Ok(Json(ApiResponse::success(applied)))
}
