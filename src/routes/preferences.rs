//! UI preference and loading-flag routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use crate::services::preferences::{self, LoadingKey, UiState};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UpdatePreferencesBody {
    pub dark_mode: Option<bool>,
    pub sidebar_open: Option<bool>,
}

#[derive(Deserialize)]
pub struct LoadingBody {
    pub value: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoadingResponse {
    pub key: LoadingKey,
    pub value: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DarkModeResponse {
    pub dark_mode: bool,
}

/// `GET /api/preferences` — current UI preferences and loading flags.
pub async fn get_preferences(State(state): State<AppState>) -> Json<UiState> {
    Json(preferences::get_preferences(&state).await)
}

/// `PUT /api/preferences` — update any subset of the preferences.
pub async fn update_preferences(
    State(state): State<AppState>,
    Json(body): Json<UpdatePreferencesBody>,
) -> Json<UiState> {
    if let Some(dark_mode) = body.dark_mode {
        preferences::set_dark_mode(&state, dark_mode).await;
    }
    if let Some(open) = body.sidebar_open {
        preferences::set_sidebar_open(&state, open).await;
    }
    Json(preferences::get_preferences(&state).await)
}

/// `POST /api/preferences/dark-mode/toggle` — flip dark mode.
pub async fn toggle_dark_mode(State(state): State<AppState>) -> Json<DarkModeResponse> {
    Json(DarkModeResponse { dark_mode: preferences::toggle_dark_mode(&state).await })
}

/// `GET /api/loading/:key` — read one named loading flag.
pub async fn get_loading(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<LoadingResponse>, StatusCode> {
    let key = LoadingKey::from_str(&key).ok_or(StatusCode::BAD_REQUEST)?;
    let value = state.ui.read().await.loading.get(key);
    Ok(Json(LoadingResponse { key, value }))
}

/// `PUT /api/loading/:key` — set one named loading flag.
pub async fn set_loading(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(body): Json<LoadingBody>,
) -> StatusCode {
    let Some(key) = LoadingKey::from_str(&key) else {
        return StatusCode::BAD_REQUEST;
    };
    preferences::set_loading(&state, key, body.value).await;
    StatusCode::NO_CONTENT
}

#[cfg(test)]
#[path = "preferences_test.rs"]
mod tests;
