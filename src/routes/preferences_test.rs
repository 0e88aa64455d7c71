use axum::body::{Body, to_bytes};
use axum::http::{Method, Request};
use tower::ServiceExt;

use super::*;
use crate::routes::app;
use crate::services::persistence::Record;
use crate::state::test_helpers::*;

async fn put_json(state: &AppState, uri: &str, json: serde_json::Value) -> axum::response::Response {
    let request = Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap();
    app(state.clone()).oneshot(request).await.unwrap()
}

async fn get_preferences_json(state: &AppState) -> serde_json::Value {
    let request = Request::builder()
        .uri("/api/preferences")
        .body(Body::empty())
        .unwrap();
    let response = app(state.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn defaults_are_light_with_open_sidebar() {
    let (state, _dir) = test_app_state();
    let prefs = get_preferences_json(&state).await;
    assert_eq!(prefs["dark_mode"], false);
    assert_eq!(prefs["sidebar_open"], true);
    assert_eq!(prefs["loading"]["messages"], false);
}

#[tokio::test]
async fn update_preferences_applies_subset() {
    let (state, _dir) = test_app_state();
    let response = put_json(&state, "/api/preferences", serde_json::json!({ "dark_mode": true })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let prefs = get_preferences_json(&state).await;
    assert_eq!(prefs["dark_mode"], true);
    assert_eq!(prefs["sidebar_open"], true);
    assert!(state.persist.is_dirty(Record::Ui));

    put_json(&state, "/api/preferences", serde_json::json!({ "sidebar_open": false })).await;
    let prefs = get_preferences_json(&state).await;
    assert_eq!(prefs["dark_mode"], true);
    assert_eq!(prefs["sidebar_open"], false);
}

#[tokio::test]
async fn set_loading_by_key() {
    let (state, _dir) = test_app_state();
    let response = put_json(&state, "/api/loading/chatrooms", serde_json::json!({ "value": true })).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(state.ui.read().await.loading.chatrooms);
}

#[tokio::test]
async fn unknown_loading_key_is_bad_request() {
    let (state, _dir) = test_app_state();
    let response = put_json(&state, "/api/loading/uploads", serde_json::json!({ "value": true })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn toggle_dark_mode_flips() {
    let (state, _dir) = test_app_state();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/preferences/dark-mode/toggle")
        .body(Body::empty())
        .unwrap();
    let response = app(state.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: DarkModeResponse = serde_json::from_slice(&bytes).unwrap();
    assert!(body.dark_mode);
    assert!(state.ui.read().await.dark_mode);
}

#[tokio::test]
async fn get_loading_reads_flag() {
    let (state, _dir) = test_app_state();
    put_json(&state, "/api/loading/auth", serde_json::json!({ "value": true })).await;

    let request = Request::builder()
        .uri("/api/loading/auth")
        .body(Body::empty())
        .unwrap();
    let response = app(state.clone()).oneshot(request).await.unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: LoadingResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.key, LoadingKey::Auth);
    assert!(body.value);
}
