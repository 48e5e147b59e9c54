//! HTTP request handlers.

use super::AppState;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};

pub async fn handle_status(State(state): State<AppState>) -> impl IntoResponse {
    let snapshots = state.snapshots.read().await;
    match &snapshots.status {
        Some(status) => Json(status.clone()).into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "No cycle has completed yet").into_response(),
    }
}

pub async fn handle_history(State(state): State<AppState>) -> impl IntoResponse {
    let snapshots = state.snapshots.read().await;
    match &snapshots.history {
        Some(history) => Json(history.clone()).into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "No cycle has completed yet").into_response(),
    }
}
