//! Refresh trigger and status handlers

use axum::{extract::State, response::IntoResponse};

use crate::web::{
    responses::{accepted, ok},
    AppState,
};

/// Start a background refresh. Always 202; the body says whether a new run
/// was started or one was already in flight.
pub async fn trigger_refresh(State(state): State<AppState>) -> impl IntoResponse {
    accepted(state.refresh.trigger().await)
}

pub async fn refresh_status(State(state): State<AppState>) -> impl IntoResponse {
    ok(state.refresh.status().await)
}
