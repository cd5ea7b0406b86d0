// src/api/handlers.rs

use crate::api::{types::*, ApiState};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

/// GET /api/v1/health — Liveness plus the number of running sessions.
pub async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        active_sessions: state.registry.len(),
    })
}

/// GET /api/v1/sessions — Active sessions, oldest first.
pub async fn list_sessions(State(state): State<ApiState>) -> Json<Vec<SessionView>> {
    Json(
        state
            .registry
            .list()
            .into_iter()
            .map(SessionView::from)
            .collect(),
    )
}

/// GET /api/v1/sessions/:user_id — One user's active session.
pub async fn get_session(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> Result<Json<SessionView>, (StatusCode, Json<ErrorResponse>)> {
    state
        .registry
        .get(&user_id)
        .map(|info| Json(SessionView::from(info)))
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("No active session for user {user_id}"),
                }),
            )
        })
}
