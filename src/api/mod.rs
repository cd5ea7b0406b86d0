// src/api/mod.rs — Lightweight HTTP API exposing bot health and sessions

pub mod handlers;
pub mod types;

use axum::routing::get;
use axum::Router;

use crate::infra::config::ApiConfig;
use crate::session::SessionRegistry;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub registry: SessionRegistry,
}

/// Build the axum router with all API routes.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/sessions", get(handlers::list_sessions))
        .route("/api/v1/sessions/{user_id}", get(handlers::get_session))
        .with_state(state)
}

/// Start the API server (runs until the process exits).
pub async fn start_server(config: &ApiConfig, state: ApiState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.bind, config.port);

    let router = build_router(state);

    tracing::info!("API server listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Location, Session};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    fn test_state() -> ApiState {
        ApiState {
            registry: SessionRegistry::new(),
        }
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (status, body) = get_json(build_router(test_state()), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["active_sessions"], 0);
    }

    #[tokio::test]
    async fn test_sessions_endpoint_lists_active_sessions() {
        let state = test_state();
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap();
        state
            .registry
            .create(Session::new("42", "alice", "evt-1", start, Location::McGill))
            .unwrap();

        let (_, health) = get_json(build_router(state.clone()), "/api/v1/health").await;
        assert_eq!(health["active_sessions"], 1);

        let (status, body) = get_json(build_router(state), "/api/v1/sessions").await;
        assert_eq!(status, StatusCode::OK);
        let sessions = body.as_array().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0]["username"], "alice");
        assert_eq!(sessions[0]["location"], "McGill");
        assert_eq!(sessions[0]["start_time"], "2026-03-02T09:30:00Z");
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let (status, body) = get_json(build_router(test_state()), "/api/v1/sessions/nobody").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("nobody"));
    }
}
