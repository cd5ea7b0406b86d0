// src/api/types.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::session::SessionInfo;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub active_sessions: usize,
}

/// One active session as exposed over HTTP.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub user_id: String,
    pub username: String,
    pub event_id: String,
    pub start_time: DateTime<Utc>,
    pub location: String,
}

impl From<SessionInfo> for SessionView {
    fn from(info: SessionInfo) -> Self {
        Self {
            user_id: info.user_id,
            username: info.username,
            event_id: info.event_id,
            start_time: info.start_time,
            location: info.location.name().to_string(),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
