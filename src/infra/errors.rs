// src/infra/errors.rs — Error types for worklog

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorklogError {
    // Google API errors (retriable depending on status)
    #[error("Google {service} error: {message}")]
    Google {
        service: String,
        message: String,
        retriable: bool,
    },

    #[error("Rate limited by Google {service}, retry after {retry_after_ms}ms")]
    RateLimited {
        service: String,
        retry_after_ms: u64,
    },

    // Credential errors (not retriable)
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WorklogError {
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            WorklogError::Google {
                retriable: true,
                ..
            } | WorklogError::RateLimited { .. }
        )
    }

    /// Map a failed HTTP response status onto an error for `service`.
    pub fn from_status(
        service: &str,
        status: reqwest::StatusCode,
        body: &str,
        retry_after_ms: Option<u64>,
    ) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return WorklogError::RateLimited {
                service: service.to_string(),
                retry_after_ms: retry_after_ms.unwrap_or(0),
            };
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return WorklogError::Auth(format!("{service} returned {status}: {body}"));
        }
        WorklogError::Google {
            service: service.to_string(),
            message: format!("HTTP {status}: {body}"),
            retriable: status.is_server_error(),
        }
    }

    /// Map a transport-level failure (no response) onto an error for `service`.
    pub fn from_transport(service: &str, err: reqwest::Error) -> Self {
        WorklogError::Google {
            service: service.to_string(),
            message: err.to_string(),
            retriable: err.is_timeout() || err.is_connect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_server_error_is_retriable() {
        let err = WorklogError::from_status("calendar", StatusCode::BAD_GATEWAY, "", None);
        assert!(err.is_retriable());
    }

    #[test]
    fn test_bad_request_not_retriable() {
        let err = WorklogError::from_status("sheets", StatusCode::BAD_REQUEST, "bad range", None);
        assert!(!err.is_retriable());
        assert!(err.to_string().contains("bad range"));
    }

    #[test]
    fn test_too_many_requests_is_rate_limited() {
        let err =
            WorklogError::from_status("calendar", StatusCode::TOO_MANY_REQUESTS, "", Some(2000));
        assert!(matches!(
            err,
            WorklogError::RateLimited {
                retry_after_ms: 2000,
                ..
            }
        ));
        assert!(err.is_retriable());
    }

    #[test]
    fn test_unauthorized_is_auth() {
        let err = WorklogError::from_status("sheets", StatusCode::UNAUTHORIZED, "expired", None);
        assert!(matches!(err, WorklogError::Auth(_)));
        assert!(!err.is_retriable());
    }
}
