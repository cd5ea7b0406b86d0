// src/integrations/mod.rs — External services: Discord, Google Calendar, Google Sheets

pub mod credentials;
pub mod discord;
pub mod google_calendar;
pub mod google_sheets;
pub mod retry;
pub mod types;
pub mod watcher;

pub use credentials::IntegrationCredentials;
pub use types::{CalendarAdapter, IncomingMessage, MessagingAdapter, WorkLogAdapter, WorkLogRow};

use crate::infra::errors::WorklogError;
use crate::util::truncate_str;

/// Turn a non-2xx Google API response into a typed error, keeping the
/// `Retry-After` hint for rate limits.
pub(crate) async fn google_error_for_status(
    service: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, WorklogError> {
    if resp.status().is_success() {
        return Ok(resp);
    }

    let status = resp.status();
    let retry_after_ms = retry_after_ms(resp.headers());
    let body = resp.text().await.unwrap_or_default();

    Err(WorklogError::from_status(
        service,
        status,
        truncate_str(&body, 300),
        retry_after_ms,
    ))
}

/// `Retry-After` in milliseconds, when given as delay-seconds.
fn retry_after_ms(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(|secs| secs.saturating_mul(1000))
}
