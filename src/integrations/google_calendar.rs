// src/integrations/google_calendar.rs — Google Calendar adapter (REST API + OAuth2)
//
// Uses the Google Calendar API v3 (https://developers.google.com/calendar/api).
// One event per work session; its end is pushed forward while the session runs.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenSource;
use crate::infra::errors::WorklogError;
use crate::integrations::google_error_for_status;
use crate::integrations::types::CalendarAdapter;
use crate::util::encode_path_segment;

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const SERVICE: &str = "calendar";

/// Google Calendar integration adapter.
pub struct GoogleCalendarAdapter {
    client: Client,
    tokens: Arc<dyn TokenSource>,
    calendar_id: String,
    api_base: String,
}

impl GoogleCalendarAdapter {
    pub fn new(tokens: Arc<dyn TokenSource>, calendar_id: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            tokens,
            calendar_id: calendar_id.into(),
            api_base: CALENDAR_API_BASE.into(),
        }
    }

    /// Use a preconfigured HTTP client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Point the adapter at a different API root.
    pub fn with_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.api_base,
            encode_path_segment(&self.calendar_id)
        )
    }

    /// Validate access by fetching the calendar's metadata.
    pub async fn validate(&self) -> Result<String, WorklogError> {
        #[derive(Deserialize)]
        struct CalendarResp {
            summary: Option<String>,
        }

        let token = self.tokens.access_token().await?;
        let resp = self
            .client
            .get(format!(
                "{}/calendars/{}",
                self.api_base,
                encode_path_segment(&self.calendar_id)
            ))
            .bearer_auth(token)
            .query(&[("fields", "summary")])
            .send()
            .await
            .map_err(|e| WorklogError::from_transport(SERVICE, e))?;
        let resp = google_error_for_status(SERVICE, resp).await?;

        let cal: CalendarResp = resp
            .json()
            .await
            .map_err(|e| WorklogError::from_transport(SERVICE, e))?;
        Ok(format!(
            "Google Calendar: {} ({})",
            cal.summary.unwrap_or_else(|| "untitled".into()),
            self.calendar_id
        ))
    }
}

// -- Google Calendar API types --

#[derive(Deserialize)]
struct EventResp {
    id: String,
}

/// `{"dateTime": ..., "timeZone": "UTC"}` as the Calendar API expects it.
fn event_time(t: DateTime<Utc>) -> serde_json::Value {
    serde_json::json!({
        "dateTime": t.to_rfc3339_opts(SecondsFormat::Secs, true),
        "timeZone": "UTC",
    })
}

fn insert_body(summary: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> serde_json::Value {
    serde_json::json!({
        "summary": summary,
        "start": event_time(start),
        "end": event_time(end),
    })
}

fn patch_end_body(end: DateTime<Utc>) -> serde_json::Value {
    serde_json::json!({ "end": event_time(end) })
}

// -- CalendarAdapter implementation --

#[async_trait]
impl CalendarAdapter for GoogleCalendarAdapter {
    async fn create_event(
        &self,
        summary: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<String, WorklogError> {
        let token = self.tokens.access_token().await?;
        let resp = self
            .client
            .post(self.events_url())
            .bearer_auth(token)
            .json(&insert_body(summary, start, end))
            .send()
            .await
            .map_err(|e| WorklogError::from_transport(SERVICE, e))?;
        let resp = google_error_for_status(SERVICE, resp).await?;

        let event: EventResp = resp
            .json()
            .await
            .map_err(|e| WorklogError::from_transport(SERVICE, e))?;
        tracing::debug!(event_id = %event.id, "Created calendar event '{}'", summary);
        Ok(event.id)
    }

    async fn patch_event_end(
        &self,
        event_id: &str,
        end: DateTime<Utc>,
    ) -> Result<(), WorklogError> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}/{}", self.events_url(), encode_path_segment(event_id));
        let resp = self
            .client
            .patch(url)
            .bearer_auth(token)
            .json(&patch_end_body(end))
            .send()
            .await
            .map_err(|e| WorklogError::from_transport(SERVICE, e))?;
        google_error_for_status(SERVICE, resp).await?;
        Ok(())
    }
}
