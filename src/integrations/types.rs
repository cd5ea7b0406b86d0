// src/integrations/types.rs — Adapter traits for the chat, calendar and sheet services

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::infra::errors::WorklogError;

/// An incoming message from the chat service.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: String,
    pub channel: String,
    /// Stable author identifier (Discord user snowflake)
    pub sender_id: String,
    /// Author display name
    pub sender: String,
    pub content: String,
    pub timestamp: String,
}

/// Adapter for the chat service the bot listens on.
#[async_trait]
pub trait MessagingAdapter: Send + Sync {
    async fn send(&self, target: &str, content: &str) -> anyhow::Result<String>;

    /// Recent messages in `channel`, oldest first. With `after`, only
    /// messages newer than that message ID are returned.
    async fn history(
        &self,
        channel: &str,
        after: Option<&str>,
        limit: u32,
    ) -> anyhow::Result<Vec<IncomingMessage>>;
}

/// Calendar holding one event per work session.
#[async_trait]
pub trait CalendarAdapter: Send + Sync {
    /// Create an event and return its ID.
    async fn create_event(
        &self,
        summary: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<String, WorklogError>;

    /// Move the end of an existing event.
    async fn patch_event_end(&self, event_id: &str, end: DateTime<Utc>)
        -> Result<(), WorklogError>;
}

/// One finished session as logged to the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkLogRow {
    pub date: String,
    pub name: String,
    pub worked_from: String,
    pub worked_till: String,
    pub place: String,
}

impl WorkLogRow {
    pub fn new(name: &str, start: DateTime<Utc>, end: DateTime<Utc>, place: &str) -> Self {
        Self {
            date: start.format("%Y-%m-%d").to_string(),
            name: name.to_string(),
            worked_from: start.format("%Y-%m-%d %H:%M:%S").to_string(),
            worked_till: end.format("%Y-%m-%d %H:%M:%S").to_string(),
            place: place.to_string(),
        }
    }

    /// Cells in column order: Date, Name, Worked From, Worked Till, Place.
    pub fn cells(&self) -> [&str; 5] {
        [
            &self.date,
            &self.name,
            &self.worked_from,
            &self.worked_till,
            &self.place,
        ]
    }
}

/// Append-only log of finished sessions.
#[async_trait]
pub trait WorkLogAdapter: Send + Sync {
    /// Append one row, returning the range the service reports as updated.
    async fn append_row(&self, row: &WorkLogRow) -> Result<String, WorklogError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_row_formatting() {
        let start = Utc.with_ymd_and_hms(2026, 4, 7, 8, 5, 9).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 4, 7, 12, 30, 0).unwrap();
        let row = WorkLogRow::new("alice", start, end, "McGill");
        assert_eq!(
            row.cells(),
            [
                "2026-04-07",
                "alice",
                "2026-04-07 08:05:09",
                "2026-04-07 12:30:00",
                "McGill"
            ]
        );
    }

    #[test]
    fn test_row_date_follows_start() {
        let start = Utc.with_ymd_and_hms(2026, 4, 7, 23, 30, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 4, 8, 0, 10, 0).unwrap();
        let row = WorkLogRow::new("bob", start, end, "Home");
        assert_eq!(row.date, "2026-04-07");
        assert_eq!(row.worked_till, "2026-04-08 00:10:00");
    }
}
