// src/session/dispatcher.rs — `start` / `stop` chat commands
//
// Parses chat messages and drives the registry, the periodic updaters and
// the calendar/sheet collaborators. Every handled command yields exactly
// one plain-text reply for the originating channel.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

use super::registry::{Session, SessionInfo, SessionRegistry};
use super::updater::spawn_updater;
use super::{Clock, Location, SessionError, SessionSettings, SystemClock, LOCATION_TAGS};
use crate::infra::errors::WorklogError;
use crate::integrations::types::{CalendarAdapter, IncomingMessage, WorkLogAdapter, WorkLogRow};

/// A recognised chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `start` with the last recognised location tag, if any.
    Start { location: Option<Location> },
    Stop,
}

/// Parse a chat message. Anything that is not a command yields `None`.
pub fn parse_command(content: &str) -> Option<Command> {
    let msg = content.trim().to_lowercase();
    let mut tokens = msg.split_whitespace();

    match tokens.next() {
        Some("start") => Some(Command::Start {
            // Later tags override earlier ones.
            location: tokens.filter_map(Location::from_tag).last(),
        }),
        _ if msg == "stop" => Some(Command::Stop),
        _ => None,
    }
}

/// Failure of a `start` command.
#[derive(Debug, Error)]
pub enum StartError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("could not create calendar event: {0}")]
    Calendar(#[source] WorklogError),
}

/// Outcome of a `stop` command. The session is gone even if one of the
/// external writes failed.
#[derive(Debug)]
pub struct StopReport {
    pub session: SessionInfo,
    pub ended_at: DateTime<Utc>,
    pub calendar_error: Option<WorklogError>,
    pub log_error: Option<WorklogError>,
}

impl StopReport {
    pub fn is_complete(&self) -> bool {
        self.calendar_error.is_none() && self.log_error.is_none()
    }
}

/// Routes chat commands onto the session registry.
///
/// Commands are expected one at a time: the existence check in
/// `start_session` and the insert are separated by the event creation.
pub struct Dispatcher {
    registry: SessionRegistry,
    calendar: Arc<dyn CalendarAdapter>,
    worklog: Arc<dyn WorkLogAdapter>,
    clock: Arc<dyn Clock>,
    settings: SessionSettings,
    bot_user_id: Option<String>,
}

impl Dispatcher {
    pub fn new(
        registry: SessionRegistry,
        calendar: Arc<dyn CalendarAdapter>,
        worklog: Arc<dyn WorkLogAdapter>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            registry,
            calendar,
            worklog,
            clock: Arc::new(SystemClock),
            settings,
            bot_user_id: None,
        }
    }

    /// Builder: use a custom time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builder: the bot's own user ID; its messages are never handled.
    pub fn with_bot_user(mut self, user_id: impl Into<String>) -> Self {
        self.bot_user_id = Some(user_id.into());
        self
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Handle one chat message, returning the reply to post, if any.
    pub async fn handle_message(&self, msg: &IncomingMessage) -> Option<String> {
        if self.bot_user_id.as_deref() == Some(msg.sender_id.as_str()) {
            return None;
        }

        let reply = match parse_command(&msg.content)? {
            Command::Start { location } => {
                match self.start_session(&msg.sender_id, &msg.sender, location).await {
                    Ok(info) => self.started_reply(&info),
                    Err(StartError::Session(e)) => session_error_reply(&e),
                    Err(StartError::Calendar(e)) => {
                        tracing::error!("Failed to start session for {}: {}", msg.sender, e);
                        "❌ Could not create the calendar event, so no session was started. \
                         Please try again in a moment."
                            .to_string()
                    }
                }
            }
            Command::Stop => match self.stop_session(&msg.sender_id).await {
                Ok(report) => stopped_reply(&report),
                Err(e) => session_error_reply(&e),
            },
        };

        Some(reply)
    }

    /// Start a session for `user_id` at `location`.
    pub async fn start_session(
        &self,
        user_id: &str,
        username: &str,
        location: Option<Location>,
    ) -> Result<SessionInfo, StartError> {
        if self.registry.contains(user_id) {
            return Err(SessionError::AlreadyActive.into());
        }
        let location = location.ok_or(SessionError::MissingLocation)?;

        let start_time = self.clock.now();
        let end_time = start_time + self.settings.initial_span;
        let summary = event_summary(username, location);

        let event_id = self
            .calendar
            .create_event(&summary, start_time, end_time)
            .await
            .map_err(StartError::Calendar)?;

        let session = Session::new(user_id, username, event_id, start_time, location);
        let updater = spawn_updater(
            &session.info(),
            self.calendar.clone(),
            self.registry.clone(),
            self.clock.clone(),
            &self.settings,
        );

        match self.registry.create(session.with_updater(updater)) {
            Ok(info) => {
                tracing::info!(
                    user = %username,
                    event_id = %info.event_id,
                    "Started session @{}",
                    location
                );
                Ok(info)
            }
            Err((err, mut rejected)) => {
                tracing::warn!(
                    event_id = %rejected.event_id,
                    "Concurrent start for {}, abandoning calendar event {}",
                    username,
                    rejected.event_id
                );
                rejected.stop_updater().await;
                Err(err.into())
            }
        }
    }

    /// Stop the user's session: cancel its updater, close the calendar
    /// event and log the row.
    pub async fn stop_session(&self, user_id: &str) -> Result<StopReport, SessionError> {
        let mut session = self.registry.remove(user_id)?;
        session.stop_updater().await;

        let ended_at = self.clock.now();

        let calendar_error = match self
            .calendar
            .patch_event_end(&session.event_id, ended_at)
            .await
        {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(
                    event_id = %session.event_id,
                    "Failed to close {}'s calendar event: {}",
                    session.username,
                    e
                );
                Some(e)
            }
        };

        let row = WorkLogRow::new(
            &session.username,
            session.start_time,
            ended_at,
            session.location.name(),
        );
        let log_error = match self.worklog.append_row(&row).await {
            Ok(range) => {
                tracing::info!("Logged to sheet: {}", range);
                None
            }
            Err(e) => {
                tracing::error!("Failed to log {}'s session: {}", session.username, e);
                Some(e)
            }
        };

        Ok(StopReport {
            session: session.info(),
            ended_at,
            calendar_error,
            log_error,
        })
    }

    fn started_reply(&self, info: &SessionInfo) -> String {
        format!(
            "📅 Started: `{}`\n⏱ Dynamic {} updates enabled.\n🕛 Auto-stop at {} (UTC).",
            event_summary(&info.username, info.location),
            describe_interval(self.settings.update_interval),
            self.settings.auto_stop.format("%-I:%M %p"),
        )
    }
}

/// Calendar event title for a session.
pub fn event_summary(username: &str, location: Location) -> String {
    format!("{username} is working @{location}")
}

fn describe_interval(interval: std::time::Duration) -> String {
    let secs = interval.as_secs();
    if secs >= 60 && secs.is_multiple_of(60) {
        format!("{}-min", secs / 60)
    } else {
        format!("{secs}-sec")
    }
}

/// Reply text for a rejected command.
pub fn session_error_reply(err: &SessionError) -> String {
    match err {
        SessionError::AlreadyActive => "❗ You already have an active session.".to_string(),
        SessionError::MissingLocation => {
            let tags = LOCATION_TAGS
                .iter()
                .map(|(tag, _)| format!("`{tag}`"))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "⚠️ Please specify a location using one of the following: {tags}\n\
                 Example: `start {}`",
                Location::Ieee.tag()
            )
        }
        SessionError::NoActiveSession => "⚠️ No active session to stop.".to_string(),
    }
}

fn stopped_reply(report: &StopReport) -> String {
    match (&report.calendar_error, &report.log_error) {
        (None, None) => "✅ Session stopped and calendar + sheet updated.".to_string(),
        (Some(_), None) => {
            "⚠️ Session stopped and logged to the sheet, but the calendar event could not be updated."
                .to_string()
        }
        (None, Some(_)) => {
            "⚠️ Session stopped and calendar updated, but logging to the sheet failed.".to_string()
        }
        (Some(_), Some(_)) => {
            "❌ Session stopped, but both the calendar update and the sheet log failed.".to_string()
        }
    }
}
