// src/session/mod.rs — Work-session tracking: registry, command dispatch, updater

pub mod dispatcher;
pub mod registry;
pub mod updater;

use chrono::{DateTime, NaiveTime, Utc};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub use dispatcher::{parse_command, Command, Dispatcher};
pub use registry::{Session, SessionInfo, SessionRegistry};
pub use updater::{auto_stop_deadline, spawn_updater, UpdaterHandle};

/// Where a session is being worked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Ieee,
    McGill,
    Home,
    Concordia,
}

/// Recognised `start` tags, in the order they are shown to users.
pub const LOCATION_TAGS: [(&str, Location); 4] = [
    ("-ieee", Location::Ieee),
    ("-mcgill", Location::McGill),
    ("-home", Location::Home),
    ("-conco", Location::Concordia),
];

impl Location {
    /// Look up a (lower-cased) tag such as `-ieee`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        LOCATION_TAGS
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, loc)| *loc)
    }

    /// Human-readable place name used in event titles and sheet rows.
    pub fn name(&self) -> &'static str {
        match self {
            Location::Ieee => "IEEE",
            Location::McGill => "McGill",
            Location::Home => "Home",
            Location::Concordia => "Concordia",
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Location::Ieee => "-ieee",
            Location::McGill => "-mcgill",
            Location::Home => "-home",
            Location::Concordia => "-conco",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// User-facing failures of the session state machine. All of them are
/// answered with a chat reply and leave the registry untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session already active")]
    AlreadyActive,

    #[error("no recognised location tag")]
    MissingLocation,

    #[error("no active session")]
    NoActiveSession,
}

/// Source of the current UTC time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Timing knobs shared by the dispatcher and the periodic updater.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Delay between calendar end-time extensions.
    pub update_interval: Duration,
    /// Span of the calendar event created at `start`.
    pub initial_span: chrono::Duration,
    /// Daily UTC time at which unstopped sessions are dropped.
    pub auto_stop: NaiveTime,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_secs(15 * 60),
            initial_span: chrono::Duration::minutes(15),
            auto_stop: NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_from_tag() {
        assert_eq!(Location::from_tag("-ieee"), Some(Location::Ieee));
        assert_eq!(Location::from_tag("-mcgill"), Some(Location::McGill));
        assert_eq!(Location::from_tag("-home"), Some(Location::Home));
        assert_eq!(Location::from_tag("-conco"), Some(Location::Concordia));
        assert_eq!(Location::from_tag("-concordia"), None);
        assert_eq!(Location::from_tag("ieee"), None);
    }

    #[test]
    fn test_tag_table_consistent() {
        for (tag, loc) in LOCATION_TAGS {
            assert_eq!(loc.tag(), tag);
            assert_eq!(Location::from_tag(tag), Some(loc));
        }
    }

    #[test]
    fn test_location_display() {
        assert_eq!(Location::McGill.to_string(), "McGill");
        assert_eq!(Location::Concordia.to_string(), "Concordia");
    }

    #[test]
    fn test_default_settings() {
        let s = SessionSettings::default();
        assert_eq!(s.update_interval, Duration::from_secs(900));
        assert_eq!(s.initial_span, chrono::Duration::minutes(15));
        assert_eq!(s.auto_stop, NaiveTime::from_hms_opt(23, 59, 0).unwrap());
    }
}
