// src/infra/config.rs — Configuration loading (TOML)

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::infra::errors::WorklogError;
use crate::infra::paths;
use crate::session::SessionSettings;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discord: DiscordConfig,

    #[serde(default)]
    pub calendar: CalendarConfig,

    #[serde(default)]
    pub sheet: SheetConfig,

    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Channel IDs the bot listens on.
    #[serde(default)]
    pub channels: Vec<String>,
    pub poll_interval_secs: u64,
    /// Messages fetched per poll.
    pub history_limit: u32,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            poll_interval_secs: 2,
            history_limit: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub calendar_id: String,
    /// Seconds between end-time extensions of a running session.
    pub update_interval_secs: u64,
    /// Length of the event created at `start`.
    pub initial_span_minutes: i64,
    /// Daily UTC cutoff in HH:MM after which running sessions are dropped.
    pub auto_stop: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            calendar_id: "primary".into(),
            update_interval_secs: 15 * 60,
            initial_span_minutes: 15,
            auto_stop: "23:59".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    pub spreadsheet_id: Option<String>,
    pub sheet_name: String,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            sheet_name: "Sheet1".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub enabled: bool,
    pub bind: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Environment variables take precedence over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(id) = std::env::var("SPREADSHEET_ID") {
            if !id.is_empty() {
                self.sheet.spreadsheet_id = Some(id);
            }
        }
        if let Ok(name) = std::env::var("SHEET_NAME") {
            if !name.is_empty() {
                self.sheet.sheet_name = name;
            }
        }
    }

    /// Timing knobs for the session layer.
    pub fn session_settings(&self) -> Result<SessionSettings, WorklogError> {
        if self.calendar.update_interval_secs == 0 {
            return Err(WorklogError::Config(
                "calendar.update_interval_secs must be greater than zero".into(),
            ));
        }
        if self.calendar.initial_span_minutes <= 0 {
            return Err(WorklogError::Config(
                "calendar.initial_span_minutes must be greater than zero".into(),
            ));
        }
        let initial_span = chrono::Duration::try_minutes(self.calendar.initial_span_minutes)
            .ok_or_else(|| {
                WorklogError::Config(format!(
                    "calendar.initial_span_minutes {} is out of range",
                    self.calendar.initial_span_minutes
                ))
            })?;
        let auto_stop = NaiveTime::parse_from_str(self.calendar.auto_stop.trim(), "%H:%M")
            .map_err(|e| {
                WorklogError::Config(format!(
                    "calendar.auto_stop '{}' is not HH:MM: {e}",
                    self.calendar.auto_stop
                ))
            })?;

        Ok(SessionSettings {
            update_interval: Duration::from_secs(self.calendar.update_interval_secs),
            initial_span,
            auto_stop,
        })
    }

    pub fn spreadsheet_id(&self) -> Result<&str, WorklogError> {
        self.sheet
            .spreadsheet_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                WorklogError::Config(
                    "No spreadsheet configured. Set SPREADSHEET_ID or [sheet].spreadsheet_id"
                        .into(),
                )
            })
    }
}
