// src/infra/paths.rs — Config and credential locations
//
// All paths respect the WORKLOG_HOME environment variable. When it is
// unset everything lives under ~/.worklog/.

use std::path::PathBuf;

/// Returns the WORKLOG_HOME override, if set.
fn worklog_home() -> Option<PathBuf> {
    std::env::var_os("WORKLOG_HOME").map(PathBuf::from)
}

/// Configuration directory: $WORKLOG_HOME/ or ~/.worklog/
pub fn config_dir() -> PathBuf {
    if let Some(home) = worklog_home() {
        return home;
    }
    dirs_home().join(".worklog")
}

/// Home directory, falling back to the working directory on exotic hosts.
pub fn dirs_home() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Credentials directory
pub fn credentials_dir() -> PathBuf {
    config_dir().join("credentials")
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}
