// src/integrations/credentials.rs — Credential storage for Discord and Google

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::infra::paths;

/// Credentials file stored at ~/.worklog/credentials/integrations.json
///
/// # Security Note
/// The Discord bot token and Google OAuth2 client secret / refresh token are
/// stored as plaintext JSON with chmod 600 on Unix. Prefer environment
/// variables on shared hosts.
const CREDENTIALS_FILE: &str = "integrations.json";

/// All stored integration credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrationCredentials {
    #[serde(default)]
    pub discord: Option<DiscordCredentials>,
    #[serde(default)]
    pub google: Option<GoogleCredentials>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordCredentials {
    pub bot_token: String,
}

/// OAuth2 client plus user tokens for the Calendar and Sheets APIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl IntegrationCredentials {
    /// Load credentials from disk, then apply environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let path = credentials_path();
        let mut creds = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };

        creds.apply_overrides(|key| std::env::var(key).ok());
        Ok(creds)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save credentials to disk with restrictive permissions (atomic write).
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&credentials_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700))?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;

        // Write to a temp file then rename so a crash never leaves half a file.
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
        }

        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("DISCORD_BOT_TOKEN").filter(|t| !t.is_empty()) {
            self.discord = Some(DiscordCredentials { bot_token: token });
        }

        if let (Some(id), Some(secret)) = (lookup("GOOGLE_CLIENT_ID"), lookup("GOOGLE_CLIENT_SECRET"))
        {
            let previous = self.google.take();
            self.google = Some(GoogleCredentials {
                client_id: id,
                client_secret: secret,
                access_token: lookup("GOOGLE_ACCESS_TOKEN")
                    .or_else(|| previous.as_ref().and_then(|g| g.access_token.clone())),
                refresh_token: lookup("GOOGLE_REFRESH_TOKEN")
                    .or_else(|| previous.as_ref().and_then(|g| g.refresh_token.clone())),
            });
        } else if let Some(google) = self.google.as_mut() {
            if let Some(refresh) = lookup("GOOGLE_REFRESH_TOKEN") {
                google.refresh_token = Some(refresh);
            }
            if let Some(access) = lookup("GOOGLE_ACCESS_TOKEN") {
                google.access_token = Some(access);
            }
        }
    }

    /// Check if a specific integration has usable credentials.
    pub fn has_credentials(&self, integration: &str) -> bool {
        match integration {
            "discord" => self.discord.is_some(),
            "google" => self
                .google
                .as_ref()
                .map(|g| g.access_token.is_some() || g.refresh_token.is_some())
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Set a credential for an integration by name and token string.
    pub fn set_token(&mut self, integration: &str, token: &str) -> anyhow::Result<()> {
        match integration {
            "discord" => {
                self.discord = Some(DiscordCredentials {
                    bot_token: token.to_string(),
                });
            }
            "google" => {
                // Token format: "client_id:client_secret:refresh_token"
                let parts: Vec<&str> = token.splitn(3, ':').collect();
                if parts.len() < 3 || parts.iter().any(|p| p.is_empty()) {
                    anyhow::bail!("Google token format: client_id:client_secret:refresh_token");
                }
                self.google = Some(GoogleCredentials {
                    client_id: parts[0].to_string(),
                    client_secret: parts[1].to_string(),
                    access_token: None,
                    refresh_token: Some(parts[2].to_string()),
                });
            }
            _ => {
                anyhow::bail!("Unknown integration: {integration}");
            }
        }
        Ok(())
    }

    /// List integrations that have credentials configured.
    pub fn configured_integrations(&self) -> Vec<&str> {
        let mut result = Vec::new();
        if self.has_credentials("discord") {
            result.push("discord");
        }
        if self.has_credentials("google") {
            result.push("google");
        }
        result
    }
}

/// Path to the credentials file.
pub fn credentials_path() -> PathBuf {
    paths::credentials_dir().join(CREDENTIALS_FILE)
}

/// Validate a token format without making an API call.
pub fn validate_token_format(integration: &str, token: &str) -> Result<(), String> {
    match integration {
        "discord" => {
            // Discord tokens are base64-ish strings, no easy prefix check
            if token.len() < 20 {
                return Err("Discord bot token seems too short".into());
            }
        }
        "google" => {
            if !token.contains(".apps.googleusercontent.com:") {
                return Err(
                    "Google client IDs end in '.apps.googleusercontent.com' (expected client_id:client_secret:refresh_token)"
                        .into(),
                );
            }
        }
        _ => {}
    }
    Ok(())
}
