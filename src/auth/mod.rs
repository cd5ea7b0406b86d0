// src/auth/mod.rs — OAuth access tokens for the Google adapters
//
// The calendar and sheet adapters never read credentials themselves; they
// ask a `TokenSource` for a bearer token before each request.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::infra::errors::WorklogError;
use crate::integrations::credentials::GoogleCredentials;

/// Google OAuth2 token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Scopes the refresh token must have been granted.
pub const GOOGLE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/calendar",
    "https://www.googleapis.com/auth/spreadsheets",
];

/// Hands out bearer tokens.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, WorklogError>;
}

/// A fixed token that is never refreshed.
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, WorklogError> {
        Ok(self.0.clone())
    }
}

/// A cached access token.
#[derive(Debug, Clone)]
struct AccessToken {
    token: String,
    /// Unix timestamp (seconds). 0 means "never expires".
    expires_at: u64,
}

impl AccessToken {
    /// Expired, with a 60-second grace period so a token never runs out
    /// mid-request.
    fn is_expired_at(&self, now: u64) -> bool {
        self.expires_at != 0 && now >= self.expires_at.saturating_sub(60)
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Refresh-token based access to Google APIs. Tokens are cached and only
/// refreshed once they are about to expire.
pub struct GoogleOAuth {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    refresh_token: Option<String>,
    token_url: String,
    cached: Mutex<Option<AccessToken>>,
}

#[derive(Deserialize)]
struct TokenResp {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

impl GoogleOAuth {
    pub fn new(creds: &GoogleCredentials) -> Result<Self, WorklogError> {
        // A bare access token has unknown expiry; with a refresh token we
        // prefer minting a fresh one on first use.
        let cached = match (&creds.refresh_token, &creds.access_token) {
            (Some(_), _) => None,
            (None, Some(token)) => Some(AccessToken {
                token: token.clone(),
                expires_at: 0,
            }),
            (None, None) => {
                return Err(WorklogError::Auth(
                    "Google credentials need a refresh token or an access token. \
                     Run `worklog connect google <client_id:client_secret:refresh_token>`"
                        .into(),
                ))
            }
        };

        Ok(Self {
            client: reqwest::Client::new(),
            client_id: creds.client_id.clone(),
            client_secret: creds.client_secret.clone(),
            refresh_token: creds.refresh_token.clone(),
            token_url: GOOGLE_TOKEN_URL.into(),
            cached: Mutex::new(cached),
        })
    }

    /// Use a preconfigured HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Use a different token endpoint.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AccessToken, WorklogError> {
        let resp = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| WorklogError::from_transport("oauth", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            // 400 invalid_grant means the refresh token was revoked.
            if status.is_client_error() {
                return Err(WorklogError::Auth(format!(
                    "Google token refresh rejected (HTTP {status}): {}",
                    crate::util::truncate_str(&body, 300)
                )));
            }
            return Err(WorklogError::from_status("oauth", status, &body, None));
        }

        let body: TokenResp = resp
            .json()
            .await
            .map_err(|e| WorklogError::from_transport("oauth", e))?;

        let expires_at = if body.expires_in > 0 {
            unix_now() + body.expires_in
        } else {
            0
        };

        Ok(AccessToken {
            token: body.access_token,
            expires_at,
        })
    }
}

#[async_trait]
impl TokenSource for GoogleOAuth {
    async fn access_token(&self) -> Result<String, WorklogError> {
        let mut guard = self.cached.lock().await;

        if let Some(ref t) = *guard {
            if !t.is_expired_at(unix_now()) {
                return Ok(t.token.clone());
            }
        }

        let Some(ref refresh_token) = self.refresh_token else {
            return Err(WorklogError::Auth(
                "Google access token expired and no refresh token is configured".into(),
            ));
        };

        tracing::debug!("Refreshing Google access token");
        let fresh = self.refresh(refresh_token).await?;
        let token = fresh.token.clone();
        *guard = Some(fresh);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(access: Option<&str>, refresh: Option<&str>) -> GoogleCredentials {
        GoogleCredentials {
            client_id: "cid".into(),
            client_secret: "secret".into(),
            access_token: access.map(String::from),
            refresh_token: refresh.map(String::from),
        }
    }

    #[test]
    fn test_token_expiry_grace_period() {
        let t = AccessToken {
            token: "t".into(),
            expires_at: 1_000,
        };
        assert!(!t.is_expired_at(900));
        assert!(t.is_expired_at(940));
        assert!(t.is_expired_at(2_000));
    }

    #[test]
    fn test_zero_expiry_never_expires() {
        let t = AccessToken {
            token: "t".into(),
            expires_at: 0,
        };
        assert!(!t.is_expired_at(u64::MAX));
    }

    #[test]
    fn test_new_requires_some_token() {
        assert!(matches!(
            GoogleOAuth::new(&creds(None, None)),
            Err(WorklogError::Auth(_))
        ));
    }

    #[tokio::test]
    async fn test_bare_access_token_used_as_is() {
        let oauth = GoogleOAuth::new(&creds(Some("ya29.static"), None)).unwrap();
        assert_eq!(oauth.access_token().await.unwrap(), "ya29.static");
    }

    #[tokio::test]
    async fn test_static_token() {
        let source = StaticToken("abc".into());
        assert_eq!(source.access_token().await.unwrap(), "abc");
    }
}
