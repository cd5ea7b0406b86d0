// src/integrations/discord.rs — Discord bot over the REST API (v10)
//
// Messages are polled rather than received over the gateway.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::integrations::types::{IncomingMessage, MessagingAdapter};
use crate::util::truncate_str;

const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// Bot-token client for the channels the bot serves.
pub struct DiscordAdapter {
    client: Client,
    bot_token: String,
    api_base: String,
}

/// A Discord account (the bot itself or a message author).
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
}

impl DiscordAdapter {
    pub fn new(bot_token: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            bot_token,
            api_base: DISCORD_API_BASE.into(),
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

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    /// Send `req` with bot credentials and decode the JSON reply.
    async fn call<T: DeserializeOwned>(&self, what: &str, req: RequestBuilder) -> anyhow::Result<T> {
        let resp = req
            .header(AUTHORIZATION, format!("Bot {}", self.bot_token))
            .send()
            .await
            .with_context(|| format!("Discord {what}"))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Discord {what} failed ({status}): {}", truncate_str(&text, 300));
        }

        resp.json::<T>()
            .await
            .with_context(|| format!("Discord {what}: unexpected response"))
    }

    /// Fetch the bot's own user (used to ignore its own messages).
    pub async fn current_user(&self) -> anyhow::Result<DiscordUser> {
        self.call("GET /users/@me", self.client.get(self.url("/users/@me")))
            .await
    }

    /// Check the bot token; returns a one-line description of the bot.
    pub async fn validate(&self) -> anyhow::Result<String> {
        let me = self.current_user().await?;
        Ok(format!("Discord bot {} ({})", me.username, me.id))
    }
}

// Subset of the Discord message object we read.
#[derive(Deserialize)]
struct ChannelMessage {
    id: String,
    channel_id: String,
    author: DiscordUser,
    content: String,
    timestamp: String,
}

#[derive(Deserialize)]
struct PostedMessage {
    id: String,
}

/// Discord returns newest first; snowflake IDs grow with time.
fn sort_oldest_first(messages: &mut [IncomingMessage]) {
    messages.sort_by_key(|m| m.id.parse::<u64>().unwrap_or(u64::MAX));
}

// -- MessagingAdapter implementation --

#[async_trait]
impl MessagingAdapter for DiscordAdapter {
    async fn send(&self, target: &str, content: &str) -> anyhow::Result<String> {
        let path = format!("/channels/{target}/messages");
        let req = self
            .client
            .post(self.url(&path))
            .json(&serde_json::json!({ "content": content }));
        let posted: PostedMessage = self.call(&format!("POST {path}"), req).await?;
        Ok(posted.id)
    }

    async fn history(
        &self,
        channel: &str,
        after: Option<&str>,
        limit: u32,
    ) -> anyhow::Result<Vec<IncomingMessage>> {
        let path = format!("/channels/{channel}/messages");
        let mut req = self
            .client
            .get(self.url(&path))
            .query(&[("limit", limit.clamp(1, 100))]);
        if let Some(after) = after {
            req = req.query(&[("after", after)]);
        }
        let page: Vec<ChannelMessage> = self.call(&format!("GET {path}"), req).await?;

        let mut messages: Vec<IncomingMessage> = page
            .into_iter()
            .map(|m| IncomingMessage {
                id: m.id,
                channel: m.channel_id,
                sender_id: m.author.id,
                sender: m.author.username,
                content: m.content,
                timestamp: m.timestamp,
            })
            .collect();
        sort_oldest_first(&mut messages);
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: &str) -> IncomingMessage {
        IncomingMessage {
            id: id.into(),
            channel: "c".into(),
            sender_id: "u".into(),
            sender: "user".into(),
            content: String::new(),
            timestamp: String::new(),
        }
    }

    #[test]
    fn test_sort_oldest_first_numeric() {
        // Lexical order would put "999..." after "1000...".
        let mut msgs = vec![
            msg("1000000000000000002"),
            msg("999999999999999999"),
            msg("1000000000000000001"),
        ];
        sort_oldest_first(&mut msgs);
        let ids: Vec<_> = msgs.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "999999999999999999",
                "1000000000000000001",
                "1000000000000000002"
            ]
        );
    }

    #[test]
    fn test_parse_discord_message() {
        let json = r#"{
            "id": "1234",
            "channel_id": "42",
            "author": {"id": "77", "username": "alice", "bot": false},
            "content": "start -mcgill",
            "timestamp": "2026-01-01T10:00:00.000000+00:00"
        }"#;
        let m: ChannelMessage = serde_json::from_str(json).unwrap();
        assert_eq!(m.author.id, "77");
        assert_eq!(m.author.username, "alice");
        assert_eq!(m.content, "start -mcgill");
    }
}
