// src/infra/daemon/mod.rs

use std::sync::Arc;
use std::time::Duration;

use crate::api;
use crate::auth::{GoogleOAuth, TokenSource};
use crate::infra::config::Config;
use crate::integrations::credentials::IntegrationCredentials;
use crate::integrations::discord::DiscordAdapter;
use crate::integrations::google_calendar::GoogleCalendarAdapter;
use crate::integrations::google_sheets::GoogleSheetsAdapter;
use crate::integrations::retry::{RetryCalendar, RetryWorkLog};
use crate::integrations::types::MessagingAdapter;
use crate::integrations::watcher::{WatchConfig, WatcherManager};
use crate::session::{Dispatcher, SessionRegistry};

/// Everything the daemon needs to serve commands.
pub struct DaemonContext {
    pub config: Config,
    pub messaging: Arc<dyn MessagingAdapter>,
    pub dispatcher: Dispatcher,
}

/// Wire the Discord and Google adapters into a dispatcher.
pub async fn build_context(
    config: Config,
    creds: &IntegrationCredentials,
) -> anyhow::Result<DaemonContext> {
    let settings = config.session_settings()?;

    let discord = creds.discord.as_ref().ok_or_else(|| {
        anyhow::anyhow!("Discord is not connected. Run `worklog connect discord <bot_token>`")
    })?;
    let google = creds.google.as_ref().ok_or_else(|| {
        anyhow::anyhow!(
            "Google is not connected. Run `worklog connect google <client_id:client_secret:refresh_token>`"
        )
    })?;

    let discord = Arc::new(DiscordAdapter::new(discord.bot_token.clone()));
    let bot = discord.current_user().await?;
    tracing::info!("Connected to Discord as {} ({})", bot.username, bot.id);

    let tokens: Arc<dyn TokenSource> = Arc::new(GoogleOAuth::new(google)?);
    let calendar = GoogleCalendarAdapter::new(tokens.clone(), config.calendar.calendar_id.clone());
    let sheets = GoogleSheetsAdapter::new(
        tokens,
        config.spreadsheet_id()?,
        config.sheet.sheet_name.clone(),
    );

    let dispatcher = Dispatcher::new(
        SessionRegistry::new(),
        Arc::new(RetryCalendar::new(Arc::new(calendar))),
        Arc::new(RetryWorkLog::new(Arc::new(sheets))),
        settings,
    )
    .with_bot_user(bot.id);

    Ok(DaemonContext {
        config,
        messaging: discord,
        dispatcher,
    })
}

/// Run the daemon loop: poll channels, dispatch commands, post replies.
pub async fn run_daemon(ctx: DaemonContext) -> anyhow::Result<()> {
    tracing::info!("worklog daemon starting...");

    let watch_configs = build_watch_configs(&ctx.config);
    if watch_configs.is_empty() {
        tracing::warn!("No Discord channels configured. Daemon has nothing to do.");
        println!("No channels configured. Add channel IDs to [discord].channels in the config.");
        return Ok(());
    }

    let mut watcher_manager = WatcherManager::new();
    for wc in watch_configs {
        watcher_manager.add_watch(wc);
    }
    let mut message_rx = watcher_manager.start(ctx.messaging.clone());

    // ── Start the HTTP API server if enabled ────────────────────────
    if ctx.config.api.enabled {
        let api_state = api::ApiState {
            registry: ctx.dispatcher.registry().clone(),
        };
        let api_cfg = ctx.config.api.clone();
        tokio::spawn(async move {
            if let Err(e) = api::start_server(&api_cfg, api_state).await {
                tracing::error!("API server failed: {}", e);
            }
        });
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    println!("Daemon running. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            maybe_msg = message_rx.recv() => {
                let Some(msg) = maybe_msg else {
                    tracing::warn!("All channel watchers exited");
                    break;
                };
                if let Some(reply) = ctx.dispatcher.handle_message(&msg).await {
                    if let Err(e) = ctx.messaging.send(&msg.channel, &reply).await {
                        tracing::error!("Failed to reply in {}: {}", msg.channel, e);
                    }
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received");
                println!("\nShutting down daemon...");
                break;
            }
        }
    }

    watcher_manager.stop();

    // Running sessions are not persisted; their events keep the last end time.
    let dropped = ctx.dispatcher.registry().drain();
    if !dropped.is_empty() {
        tracing::warn!(
            "Dropping {} active session(s) on shutdown: {}",
            dropped.len(),
            dropped
                .iter()
                .map(|s| s.username.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    for mut session in dropped {
        session.stop_updater().await;
    }

    tracing::info!("Daemon stopped.");
    Ok(())
}

/// One watcher per configured Discord channel.
fn build_watch_configs(config: &Config) -> Vec<WatchConfig> {
    let poll_interval = Duration::from_secs(config.discord.poll_interval_secs.max(1));
    config
        .discord
        .channels
        .iter()
        .filter(|c| !c.trim().is_empty())
        .map(|channel| WatchConfig {
            channel: channel.trim().to_string(),
            poll_interval,
            history_limit: config.discord.history_limit,
        })
        .collect()
}
