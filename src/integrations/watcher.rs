// src/integrations/watcher.rs — Polls chat channels for new messages
//
// One background task per channel. Each task remembers the newest message ID
// it has seen and asks only for messages after it.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

use crate::integrations::types::{IncomingMessage, MessagingAdapter};

/// Configuration for one watched channel.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub channel: String,
    pub poll_interval: Duration,
    /// Upper bound on messages fetched per poll
    pub history_limit: u32,
}

/// Manages background polling watchers for all configured channels.
#[derive(Default)]
pub struct WatcherManager {
    configs: Vec<WatchConfig>,
    shutdown_tx: Option<broadcast::Sender<()>>,
}

impl WatcherManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_watch(&mut self, config: WatchConfig) {
        self.configs.push(config);
    }

    pub fn has_watchers(&self) -> bool {
        !self.configs.is_empty()
    }

    /// Start all configured watchers, returning a channel that receives
    /// new messages in arrival order per channel.
    pub fn start(&mut self, messaging: Arc<dyn MessagingAdapter>) -> mpsc::Receiver<IncomingMessage> {
        let (msg_tx, msg_rx) = mpsc::channel(100);
        let (shutdown_tx, _) = broadcast::channel(1);
        self.shutdown_tx = Some(shutdown_tx.clone());

        for config in &self.configs {
            let config = config.clone();
            let messaging = messaging.clone();
            let tx = msg_tx.clone();
            let mut shutdown_rx = shutdown_tx.subscribe();

            tokio::spawn(async move {
                let mut last_seen: Option<String> = None;
                tracing::info!(
                    "Watcher started for channel {} ({}ms interval)",
                    config.channel,
                    config.poll_interval.as_millis()
                );

                loop {
                    if let Err(e) =
                        poll_channel(messaging.as_ref(), &config, &tx, &mut last_seen).await
                    {
                        tracing::warn!("Watcher poll failed for {}: {}", config.channel, e);
                    }
                    if tx.is_closed() {
                        break;
                    }

                    tokio::select! {
                        _ = tokio::time::sleep(config.poll_interval) => {}
                        _ = shutdown_rx.recv() => {
                            tracing::info!("Watcher stopping for {}", config.channel);
                            break;
                        }
                    }
                }
            });
        }

        msg_rx
    }

    /// Stop all running watchers.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Poll one channel and forward anything newer than `last_seen`.
///
/// The first successful poll only records a baseline, so commands sent
/// while the bot was offline are not replayed.
pub async fn poll_channel(
    messaging: &dyn MessagingAdapter,
    config: &WatchConfig,
    tx: &mpsc::Sender<IncomingMessage>,
    last_seen: &mut Option<String>,
) -> anyhow::Result<()> {
    let Some(after) = last_seen.clone() else {
        let latest = messaging.history(&config.channel, None, 1).await?;
        // An empty channel has no baseline; "0" makes every later message new.
        *last_seen = Some(latest.last().map(|m| m.id.clone()).unwrap_or_else(|| "0".into()));
        return Ok(());
    };

    let messages = messaging
        .history(&config.channel, Some(&after), config.history_limit)
        .await?;

    for msg in messages {
        *last_seen = Some(msg.id.clone());
        if tx.send(msg).await.is_err() {
            // Receiver dropped
            return Ok(());
        }
    }

    Ok(())
}
