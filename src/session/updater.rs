// src/session/updater.rs — Periodic calendar extension for one running session
//
// Every interval the updater moves the session's calendar event end to
// "now". It exits when cancelled (the stop handler does the final patch)
// or when the daily cutoff is reached (auto-stop, no final patch).

use chrono::{DateTime, NaiveTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::registry::{SessionInfo, SessionRegistry};
use super::{Clock, SessionSettings};
use crate::integrations::types::CalendarAdapter;

/// Ownership handle of a running updater task.
#[derive(Debug)]
pub struct UpdaterHandle {
    cancel_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl UpdaterHandle {
    /// Signal cancellation and wait for the task to exit. A patch that is
    /// still in flight is dropped, so no calendar call happens afterwards.
    pub async fn cancel(mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.task.await {
            if e.is_panic() {
                tracing::error!("Session updater panicked: {}", e);
            }
        }
    }
}

/// First occurrence of `cutoff` (UTC) strictly after `start`.
pub fn auto_stop_deadline(start: DateTime<Utc>, cutoff: NaiveTime) -> DateTime<Utc> {
    let same_day = start.date_naive().and_time(cutoff).and_utc();
    if start < same_day {
        same_day
    } else {
        same_day + chrono::Duration::days(1)
    }
}

/// Spawn the updater for `session`.
pub fn spawn_updater(
    session: &SessionInfo,
    calendar: Arc<dyn CalendarAdapter>,
    registry: SessionRegistry,
    clock: Arc<dyn Clock>,
    settings: &SessionSettings,
) -> UpdaterHandle {
    let (cancel_tx, cancel_rx) = oneshot::channel();
    let deadline = auto_stop_deadline(session.start_time, settings.auto_stop);

    let task = tokio::spawn(run_updater(
        session.clone(),
        calendar,
        registry,
        clock,
        settings.update_interval,
        deadline,
        cancel_rx,
    ));

    UpdaterHandle {
        cancel_tx: Some(cancel_tx),
        task,
    }
}

async fn run_updater(
    session: SessionInfo,
    calendar: Arc<dyn CalendarAdapter>,
    registry: SessionRegistry,
    clock: Arc<dyn Clock>,
    interval: Duration,
    deadline: DateTime<Utc>,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    tracing::debug!(
        user = %session.username,
        event_id = %session.event_id,
        deadline = %deadline,
        "Session updater started ({}s interval)",
        interval.as_secs()
    );

    loop {
        // Never sleep past the cutoff.
        let until_cutoff = (deadline - clock.now()).to_std().unwrap_or(Duration::ZERO);
        let wait = interval.min(until_cutoff);

        tokio::select! {
            biased;
            // A dropped sender counts as cancellation too.
            _ = &mut cancel_rx => {
                tracing::info!("Cancelled updater for {}", session.username);
                return;
            }
            _ = tokio::time::sleep(wait) => {}
        }

        let now = clock.now();
        if now >= deadline {
            tracing::info!("Auto-stopped {}'s session at {}", session.username, now);
            registry.remove_if_event(&session.user_id, &session.event_id);
            return;
        }

        // Cancellation drops an in-flight patch, including any retry backoff.
        let result = tokio::select! {
            biased;
            _ = &mut cancel_rx => {
                tracing::info!("Cancelled updater for {} mid-update", session.username);
                return;
            }
            result = calendar.patch_event_end(&session.event_id, now) => result,
        };

        match result {
            Ok(()) => {
                tracing::info!("Updated {}'s event end time to {}", session.username, now);
            }
            Err(e) => {
                tracing::warn!(
                    event_id = %session.event_id,
                    "Failed to extend {}'s event: {}",
                    session.username,
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cutoff() -> NaiveTime {
        NaiveTime::from_hms_opt(23, 59, 0).unwrap()
    }

    #[test]
    fn test_deadline_same_day() {
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 9, 30, 0).unwrap();
        assert_eq!(
            auto_stop_deadline(start, cutoff()),
            Utc.with_ymd_and_hms(2026, 5, 1, 23, 59, 0).unwrap()
        );
    }

    #[test]
    fn test_deadline_after_cutoff_rolls_over() {
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 23, 59, 30).unwrap();
        assert_eq!(
            auto_stop_deadline(start, cutoff()),
            Utc.with_ymd_and_hms(2026, 5, 2, 23, 59, 0).unwrap()
        );
    }

    #[test]
    fn test_deadline_exactly_at_cutoff_rolls_over() {
        let start = Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 0).unwrap();
        assert_eq!(
            auto_stop_deadline(start, cutoff()),
            Utc.with_ymd_and_hms(2027, 1, 1, 23, 59, 0).unwrap()
        );
    }
}
