// src/integrations/retry.rs — Retry with exponential backoff for Google adapters
//
// Wraps a CalendarAdapter or WorkLogAdapter with automatic retry on transient
// failures: rate limits (429), server errors (5xx), timeouts, connection errors.
// Auth and bad-request errors are returned immediately.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::infra::errors::WorklogError;
use crate::integrations::types::{CalendarAdapter, WorkLogAdapter, WorkLogRow};

const MAX_RETRIES: u32 = 3;
const INITIAL_DELAY_MS: u64 = 1_000;
const BACKOFF_FACTOR: f64 = 2.0;
const MAX_DELAY_MS: u64 = 10_000;
const JITTER_FRACTION: f64 = 0.2;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_factor: f64,
    pub max_delay: Duration,
    pub jitter_fraction: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            initial_delay: Duration::from_millis(INITIAL_DELAY_MS),
            backoff_factor: BACKOFF_FACTOR,
            max_delay: Duration::from_millis(MAX_DELAY_MS),
            jitter_fraction: JITTER_FRACTION,
        }
    }
}

impl RetryConfig {
    /// Calculate the delay for a given retry attempt (0-indexed).
    fn delay_for_attempt(&self, attempt: u32, rate_limit_delay: Option<Duration>) -> Duration {
        if let Some(rl_delay) = rate_limit_delay {
            return rl_delay.min(self.max_delay) + Duration::from_millis(100);
        }

        let base_ms =
            self.initial_delay.as_millis() as f64 * self.backoff_factor.powi(attempt as i32);
        let capped_ms = base_ms.min(self.max_delay.as_millis() as f64);

        let jitter = deterministic_jitter(attempt, self.jitter_fraction);
        Duration::from_millis((capped_ms * jitter) as u64)
    }
}

fn should_retry(error: &WorklogError) -> bool {
    error.is_retriable()
}

/// Extract the server's `Retry-After` hint, if any.
fn rate_limit_delay(error: &WorklogError) -> Option<Duration> {
    match error {
        WorklogError::RateLimited { retry_after_ms, .. } if *retry_after_ms > 0 => {
            Some(Duration::from_millis(*retry_after_ms))
        }
        _ => None,
    }
}

/// Returns a multiplier in [1 - fraction, 1 + fraction], fixed per attempt.
fn deterministic_jitter(attempt: u32, fraction: f64) -> f64 {
    let hash = (attempt.wrapping_mul(2654435761)) as f64 / u32::MAX as f64;
    1.0 + fraction * (2.0 * hash - 1.0)
}

/// Run `op` until it succeeds, fails permanently, or retries run out.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    label: &str,
    mut op: F,
) -> Result<T, WorklogError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, WorklogError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if !should_retry(&e) || attempt >= config.max_retries {
                    return Err(e);
                }

                let delay = config.delay_for_attempt(attempt, rate_limit_delay(&e));
                tracing::warn!(
                    op = label,
                    attempt = attempt + 1,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying after error: {}",
                    e
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Calendar wrapper that retries transient failures.
///
/// A retried `create_event` whose first attempt actually reached Google can
/// leave a duplicate event behind.
pub struct RetryCalendar {
    inner: Arc<dyn CalendarAdapter>,
    config: RetryConfig,
}

impl RetryCalendar {
    pub fn new(inner: Arc<dyn CalendarAdapter>) -> Self {
        Self::with_config(inner, RetryConfig::default())
    }

    pub fn with_config(inner: Arc<dyn CalendarAdapter>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl CalendarAdapter for RetryCalendar {
    async fn create_event(
        &self,
        summary: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<String, WorklogError> {
        with_retry(&self.config, "calendar.create_event", || {
            self.inner.create_event(summary, start, end)
        })
        .await
    }

    async fn patch_event_end(
        &self,
        event_id: &str,
        end: DateTime<Utc>,
    ) -> Result<(), WorklogError> {
        with_retry(&self.config, "calendar.patch_event_end", || {
            self.inner.patch_event_end(event_id, end)
        })
        .await
    }
}

/// Work-log wrapper that retries transient failures.
pub struct RetryWorkLog {
    inner: Arc<dyn WorkLogAdapter>,
    config: RetryConfig,
}

impl RetryWorkLog {
    pub fn new(inner: Arc<dyn WorkLogAdapter>) -> Self {
        Self::with_config(inner, RetryConfig::default())
    }

    pub fn with_config(inner: Arc<dyn WorkLogAdapter>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl WorkLogAdapter for RetryWorkLog {
    async fn append_row(&self, row: &WorkLogRow) -> Result<String, WorklogError> {
        with_retry(&self.config, "sheets.append_row", || self.inner.append_row(row)).await
    }
}
