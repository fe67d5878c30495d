//! Exponential backoff for upstream requests

use modforge_core::error::ForgeError;
use std::time::Duration;
use tracing::debug;

use crate::RegistryResult;

/// Configuration for exponential backoff retry logic
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Never retry
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    fn next_delay(&self, delay: Duration) -> Duration {
        std::cmp::min(
            Duration::from_millis((delay.as_millis() as f64 * self.multiplier) as u64),
            self.max_delay,
        )
    }
}

/// Run `operation` until it succeeds, fails unrecoverably, or retries run out
pub(crate) async fn with_retry<F, Fut, T>(config: &RetryConfig, operation: F) -> RegistryResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = RegistryResult<T>>,
{
    let mut delay = config.initial_delay;
    let mut last_error = None;

    for attempt in 0..=config.max_retries {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                // Only transport-level failures are worth another attempt
                let retry = attempt < config.max_retries && error.is_recoverable();
                last_error = Some(error);
                if !retry {
                    break;
                }

                debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying upstream request");
                tokio::time::sleep(delay).await;
                delay = config.next_delay(delay);
            },
        }
    }

    Err(last_error.unwrap_or_else(|| ForgeError::Network {
        message: "Retry operation failed without error".to_string(),
        source: None,
    }))
}
