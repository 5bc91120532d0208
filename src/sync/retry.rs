//! Rate-limit retry policy applied to every remote call

use crate::api::{ApiFailure, ApiResult, ResponseMeta};
use crate::config::SyncConfig;
use crate::error::{ChannelSyncError, Result};
use crate::sync::Cancellation;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Retry statistics for monitoring
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RetryStats {
    pub attempts: u64,
    pub throttled: u64,
    pub fatal: u64,
    pub backoff_total: Duration,
}

/// Where a call is in its retry loop
#[derive(Debug)]
enum RetryState<T> {
    Attempting,
    Backoff(Duration),
    Succeeded(T),
    FailedFatal(ApiFailure),
}

/// Retries throttled calls after the server's wait hint, forever.
///
/// Any other failure is returned straight away. The loop only ends early
/// through the [`Cancellation`] passed to [`invoke`](Self::invoke).
pub struct RateLimitRetrier {
    max_backoff: Duration,
    default_backoff: Duration,
    stats: Arc<RwLock<RetryStats>>,
}

impl RateLimitRetrier {
    pub fn new(max_backoff: Duration, default_backoff: Duration) -> Self {
        Self {
            max_backoff,
            default_backoff: default_backoff.min(max_backoff),
            stats: Arc::new(RwLock::new(RetryStats::default())),
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.max_backoff, config.default_backoff)
    }

    /// How long to wait before retrying, or `None` if the failure is fatal.
    /// A zero hint counts as no hint.
    pub fn backoff_for(&self, meta: &ResponseMeta) -> Option<Duration> {
        if !meta.is_rate_limited() {
            return None;
        }
        Some(
            meta.retry_after
                .filter(|hint| !hint.is_zero())
                .unwrap_or(self.default_backoff)
                .min(self.max_backoff),
        )
    }

    /// Run `call` until it succeeds, fails fatally or `cancel` fires
    pub async fn invoke<T, F, Fut>(
        &self,
        operation: &str,
        cancel: &Cancellation,
        mut call: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let mut state = RetryState::Attempting;

        loop {
            state = match state {
                RetryState::Attempting => {
                    if cancel.is_cancelled() {
                        return Err(ChannelSyncError::cancelled(operation));
                    }
                    self.stats.write().await.attempts += 1;

                    match call().await {
                        Ok(value) => RetryState::Succeeded(value),
                        Err(failure) => match self.backoff_for(&failure.meta) {
                            Some(wait) => {
                                tracing::warn!(
                                    operation = %operation,
                                    wait_ms = wait.as_millis() as u64,
                                    "Rate limited, backing off"
                                );
                                RetryState::Backoff(wait)
                            }
                            None => RetryState::FailedFatal(failure),
                        },
                    }
                }
                RetryState::Backoff(wait) => {
                    {
                        let mut stats = self.stats.write().await;
                        stats.throttled += 1;
                        stats.backoff_total += wait;
                    }
                    if !cancel.sleep(wait).await {
                        tracing::debug!(operation = %operation, "Retry cancelled during backoff");
                        return Err(ChannelSyncError::cancelled(operation));
                    }
                    RetryState::Attempting
                }
                RetryState::Succeeded(value) => return Ok(value),
                RetryState::FailedFatal(failure) => {
                    self.stats.write().await.fatal += 1;
                    tracing::debug!(
                        operation = %operation,
                        status = failure.meta.status_code,
                        error = %failure.error,
                        "Remote call failed"
                    );
                    return Err(ChannelSyncError::api(operation, failure));
                }
            };
        }
    }

    pub async fn get_stats(&self) -> RetryStats {
        self.stats.read().await.clone()
    }

    /// Log retry statistics (for periodic monitoring)
    pub async fn log_stats(&self) {
        let stats = self.get_stats().await;
        tracing::info!(
            attempts = stats.attempts,
            throttled = stats.throttled,
            fatal = stats.fatal,
            backoff_ms = stats.backoff_total.as_millis() as u64,
            "Remote call retry statistics"
        );
    }
}

impl Default for RateLimitRetrier {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}
