//! Retry with exponential backoff for provider calls
//!
//! Wraps exactly one adapter call. 429/503 are retried with a doubling delay;
//! a 429 matching the provider's quota signature fails at once, since waiting
//! does not help within the same day.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::providers::QuotaSignature;
use crate::error::{AnalysisError, FailureKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
        }
    }
}

pub struct RetryController<'a> {
    policy: RetryPolicy,
    quota_signature: &'a QuotaSignature,
    abort_flag: Option<Arc<AtomicBool>>,
}

impl<'a> RetryController<'a> {
    pub fn new(policy: RetryPolicy, quota_signature: &'a QuotaSignature) -> Self {
        Self {
            policy,
            quota_signature,
            abort_flag: None,
        }
    }

    pub fn with_abort_flag(mut self, abort_flag: Option<Arc<AtomicBool>>) -> Self {
        self.abort_flag = abort_flag;
        self
    }

    /// Classify a failed attempt, taking the provider's quota phrasing into account
    pub fn classify(&self, err: &AnalysisError) -> FailureKind {
        match err.kind() {
            FailureKind::Retryable if err.status() == Some(429) => {
                let quota_hit = err
                    .provider_message()
                    .map(|message| self.quota_signature.matches(message))
                    .unwrap_or(false);
                if quota_hit {
                    FailureKind::DailyQuotaExceeded
                } else {
                    FailureKind::Retryable
                }
            }
            kind => kind,
        }
    }

    /// Run `call` until it succeeds, fails for good, or attempts run out
    pub async fn run<T, F, Fut>(&self, mut call: F) -> Result<T, AnalysisError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AnalysisError>>,
    {
        let mut delay = self.policy.initial_delay;
        let mut attempts_left = self.policy.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            if self.is_aborted() {
                return Err(AnalysisError::Cancelled);
            }

            attempt += 1;
            attempts_left -= 1;

            let err = match call().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            match self.classify(&err) {
                FailureKind::DailyQuotaExceeded => {
                    warn!(attempt, "Daily quota exhausted, not retrying");
                    return Err(into_quota_error(err));
                }
                FailureKind::Retryable if attempts_left > 0 => {
                    warn!(
                        attempt,
                        status = err.status(),
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient provider error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                kind => {
                    debug!(attempt, ?kind, "Giving up on provider call");
                    return Err(err);
                }
            }
        }
    }

    fn is_aborted(&self) -> bool {
        self.abort_flag
            .as_ref()
            .map(|f| f.load(Ordering::SeqCst))
            .unwrap_or(false)
    }
}

fn into_quota_error(err: AnalysisError) -> AnalysisError {
    match err {
        AnalysisError::Api {
            provider, message, ..
        }
        | AnalysisError::Network {
            provider, message, ..
        } => AnalysisError::DailyQuotaExceeded { provider, message },
        other => other,
    }
}
