//! Analyzer settings
//!
//! Defaults suit interactive use; deployments can tune them through the
//! environment (`.env` is loaded by `crate::init`).

use std::str::FromStr;
use std::time::Duration;

use crate::ai::http_client::DEFAULT_TIMEOUT;
use crate::ai::retry::RetryPolicy;
use crate::error::AnalysisError;

pub const REQUEST_TIMEOUT_VAR: &str = "PMC_REQUEST_TIMEOUT_SECS";
pub const RETRY_MAX_ATTEMPTS_VAR: &str = "PMC_RETRY_MAX_ATTEMPTS";
pub const RETRY_INITIAL_DELAY_VAR: &str = "PMC_RETRY_INITIAL_DELAY_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Defaults overridden by any `PMC_*` variables set in the process environment
    pub fn from_env() -> Result<Self, AnalysisError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AnalysisError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(secs) = parse_var::<u64, _>(&lookup, REQUEST_TIMEOUT_VAR)? {
            if secs == 0 {
                return Err(AnalysisError::Config(format!(
                    "{} must be greater than zero",
                    REQUEST_TIMEOUT_VAR
                )));
            }
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(attempts) = parse_var::<u32, _>(&lookup, RETRY_MAX_ATTEMPTS_VAR)? {
            if attempts == 0 {
                return Err(AnalysisError::Config(format!(
                    "{} must be at least 1",
                    RETRY_MAX_ATTEMPTS_VAR
                )));
            }
            config.retry.max_attempts = attempts;
        }

        if let Some(ms) = parse_var::<u64, _>(&lookup, RETRY_INITIAL_DELAY_VAR)? {
            config.retry.initial_delay = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, AnalysisError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|e| AnalysisError::Config(format!("invalid {} value '{}': {}", key, raw, e)))
}
