//! Error types for the analysis core
//!
//! Every failure path ends in exactly one `AnalysisError`. Retry decisions are
//! made on `FailureKind`, never on message text.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Classification of a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Rate limited or temporarily unavailable (429/503), worth retrying
    Retryable,
    /// 429 carrying the provider's daily quota signature
    DailyQuotaExceeded,
    /// Anything else, including malformed responses and missing credentials
    Fatal,
    /// The caller raised the abort flag
    Cancelled,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Unknown AI provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid analysis request: {0}")]
    InvalidRequest(String),

    #[error("{provider} API key is not configured. Add the key in Settings or set {key_slot}.")]
    MissingCredential { provider: String, key_slot: String },

    #[error("{provider} does not support image input. Upload the schedule as text (CSV/XML) or choose a vision-capable provider.")]
    ImageNotSupported { provider: String },

    #[error("Daily quota exceeded for {provider}. Try again tomorrow or switch to another provider.")]
    DailyQuotaExceeded { provider: String, message: String },

    #[error("{provider} API error ({status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Request to {provider} failed: {message}")]
    Network {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    #[error("{provider} returned an empty response")]
    EmptyResponse { provider: String },

    #[error("No JSON object found in response")]
    NoJsonObject { raw: String },

    #[error("Failed to parse analysis results: {reason}")]
    MalformedResponse { reason: String, raw: String },

    #[error("Analysis cancelled")]
    Cancelled,

    #[error("Analysis failed. Please try again.")]
    Unavailable {
        #[source]
        source: Box<AnalysisError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// First HTTP-status-looking token in a message, e.g. `"got 503 from upstream"`
static STATUS_IN_MESSAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([45]\d{2})\b").expect("valid status regex"));

impl AnalysisError {
    /// HTTP status carried by this error, falling back to one parsed from the message
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::DailyQuotaExceeded { .. } => Some(429),
            Self::Network {
                status: Some(status),
                ..
            } => Some(*status),
            Self::Network { message, .. } => status_from_message(message),
            _ => None,
        }
    }

    /// Message text used for quota signature matching
    pub fn provider_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. }
            | Self::Network { message, .. }
            | Self::DailyQuotaExceeded { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Kind of this error without provider-specific quota knowledge.
    ///
    /// The retry controller refines `Retryable` into `DailyQuotaExceeded` using the
    /// provider's `QuotaSignature`.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::DailyQuotaExceeded { .. } => FailureKind::DailyQuotaExceeded,
            Self::Cancelled => FailureKind::Cancelled,
            Self::Api { .. } | Self::Network { .. } => match self.status() {
                Some(429) | Some(503) => FailureKind::Retryable,
                _ => FailureKind::Fatal,
            },
            _ => FailureKind::Fatal,
        }
    }

    /// Whether the message is specific enough to show an end user as-is
    pub fn is_user_facing(&self) -> bool {
        match self {
            Self::Network { message, .. } => !message.trim().is_empty(),
            Self::EmptyResponse { .. }
            | Self::NoJsonObject { .. }
            | Self::MalformedResponse { .. }
            | Self::Unavailable { .. } => false,
            _ => true,
        }
    }

    /// Raw model output attached for diagnostics, if any
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::NoJsonObject { raw } | Self::MalformedResponse { raw, .. } => Some(raw),
            Self::Unavailable { source } => source.raw_response(),
            _ => None,
        }
    }

    pub(crate) fn from_reqwest(provider: &str, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else {
            err.to_string()
        };
        Self::Network {
            provider: provider.to_string(),
            status: err.status().map(|s| s.as_u16()),
            message,
        }
    }
}

fn status_from_message(message: &str) -> Option<u16> {
    STATUS_IN_MESSAGE
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
