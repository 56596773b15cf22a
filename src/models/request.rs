//! Analysis input contract

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AnalysisError;

const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Language for narrative emphasis in the report
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ar => "ar",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "ar" => Ok(Self::Ar),
            other => Err(AnalysisError::InvalidRequest(format!(
                "unsupported language '{}', expected 'en' or 'ar'",
                other
            ))),
        }
    }
}

/// Schedule content submitted for review
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulePayload {
    /// CSV, XML export or narrative text
    Text(String),
    /// Screenshot of a Gantt chart or schedule table
    Image {
        mime_type: String,
        base64_data: String,
    },
}

impl SchedulePayload {
    /// Build an image payload from raw base64 or a `data:<mime>;base64,` URL
    pub fn image_from_data(input: &str) -> Result<Self, AnalysisError> {
        let input = input.trim();
        let (mime_type, base64_data) = match input.split_once("base64,") {
            Some((prefix, data)) => {
                let mime = prefix
                    .strip_prefix("data:")
                    .map(|rest| rest.trim_end_matches(';'))
                    .filter(|mime| mime.starts_with("image/"))
                    .unwrap_or(DEFAULT_IMAGE_MIME);
                (mime.to_string(), data.trim())
            }
            None => (DEFAULT_IMAGE_MIME.to_string(), input),
        };

        if base64_data.is_empty() {
            return Err(AnalysisError::InvalidRequest(
                "image payload is empty".to_string(),
            ));
        }
        base64::engine::general_purpose::STANDARD
            .decode(base64_data)
            .map_err(|e| AnalysisError::InvalidRequest(format!("image is not valid base64: {}", e)))?;

        Ok(Self::Image {
            mime_type,
            base64_data: base64_data.to_string(),
        })
    }

    pub fn text(input: impl Into<String>) -> Result<Self, AnalysisError> {
        let input = input.into();
        if input.trim().is_empty() {
            return Err(AnalysisError::InvalidRequest(
                "schedule text is empty".to_string(),
            ));
        }
        Ok(Self::Text(input))
    }
}

/// One analysis call: what to review, against which standard, with which provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub payload: SchedulePayload,
    pub standard_id: String,
    pub language: Language,
    pub provider_id: String,
}

impl AnalysisRequest {
    pub fn new(
        payload: SchedulePayload,
        standard_id: impl Into<String>,
        language: Language,
        provider_id: impl Into<String>,
    ) -> Self {
        Self {
            payload,
            standard_id: standard_id.into(),
            language,
            provider_id: provider_id.into(),
        }
    }

    /// Build a request from the arguments the UI layer passes through
    pub fn from_ui(
        input_data: &str,
        is_image: bool,
        standard_id: &str,
        language: &str,
        provider_id: &str,
    ) -> Result<Self, AnalysisError> {
        let payload = if is_image {
            SchedulePayload::image_from_data(input_data)?
        } else {
            SchedulePayload::text(input_data)?
        };
        Ok(Self::new(payload, standard_id, language.parse()?, provider_id))
    }

    pub fn is_image(&self) -> bool {
        matches!(self.payload, SchedulePayload::Image { .. })
    }
}
