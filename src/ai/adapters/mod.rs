//! Provider adapters
//!
//! Each adapter turns the common `ProviderRequest` into one backend's wire
//! format and the backend's response back into raw text. Dispatch is a closed
//! enum keyed by the descriptor's wire format; a new backend family is a new
//! variant here.

mod chat_completions;
mod gemini;

pub use chat_completions::ChatCompletionsAdapter;
pub use gemini::GeminiAdapter;

use serde::Deserialize;
use tracing::debug;

use super::credentials::Credentials;
use super::http_client::{HttpRequest, HttpResponse, Transport};
use super::providers::{ProviderDescriptor, WireFormat};
use crate::error::AnalysisError;
use crate::models::SchedulePayload;

/// Sampling temperature for report generation; low for stable structure
pub const REPORT_TEMPERATURE: f64 = 0.2;

/// Inline image for multimodal providers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub mime_type: String,
    pub base64_data: String,
}

impl ImageInput {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64_data)
    }
}

/// Provider-agnostic request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRequest {
    pub system_instruction: String,
    pub user_content: String,
    pub image: Option<ImageInput>,
}

impl ProviderRequest {
    pub fn new(system_instruction: String, user_content: String, payload: &SchedulePayload) -> Self {
        let image = match payload {
            SchedulePayload::Image {
                mime_type,
                base64_data,
            } => Some(ImageInput {
                mime_type: mime_type.clone(),
                base64_data: base64_data.clone(),
            }),
            SchedulePayload::Text(_) => None,
        };
        Self {
            system_instruction,
            user_content,
            image,
        }
    }
}

pub enum ProviderAdapter<'a> {
    Gemini(GeminiAdapter<'a>),
    ChatCompletions(ChatCompletionsAdapter<'a>),
}

impl<'a> ProviderAdapter<'a> {
    pub fn for_provider(provider: &'a ProviderDescriptor) -> Self {
        match provider.endpoint.wire {
            WireFormat::GeminiGenerateContent => Self::Gemini(GeminiAdapter::new(provider)),
            WireFormat::ChatCompletions => {
                Self::ChatCompletions(ChatCompletionsAdapter::new(provider))
            }
        }
    }

    pub fn provider(&self) -> &'a ProviderDescriptor {
        match self {
            Self::Gemini(adapter) => adapter.provider(),
            Self::ChatCompletions(adapter) => adapter.provider(),
        }
    }

    pub fn supports_image(&self) -> bool {
        self.provider().supports_image
    }

    /// Reject requests the backend cannot serve, before any network call
    pub fn check_capabilities(&self, request: &ProviderRequest) -> Result<(), AnalysisError> {
        if request.image.is_some() && !self.supports_image() {
            return Err(AnalysisError::ImageNotSupported {
                provider: self.provider().display_name.to_string(),
            });
        }
        Ok(())
    }

    pub fn build_request(
        &self,
        request: &ProviderRequest,
        credentials: &Credentials,
    ) -> Result<HttpRequest, AnalysisError> {
        self.check_capabilities(request)?;
        match self {
            Self::Gemini(adapter) => adapter.build_request(request, credentials),
            Self::ChatCompletions(adapter) => adapter.build_request(request, credentials),
        }
    }

    /// Send one request and return the model's raw text
    pub async fn send(
        &self,
        transport: &dyn Transport,
        request: &ProviderRequest,
        credentials: Option<&Credentials>,
    ) -> Result<String, AnalysisError> {
        let provider = self.provider();
        let credentials = credentials.ok_or_else(|| AnalysisError::MissingCredential {
            provider: provider.display_name.to_string(),
            key_slot: provider.primary_key_slot().to_string(),
        })?;

        let http_request = self.build_request(request, credentials)?;
        debug!(
            provider = provider.id.as_str(),
            model = credentials.model_id.as_str(),
            url = http_request.url.as_str(),
            image = request.image.is_some(),
            "Sending analysis request"
        );

        let response = transport.post_json(http_request).await?;
        if !response.is_success() {
            return Err(api_error(provider, &response));
        }

        let text = match self {
            Self::Gemini(adapter) => adapter.extract_text(&response.body)?,
            Self::ChatCompletions(adapter) => adapter.extract_text(&response.body)?,
        };

        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyResponse {
                provider: provider.display_name.to_string(),
            });
        }
        Ok(text)
    }
}

/// Error envelope shared by Gemini and OpenAI-compatible APIs
#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn api_error(provider: &ProviderDescriptor, response: &HttpResponse) -> AnalysisError {
    let message = serde_json::from_str::<ApiErrorBody>(&response.body)
        .map(|body| body.error.message)
        .unwrap_or_else(|_| response.body.trim().to_string());

    AnalysisError::Api {
        provider: provider.display_name.to_string(),
        status: response.status,
        message,
    }
}

fn to_body<T: serde::Serialize>(body: &T) -> Result<serde_json::Value, AnalysisError> {
    serde_json::to_value(body)
        .map_err(|e| AnalysisError::InvalidRequest(format!("Failed to encode request: {}", e)))
}

fn unreadable_response(provider: &ProviderDescriptor, err: serde_json::Error, body: &str) -> AnalysisError {
    AnalysisError::MalformedResponse {
        reason: format!("{} response could not be read: {}", provider.display_name, err),
        raw: body.to_string(),
    }
}
