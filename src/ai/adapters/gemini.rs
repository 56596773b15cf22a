//! Native Gemini `generateContent`

use serde::{Deserialize, Serialize};

use super::{to_body, unreadable_response, ProviderRequest, REPORT_TEMPERATURE};
use crate::ai::credentials::Credentials;
use crate::ai::http_client::HttpRequest;
use crate::ai::providers::ProviderDescriptor;
use crate::error::AnalysisError;

pub struct GeminiAdapter<'a> {
    provider: &'a ProviderDescriptor,
}

impl<'a> GeminiAdapter<'a> {
    pub fn new(provider: &'a ProviderDescriptor) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &'a ProviderDescriptor {
        self.provider
    }

    pub fn build_request(
        &self,
        request: &ProviderRequest,
        credentials: &Credentials,
    ) -> Result<HttpRequest, AnalysisError> {
        // Image goes before the text part
        let mut parts = Vec::with_capacity(2);
        if let Some(image) = &request.image {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.base64_data.clone(),
                },
            });
        }
        parts.push(Part::Text {
            text: request.user_content.clone(),
        });

        let body = GenerateContentRequest {
            system_instruction: SystemInstruction {
                parts: vec![Part::Text {
                    text: request.system_instruction.clone(),
                }],
            },
            contents: vec![Content {
                role: "user",
                parts,
            }],
            generation_config: GenerationConfig {
                response_mime_type: self
                    .provider
                    .supports_json_mode
                    .then_some("application/json"),
                temperature: REPORT_TEMPERATURE,
            },
        };

        Ok(HttpRequest {
            provider: self.provider.display_name.to_string(),
            url: format!(
                "{}/v1beta/models/{}:generateContent",
                self.provider.endpoint.base_url, credentials.model_id
            ),
            headers: vec![("x-goog-api-key".to_string(), credentials.api_key.clone())],
            body: to_body(&body)?,
        })
    }

    /// Concatenated text parts of the first candidate
    pub fn extract_text(&self, body: &str) -> Result<String, AnalysisError> {
        let response: GenerateContentResponse = serde_json::from_str(body)
            .map_err(|e| unreadable_response(self.provider, e, body))?;

        Ok(response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: SystemInstruction,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    temperature: f64,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}
