//! OpenAI-compatible `/chat/completions` (OpenAI, Groq, OpenRouter, Perplexity)

use serde::{Deserialize, Serialize};

use super::{to_body, unreadable_response, ProviderRequest, REPORT_TEMPERATURE};
use crate::ai::credentials::Credentials;
use crate::ai::http_client::HttpRequest;
use crate::ai::providers::ProviderDescriptor;
use crate::error::AnalysisError;

pub struct ChatCompletionsAdapter<'a> {
    provider: &'a ProviderDescriptor,
}

impl<'a> ChatCompletionsAdapter<'a> {
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
        let user_content = match &request.image {
            Some(image) => MessageContent::Parts(vec![
                ContentPart::Text {
                    text: request.user_content.clone(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image.data_url(),
                    },
                },
            ]),
            None => MessageContent::Text(request.user_content.clone()),
        };

        let body = ChatRequest {
            model: &credentials.model_id,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(request.system_instruction.clone()),
                },
                ChatMessage {
                    role: "user",
                    content: user_content,
                },
            ],
            temperature: REPORT_TEMPERATURE,
            response_format: self
                .provider
                .supports_json_mode
                .then_some(ResponseFormat {
                    kind: "json_object",
                }),
        };

        Ok(HttpRequest {
            provider: self.provider.display_name.to_string(),
            url: format!("{}/chat/completions", self.provider.endpoint.base_url),
            headers: vec![(
                "Authorization".to_string(),
                format!("Bearer {}", credentials.api_key),
            )],
            body: to_body(&body)?,
        })
    }

    /// Text of the first choice; empty when the model returned nothing
    pub fn extract_text(&self, body: &str) -> Result<String, AnalysisError> {
        let response: ChatResponse = serde_json::from_str(body)
            .map_err(|e| unreadable_response(self.provider, e, body))?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

#[derive(Serialize)]
struct ChatRequest<'r> {
    model: &'r str,
    messages: Vec<ChatMessage>,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::adapters::ImageInput;
    use crate::ai::providers::ProviderCatalog;
    use serde_json::json;

    fn credentials(model: &str) -> Credentials {
        Credentials {
            api_key: "sk-test".to_string(),
            model_id: model.to_string(),
            key_source: "test".to_string(),
        }
    }

    #[test]
    fn test_text_request_shape() {
        let catalog = ProviderCatalog::builtin();
        let adapter = ChatCompletionsAdapter::new(catalog.get("groq").unwrap());
        let request = ProviderRequest {
            system_instruction: "Be strict.".to_string(),
            user_content: "A1010,Mobilize,10d".to_string(),
            image: None,
        };

        let http = adapter
            .build_request(&request, &credentials("llama-3.3-70b-versatile"))
            .unwrap();

        assert_eq!(http.url, "https://api.groq.com/openai/v1/chat/completions");
        assert_eq!(http.header("Authorization"), Some("Bearer sk-test"));
        assert_eq!(
            http.body,
            json!({
                "model": "llama-3.3-70b-versatile",
                "messages": [
                    {"role": "system", "content": "Be strict."},
                    {"role": "user", "content": "A1010,Mobilize,10d"}
                ],
                "temperature": 0.2,
                "response_format": {"type": "json_object"}
            })
        );
    }

    #[test]
    fn test_image_request_uses_data_url() {
        let catalog = ProviderCatalog::builtin();
        let adapter = ChatCompletionsAdapter::new(catalog.get("openai").unwrap());
        let request = ProviderRequest {
            system_instruction: "Be strict.".to_string(),
            user_content: "Review this chart.".to_string(),
            image: Some(ImageInput {
                mime_type: "image/jpeg".to_string(),
                base64_data: "/9j/4AAQ".to_string(),
            }),
        };

        let http = adapter.build_request(&request, &credentials("gpt-4o")).unwrap();

        assert_eq!(
            http.body["messages"][1]["content"],
            json!([
                {"type": "text", "text": "Review this chart."},
                {"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,/9j/4AAQ"}}
            ])
        );
    }

    #[test]
    fn test_json_mode_omitted_when_unsupported() {
        let catalog = ProviderCatalog::builtin();
        let adapter = ChatCompletionsAdapter::new(catalog.get("perplexity").unwrap());
        let request = ProviderRequest {
            system_instruction: "s".to_string(),
            user_content: "u".to_string(),
            image: None,
        };

        let http = adapter.build_request(&request, &credentials("sonar")).unwrap();

        assert_eq!(http.url, "https://api.perplexity.ai/chat/completions");
        assert!(http.body.get("response_format").is_none());
        assert_eq!(http.body["model"], "sonar");
    }

    #[test]
    fn test_extract_text() {
        let catalog = ProviderCatalog::builtin();
        let adapter = ChatCompletionsAdapter::new(catalog.get("openrouter").unwrap());

        let body = r#"{"id": "gen-1", "choices": [{"index": 0, "message": {"role": "assistant", "content": "{\"riskLevel\": \"Low\"}"}}]}"#;
        assert_eq!(adapter.extract_text(body).unwrap(), r#"{"riskLevel": "Low"}"#);

        assert_eq!(adapter.extract_text(r#"{"choices": []}"#).unwrap(), "");
        assert_eq!(
            adapter
                .extract_text(r#"{"choices": [{"message": {"content": null}}]}"#)
                .unwrap(),
            ""
        );
    }

    #[test]
    fn test_unreadable_body() {
        let catalog = ProviderCatalog::builtin();
        let adapter = ChatCompletionsAdapter::new(catalog.get("openai").unwrap());

        match adapter.extract_text("<html>gateway</html>").unwrap_err() {
            AnalysisError::MalformedResponse { raw, .. } => assert_eq!(raw, "<html>gateway</html>"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
