//! Shared HTTP Client Module
//!
//! Provides a global, lazy-initialized HTTP client for all provider calls plus
//! the `Transport` seam adapters send through. Tests substitute their own
//! transport to count or script network calls.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::AnalysisError;

/// Default request timeout; large reports can take a while to generate
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Global HTTP client for AI provider calls
///
/// - 120s timeout, analyses of large schedules are slow
/// - pooled idle connections with keepalive for repeated analyses
pub static ANALYSIS_CLIENT: Lazy<Client> = Lazy::new(|| {
    build_client(DEFAULT_TIMEOUT).expect("Failed to create analysis HTTP client")
});

fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(15))
        .pool_max_idle_per_host(8)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
}

/// Get the global analysis HTTP client
#[inline]
pub fn analysis_client() -> &'static Client {
    &ANALYSIS_CLIENT
}

/// A JSON POST ready to be sent
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// Display name of the provider, used in errors
    pub provider: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends provider requests; the only place the core touches the network
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(&self, request: HttpRequest) -> Result<HttpResponse, AnalysisError>;
}

/// Transport backed by reqwest
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Use the shared client
    pub fn new() -> Self {
        Self {
            client: analysis_client().clone(),
        }
    }

    /// Dedicated client with its own timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, AnalysisError> {
        let client = build_client(timeout)
            .map_err(|e| AnalysisError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(&self, request: HttpRequest) -> Result<HttpResponse, AnalysisError> {
        let mut builder = self
            .client
            .post(&request.url)
            .header("Content-Type", "application/json");
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .json(&request.body)
            .send()
            .await
            .map_err(|e| AnalysisError::from_reqwest(&request.provider, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::from_reqwest(&request.provider, e))?;

        debug!(
            provider = request.provider.as_str(),
            status,
            bytes = body.len(),
            "Provider responded"
        );

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_is_created() {
        let _ = analysis_client();
    }

    #[test]
    fn test_client_is_same_instance() {
        let client1 = analysis_client();
        let client2 = analysis_client();
        assert!(std::ptr::eq(client1, client2));
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let request = HttpRequest {
            provider: "OpenAI GPT-4o".to_string(),
            url: "https://api.openai.com/v1/chat/completions".to_string(),
            headers: vec![("Authorization".to_string(), "Bearer sk".to_string())],
            body: Value::Null,
        };
        assert_eq!(request.header("authorization"), Some("Bearer sk"));
        assert_eq!(request.header("x-api-key"), None);
    }

    #[test]
    fn test_success_range() {
        assert!(HttpResponse { status: 200, body: String::new() }.is_success());
        assert!(!HttpResponse { status: 429, body: String::new() }.is_success());
    }
}
