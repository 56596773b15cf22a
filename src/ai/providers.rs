//! Provider catalog
//!
//! One immutable `ProviderDescriptor` per supported backend. The descriptor id is
//! the key used for credential lookup, adapter dispatch and error messages.

use once_cell::sync::Lazy;
use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AnalysisError;

/// Supported AI providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Gemini,
    OpenAi,
    Groq,
    OpenRouter,
    Perplexity,
}

impl ProviderId {
    pub const ALL: [ProviderId; 5] = [
        Self::Gemini,
        Self::OpenAi,
        Self::Groq,
        Self::OpenRouter,
        Self::Perplexity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Groq => "groq",
            Self::OpenRouter => "openrouter",
            Self::Perplexity => "perplexity",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AnalysisError::UnknownProvider(s.to_string()))
    }
}

/// Request/response family spoken by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// Native Gemini `generateContent` with inline image parts
    GeminiGenerateContent,
    /// OpenAI-compatible `/chat/completions`
    ChatCompletions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub base_url: String,
    pub wire: WireFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelOption {
    pub id: &'static str,
    pub name: &'static str,
}

/// Message patterns that mark a 429 as daily quota exhaustion for one provider
#[derive(Debug, Clone)]
pub struct QuotaSignature {
    patterns: RegexSet,
}

impl QuotaSignature {
    pub fn new<I, S>(patterns: I) -> Result<Self, AnalysisError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        RegexSet::new(patterns)
            .map(|patterns| Self { patterns })
            .map_err(|e| AnalysisError::Config(format!("invalid quota pattern: {}", e)))
    }

    /// Signature that never matches
    pub fn none() -> Self {
        Self {
            patterns: RegexSet::empty(),
        }
    }

    pub fn matches(&self, message: &str) -> bool {
        self.patterns.is_match(message)
    }
}

#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    pub id: ProviderId,
    pub display_name: &'static str,
    pub default_model: &'static str,
    pub models: &'static [ModelOption],
    pub supports_image: bool,
    /// Whether the backend accepts `response_format: json_object`
    pub supports_json_mode: bool,
    pub endpoint: Endpoint,
    /// Configuration keys holding the API key, primary first
    pub api_key_slots: &'static [&'static str],
    pub model_slot: &'static str,
    pub quota_signature: QuotaSignature,
}

impl ProviderDescriptor {
    pub fn primary_key_slot(&self) -> &'static str {
        self.api_key_slots.first().copied().unwrap_or_default()
    }
}

static BUILTIN_CATALOG: Lazy<ProviderCatalog> = Lazy::new(|| ProviderCatalog {
    providers: vec![
        ProviderDescriptor {
            id: ProviderId::Gemini,
            display_name: "Google Gemini",
            default_model: "gemini-2.5-flash",
            models: &[
                ModelOption { id: "gemini-2.5-flash", name: "Gemini 2.5 Flash" },
                ModelOption { id: "gemini-3-pro-preview", name: "Gemini 3 Pro Preview" },
                ModelOption { id: "gemini-2.0-flash", name: "Gemini 2.0 Flash" },
                ModelOption { id: "gemini-1.5-pro", name: "Gemini 1.5 Pro" },
                ModelOption { id: "gemini-1.5-flash", name: "Gemini 1.5 Flash" },
            ],
            supports_image: true,
            supports_json_mode: true,
            endpoint: Endpoint {
                base_url: "https://generativelanguage.googleapis.com".to_string(),
                wire: WireFormat::GeminiGenerateContent,
            },
            api_key_slots: &["VITE_API_KEY", "API_KEY"],
            model_slot: "VITE_GEMINI_MODEL",
            quota_signature: builtin_signature(&[r"PerDay", r"(?i)quota exceeded", r"limit: 20\b"]),
        },
        ProviderDescriptor {
            id: ProviderId::OpenAi,
            display_name: "OpenAI GPT-4o",
            default_model: "gpt-4o",
            models: &[
                ModelOption { id: "gpt-4o", name: "GPT-4o" },
                ModelOption { id: "gpt-4-turbo", name: "GPT-4 Turbo" },
                ModelOption { id: "gpt-3.5-turbo", name: "GPT-3.5 Turbo" },
            ],
            supports_image: true,
            supports_json_mode: true,
            endpoint: Endpoint {
                base_url: "https://api.openai.com/v1".to_string(),
                wire: WireFormat::ChatCompletions,
            },
            api_key_slots: &["VITE_OPENAI_API_KEY"],
            model_slot: "VITE_OPENAI_MODEL",
            quota_signature: builtin_signature(&[
                r"insufficient_quota",
                r"(?i)exceeded your current quota",
            ]),
        },
        ProviderDescriptor {
            id: ProviderId::Groq,
            display_name: "Groq (Llama 3)",
            default_model: "llama-3.3-70b-versatile",
            models: &[
                ModelOption { id: "llama-3.3-70b-versatile", name: "Llama 3.3 70B" },
                ModelOption { id: "llama-3.1-70b-versatile", name: "Llama 3.1 70B" },
                ModelOption { id: "llama3-70b-8192", name: "Llama 3 70B" },
                ModelOption { id: "mixtral-8x7b-32768", name: "Mixtral 8x7b" },
                ModelOption { id: "llama-3.2-90b-vision-preview", name: "Llama 3.2 90B Vision" },
            ],
            supports_image: false,
            supports_json_mode: true,
            endpoint: Endpoint {
                base_url: "https://api.groq.com/openai/v1".to_string(),
                wire: WireFormat::ChatCompletions,
            },
            api_key_slots: &["VITE_GROQ_API_KEY"],
            model_slot: "VITE_GROQ_MODEL",
            quota_signature: builtin_signature(&[r"(?i)per day", r"\((?:TPD|RPD)\)"]),
        },
        ProviderDescriptor {
            id: ProviderId::OpenRouter,
            display_name: "OpenRouter",
            default_model: "google/gemini-2.0-flash-001",
            models: &[
                ModelOption { id: "google/gemini-2.0-flash-001", name: "Google Gemini 2.0 Flash" },
                ModelOption { id: "anthropic/claude-3.5-sonnet", name: "Claude 3.5 Sonnet" },
                ModelOption { id: "anthropic/claude-3-opus", name: "Claude 3 Opus" },
                ModelOption { id: "meta-llama/llama-3-70b-instruct", name: "Llama 3 70B" },
            ],
            supports_image: true,
            supports_json_mode: true,
            endpoint: Endpoint {
                base_url: "https://openrouter.ai/api/v1".to_string(),
                wire: WireFormat::ChatCompletions,
            },
            api_key_slots: &["VITE_OPENROUTER_API_KEY"],
            model_slot: "VITE_OPENROUTER_MODEL",
            quota_signature: builtin_signature(&[r"(?i)per[ -]day", r"(?i)daily limit"]),
        },
        ProviderDescriptor {
            id: ProviderId::Perplexity,
            display_name: "Perplexity",
            default_model: "sonar",
            models: &[
                ModelOption { id: "sonar", name: "Sonar" },
                ModelOption { id: "sonar-pro", name: "Sonar Pro" },
            ],
            supports_image: false,
            supports_json_mode: false,
            endpoint: Endpoint {
                base_url: "https://api.perplexity.ai".to_string(),
                wire: WireFormat::ChatCompletions,
            },
            api_key_slots: &["VITE_PERPLEXITY_API_KEY"],
            model_slot: "VITE_PERPLEXITY_MODEL",
            quota_signature: builtin_signature(&[r"(?i)per day"]),
        },
    ],
});

fn builtin_signature(patterns: &[&str]) -> QuotaSignature {
    QuotaSignature {
        patterns: RegexSet::new(patterns).expect("builtin quota patterns are valid"),
    }
}

/// Immutable set of provider descriptors, looked up per request
#[derive(Debug, Clone)]
pub struct ProviderCatalog {
    providers: Vec<ProviderDescriptor>,
}

impl ProviderCatalog {
    pub fn builtin() -> Self {
        BUILTIN_CATALOG.clone()
    }

    /// Point a provider at another base URL (proxy, gateway or test server)
    pub fn with_base_url(mut self, id: ProviderId, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        if let Some(provider) = self.providers.iter_mut().find(|p| p.id == id) {
            provider.endpoint.base_url = base_url.trim_end_matches('/').to_string();
        }
        self
    }

    /// Replace the quota classifier for one provider
    pub fn with_quota_signature(mut self, id: ProviderId, signature: QuotaSignature) -> Self {
        if let Some(provider) = self.providers.iter_mut().find(|p| p.id == id) {
            provider.quota_signature = signature;
        }
        self
    }

    pub fn get(&self, id: &str) -> Option<&ProviderDescriptor> {
        let id: ProviderId = id.parse().ok()?;
        self.descriptor(id)
    }

    pub fn descriptor(&self, id: ProviderId) -> Option<&ProviderDescriptor> {
        self.providers.iter().find(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderDescriptor> {
        self.providers.iter()
    }
}

impl Default for ProviderCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
