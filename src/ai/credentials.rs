//! Credential resolution
//!
//! Keys and model overrides are read from an ordered list of named sources,
//! first usable value wins:
//!
//! 1. user overrides (OS keychain, file fallback in dev builds)
//! 2. runtime environment (process env after `.env` loading)
//! 3. build-time environment (captured with `option_env!`)
//!
//! Nothing is cached: overrides can change between two analyses.

use base64::Engine;
use keyring::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::debug;

use super::providers::ProviderDescriptor;
use crate::error::AnalysisError;

const SERVICE_NAME: &str = "com.pmcagent.analysis";

/// Values that were never filled in by the deployment
const PLACEHOLDER_PREFIXES: &[&str] = &["__VITE", "YOUR_"];

/// A read-only configuration surface keyed by fixed slot names
pub trait CredentialSource: Send + Sync {
    fn name(&self) -> &str;
    fn lookup(&self, key: &str) -> Option<String>;
}

/// Resolved key and model for one provider
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub model_id: String,
    /// Name of the source the key came from
    pub key_source: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("model_id", &self.model_id)
            .field("key_source", &self.key_source)
            .finish()
    }
}

/// Whether a configured value can be used as-is
pub fn is_usable_value(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !PLACEHOLDER_PREFIXES.iter().any(|p| value.starts_with(p))
}

pub struct CredentialResolver {
    sources: Vec<Box<dyn CredentialSource>>,
}

impl CredentialResolver {
    pub fn new(sources: Vec<Box<dyn CredentialSource>>) -> Self {
        Self { sources }
    }

    /// Keychain overrides, then process environment, then build-time values
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(KeychainSource::new()),
            Box::new(EnvSource),
            Box::new(BuildEnvSource),
        ])
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Resolve key and model for a provider, `None` when no usable key exists
    pub fn resolve(&self, provider: &ProviderDescriptor) -> Option<Credentials> {
        let (api_key, key_source) = self.first_usable(provider.api_key_slots)?;

        let model_id = self
            .first_usable(&[provider.model_slot])
            .map(|(model, _)| model)
            .unwrap_or_else(|| provider.default_model.to_string());

        debug!(
            provider = provider.id.as_str(),
            source = key_source.as_str(),
            model = model_id.as_str(),
            "Resolved credentials"
        );

        Some(Credentials {
            api_key,
            model_id,
            key_source,
        })
    }

    pub fn has_api_key(&self, provider: &ProviderDescriptor) -> bool {
        self.first_usable(provider.api_key_slots).is_some()
    }

    fn first_usable(&self, slots: &[&str]) -> Option<(String, String)> {
        self.sources.iter().find_map(|source| {
            slots.iter().find_map(|slot| {
                source
                    .lookup(slot)
                    .filter(|value| is_usable_value(value))
                    .map(|value| (value.trim().to_string(), source.name().to_string()))
            })
        })
    }
}

/// In-memory table, used for runtime-injected configuration and user overrides held by a UI
pub struct MapSource {
    name: String,
    values: RwLock<HashMap<String, String>>,
}

impl MapSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: RwLock::new(HashMap::new()),
        }
    }

    pub fn with(self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.write() {
            values.insert(key.to_string(), value.to_string());
        }
    }

    pub fn remove(&self, key: &str) {
        if let Ok(mut values) = self.values.write() {
            values.remove(key);
        }
    }
}

impl CredentialSource for MapSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }
}

impl<S: CredentialSource + ?Sized> CredentialSource for std::sync::Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn lookup(&self, key: &str) -> Option<String> {
        (**self).lookup(key)
    }
}

/// Process environment (`.env` is loaded into it at startup by `dotenvy`)
pub struct EnvSource;

impl CredentialSource for EnvSource {
    fn name(&self) -> &str {
        "runtime-env"
    }

    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Values baked in at compile time
pub struct BuildEnvSource;

impl CredentialSource for BuildEnvSource {
    fn name(&self) -> &str {
        "build-env"
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let value = match key {
            "VITE_API_KEY" => option_env!("VITE_API_KEY"),
            "API_KEY" => option_env!("API_KEY"),
            "VITE_GEMINI_MODEL" => option_env!("VITE_GEMINI_MODEL"),
            "VITE_OPENAI_API_KEY" => option_env!("VITE_OPENAI_API_KEY"),
            "VITE_OPENAI_MODEL" => option_env!("VITE_OPENAI_MODEL"),
            "VITE_GROQ_API_KEY" => option_env!("VITE_GROQ_API_KEY"),
            "VITE_GROQ_MODEL" => option_env!("VITE_GROQ_MODEL"),
            "VITE_OPENROUTER_API_KEY" => option_env!("VITE_OPENROUTER_API_KEY"),
            "VITE_OPENROUTER_MODEL" => option_env!("VITE_OPENROUTER_MODEL"),
            "VITE_PERPLEXITY_API_KEY" => option_env!("VITE_PERPLEXITY_API_KEY"),
            "VITE_PERPLEXITY_MODEL" => option_env!("VITE_PERPLEXITY_MODEL"),
            _ => None,
        };
        value.map(str::to_string)
    }
}

/// User-entered overrides stored in the OS keychain by the settings screen.
///
/// Debug builds also read a base64 file fallback under the config dir, for
/// machines without a keychain.
pub struct KeychainSource {
    service: String,
    fallback_dir: Option<PathBuf>,
}

impl KeychainSource {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
            fallback_dir: default_fallback_dir(),
        }
    }

    pub fn with_service(service: impl Into<String>, fallback_dir: Option<PathBuf>) -> Self {
        Self {
            service: service.into(),
            fallback_dir,
        }
    }

    fn fallback_path(&self, key: &str) -> Option<PathBuf> {
        self.fallback_dir.as_ref().map(|dir| dir.join(key))
    }

    /// Save a user override: keychain first, dev file fallback second
    pub fn store(&self, key: &str, value: &str) -> Result<(), AnalysisError> {
        match Entry::new(&self.service, key).and_then(|entry| entry.set_password(value)) {
            Ok(()) => return Ok(()),
            Err(e) => debug!(key, error = %e, "Keychain unavailable"),
        }

        let path = self.fallback_path(key).ok_or_else(|| {
            AnalysisError::Config("Secure credential storage (keychain) unavailable".to_string())
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AnalysisError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let encoded = base64::engine::general_purpose::STANDARD.encode(value);
        fs::write(&path, encoded)
            .map_err(|e| AnalysisError::Config(format!("Failed to write API key: {}", e)))?;
        debug!(path = %path.display(), "Stored override in file fallback");
        Ok(())
    }

    /// Drop a user override from the keychain and the file fallback
    pub fn remove(&self, key: &str) -> Result<(), AnalysisError> {
        if let Ok(entry) = Entry::new(&self.service, key) {
            let _ = entry.delete_credential();
        }

        if let Some(path) = self.fallback_path(key) {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    AnalysisError::Config(format!("Failed to delete API key file: {}", e))
                })?;
            }
        }
        Ok(())
    }

    fn read_fallback(&self, key: &str) -> Option<String> {
        let path = self.fallback_path(key)?;
        let encoded = fs::read_to_string(&path).ok()?;
        match base64::engine::general_purpose::STANDARD.decode(encoded.trim()) {
            Ok(bytes) => String::from_utf8(bytes).ok(),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Ignoring undecodable credential file");
                None
            }
        }
    }
}

impl Default for KeychainSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialSource for KeychainSource {
    fn name(&self) -> &str {
        "user-override"
    }

    fn lookup(&self, key: &str) -> Option<String> {
        if let Ok(entry) = Entry::new(&self.service, key) {
            if let Ok(password) = entry.get_password() {
                return Some(password);
            }
        }

        self.read_fallback(key)
    }
}

#[cfg(debug_assertions)]
fn default_fallback_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pmc-agent"))
}

#[cfg(not(debug_assertions))]
fn default_fallback_dir() -> Option<PathBuf> {
    None
}
