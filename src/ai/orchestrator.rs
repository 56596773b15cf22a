//! Schedule analysis orchestrator
//!
//! Runs one review end to end:
//! 1. Pick the planning standard and build the prompt
//! 2. Check the provider can take the payload and that a key is configured
//! 3. Call the provider through the retry controller
//! 4. Recover and decode the report
//!
//! Nothing is shared between calls except the immutable catalog and the
//! credential sources, which are read fresh every time.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::adapters::{ProviderAdapter, ProviderRequest};
use super::credentials::CredentialResolver;
use super::http_client::{ReqwestTransport, Transport, DEFAULT_TIMEOUT};
use super::json_parser::parse_report;
use super::prompts::{build_system_instruction, build_user_content};
use super::providers::{ProviderCatalog, ProviderId};
use super::retry::{RetryController, RetryPolicy};
use super::standards::{find_standard, is_known_standard};
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::models::{AnalysisReport, AnalysisRequest};

pub struct ScheduleAnalyzer {
    catalog: ProviderCatalog,
    resolver: CredentialResolver,
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    abort_flag: Option<Arc<AtomicBool>>,
}

impl ScheduleAnalyzer {
    /// Built-in providers, standard credential sources and the shared HTTP client
    pub fn new(config: AnalyzerConfig) -> Result<Self, AnalysisError> {
        let transport = if config.request_timeout == DEFAULT_TIMEOUT {
            ReqwestTransport::new()
        } else {
            ReqwestTransport::with_timeout(config.request_timeout)?
        };

        Ok(Self::with_parts(
            ProviderCatalog::builtin(),
            CredentialResolver::standard(),
            Arc::new(transport),
            config.retry,
        ))
    }

    pub fn with_parts(
        catalog: ProviderCatalog,
        resolver: CredentialResolver,
        transport: Arc<dyn Transport>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            catalog,
            resolver,
            transport,
            retry,
            abort_flag: None,
        }
    }

    /// Shared flag checked before each attempt of every analysis run by this
    /// analyzer. It is never reset here, so once raised every later `analyze`
    /// fails with `Cancelled` until the caller clears it. A request already on
    /// the wire is not interrupted. Use `analyze_with_abort` to cancel a
    /// single analysis.
    pub fn with_abort_flag(mut self, abort_flag: Arc<AtomicBool>) -> Self {
        self.abort_flag = Some(abort_flag);
        self
    }

    pub fn provider_catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    /// Providers with a usable API key right now
    pub fn configured_providers(&self) -> Vec<ProviderId> {
        self.catalog
            .iter()
            .filter(|provider| self.resolver.has_api_key(provider))
            .map(|provider| provider.id)
            .collect()
    }

    pub fn is_any_provider_configured(&self) -> bool {
        self.catalog
            .iter()
            .any(|provider| self.resolver.has_api_key(provider))
    }

    /// Entry point for UI layers passing raw arguments
    pub async fn analyze_schedule(
        &self,
        input_data: &str,
        is_image: bool,
        standard_id: &str,
        language: &str,
        provider_id: &str,
    ) -> Result<AnalysisReport, AnalysisError> {
        let request =
            AnalysisRequest::from_ui(input_data, is_image, standard_id, language, provider_id)?;
        self.analyze(&request).await
    }

    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisReport, AnalysisError> {
        self.analyze_inner(request, self.abort_flag.clone()).await
    }

    /// Like `analyze`, cancelled by `abort_flag` instead of the analyzer-wide flag
    pub async fn analyze_with_abort(
        &self,
        request: &AnalysisRequest,
        abort_flag: Arc<AtomicBool>,
    ) -> Result<AnalysisReport, AnalysisError> {
        self.analyze_inner(request, Some(abort_flag)).await
    }

    async fn analyze_inner(
        &self,
        request: &AnalysisRequest,
        abort_flag: Option<Arc<AtomicBool>>,
    ) -> Result<AnalysisReport, AnalysisError> {
        let request_id = Uuid::new_v4();
        let span = info_span!(
            "analysis",
            %request_id,
            provider = request.provider_id.as_str(),
            standard = request.standard_id.as_str(),
            language = request.language.as_str()
        );

        async move {
            let started = Instant::now();
            match self.run(request, abort_flag).await {
                Ok(report) => {
                    info!(
                        risk_level = ?report.overall_risk(),
                        checks = report.dcma_analysis.len(),
                        failed = report.failed_checks().count(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Analysis complete"
                    );
                    Ok(report)
                }
                Err(err) => {
                    warn!(
                        error = %err,
                        kind = ?err.kind(),
                        has_raw = err.raw_response().is_some(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Analysis failed"
                    );
                    Err(surface_error(err))
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        request: &AnalysisRequest,
        abort_flag: Option<Arc<AtomicBool>>,
    ) -> Result<AnalysisReport, AnalysisError> {
        let standard = find_standard(&request.standard_id);
        if !is_known_standard(&request.standard_id) {
            debug!(
                requested = request.standard_id.as_str(),
                using = standard.id,
                "Unknown standard, falling back"
            );
        }

        let provider_id: ProviderId = request.provider_id.parse()?;
        let provider = self
            .catalog
            .descriptor(provider_id)
            .ok_or_else(|| AnalysisError::UnknownProvider(request.provider_id.clone()))?;

        let provider_request = ProviderRequest::new(
            build_system_instruction(standard, request.language),
            build_user_content(&request.payload),
            &request.payload,
        );

        let adapter = ProviderAdapter::for_provider(provider);
        adapter.check_capabilities(&provider_request)?;

        let credentials =
            self.resolver
                .resolve(provider)
                .ok_or_else(|| AnalysisError::MissingCredential {
                    provider: provider.display_name.to_string(),
                    key_slot: provider.primary_key_slot().to_string(),
                })?;

        info!(
            model = credentials.model_id.as_str(),
            key_source = credentials.key_source.as_str(),
            image = request.is_image(),
            "Starting analysis"
        );

        let controller = RetryController::new(self.retry, &provider.quota_signature)
            .with_abort_flag(abort_flag);
        let transport = self.transport.as_ref();

        let raw = controller
            .run(|| adapter.send(transport, &provider_request, Some(&credentials)))
            .await?;

        parse_report(&raw)
    }
}

/// Replace errors that would only confuse an end user with a generic one
fn surface_error(err: AnalysisError) -> AnalysisError {
    if err.is_user_facing() {
        err
    } else {
        AnalysisError::Unavailable {
            source: Box::new(err),
        }
    }
}
