//! Multi-provider AI review of construction schedules against planning standards
//! (DCMA 14-Point, Saudi Aramco, FIDIC, PMI, general practice), producing a
//! bilingual English/Arabic compliance report.

pub mod ai;
pub mod config;
pub mod error;
pub mod models;

pub use ai::{
    CredentialResolver, CredentialSource, ProviderCatalog, ProviderDescriptor, ProviderId,
    RetryPolicy, ScheduleAnalyzer, Transport,
};
pub use config::AnalyzerConfig;
pub use error::{AnalysisError, FailureKind};
pub use models::{AnalysisReport, AnalysisRequest, Language, LocalizedText, SchedulePayload};

use tracing_subscriber::EnvFilter;

/// Load `.env` and install the log subscriber. Call once at startup.
pub fn init() {
    // Working directory first, then the parent (when run from a subfolder)
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_path("../.env");
    }

    // RUST_LOG=pmc_agent_core=debug for per-request detail
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,pmc_agent_core=info")),
        )
        .try_init();
}
