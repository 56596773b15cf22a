pub mod adapters;
pub mod credentials;
pub mod http_client;
pub mod json_parser;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod retry;
pub mod standards;

pub use adapters::{ImageInput, ProviderAdapter, ProviderRequest};
pub use credentials::*;
pub use http_client::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use json_parser::{extract_json, parse_report, recover_json};
pub use orchestrator::ScheduleAnalyzer;
pub use providers::*;
pub use retry::{RetryController, RetryPolicy};
pub use standards::{find_standard, is_known_standard, PlanningStandard, DCMA_METRICS, PLANNING_STANDARDS};
