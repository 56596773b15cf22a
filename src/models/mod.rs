pub mod report;
pub mod request;

pub use report::{
    Activity, AnalysisReport, CheckStatus, ComplianceCheck, Finding, LocalizedText, Measure,
    ProjectOverview, RiskAssessment, RiskLevel,
};
pub use request::{AnalysisRequest, Language, SchedulePayload};
