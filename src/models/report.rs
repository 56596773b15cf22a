//! Structured compliance report returned by a successful analysis

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Narrative text carried in both report languages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LocalizedText {
    pub en: String,
    pub ar: String,
}

impl LocalizedText {
    pub fn new(en: impl Into<String>, ar: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ar: ar.into(),
        }
    }

    /// Text for the requested language
    pub fn get(&self, language: super::Language) -> &str {
        match language {
            super::Language::En => &self.en,
            super::Language::Ar => &self.ar,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.en.trim().is_empty() && !self.ar.trim().is_empty()
    }
}

/// A number exactly as the model wrote it, or free text such as `"45d"`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Measure {
    Number(Number),
    Text(String),
}

impl Measure {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            Self::Text(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        }
    }
}

/// Overall schedule health
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RiskLevel {
    #[serde(alias = "HIGH", alias = "high")]
    High,
    #[serde(alias = "MEDIUM", alias = "medium")]
    Medium,
    #[serde(alias = "LOW", alias = "low")]
    Low,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CheckStatus {
    #[serde(rename = "PASS", alias = "Pass", alias = "pass")]
    Pass,
    #[serde(rename = "FAIL", alias = "Fail", alias = "fail")]
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOverview {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_activities: Option<Measure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_activities: Option<Measure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Measure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_date: Option<String>,
}

/// One compliance metric, e.g. DCMA check "1. Logic"
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceCheck {
    pub metric: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    /// Comparison against the target, e.g. `"<="`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Measure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Measure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found: Option<Measure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Measure>,
    pub status: CheckStatus,
}

/// Titled observation, used for technical findings and non-compliance issues
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    pub title: LocalizedText,
    pub description: LocalizedText,
}

impl Finding {
    pub fn new(title: LocalizedText, description: LocalizedText) -> Self {
        Self { title, description }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RiskAssessment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<RiskLevel>,
    pub description: LocalizedText,
}

/// Schedule activity as read from the submitted data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Measure,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Measure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_float: Option<Measure>,
    #[serde(default)]
    pub critical: bool,
}

/// Full report produced by one analysis call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    #[serde(default)]
    pub project_overview: ProjectOverview,
    #[serde(default)]
    pub dcma_analysis: Vec<ComplianceCheck>,
    pub summary: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    pub risk_assessment: RiskAssessment,
    #[serde(default, alias = "findings")]
    pub technical_findings: Vec<Finding>,
    #[serde(default)]
    pub non_compliance_issues: Vec<Finding>,
    #[serde(default)]
    pub recommendations: Vec<LocalizedText>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    pub contractor_note: LocalizedText,
    /// Top-level keys outside the schema, kept as emitted
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisReport {
    /// Level from the assessment, else the top-level field, else medium
    pub fn overall_risk(&self) -> RiskLevel {
        self.risk_assessment
            .level
            .or(self.risk_level)
            .unwrap_or(RiskLevel::Medium)
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &ComplianceCheck> {
        self.dcma_analysis
            .iter()
            .filter(|check| check.status == CheckStatus::Fail)
    }

    pub fn critical_activities(&self) -> impl Iterator<Item = &Activity> {
        self.activities.iter().filter(|activity| activity.critical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "projectOverview": {"totalActivities": 120, "criticalActivities": "14", "dataDate": "2025-01-01"},
            "dcmaAnalysis": [
                {"metric": {"en": "1. Logic", "ar": "1. المنطق"}, "operator": "<=", "target": 5, "value": 8.3, "found": 10, "total": 120, "status": "FAIL"},
                {"metric": {"en": "2. Leads", "ar": "2. التداخلات السلبية"}, "target": 0, "value": 0, "status": "PASS"}
            ],
            "summary": {"en": "Schedule needs rework", "ar": "الجدول يحتاج إلى إعادة عمل"},
            "riskLevel": "High",
            "riskAssessment": {"level": "High", "description": {"en": "Open ends", "ar": "نهايات مفتوحة"}},
            "technicalFindings": [{
                "title": {"en": "Open start", "ar": "بداية مفتوحة"},
                "description": {"en": "A1010 has no predecessor", "ar": "النشاط A1010 بدون سابق"}
            }],
            "nonComplianceIssues": [],
            "recommendations": [{"en": "Add logic ties", "ar": "أضف علاقات منطقية"}],
            "activities": [{"id": "A1010", "name": "Mobilization", "duration": 10, "totalFloat": 50, "critical": true}],
            "contractorNote": {"en": "Resubmit", "ar": "أعد التقديم"},
            "generatedBy": "model-x"
        })
    }

    #[test]
    fn test_report_decodes_and_keeps_extra_keys() {
        let report: AnalysisReport = serde_json::from_value(sample()).unwrap();
        assert_eq!(report.overall_risk(), RiskLevel::High);
        assert_eq!(report.technical_findings[0].title.en, "Open start");
        assert_eq!(report.dcma_analysis.len(), 2);
        assert_eq!(report.failed_checks().count(), 1);
        assert_eq!(report.critical_activities().count(), 1);
        assert_eq!(report.extra.get("generatedBy"), Some(&json!("model-x")));
        assert!(report.non_compliance_issues.is_empty());
    }

    #[test]
    fn test_report_serializes_back_to_same_value() {
        let value = sample();
        let report: AnalysisReport = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(serde_json::to_value(&report).unwrap(), value);
    }

    #[test]
    fn test_missing_language_key_is_rejected() {
        let mut value = sample();
        value["summary"] = json!({"en": "English only"});
        assert!(serde_json::from_value::<AnalysisReport>(value).is_err());
    }

    #[test]
    fn test_enum_tokens_accept_case_variants() {
        let mut value = sample();
        value["riskLevel"] = json!("MEDIUM");
        value["riskAssessment"]["level"] = json!("low");
        value["dcmaAnalysis"][0]["status"] = json!("pass");
        let report: AnalysisReport = serde_json::from_value(value).unwrap();
        assert_eq!(report.risk_level, Some(RiskLevel::Medium));
        assert_eq!(report.overall_risk(), RiskLevel::Low);
        assert_eq!(report.dcma_analysis[0].status, CheckStatus::Pass);
    }

    #[test]
    fn test_dashboard_shaped_report_decodes() {
        let value = json!({
            "summary": {"en": "Baseline rejected", "ar": "تم رفض خط الأساس"},
            "riskAssessment": {"level": "High", "description": {"en": "Negative float", "ar": "فائض سلبي"}},
            "technicalFindings": [{
                "title": {"en": "Negative float", "ar": "فائض سلبي"},
                "description": {"en": "12 activities below zero", "ar": "12 نشاطا أقل من الصفر"}
            }],
            "nonComplianceIssues": [{
                "title": {"en": "Hard constraints", "ar": "قيود صارمة"},
                "description": {"en": "3 mandatory finish dates", "ar": "3 تواريخ انتهاء إلزامية"}
            }],
            "contractorNote": {"en": "Resubmit", "ar": "أعد التقديم"}
        });

        let report: AnalysisReport = serde_json::from_value(value).unwrap();

        assert_eq!(report.risk_level, None);
        assert_eq!(report.overall_risk(), RiskLevel::High);
        assert_eq!(report.technical_findings.len(), 1);
        assert_eq!(report.non_compliance_issues[0].title.ar, "قيود صارمة");
    }

    #[test]
    fn test_findings_key_is_accepted() {
        let mut value = sample();
        let findings = value["technicalFindings"].take();
        value.as_object_mut().unwrap().remove("technicalFindings");
        value["findings"] = findings;

        let report: AnalysisReport = serde_json::from_value(value).unwrap();

        assert_eq!(report.technical_findings.len(), 1);
        assert!(report.extra.get("findings").is_none());
    }

    #[test]
    fn test_bare_risk_text_is_rejected() {
        let mut value = sample();
        value["riskAssessment"] = json!({"en": "Open ends", "ar": "نهايات مفتوحة"});
        assert!(serde_json::from_value::<AnalysisReport>(value).is_err());
    }

    #[test]
    fn test_overall_risk_defaults_to_medium() {
        let mut value = sample();
        value.as_object_mut().unwrap().remove("riskLevel");
        value["riskAssessment"].as_object_mut().unwrap().remove("level");
        let report: AnalysisReport = serde_json::from_value(value).unwrap();
        assert_eq!(report.overall_risk(), RiskLevel::Medium);
    }

    #[test]
    fn test_measure_as_f64() {
        assert_eq!(Measure::Text("12.5%".to_string()).as_f64(), Some(12.5));
        assert_eq!(Measure::Number(Number::from(4)).as_f64(), Some(4.0));
        assert_eq!(Measure::Text("n/a".to_string()).as_f64(), None);
    }
}
