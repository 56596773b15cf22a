//! JSON recovery for model output
//!
//! Models asked for JSON usually start with `{` but may wrap the object in a
//! markdown fence, open with prose, or trail off with commentary or a cut-off
//! structure. `recover_json` strips those in a fixed order and fails loudly when
//! no complete object can be found; it never returns a partial object.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::AnalysisError;
use crate::models::AnalysisReport;

const FENCE: &str = "```";

/// Recover a single JSON object from raw model text
pub fn recover_json(raw: &str) -> Result<Value, AnalysisError> {
    let text = fenced_content(raw).unwrap_or(raw);

    let start = text.find('{').ok_or_else(|| AnalysisError::NoJsonObject {
        raw: raw.to_string(),
    })?;
    let text = &text[start..];

    // Peel from the end: try each `}` as the closing brace, last one first
    let mut search_end = text.len();
    while let Some(close) = text[..search_end].rfind('}') {
        if let Ok(value) = serde_json::from_str::<Value>(&text[..=close]) {
            return Ok(value);
        }
        search_end = close;
    }

    serde_json::from_str::<Value>(text).map_err(|e| AnalysisError::MalformedResponse {
        reason: e.to_string(),
        raw: raw.to_string(),
    })
}

/// Recover and decode into a typed value
pub fn extract_json<T: DeserializeOwned>(raw: &str) -> Result<T, AnalysisError> {
    let value = recover_json(raw)?;
    serde_json::from_value(value).map_err(|e| AnalysisError::MalformedResponse {
        reason: e.to_string(),
        raw: raw.to_string(),
    })
}

/// Recover the compliance report from a provider response
pub fn parse_report(raw: &str) -> Result<AnalysisReport, AnalysisError> {
    extract_json(raw)
}

/// Content of the first closed ``` fence, without its language tag
fn fenced_content(text: &str) -> Option<&str> {
    let open = text.find(FENCE)?;
    let after_open = &text[open + FENCE.len()..];

    // Language tag: letters/digits right after the fence, e.g. ```json
    let tag_len = after_open
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(after_open.len());
    let body = &after_open[tag_len..];

    let close = body.find(FENCE)?;
    Some(body[..close].trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fenced_block_with_tag_and_prose() {
        let raw = "prefix ```json {\"a\": 1, \"b\": [true]} ``` suffix";
        assert_eq!(recover_json(raw).unwrap(), json!({"a": 1, "b": [true]}));
    }

    #[test]
    fn test_fenced_block_on_own_lines() {
        let raw = "Here's the analysis:\n```json\n{\"summary\": {\"en\": \"ok\", \"ar\": \"حسنا\"}}\n```\nThat's it.";
        assert_eq!(
            recover_json(raw).unwrap(),
            json!({"summary": {"en": "ok", "ar": "حسنا"}})
        );
    }

    #[test]
    fn test_fence_without_tag() {
        let raw = "```\n{\"x\": \"y\"}\n```";
        assert_eq!(recover_json(raw).unwrap(), json!({"x": "y"}));
    }

    #[test]
    fn test_unclosed_fence_uses_whole_text() {
        let raw = "```json\n{\"x\": 2}";
        assert_eq!(recover_json(raw).unwrap(), json!({"x": 2}));
    }

    #[test]
    fn test_leading_prose_is_discarded() {
        let raw = "Sure! As a scheduling expert, here is my review: {\"riskLevel\": \"Low\"}";
        assert_eq!(recover_json(raw).unwrap(), json!({"riskLevel": "Low"}));
    }

    #[test]
    fn test_trailing_garbage_is_peeled() {
        let expected = json!({"technicalFindings": [{"en": "open end", "ar": "نهاية مفتوحة"}], "n": 3});
        let raw = format!("{} \n\nLet me know if you need anything else :) }} oops", expected);
        assert_eq!(recover_json(&raw).unwrap(), expected);
    }

    #[test]
    fn test_truncated_trailing_structure_is_peeled() {
        let raw = r#"{"summary": {"en": "a", "ar": "b"}} {"partial": {"x": 1}"#;
        assert_eq!(
            recover_json(raw).unwrap(),
            json!({"summary": {"en": "a", "ar": "b"}})
        );
    }

    #[test]
    fn test_no_object_found() {
        let err = recover_json("I cannot analyze this schedule.").unwrap_err();
        assert!(matches!(err, AnalysisError::NoJsonObject { .. }));
        assert_eq!(err.to_string(), "No JSON object found in response");
    }

    #[test]
    fn test_malformed_keeps_raw_text() {
        let raw = "Result: {\"summary\": \"unterminated";
        match recover_json(raw).unwrap_err() {
            AnalysisError::MalformedResponse { raw: kept, .. } => assert_eq!(kept, raw),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_report_round_trip() {
        let report = json!({
            "projectOverview": {"totalActivities": 42, "dataDate": "2025-03-01"},
            "dcmaAnalysis": [
                {"metric": {"en": "1. Logic", "ar": "1. المنطق"}, "target": 5, "value": 12.5, "status": "FAIL"}
            ],
            "summary": {"en": "Needs rework {see notes}", "ar": "يحتاج إلى إعادة عمل"},
            "riskLevel": "Medium",
            "riskAssessment": {
                "level": "Medium",
                "description": {"en": "Open ends } present", "ar": "نهايات مفتوحة"}
            },
            "technicalFindings": [],
            "nonComplianceIssues": [{
                "title": {"en": "Hard constraints", "ar": "قيود صارمة"},
                "description": {"en": "Mandatory finish on A1040", "ar": "انتهاء إلزامي على A1040"}
            }],
            "recommendations": [],
            "activities": [{"id": 1010, "name": "Pour slab", "critical": false}],
            "contractorNote": {"en": "Dear Contractor,", "ar": "السادة المقاول،"}
        });
        let text = serde_json::to_string_pretty(&report).unwrap();
        assert_eq!(recover_json(&text).unwrap(), report);

        let typed = parse_report(&text).unwrap();
        assert_eq!(typed.dcma_analysis.len(), 1);
        assert_eq!(serde_json::to_value(&typed).unwrap(), report);
    }

    #[test]
    fn test_parse_report_accepts_dashboard_shape() {
        let raw = r#"```json
{"summary": {"en": "s", "ar": "م"},
 "riskAssessment": {"level": "High", "description": {"en": "Negative float", "ar": "فائض سلبي"}},
 "technicalFindings": [{"title": {"en": "Float", "ar": "الفائض"}, "description": {"en": "d", "ar": "و"}}],
 "contractorNote": {"en": "a", "ar": "b"}}
```"#;
        let report = parse_report(raw).unwrap();
        assert_eq!(report.overall_risk(), crate::models::RiskLevel::High);
        assert_eq!(report.technical_findings[0].title.en, "Float");
    }

    #[test]
    fn test_parse_report_rejects_single_language_field() {
        let raw = r#"{"summary": "English only", "riskLevel": "Low",
            "riskAssessment": {"description": {"en": "a", "ar": "b"}},
            "contractorNote": {"en": "a", "ar": "b"}}"#;
        assert!(matches!(
            parse_report(raw).unwrap_err(),
            AnalysisError::MalformedResponse { .. }
        ));
    }
}
