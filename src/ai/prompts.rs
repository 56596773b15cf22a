use super::standards::{PlanningStandard, DCMA_METRICS};
use crate::models::{Language, SchedulePayload};

/// Exact report structure the model must populate
pub const REPORT_SCHEMA: &str = r#"{
  "projectOverview": {
    "totalActivities": 0,
    "criticalActivities": 0,
    "duration": "total project duration, e.g. 420d",
    "startDate": "YYYY-MM-DD",
    "finishDate": "YYYY-MM-DD",
    "dataDate": "YYYY-MM-DD"
  },
  "dcmaAnalysis": [
    {
      "metric": { "en": "1. Logic", "ar": "1. المنطق" },
      "description": { "en": "What was measured and why it passes or fails", "ar": "..." },
      "operator": "<=",
      "target": 5,
      "value": 3.2,
      "found": 4,
      "total": 125,
      "status": "PASS" | "FAIL"
    }
  ],
  "summary": { "en": "Executive summary of schedule quality", "ar": "..." },
  "riskLevel": "High" | "Medium" | "Low",
  "riskAssessment": {
    "level": "High" | "Medium" | "Low",
    "description": { "en": "Justification of the risk level (float, logic, critical path health)", "ar": "..." }
  },
  "technicalFindings": [
    {
      "title": { "en": "Short heading of the observation", "ar": "..." },
      "description": { "en": "Specific technical observation", "ar": "..." }
    }
  ],
  "nonComplianceIssues": [
    {
      "title": { "en": "Clause or check that is not met", "ar": "..." },
      "description": { "en": "Deviation from the standard", "ar": "..." }
    }
  ],
  "recommendations": [ { "en": "Actionable advice", "ar": "..." } ],
  "activities": [
    {
      "id": "A1010",
      "name": "Activity name as written in the schedule",
      "duration": 10,
      "start": "YYYY-MM-DD",
      "finish": "YYYY-MM-DD",
      "totalFloat": 0,
      "critical": true
    }
  ],
  "contractorNote": { "en": "Full text of the formal letter to the contractor", "ar": "..." }
}"#;

/// Build the system instruction for one review
pub fn build_system_instruction(standard: &PlanningStandard, language: Language) -> String {
    let standard_name = standard.name_en;

    let primary_language = match language {
        Language::En => "The reader's primary language is English (Professional Engineering English).",
        Language::Ar => "The reader's primary language is Arabic (Professional Engineering/Contractual Arabic); write the Arabic text first-class, not as a literal translation.",
    };

    let dcma_section = if standard.is_dcma() {
        format!(
            "\n    The standard is DCMA 14-Point: report all 14 metrics in `dcmaAnalysis`, in this order:\n{}\n",
            DCMA_METRICS
                .iter()
                .map(|m| format!("       - {}", m))
                .collect::<Vec<_>>()
                .join("\n")
        )
    } else {
        "\n    Use `dcmaAnalysis` for the compliance checks of this standard, one entry per check.\n"
            .to_string()
    };

    format!(
        r#"You are a Seasoned Expert in Project Management and Scheduling Quality Assurance, working for a top-tier Project Management Consultancy (PMC).
    Your task is to review project schedules with extreme scrutiny against '{standard_name}' and general industry best practices (CPM, PMI).

    ### Language Rules (MANDATORY):
    - Every narrative field MUST be an object with BOTH keys: {{ "en": "...", "ar": "..." }}. Never return a plain string for a narrative field and never omit either language.
    - JSON keys stay in English exactly as in the schema.
    - Enumerated fields stay single English tokens: riskLevel is "High", "Medium" or "Low"; status is "PASS" or "FAIL".
    - {primary_language}

    ### Objectives:
    1. **Comprehensive Schedule Analysis**: deeply evaluate the provided schedule data (text, log, or visual Gantt) for:
       - **Logic Integrity**: Open ends, lags/leads abuse, circular logic.
       - **Timeline Accuracy**: Unrealistic durations, constraints usage (Hard vs Soft), float analysis (High Float/Negative Float).
       - **Completeness**: Missing baselines, resource loading issues (if visible), WBS structure.

    2. **Non-Compliance Detection**: Explicitly flag any deviation from '{standard_name}'.
{dcma_section}
    3. **Decision Support**: Provide a "Risk Assessment" level (Low/Medium/High) based on the overall health of the schedule.

    4. **Professional Output**:
       - Generate **Strategic Recommendations** to improve the schedule health.
       - Draft a **Formal Contractor Note/Letter** that is stern, contractual, and actionable, rejecting the submission if major flaws exist.
       - List the activities you could read from the data in `activities`, flagging critical ones.

    ### Output Format:
    Return ONLY a raw JSON object (no markdown, no commentary) with exactly this structure:
{REPORT_SCHEMA}"#
    )
}

/// User turn text for a payload; images carry their data separately
pub fn build_user_content(payload: &SchedulePayload) -> String {
    match payload {
        SchedulePayload::Text(text) => format!(
            "Here is the schedule data/narrative for analysis:\n\n{}",
            text
        ),
        SchedulePayload::Image { .. } => {
            "Perform a deep forensic analysis of this schedule screenshot/chart.".to_string()
        }
    }
}
