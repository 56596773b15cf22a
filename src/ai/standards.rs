//! Planning standards a schedule can be reviewed against

use crate::models::Language;

pub const GENERAL_STANDARD_ID: &str = "general";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanningStandard {
    pub id: &'static str,
    pub name_en: &'static str,
    pub name_ar: &'static str,
}

impl PlanningStandard {
    pub fn name(&self, language: Language) -> &'static str {
        match language {
            Language::En => self.name_en,
            Language::Ar => self.name_ar,
        }
    }

    /// DCMA reviews get the 14-point metric list in the prompt
    pub fn is_dcma(&self) -> bool {
        self.id == "dcma"
    }
}

pub const PLANNING_STANDARDS: &[PlanningStandard] = &[
    PlanningStandard {
        id: "dcma",
        name_en: "DCMA 14-Point Assessment",
        name_ar: "تقييم DCMA (14 نقطة)",
    },
    PlanningStandard {
        id: "aramco",
        name_en: "Saudi Aramco Schedule Standards",
        name_ar: "معايير أرامكو السعودية",
    },
    PlanningStandard {
        id: "fidic",
        name_en: "FIDIC Contract Requirements",
        name_ar: "متطلبات عقود فيديك",
    },
    PlanningStandard {
        id: "pmi",
        name_en: "PMI Scheduling Practice",
        name_ar: "ممارسات الجدولة (PMI)",
    },
    PlanningStandard {
        id: GENERAL_STANDARD_ID,
        name_en: "General Best Practices",
        name_ar: "أفضل الممارسات العامة",
    },
];

/// The 14 DCMA checks, in report order
pub const DCMA_METRICS: &[&str] = &[
    "1. Logic (missing predecessors/successors <= 5%)",
    "2. Leads (negative lags = 0%)",
    "3. Lags (<= 5% of relationships)",
    "4. Relationship Types (FS >= 90%)",
    "5. Hard Constraints (<= 5%)",
    "6. High Float (total float > 44 days <= 5%)",
    "7. Negative Float (= 0%)",
    "8. High Duration (duration > 44 days <= 5%)",
    "9. Invalid Dates (forecast in the past or actuals in the future = 0%)",
    "10. Resources (activities should be resource/cost loaded)",
    "11. Missed Tasks (not finished by data date <= 5%)",
    "12. Critical Path Test (continuous, unbroken critical path)",
    "13. CPLI (Critical Path Length Index > 1.0)",
    "14. BEI (Baseline Execution Index > 1.0)",
];

/// Look up a standard, falling back to general best practice for unknown ids
pub fn find_standard(id: &str) -> &'static PlanningStandard {
    let id = id.trim();
    PLANNING_STANDARDS
        .iter()
        .find(|s| s.id.eq_ignore_ascii_case(id))
        .unwrap_or_else(general_standard)
}

/// Whether `find_standard` matches `id` itself rather than falling back
pub fn is_known_standard(id: &str) -> bool {
    let id = id.trim();
    PLANNING_STANDARDS.iter().any(|s| s.id.eq_ignore_ascii_case(id))
}

fn general_standard() -> &'static PlanningStandard {
    // Last entry is always the general standard
    &PLANNING_STANDARDS[PLANNING_STANDARDS.len() - 1]
}
