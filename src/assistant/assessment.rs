use serde::{Deserialize, Serialize};

use crate::models::{Severity, SymptomName};

const PRIMARY_FALLBACK: &str = "General guidance";
const REFERRAL_DURATIONS: &[&str] = &["4 days", "5 days"];

/// Candidate conditions and self-care actions for one symptom.
struct ConditionProfile {
    symptom: Option<SymptomName>,
    conditions: &'static [&'static str],
    actions: &'static [&'static str],
}

const PROFILES: &[ConditionProfile] = &[
    ConditionProfile {
        symptom: Some(SymptomName::Fever),
        conditions: &["Viral infection", "Influenza", "Heat exhaustion"],
        actions: &["Hydration", "Rest", "Paracetamol as directed", "Monitor temperature"],
    },
    ConditionProfile {
        symptom: Some(SymptomName::Cough),
        conditions: &["Common cold", "Bronchitis", "Allergic rhinitis"],
        actions: &["Warm fluids", "Honey (adults)", "Humidifier", "Avoid irritants"],
    },
    ConditionProfile {
        symptom: Some(SymptomName::Headache),
        conditions: &["Tension headache", "Migraine", "Sinusitis"],
        actions: &["Hydration", "Rest in a dark room", "Cold/warm compress"],
    },
    ConditionProfile {
        symptom: Some(SymptomName::Sprain),
        conditions: &["Ligament strain", "Soft tissue injury"],
        actions: &["Rest", "Ice", "Compression", "Elevation"],
    },
    ConditionProfile {
        symptom: Some(SymptomName::Nausea),
        conditions: &["Gastroenteritis", "Food intolerance"],
        actions: &["Clear fluids", "Small bland meals"],
    },
    ConditionProfile {
        symptom: Some(SymptomName::Vomiting),
        conditions: &["Gastric irritation", "Food poisoning"],
        actions: &["Oral rehydration", "Avoid heavy meals"],
    },
    ConditionProfile {
        symptom: Some(SymptomName::Rash),
        conditions: &["Dermatitis", "Allergic reaction"],
        actions: &["Gentle cleansing", "Avoid triggers"],
    },
    ConditionProfile {
        symptom: Some(SymptomName::Chills),
        conditions: &["Viral illness", "Anemia"],
        actions: &["Warmth", "Hydration"],
    },
    ConditionProfile {
        symptom: Some(SymptomName::Fatigue),
        conditions: &["Stress", "Sleep deprivation"],
        actions: &["Sleep hygiene", "Balanced nutrition"],
    },
    ConditionProfile {
        symptom: Some(SymptomName::BodyAche),
        conditions: &["Muscle strain", "Influenza"],
        actions: &["Rest", "Gentle stretching"],
    },
];

/// Used for missing or unrecognised symptoms.
static GENERAL_PROFILE: ConditionProfile = ConditionProfile {
    symptom: None,
    conditions: &["Non-specific presentation"],
    actions: &["Hydration", "Rest"],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    Low,
    Moderate,
    High,
}

impl From<Severity> for Urgency {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Severe => Urgency::High,
            Severity::Moderate => Urgency::Moderate,
            Severity::Mild => Urgency::Low,
        }
    }
}

/// Validated assessment input. `severity: None` means the caller sent none.
#[derive(Debug, Clone, Default)]
pub struct AssessmentQuery {
    pub symptoms: Vec<String>,
    pub duration: String,
    pub severity: Option<Severity>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub primary_condition: String,
    pub possible_conditions: Vec<String>,
    pub urgency_level: Urgency,
    pub recommended_actions: Vec<String>,
    pub doctor_consultation_needed: bool,
}

/// Deterministic guidance for the first reported symptom.
pub fn assess(query: &AssessmentQuery) -> Assessment {
    let profile = lookup_profile(query.symptoms.first().map(String::as_str).unwrap_or_default());

    let possible_conditions: Vec<String> =
        profile.conditions.iter().map(|c| c.to_string()).collect();
    let primary_condition = possible_conditions
        .first()
        .cloned()
        .unwrap_or_else(|| PRIMARY_FALLBACK.to_string());

    let severe = query.severity == Some(Severity::Severe);
    let duration = query.duration.to_lowercase();
    let long_running = REFERRAL_DURATIONS.iter().any(|d| duration.contains(d));

    Assessment {
        primary_condition,
        possible_conditions,
        urgency_level: query.severity.map(Urgency::from).unwrap_or(Urgency::Low),
        recommended_actions: profile.actions.iter().map(|a| a.to_string()).collect(),
        doctor_consultation_needed: severe || long_running,
    }
}

fn lookup_profile(symptom: &str) -> &'static ConditionProfile {
    SymptomName::from_loose(symptom)
        .and_then(|name| PROFILES.iter().find(|p| p.symptom == Some(name)))
        .unwrap_or(&GENERAL_PROFILE)
}
