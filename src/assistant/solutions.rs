use serde::Serialize;

use crate::models::{Symptom, SymptomName};

pub const NEXT_STEPS: &str = "If symptoms persist, please consult a healthcare professional";

const FALLBACK_AID: &[&str] = &[
    "Consult a healthcare professional for proper diagnosis",
    "Monitor your symptoms closely",
    "Maintain good hygiene",
];

/// Self-care list for a symptom. Symptoms without a dedicated list get the
/// generic advice.
pub fn immediate_aid(name: SymptomName) -> &'static [&'static str] {
    match name {
        SymptomName::Fever => &[
            "Stay hydrated - drink water, coconut water, or herbal tea",
            "Rest as much as possible",
            "Use paracetamol or ibuprofen as recommended",
            "Apply cool compress to forehead",
            "Monitor temperature regularly",
            "Consult doctor if fever persists beyond 3 days",
        ],
        SymptomName::Cough => &[
            "Stay hydrated",
            "Use honey (1 tsp for adults)",
            "Try steam inhalation",
            "Avoid irritants like smoke and dust",
            "Use cough drops or lozenges",
            "Consult doctor if cough persists for more than 2 weeks",
        ],
        SymptomName::Sprain => &[
            "Rest - avoid activities that put weight on the sprain",
            "Ice - apply ice for 15-20 minutes, several times a day",
            "Compression - wrap the area with an elastic bandage",
            "Elevation - raise the injured area above heart level",
            "Pain relief - take over-the-counter pain medication",
            "Physical therapy exercises once acute pain subsides",
        ],
        SymptomName::Headache => &[
            "Rest in a quiet, dark room",
            "Apply a warm or cold compress",
            "Stay hydrated",
            "Take pain relief medication (paracetamol/ibuprofen)",
            "Practice relaxation techniques",
            "Avoid caffeine and alcohol",
        ],
        _ => FALLBACK_AID,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Solutions {
    pub symptom: Symptom,
    pub immediate_aid: Vec<String>,
    pub next_steps: String,
}

impl Solutions {
    pub fn for_symptom(symptom: Symptom) -> Self {
        Self {
            immediate_aid: immediate_aid(symptom.symptom_name)
                .iter()
                .map(|s| s.to_string())
                .collect(),
            next_steps: NEXT_STEPS.to_string(),
            symptom,
        }
    }
}
