use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Severity, SymptomName, SymptomStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symptom {
    pub id: Uuid,
    pub user_id: Uuid,
    pub symptom_name: SymptomName,
    pub severity: Severity,
    pub duration: String,
    pub description: Option<String>,
    pub affected_area: Option<String>,
    pub start_date: NaiveDate,
    pub additional_symptoms: Vec<String>,
    pub status: SymptomStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Boundary-validated symptom submission.
#[derive(Debug, Clone)]
pub struct NewSymptom {
    pub symptom_name: SymptomName,
    pub severity: Severity,
    pub duration: String,
    pub description: Option<String>,
    pub affected_area: Option<String>,
    pub start_date: NaiveDate,
    pub additional_symptoms: Vec<String>,
}

/// The only fields mutable after creation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymptomUpdate {
    pub status: Option<SymptomStatus>,
    pub severity: Option<Severity>,
}

impl SymptomUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.severity.is_none()
    }
}
