use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::enums::{ReportType, ScanStatus};
use crate::db::DatabaseError;

/// Analysis confidence as a percentage, always within [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Confidence(u8);

impl Confidence {
    pub const MAX: u8 = 100;
    pub const ZERO: Self = Self(0);

    pub fn new(value: i64) -> Result<Self, DatabaseError> {
        if (0..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(DatabaseError::ConstraintViolation(format!(
                "confidence {value} outside 0-100"
            )))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Confidence::new(raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub file_url: String,
    pub report_type: ReportType,
    pub upload_date: DateTime<Utc>,
    pub scan_status: ScanStatus,
    pub ai_summary: Option<String>,
    pub findings: Vec<String>,
    pub recommendations: Vec<String>,
    pub confidence: Option<Confidence>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Metadata for a freshly stored upload.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub file_name: String,
    pub file_url: String,
    pub report_type: ReportType,
}

/// Content written when a scan completes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    pub ai_summary: String,
    pub findings: Vec<String>,
    pub recommendations: Vec<String>,
    pub confidence: Confidence,
}
