pub mod repository;
pub mod sqlite;

pub use repository::*;
pub use sqlite::*;

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("Duplicate {entity}: {field} already exists")]
    Duplicate { entity: &'static str, field: &'static str },

    #[error("Stored JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// Storage format for timestamps: fixed-width, lexicographically sortable UTC.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

pub(crate) fn ts_to_sql(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn ts_from_sql(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad timestamp {raw}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_round_trip_at_millisecond_precision() {
        let now = crate::models::now();
        let stored = ts_to_sql(&now);
        assert_eq!(stored.len(), 24);
        assert_eq!(ts_from_sql(&stored).unwrap(), now);
    }

    #[test]
    fn stored_timestamps_sort_chronologically() {
        let earlier = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let later = DateTime::from_timestamp_millis(1_700_000_000_001).unwrap();
        assert!(ts_to_sql(&earlier) < ts_to_sql(&later));
    }

    #[test]
    fn garbage_timestamp_rejected() {
        assert!(ts_from_sql("yesterday").is_err());
    }
}
