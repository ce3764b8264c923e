use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::parse_uuid;
use crate::db::{ts_from_sql, ts_to_sql, DatabaseError};
use crate::models::*;

const SYMPTOM_COLUMNS: &str = "id, user_id, symptom_name, severity, duration, description,
     affected_area, start_date, additional_symptoms, status, created_at, updated_at";

pub fn insert_symptom(
    conn: &Connection,
    user_id: &Uuid,
    new_symptom: &NewSymptom,
) -> Result<Symptom, DatabaseError> {
    let now = now();
    let symptom = Symptom {
        id: Uuid::new_v4(),
        user_id: *user_id,
        symptom_name: new_symptom.symptom_name,
        severity: new_symptom.severity,
        duration: new_symptom.duration.clone(),
        description: new_symptom.description.clone(),
        affected_area: new_symptom.affected_area.clone(),
        start_date: new_symptom.start_date,
        additional_symptoms: new_symptom.additional_symptoms.clone(),
        status: SymptomStatus::Active,
        created_at: now,
        updated_at: now,
    };

    conn.execute(
        "INSERT INTO symptoms (id, user_id, symptom_name, severity, duration, description,
         affected_area, start_date, additional_symptoms, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
        params![
            symptom.id.to_string(),
            symptom.user_id.to_string(),
            symptom.symptom_name.as_str(),
            symptom.severity.as_str(),
            symptom.duration,
            symptom.description,
            symptom.affected_area,
            symptom.start_date.to_string(),
            serde_json::to_string(&symptom.additional_symptoms)?,
            symptom.status.as_str(),
            ts_to_sql(&now),
        ],
    )?;

    Ok(symptom)
}

pub fn get_symptom(conn: &Connection, id: &Uuid) -> Result<Option<Symptom>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {SYMPTOM_COLUMNS} FROM symptoms WHERE id = ?1"),
            params![id.to_string()],
            read_symptom_row,
        )
        .optional()?;
    row.map(symptom_from_row).transpose()
}

/// All symptoms for a user, newest first.
pub fn list_symptoms_for_user(conn: &Connection, user_id: &Uuid) -> Result<Vec<Symptom>, DatabaseError> {
    query_symptoms(
        conn,
        &format!(
            "SELECT {SYMPTOM_COLUMNS} FROM symptoms WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC"
        ),
        params![user_id.to_string()],
    )
}

/// The `limit` most recently recorded symptoms for a user.
pub fn list_recent_symptoms(
    conn: &Connection,
    user_id: &Uuid,
    limit: u32,
) -> Result<Vec<Symptom>, DatabaseError> {
    query_symptoms(
        conn,
        &format!(
            "SELECT {SYMPTOM_COLUMNS} FROM symptoms WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC LIMIT ?2"
        ),
        params![user_id.to_string(), limit],
    )
}

pub fn list_symptoms_by_status(
    conn: &Connection,
    user_id: &Uuid,
    status: SymptomStatus,
) -> Result<Vec<Symptom>, DatabaseError> {
    query_symptoms(
        conn,
        &format!(
            "SELECT {SYMPTOM_COLUMNS} FROM symptoms WHERE user_id = ?1 AND status = ?2
             ORDER BY created_at DESC, rowid DESC"
        ),
        params![user_id.to_string(), status.as_str()],
    )
}

pub fn count_symptoms(conn: &Connection, user_id: &Uuid) -> Result<u32, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM symptoms WHERE user_id = ?1",
        params![user_id.to_string()],
        |row| row.get::<_, u32>(0),
    )?;
    Ok(count)
}

/// Apply a status/severity change. Returns the updated record, or `None` if
/// the symptom does not exist.
pub fn update_symptom(
    conn: &Connection,
    id: &Uuid,
    update: &SymptomUpdate,
) -> Result<Option<Symptom>, DatabaseError> {
    let changed = conn.execute(
        "UPDATE symptoms SET
             status = COALESCE(?2, status),
             severity = COALESCE(?3, severity),
             updated_at = ?4
         WHERE id = ?1",
        params![
            id.to_string(),
            update.status.map(|s| s.as_str()),
            update.severity.map(|s| s.as_str()),
            ts_to_sql(&now()),
        ],
    )?;

    if changed == 0 {
        return Ok(None);
    }
    get_symptom(conn, id)
}

pub fn delete_symptom(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let deleted = conn.execute("DELETE FROM symptoms WHERE id = ?1", params![id.to_string()])?;
    Ok(deleted > 0)
}

fn query_symptoms(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Symptom>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, read_symptom_row)?;

    let mut symptoms = Vec::new();
    for row in rows {
        symptoms.push(symptom_from_row(row?)?);
    }
    Ok(symptoms)
}

struct SymptomRow {
    id: String,
    user_id: String,
    symptom_name: String,
    severity: String,
    duration: String,
    description: Option<String>,
    affected_area: Option<String>,
    start_date: String,
    additional_symptoms: String,
    status: String,
    created_at: String,
    updated_at: String,
}

fn read_symptom_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SymptomRow> {
    Ok(SymptomRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        symptom_name: row.get(2)?,
        severity: row.get(3)?,
        duration: row.get(4)?,
        description: row.get(5)?,
        affected_area: row.get(6)?,
        start_date: row.get(7)?,
        additional_symptoms: row.get(8)?,
        status: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn symptom_from_row(row: SymptomRow) -> Result<Symptom, DatabaseError> {
    Ok(Symptom {
        id: parse_uuid(&row.id)?,
        user_id: parse_uuid(&row.user_id)?,
        symptom_name: SymptomName::from_str(&row.symptom_name)?,
        severity: Severity::from_str(&row.severity)?,
        duration: row.duration,
        description: row.description,
        affected_area: row.affected_area,
        start_date: NaiveDate::parse_from_str(&row.start_date, "%Y-%m-%d")
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        additional_symptoms: serde_json::from_str(&row.additional_symptoms)?,
        status: SymptomStatus::from_str(&row.status)?,
        created_at: ts_from_sql(&row.created_at)?,
        updated_at: ts_from_sql(&row.updated_at)?,
    })
}
