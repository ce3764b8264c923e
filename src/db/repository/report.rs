use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::parse_uuid;
use crate::db::{ts_from_sql, ts_to_sql, DatabaseError};
use crate::models::*;

const REPORT_COLUMNS: &str = "id, user_id, file_name, file_url, report_type, upload_date,
     scan_status, ai_summary, findings, recommendations, confidence, created_at, updated_at";

pub fn insert_report(
    conn: &Connection,
    user_id: &Uuid,
    new_report: &NewReport,
) -> Result<Report, DatabaseError> {
    let now = now();
    let report = Report {
        id: Uuid::new_v4(),
        user_id: *user_id,
        file_name: new_report.file_name.clone(),
        file_url: new_report.file_url.clone(),
        report_type: new_report.report_type,
        upload_date: now,
        scan_status: ScanStatus::Pending,
        ai_summary: None,
        findings: Vec::new(),
        recommendations: Vec::new(),
        confidence: None,
        created_at: now,
        updated_at: now,
    };

    conn.execute(
        "INSERT INTO reports (id, user_id, file_name, file_url, report_type, upload_date,
         scan_status, findings, recommendations, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, '[]', '[]', ?6, ?6)",
        params![
            report.id.to_string(),
            report.user_id.to_string(),
            report.file_name,
            report.file_url,
            report.report_type.as_str(),
            ts_to_sql(&now),
            report.scan_status.as_str(),
        ],
    )?;

    Ok(report)
}

pub fn get_report(conn: &Connection, id: &Uuid) -> Result<Option<Report>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?1"),
            params![id.to_string()],
            read_report_row,
        )
        .optional()?;
    row.map(report_from_row).transpose()
}

/// All reports for a user, most recent upload first.
pub fn list_reports_for_user(conn: &Connection, user_id: &Uuid) -> Result<Vec<Report>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REPORT_COLUMNS} FROM reports WHERE user_id = ?1
         ORDER BY upload_date DESC, rowid DESC"
    ))?;
    let rows = stmt.query_map(params![user_id.to_string()], read_report_row)?;

    let mut reports = Vec::new();
    for row in rows {
        reports.push(report_from_row(row?)?);
    }
    Ok(reports)
}

pub fn delete_report(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let deleted = conn.execute("DELETE FROM reports WHERE id = ?1", params![id.to_string()])?;
    Ok(deleted > 0)
}

/// Pending → Processing. Returns `false` when the report is missing or not Pending.
pub fn mark_scan_processing(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    transition_scan_status(conn, id, ScanStatus::Pending, ScanStatus::Processing)
}

/// Processing → Completed with the analysis content. A report that was deleted
/// or already left Processing is left untouched and `false` is returned.
pub fn complete_scan(
    conn: &Connection,
    id: &Uuid,
    outcome: &ScanOutcome,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE reports SET scan_status = ?2, ai_summary = ?3, findings = ?4,
         recommendations = ?5, confidence = ?6, updated_at = ?7
         WHERE id = ?1 AND scan_status = ?8",
        params![
            id.to_string(),
            ScanStatus::Completed.as_str(),
            outcome.ai_summary,
            serde_json::to_string(&outcome.findings)?,
            serde_json::to_string(&outcome.recommendations)?,
            outcome.confidence.value(),
            ts_to_sql(&now()),
            ScanStatus::Processing.as_str(),
        ],
    )?;
    Ok(changed > 0)
}

/// Processing → Error.
pub fn fail_scan(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    transition_scan_status(conn, id, ScanStatus::Processing, ScanStatus::Error)
}

fn transition_scan_status(
    conn: &Connection,
    id: &Uuid,
    from: ScanStatus,
    to: ScanStatus,
) -> Result<bool, DatabaseError> {
    if !from.can_transition_to(to) {
        return Err(DatabaseError::ConstraintViolation(format!(
            "scan status cannot move from {from} to {to}"
        )));
    }
    let changed = conn.execute(
        "UPDATE reports SET scan_status = ?2, updated_at = ?3
         WHERE id = ?1 AND scan_status = ?4",
        params![id.to_string(), to.as_str(), ts_to_sql(&now()), from.as_str()],
    )?;
    Ok(changed > 0)
}

struct ReportRow {
    id: String,
    user_id: String,
    file_name: String,
    file_url: String,
    report_type: String,
    upload_date: String,
    scan_status: String,
    ai_summary: Option<String>,
    findings: String,
    recommendations: String,
    confidence: Option<i64>,
    created_at: String,
    updated_at: String,
}

fn read_report_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReportRow> {
    Ok(ReportRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        file_name: row.get(2)?,
        file_url: row.get(3)?,
        report_type: row.get(4)?,
        upload_date: row.get(5)?,
        scan_status: row.get(6)?,
        ai_summary: row.get(7)?,
        findings: row.get(8)?,
        recommendations: row.get(9)?,
        confidence: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn report_from_row(row: ReportRow) -> Result<Report, DatabaseError> {
    Ok(Report {
        id: parse_uuid(&row.id)?,
        user_id: parse_uuid(&row.user_id)?,
        file_name: row.file_name,
        file_url: row.file_url,
        report_type: ReportType::from_str(&row.report_type)?,
        upload_date: ts_from_sql(&row.upload_date)?,
        scan_status: ScanStatus::from_str(&row.scan_status)?,
        ai_summary: row.ai_summary,
        findings: serde_json::from_str(&row.findings)?,
        recommendations: serde_json::from_str(&row.recommendations)?,
        confidence: row.confidence.map(Confidence::new).transpose()?,
        created_at: ts_from_sql(&row.created_at)?,
        updated_at: ts_from_sql(&row.updated_at)?,
    })
}
