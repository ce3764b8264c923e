//! Deferred report scanning.
//!
//! A trigger moves a report Pending → Processing and returns at once. A
//! one-shot task then sleeps for the configured delay and writes the
//! placeholder analysis, but only if the report still exists and is still
//! Processing. Pending completions do not survive a restart: a report left
//! in Processing by a crash stays there.

use std::sync::Arc;

use rusqlite::Connection;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::assistant::scan_outcome;
use crate::core_state::CoreState;
use crate::db::{self, DatabaseError};
use crate::models::{Report, ScanStatus};

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Report not found: {0}")]
    NotFound(Uuid),
    #[error("Report scan already finished with status {0}")]
    AlreadyFinished(ScanStatus),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Result of a trigger: the report as it stands now, and the completion task
/// if this call scheduled one.
pub struct ScanTrigger {
    pub report: Report,
    pub completion: Option<JoinHandle<()>>,
}

/// Start a scan. A report already Processing is returned as-is without a
/// second task; Completed and Error reports cannot be rescanned.
pub fn trigger_scan(
    state: &Arc<CoreState>,
    conn: &Connection,
    report_id: &Uuid,
) -> Result<ScanTrigger, ScanError> {
    let started = db::mark_scan_processing(conn, report_id)?;
    let report = db::get_report(conn, report_id)?.ok_or(ScanError::NotFound(*report_id))?;

    if started {
        tracing::info!(report_id = %report_id, delay_ms = state.config.scan_delay.as_millis() as u64, "Report scan started");
        let completion = tokio::spawn(complete_after_delay(Arc::clone(state), *report_id));
        return Ok(ScanTrigger { report, completion: Some(completion) });
    }

    if report.scan_status.is_terminal() {
        return Err(ScanError::AlreadyFinished(report.scan_status));
    }
    Ok(ScanTrigger { report, completion: None })
}

async fn complete_after_delay(state: Arc<CoreState>, report_id: Uuid) {
    tokio::time::sleep(state.config.scan_delay).await;

    let conn = match state.open_db() {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!(report_id = %report_id, error = %e, "Scan completion could not open database");
            return;
        }
    };

    match db::complete_scan(&conn, &report_id, &scan_outcome()) {
        Ok(true) => tracing::info!(report_id = %report_id, "Report scan completed"),
        Ok(false) => {
            tracing::info!(report_id = %report_id, "Report deleted or no longer processing; scan result dropped")
        }
        Err(e) => {
            tracing::error!(report_id = %report_id, error = %e, "Scan completion write failed");
            if let Err(e) = db::fail_scan(&conn, &report_id) {
                tracing::error!(report_id = %report_id, error = %e, "Could not mark scan as failed");
            }
        }
    }
}
