//! Medical report endpoints.
//!
//! - `GET /api/reports/:id`: a user's reports, newest upload first
//! - `POST /api/reports/upload/:id`: multipart `file` + `reportType`
//! - `GET /api/reports/:id/:child`: one report of the path user
//! - `POST /api/reports/:id/scan`: start the deferred scan
//! - `DELETE /api/reports/:id`: remove record and stored file

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;

use super::{parse_choice, required};
use crate::api::error::ApiError;
use crate::api::types::{parse_id, ApiContext, AuthUser};
use crate::db;
use crate::models::{NewReport, Report, ReportType};
use crate::scan;

#[derive(Serialize)]
pub struct ReportResponse {
    pub message: &'static str,
    pub report: Report,
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Report>>, ApiError> {
    let user_id = parse_id(&id, "user id")?;
    auth.ensure_can_read(&user_id)?;

    let conn = ctx.open_db()?;
    Ok(Json(db::list_reports_for_user(&conn, &user_id)?))
}

pub async fn upload(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ReportResponse>), ApiError> {
    let user_id = parse_id(&id, "user id")?;
    auth.ensure_owner(&user_id)?;

    let mut report_type: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "reportType" => report_type = Some(field.text().await?),
            "file" => {
                let file_name = field.file_name().unwrap_or("report").to_string();
                let bytes = field.bytes().await?;
                file = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let report_type: ReportType = parse_choice(
        required(report_type.as_deref(), "reportType")?,
        "reportType",
        ReportType::ALL,
    )?;
    let (original_name, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("Please upload a file".into()))?;

    let stored = ctx.core.files().save(&original_name, &bytes)?;

    let conn = ctx.open_db()?;
    let inserted = db::insert_report(
        &conn,
        &user_id,
        &NewReport {
            file_name: stored.file_name.clone(),
            file_url: stored.url.clone(),
            report_type,
        },
    );
    let report = match inserted {
        Ok(report) => report,
        Err(e) => {
            if let Err(cleanup) = ctx.core.files().remove(&stored.url) {
                tracing::warn!(url = %stored.url, error = %cleanup, "Orphaned upload left on disk");
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        user_id = %user_id,
        report_id = %report.id,
        report_type = %report.report_type,
        mime = stored.mime_type,
        size_bytes = stored.size_bytes,
        "Report uploaded"
    );
    Ok((
        StatusCode::CREATED,
        Json(ReportResponse {
            message: "Report uploaded successfully",
            report,
        }),
    ))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path((id, child)): Path<(String, String)>,
) -> Result<Json<Report>, ApiError> {
    let user_id = parse_id(&id, "user id")?;
    let report_id = parse_id(&child, "report id")?;
    auth.ensure_can_read(&user_id)?;

    let conn = ctx.open_db()?;
    let report = db::get_report(&conn, &report_id)?
        .filter(|r| r.user_id == user_id)
        .ok_or_else(report_not_found)?;
    Ok(Json(report))
}

/// Returns the report in Processing; poll the detail route for completion.
pub async fn trigger_scan(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ReportResponse>, ApiError> {
    let report_id = parse_id(&id, "report id")?;

    let conn = ctx.open_db()?;
    let existing = db::get_report(&conn, &report_id)?.ok_or_else(report_not_found)?;
    auth.ensure_owner(&existing.user_id)?;

    let trigger = scan::trigger_scan(&ctx.core, &conn, &report_id)?;
    Ok(Json(ReportResponse {
        message: "Report scanning initiated",
        report: trigger.report,
    }))
}

pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let report_id = parse_id(&id, "report id")?;

    let conn = ctx.open_db()?;
    let existing = db::get_report(&conn, &report_id)?.ok_or_else(report_not_found)?;
    auth.ensure_owner(&existing.user_id)?;

    if !db::delete_report(&conn, &report_id)? {
        return Err(report_not_found());
    }
    if let Err(e) = ctx.core.files().remove(&existing.file_url) {
        tracing::warn!(report_id = %report_id, error = %e, "Stored report file not removed");
    }
    Ok(StatusCode::NO_CONTENT)
}

fn report_not_found() -> ApiError {
    ApiError::NotFound("Report not found".into())
}
