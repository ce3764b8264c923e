//! Placeholder analysis endpoints.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;

use super::parse_choice;
use crate::api::error::ApiError;
use crate::api::types::{parse_id, ApiContext, ApiJson, AuthUser};
use crate::assistant::{self, Assessment, AssessmentQuery, ReportAnalysis};
use crate::db;
use crate::models::Severity;

#[derive(Deserialize)]
pub struct AssessRequest {
    #[serde(default)]
    pub symptoms: Vec<String>,
    pub duration: Option<String>,
    pub severity: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub report_type: Option<String>,
    pub extracted_text: Option<String>,
}

/// `POST /api/ai/assess-symptoms`.
pub async fn assess_symptoms(
    Extension(_auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<AssessRequest>,
) -> Result<Json<Assessment>, ApiError> {
    let severity = req
        .severity
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_choice::<Severity>(s, "severity", Severity::ALL))
        .transpose()?;

    let query = AssessmentQuery {
        symptoms: req.symptoms,
        duration: req.duration.unwrap_or_default(),
        severity,
    };
    Ok(Json(assistant::assess(&query)))
}

/// `POST /api/ai/analyze-report/:id`: fixed analysis for a report the caller may read.
pub async fn analyze_report(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Option<ApiJson<AnalyzeRequest>>,
) -> Result<Json<ReportAnalysis>, ApiError> {
    let req = body.map(|ApiJson(req)| req).unwrap_or_default();
    let report_id = parse_id(&id, "report id")?;

    let conn = ctx.open_db()?;
    let report = db::get_report(&conn, &report_id)?
        .ok_or_else(|| ApiError::NotFound("Report not found".into()))?;
    auth.ensure_can_read(&report.user_id)?;

    let report_type = req.report_type.as_deref().unwrap_or(report.report_type.as_str());
    Ok(Json(assistant::analyze_report(Some(report_type), req.extracted_text.as_deref())))
}
