//! Symptom endpoints.
//!
//! Path segments after `/symptoms/` carry a user id for listing, creation
//! and detail, and a symptom id for update, delete and solutions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{optional_text, parse_choice, required};
use crate::api::error::ApiError;
use crate::api::types::{parse_id, ApiContext, ApiJson, AuthUser};
use crate::assistant::Solutions;
use crate::db;
use crate::models::{NewSymptom, Severity, Symptom, SymptomName, SymptomStatus, SymptomUpdate};

const MAX_DURATION_CHARS: usize = 100;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSymptomRequest {
    pub user_id: Option<String>,
    pub symptom_name: Option<String>,
    pub severity: Option<String>,
    pub duration: Option<String>,
    pub description: Option<String>,
    pub affected_area: Option<String>,
    pub start_date: Option<String>,
    #[serde(default)]
    pub additional_symptoms: Vec<String>,
}

#[derive(Deserialize)]
pub struct UpdateSymptomRequest {
    pub status: Option<String>,
    pub severity: Option<String>,
}

#[derive(Serialize)]
pub struct SymptomResponse {
    pub message: &'static str,
    pub symptom: Symptom,
}

/// `GET /api/symptoms/:id`: a user's symptoms, newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Symptom>>, ApiError> {
    let user_id = parse_id(&id, "user id")?;
    auth.ensure_can_read(&user_id)?;

    let conn = ctx.open_db()?;
    Ok(Json(db::list_symptoms_for_user(&conn, &user_id)?))
}

/// `POST /api/symptoms/:id`: record a symptom for the path user.
pub async fn create_for_user(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<CreateSymptomRequest>,
) -> Result<(StatusCode, Json<SymptomResponse>), ApiError> {
    let user_id = parse_id(&id, "user id")?;
    auth.ensure_owner(&user_id)?;
    if let Some(body_user) = req.user_id.as_deref() {
        if parse_id(body_user, "userId")? != user_id {
            return Err(ApiError::BadRequest("userId does not match the path".into()));
        }
    }
    create(&ctx, &user_id, req)
}

/// `POST /api/symptoms`: record a symptom; `userId` in the body, defaulting to the caller.
pub async fn create_from_body(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<CreateSymptomRequest>,
) -> Result<(StatusCode, Json<SymptomResponse>), ApiError> {
    let user_id = auth.resolve_body_user(req.user_id.as_deref())?;
    create(&ctx, &user_id, req)
}

fn create(
    ctx: &ApiContext,
    user_id: &Uuid,
    req: CreateSymptomRequest,
) -> Result<(StatusCode, Json<SymptomResponse>), ApiError> {
    let new_symptom = validate_new_symptom(req)?;

    let conn = ctx.open_db()?;
    let symptom = db::insert_symptom(&conn, user_id, &new_symptom)?;
    tracing::info!(user_id = %user_id, symptom_id = %symptom.id, name = %symptom.symptom_name, "Symptom recorded");

    Ok((
        StatusCode::CREATED,
        Json(SymptomResponse {
            message: "Symptom recorded successfully",
            symptom,
        }),
    ))
}

/// `GET /api/symptoms/:id/:child`: one symptom of the path user.
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path((id, child)): Path<(String, String)>,
) -> Result<Json<Symptom>, ApiError> {
    let user_id = parse_id(&id, "user id")?;
    let symptom_id = parse_id(&child, "symptom id")?;
    auth.ensure_can_read(&user_id)?;

    let conn = ctx.open_db()?;
    let symptom = db::get_symptom(&conn, &symptom_id)?
        .filter(|s| s.user_id == user_id)
        .ok_or_else(symptom_not_found)?;
    Ok(Json(symptom))
}

/// `PUT /api/symptoms/:id`: change status and/or severity; nothing else.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateSymptomRequest>,
) -> Result<Json<SymptomResponse>, ApiError> {
    let symptom_id = parse_id(&id, "symptom id")?;
    let update = SymptomUpdate {
        status: req
            .status
            .as_deref()
            .map(|s| parse_choice::<SymptomStatus>(s, "status", SymptomStatus::ALL))
            .transpose()?,
        severity: req
            .severity
            .as_deref()
            .map(|s| parse_choice::<Severity>(s, "severity", Severity::ALL))
            .transpose()?,
    };
    if update.is_empty() {
        return Err(ApiError::BadRequest("Provide status and/or severity to update".into()));
    }

    let conn = ctx.open_db()?;
    let existing = db::get_symptom(&conn, &symptom_id)?.ok_or_else(symptom_not_found)?;
    auth.ensure_owner(&existing.user_id)?;

    let symptom = db::update_symptom(&conn, &symptom_id, &update)?.ok_or_else(symptom_not_found)?;
    Ok(Json(SymptomResponse {
        message: "Symptom updated successfully",
        symptom,
    }))
}

/// `DELETE /api/symptoms/:id`: 204.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let symptom_id = parse_id(&id, "symptom id")?;

    let conn = ctx.open_db()?;
    let existing = db::get_symptom(&conn, &symptom_id)?.ok_or_else(symptom_not_found)?;
    auth.ensure_owner(&existing.user_id)?;

    if !db::delete_symptom(&conn, &symptom_id)? {
        return Err(symptom_not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/symptoms/:id/solutions`: read-only self-care lookup.
pub async fn solutions(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Solutions>, ApiError> {
    let symptom_id = parse_id(&id, "symptom id")?;

    let conn = ctx.open_db()?;
    let symptom = db::get_symptom(&conn, &symptom_id)?.ok_or_else(symptom_not_found)?;
    auth.ensure_can_read(&symptom.user_id)?;

    Ok(Json(Solutions::for_symptom(symptom)))
}

fn symptom_not_found() -> ApiError {
    ApiError::NotFound("Symptom not found".into())
}

fn validate_new_symptom(req: CreateSymptomRequest) -> Result<NewSymptom, ApiError> {
    let symptom_name: SymptomName = parse_choice(
        required(req.symptom_name.as_deref(), "symptomName")?,
        "symptomName",
        SymptomName::ALL,
    )?;
    let severity: Severity = parse_choice(
        required(req.severity.as_deref(), "severity")?,
        "severity",
        Severity::ALL,
    )?;

    let duration = required(req.duration.as_deref(), "duration")?;
    if duration.chars().count() > MAX_DURATION_CHARS {
        return Err(ApiError::BadRequest(format!(
            "duration must be at most {MAX_DURATION_CHARS} characters"
        )));
    }

    let start_date = parse_start_date(required(req.start_date.as_deref(), "startDate")?)?;

    Ok(NewSymptom {
        symptom_name,
        severity,
        duration: duration.to_string(),
        description: optional_text(req.description),
        affected_area: optional_text(req.affected_area),
        start_date,
        additional_symptoms: req
            .additional_symptoms
            .into_iter()
            .filter_map(|s| optional_text(Some(s)))
            .collect(),
    })
}

/// `YYYY-MM-DD`, or an RFC 3339 timestamp reduced to its calendar date.
fn parse_start_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| {
            ApiError::BadRequest("Invalid startDate (expected YYYY-MM-DD or RFC 3339)".into())
        })
}
