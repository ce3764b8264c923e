//! Patient profile endpoints.
//!
//! - `GET /api/patients/dashboard/:id`
//! - `GET /api/patients/:id`
//! - `PUT /api/patients/:id`

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{parse_id, ApiContext, ApiJson, AuthUser};
use crate::db;
use crate::models::{ProfileUpdate, Symptom, SymptomStatus, User};

const RECENT_SYMPTOMS: u32 = 10;
const MAX_AGE: u32 = 150;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub user: User,
    pub active_symptoms: Vec<Symptom>,
    pub recent_symptoms: Vec<Symptom>,
    pub total_symptoms: u32,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub message: &'static str,
    pub user: User,
}

/// `GET /api/patients/dashboard/:id`.
pub async fn dashboard(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let user_id = parse_id(&id, "user id")?;
    auth.ensure_can_read(&user_id)?;

    let conn = ctx.open_db()?;
    let user = db::get_user(&conn, &user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(DashboardResponse {
        active_symptoms: db::list_symptoms_by_status(&conn, &user_id, SymptomStatus::Active)?,
        recent_symptoms: db::list_recent_symptoms(&conn, &user_id, RECENT_SYMPTOMS)?,
        total_symptoms: db::count_symptoms(&conn, &user_id)?,
        user,
    }))
}

/// `GET /api/patients/:id`.
pub async fn profile(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user_id = parse_id(&id, "user id")?;
    auth.ensure_can_read(&user_id)?;

    let conn = ctx.open_db()?;
    let user = db::get_user(&conn, &user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(user))
}

/// `PUT /api/patients/:id`: merge the supplied profile fields.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user_id = parse_id(&id, "user id")?;
    auth.ensure_owner(&user_id)?;
    validate_update(&update)?;

    let conn = ctx.open_db()?;
    let mut user = db::get_user(&conn, &user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if !update.is_empty() {
        update.apply_to(&mut user);
        db::update_user_profile(&conn, &mut user)?;
        tracing::info!(user_id = %user_id, "Profile updated");
    }

    Ok(Json(ProfileResponse {
        message: "Profile updated successfully",
        user,
    }))
}

fn validate_update(update: &ProfileUpdate) -> Result<(), ApiError> {
    if let Some(name) = &update.name {
        if name.trim().is_empty() {
            return Err(ApiError::BadRequest("Name cannot be empty".into()));
        }
    }
    if let Some(age) = update.age {
        if age > MAX_AGE {
            return Err(ApiError::BadRequest(format!("Age must be between 0 and {MAX_AGE}")));
        }
    }
    let history = update.medical_history.iter().flatten();
    if history.clone().any(|h| h.condition.trim().is_empty()) {
        return Err(ApiError::BadRequest("Medical history entries need a condition".into()));
    }
    if history.clone().any(|h| matches!((h.start_date, h.end_date), (Some(s), Some(e)) if e < s)) {
        return Err(ApiError::BadRequest("Medical history end date precedes start date".into()));
    }
    if update.medications.iter().flatten().any(|m| m.name.trim().is_empty()) {
        return Err(ApiError::BadRequest("Medication entries need a name".into()));
    }
    Ok(())
}
