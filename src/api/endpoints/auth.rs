//! Authentication endpoints.
//!
//! - `POST /api/auth/register`: create an account, open a session
//! - `POST /api/auth/login`: verify credentials, open a session
//! - `GET /api/auth/me`: the caller's account
//! - `POST /api/auth/logout`: close the presented session

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Duration;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::blocking;
use crate::accounts;
use crate::api::error::ApiError;
use crate::api::types::{generate_token, hash_token, ApiContext, ApiJson, AuthUser};
use crate::db::{self, DatabaseError};
use crate::models::{now, User};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// `POST /api/auth/register`: 201 with a fresh session.
pub async fn register(
    State(ctx): State<ApiContext>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let registration = accounts::validate_registration(
        req.name.as_deref(),
        req.email.as_deref(),
        req.password.as_deref(),
    )?;

    let response = blocking(move || {
        let mut conn = ctx.open_db()?;
        // The account and its first session land together or not at all.
        let tx = conn.transaction().map_err(DatabaseError::from)?;
        let user = accounts::register(&tx, registration, ctx.core.config.password_iterations)?;
        let token = open_session(&tx, &ctx, &user.id)?;
        tx.commit().map_err(DatabaseError::from)?;
        Ok(AuthResponse { token, user })
    })
    .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// `POST /api/auth/login`.
pub async fn login(
    State(ctx): State<ApiContext>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = req.email.unwrap_or_default();
    let password = req.password.unwrap_or_default();
    if email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::BadRequest("Email and password are required".into()));
    }

    let response = blocking(move || {
        let conn = ctx.open_db()?;
        let user = accounts::authenticate(
            &conn,
            &email,
            &password,
            ctx.core.config.password_iterations,
        )?;
        let removed = db::purge_expired_sessions(&conn, &now())?;
        if removed > 0 {
            tracing::debug!(removed, "Purged expired sessions");
        }
        let token = open_session(&conn, &ctx, &user.id)?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok(AuthResponse { token, user })
    })
    .await?;

    Ok(Json(response))
}

/// `GET /api/auth/me`.
pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<User>, ApiError> {
    let conn = ctx.open_db()?;
    let user = db::get_user(&conn, &auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(user))
}

/// `POST /api/auth/logout`: 204. The token stops working immediately.
pub async fn logout(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.open_db()?;
    db::delete_session(&conn, &auth.token_hash)?;
    tracing::info!(user_id = %auth.user_id, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

fn open_session(conn: &Connection, ctx: &ApiContext, user_id: &Uuid) -> Result<String, ApiError> {
    let token = generate_token();
    let created = now();
    let expires = Duration::from_std(ctx.core.config.session_ttl)
        .ok()
        .and_then(|ttl| created.checked_add_signed(ttl))
        .ok_or_else(|| ApiError::Internal("session ttl out of range".into()))?;
    db::insert_session(conn, &hash_token(&token), user_id, &created, &expires)?;
    Ok(token)
}
