//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, resolves it against the
//! sessions table, and injects `AuthUser` into request extensions for
//! downstream handlers.

use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{hash_token, ApiContext, AuthUser};
use crate::db;
use crate::models::now;

/// Require a live session token.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
/// The resolved user id is also copied onto the response for the access log.
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::Unauthorized)?;
    let token_hash = hash_token(token);

    let (user_id, role) = {
        let conn = ctx.open_db()?;
        db::find_session_user(&conn, &token_hash, &now())?.ok_or(ApiError::Unauthorized)?
    };

    let auth = AuthUser { user_id, role, token_hash };
    req.extensions_mut().insert(auth.clone());

    let mut response = next.run(req).await;
    response.extensions_mut().insert(auth);
    Ok(response)
}
