//! Shared types for the API layer.

use std::sync::Arc;

use axum::extract::{FromRequest, Request};
use axum::Json;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::models::Role;

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }

    pub fn open_db(&self) -> Result<rusqlite::Connection, ApiError> {
        Ok(self.core.open_db()?)
    }
}

// ═══════════════════════════════════════════════════════════
// Caller identity: injected by auth middleware
// ═══════════════════════════════════════════════════════════

/// Authenticated caller, inserted into request extensions by `require_auth`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
    /// SHA-256 hex of the presented bearer token (for logout).
    pub token_hash: String,
}

impl AuthUser {
    /// Owners may read their own data; doctors and admins may read anyone's.
    pub fn ensure_can_read(&self, owner: &Uuid) -> Result<(), ApiError> {
        if &self.user_id == owner || self.role.can_read_others() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Access to another user's data is not allowed".into()))
        }
    }

    /// Only the owner may change their data.
    pub fn ensure_owner(&self, owner: &Uuid) -> Result<(), ApiError> {
        if &self.user_id == owner {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Only the owner may modify this data".into()))
        }
    }

    /// Resolve an optional `userId` from a request body: absent means the
    /// caller, present must name the caller.
    pub fn resolve_body_user(&self, raw: Option<&str>) -> Result<Uuid, ApiError> {
        match raw {
            None => Ok(self.user_id),
            Some(raw) => {
                let id = parse_id(raw, "userId")?;
                self.ensure_owner(&id)?;
                Ok(id)
            }
        }
    }
}

/// Parse a path or body identifier.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::BadRequest(format!("Invalid {what} format")))
}

/// Hash a bearer token with SHA-256, hex-encoded for storage.
pub fn hash_token(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

// ═══════════════════════════════════════════════════════════
// JSON extractor with structured rejections
// ═══════════════════════════════════════════════════════════

/// `Json<T>` whose rejections render as `ApiError::BadRequest`.
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = axum::extract::rejection::JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}
