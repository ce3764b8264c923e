//! API endpoint handlers.
//!
//! One module per resource. Handlers validate input at the boundary,
//! check access, and perform a single store operation.

pub mod ai;
pub mod auth;
pub mod chatbot;
pub mod health;
pub mod patients;
pub mod reports;
pub mod symptoms;

use crate::api::error::ApiError;

/// Run CPU-heavy work (password hashing) off the async executor.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))?
}

/// Parse a closed-enum field, naming the accepted values on failure.
pub(crate) fn parse_choice<T: std::str::FromStr>(
    raw: &str,
    field: &str,
    allowed: &[&str],
) -> Result<T, ApiError> {
    raw.trim().parse().map_err(|_| {
        ApiError::BadRequest(format!(
            "Invalid {field} '{}': expected one of {}",
            raw.trim(),
            allowed.join(", ")
        ))
    })
}

/// A required, non-blank string field.
pub(crate) fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{field} is required")))
}

/// Blank optional strings become `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
