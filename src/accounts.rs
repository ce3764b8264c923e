//! Account registration and credential checks.
//!
//! Password hashing is deliberately slow; callers on an async runtime run
//! these functions on a blocking thread.

use std::sync::LazyLock;

use regex::Regex;
use rusqlite::Connection;
use thiserror::Error;

use crate::crypto::{self, CryptoError};
use crate::db::{self, DatabaseError};
use crate::models::{NewUser, Role, User};

pub const MIN_PASSWORD_CHARS: usize = 6;
const MAX_NAME_CHARS: usize = 100;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("{0}")]
    Invalid(String),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Registration input after trimming and normalization.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Trimmed, lowercased email.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn validate_registration(
    name: Option<&str>,
    email: Option<&str>,
    password: Option<&str>,
) -> Result<Registration, AccountError> {
    let name = name.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(AccountError::Invalid("Name is required".into()));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(AccountError::Invalid(format!(
            "Name must be at most {MAX_NAME_CHARS} characters"
        )));
    }

    let email = normalize_email(email.unwrap_or_default());
    if email.is_empty() {
        return Err(AccountError::Invalid("Email is required".into()));
    }
    if !EMAIL_PATTERN.is_match(&email) {
        return Err(AccountError::Invalid("Please provide a valid email".into()));
    }

    let password = password.unwrap_or_default();
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AccountError::Invalid(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }

    Ok(Registration {
        name: name.to_string(),
        email,
        password: password.to_string(),
    })
}

/// Hash the password and create a patient account. A taken email surfaces as
/// `DatabaseError::Duplicate`.
pub fn register(
    conn: &Connection,
    registration: Registration,
    iterations: u32,
) -> Result<User, AccountError> {
    let password_hash = crypto::hash_password(&registration.password, iterations)?;
    let user = db::insert_user(
        conn,
        &NewUser {
            name: registration.name,
            email: registration.email,
            password_hash,
            role: Role::Patient,
        },
    )?;
    tracing::info!(user_id = %user.id, "Account registered");
    Ok(user)
}

/// Verify credentials. Unknown emails and wrong passwords are
/// indistinguishable to the caller.
pub fn authenticate(
    conn: &Connection,
    email: &str,
    password: &str,
    iterations: u32,
) -> Result<User, AccountError> {
    let email = normalize_email(email);
    let Some((user, stored_hash)) = db::get_credentials_by_email(conn, &email)? else {
        crypto::dummy_verify(password, iterations);
        return Err(AccountError::InvalidCredentials);
    };

    match crypto::verify_password(password, &stored_hash) {
        Ok(()) => Ok(user),
        Err(CryptoError::WrongPassword) => Err(AccountError::InvalidCredentials),
        Err(e) => Err(e.into()),
    }
}
