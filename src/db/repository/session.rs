use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::parse_uuid;
use crate::db::{ts_to_sql, DatabaseError};
use crate::models::Role;

/// Record a session keyed by the SHA-256 hex digest of its bearer token.
pub fn insert_session(
    conn: &Connection,
    token_hash: &str,
    user_id: &Uuid,
    created_at: &DateTime<Utc>,
    expires_at: &DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            token_hash,
            user_id.to_string(),
            ts_to_sql(created_at),
            ts_to_sql(expires_at),
        ],
    )?;
    Ok(())
}

/// Resolve a live session to its user id and role. Expired sessions resolve to `None`.
pub fn find_session_user(
    conn: &Connection,
    token_hash: &str,
    now: &DateTime<Utc>,
) -> Result<Option<(Uuid, Role)>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT u.id, u.role FROM sessions s
             JOIN users u ON u.id = s.user_id
             WHERE s.token_hash = ?1 AND s.expires_at > ?2",
            params![token_hash, ts_to_sql(now)],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;

    match row {
        Some((id, role)) => Ok(Some((parse_uuid(&id)?, Role::from_str(&role)?))),
        None => Ok(None),
    }
}

/// Remove a session (logout). Returns whether a row was deleted.
pub fn delete_session(conn: &Connection, token_hash: &str) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM sessions WHERE token_hash = ?1",
        params![token_hash],
    )?;
    Ok(deleted > 0)
}

/// Drop every session whose expiry has passed. Returns the number removed.
pub fn purge_expired_sessions(conn: &Connection, now: &DateTime<Utc>) -> Result<usize, DatabaseError> {
    let removed = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        params![ts_to_sql(now)],
    )?;
    Ok(removed)
}
