//! Repository layer: entity-scoped database operations.
//!
//! Free functions over a borrowed `Connection`; callers own the connection
//! and its lifetime. All public functions are re-exported here.

mod chat;
mod report;
mod session;
mod symptom;
mod user;

use uuid::Uuid;

use super::DatabaseError;

pub use chat::*;
pub use report::*;
pub use session::*;
pub use symptom::*;
pub use user::*;

pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(raw).map_err(|e| DatabaseError::ConstraintViolation(format!("bad id {raw}: {e}")))
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
