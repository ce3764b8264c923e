use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{is_unique_violation, parse_uuid};
use crate::db::{ts_from_sql, ts_to_sql, DatabaseError};
use crate::models::*;

const USER_COLUMNS: &str = "id, name, email, phone, age, gender, role, profile_picture,
     medical_history, medications, is_verified, created_at, updated_at";

/// Insert a new account. Fails with `Duplicate` when the email is taken.
pub fn insert_user(conn: &Connection, new_user: &NewUser) -> Result<User, DatabaseError> {
    let now = now();
    let user = User {
        id: Uuid::new_v4(),
        name: new_user.name.clone(),
        email: new_user.email.clone(),
        phone: None,
        age: None,
        gender: None,
        role: new_user.role,
        profile_picture: None,
        medical_history: Vec::new(),
        medications: Vec::new(),
        is_verified: false,
        created_at: now,
        updated_at: now,
    };

    conn.execute(
        "INSERT INTO users (id, name, email, password_hash, role, is_verified, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6)",
        params![
            user.id.to_string(),
            user.name,
            user.email,
            new_user.password_hash,
            user.role.as_str(),
            ts_to_sql(&now),
        ],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            DatabaseError::Duplicate { entity: "user", field: "email" }
        } else {
            e.into()
        }
    })?;

    Ok(user)
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id.to_string()],
            read_user_row,
        )
        .optional()?;
    row.map(user_from_row).transpose()
}

/// Look up an account with its stored password hash, for login.
pub fn get_credentials_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<(User, String)>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?1"),
            params![email],
            |row| Ok((read_user_row(row)?, row.get::<_, String>(13)?)),
        )
        .optional()?;

    match row {
        Some((user_row, hash)) => Ok(Some((user_from_row(user_row)?, hash))),
        None => Ok(None),
    }
}

/// Persist the mutable profile fields of `user` and bump `updated_at`.
pub fn update_user_profile(conn: &Connection, user: &mut User) -> Result<(), DatabaseError> {
    user.updated_at = now();
    let changed = conn.execute(
        "UPDATE users SET name = ?2, phone = ?3, age = ?4, gender = ?5, profile_picture = ?6,
         medical_history = ?7, medications = ?8, updated_at = ?9
         WHERE id = ?1",
        params![
            user.id.to_string(),
            user.name,
            user.phone,
            user.age,
            user.gender.map(|g| g.as_str()),
            user.profile_picture,
            serde_json::to_string(&user.medical_history)?,
            serde_json::to_string(&user.medications)?,
            ts_to_sql(&user.updated_at),
        ],
    )?;

    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "user".into(),
            id: user.id.to_string(),
        });
    }
    Ok(())
}

struct UserRow {
    id: String,
    name: String,
    email: String,
    phone: Option<String>,
    age: Option<u32>,
    gender: Option<String>,
    role: String,
    profile_picture: Option<String>,
    medical_history: String,
    medications: String,
    is_verified: bool,
    created_at: String,
    updated_at: String,
}

fn read_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        age: row.get(4)?,
        gender: row.get(5)?,
        role: row.get(6)?,
        profile_picture: row.get(7)?,
        medical_history: row.get(8)?,
        medications: row.get(9)?,
        is_verified: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn user_from_row(row: UserRow) -> Result<User, DatabaseError> {
    let created_at: DateTime<Utc> = ts_from_sql(&row.created_at)?;
    Ok(User {
        id: parse_uuid(&row.id)?,
        name: row.name,
        email: row.email,
        phone: row.phone,
        age: row.age,
        gender: row.gender.as_deref().map(Gender::from_str).transpose()?,
        role: Role::from_str(&row.role)?,
        profile_picture: row.profile_picture,
        medical_history: serde_json::from_str(&row.medical_history)?,
        medications: serde_json::from_str(&row.medications)?,
        is_verified: row.is_verified,
        created_at,
        updated_at: ts_from_sql(&row.updated_at)?,
    })
}
