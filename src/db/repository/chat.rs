use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::parse_uuid;
use crate::db::{ts_from_sql, ts_to_sql, DatabaseError};
use crate::models::*;

const PREVIEW_CHARS: usize = 80;

pub fn insert_message(conn: &Connection, msg: &ChatMessage) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO chat_messages (id, user_id, conversation_id, message, sender, timestamp, sentiment)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            msg.id.to_string(),
            msg.user_id.to_string(),
            msg.conversation_id,
            msg.message,
            msg.sender.as_str(),
            ts_to_sql(&msg.timestamp),
            msg.sentiment.map(|s| s.as_str()),
        ],
    )?;
    Ok(())
}

/// Messages of one conversation owned by `user_id`, oldest first. Messages
/// sharing a timestamp keep insertion order.
pub fn get_conversation_messages(
    conn: &Connection,
    user_id: &Uuid,
    conversation_id: &str,
) -> Result<Vec<ChatMessage>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, conversation_id, message, sender, timestamp, sentiment
         FROM chat_messages WHERE user_id = ?1 AND conversation_id = ?2
         ORDER BY timestamp ASC, seq ASC",
    )?;

    let rows = stmt.query_map(params![user_id.to_string(), conversation_id], |row| {
        Ok(MessageRow {
            id: row.get(0)?,
            user_id: row.get(1)?,
            conversation_id: row.get(2)?,
            message: row.get(3)?,
            sender: row.get(4)?,
            timestamp: row.get(5)?,
            sentiment: row.get(6)?,
        })
    })?;

    let mut messages = Vec::new();
    for row in rows {
        messages.push(message_from_row(row?)?);
    }
    Ok(messages)
}

/// Timestamp of the newest message in a conversation, if any.
pub fn last_message_timestamp(
    conn: &Connection,
    user_id: &Uuid,
    conversation_id: &str,
) -> Result<Option<chrono::DateTime<chrono::Utc>>, DatabaseError> {
    let raw: Option<String> = conn.query_row(
        "SELECT MAX(timestamp) FROM chat_messages WHERE user_id = ?1 AND conversation_id = ?2",
        params![user_id.to_string(), conversation_id],
        |row| row.get(0),
    )?;
    raw.as_deref().map(ts_from_sql).transpose()
}

/// One summary per conversation, most recently active first.
pub fn list_conversations(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<ConversationSummary>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT m.conversation_id, MIN(m.timestamp), MAX(m.timestamp), COUNT(*),
             (SELECT last.message FROM chat_messages last
              WHERE last.user_id = m.user_id AND last.conversation_id = m.conversation_id
              ORDER BY last.timestamp DESC, last.seq DESC LIMIT 1)
         FROM chat_messages m
         WHERE m.user_id = ?1
         GROUP BY m.conversation_id
         ORDER BY MAX(m.timestamp) DESC",
    )?;

    let rows = stmt.query_map(params![user_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, u32>(3)?,
            row.get::<_, Option<String>>(4)?,
        ))
    })?;

    let mut summaries = Vec::new();
    for row in rows {
        let (conversation_id, started_at, last_message_at, message_count, last) = row?;
        summaries.push(ConversationSummary {
            conversation_id,
            started_at: ts_from_sql(&started_at)?,
            last_message_at: ts_from_sql(&last_message_at)?,
            message_count,
            last_message_preview: preview(last.as_deref().unwrap_or_default()),
        });
    }
    Ok(summaries)
}

/// Truncate at `PREVIEW_CHARS` characters with "..." if longer, on a char boundary.
fn preview(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(PREVIEW_CHARS) {
        Some((boundary, _)) => format!("{}...", &trimmed[..boundary]),
        None => trimmed.to_string(),
    }
}

struct MessageRow {
    id: String,
    user_id: String,
    conversation_id: String,
    message: String,
    sender: String,
    timestamp: String,
    sentiment: Option<String>,
}

fn message_from_row(row: MessageRow) -> Result<ChatMessage, DatabaseError> {
    Ok(ChatMessage {
        id: parse_uuid(&row.id)?,
        user_id: parse_uuid(&row.user_id)?,
        conversation_id: row.conversation_id,
        message: row.message,
        sender: Sender::from_str(&row.sender)?,
        timestamp: ts_from_sql(&row.timestamp)?,
        sentiment: row.sentiment.as_deref().map(Sentiment::from_str).transpose()?,
    })
}
