use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Sender, Sentiment};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub user_id: Uuid,
    pub conversation_id: String,
    pub message: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub sentiment: Option<Sentiment>,
}

impl ChatMessage {
    pub fn new(user_id: Uuid, conversation_id: &str, sender: Sender, message: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            conversation_id: conversation_id.to_string(),
            message,
            sender,
            timestamp: super::now(),
            sentiment: None,
        }
    }
}

/// Conversation summary for a user's conversation list.
/// Derived from the message log; conversations have no table of their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub started_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
    pub message_count: u32,
    pub last_message_preview: String,
}
