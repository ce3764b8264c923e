//! Chatbot endpoints.
//!
//! Conversations have no table of their own; a conversation exists once its
//! greeting has been stored.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use super::required;
use crate::api::error::ApiError;
use crate::api::types::{parse_id, ApiContext, ApiJson, AuthUser};
use crate::db;
use crate::models::{ChatMessage, ConversationSummary, Sender};

pub const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub user_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub conversation_id: String,
    pub initial_message: ChatMessage,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRequest {
    pub user_id: Option<String>,
    pub conversation_id: Option<String>,
    pub message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub user_message: ChatMessage,
    pub bot_message: ChatMessage,
}

/// `POST /api/chatbot/conversation/start`: new conversation seeded with a greeting.
/// The body is optional.
pub async fn start(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    body: Option<ApiJson<StartRequest>>,
) -> Result<Json<StartResponse>, ApiError> {
    let req = body.map(|ApiJson(req)| req).unwrap_or_default();
    let user_id = auth.resolve_body_user(req.user_id.as_deref())?;
    let conversation_id = format!("conv-{}", uuid::Uuid::new_v4().simple());

    let greeting = ChatMessage::new(user_id, &conversation_id, Sender::Bot, ctx.core.engine().greeting());
    let conn = ctx.open_db()?;
    db::insert_message(&conn, &greeting)?;

    tracing::info!(user_id = %user_id, conversation_id = %conversation_id, "Conversation started");
    Ok(Json(StartResponse {
        conversation_id,
        initial_message: greeting,
    }))
}

/// `POST /api/chatbot/message`: store the user turn and the bot reply.
pub async fn message(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user_id = auth.resolve_body_user(req.user_id.as_deref())?;
    let conversation_id = required(req.conversation_id.as_deref(), "conversationId")?.to_string();
    let text = required(req.message.as_deref(), "message")?.to_string();
    if text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::BadRequest(format!(
            "message must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }

    let conn = ctx.open_db()?;
    let last = db::last_message_timestamp(&conn, &user_id, &conversation_id)?
        .ok_or_else(|| ApiError::NotFound("Conversation not found".into()))?;

    // Keep history non-decreasing even if the wall clock steps back.
    let mut user_message = ChatMessage::new(user_id, &conversation_id, Sender::User, text);
    user_message.timestamp = user_message.timestamp.max(last);

    let reply = ctx.core.engine().reply(&user_message.message);
    let mut bot_message = ChatMessage::new(user_id, &conversation_id, Sender::Bot, reply);
    bot_message.timestamp = bot_message.timestamp.max(user_message.timestamp);

    db::insert_message(&conn, &user_message)?;
    db::insert_message(&conn, &bot_message)?;

    Ok(Json(MessageResponse {
        user_message,
        bot_message,
    }))
}

/// `GET /api/chatbot/:id/conversations`.
pub async fn conversations(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ConversationSummary>>, ApiError> {
    let user_id = parse_id(&id, "user id")?;
    auth.ensure_can_read(&user_id)?;

    let conn = ctx.open_db()?;
    Ok(Json(db::list_conversations(&conn, &user_id)?))
}

/// `GET /api/chatbot/:id/:child`: full history, oldest first.
pub async fn history(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path((id, conversation_id)): Path<(String, String)>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    let user_id = parse_id(&id, "user id")?;
    auth.ensure_can_read(&user_id)?;

    let conn = ctx.open_db()?;
    let messages = db::get_conversation_messages(&conn, &user_id, &conversation_id)?;
    if messages.is_empty() {
        return Err(ApiError::NotFound("Conversation not found".into()));
    }
    Ok(Json(messages))
}
