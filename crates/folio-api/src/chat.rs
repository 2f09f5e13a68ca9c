//! Handler for `POST /chat`.
//!
//! Answers come from the canned-response matcher; nothing is persisted. The
//! caller keeps the session id and sends it back with later messages.

use axum::Json;
use bytes::Bytes;
use folio_core::{
  chat::{ChatMessage, new_session_id},
  matcher::{self, Topic},
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBody {
  pub message:    String,
  pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
  pub success:    bool,
  pub session_id: String,
  pub topic:      Topic,
  pub reply:      ChatMessage,
}

/// `POST /chat`, body: `{"message": "...", "sessionId": "..."}`.
pub async fn handler(body: Bytes) -> Result<Json<ChatResponse>, ApiError> {
  let body: ChatBody = serde_json::from_slice(&body)
    .map_err(|e| ApiError::BadRequest(format!("invalid chat body: {e}")))?;

  let question = body.message.trim();
  if question.is_empty() {
    return Err(ApiError::BadRequest("message must not be empty".into()));
  }

  let session_id = body
    .session_id
    .filter(|s| !s.trim().is_empty())
    .unwrap_or_else(new_session_id);

  let canned = matcher::reply(question);
  tracing::debug!(%session_id, topic = ?canned.topic, "chat reply");

  Ok(Json(ChatResponse {
    success: true,
    reply: ChatMessage::assistant(session_id.clone(), canned.text),
    session_id,
    topic: canned.topic,
  }))
}
