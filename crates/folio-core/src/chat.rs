//! Chat messages exchanged with the profile assistant.
//!
//! Messages are built per request and never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
  User,
  Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
  pub id:         Uuid,
  pub session_id: String,
  pub content:    String,
  #[serde(rename = "type")]
  pub kind:       MessageKind,
  pub timestamp:  DateTime<Utc>,
}

impl ChatMessage {
  pub fn user(session_id: impl Into<String>, content: impl Into<String>) -> Self {
    Self::new(session_id.into(), content.into(), MessageKind::User)
  }

  pub fn assistant(session_id: impl Into<String>, content: impl Into<String>) -> Self {
    Self::new(session_id.into(), content.into(), MessageKind::Assistant)
  }

  fn new(session_id: String, content: String, kind: MessageKind) -> Self {
    Self {
      id: Uuid::new_v4(),
      session_id,
      content,
      kind,
      timestamp: Utc::now(),
    }
  }
}

/// A session id for callers that did not supply one.
pub fn new_session_id() -> String { format!("session-{}", Uuid::new_v4()) }
