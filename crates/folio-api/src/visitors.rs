//! Handlers for `/visitors` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/visitors` | Current record; the default count if none is stored |
//! | `POST` | `/visitors/increment` | Read, add one, write back |
//! | `POST` | `/visitors/reset` | Optional body `{"count": 1500}`; default 1110 |

use std::sync::Arc;

use axum::{Json, extract::State};
use bytes::Bytes;
use folio_core::{counter::VisitorCounter, record::VisitorRecord};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ─── Response ─────────────────────────────────────────────────────────────────

/// `{success, count, lastUpdated}` plus an operation flag.
#[derive(Debug, Serialize)]
pub struct VisitorResponse {
  pub success:   bool,
  #[serde(flatten)]
  pub record:    VisitorRecord,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub increment: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reset:     Option<bool>,
}

impl VisitorResponse {
  fn new(record: VisitorRecord) -> Self {
    Self {
      success: true,
      record,
      increment: None,
      reset: None,
    }
  }
}

// ─── Get ──────────────────────────────────────────────────────────────────────

/// `GET /visitors`
pub async fn get<C>(State(counter): State<Arc<C>>) -> Result<Json<VisitorResponse>, ApiError>
where
  C: VisitorCounter,
{
  let record = counter
    .current()
    .await
    .map_err(|e| ApiError::Read(Box::new(e)))?;
  Ok(Json(VisitorResponse::new(record)))
}

// ─── Increment ────────────────────────────────────────────────────────────────

/// `POST /visitors/increment`
pub async fn increment<C>(
  State(counter): State<Arc<C>>,
) -> Result<Json<VisitorResponse>, ApiError>
where
  C: VisitorCounter,
{
  let record = counter
    .increment()
    .await
    .map_err(|e| ApiError::Increment(Box::new(e)))?;
  Ok(Json(VisitorResponse {
    increment: Some(true),
    ..VisitorResponse::new(record)
  }))
}

// ─── Reset ────────────────────────────────────────────────────────────────────

/// A count given either as a JSON number or as a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CountInput {
  Number(u64),
  Text(String),
}

impl CountInput {
  fn value(self) -> Result<u64, ApiError> {
    match self {
      CountInput::Number(n) => Ok(n),
      CountInput::Text(s) => s
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid count: {s:?}"))),
    }
  }
}

/// JSON body accepted by `POST /visitors/reset`. The body itself is optional.
#[derive(Debug, Default, Deserialize)]
pub struct ResetBody {
  pub count: Option<CountInput>,
}

impl ResetBody {
  /// Parse a possibly-empty request body.
  pub fn parse(raw: &[u8]) -> Result<Self, ApiError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
      return Ok(Self::default());
    }
    serde_json::from_slice(raw)
      .map_err(|e| ApiError::BadRequest(format!("invalid reset body: {e}")))
  }
}

/// `POST /visitors/reset`, body: `{"count": <n>}` (optional).
pub async fn reset<C>(
  State(counter): State<Arc<C>>,
  body: Bytes,
) -> Result<Json<VisitorResponse>, ApiError>
where
  C: VisitorCounter,
{
  let count = ResetBody::parse(&body)?
    .count
    .map(CountInput::value)
    .transpose()?;

  let record = counter
    .reset(count)
    .await
    .map_err(|e| ApiError::Reset(Box::new(e)))?;
  Ok(Json(VisitorResponse {
    reset: Some(true),
    ..VisitorResponse::new(record)
  }))
}
