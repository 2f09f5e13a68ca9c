//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure is reported with the same envelope as a success, but with
//! `"success": false` and an `"error"` message.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use folio_core::record::DEFAULT_COUNT;
use serde_json::json;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("failed to read visitor count: {0}")]
  Read(#[source] BoxError),

  #[error("failed to increment visitor count: {0}")]
  Increment(#[source] BoxError),

  #[error("failed to reset visitor count: {0}")]
  Reset(#[source] BoxError),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    tracing::error!(error = %self, "request failed");
    let (status, body) = match &self {
      ApiError::BadRequest(m) => (
        StatusCode::BAD_REQUEST,
        json!({ "success": false, "error": m }),
      ),
      ApiError::Read(_) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({
          "success": false,
          "error": "Failed to read visitor count",
          "count": DEFAULT_COUNT,
        }),
      ),
      ApiError::Increment(_) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "success": false, "error": "Failed to increment visitor count" }),
      ),
      ApiError::Reset(_) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "success": false, "error": "Failed to reset visitor count" }),
      ),
    };
    (status, Json(body)).into_response()
  }
}
