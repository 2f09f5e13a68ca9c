//! Handler for `GET /knowledge`.

use axum::{Json, extract::Query};
use folio_core::knowledge::{self, KnowledgeEntry};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct KnowledgeParams {
  /// Free text; entries with a keyword contained in it are returned.
  pub q:        Option<String>,
  pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct KnowledgeResponse {
  pub success: bool,
  pub entries: Vec<&'static KnowledgeEntry>,
}

/// `GET /knowledge[?q=...][&category=...]`
pub async fn handler(Query(params): Query<KnowledgeParams>) -> Json<KnowledgeResponse> {
  let entries = knowledge::search(params.q.as_deref(), params.category.as_deref());
  Json(KnowledgeResponse {
    success: true,
    entries,
  })
}
