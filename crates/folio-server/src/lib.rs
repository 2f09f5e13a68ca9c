//! HTTP server wiring for Folio.
//!
//! Mounts the [`folio_api`] router under `/api`, backed by a
//! [`Counter`] over a [`JsonFileStore`], and adds the tracing and CORS
//! layers.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use folio_core::{counter::Counter, record::VisitorRecord};
use folio_store_json::JsonFileStore;
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// The counter type served by the binary.
pub type FileCounter = Counter<JsonFileStore<VisitorRecord>>;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `FOLIO_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:      String,
  pub port:      u16,
  /// Location of the visitor record.
  pub data_path: PathBuf,
  /// Allow cross-origin requests from any origin.
  pub cors:      bool,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:      "127.0.0.1".to_string(),
      port:      3001,
      data_path: PathBuf::from("data/visitors.json"),
      cors:      true,
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Open the visitor store at `path`.
pub async fn open_counter(path: &Path) -> folio_store_json::Result<FileCounter> {
  Ok(Counter::new(JsonFileStore::open(path).await?))
}

/// Build the application router.
pub fn app(counter: Arc<FileCounter>, config: &ServerConfig) -> Router {
  let router = Router::new()
    .nest("/api", folio_api::api_router(counter))
    .layer(TraceLayer::new_for_http());

  if config.cors {
    router.layer(CorsLayer::permissive())
  } else {
    router
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::Value;
  use tempfile::TempDir;
  use tower::ServiceExt as _;

  use super::*;

  async fn make_app(dir: &TempDir, cors: bool) -> Router {
    let config = ServerConfig {
      data_path: dir.path().join("data").join("visitors.json"),
      cors,
      ..ServerConfig::default()
    };
    let counter = open_counter(&config.data_path).await.unwrap();
    app(Arc::new(counter), &config)
  }

  async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
      .await
      .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
  }

  fn post(uri: &str) -> Request<Body> {
    Request::builder()
      .method("POST")
      .uri(uri)
      .body(Body::empty())
      .unwrap()
  }

  #[test]
  fn defaults() {
    let cfg = ServerConfig::default();
    assert_eq!(cfg.address(), "127.0.0.1:3001");
    assert_eq!(cfg.data_path, PathBuf::from("data/visitors.json"));
    assert!(cfg.cors);
  }

  #[test]
  fn tilde_expansion_leaves_relative_paths_alone() {
    assert_eq!(
      expand_tilde(Path::new("data/visitors.json")),
      PathBuf::from("data/visitors.json")
    );
  }

  #[tokio::test]
  async fn increments_are_written_to_disk() {
    let dir = TempDir::new().unwrap();

    let (status, json) = send(make_app(&dir, true).await, post("/api/visitors/increment")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1111);

    let raw = std::fs::read_to_string(dir.path().join("data").join("visitors.json")).unwrap();
    let on_disk: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(on_disk["count"], 1111);
    assert_eq!(on_disk["lastUpdated"], json["lastUpdated"]);
  }

  #[tokio::test]
  async fn reset_then_get() {
    let dir = TempDir::new().unwrap();

    let req = Request::builder()
      .method("POST")
      .uri("/api/visitors/reset")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(r#"{"count": 3000}"#))
      .unwrap();
    let (status, _) = send(make_app(&dir, false).await, req).await;
    assert_eq!(status, StatusCode::OK);

    let get = Request::builder()
      .uri("/api/visitors")
      .body(Body::empty())
      .unwrap();
    let (_, json) = send(make_app(&dir, false).await, get).await;
    assert_eq!(json["count"], 3000);
  }

  #[tokio::test]
  async fn cors_headers_when_enabled() {
    let dir = TempDir::new().unwrap();
    let req = Request::builder()
      .uri("/api/visitors")
      .header(header::ORIGIN, "https://example.com")
      .body(Body::empty())
      .unwrap();
    let resp = make_app(&dir, true).await.oneshot(req).await.unwrap();
    assert!(resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
  }

  #[tokio::test]
  async fn unknown_routes_are_404() {
    let dir = TempDir::new().unwrap();
    let req = Request::builder()
      .uri("/api/nope")
      .body(Body::empty())
      .unwrap();
    let (status, _) = send(make_app(&dir, false).await, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }
}
