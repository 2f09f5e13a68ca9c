//! Async HTTP client wrapping the Folio JSON API.

use std::{future::Future, time::Duration};

use folio_core::{chat::ChatMessage, counter::VisitorCounter, matcher::Topic, record::VisitorRecord};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{context}: {source}")]
  Http {
    context: &'static str,
    #[source]
    source:  reqwest::Error,
  },

  #[error("{context} → {status}: {message}")]
  Status {
    context: &'static str,
    status:  StatusCode,
    message: String,
  },
}

/// Body of a `/chat` reply.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
  pub session_id: String,
  pub topic:      Topic,
  pub reply:      ChatMessage,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest<'a> {
  message:    &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  session_id: Option<&'a str>,
}

/// Async HTTP client for the Folio JSON API.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client:   Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
    let client = Client::builder()
      .timeout(Duration::from_secs(10))
      .build()
      .map_err(|source| Error::Http {
        context: "failed to build HTTP client",
        source,
      })?;
    Ok(Self {
      client,
      base_url: base_url.into(),
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
  }

  async fn send<T>(
    &self,
    context: &'static str,
    req: reqwest::RequestBuilder,
  ) -> Result<T, Error>
  where
    T: DeserializeOwned,
  {
    let resp = req
      .send()
      .await
      .map_err(|source| Error::Http { context, source })?;

    let status = resp.status();
    if !status.is_success() {
      let message = resp
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|v| v["error"].as_str().map(str::to_owned))
        .unwrap_or_default();
      return Err(Error::Status {
        context,
        status,
        message,
      });
    }

    resp
      .json()
      .await
      .map_err(|source| Error::Http { context, source })
  }

  // ── Visitors ──────────────────────────────────────────────────────────────

  /// `GET /api/visitors`
  pub async fn visitors(&self) -> Result<VisitorRecord, Error> {
    self
      .send("GET /visitors", self.client.get(self.url("/visitors")))
      .await
  }

  /// `POST /api/visitors/increment`
  pub async fn increment_visitors(&self) -> Result<VisitorRecord, Error> {
    self
      .send(
        "POST /visitors/increment",
        self.client.post(self.url("/visitors/increment")),
      )
      .await
  }

  /// `POST /api/visitors/reset`
  pub async fn reset_visitors(&self, count: Option<u64>) -> Result<VisitorRecord, Error> {
    let body = match count {
      Some(count) => json!({ "count": count }),
      None => json!({}),
    };
    self
      .send(
        "POST /visitors/reset",
        self.client.post(self.url("/visitors/reset")).json(&body),
      )
      .await
  }

  // ── Assistant ─────────────────────────────────────────────────────────────

  /// `POST /api/chat`
  pub async fn ask(&self, message: &str, session_id: Option<&str>) -> Result<ChatReply, Error> {
    self
      .send(
        "POST /chat",
        self.client.post(self.url("/chat")).json(&ChatRequest {
          message,
          session_id,
        }),
      )
      .await
  }
}

impl VisitorCounter for ApiClient {
  type Error = Error;

  fn current(&self) -> impl Future<Output = Result<VisitorRecord, Error>> + Send + '_ {
    self.visitors()
  }

  fn increment(&self) -> impl Future<Output = Result<VisitorRecord, Error>> + Send + '_ {
    self.increment_visitors()
  }

  fn reset(
    &self,
    count: Option<u64>,
  ) -> impl Future<Output = Result<VisitorRecord, Error>> + Send + '_ {
    self.reset_visitors(count)
  }
}
