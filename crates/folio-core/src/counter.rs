//! The `VisitorCounter` trait and the store-backed [`Counter`].

use std::future::Future;

use crate::{
  record::{DEFAULT_COUNT, VisitorRecord},
  store::DocumentStore,
};

/// Anything that can report, bump and reset the visitor count.
///
/// Implemented by [`Counter`] (local store), by the CLI's HTTP client (remote
/// API) and by [`Fallback`](crate::fallback::Fallback), which combines the
/// two.
pub trait VisitorCounter: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The current record.
  fn current(&self) -> impl Future<Output = Result<VisitorRecord, Self::Error>> + Send + '_;

  /// Record one visit and return the new record.
  fn increment(&self) -> impl Future<Output = Result<VisitorRecord, Self::Error>> + Send + '_;

  /// Overwrite the count with `count`, or [`DEFAULT_COUNT`] when `None`.
  fn reset(
    &self,
    count: Option<u64>,
  ) -> impl Future<Output = Result<VisitorRecord, Self::Error>> + Send + '_;
}

/// A visitor counter over a single-document store.
///
/// Reads never fail: a missing, corrupt or unreadable record is reported as
/// [`VisitorRecord::baseline`]. `increment` is a plain read-modify-write with
/// no locking, so concurrent increments may lose updates (last writer wins).
#[derive(Debug, Clone)]
pub struct Counter<S> {
  store: S,
}

impl<S> Counter<S>
where
  S: DocumentStore<VisitorRecord>,
{
  pub fn new(store: S) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  async fn read(&self) -> VisitorRecord {
    match self.store.load().await {
      Ok(Some(record)) => record,
      Ok(None) => VisitorRecord::baseline(),
      Err(e) => {
        tracing::warn!(error = %e, "visitor record unreadable, using baseline");
        VisitorRecord::baseline()
      }
    }
  }

  async fn write(&self, record: VisitorRecord) -> Result<VisitorRecord, S::Error> {
    self.store.save(&record).await?;
    tracing::debug!(count = record.count, "visitor record written");
    Ok(record)
  }
}

impl<S> VisitorCounter for Counter<S>
where
  S: DocumentStore<VisitorRecord>,
{
  type Error = S::Error;

  fn current(&self) -> impl Future<Output = Result<VisitorRecord, Self::Error>> + Send + '_ {
    async move { Ok(self.read().await) }
  }

  fn increment(&self) -> impl Future<Output = Result<VisitorRecord, Self::Error>> + Send + '_ {
    async move {
      let next = self.read().await.incremented();
      self.write(next).await
    }
  }

  fn reset(
    &self,
    count: Option<u64>,
  ) -> impl Future<Output = Result<VisitorRecord, Self::Error>> + Send + '_ {
    async move {
      let record = VisitorRecord::new(count.unwrap_or(DEFAULT_COUNT));
      tracing::info!(count = record.count, "visitor count reset");
      self.write(record).await
    }
  }
}
