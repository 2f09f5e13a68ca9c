//! The `DocumentStore` trait and an in-memory implementation.
//!
//! A document store holds at most one value of type `T`. Backends (the JSON
//! file store in `folio-store-json`, [`MemoryStore`] here) implement it;
//! [`Counter`](crate::counter::Counter) and
//! [`VisitTracker`](crate::tracker::VisitTracker) depend on this abstraction,
//! not on any concrete backend.

use std::{convert::Infallible, future::Future, sync::Arc};

use parking_lot::Mutex;

/// Abstraction over a single-document storage backend.
///
/// There is no compare-and-swap: a `load` followed by a `save` is not atomic
/// with respect to other writers.
pub trait DocumentStore<T>: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read the stored document. Returns `None` if nothing has been stored yet.
  fn load(&self) -> impl Future<Output = Result<Option<T>, Self::Error>> + Send + '_;

  /// Overwrite the stored document.
  fn save<'a>(
    &'a self,
    doc: &'a T,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// A store that keeps the document in memory.
///
/// Cloning is cheap and clones share the same slot.
#[derive(Debug)]
pub struct MemoryStore<T> {
  slot: Arc<Mutex<Option<T>>>,
}

impl<T> MemoryStore<T> {
  pub fn new() -> Self {
    Self {
      slot: Arc::new(Mutex::new(None)),
    }
  }

  pub fn with_value(value: T) -> Self {
    Self {
      slot: Arc::new(Mutex::new(Some(value))),
    }
  }
}

impl<T> Default for MemoryStore<T> {
  fn default() -> Self { Self::new() }
}

impl<T> Clone for MemoryStore<T> {
  fn clone(&self) -> Self {
    Self {
      slot: Arc::clone(&self.slot),
    }
  }
}

impl<T> DocumentStore<T> for MemoryStore<T>
where
  T: Clone + Send + Sync,
{
  type Error = Infallible;

  fn load(&self) -> impl Future<Output = Result<Option<T>, Self::Error>> + Send + '_ {
    let value = self.slot.lock().clone();
    async move { Ok(value) }
  }

  fn save<'a>(
    &'a self,
    doc: &'a T,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a {
    *self.slot.lock() = Some(doc.clone());
    async { Ok(()) }
  }
}
