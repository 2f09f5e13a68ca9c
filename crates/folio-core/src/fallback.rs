//! [`Fallback`]: a remote counter with a local mirror.
//!
//! Every operation goes to the primary counter first. Successful results are
//! copied into the local mirror so that, when the primary later becomes
//! unreachable, the mirror carries on from the last count the primary
//! reported rather than from the default.

use std::future::Future;

use crate::{
  counter::{Counter, VisitorCounter},
  record::VisitorRecord,
  store::DocumentStore,
};

#[derive(Debug, Clone)]
pub struct Fallback<P, S> {
  primary: P,
  mirror:  Counter<S>,
}

impl<P, S> Fallback<P, S>
where
  P: VisitorCounter,
  S: DocumentStore<VisitorRecord>,
{
  pub fn new(primary: P, mirror: Counter<S>) -> Self { Self { primary, mirror } }

  pub fn primary(&self) -> &P { &self.primary }

  pub fn mirror(&self) -> &Counter<S> { &self.mirror }

  async fn reconcile(
    &self,
    op: &'static str,
    primary: Result<VisitorRecord, P::Error>,
    local: impl Future<Output = Result<VisitorRecord, S::Error>> + Send,
  ) -> Result<VisitorRecord, S::Error> {
    match primary {
      Ok(record) => {
        if let Err(e) = self.mirror.store().save(&record).await {
          tracing::warn!(op, error = %e, "failed to update local mirror");
        }
        Ok(record)
      }
      Err(e) => {
        tracing::warn!(op, error = %e, "primary counter unavailable, using local mirror");
        local.await
      }
    }
  }
}

impl<P, S> VisitorCounter for Fallback<P, S>
where
  P: VisitorCounter,
  S: DocumentStore<VisitorRecord>,
{
  type Error = S::Error;

  fn current(&self) -> impl Future<Output = Result<VisitorRecord, Self::Error>> + Send + '_ {
    async move {
      let primary = self.primary.current().await;
      self.reconcile("current", primary, self.mirror.current()).await
    }
  }

  fn increment(&self) -> impl Future<Output = Result<VisitorRecord, Self::Error>> + Send + '_ {
    async move {
      let primary = self.primary.increment().await;
      self
        .reconcile("increment", primary, self.mirror.increment())
        .await
    }
  }

  fn reset(
    &self,
    count: Option<u64>,
  ) -> impl Future<Output = Result<VisitorRecord, Self::Error>> + Send + '_ {
    async move {
      let primary = self.primary.reset(count).await;
      self
        .reconcile("reset", primary, self.mirror.reset(count))
        .await
    }
  }
}
