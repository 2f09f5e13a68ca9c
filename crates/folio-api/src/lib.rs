//! JSON REST API for Folio.
//!
//! Exposes an axum [`Router`] backed by any
//! [`folio_core::counter::VisitorCounter`]. TLS, CORS and tracing layers are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", folio_api::api_router(counter.clone()))
//! ```

pub mod chat;
pub mod error;
pub mod knowledge;
pub mod visitors;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use folio_core::counter::VisitorCounter;

pub use error::ApiError;

/// Build a fully-materialised API router for `counter`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<C>(counter: Arc<C>) -> Router<()>
where
  C: VisitorCounter + 'static,
{
  Router::new()
    // Visitor counter
    .route("/visitors", get(visitors::get::<C>))
    .route("/visitors/increment", post(visitors::increment::<C>))
    .route("/visitors/reset", post(visitors::reset::<C>))
    // Assistant
    .route("/chat", post(chat::handler))
    .route("/knowledge", get(knowledge::handler))
    .with_state(counter)
}
