//! Core types and trait definitions for the Folio portfolio backend.
//!
//! This crate is deliberately free of HTTP and filesystem dependencies.
//! Storage backends implement [`store::DocumentStore`]; the HTTP layer and the
//! CLI talk to the visitor count through [`counter::VisitorCounter`].

pub mod analytics;
pub mod chat;
pub mod counter;
pub mod error;
pub mod fallback;
pub mod knowledge;
pub mod matcher;
pub mod record;
pub mod store;
pub mod tracker;

pub use error::{Error, Result};
