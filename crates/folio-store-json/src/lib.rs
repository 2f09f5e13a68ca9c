//! JSON file backend for Folio document stores.
//!
//! Each [`JsonFileStore`] owns one file holding one pretty-printed JSON
//! document. All I/O goes through `tokio::fs`.

mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::JsonFileStore;
