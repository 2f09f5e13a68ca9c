//! [`JsonFileStore`], the file-backed implementation of [`DocumentStore`].

use std::{
  future::Future,
  io::ErrorKind,
  marker::PhantomData,
  path::{Path, PathBuf},
  sync::Arc,
};

use folio_core::store::DocumentStore;
use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, Result};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A single JSON document stored at a fixed path.
///
/// The parent directory is created on demand. Writes overwrite the file in
/// place; there is no locking and no temp-file rename.
///
/// Cloning is cheap; the path is reference-counted.
#[derive(Debug)]
pub struct JsonFileStore<T> {
  path:    Arc<PathBuf>,
  _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonFileStore<T> {
  fn clone(&self) -> Self {
    Self {
      path:    Arc::clone(&self.path),
      _marker: PhantomData,
    }
  }
}

impl<T> JsonFileStore<T> {
  /// Open a store at `path`, creating its parent directory if absent.
  /// The file itself is not created until the first save.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let store = Self {
      path:    Arc::new(path.as_ref().to_path_buf()),
      _marker: PhantomData,
    };
    store.ensure_parent().await?;
    Ok(store)
  }

  pub fn path(&self) -> &Path { &self.path }

  fn io_error(&self, source: std::io::Error) -> Error {
    Error::Io {
      path: self.path.to_path_buf(),
      source,
    }
  }

  async fn ensure_parent(&self) -> Result<()> {
    match self.path.parent() {
      Some(dir) if !dir.as_os_str().is_empty() => tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| self.io_error(e)),
      _ => Ok(()),
    }
  }
}

impl<T> JsonFileStore<T>
where
  T: Serialize + DeserializeOwned,
{
  async fn read(&self) -> Result<Option<T>> {
    self.ensure_parent().await?;

    let raw = match tokio::fs::read_to_string(self.path.as_path()).await {
      Ok(raw) => raw,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(self.io_error(e)),
    };

    let doc = serde_json::from_str(&raw).map_err(|source| Error::Corrupt {
      path: self.path.to_path_buf(),
      source,
    })?;
    tracing::debug!(path = %self.path.display(), "document loaded");
    Ok(Some(doc))
  }

  async fn write(&self, doc: &T) -> Result<()> {
    self.ensure_parent().await?;
    let raw = serde_json::to_string_pretty(doc)?;
    tokio::fs::write(self.path.as_path(), raw)
      .await
      .map_err(|e| self.io_error(e))?;
    tracing::debug!(path = %self.path.display(), "document saved");
    Ok(())
  }
}

impl<T> DocumentStore<T> for JsonFileStore<T>
where
  T: Serialize + DeserializeOwned + Send + Sync,
{
  type Error = Error;

  fn load(&self) -> impl Future<Output = Result<Option<T>>> + Send + '_ {
    self.read()
  }

  fn save<'a>(&'a self, doc: &'a T) -> impl Future<Output = Result<()>> + Send + 'a {
    self.write(doc)
  }
}
