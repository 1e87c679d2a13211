//! Error type for `vouch-sync`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("remote store error: {0}")]
  Remote(Box<dyn std::error::Error + Send + Sync>),

  #[error("local store error: {0}")]
  Local(Box<dyn std::error::Error + Send + Sync>),

  #[error("core error: {0}")]
  Core(#[from] vouch_core::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("chunk {0} is missing")]
  MissingChunk(usize),

  #[error("metadata declares {expected} suppliers but chunks hold {found}")]
  CountMismatch { expected: usize, found: usize },

  #[error("no snapshot has been tracked yet")]
  NothingToSave,
}

impl Error {
  pub(crate) fn remote(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Remote(Box::new(e))
  }

  pub(crate) fn local(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Local(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
