//! Error types for `vouch-core`.

use thiserror::Error;

use crate::supplier::SupplierId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("supplier not found: {0}")]
  SupplierNotFound(SupplierId),

  #[error("note text must not be blank")]
  EmptyNote,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
