//! Storage abstractions consumed by the persistence reconciler.
//!
//! Two stores back the collection:
//!
//! - a [`DocumentStore`]: the remote, keyed document collection. Only `get`
//!   and `set` are used, addressed by a fixed key scheme (see [`keys`]).
//! - a [`LocalStore`]: a synchronous string key-value store holding the whole
//!   JSON envelope under one key, used when the remote is unreachable.
//!
//! Backends live in separate crates (e.g. `vouch-store-sqlite`).

use std::future::Future;

use serde_json::Value;

/// Document keys used inside the supplier collection.
pub mod keys {
  /// Chunk count, record count and save timestamp.
  pub const METADATA: &str = "metadata";
  /// Single-document layout written before chunking existed.
  pub const LEGACY: &str = "main";

  pub fn chunk(index: usize) -> String { format!("chunk_{index}") }
}

/// Abstraction over a remote document store.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read the document at `collection/key`. Returns `None` if absent.
  fn get<'a>(
    &'a self,
    collection: &'a str,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send + 'a;

  /// Create or overwrite the document at `collection/key`.
  fn set<'a>(
    &'a self,
    collection: &'a str,
    key: &'a str,
    document: Value,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// Abstraction over a synchronous single-device key-value store.
pub trait LocalStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error>;

  fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error>;
}
