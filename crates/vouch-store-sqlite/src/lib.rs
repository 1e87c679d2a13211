//! SQLite backends for the Vouch document and local stores.
//!
//! [`SqliteDocumentStore`] wraps [`tokio_rusqlite`] so remote-document access
//! runs off the async runtime. [`SqliteLocalStore`] is a plain synchronous
//! connection; it is written on every state change and must not await.

mod document;
mod local;
mod schema;

pub mod error;

pub use document::SqliteDocumentStore;
pub use error::{Error, Result};
pub use local::SqliteLocalStore;

#[cfg(test)]
mod tests;
