//! [`SqliteDocumentStore`]: the SQLite implementation of [`DocumentStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use serde_json::Value;
use vouch_core::store::DocumentStore;

use crate::{schema::DOCUMENTS, Error, Result};

/// A keyed document collection backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteDocumentStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteDocumentStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(DOCUMENTS)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of documents held in `collection`.
  pub async fn count(&self, collection: &str) -> Result<usize> {
    let collection = collection.to_owned();
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM documents WHERE collection = ?1",
          rusqlite::params![collection],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(n as usize)
  }
}

impl DocumentStore for SqliteDocumentStore {
  type Error = Error;

  async fn get<'a>(&'a self, collection: &'a str, key: &'a str) -> Result<Option<Value>> {
    let collection = collection.to_owned();
    let key = key.to_owned();

    let body: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT body FROM documents WHERE collection = ?1 AND key = ?2",
              rusqlite::params![collection, key],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(body.map(|b| serde_json::from_str(&b)).transpose()?)
  }

  async fn set<'a>(&'a self, collection: &'a str, key: &'a str, document: Value) -> Result<()> {
    let collection = collection.to_owned();
    let key = key.to_owned();
    let body = serde_json::to_string(&document)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (collection, key, body) VALUES (?1, ?2, ?3)
           ON CONFLICT (collection, key) DO UPDATE
             SET body = excluded.body,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
          rusqlite::params![collection, key, body],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
