//! [`SqliteLocalStore`]: the SQLite implementation of [`LocalStore`].

use std::{path::Path, sync::Mutex};

use rusqlite::{Connection, OptionalExtension as _};
use vouch_core::store::LocalStore;

use crate::{schema::LOCAL_ITEMS, Error, Result};

/// Synchronous key-value items in their own SQLite file.
pub struct SqliteLocalStore {
  conn: Mutex<Connection>,
}

impl SqliteLocalStore {
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::init(Connection::open(path)?)
  }

  pub fn open_in_memory() -> Result<Self> { Self::init(Connection::open_in_memory()?) }

  fn init(conn: Connection) -> Result<Self> {
    conn.execute_batch(LOCAL_ITEMS)?;
    Ok(Self { conn: Mutex::new(conn) })
  }
}

impl LocalStore for SqliteLocalStore {
  type Error = Error;

  fn get_item(&self, key: &str) -> Result<Option<String>> {
    let conn = self.conn.lock().map_err(|_| Error::Poisoned)?;
    Ok(
      conn
        .query_row(
          "SELECT value FROM local_items WHERE key = ?1",
          rusqlite::params![key],
          |r| r.get(0),
        )
        .optional()?,
    )
  }

  fn set_item(&self, key: &str, value: &str) -> Result<()> {
    let conn = self.conn.lock().map_err(|_| Error::Poisoned)?;
    conn.execute(
      "INSERT INTO local_items (key, value) VALUES (?1, ?2)
       ON CONFLICT (key) DO UPDATE SET value = excluded.value",
      rusqlite::params![key, value],
    )?;
    Ok(())
  }
}
