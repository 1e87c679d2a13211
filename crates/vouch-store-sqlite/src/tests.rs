//! Tests for both SQLite stores against in-memory databases.

use serde_json::json;
use vouch_core::store::{keys, DocumentStore, LocalStore};

use crate::{SqliteDocumentStore, SqliteLocalStore};

async fn documents() -> SqliteDocumentStore {
  SqliteDocumentStore::open_in_memory()
    .await
    .expect("in-memory store")
}

// ─── Documents ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_document_is_none() {
  let s = documents().await;
  assert!(s.get("suppliers", keys::METADATA).await.unwrap().is_none());
}

#[tokio::test]
async fn set_then_get() {
  let s = documents().await;
  let doc = json!({ "chunkCount": 2, "totalSuppliers": 1500 });
  s.set("suppliers", keys::METADATA, doc.clone()).await.unwrap();
  assert_eq!(s.get("suppliers", keys::METADATA).await.unwrap(), Some(doc));
}

#[tokio::test]
async fn set_overwrites() {
  let s = documents().await;
  s.set("suppliers", &keys::chunk(0), json!({ "n": 1 })).await.unwrap();
  s.set("suppliers", &keys::chunk(0), json!({ "n": 2 })).await.unwrap();
  assert_eq!(
    s.get("suppliers", &keys::chunk(0)).await.unwrap(),
    Some(json!({ "n": 2 }))
  );
  assert_eq!(s.count("suppliers").await.unwrap(), 1);
}

#[tokio::test]
async fn collections_are_separate() {
  let s = documents().await;
  s.set("suppliers", keys::LEGACY, json!([1])).await.unwrap();
  assert!(s.get("archive", keys::LEGACY).await.unwrap().is_none());
  assert_eq!(s.count("archive").await.unwrap(), 0);
}

// ─── Local items ─────────────────────────────────────────────────────────────

#[test]
fn local_round_trip() {
  let s = SqliteLocalStore::open_in_memory().unwrap();
  assert!(s.get_item("suppliers-data").unwrap().is_none());
  s.set_item("suppliers-data", "{\"suppliers\":[]}").unwrap();
  s.set_item("suppliers-data", "{}").unwrap();
  assert_eq!(s.get_item("suppliers-data").unwrap().as_deref(), Some("{}"));
}
