//! Reconciler tests against in-memory stores.

use std::{
  collections::BTreeMap,
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
  time::Duration,
};

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use vouch_core::{
  controller::{Actor, Command, Controller, Snapshot},
  store::{DocumentStore, LocalStore},
  supplier::{Envelope, Supplier, SupplierDraft, SupplierId},
};

use crate::{Error, LoadSource, Reconciler, SyncConfig, SyncStatus};

// ─── Fixtures ────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("store unavailable")]
struct Unavailable;

#[derive(Default)]
struct MemoryRemote {
  docs:   Mutex<BTreeMap<String, Value>>,
  writes: Mutex<Vec<String>>,
  down:   AtomicBool,
}

impl MemoryRemote {
  fn with(docs: impl IntoIterator<Item = (&'static str, Value)>) -> Self {
    let remote = Self::default();
    remote
      .docs
      .lock()
      .unwrap()
      .extend(docs.into_iter().map(|(k, v)| (k.to_owned(), v)));
    remote
  }

  fn writes(&self) -> Vec<String> { self.writes.lock().unwrap().clone() }

  fn doc(&self, key: &str) -> Option<Value> { self.docs.lock().unwrap().get(key).cloned() }

  fn set_down(&self, down: bool) { self.down.store(down, Ordering::SeqCst); }
}

impl DocumentStore for MemoryRemote {
  type Error = Unavailable;

  async fn get<'a>(
    &'a self,
    _collection: &'a str,
    key: &'a str,
  ) -> std::result::Result<Option<Value>, Unavailable> {
    if self.down.load(Ordering::SeqCst) {
      return Err(Unavailable);
    }
    Ok(self.doc(key))
  }

  async fn set<'a>(
    &'a self,
    _collection: &'a str,
    key: &'a str,
    document: Value,
  ) -> std::result::Result<(), Unavailable> {
    if self.down.load(Ordering::SeqCst) {
      return Err(Unavailable);
    }
    self.docs.lock().unwrap().insert(key.to_owned(), document);
    self.writes.lock().unwrap().push(key.to_owned());
    Ok(())
  }
}

#[derive(Default)]
struct MemoryLocal {
  items:  Mutex<BTreeMap<String, String>>,
  writes: AtomicUsize,
}

impl MemoryLocal {
  fn with_envelope(envelope: &Envelope) -> Self {
    let local = Self::default();
    local
      .items
      .lock()
      .unwrap()
      .insert("suppliers-data".to_owned(), envelope.to_json().unwrap());
    local
  }
}

impl LocalStore for MemoryLocal {
  type Error = Unavailable;

  fn get_item(&self, key: &str) -> std::result::Result<Option<String>, Unavailable> {
    Ok(self.items.lock().unwrap().get(key).cloned())
  }

  fn set_item(&self, key: &str, value: &str) -> std::result::Result<(), Unavailable> {
    self.items.lock().unwrap().insert(key.to_owned(), value.to_owned());
    self.writes.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }
}

type TestReconciler = Reconciler<MemoryRemote, MemoryLocal>;

fn reconciler(remote: MemoryRemote, local: MemoryLocal) -> TestReconciler {
  Reconciler::new(remote, local, SyncConfig::default())
}

fn supplier(i: i64) -> Supplier {
  Supplier::from_draft(
    SupplierId(i),
    SupplierDraft { supplier_name: format!("s{i}"), ..SupplierDraft::default() },
    "sam",
    DateTime::<Utc>::UNIX_EPOCH,
  )
}

fn suppliers(n: i64) -> Vec<Supplier> { (0..n).map(supplier).collect() }

fn snapshot(version: u64, suppliers: Vec<Supplier>) -> Snapshot {
  Snapshot { version, suppliers: Arc::new(suppliers), last_backup: None }
}

// ─── Remote save ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn chunked_save_writes_chunks_then_metadata() {
  let r = reconciler(MemoryRemote::default(), MemoryLocal::default());
  let snap = snapshot(1, suppliers(2500));
  r.track(&snap);
  r.save_remote(&snap).await.unwrap();

  assert_eq!(r.remote().writes(), ["chunk_0", "chunk_1", "chunk_2", "metadata"]);
  let metadata = r.remote().doc("metadata").unwrap();
  assert_eq!(metadata["totalChunks"], 3);
  assert_eq!(metadata["totalSuppliers"], 2500);
  let last = r.remote().doc("chunk_2").unwrap();
  assert_eq!(last["chunkIndex"], 2);
  assert_eq!(last["suppliers"].as_array().unwrap().len(), 500);
  assert_eq!(r.status(), SyncStatus::Synced);
}

#[tokio::test]
async fn empty_collection_writes_only_metadata() {
  let r = reconciler(MemoryRemote::default(), MemoryLocal::default());
  let snap = snapshot(1, Vec::new());
  r.track(&snap);
  r.save_remote(&snap).await.unwrap();
  assert_eq!(r.remote().writes(), ["metadata"]);
  assert_eq!(r.remote().doc("metadata").unwrap()["totalChunks"], 0);
}

#[tokio::test]
async fn failed_save_goes_offline_and_retry_recovers() {
  let r = reconciler(MemoryRemote::default(), MemoryLocal::default());
  let snap = snapshot(1, suppliers(3));
  r.track(&snap);

  r.remote().set_down(true);
  assert!(matches!(r.retry().await, Err(Error::Remote(_))));
  assert_eq!(r.status(), SyncStatus::Offline);

  r.remote().set_down(false);
  r.retry().await.unwrap();
  assert_eq!(r.status(), SyncStatus::Synced);
  assert_eq!(r.remote().writes(), ["chunk_0", "metadata"]);
}

#[tokio::test]
async fn retry_without_snapshot_has_nothing_to_save() {
  let r = reconciler(MemoryRemote::default(), MemoryLocal::default());
  assert!(matches!(r.retry().await, Err(Error::NothingToSave)));
}

#[tokio::test]
async fn returning_to_saved_content_is_synced() {
  let r = reconciler(MemoryRemote::default(), MemoryLocal::default());
  let saved = snapshot(1, suppliers(2));
  r.track(&saved);
  r.save_remote(&saved).await.unwrap();
  let mut status = r.watch_status();
  assert_eq!(*status.borrow_and_update(), SyncStatus::Synced);

  r.track(&snapshot(2, suppliers(3)));
  assert_eq!(r.status(), SyncStatus::Syncing);
  assert!(status.has_changed().unwrap());

  r.track(&snapshot(3, suppliers(2)));
  assert_eq!(r.status(), SyncStatus::Synced);
}

// ─── Load ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn load_reassembles_chunks_in_order() {
  let writer = reconciler(MemoryRemote::default(), MemoryLocal::default());
  let snap = snapshot(1, suppliers(2500));
  writer.save_remote(&snap).await.unwrap();
  let docs = writer.remote().docs.lock().unwrap().clone();

  let remote = MemoryRemote::default();
  *remote.docs.lock().unwrap() = docs;
  let r = reconciler(remote, MemoryLocal::default());
  let loaded = r.load().await;

  assert_eq!(loaded.source, LoadSource::Chunked);
  assert_eq!(loaded.envelope.suppliers.len(), 2500);
  assert!(
    loaded
      .envelope
      .suppliers
      .iter()
      .enumerate()
      .all(|(i, s)| s.id == SupplierId(i as i64))
  );
  assert!(loaded.envelope.last_saved.is_some());
  assert_eq!(r.status(), SyncStatus::Synced);
}

#[tokio::test]
async fn count_mismatch_falls_through_to_legacy() {
  let remote = MemoryRemote::with([
    ("metadata", json!({ "totalChunks": 1, "totalSuppliers": 5 })),
    ("chunk_0", json!({ "chunkIndex": 0, "suppliers": [supplier(0)] })),
    ("main", json!({ "suppliers": [supplier(7), supplier(8)] })),
  ]);
  let loaded = reconciler(remote, MemoryLocal::default()).load().await;
  assert_eq!(loaded.source, LoadSource::Legacy);
  assert_eq!(loaded.envelope.suppliers.len(), 2);
  assert_eq!(loaded.envelope.suppliers[0].id, SupplierId(7));
}

#[tokio::test]
async fn legacy_document_from_the_browser_loads() {
  let remote = MemoryRemote::with([(
    "main",
    json!({
      "suppliers": [
        { "id": 1718000000000.37_f64, "supplierName": "Acme" },
        { "id": 1718000000000.92_f64, "supplierName": "Birch" },
      ],
      "lastBackup": "Mon Jun 10 2024",
    }),
  )]);
  let loaded = reconciler(remote, MemoryLocal::default()).load().await;
  assert_eq!(loaded.source, LoadSource::Legacy);
  assert_eq!(loaded.envelope.last_backup, chrono::NaiveDate::from_ymd_opt(2024, 6, 10));

  let snap = Controller::new(loaded.envelope).snapshot();
  let ids: Vec<_> = snap.suppliers.iter().map(|s| s.id).collect();
  assert_eq!(ids, [SupplierId(1_718_000_000_000), SupplierId(1_718_000_000_001)]);
  assert_eq!(snap.suppliers[1].supplier_name, "Birch");
}

#[tokio::test]
async fn legacy_bare_array_is_accepted() {
  let remote = MemoryRemote::with([("main", json!([supplier(1)]))]);
  let loaded = reconciler(remote, MemoryLocal::default()).load().await;
  assert_eq!(loaded.source, LoadSource::Legacy);
  assert_eq!(loaded.envelope.suppliers[0].supplier_name, "s1");
}

#[tokio::test]
async fn missing_chunk_falls_through_to_local() {
  let remote = MemoryRemote::with([
    ("metadata", json!({ "totalChunks": 2, "totalSuppliers": 2 })),
    ("chunk_0", json!({ "chunkIndex": 0, "suppliers": [supplier(0)] })),
  ]);
  let local = MemoryLocal::with_envelope(&Envelope {
    suppliers: suppliers(4),
    ..Envelope::default()
  });
  let r = reconciler(remote, local);
  let loaded = r.load().await;
  assert_eq!(loaded.source, LoadSource::Local);
  assert_eq!(loaded.envelope.suppliers.len(), 4);
  assert_eq!(r.status(), SyncStatus::Syncing);
}

#[tokio::test]
async fn unreachable_remote_loads_local_and_is_offline() {
  let remote = MemoryRemote::default();
  remote.set_down(true);
  let local = MemoryLocal::with_envelope(&Envelope {
    suppliers: suppliers(1),
    ..Envelope::default()
  });
  let r = reconciler(remote, local);
  let loaded = r.load().await;
  assert_eq!(loaded.source, LoadSource::Local);
  assert_eq!(r.status(), SyncStatus::Offline);
}

#[tokio::test]
async fn nothing_anywhere_loads_empty() {
  let local = MemoryLocal::default();
  local.items.lock().unwrap().insert("suppliers-data".into(), "not json".into());
  let loaded = reconciler(MemoryRemote::default(), local).load().await;
  assert_eq!(loaded.source, LoadSource::Empty);
  assert!(loaded.envelope.suppliers.is_empty());
}

// ─── Debounce ────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn snapshots_save_locally_at_once_and_remotely_after_quiet_period() {
  let r = Arc::new(reconciler(MemoryRemote::default(), MemoryLocal::default()));
  let mut controller = Controller::new(r.load().await.envelope);
  r.attach(&mut controller);
  let task = r.spawn();

  let sam = Actor::new("sam").unwrap();
  for (i, name) in ["a", "b", "c"].into_iter().enumerate() {
    if i > 0 {
      tokio::time::sleep(Duration::from_secs(1)).await;
    }
    let draft = SupplierDraft { supplier_name: name.into(), ..SupplierDraft::default() };
    controller.apply(Command::Add(draft), &sam, Utc::now()).unwrap();
  }

  assert_eq!(r.local().writes.load(Ordering::SeqCst), 3);
  let local = r.local().get_item("suppliers-data").unwrap().unwrap();
  assert_eq!(Envelope::from_json(&local).unwrap().suppliers.len(), 3);

  tokio::time::sleep(Duration::from_millis(2900)).await;
  assert!(r.remote().writes().is_empty());
  assert_eq!(r.status(), SyncStatus::Syncing);

  tokio::time::sleep(Duration::from_millis(200)).await;
  assert_eq!(r.remote().writes(), ["chunk_0", "metadata"]);
  assert_eq!(r.remote().doc("metadata").unwrap()["totalSuppliers"], 3);
  assert_eq!(r.status(), SyncStatus::Synced);

  task.abort();
}
