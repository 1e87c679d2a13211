//! [`Reconciler`]: keeps the remote and local stores in step with the
//! controller's snapshots.

use std::{
  sync::{Arc, Mutex, MutexGuard, PoisonError},
  time::Duration,
};

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};
use vouch_core::{
  controller::{Controller, Snapshot, SnapshotObserver},
  store::{DocumentStore, LocalStore, keys},
  supplier::Envelope,
};

use crate::{
  Error, Result,
  documents::{Chunk, ChunkRef, LegacyDocument, Metadata, fingerprint},
};

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SyncConfig {
  /// Remote collection holding the chunk and metadata documents.
  pub collection: String,
  /// Local-store key holding the JSON envelope.
  pub local_key:  String,
  /// Records per remote chunk document.
  pub chunk_size: usize,
  /// Quiet period after the last change before a remote save starts.
  pub debounce:   Duration,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      collection: "suppliers".to_owned(),
      local_key:  "suppliers-data".to_owned(),
      chunk_size: 1000,
      debounce:   Duration::from_millis(3000),
    }
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
  /// The remote holds exactly the current collection.
  Synced,
  /// Local changes are waiting for, or in, a remote save.
  Syncing,
  /// The last remote operation failed; working from the local copy.
  Offline,
}

/// Where [`Reconciler::load`] found the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
  Chunked,
  Legacy,
  Local,
  Empty,
}

#[derive(Debug, Clone)]
pub struct Loaded {
  pub envelope: Envelope,
  pub source:   LoadSource,
}

#[derive(Debug, Default)]
struct Fingerprints {
  local:  Option<String>,
  remote: Option<String>,
}

impl Fingerprints {
  fn in_sync(&self) -> bool { self.local.is_some() && self.local == self.remote }
}

// ─── Reconciler ──────────────────────────────────────────────────────────────

pub struct Reconciler<R, L> {
  remote:       R,
  local:        L,
  config:       SyncConfig,
  status:       watch::Sender<SyncStatus>,
  pending:      watch::Sender<Option<Snapshot>>,
  fingerprints: Mutex<Fingerprints>,
  /// Serialises remote saves so a retry never interleaves with a debounced
  /// save.
  save_lock:    tokio::sync::Mutex<()>,
}

impl<R: DocumentStore, L: LocalStore> Reconciler<R, L> {
  pub fn new(remote: R, local: L, config: SyncConfig) -> Self {
    Self {
      remote,
      local,
      config,
      status: watch::Sender::new(SyncStatus::Syncing),
      pending: watch::Sender::new(None),
      fingerprints: Mutex::new(Fingerprints::default()),
      save_lock: tokio::sync::Mutex::new(()),
    }
  }

  pub fn remote(&self) -> &R { &self.remote }

  pub fn local(&self) -> &L { &self.local }

  pub fn status(&self) -> SyncStatus { *self.status.borrow() }

  pub fn watch_status(&self) -> watch::Receiver<SyncStatus> { self.status.subscribe() }

  fn fingerprints(&self) -> MutexGuard<'_, Fingerprints> {
    self.fingerprints.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn dirty(&self) -> bool { !self.fingerprints().in_sync() }

  // ── Load ──────────────────────────────────────────────────────────────────

  /// Read the collection: chunked remote layout, then the legacy single
  /// document, then the local copy. Never fails; with nothing readable the
  /// collection is empty.
  pub async fn load(&self) -> Loaded {
    let (loaded, status) = match self.load_remote().await {
      Ok(Some(loaded)) => (loaded, SyncStatus::Synced),
      Ok(None) => (self.load_local(), SyncStatus::Syncing),
      Err(e) => {
        warn!(error = %e, "remote load failed; falling back to local copy");
        (self.load_local(), SyncStatus::Offline)
      }
    };

    if status == SyncStatus::Synced {
      match fingerprint(&loaded.envelope.suppliers, loaded.envelope.last_backup) {
        Ok(fp) => {
          self.fingerprints().remote = Some(fp);
        }
        Err(e) => warn!(error = %e, "failed to fingerprint loaded collection"),
      }
    }
    self.status.send_replace(status);

    info!(
      source = ?loaded.source,
      suppliers = loaded.envelope.suppliers.len(),
      "loaded supplier collection"
    );
    loaded
  }

  async fn load_remote(&self) -> Result<Option<Loaded>> {
    match self.load_chunked().await {
      Ok(Some(envelope)) => {
        return Ok(Some(Loaded { envelope, source: LoadSource::Chunked }));
      }
      Ok(None) => {}
      Err(e @ Error::Remote(_)) => return Err(e),
      Err(e) => warn!(error = %e, "chunked collection unreadable; trying legacy document"),
    }

    let Some(doc) = self.get(keys::LEGACY).await? else {
      return Ok(None);
    };
    match serde_json::from_value::<LegacyDocument>(doc) {
      Ok(doc) => Ok(Some(Loaded { envelope: doc.into(), source: LoadSource::Legacy })),
      Err(e) => {
        warn!(error = %e, "legacy document unreadable");
        Ok(None)
      }
    }
  }

  async fn load_chunked(&self) -> Result<Option<Envelope>> {
    let Some(doc) = self.get(keys::METADATA).await? else {
      return Ok(None);
    };
    let metadata: Metadata = serde_json::from_value(doc)?;

    let mut suppliers = Vec::with_capacity(metadata.total_suppliers);
    for index in 0..metadata.total_chunks {
      let doc = self
        .get(&keys::chunk(index))
        .await?
        .ok_or(Error::MissingChunk(index))?;
      let chunk: Chunk = serde_json::from_value(doc)?;
      suppliers.extend(chunk.suppliers);
    }

    if suppliers.len() != metadata.total_suppliers {
      return Err(Error::CountMismatch {
        expected: metadata.total_suppliers,
        found:    suppliers.len(),
      });
    }

    Ok(Some(Envelope {
      suppliers,
      last_backup: metadata.last_backup,
      last_saved: metadata.last_saved,
    }))
  }

  fn load_local(&self) -> Loaded {
    let envelope = match self.local.get_item(&self.config.local_key) {
      Ok(Some(json)) => match Envelope::from_json(&json) {
        Ok(envelope) => Some(envelope),
        Err(e) => {
          warn!(error = %e, "local copy unreadable");
          None
        }
      },
      Ok(None) => None,
      Err(e) => {
        warn!(error = %e, "local store read failed");
        None
      }
    };

    match envelope {
      Some(envelope) => Loaded { envelope, source: LoadSource::Local },
      None => Loaded { envelope: Envelope::default(), source: LoadSource::Empty },
    }
  }

  async fn get(&self, key: &str) -> Result<Option<Value>> {
    self
      .remote
      .get(&self.config.collection, key)
      .await
      .map_err(Error::remote)
  }

  // ── Tracking ──────────────────────────────────────────────────────────────

  /// Record `snapshot` as the latest local state without saving it locally.
  pub fn track(&self, snapshot: &Snapshot) {
    let in_sync = {
      let mut fps = self.fingerprints();
      fps.local = fingerprint(&snapshot.suppliers, snapshot.last_backup)
        .inspect_err(|e| warn!(error = %e, "failed to fingerprint snapshot"))
        .ok();
      fps.in_sync()
    };

    self.status.send_if_modified(|status| {
      let next = match *status {
        _ if in_sync => SyncStatus::Synced,
        SyncStatus::Offline => SyncStatus::Offline,
        _ => SyncStatus::Syncing,
      };
      let changed = *status != next;
      *status = next;
      changed
    });
    self.pending.send_replace(Some(snapshot.clone()));
  }

  fn save_local(&self, snapshot: &Snapshot) -> Result<()> {
    let json = snapshot.to_envelope(Utc::now()).to_json()?;
    self
      .local
      .set_item(&self.config.local_key, &json)
      .map_err(Error::local)
  }

  // ── Remote save ───────────────────────────────────────────────────────────

  /// Write `snapshot` to the remote store as chunks followed by metadata.
  ///
  /// A failure sets the status to [`SyncStatus::Offline`]; it is returned for
  /// callers that want it but is otherwise only logged.
  pub async fn save_remote(&self, snapshot: &Snapshot) -> Result<()> {
    let _guard = self.save_lock.lock().await;
    self.status.send_replace(SyncStatus::Syncing);

    let result = match self.write_chunks(snapshot).await {
      Ok(()) => fingerprint(&snapshot.suppliers, snapshot.last_backup),
      Err(e) => Err(e),
    };

    match result {
      Ok(fp) => {
        let in_sync = {
          let mut fps = self.fingerprints();
          fps.remote = Some(fp);
          fps.in_sync()
        };
        self.status.send_replace(if in_sync {
          SyncStatus::Synced
        } else {
          SyncStatus::Syncing
        });
        info!(
          version = snapshot.version,
          suppliers = snapshot.suppliers.len(),
          "saved collection to remote store"
        );
        Ok(())
      }
      Err(e) => {
        warn!(error = %e, "remote save failed; working offline");
        self.status.send_replace(SyncStatus::Offline);
        Err(e)
      }
    }
  }

  async fn write_chunks(&self, snapshot: &Snapshot) -> Result<()> {
    let collection = &self.config.collection;
    let chunks: Vec<_> = snapshot.suppliers.chunks(self.config.chunk_size.max(1)).collect();

    for (chunk_index, suppliers) in chunks.iter().copied().enumerate() {
      let doc = serde_json::to_value(ChunkRef { chunk_index, suppliers })?;
      self
        .remote
        .set(collection, &keys::chunk(chunk_index), doc)
        .await
        .map_err(Error::remote)?;
    }

    let metadata = Metadata {
      total_chunks:    chunks.len(),
      total_suppliers: snapshot.suppliers.len(),
      last_saved:      Some(Utc::now()),
      last_backup:     snapshot.last_backup,
    };
    self
      .remote
      .set(collection, keys::METADATA, serde_json::to_value(&metadata)?)
      .await
      .map_err(Error::remote)
  }

  /// Re-run the full chunked save of the latest snapshot.
  pub async fn retry(&self) -> Result<()> {
    let snapshot = self.pending.borrow().clone();
    match snapshot {
      Some(snapshot) => self.save_remote(&snapshot).await,
      None => Err(Error::NothingToSave),
    }
  }

  // ── Debounce loop ─────────────────────────────────────────────────────────

  /// Save the latest snapshot remotely once no new snapshot has arrived for
  /// the configured quiet period.
  ///
  /// The task holds the reconciler alive, so it only stops when aborted.
  pub async fn run(self: Arc<Self>) {
    let mut pending = self.pending.subscribe();
    loop {
      if !self.dirty() || self.status() == SyncStatus::Offline {
        if pending.changed().await.is_err() {
          return;
        }
      }

      loop {
        match tokio::time::timeout(self.config.debounce, pending.changed()).await {
          Ok(Ok(())) => continue,
          Ok(Err(_)) => return,
          Err(_) => break,
        }
      }

      let snapshot = pending.borrow_and_update().clone();
      match snapshot {
        Some(snapshot) if self.dirty() => {
          // Failures already set the status and are logged.
          let _ = self.save_remote(&snapshot).await;
        }
        _ => debug!("remote already matches latest snapshot"),
      }
    }
  }
}

impl<R, L> Reconciler<R, L>
where
  R: DocumentStore + 'static,
  L: LocalStore + 'static,
{
  /// Track the controller's current state and subscribe to its snapshots.
  pub fn attach(self: &Arc<Self>, controller: &mut Controller) {
    self.track(&controller.snapshot());
    controller.subscribe(Arc::clone(self) as Arc<dyn SnapshotObserver>);
  }

  pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> { tokio::spawn(Arc::clone(self).run()) }
}

impl<R: DocumentStore, L: LocalStore> SnapshotObserver for Reconciler<R, L> {
  fn on_snapshot(&self, snapshot: &Snapshot) {
    if let Err(e) = self.save_local(snapshot) {
      warn!(error = %e, "failed to save local copy");
    }
    self.track(snapshot);
  }
}
