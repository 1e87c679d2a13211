//! The state controller: the single owner of the supplier collection.
//!
//! All mutation goes through [`Controller::apply`] with a typed [`Command`].
//! Each successful command produces a new immutable [`Snapshot`], which is
//! handed to every subscribed [`SnapshotObserver`]. Snapshots share the
//! collection through an `Arc`, so observers can hold on to them cheaply.

use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
  Error, Result,
  compliance::{evaluate_completed, on_save},
  supplier::{Envelope, Note, Supplier, SupplierDraft, SupplierId},
};

// ─── Actor ───────────────────────────────────────────────────────────────────

/// The signed-in user on whose behalf a command runs. Never blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Actor(String);

impl Actor {
  /// Returns `None` when `name` is blank after trimming.
  pub fn new(name: &str) -> Option<Self> {
    let name = name.trim();
    (!name.is_empty()).then(|| Self(name.to_owned()))
  }

  pub fn name(&self) -> &str { &self.0 }
}

// ─── Commands ────────────────────────────────────────────────────────────────

/// How imported records combine with the existing collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
  /// Full backup restore: the file becomes the collection, keeping its
  /// modification stamps.
  Replace,
  /// Supplier-list import: records are appended and stamped as new edits.
  Append,
}

#[derive(Debug, Clone)]
pub enum Command {
  Add(SupplierDraft),
  Edit { id: SupplierId, draft: SupplierDraft },
  Delete(SupplierId),
  AddNote { id: SupplierId, text: String },
  TogglePriority(SupplierId),
  Import { mode: ImportMode, suppliers: Vec<Supplier> },
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// An immutable view of the collection after some command.
#[derive(Debug, Clone)]
pub struct Snapshot {
  /// Increases by one with every emitted snapshot.
  pub version:     u64,
  pub suppliers:   Arc<Vec<Supplier>>,
  pub last_backup: Option<NaiveDate>,
}

impl Snapshot {
  pub fn get(&self, id: SupplierId) -> Option<&Supplier> {
    self.suppliers.iter().find(|s| s.id == id)
  }

  /// The persisted form of this snapshot.
  pub fn to_envelope(&self, saved_at: DateTime<Utc>) -> Envelope {
    Envelope {
      suppliers:   self.suppliers.as_ref().clone(),
      last_backup: self.last_backup,
      last_saved:  Some(saved_at),
    }
  }
}

/// Result of a successful command.
#[derive(Debug, Clone)]
pub struct Outcome {
  pub snapshot: Snapshot,
  /// The supplier created or changed by the command, if it still exists.
  pub supplier: Option<SupplierId>,
}

/// Receives every snapshot the controller emits.
pub trait SnapshotObserver: Send + Sync {
  fn on_snapshot(&self, snapshot: &Snapshot);
}

// ─── Controller ──────────────────────────────────────────────────────────────

pub struct Controller {
  suppliers:   Arc<Vec<Supplier>>,
  last_backup: Option<NaiveDate>,
  version:     u64,
  observers:   Vec<Arc<dyn SnapshotObserver>>,
}

impl Controller {
  /// Take ownership of a loaded collection.
  ///
  /// `completed` is re-derived for every record and duplicate ids are bumped,
  /// so the collection invariants hold regardless of what was stored.
  pub fn new(envelope: Envelope) -> Self {
    let mut seen = HashSet::new();
    let suppliers = envelope
      .suppliers
      .into_iter()
      .map(|mut s| {
        s.completed = evaluate_completed(&s);
        s.id = unique_id(s.id, &seen);
        seen.insert(s.id);
        s
      })
      .collect();

    Self {
      suppliers: Arc::new(suppliers),
      last_backup: envelope.last_backup,
      version: 0,
      observers: Vec::new(),
    }
  }

  pub fn subscribe(&mut self, observer: Arc<dyn SnapshotObserver>) {
    self.observers.push(observer);
  }

  /// The current state, without emitting anything.
  pub fn snapshot(&self) -> Snapshot {
    Snapshot {
      version:     self.version,
      suppliers:   Arc::clone(&self.suppliers),
      last_backup: self.last_backup,
    }
  }

  /// Execute `command` as `actor` at `now`.
  ///
  /// On error the collection is unchanged and no snapshot is emitted.
  pub fn apply(&mut self, command: Command, actor: &Actor, now: DateTime<Utc>) -> Result<Outcome> {
    let supplier = match command {
      Command::Add(draft) => Some(self.add(draft, actor, now)),
      Command::Edit { id, draft } => {
        self.edit(id, draft, actor, now)?;
        Some(id)
      }
      Command::Delete(id) => {
        self.delete(id)?;
        None
      }
      Command::AddNote { id, text } => {
        self.add_note(id, text, actor, now)?;
        Some(id)
      }
      Command::TogglePriority(id) => {
        self.toggle_priority(id, actor, now)?;
        Some(id)
      }
      Command::Import { mode, suppliers } => {
        self.import(mode, suppliers, actor, now);
        None
      }
    };

    Ok(Outcome { snapshot: self.emit(), supplier })
  }

  /// Record that the daily backup ran on `day`.
  pub fn mark_backup(&mut self, day: NaiveDate) -> Snapshot {
    self.last_backup = Some(day);
    self.emit()
  }

  // ── Commands ────────────────────────────────────────────────────────────────

  fn add(&mut self, draft: SupplierDraft, actor: &Actor, now: DateTime<Utc>) -> SupplierId {
    let id = unique_id(SupplierId::from_timestamp(now), &self.ids());
    let record = Supplier::from_draft(id, draft, actor.name(), now);
    Arc::make_mut(&mut self.suppliers).push(on_save(record, None, now));
    id
  }

  fn edit(
    &mut self,
    id: SupplierId,
    draft: SupplierDraft,
    actor: &Actor,
    now: DateTime<Utc>,
  ) -> Result<()> {
    let index = self.position(id)?;
    let suppliers = Arc::make_mut(&mut self.suppliers);

    let mut edited = suppliers[index].clone();
    draft.apply_to(&mut edited);
    stamp(&mut edited, actor, now);

    let saved = on_save(edited, Some(&suppliers[index]), now);
    suppliers[index] = saved;
    Ok(())
  }

  fn delete(&mut self, id: SupplierId) -> Result<()> {
    let index = self.position(id)?;
    Arc::make_mut(&mut self.suppliers).remove(index);
    Ok(())
  }

  fn add_note(
    &mut self,
    id: SupplierId,
    text: String,
    actor: &Actor,
    now: DateTime<Utc>,
  ) -> Result<()> {
    let text = text.trim();
    if text.is_empty() {
      return Err(Error::EmptyNote);
    }
    let index = self.position(id)?;
    let record = &mut Arc::make_mut(&mut self.suppliers)[index];
    record.notes.push(Note::new(text, actor.name(), now));
    stamp(record, actor, now);
    Ok(())
  }

  fn toggle_priority(&mut self, id: SupplierId, actor: &Actor, now: DateTime<Utc>) -> Result<()> {
    let index = self.position(id)?;
    let record = &mut Arc::make_mut(&mut self.suppliers)[index];
    record.priority = !record.priority;
    stamp(record, actor, now);
    Ok(())
  }

  fn import(
    &mut self,
    mode: ImportMode,
    incoming: Vec<Supplier>,
    actor: &Actor,
    now: DateTime<Utc>,
  ) {
    let mut seen = match mode {
      ImportMode::Replace => HashSet::new(),
      ImportMode::Append => self.ids(),
    };

    let imported: Vec<Supplier> = incoming
      .into_iter()
      .map(|mut record| {
        record.id = unique_id(record.id, &seen);
        seen.insert(record.id);
        if mode == ImportMode::Append {
          stamp(&mut record, actor, now);
        }
        on_save(record, None, now)
      })
      .collect();

    match mode {
      ImportMode::Replace => self.suppliers = Arc::new(imported),
      ImportMode::Append => Arc::make_mut(&mut self.suppliers).extend(imported),
    }
  }

  // ── Helpers ─────────────────────────────────────────────────────────────────

  fn position(&self, id: SupplierId) -> Result<usize> {
    self
      .suppliers
      .iter()
      .position(|s| s.id == id)
      .ok_or(Error::SupplierNotFound(id))
  }

  fn ids(&self) -> HashSet<SupplierId> { self.suppliers.iter().map(|s| s.id).collect() }

  fn emit(&mut self) -> Snapshot {
    self.version += 1;
    let snapshot = self.snapshot();
    for observer in &self.observers {
      observer.on_snapshot(&snapshot);
    }
    snapshot
  }
}

fn stamp(record: &mut Supplier, actor: &Actor, now: DateTime<Utc>) {
  record.last_modified_time = now;
  record.last_modified_user = actor.name().to_owned();
}

/// Step `candidate` forward until it is not in `taken`.
fn unique_id(mut candidate: SupplierId, taken: &HashSet<SupplierId>) -> SupplierId {
  while taken.contains(&candidate) {
    candidate = candidate.next();
  }
  candidate
}
