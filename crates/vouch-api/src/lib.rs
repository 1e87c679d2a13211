//! JSON REST API for Vouch.
//!
//! Exposes an axum [`Router`] over a shared [`Tracker`]. Authentication is the
//! caller's responsibility: the router expects an
//! [`Actor`](vouch_core::controller::Actor) request extension and answers 401
//! without one.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", vouch_api::api_router(tracker.clone()))
//! ```

pub mod actor;
pub mod error;
pub mod report;
pub mod suppliers;
pub mod sync;
pub mod transfer;

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard},
};

use axum::{
  Router,
  routing::{get, post},
};
use chrono::{DateTime, NaiveDate, Utc};
use vouch_core::{
  controller::{Actor, Command, Controller, Outcome, Snapshot},
  pipeline::ViewState,
  store::{DocumentStore, LocalStore},
};
use vouch_sync::Reconciler;

pub use error::ApiError;

// ─── Shared state ────────────────────────────────────────────────────────────

/// The controller, its reconciler and per-user list views, shared by all
/// handlers.
pub struct Tracker<R, L> {
  controller: Mutex<Controller>,
  sync:       Arc<Reconciler<R, L>>,
  views:      Mutex<HashMap<String, ViewState>>,
  page_size:  usize,
}

impl<R, L> Tracker<R, L>
where
  R: DocumentStore + 'static,
  L: LocalStore + 'static,
{
  /// Wrap `controller`, attaching `sync` so every snapshot is persisted.
  pub fn new(mut controller: Controller, sync: Arc<Reconciler<R, L>>, page_size: usize) -> Self {
    sync.attach(&mut controller);
    Self {
      controller: Mutex::new(controller),
      sync,
      views: Mutex::new(HashMap::new()),
      page_size: page_size.max(1),
    }
  }

  fn controller(&self) -> Result<MutexGuard<'_, Controller>, ApiError> {
    self
      .controller
      .lock()
      .map_err(|_| ApiError::Internal("controller lock poisoned".to_owned()))
  }

  pub fn snapshot(&self) -> Result<Snapshot, ApiError> { Ok(self.controller()?.snapshot()) }

  pub fn apply(
    &self,
    command: Command,
    actor: &Actor,
    now: DateTime<Utc>,
  ) -> Result<Outcome, ApiError> {
    Ok(self.controller()?.apply(command, actor, now)?)
  }

  /// Record that the daily backup ran on `day`.
  pub fn mark_backup(&self, day: NaiveDate) -> Result<Snapshot, ApiError> {
    Ok(self.controller()?.mark_backup(day))
  }

  pub fn sync(&self) -> &Arc<Reconciler<R, L>> { &self.sync }

  /// Run `f` against `actor`'s remembered list view.
  pub fn with_view<T>(&self, actor: &Actor, f: impl FnOnce(&mut ViewState) -> T) -> Result<T, ApiError> {
    let mut views = self
      .views
      .lock()
      .map_err(|_| ApiError::Internal("view lock poisoned".to_owned()))?;
    let view = views
      .entry(actor.name().to_owned())
      .or_insert_with(|| ViewState::new(self.page_size));
    Ok(f(view))
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `tracker`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<R, L>(tracker: Arc<Tracker<R, L>>) -> Router<()>
where
  R: DocumentStore + 'static,
  L: LocalStore + 'static,
{
  Router::new()
    // Suppliers
    .route("/suppliers", get(suppliers::list::<R, L>).post(suppliers::create::<R, L>))
    .route(
      "/suppliers/{id}",
      get(suppliers::get_one::<R, L>)
        .put(suppliers::update::<R, L>)
        .delete(suppliers::remove::<R, L>),
    )
    .route("/suppliers/{id}/notes", post(suppliers::add_note::<R, L>))
    .route("/suppliers/{id}/priority", post(suppliers::toggle_priority::<R, L>))
    // CSV
    .route("/export.csv", get(transfer::export::<R, L>))
    .route("/import", post(transfer::import::<R, L>))
    // Sync
    .route("/sync", get(sync::status::<R, L>))
    .route("/sync/retry", post(sync::retry::<R, L>))
    // Report
    .route("/report", get(report::handler::<R, L>))
    .with_state(tracker)
}
