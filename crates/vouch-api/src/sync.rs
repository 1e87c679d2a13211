//! Handlers for `/sync` endpoints.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;
use vouch_core::store::{DocumentStore, LocalStore};
use vouch_sync::SyncStatus;

use crate::{Tracker, actor::CurrentActor};

#[derive(Debug, Serialize)]
pub struct StatusBody {
  pub status: SyncStatus,
}

/// `GET /sync`
pub async fn status<R, L>(
  State(tracker): State<Arc<Tracker<R, L>>>,
  _actor: CurrentActor,
) -> Json<StatusBody>
where
  R: DocumentStore + 'static,
  L: LocalStore + 'static,
{
  Json(StatusBody { status: tracker.sync().status() })
}

/// `POST /sync/retry`: re-runs the full remote save. The outcome is reported
/// through the returned status, never as an error.
pub async fn retry<R, L>(
  State(tracker): State<Arc<Tracker<R, L>>>,
  _actor: CurrentActor,
) -> Json<StatusBody>
where
  R: DocumentStore + 'static,
  L: LocalStore + 'static,
{
  let sync = Arc::clone(tracker.sync());
  // Failures are logged by the reconciler and surface as `offline`.
  let _ = sync.retry().await;
  Json(StatusBody { status: sync.status() })
}
