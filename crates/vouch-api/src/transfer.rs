//! CSV export and import.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/export.csv` | Full backup download |
//! | `POST` | `/import?mode=backup\|list` | CSV body; a malformed file imports nothing |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::header,
  response::IntoResponse,
};
use bytes::Bytes;
use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use vouch_core::{
  controller::{Command, ImportMode},
  schedule::BackupSchedule,
  store::{DocumentStore, LocalStore},
};

use crate::{Tracker, actor::CurrentActor, error::ApiError};

// ─── Export ──────────────────────────────────────────────────────────────────

/// `GET /export.csv`
pub async fn export<R, L>(
  State(tracker): State<Arc<Tracker<R, L>>>,
  _actor: CurrentActor,
) -> Result<impl IntoResponse, ApiError>
where
  R: DocumentStore + 'static,
  L: LocalStore + 'static,
{
  let snapshot = tracker.snapshot()?;
  let csv = vouch_csv::encode(&snapshot.suppliers)?;
  let disposition = format!(
    "attachment; filename=\"{}\"",
    BackupSchedule::file_name(Local::now().date_naive())
  );
  Ok((
    [
      (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
      (header::CONTENT_DISPOSITION, disposition),
    ],
    csv,
  ))
}

// ─── Import ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
  /// A full backup; replaces the collection.
  #[default]
  Backup,
  /// A list of suppliers to append.
  List,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImportParams {
  #[serde(default)]
  pub mode: ImportKind,
}

#[derive(Debug, Serialize)]
pub struct ImportSummary {
  pub imported: usize,
  pub total:    usize,
}

/// `POST /import?mode=backup|list`: body: CSV text
pub async fn import<R, L>(
  State(tracker): State<Arc<Tracker<R, L>>>,
  CurrentActor(actor): CurrentActor,
  Query(params): Query<ImportParams>,
  body: Bytes,
) -> Result<Json<ImportSummary>, ApiError>
where
  R: DocumentStore + 'static,
  L: LocalStore + 'static,
{
  let text = std::str::from_utf8(&body)
    .map_err(|_| ApiError::BadRequest("body is not valid UTF-8".to_owned()))?;

  let now = Utc::now();
  let (mode, suppliers) = match params.mode {
    ImportKind::Backup => (ImportMode::Replace, vouch_csv::decode(text, now)?),
    ImportKind::List => (ImportMode::Append, vouch_csv::decode_supplier_list(text, now)?),
  };
  let imported = suppliers.len();

  let outcome = tracker.apply(Command::Import { mode, suppliers }, &actor, now)?;
  info!(?mode, imported, user = actor.name(), "imported suppliers");

  Ok(Json(ImportSummary { imported, total: outcome.snapshot.suppliers.len() }))
}
