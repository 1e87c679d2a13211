//! `GET /report`: compliance summary as JSON.

use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::Utc;
use vouch_core::{
  report::ComplianceReport,
  store::{DocumentStore, LocalStore},
};

use crate::{Tracker, actor::CurrentActor, error::ApiError};

/// `GET /report`
pub async fn handler<R, L>(
  State(tracker): State<Arc<Tracker<R, L>>>,
  _actor: CurrentActor,
) -> Result<Json<ComplianceReport>, ApiError>
where
  R: DocumentStore + 'static,
  L: LocalStore + 'static,
{
  let snapshot = tracker.snapshot()?;
  Ok(Json(ComplianceReport::build(&snapshot.suppliers, Utc::now())))
}
