//! Handlers for `/suppliers` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/suppliers` | Search, filter, sort and page; see [`ListParams`] |
//! | `POST`   | `/suppliers` | Body: `SupplierDraft` |
//! | `GET`    | `/suppliers/:id` | 404 if not found |
//! | `PUT`    | `/suppliers/:id` | Body: `SupplierDraft` |
//! | `DELETE` | `/suppliers/:id` | 204 |
//! | `POST`   | `/suppliers/:id/notes` | Body: `{"text":"..."}` |
//! | `POST`   | `/suppliers/:id/priority` | Toggles the flag |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use vouch_core::{
  compliance::{RecheckStatus, evaluate_recheck_status},
  controller::{Command, Outcome},
  pipeline::{self, CompletionFilter, Direction, Filters, Row, SortKey, SortSpec},
  store::{DocumentStore, LocalStore},
  supplier::{SupplierDraft, SupplierId, SupplierType, YesNo},
};

use crate::{Tracker, actor::CurrentActor, error::ApiError};

/// Largest page a client may request.
const MAX_PAGE_SIZE: usize = 500;

// ─── List ────────────────────────────────────────────────────────────────────

/// Criteria for `GET /suppliers`.
///
/// Search, filters and sort are taken as given on every request. `page` is
/// remembered per user when omitted, and returns to 1 whenever the search or
/// filters change.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub search:    Option<String>,
  pub status:    Option<CompletionFilter>,
  #[serde(rename = "type")]
  pub kind:      Option<SupplierType>,
  pub new:       Option<YesNo>,
  pub priority:  Option<bool>,
  pub recheck:   Option<RecheckStatus>,
  pub sort:      Option<SortKey>,
  pub dir:       Option<Direction>,
  pub page:      Option<usize>,
  pub page_size: Option<usize>,
}

impl ListParams {
  fn filters(&self) -> Filters {
    Filters {
      status:        self.status,
      supplier_type: self.kind,
      new_supplier:  self.new,
      priority:      self.priority,
      recheck:       self.recheck,
    }
  }

  fn sort(&self) -> Option<SortSpec> {
    self.sort.map(|key| SortSpec { key, direction: self.dir.unwrap_or_default() })
  }
}

/// `GET /suppliers`
pub async fn list<R, L>(
  State(tracker): State<Arc<Tracker<R, L>>>,
  CurrentActor(actor): CurrentActor,
  Query(params): Query<ListParams>,
) -> Result<Response, ApiError>
where
  R: DocumentStore + 'static,
  L: LocalStore + 'static,
{
  let mut query = tracker.with_view(&actor, |view| {
    view.set_search(params.search.clone().unwrap_or_default());
    view.set_filters(params.filters());
    view.set_sort(params.sort());
    if let Some(page) = params.page {
      view.set_page(page);
    }
    view.query().clone()
  })?;
  if let Some(size) = params.page_size {
    query.page.size = size.clamp(1, MAX_PAGE_SIZE);
  }

  let snapshot = tracker.snapshot()?;
  let page = pipeline::run(&snapshot.suppliers, &query, Utc::now());
  tracker.with_view(&actor, |view| view.set_page(page.page))?;
  Ok(Json(page).into_response())
}

// ─── Create ──────────────────────────────────────────────────────────────────

fn validate(draft: &SupplierDraft) -> Result<(), ApiError> {
  if draft.supplier_name.trim().is_empty() {
    return Err(ApiError::BadRequest("supplier name is required".to_owned()));
  }
  Ok(())
}

/// The record a command touched, with its recheck status.
fn touched(outcome: &Outcome, status: StatusCode) -> Result<Response, ApiError> {
  let supplier = outcome
    .supplier
    .and_then(|id| outcome.snapshot.get(id))
    .ok_or_else(|| ApiError::Internal("command did not yield a supplier".to_owned()))?;
  let row = Row { supplier, recheck: evaluate_recheck_status(supplier, Utc::now()) };
  Ok((status, Json(row)).into_response())
}

/// `POST /suppliers`: body: `SupplierDraft`
pub async fn create<R, L>(
  State(tracker): State<Arc<Tracker<R, L>>>,
  CurrentActor(actor): CurrentActor,
  Json(draft): Json<SupplierDraft>,
) -> Result<Response, ApiError>
where
  R: DocumentStore + 'static,
  L: LocalStore + 'static,
{
  validate(&draft)?;
  let outcome = tracker.apply(Command::Add(draft), &actor, Utc::now())?;
  touched(&outcome, StatusCode::CREATED)
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /suppliers/:id`
pub async fn get_one<R, L>(
  State(tracker): State<Arc<Tracker<R, L>>>,
  _actor: CurrentActor,
  Path(id): Path<SupplierId>,
) -> Result<Response, ApiError>
where
  R: DocumentStore + 'static,
  L: LocalStore + 'static,
{
  let snapshot = tracker.snapshot()?;
  let supplier = snapshot
    .get(id)
    .ok_or_else(|| ApiError::NotFound(format!("supplier {id} not found")))?;
  let row = Row { supplier, recheck: evaluate_recheck_status(supplier, Utc::now()) };
  Ok(Json(row).into_response())
}

// ─── Update / delete ─────────────────────────────────────────────────────────

/// `PUT /suppliers/:id`: body: `SupplierDraft`
pub async fn update<R, L>(
  State(tracker): State<Arc<Tracker<R, L>>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<SupplierId>,
  Json(draft): Json<SupplierDraft>,
) -> Result<Response, ApiError>
where
  R: DocumentStore + 'static,
  L: LocalStore + 'static,
{
  validate(&draft)?;
  let outcome = tracker.apply(Command::Edit { id, draft }, &actor, Utc::now())?;
  touched(&outcome, StatusCode::OK)
}

/// `DELETE /suppliers/:id`
pub async fn remove<R, L>(
  State(tracker): State<Arc<Tracker<R, L>>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<SupplierId>,
) -> Result<StatusCode, ApiError>
where
  R: DocumentStore + 'static,
  L: LocalStore + 'static,
{
  tracker.apply(Command::Delete(id), &actor, Utc::now())?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Notes / priority ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NoteBody {
  pub text: String,
}

/// `POST /suppliers/:id/notes`: body: `{"text":"..."}`
pub async fn add_note<R, L>(
  State(tracker): State<Arc<Tracker<R, L>>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<SupplierId>,
  Json(body): Json<NoteBody>,
) -> Result<Response, ApiError>
where
  R: DocumentStore + 'static,
  L: LocalStore + 'static,
{
  let outcome = tracker.apply(Command::AddNote { id, text: body.text }, &actor, Utc::now())?;
  touched(&outcome, StatusCode::CREATED)
}

/// `POST /suppliers/:id/priority`
pub async fn toggle_priority<R, L>(
  State(tracker): State<Arc<Tracker<R, L>>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<SupplierId>,
) -> Result<Response, ApiError>
where
  R: DocumentStore + 'static,
  L: LocalStore + 'static,
{
  let outcome = tracker.apply(Command::TogglePriority(id), &actor, Utc::now())?;
  touched(&outcome, StatusCode::OK)
}
