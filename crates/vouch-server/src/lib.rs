//! HTTP server for Vouch.
//!
//! Puts Basic authentication in front of the [`vouch_api`] router and adds
//! the routes that need server-side configuration: report delivery and the
//! liveness probe. The daily backup job lives in [`backup`].

pub mod auth;
pub mod backup;
pub mod error;
pub mod mailer;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  extract::State,
  middleware,
  routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use vouch_api::{Tracker, actor::CurrentActor};
use vouch_core::{
  pipeline::DEFAULT_PAGE_SIZE,
  report::ComplianceReport,
  schedule::BackupSchedule,
  store::{DocumentStore, LocalStore},
};
use vouch_sync::SyncConfig;

use auth::AuthConfig;
use mailer::{MailConfig, ReportMailer};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Remote-save tunables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SyncSettings {
  pub collection:  String,
  pub local_key:   String,
  pub chunk_size:  usize,
  pub debounce_ms: u64,
}

impl Default for SyncSettings {
  fn default() -> Self {
    let defaults = SyncConfig::default();
    Self {
      collection:  defaults.collection,
      local_key:   defaults.local_key,
      chunk_size:  defaults.chunk_size,
      debounce_ms: defaults.debounce.as_millis() as u64,
    }
  }
}

impl From<&SyncSettings> for SyncConfig {
  fn from(s: &SyncSettings) -> Self {
    SyncConfig {
      collection: s.collection.clone(),
      local_key:  s.local_key.clone(),
      chunk_size: s.chunk_size.max(1),
      debounce:   std::time::Duration::from_millis(s.debounce_ms),
    }
  }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BackupSettings {
  pub dir:    PathBuf,
  pub hour:   u32,
  pub minute: u32,
}

impl Default for BackupSettings {
  fn default() -> Self {
    let schedule = BackupSchedule::default();
    Self { dir: PathBuf::from("backups"), hour: schedule.hour, minute: schedule.minute }
  }
}

impl BackupSettings {
  pub fn schedule(&self) -> BackupSchedule {
    BackupSchedule { hour: self.hour, minute: self.minute }
  }
}

/// Runtime server configuration, deserialised from `config.toml` and
/// `VOUCH_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  /// SQLite file backing the remote document collection.
  pub store_path:         PathBuf,
  /// SQLite file backing the single-device fallback copy.
  pub local_path:         PathBuf,
  pub auth_password_hash: String,
  pub page_size:          usize,
  pub sync:               SyncSettings,
  pub backup:             BackupSettings,
  pub mail:               Option<MailConfig>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:               "127.0.0.1".to_owned(),
      port:               8080,
      store_path:         PathBuf::from("vouch.db"),
      local_path:         PathBuf::from("vouch-local.db"),
      auth_password_hash: String::new(),
      page_size:          DEFAULT_PAGE_SIZE,
      sync:               SyncSettings::default(),
      backup:             BackupSettings::default(),
      mail:               None,
    }
  }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through the server's own handlers.
pub struct AppState<R, L> {
  pub tracker: Arc<Tracker<R, L>>,
  pub auth:    Arc<AuthConfig>,
  pub mailer:  Option<ReportMailer>,
}

impl<R, L> Clone for AppState<R, L> {
  fn clone(&self) -> Self {
    Self {
      tracker: Arc::clone(&self.tracker),
      auth:    Arc::clone(&self.auth),
      mailer:  self.mailer.clone(),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<R, L>(state: AppState<R, L>) -> Router
where
  R: DocumentStore + 'static,
  L: LocalStore + 'static,
{
  let api = vouch_api::api_router(Arc::clone(&state.tracker))
    .merge(
      Router::new()
        .route("/report/send", post(send_report::<R, L>))
        .with_state(state.clone()),
    )
    .layer(middleware::from_fn_with_state(Arc::clone(&state.auth), auth::require_auth));

  Router::new()
    .route("/health", get(health))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str { "ok" }

#[derive(Debug, Serialize)]
pub struct SentBody {
  pub recipient: String,
}

/// `POST /api/report/send`
async fn send_report<R, L>(
  State(state): State<AppState<R, L>>,
  CurrentActor(actor): CurrentActor,
) -> Result<Json<SentBody>, Error>
where
  R: DocumentStore + 'static,
  L: LocalStore + 'static,
{
  let mailer = state.mailer.as_ref().ok_or(Error::MailNotConfigured)?;
  let snapshot = state.tracker.snapshot()?;
  let report = ComplianceReport::build(&snapshot.suppliers, Utc::now());
  mailer
    .send(&report)
    .await
    .inspect_err(|e| warn!(error = %e, recipient = mailer.recipient(), "report email failed"))?;
  info!(user = actor.name(), recipient = mailer.recipient(), "report sent on request");
  Ok(Json(SentBody { recipient: mailer.recipient().to_owned() }))
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests;
