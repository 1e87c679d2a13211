use std::sync::Arc;

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rand_core::OsRng;
use serde_json::Value;
use tower::ServiceExt as _;
use vouch_api::Tracker;
use vouch_core::controller::Controller;
use vouch_store_sqlite::{SqliteDocumentStore, SqliteLocalStore};
use vouch_sync::{Reconciler, SyncConfig};

use crate::{AppState, ServerConfig, auth::AuthConfig, router};

async fn app() -> Router {
  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(b"secret", &salt)
    .unwrap()
    .to_string();

  let remote = SqliteDocumentStore::open_in_memory().await.unwrap();
  let local = SqliteLocalStore::open_in_memory().unwrap();
  let sync = Arc::new(Reconciler::new(remote, local, SyncConfig::default()));
  let loaded = sync.load().await;
  let tracker = Arc::new(Tracker::new(Controller::new(loaded.envelope), sync, 50));

  router(AppState {
    tracker,
    auth: Arc::new(AuthConfig { password_hash: hash }),
    mailer: None,
  })
}

fn request(method: &str, uri: &str, user: Option<&str>) -> Request<Body> {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(user) = user {
    let token = B64.encode(format!("{user}:secret"));
    builder = builder.header(header::AUTHORIZATION, format!("Basic {token}"));
  }
  builder.body(Body::empty()).unwrap()
}

async fn json(resp: axum::response::Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_needs_no_credentials() {
  let resp = app().await.oneshot(request("GET", "/health", None)).await.unwrap();
  assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn api_requires_credentials() {
  let resp = app()
    .await
    .oneshot(request("GET", "/api/suppliers", None))
    .await
    .unwrap();
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn authenticated_user_becomes_the_actor() {
  let app = app().await;
  let req = Request::builder()
    .method("POST")
    .uri("/api/suppliers")
    .header(header::AUTHORIZATION, format!("Basic {}", B64.encode("jo:secret")))
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(r#"{"supplierName":"Acme"}"#))
    .unwrap();
  let resp = app.clone().oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::CREATED);
  assert_eq!(json(resp).await["lastModifiedUser"], "jo");

  let resp = app
    .oneshot(request("GET", "/api/suppliers", Some("jo")))
    .await
    .unwrap();
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json(resp).await["totalMatches"], 1);
}

#[tokio::test]
async fn report_send_without_mail_is_unavailable() {
  let resp = app()
    .await
    .oneshot(request("POST", "/api/report/send", Some("jo")))
    .await
    .unwrap();
  assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
  assert_eq!(json(resp).await["error"], "report email is not configured");
}

#[test]
fn config_defaults() {
  let config = ServerConfig::default();
  assert_eq!(config.page_size, 50);
  assert_eq!(config.sync.chunk_size, 1000);
  assert_eq!(config.sync.debounce_ms, 3000);
  assert_eq!((config.backup.hour, config.backup.minute), (17, 0));
  assert!(config.mail.is_none());
}
