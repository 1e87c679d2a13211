//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("internal error: {0}")]
  Internal(String),
}

impl From<vouch_core::Error> for ApiError {
  fn from(e: vouch_core::Error) -> Self {
    match e {
      vouch_core::Error::SupplierNotFound(id) => Self::NotFound(format!("supplier {id} not found")),
      vouch_core::Error::EmptyNote => Self::BadRequest(e.to_string()),
      vouch_core::Error::Serialization(_) => Self::Internal(e.to_string()),
    }
  }
}

impl From<vouch_csv::Error> for ApiError {
  fn from(e: vouch_csv::Error) -> Self {
    match e {
      vouch_csv::Error::Finish(_) => Self::Internal(e.to_string()),
      _ => Self::BadRequest(e.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_owned()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.clone()),
    };
    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if matches!(self, ApiError::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"vouch\""),
      );
    }
    res
  }
}
