//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,

  #[error("report email is not configured")]
  MailNotConfigured,

  #[error("mail delivery failed: {0}")]
  Mail(#[from] reqwest::Error),

  #[error(transparent)]
  Api(#[from] vouch_api::ApiError),

  #[error("csv error: {0}")]
  Csv(#[from] vouch_csv::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let (status, message) = match self {
      Error::Unauthorized => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": "unauthorized" })),
        )
          .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"vouch\""),
        );
        return res;
      }
      Error::Api(e) => return e.into_response(),
      Error::MailNotConfigured => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
      Error::Mail(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
      Error::Csv(_) | Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
