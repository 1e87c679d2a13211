//! Extractor for the acting user placed on the request by the auth layer.

use axum::{extract::FromRequestParts, http::request::Parts};
use vouch_core::controller::Actor;

use crate::error::ApiError;

/// The authenticated user. Rejects with 401 when no [`Actor`] extension is
/// present.
pub struct CurrentActor(pub Actor);

impl<S: Send + Sync> FromRequestParts<S> for CurrentActor {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<Actor>()
      .cloned()
      .map(CurrentActor)
      .ok_or(ApiError::Unauthorized)
  }
}
