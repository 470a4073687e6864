//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Body text for every 500. Store details only go to the log.
const INTERNAL_ERROR_MESSAGE: &str = "internal error";

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<hotspots_core::Error> for ApiError {
  fn from(e: hotspots_core::Error) -> Self {
    use hotspots_core::Error as E;
    match e {
      E::Duplicate(m) => ApiError::Conflict(m),
      E::Forbidden(m) => ApiError::Forbidden(m),
      E::Unauthorized(m) => ApiError::Unauthorized(m),
      E::Invalid(m) => ApiError::BadRequest(m),
      E::Store(inner) => ApiError::Store(inner),
      E::SpotNotFound(_) | E::ReviewNotFound(_) | E::ImageNotFound(_) => {
        ApiError::NotFound(e.to_string())
      }
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => {
        tracing::warn!(error = %e, "store failure surfaced as 500");
        (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE.to_string())
      }
    };
    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    res
  }
}

#[cfg(test)]
mod tests {
  use hotspots_core::Error;
  use uuid::Uuid;

  use super::*;

  #[test]
  fn core_errors_map_to_statuses() {
    let cases = [
      (Error::SpotNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
      (Error::ImageNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
      (Error::Duplicate("x".into()), StatusCode::CONFLICT),
      (Error::Forbidden("x".into()), StatusCode::FORBIDDEN),
      (Error::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
      (Error::Invalid("x".into()), StatusCode::BAD_REQUEST),
      (Error::store(std::io::Error::other("disk")), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(err).into_response().status(), status);
    }
  }

  #[tokio::test]
  async fn store_failure_body_hides_backend_detail() {
    let res = ApiError::from(Error::store(std::io::Error::other("no such table: spots")))
      .into_response();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "error": "internal error" }));
  }

  #[test]
  fn unauthorized_carries_bearer_challenge() {
    let res = ApiError::Unauthorized("missing bearer token".into()).into_response();
    assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");
  }
}
