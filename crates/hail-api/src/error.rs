//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use hail_dispatch::DispatchError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<DispatchError> for ApiError {
  fn from(e: DispatchError) -> Self {
    use hail_core::Error as Ride;
    match e {
      DispatchError::Ride(Ride::InvalidRequest(m)) => ApiError::BadRequest(m),
      DispatchError::Ride(Ride::NotFound(id)) => {
        ApiError::NotFound(format!("ride {id} not found"))
      }
      DispatchError::Ride(e @ Ride::InvalidTransition { .. }) => {
        ApiError::Conflict(e.to_string())
      }
      DispatchError::Conflict(id) => {
        ApiError::Conflict(format!("ride {id} was modified concurrently"))
      }
      DispatchError::Ride(other) => ApiError::Internal(Box::new(other)),
      DispatchError::Store(inner) => ApiError::Internal(inner),
    }
  }
}

// Malformed bodies, query strings and path segments are client errors with
// the same JSON body as every other failure.

impl From<JsonRejection> for ApiError {
  fn from(e: JsonRejection) -> Self { ApiError::BadRequest(e.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(e: QueryRejection) -> Self { ApiError::BadRequest(e.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(e: PathRejection) -> Self { ApiError::BadRequest(e.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
