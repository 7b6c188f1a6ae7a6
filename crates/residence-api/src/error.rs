//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Bodies follow the shape clients of the service expect: `{"detail": ...}`
//! for request-level failures and a field-to-messages map for validation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use residence_core::{ValidationErrors, store::StoreError};
use serde_json::json;
use thiserror::Error;

pub const NOT_FOUND: &str = "Not found.";
pub const FORBIDDEN: &str = "You do not have permission to perform this action.";
pub const SERVER_ERROR: &str = "A server error occurred.";

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found")]
  NotFound,

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("validation failed: {0}")]
  Validation(ValidationErrors),

  /// Missing or invalid credentials; carries the message shown to the client.
  #[error("unauthorized: {0}")]
  Unauthorized(&'static str),

  #[error("forbidden")]
  Forbidden,

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a store failure: validation problems become 400s, anything
  /// else is logged and hidden behind a generic 500.
  pub fn store<E: StoreError>(err: E) -> Self {
    if let Some(errors) = err.validation() {
      return ApiError::Validation(errors.clone());
    }
    tracing::error!(error = %err, "store operation failed");
    ApiError::Internal(Box::new(err))
  }
}

impl From<ValidationErrors> for ApiError {
  fn from(errors: ValidationErrors) -> Self { ApiError::Validation(errors) }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl From<serde_json::Error> for ApiError {
  fn from(err: serde_json::Error) -> Self {
    tracing::error!(error = %err, "failed to serialise response");
    ApiError::Internal(Box::new(err))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::NotFound => {
        (StatusCode::NOT_FOUND, Json(json!({ "detail": NOT_FOUND }))).into_response()
      }
      ApiError::BadRequest(detail) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "detail": detail }))).into_response()
      }
      ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
      ApiError::Unauthorized(detail) => {
        let mut res =
          (StatusCode::UNAUTHORIZED, Json(json!({ "detail": detail }))).into_response();
        res
          .headers_mut()
          .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Token"));
        res
      }
      ApiError::Forbidden => {
        (StatusCode::FORBIDDEN, Json(json!({ "detail": FORBIDDEN }))).into_response()
      }
      ApiError::Internal(_) => {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "detail": SERVER_ERROR })))
          .into_response()
      }
    }
  }
}
