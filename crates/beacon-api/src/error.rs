//! Gateway error type and its JSON [`IntoResponse`] rendering.
//!
//! Every failure leaves the gateway as `{"error": "..."}`; validation
//! failures add a `details` array of `{field, message}` pairs. Storage
//! failures are logged in full and answered with a generic message.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("{0}: {1}")]
  Validation(&'static str, ValidationErrors),

  #[error("unauthorized: {0}")]
  Unauthorized(&'static str),

  #[error("not found: {0}")]
  NotFound(&'static str),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// One offending field in a `400` body.
#[derive(Debug, Serialize)]
pub struct FieldError {
  pub field:   String,
  pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
  error:   String,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  details: Vec<FieldError>,
}

/// Flatten `errors` into `{field, message}` pairs, sorted by field.
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
  let mut out: Vec<FieldError> = errors
    .field_errors()
    .into_iter()
    .flat_map(|(field, errs)| {
      let field = field.to_string();
      errs.iter().map(move |e| FieldError {
        field:   field.clone(),
        message: e
          .message
          .as_ref()
          .map(|m| m.to_string())
          .unwrap_or_else(|| e.code.to_string()),
      })
    })
    .collect();
  out.sort_by(|a, b| a.field.cmp(&b.field));
  out
}

impl From<beacon_service::Error> for ApiError {
  fn from(e: beacon_service::Error) -> Self {
    use beacon_service::Error as E;
    match e {
      E::InvalidLocation(errors) => Self::Validation("Invalid location data", errors),
      E::InvalidDevice(errors) => Self::Validation("Invalid device registration", errors),
      E::Unauthorized => Self::Unauthorized("Invalid admin token"),
      E::NotFound => Self::NotFound("No location found"),
      E::StorageUnavailable(source) => Self::Store(source),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, error, details) = match self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m, Vec::new()),
      ApiError::Validation(m, errors) => {
        (StatusCode::BAD_REQUEST, m.to_owned(), field_errors(&errors))
      }
      ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.to_owned(), Vec::new()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.to_owned(), Vec::new()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "storage failure");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned(), Vec::new())
      }
    };
    (status, Json(ErrorBody { error, details })).into_response()
  }
}
