//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use garita_core::{
  entry::AccessEntry, resolver::RegistryError, Error as CoreError,
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("not found: {0}")]
  NotFound(String),

  /// A duplicate-guard violation; the blocking entry rides along so the
  /// operator sees who is already inside.
  #[error("conflict: {message}")]
  Conflict {
    message: String,
    entry:   Box<AccessEntry>,
  },

  #[error("registry error: {0}")]
  Registry(RegistryError),

  #[error("internal error: {0}")]
  Internal(String),
}

impl From<CoreError> for ApiError {
  fn from(e: CoreError) -> Self {
    match e {
      CoreError::InvalidDocument(_)
      | CoreError::MissingField(_)
      | CoreError::MissingIdentifier
      | CoreError::ManualNameRequired => ApiError::BadRequest(e.to_string()),

      CoreError::PersonNotFound(_)
      | CoreError::EntryNotFound(_)
      | CoreError::AlreadyClosed(_)
      | CoreError::NoOpenSession => ApiError::NotFound(e.to_string()),

      CoreError::DocumentConflict(entry) => ApiError::Conflict {
        message: format!(
          "an active entry already exists for document {}",
          entry.document_number
        ),
        entry,
      },
      CoreError::PassConflict(entry) => ApiError::Conflict {
        message: format!(
          "pass number already in use by the active entry for document {}",
          entry.document_number
        ),
        entry,
      },

      CoreError::Registry(e) => ApiError::Registry(e),
      CoreError::Store(m) => ApiError::Internal(m),
    }
  }
}

/// Lift a store-level failure through the core taxonomy.
pub fn store_err<E: Into<CoreError>>(e: E) -> ApiError { e.into().into() }

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, json!({ "error": m }))
      }
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::Conflict { message, entry } => (
        StatusCode::CONFLICT,
        json!({ "error": message, "entry": entry }),
      ),
      ApiError::Registry(e) => {
        let status = match e {
          // Auth failures are a deployment problem, not the caller's.
          RegistryError::Auth => StatusCode::BAD_GATEWAY,
          RegistryError::Timeout => StatusCode::GATEWAY_TIMEOUT,
          RegistryError::NotFound => StatusCode::NOT_FOUND,
          RegistryError::Network(_)
          | RegistryError::Parse(_)
          | RegistryError::Status(_) => StatusCode::BAD_GATEWAY,
        };
        (status, json!({ "error": self.to_string(), "registry": e }))
      }
      ApiError::Internal(m) => {
        tracing::error!(error = %m, "internal error");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": m }))
      }
    };
    (status, Json(body)).into_response()
  }
}
