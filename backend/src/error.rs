use std::collections::BTreeMap;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use validator::ValidationErrors;

use crate::response::ApiResponse;

/// Field name -> human readable messages, serialized as the envelope's `errors` object.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// AppError
///
/// The single error taxonomy shared by the repository, service and handler layers.
/// Repositories and services only ever propagate it with `?`; the `IntoResponse`
/// implementation below is the one place where it becomes an HTTP status and envelope.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing input (422) with per-field messages.
    #[error("The given data was invalid.")]
    Validation(FieldErrors),

    /// Unknown identifier (404). Carries the entity name, e.g. "Post".
    #[error("{0} not found.")]
    NotFound(&'static str),

    /// Missing, malformed, expired or revoked bearer token (401).
    #[error("{0}")]
    Unauthenticated(&'static str),

    /// Authenticated, but not entitled to the target resource (403).
    #[error("{0}")]
    Forbidden(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Builds a validation failure for a single field.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        AppError::Validation(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (message, errors) = match self {
            AppError::Validation(fields) => (
                "The given data was invalid.".to_string(),
                serde_json::to_value(fields).ok(),
            ),
            // Storage and internal failures are logged in full but never echoed to the client.
            AppError::Database(ref e) => {
                tracing::error!("database failure: {:?}", e);
                ("Server Error".to_string(), None)
            }
            AppError::Internal(ref e) => {
                tracing::error!("internal failure: {}", e);
                ("Server Error".to_string(), None)
            }
            other => (other.to_string(), None),
        };

        ApiResponse::failure(status, message, errors).into_response()
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| match &e.message {
                        Some(message) => message.to_string(),
                        None => format!("The {} field is invalid ({}).", field, e.code),
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();

        AppError::Validation(fields)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::invalid("body", rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::invalid("query", rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(_) => AppError::NotFound("Resource"),
            // A handler asking for a segment its route does not declare.
            other => AppError::Internal(other.body_text()),
        }
    }
}
