//! The error type shared by the editor core and the HTTP services.

use crate::storage::StoreError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use serde::Serialize;

/// Shown when the lock holder's name cannot be resolved.
pub const UNKNOWN_HOLDER: &str = "otro usuario";

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("{0}")]
    NotFound(String),

    #[error("Este correo está siendo editado por {}.", .holder_name.as_deref().unwrap_or(UNKNOWN_HOLDER))]
    LockConflict {
        holder_id: Option<i64>,
        holder_name: Option<String>,
    },

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    ValidationFailed(String),

    #[error("storage failure: {0}")]
    StorageFailure(#[from] StoreError),
}

impl EditorError {
    pub fn not_found(what: impl Into<String>) -> Self {
        EditorError::NotFound(what.into())
    }

    pub fn forbidden(why: impl Into<String>) -> Self {
        EditorError::Forbidden(why.into())
    }

    pub fn invalid(why: impl Into<String>) -> Self {
        EditorError::ValidationFailed(why.into())
    }

    /// Storage failures are transient from the caller's point of view.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EditorError::StorageFailure(_))
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    locked_by: Option<&'a str>,
    retryable: bool,
}

impl ResponseError for EditorError {
    fn status_code(&self) -> StatusCode {
        match self {
            EditorError::NotFound(_) => StatusCode::NOT_FOUND,
            EditorError::LockConflict { .. } => StatusCode::CONFLICT,
            EditorError::Forbidden(_) => StatusCode::FORBIDDEN,
            EditorError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            EditorError::StorageFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            EditorError::StorageFailure(e) => {
                error!("Storage failure: {}", e);
                "Error temporal de almacenamiento, inténtalo de nuevo.".to_string()
            }
            other => other.to_string(),
        };
        let locked_by = match self {
            EditorError::LockConflict { holder_name, .. } => {
                Some(holder_name.as_deref().unwrap_or(UNKNOWN_HOLDER))
            }
            _ => None,
        };

        HttpResponse::build(self.status_code()).json(ErrorBody {
            message,
            locked_by,
            retryable: self.is_retryable(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_message_names_the_holder() {
        let named = EditorError::LockConflict {
            holder_id: Some(2),
            holder_name: Some("marta".into()),
        };
        assert_eq!(named.to_string(), "Este correo está siendo editado por marta.");

        let anonymous = EditorError::LockConflict {
            holder_id: None,
            holder_name: None,
        };
        assert!(anonymous.to_string().contains(UNKNOWN_HOLDER));
    }

    #[test]
    fn maps_kinds_to_status_codes() {
        assert_eq!(
            EditorError::not_found("x").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            EditorError::forbidden("x").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            EditorError::invalid("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        let storage = EditorError::from(StoreError::Task("join".into()));
        assert_eq!(storage.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(storage.is_retryable());
    }
}
