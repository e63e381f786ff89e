//! Application error types and HTTP response mapping.
//!
//! Defines `AppError` enum for all error conditions and implements Axum's
//! `IntoResponse` to convert errors to JSON error bodies. Errors render on
//! the URL that failed, so the client always sees which page broke.
//!
//! Error mappings:
//! - `NotFound` → 404
//! - `InvalidSelection`, `InvalidPath` → 400
//! - `Unauthorized` → 401
//! - `Forbidden` → 403
//! - `PageExpired` → 410
//! - `Git`, `Io`, `Internal` → 500

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Referenced entity no longer exists (deleted repository, vanished branch).
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Dependent value is not valid for the current parent selection.
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Page expired: {0}")]
    PageExpired(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn depot_not_found(id: impl Into<String>) -> Self {
        AppError::NotFound {
            kind: "Repository",
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound { .. })
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::InvalidSelection(_) | AppError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::PageExpired(_) => StatusCode::GONE,
            AppError::Git(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

pub(crate) fn lock_poisoned<T>(_: T) -> AppError {
    AppError::Internal("Lock poisoned".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = AppError::depot_not_found("gone");
        assert!(err.is_not_found());
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Repository not found: gone");
    }

    #[test]
    fn page_expired_maps_to_gone() {
        let response = AppError::PageExpired("picker-3".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::GONE);
    }

    #[test]
    fn selection_errors_are_client_errors() {
        assert_eq!(
            AppError::InvalidSelection("dev".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    }
}
