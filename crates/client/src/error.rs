//! Error types for the catalog API client.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connection, TLS, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-2xx status.
    #[error("API error ({status}): {}", status_message(.body.as_ref()))]
    Status {
        /// Response status.
        status: StatusCode,
        /// Parsed error body, if the server sent one we understand.
        body: Option<ErrorBody>,
    },

    /// Response body did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// The configured base URL cannot carry path segments.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// Reading a local file for upload failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A product was saved without a category and the server lists none.
    #[error("no categories available")]
    NoCategories,

    /// Token storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// Validation message reported by the server, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => body.as_ref().and_then(ErrorBody::message),
            _ => None,
        }
    }

    /// Response status for non-2xx failures.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn status_message(body: Option<&ErrorBody>) -> &str {
    body.and_then(ErrorBody::message)
        .unwrap_or("no message")
}

/// Error body returned by the catalog API.
///
/// Business-rule failures carry a single `msg`; request validation failures
/// carry a list of field errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    /// Single error message.
    #[serde(default)]
    pub msg: Option<String>,
    /// Field validation errors.
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

impl ErrorBody {
    /// First field validation message.
    #[must_use]
    pub fn first_error(&self) -> Option<&str> {
        self.errors
            .first()
            .map(|e| e.msg.as_str())
            .filter(|m| !m.is_empty())
    }

    /// The top-level `msg`, if non-empty.
    #[must_use]
    pub fn top_message(&self) -> Option<&str> {
        self.msg.as_deref().filter(|m| !m.is_empty())
    }

    /// `msg` if present, otherwise the first field error.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.top_message().or_else(|| self.first_error())
    }
}

/// A single field validation error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FieldError {
    /// Human-readable message.
    #[serde(default)]
    pub msg: String,
    /// Offending field, when reported.
    #[serde(default, alias = "path")]
    pub param: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_single_message() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"msg": "Usuario / Password no son correctos - correo"}"#)
                .expect("deserialize");
        assert_eq!(
            body.message(),
            Some("Usuario / Password no son correctos - correo")
        );
        assert!(body.first_error().is_none());
    }

    #[test]
    fn test_error_body_validation_errors() {
        let json = r#"{
            "errors": [
                {"value": "test1@test.com", "msg": "El correo test1@test.com ya está registrado", "param": "correo", "location": "body"},
                {"msg": "El password debe de ser más de 6 letras", "param": "password"}
            ]
        }"#;
        let body: ErrorBody = serde_json::from_str(json).expect("deserialize");
        assert_eq!(
            body.first_error(),
            Some("El correo test1@test.com ya está registrado")
        );
        assert_eq!(body.errors.len(), 2);
        assert_eq!(body.errors[1].param.as_deref(), Some("password"));
    }

    #[test]
    fn test_empty_messages_are_ignored() {
        let body = ErrorBody {
            msg: Some(String::new()),
            errors: vec![FieldError::default()],
        };
        assert!(body.message().is_none());
    }

    #[test]
    fn test_status_error_display() {
        let err = ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            body: Some(ErrorBody {
                msg: Some("Producto ya existe".to_string()),
                errors: vec![],
            }),
        };
        assert_eq!(err.to_string(), "API error (400 Bad Request): Producto ya existe");
        assert_eq!(err.server_message(), Some("Producto ya existe"));
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));

        let err = ApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: None,
        };
        assert_eq!(
            err.to_string(),
            "API error (500 Internal Server Error): no message"
        );
        assert!(err.server_message().is_none());
    }
}
