//! Error types for dealership.
//!
//! This module defines all error types used throughout the dealership crate.
//! Every variant maps to an HTTP status so handlers can return `Result<_>`
//! directly and let axum render the JSON error envelope.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// A single failed field check, rendered in the `errors` array of a 400 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Human-readable message.
    pub msg: String,
    /// Name of the offending field.
    pub path: String,
    /// Where the field was read from.
    pub location: &'static str,
}

impl FieldError {
    /// Create a body field error.
    #[must_use]
    pub fn body(path: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            path: path.into(),
            location: "body",
        }
    }
}

/// The main error type for dealership operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Request Errors ===
    /// One or more request fields failed validation.
    #[error("validation failed: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    /// The request was malformed or violated a business rule.
    #[error("{0}")]
    BadRequest(String),

    /// Authentication is missing or invalid.
    #[error("{0}")]
    Unauthorized(String),

    /// The caller is authenticated but not allowed to do this.
    #[error("{0}")]
    Forbidden(String),

    /// The addressed resource does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// An order referenced a vehicle that does not exist.
    #[error("Vehicle not found: {0}")]
    VehicleNotFound(i64),

    /// An order asked for more units than are in stock.
    #[error("Not enough stock for {name}. Only {available} left.")]
    InsufficientStock {
        /// Vehicle name.
        name: String,
        /// Units currently in stock.
        available: i64,
    },

    /// The email address is already registered.
    #[error("User already exists")]
    DuplicateEmail,

    // === Server Errors ===
    /// Failed to bind the HTTP listener.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that couldn't be bound.
        addr: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for dealership operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.path, e.msg))
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Create a new bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create a new forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// The standard rejection for missing or bad credentials on a protected route.
    #[must_use]
    pub fn not_authorized() -> Self {
        Self::Unauthorized("Not authorized to access this route".to_string())
    }

    /// HTTP status code for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::BadRequest(_)
            | Self::InsufficientStock { .. }
            | Self::DuplicateEmail => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) | Self::VehicleNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error is caused by the client rather than the server.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Validation(errors) => json!({ "success": false, "errors": errors }),
            _ if self.is_client_error() => {
                json!({ "success": false, "message": self.to_string() })
            }
            _ => {
                error!(error = %self, "request failed");
                json!({ "success": false, "message": "Server Error" })
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("Vehicle");
        assert_eq!(err.to_string(), "Vehicle not found");

        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");
    }

    #[test]
    fn test_insufficient_stock_display() {
        let err = Error::InsufficientStock {
            name: "VinFast VF8".to_string(),
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "Not enough stock for VinFast VF8. Only 2 left."
        );
    }

    #[test]
    fn test_vehicle_not_found_display() {
        assert_eq!(Error::VehicleNotFound(42).to_string(), "Vehicle not found: 42");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::not_authorized().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(Error::NotFound("Order").status(), StatusCode::NOT_FOUND);
        assert_eq!(Error::VehicleNotFound(1).status(), StatusCode::NOT_FOUND);
        assert_eq!(Error::DuplicateEmail.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::internal("boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_is_client_error() {
        assert!(Error::Validation(vec![]).is_client_error());
        assert!(!Error::internal("boom").is_client_error());
    }

    #[test]
    fn test_validation_display_lists_fields() {
        let err = Error::Validation(vec![
            FieldError::body("email", "Please include a valid email"),
            FieldError::body("password", "Password is required"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("email: Please include a valid email"));
        assert!(msg.contains("password: Password is required"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "jwt_secret too short".to_string(),
        };
        assert!(err.to_string().contains("jwt_secret too short"));
    }

    #[test]
    fn test_field_error_serialize() {
        let value = serde_json::to_value(FieldError::body("name", "Name is required")).unwrap();
        assert_eq!(value["msg"], "Name is required");
        assert_eq!(value["path"], "name");
        assert_eq!(value["location"], "body");
    }
}
