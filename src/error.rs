//! Error types for the ERP admin router.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! The routing policy and the execution context never fail; these errors come
//! from configuration, the database drivers, and the HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
        suggestion: String,
    },

    #[error("Connection not found: {alias}")]
    ConnectionNotFound { alias: String },

    #[error("Entity not found: {entity}")]
    EntityNotFound { entity: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: String,
        elapsed_secs: u64,
    },

    #[error("Export failed: {message}")]
    Export { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AdminError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a database error with optional SQL state.
    pub fn database(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    pub fn connection_not_found(alias: impl Into<String>) -> Self {
        Self::ConnectionNotFound {
            alias: alias.into(),
        }
    }

    pub fn entity_not_found(entity: impl Into<String>) -> Self {
        Self::EntityNotFound {
            entity: entity.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, elapsed_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    pub fn export(message: impl Into<String>) -> Self {
        Self::Export {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Database { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// Machine-readable error code used in HTTP responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "connection_failed",
            Self::Database { .. } => "database_error",
            Self::ConnectionNotFound { .. } => "connection_not_found",
            Self::EntityNotFound { .. } => "not_found",
            Self::InvalidInput { .. } => "invalid_input",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Timeout { .. } => "timeout",
            Self::Export { .. } => "export_failed",
            Self::Config { .. } => "configuration_error",
            Self::Internal { .. } => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::EntityNotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert sqlx errors to AdminError.
impl From<sqlx::Error> for AdminError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => AdminError::connection(
                msg.to_string(),
                "Check the connection string format and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                AdminError::database(
                    db_err.message(),
                    code,
                    "Check that the table exists on the selected database",
                )
            }
            sqlx::Error::RowNotFound => AdminError::database(
                "No rows returned",
                None,
                "Verify the query conditions match existing data",
            ),
            sqlx::Error::PoolTimedOut => AdminError::timeout("connection pool acquire", 30),
            sqlx::Error::PoolClosed => {
                AdminError::connection("Connection pool is closed", "Restart the service")
            }
            sqlx::Error::Io(io_err) => AdminError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => AdminError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => AdminError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => AdminError::database(
                format!("Column not found: {}", col),
                None,
                "The selected database schema differs from the admin registry",
            ),
            sqlx::Error::ColumnDecode { index, source } => {
                AdminError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => {
                AdminError::internal(format!("Decode error: {}", source))
            }
            sqlx::Error::WorkerCrashed => AdminError::internal("Database worker crashed"),
            _ => AdminError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for AdminError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        AdminError::export(err.to_string())
    }
}

/// Result type alias for admin operations.
pub type AdminResult<T> = Result<T, AdminError>;

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorDetail,
        }
        #[derive(Serialize)]
        struct ErrorDetail {
            code: &'static str,
            message: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            suggestion: Option<String>,
        }

        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.code(),
                message: self.to_string(),
                suggestion: self.suggestion().map(String::from),
            },
        };
        (status, axum::Json(body)).into_response()
    }
}
