//! Connection-related data models.
//!
//! This module defines types for database connection configuration and state.

use crate::config::PoolOptions;
use crate::models::DatabaseAlias;
use serde::{Deserialize, Serialize};

/// Supported database types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    PostgreSQL,
    /// Includes MariaDB
    MySQL,
    SQLite,
}

impl DatabaseType {
    /// Parse database type from a connection string.
    pub fn from_connection_string(connection_string: &str) -> Option<Self> {
        let lower = connection_string.to_lowercase();
        if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            Some(Self::PostgreSQL)
        } else if lower.starts_with("mysql://") || lower.starts_with("mariadb://") {
            Some(Self::MySQL)
        } else if lower.starts_with("sqlite://") || lower.starts_with("sqlite:") {
            Some(Self::SQLite)
        } else {
            None
        }
    }

    /// Get the display name for this database type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PostgreSQL => "PostgreSQL",
            Self::MySQL => "MySQL",
            Self::SQLite => "SQLite",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Configuration for one physical database connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub alias: DatabaseAlias,
    /// Human-readable name shown in the database selector.
    pub name: String,
    pub db_type: DatabaseType,
    /// Contains sensitive data - never log
    #[serde(skip_serializing)]
    pub connection_string: String,
    /// Whether requests may select this database.
    #[serde(default)]
    pub selectable: bool,
    /// Connection pool configuration options.
    #[serde(default)]
    pub pool_options: PoolOptions,
}

impl ConnectionConfig {
    /// Create a new connection configuration.
    pub fn new(
        alias: impl Into<String>,
        name: impl Into<String>,
        connection_string: impl Into<String>,
        selectable: bool,
        pool_options: PoolOptions,
    ) -> Result<Self, ConnectionConfigError> {
        let alias = alias.into();
        let connection_string = connection_string.into();

        // Validate alias
        if alias.is_empty() {
            return Err(ConnectionConfigError::EmptyAlias);
        }
        if !alias
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConnectionConfigError::InvalidAlias(alias));
        }

        // Detect database type
        let db_type = DatabaseType::from_connection_string(&connection_string)
            .ok_or_else(|| ConnectionConfigError::UnknownDatabaseType(connection_string.clone()))?;

        let name = name.into();
        let name = if name.trim().is_empty() {
            alias.clone()
        } else {
            name
        };

        Ok(Self {
            alias: DatabaseAlias::new(alias),
            name,
            db_type,
            connection_string,
            selectable,
            pool_options,
        })
    }

    /// Get a display-safe version of the connection string (credentials masked).
    pub fn masked_connection_string(&self) -> String {
        // Simple masking: replace password in URL
        if let Some(at_pos) = self.connection_string.find('@') {
            if let Some(colon_pos) = self.connection_string[..at_pos].rfind(':') {
                let prefix = &self.connection_string[..colon_pos + 1];
                let suffix = &self.connection_string[at_pos..];
                return format!("{}****{}", prefix, suffix);
            }
        }
        self.connection_string.clone()
    }
}

/// Errors that can occur when creating a connection configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionConfigError {
    #[error("Database alias cannot be empty")]
    EmptyAlias,

    #[error("Database alias contains invalid characters: {0}")]
    InvalidAlias(String),

    /// Could not determine database type from connection string
    #[error("Unknown database type in connection string: {0}")]
    UnknownDatabaseType(String),
}

/// Information about an active connection, returned after successful connection.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionInfo {
    pub alias: DatabaseAlias,
    pub name: String,
    pub database_type: DatabaseType,
    pub server_version: Option<String>,
    pub selectable: bool,
}
