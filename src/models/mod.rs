//! Data models for the ERP admin router.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod database;
pub mod entity;
pub mod query;

// Re-export commonly used types
pub use connection::{ConnectionConfig, ConnectionConfigError, ConnectionInfo, DatabaseType};
pub use database::{
    DEFAULT_CONNECTION, DatabaseAlias, DatabaseCatalog, DatabaseChoice, FALLBACK_DATABASE,
};
pub use entity::{AppModule, EntityType, Ownership};
pub use query::{DEFAULT_QUERY_TIMEOUT_SECS, MAX_EXPORT_IDS, QueryParam};
