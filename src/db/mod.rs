//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Connection pool management, one pool per database alias
//! - Query execution with timeouts
//! - Parameter binding
//! - Type mappings from rows to JSON

pub mod executor;
pub(crate) mod params;
pub mod pool;
pub mod types;

pub use executor::{JsonRow, QueryExecutor};
pub use pool::{ConnectionManager, DbPool};
