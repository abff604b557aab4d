//! ERP Admin Router Library
//!
//! Back-office administration over an ERP dataset spread across several
//! databases. Each request works against the database chosen in the
//! caller's session; framework tables always live on the `default`
//! connection.

pub mod admin;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routing;
pub mod server;

pub use config::Config;
pub use error::{AdminError, AdminResult};
pub use routing::{MultiDatabaseRouter, RequestDatabase, current_database, set_current_database};
pub use server::{AppState, HttpServer, create_router};
