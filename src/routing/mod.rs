//! Per-request database selection and entity routing.

pub mod context;
pub mod policy;

pub use context::{RequestDatabase, current_database, set_current_database};
pub use policy::{MigrationDecision, MigrationPlan, MultiDatabaseRouter};
