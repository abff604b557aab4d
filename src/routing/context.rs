//! Execution context for database selection.
//!
//! Two forms of the same information live here:
//!
//! - A thread-scoped slot ([`set_current_database`] / [`current_database`])
//!   that synchronous code can consult without threading a parameter through.
//!   The slot is never cleared: a thread that skips the selection step sees
//!   whatever the previous request on that thread selected.
//! - [`RequestDatabase`], the explicit per-request value the HTTP layer
//!   attaches to each request. Async handlers must use this one, since a
//!   task may resume on a different worker thread than the one that ran the
//!   selection middleware.

use crate::models::{DatabaseAlias, DatabaseCatalog, DatabaseChoice, FALLBACK_DATABASE};
use serde::Serialize;
use std::cell::RefCell;

thread_local! {
    static CURRENT_DATABASE: RefCell<Option<DatabaseAlias>> = const { RefCell::new(None) };
}

/// Overwrite the calling thread's selected database. No validation.
pub fn set_current_database(alias: impl Into<DatabaseAlias>) {
    let alias = alias.into();
    CURRENT_DATABASE.with(|slot| {
        *slot.borrow_mut() = Some(alias);
    });
}

/// The calling thread's selected database, or [`FALLBACK_DATABASE`] if never set.
pub fn current_database() -> DatabaseAlias {
    CURRENT_DATABASE.with(|slot| {
        slot.borrow()
            .clone()
            .unwrap_or_else(|| DatabaseAlias::new(FALLBACK_DATABASE))
    })
}

/// Database selection resolved for one request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestDatabase {
    /// Validated alias.
    pub alias: DatabaseAlias,
    /// Display name of `alias`.
    pub name: String,
    /// Every selectable database.
    pub available: Vec<DatabaseChoice>,
}

impl RequestDatabase {
    /// Resolve a session candidate against the catalog.
    pub fn resolve(catalog: &DatabaseCatalog, candidate: Option<&str>) -> Self {
        let alias = catalog.resolve(candidate);
        Self {
            name: catalog.display_name(alias.as_str()),
            available: catalog.choices().to_vec(),
            alias,
        }
    }
}
