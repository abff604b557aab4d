//! Routing policy: which connection serves a given entity.
//!
//! Framework-owned entities always use the default connection. Entities of
//! the `core` module follow the selected database. Anything else falls back
//! to the default connection. The policy never fails.

use crate::models::{AppModule, DatabaseAlias, EntityType};
use crate::routing::context::{RequestDatabase, current_database};
use tracing::trace;

/// Per-entity connection routing across multiple databases.
#[derive(Debug, Clone)]
pub struct MultiDatabaseRouter {
    default_connection: DatabaseAlias,
}

impl MultiDatabaseRouter {
    pub fn new() -> Self {
        Self {
            default_connection: DatabaseAlias::default_connection(),
        }
    }

    pub fn default_connection(&self) -> &DatabaseAlias {
        &self.default_connection
    }

    /// Connection for reads of `entity`, using the calling thread's selection.
    pub fn db_for_read(&self, entity: &EntityType) -> DatabaseAlias {
        self.route(entity, "read", current_database)
    }

    /// Connection for writes of `entity`, using the calling thread's selection.
    pub fn db_for_write(&self, entity: &EntityType) -> DatabaseAlias {
        self.route(entity, "write", current_database)
    }

    /// Connection for reads of `entity` under an explicit request context.
    pub fn db_for_read_in(&self, entity: &EntityType, ctx: &RequestDatabase) -> DatabaseAlias {
        self.route(entity, "read", || ctx.alias.clone())
    }

    /// Connection for writes of `entity` under an explicit request context.
    pub fn db_for_write_in(&self, entity: &EntityType, ctx: &RequestDatabase) -> DatabaseAlias {
        self.route(entity, "write", || ctx.alias.clone())
    }

    /// Relations across databases are never vetoed here.
    pub fn allow_relation(&self, _a: &EntityType, _b: &EntityType) -> bool {
        true
    }

    /// Whether schema changes for `module` may run on `connection`.
    ///
    /// Framework modules migrate only on the default connection. `None` means
    /// no opinion: the `core` schema is managed outside this service.
    pub fn allow_migrate(&self, connection: &str, module: AppModule) -> Option<bool> {
        if module.is_framework() {
            Some(connection == self.default_connection.as_str())
        } else {
            None
        }
    }

    fn route(
        &self,
        entity: &EntityType,
        operation: &'static str,
        selected: impl FnOnce() -> DatabaseAlias,
    ) -> DatabaseAlias {
        let alias = match entity.module {
            m if m.is_framework() => self.default_connection.clone(),
            AppModule::Core => selected(),
            _ => self.default_connection.clone(),
        };
        trace!(entity = %entity, operation, database = %alias, "Routed entity");
        alias
    }
}

impl Default for MultiDatabaseRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of the migration check for one module on one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationDecision {
    Allowed,
    Denied,
    /// Schema managed outside this service.
    Unmanaged,
}

impl From<Option<bool>> for MigrationDecision {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Allowed,
            Some(false) => Self::Denied,
            None => Self::Unmanaged,
        }
    }
}

/// Migration decisions for every configured connection and registered module.
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    entries: Vec<(DatabaseAlias, AppModule, MigrationDecision)>,
}

impl MigrationPlan {
    pub fn build<'a>(
        router: &MultiDatabaseRouter,
        connections: impl IntoIterator<Item = &'a DatabaseAlias>,
        modules: &[AppModule],
    ) -> Self {
        let mut entries = Vec::new();
        for connection in connections {
            for module in modules {
                let decision = router.allow_migrate(connection.as_str(), *module).into();
                entries.push((connection.clone(), *module, decision));
            }
        }
        Self { entries }
    }

    /// Decision for a connection and module, if both were part of the plan.
    pub fn decision(&self, connection: &str, module: AppModule) -> Option<MigrationDecision> {
        self.entries
            .iter()
            .find(|(c, m, _)| *c == connection && *m == module)
            .map(|(_, _, d)| *d)
    }

    /// Modules allowed to migrate on `connection`.
    pub fn migrated_on(&self, connection: &str) -> Vec<AppModule> {
        self.entries
            .iter()
            .filter(|(c, _, d)| *c == connection && *d == MigrationDecision::Allowed)
            .map(|(_, m, _)| *m)
            .collect()
    }

    /// Modules whose schema is managed externally.
    pub fn unmanaged_modules(&self) -> Vec<AppModule> {
        let mut modules = Vec::new();
        for (_, module, decision) in &self.entries {
            if *decision == MigrationDecision::Unmanaged && !modules.contains(module) {
                modules.push(*module);
            }
        }
        modules
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
