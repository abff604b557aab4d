//! Integration tests for per-request database routing.
//!
//! Tests verify that:
//! - The thread slot falls back to "cdg" and keeps the last value set
//! - Framework entities always route to "default"
//! - Core entities follow the current selection
//! - Migrations of framework modules only run on "default"

use erp_admin_router::models::entity::{REGISTRY, erp, framework};
use erp_admin_router::models::{AppModule, DatabaseAlias, DatabaseCatalog, Ownership};
use erp_admin_router::routing::{
    MigrationDecision, MigrationPlan, MultiDatabaseRouter, RequestDatabase, current_database,
    set_current_database,
};
use std::thread;

fn catalog() -> DatabaseCatalog {
    DatabaseCatalog::new("cdg")
        .with_database("cdg", "CDG Matriz")
        .with_database("filial2", "Filial 2")
}

/// Run `f` on a fresh thread so the slot starts unset.
fn on_fresh_thread<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    thread::spawn(f).join().unwrap()
}

#[test]
fn test_unknown_identifiers_validate_to_default() {
    let catalog = catalog();
    for candidate in ["unknown_db", "", "CDG", "default", "filial2 "] {
        assert_eq!(catalog.validate(candidate), "cdg", "candidate {:?}", candidate);
    }
}

#[test]
fn test_known_identifiers_validate_to_themselves() {
    let catalog = catalog();
    for candidate in ["cdg", "filial2"] {
        let validated = catalog.validate(candidate);
        assert_eq!(validated, candidate);
        assert_eq!(catalog.validate(validated.as_str()), validated);
    }
}

#[test]
fn test_set_then_get_until_next_set() {
    on_fresh_thread(|| {
        set_current_database("filial2");
        assert_eq!(current_database(), "filial2");
        assert_eq!(current_database(), "filial2");
        set_current_database("cdg");
        assert_eq!(current_database(), "cdg");
    });
}

#[test]
fn test_slot_is_per_thread() {
    on_fresh_thread(|| {
        set_current_database("filial2");
        let other = on_fresh_thread(current_database);
        assert_eq!(other, "cdg");
        assert_eq!(current_database(), "filial2");
    });
}

#[test]
fn test_framework_entities_ignore_selection() {
    let router = MultiDatabaseRouter::new();
    on_fresh_thread(move || {
        for selected in ["cdg", "filial2", "anything"] {
            set_current_database(selected);
            for entity in REGISTRY
                .iter()
                .filter(|e| e.ownership() == Some(Ownership::Framework))
            {
                assert_eq!(router.db_for_read(entity), "default");
                assert_eq!(router.db_for_write(entity), "default");
            }
        }
    });
}

#[test]
fn test_core_entities_follow_selection() {
    let router = MultiDatabaseRouter::new();
    on_fresh_thread(move || {
        for selected in ["cdg", "filial2"] {
            set_current_database(selected);
            for entity in REGISTRY.iter().filter(|e| e.module == AppModule::Core) {
                assert_eq!(router.db_for_read(entity), current_database());
                assert_eq!(router.db_for_write(entity), current_database());
            }
        }
    });
}

#[test]
fn test_selection_scenario() {
    let router = MultiDatabaseRouter::new();
    on_fresh_thread(move || {
        assert_eq!(current_database(), "cdg");
        set_current_database("filial2");
        assert_eq!(current_database(), "filial2");
        assert_eq!(router.db_for_read(&framework::USER), "default");
        assert_eq!(router.db_for_read(&erp::CLIENT), "filial2");
    });
}

#[test]
fn test_explicit_context_matches_thread_slot() {
    let router = MultiDatabaseRouter::new();
    let catalog = catalog();
    let selection = RequestDatabase::resolve(&catalog, Some("filial2"));

    assert_eq!(router.db_for_read_in(&erp::INVOICE, &selection), "filial2");
    assert_eq!(router.db_for_write_in(&erp::INVOICE, &selection), "filial2");
    assert_eq!(router.db_for_read_in(&framework::SESSION, &selection), "default");

    on_fresh_thread(move || {
        set_current_database(selection.alias.clone());
        assert_eq!(
            router.db_for_read(&erp::INVOICE),
            router.db_for_read_in(&erp::INVOICE, &selection)
        );
    });
}

#[test]
fn test_unknown_session_value_resolves_to_default() {
    let selection = RequestDatabase::resolve(&catalog(), Some("unknown_db"));
    assert_eq!(selection.alias, "cdg");
    assert_eq!(selection.name, "CDG Matriz");
    assert_eq!(selection.available.len(), 2);
}

#[test]
fn test_relations_always_allowed() {
    let router = MultiDatabaseRouter::new();
    assert!(router.allow_relation(&erp::CLIENT, &framework::USER));
    assert!(router.allow_relation(&erp::SALES_ORDER, &erp::SALES_ORDER_ITEM));
}

#[test]
fn test_framework_migrations_only_on_default() {
    let router = MultiDatabaseRouter::new();
    assert_eq!(router.allow_migrate("default", AppModule::Auth), Some(true));
    assert_eq!(router.allow_migrate("cdg", AppModule::Auth), Some(false));
    assert_eq!(router.allow_migrate("cdg", AppModule::Core), None);
    assert_eq!(router.allow_migrate("default", AppModule::Core), None);
}

#[test]
fn test_migration_plan_over_connections() {
    let router = MultiDatabaseRouter::new();
    let connections: [DatabaseAlias; 3] = ["default".into(), "cdg".into(), "filial2".into()];
    let modules = [AppModule::Auth, AppModule::Sessions, AppModule::Core];
    let plan = MigrationPlan::build(&router, &connections, &modules);

    assert_eq!(
        plan.migrated_on("default"),
        vec![AppModule::Auth, AppModule::Sessions]
    );
    assert!(plan.migrated_on("filial2").is_empty());
    assert_eq!(
        plan.decision("cdg", AppModule::Sessions),
        Some(MigrationDecision::Denied)
    );
    assert_eq!(plan.unmanaged_modules(), vec![AppModule::Core]);
}
