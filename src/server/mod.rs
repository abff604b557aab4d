//! HTTP server for the admin endpoints.
//!
//! Routes:
//! - `GET /admin/` and `GET /admin/databases`: current selection and catalog
//! - `POST /admin/select-database/`: staff only, stores the choice in the session
//! - `GET /admin/core/{slug}/`: change-list of one ERP entity
//! - `POST /admin/core/{slug}/export`: staff only, spreadsheet of selected rows
//! - `GET /health`

pub mod auth;
pub mod handlers;
pub mod middleware;

pub use auth::StaffAuth;

use crate::db::{ConnectionManager, QueryExecutor};
use crate::error::{AdminError, AdminResult};
use crate::models::DatabaseCatalog;
use crate::routing::MultiDatabaseRouter;
use axum::{
    Router,
    extract::FromRef,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

/// Shared state of every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<DatabaseCatalog>,
    pub router: MultiDatabaseRouter,
    pub connections: Arc<ConnectionManager>,
    pub executor: QueryExecutor,
    pub staff: Arc<StaffAuth>,
    pub cookie_key: Key,
    /// Development mode; disables the opener policy header.
    pub debug: bool,
}

impl AppState {
    pub fn new(
        catalog: DatabaseCatalog,
        connections: Arc<ConnectionManager>,
        executor: QueryExecutor,
        staff: StaffAuth,
        cookie_key: Key,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            router: MultiDatabaseRouter::new(),
            connections,
            executor,
            staff: Arc::new(staff),
            cookie_key,
            debug: false,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Derive the session signing key from a secret.
///
/// Without a secret a random key is generated, so sessions do not survive
/// a restart.
pub fn session_key(secret: Option<&str>) -> Key {
    match secret {
        Some(secret) if !secret.is_empty() => {
            Key::from(Sha512::digest(secret.as_bytes()).as_slice())
        }
        _ => {
            warn!("No session secret configured; database selections reset on restart");
            Key::generate()
        }
    }
}

/// Build the axum router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let staff_routes = Router::new()
        .route("/admin/select-database/", post(handlers::select_database))
        .route("/admin/core/{slug}/export", post(handlers::export))
        .route_layer(from_fn_with_state(state.clone(), auth::require_staff));

    Router::new()
        .route("/admin/", get(handlers::index))
        .route("/admin/databases", get(handlers::databases))
        .route("/admin/core/{slug}/", get(handlers::changelist))
        .merge(staff_routes)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::database_selector,
        ))
        .route("/health", get(handlers::health))
        .layer(from_fn(middleware::security_headers))
        .layer(from_fn_with_state(state.clone(), middleware::strip_coop))
        .with_state(state)
}

/// HTTP server bound to a host and port.
pub struct HttpServer {
    state: AppState,
    host: String,
    port: u16,
}

impl HttpServer {
    pub fn new(state: AppState, host: impl Into<String>, port: u16) -> Self {
        Self {
            state,
            host: host.into(),
            port,
        }
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Serve until SIGINT/SIGTERM, then close the database pools.
    pub async fn run(self) -> AdminResult<()> {
        let bind_addr = self.bind_addr();
        info!("Starting admin server on {}", bind_addr);

        let connections = self.state.connections.clone();
        let app = create_router(self.state);

        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            AdminError::connection(
                format!("Failed to bind to {}: {}", bind_addr, e),
                "Check that the port is available",
            )
        })?;

        const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(30);

        let shutdown_notify = Arc::new(tokio::sync::Notify::new());
        let shutdown_notify_clone = shutdown_notify.clone();

        let shutdown_signal = async move {
            wait_for_signal().await;
            shutdown_notify_clone.notify_one();
        };

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal);

        // Race between: server completing normally vs forced timeout/second signal after shutdown
        tokio::select! {
            result = server => {
                match result {
                    Ok(()) => info!("HTTP server stopped"),
                    Err(e) => {
                        error!(error = %e, "HTTP server error");
                        return Err(AdminError::internal(format!("HTTP server error: {}", e)));
                    }
                }
            }
            _ = async {
                shutdown_notify.notified().await;
                info!(
                    timeout_secs = GRACEFUL_TIMEOUT.as_secs(),
                    "Waiting for connections to close (send signal again to force exit)..."
                );

                tokio::select! {
                    _ = tokio::time::sleep(GRACEFUL_TIMEOUT) => {
                        warn!("Graceful shutdown timeout, forcing exit");
                    }
                    _ = wait_for_signal() => {
                        warn!("Received second signal, forcing immediate exit");
                    }
                }
            } => {}
        }

        info!("Closing database connections");
        connections.close_all().await;

        Ok(())
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_signal() {
    let ctrl_c = signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
