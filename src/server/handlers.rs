//! HTTP handlers for the admin endpoints.

use crate::admin::export::{XLSX_CONTENT_TYPE, content_disposition, export_workbook};
use crate::admin::listing::{ListParams, Page, load_page, load_selection};
use crate::admin::registry::{MODEL_ADMINS, ModelAdmin, find_by_slug};
use crate::error::{AdminError, AdminResult};
use crate::models::{DatabaseAlias, DatabaseChoice, QueryParam};
use crate::routing::RequestDatabase;
use crate::server::AppState;
use crate::server::middleware::SESSION_DATABASE_COOKIE;
use axum::{
    Extension, Form, Json,
    extract::{Path, Query, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use tracing::{info, warn};

const ADMIN_INDEX: &str = "/admin/";

#[derive(Debug, Serialize)]
pub struct EntitySummary {
    pub slug: &'static str,
    pub name: &'static str,
    pub entity: String,
    /// Connection serving this entity for the current request.
    pub database: DatabaseAlias,
    pub export_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct AdminIndex {
    pub database: DatabaseAlias,
    pub database_name: String,
    pub available: Vec<DatabaseChoice>,
    pub entities: Vec<EntitySummary>,
}

/// `GET /admin/`
pub async fn index(
    State(state): State<AppState>,
    Extension(selection): Extension<RequestDatabase>,
) -> Json<AdminIndex> {
    let entities = MODEL_ADMINS
        .iter()
        .map(|admin| EntitySummary {
            slug: admin.slug,
            name: admin.verbose_name_plural,
            entity: admin.entity.to_string(),
            database: state.router.db_for_read_in(admin.entity, &selection),
            export_enabled: admin.export_enabled,
        })
        .collect();

    Json(AdminIndex {
        database: selection.alias,
        database_name: selection.name,
        available: selection.available,
        entities,
    })
}

/// `GET /admin/databases`
pub async fn databases(Extension(selection): Extension<RequestDatabase>) -> Json<JsonValue> {
    Json(json!({
        "current": selection.alias,
        "current_name": selection.name,
        "databases": selection.available,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SelectDatabaseForm {
    pub database: Option<String>,
}

/// `POST /admin/select-database/`
///
/// Persists the choice in the session only when it names a selectable
/// database, then redirects back to the referring page.
pub async fn select_database(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    headers: HeaderMap,
    Form(form): Form<SelectDatabaseForm>,
) -> (SignedCookieJar, Redirect) {
    let requested = form
        .database
        .unwrap_or_else(|| state.catalog.selection_default().to_string());

    let jar = if state.catalog.contains(&requested) {
        info!(database = %requested, "Database selected");
        let cookie = Cookie::build((SESSION_DATABASE_COOKIE, requested))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build();
        jar.add(cookie)
    } else {
        warn!(database = %requested, "Ignoring selection of unknown database");
        jar
    };

    let target = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(ADMIN_INDEX);

    (jar, Redirect::to(target))
}

#[derive(Debug, Serialize)]
pub struct ChangeList {
    pub database: DatabaseAlias,
    pub database_name: String,
    pub entity: &'static str,
    #[serde(flatten)]
    pub page: Page,
}

fn admin_for(slug: &str) -> AdminResult<&'static ModelAdmin> {
    find_by_slug(slug).ok_or_else(|| AdminError::entity_not_found(format!("core.{}", slug)))
}

/// `GET /admin/core/{slug}/`
pub async fn changelist(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Extension(selection): Extension<RequestDatabase>,
    Query(params): Query<ListParams>,
) -> AdminResult<Json<ChangeList>> {
    let admin = admin_for(&slug)?;
    let alias = state.router.db_for_read_in(admin.entity, &selection);
    let pool = state.connections.get_pool(&alias).await?;
    let page = load_page(&state.executor, &pool, admin, &params).await?;

    Ok(Json(ChangeList {
        database_name: state.catalog.display_name(alias.as_str()),
        database: alias,
        entity: admin.slug,
        page,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub ids: Vec<JsonValue>,
}

/// `POST /admin/core/{slug}/export`
pub async fn export(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Extension(selection): Extension<RequestDatabase>,
    Json(request): Json<ExportRequest>,
) -> AdminResult<Response> {
    let admin = admin_for(&slug)?;
    if !admin.export_enabled {
        return Err(AdminError::entity_not_found(format!("export for core.{}", slug)));
    }

    let ids: Vec<QueryParam> = request.ids.iter().map(QueryParam::from_json).collect();
    let alias = state.router.db_for_read_in(admin.entity, &selection);
    let pool = state.connections.get_pool(&alias).await?;
    let rows = load_selection(&state.executor, &pool, admin, &ids).await?;
    let workbook = export_workbook(admin, &rows)?;

    info!(
        entity = %admin.entity,
        database = %alias,
        rows = rows.len(),
        bytes = workbook.len(),
        "Exported selection"
    );

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(admin)),
        ],
        workbook,
    )
        .into_response())
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<JsonValue> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "connections": state.connections.connection_count().await,
    }))
}
