//! Integration tests for the admin HTTP surface.
//!
//! Tests verify that:
//! - The selection endpoint is staff-only and redirects to the Referer or /admin/
//! - Only selectable databases are persisted in the session
//! - Change-lists read from the database selected in the session
//! - The spreadsheet export is limited to export-enabled entities and
//!   writes headers, amounts and day-first dates
//! - The opener policy header is dropped over plain HTTP

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use axum_extra::extract::cookie::Key;
use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use erp_admin_router::config::PoolOptions;
use erp_admin_router::db::{ConnectionManager, DbPool, QueryExecutor};
use erp_admin_router::models::{ConnectionConfig, DatabaseAlias, DatabaseCatalog};
use erp_admin_router::server::{AppState, StaffAuth, create_router};
use http_body_util::BodyExt;
use serde_json::Value as JsonValue;
use std::io::Cursor;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower::ServiceExt;

const STAFF_TOKEN: &str = "staff-token";

/// Create a SQLite database file that outlives the test function.
fn temp_db_url() -> String {
    let path = NamedTempFile::new()
        .unwrap()
        .into_temp_path()
        .keep()
        .unwrap();
    format!("sqlite:{}", path.to_str().unwrap())
}

async fn connect(manager: &ConnectionManager, alias: &str, name: &str, selectable: bool) {
    let config = ConnectionConfig::new(
        alias,
        name,
        temp_db_url(),
        selectable,
        PoolOptions::default(),
    )
    .unwrap();
    manager.connect(config).await.unwrap();
}

async fn seed(manager: &ConnectionManager, alias: &str, project_prefix: &str) {
    let DbPool::SQLite(pool) = manager.get_pool(&DatabaseAlias::from(alias)).await.unwrap() else {
        panic!("expected a SQLite pool");
    };
    for ddl in [
        "CREATE TABLE projetos_cadastro (codigo INTEGER PRIMARY KEY, nome TEXT, codint TEXT, inativo TEXT)",
        "CREATE TABLE movimentos_financeiros (id INTEGER PRIMARY KEY, detalhes_cnumtitulo TEXT, \
         detalhes_ccodcateg TEXT, detalhes_nvalortitulo REAL, detalhes_ddtvenc TEXT, \
         detalhes_ddtpagamento TEXT, detalhes_cstatus TEXT)",
    ] {
        sqlx::query(ddl).execute(&pool).await.unwrap();
    }
    for (codigo, nome) in [(1, "Alpha"), (2, "Beta"), (3, "Gamma")] {
        sqlx::query("INSERT INTO projetos_cadastro VALUES (?, ?, ?, 'N')")
            .bind(codigo)
            .bind(format!("{} {}", project_prefix, nome))
            .bind(format!("P{}", codigo))
            .execute(&pool)
            .await
            .unwrap();
    }
    sqlx::query(
        "INSERT INTO movimentos_financeiros VALUES \
         (1, 'T-001', '1.01', 150.75, '2024-03-05', NULL, 'A VENCER'), \
         (2, 'T-002', '1.02', 20.0, '2024-04-10', '2024-04-09', 'PAGO')",
    )
    .execute(&pool)
    .await
    .unwrap();
}

struct TestApp {
    router: Router,
}

impl TestApp {
    async fn new(staff_tokens: Vec<String>, debug: bool) -> Self {
        Self::build(staff_tokens, debug, "cdg").await
    }

    async fn build(staff_tokens: Vec<String>, debug: bool, selection_default: &str) -> Self {
        let manager = Arc::new(ConnectionManager::new());
        connect(&manager, "default", "Default", false).await;
        connect(&manager, "cdg", "CDG Matriz", true).await;
        connect(&manager, "filial2", "Filial 2", true).await;
        seed(&manager, "cdg", "CDG").await;
        seed(&manager, "filial2", "Filial").await;

        // "filial3" is selectable but never connected.
        let catalog = DatabaseCatalog::new(selection_default)
            .with_database("cdg", "CDG Matriz")
            .with_database("filial2", "Filial 2")
            .with_database("filial3", "Filial 3");

        let state = AppState::new(
            catalog,
            manager,
            QueryExecutor::new(),
            StaffAuth::from_tokens(staff_tokens).unwrap(),
            Key::generate(),
        )
        .with_debug(debug);

        Self {
            router: create_router(state),
        }
    }

    async fn with_staff() -> Self {
        Self::new(vec![STAFF_TOKEN.to_string()], false).await
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get_json(&self, uri: &str, cookie: Option<&str>) -> (StatusCode, JsonValue) {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let response = self.send(builder.body(Body::empty()).unwrap()).await;
        let status = response.status();
        (status, json_body(response).await)
    }

    /// POST the selection form; returns the response.
    async fn select(&self, database: &str, token: Option<&str>, referer: Option<&str>) -> Response {
        self.post_form(&format!("database={}", database), token, referer)
            .await
    }

    async fn post_form(&self, form: &str, token: Option<&str>, referer: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/admin/select-database/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(referer) = referer {
            builder = builder.header(header::REFERER, referer);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }

    async fn export(&self, slug: &str, body: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/admin/core/{}/export", slug))
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", STAFF_TOKEN));
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

async fn json_body(response: Response) -> JsonValue {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// `name=value` part of the session cookie set by a response.
fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("selected_database="))
        .and_then(|v| v.split(';').next())
        .map(String::from)
}

#[tokio::test]
async fn test_index_defaults_to_cdg() {
    let app = TestApp::with_staff().await;
    let (status, body) = app.get_json("/admin/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "cdg");
    assert_eq!(body["database_name"], "CDG Matriz");
    assert_eq!(body["available"].as_array().unwrap().len(), 3);
    let projects = body["entities"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["slug"] == "projects")
        .unwrap();
    assert_eq!(projects["database"], "cdg");
}

#[tokio::test]
async fn test_select_requires_staff_token() {
    let app = TestApp::with_staff().await;

    let response = app.select("filial2", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&response).is_none());

    let response = app.select("filial2", Some("wrong"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn test_select_rejected_without_configured_staff() {
    let app = TestApp::new(Vec::new(), false).await;
    let response = app.select("filial2", Some(STAFF_TOKEN), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_select_persists_known_database() {
    let app = TestApp::with_staff().await;
    let response = app
        .select("filial2", Some(STAFF_TOKEN), Some("/admin/core/projects/"))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/admin/core/projects/"
    );
    let cookie = session_cookie(&response).expect("session cookie should be set");
    assert!(body_bytes(response).await.is_empty());

    let (_, body) = app.get_json("/admin/", Some(&cookie)).await;
    assert_eq!(body["database"], "filial2");
    assert_eq!(body["database_name"], "Filial 2");
}

#[tokio::test]
async fn test_select_unknown_database_leaves_session_untouched() {
    let app = TestApp::with_staff().await;
    let response = app.select("unknown_db", Some(STAFF_TOKEN), None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/admin/");
    assert!(session_cookie(&response).is_none());

    let (_, body) = app.get_json("/admin/", None).await;
    assert_eq!(body["database"], "cdg");
}

#[tokio::test]
async fn test_select_without_field_uses_selection_default() {
    let app = TestApp::build(vec![STAFF_TOKEN.to_string()], false, "filial2").await;
    let response = app.post_form("", Some(STAFF_TOKEN), None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie(&response).expect("selection default should be stored");

    let (_, body) = app.get_json("/admin/", Some(&cookie)).await;
    assert_eq!(body["database"], "filial2");

    let app = TestApp::with_staff().await;
    let response = app.post_form("", Some(STAFF_TOKEN), None).await;
    let cookie = session_cookie(&response).unwrap();
    let (_, body) = app.get_json("/admin/", Some(&cookie)).await;
    assert_eq!(body["database"], "cdg");
}

#[tokio::test]
async fn test_select_unknown_database_keeps_previous_choice() {
    let app = TestApp::with_staff().await;
    let first = app.select("filial2", Some(STAFF_TOKEN), None).await;
    let cookie = session_cookie(&first).unwrap();

    let second = app.select("unknown_db", Some(STAFF_TOKEN), None).await;
    assert!(session_cookie(&second).is_none());

    let (_, body) = app.get_json("/admin/", Some(&cookie)).await;
    assert_eq!(body["database"], "filial2");
}

#[tokio::test]
async fn test_tampered_session_cookie_falls_back() {
    let app = TestApp::with_staff().await;
    let (_, body) = app
        .get_json("/admin/", Some("selected_database=filial2"))
        .await;
    assert_eq!(body["database"], "cdg");
}

#[tokio::test]
async fn test_changelist_follows_selected_database() {
    let app = TestApp::with_staff().await;

    let (status, body) = app.get_json("/admin/core/projects/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "cdg");
    assert_eq!(body["entity"], "projects");
    assert_eq!(body["total"], 3);
    assert_eq!(body["page_size"], 25);
    assert_eq!(body["rows"][0]["nome"], "CDG Alpha");

    let response = app.select("filial2", Some(STAFF_TOKEN), None).await;
    let cookie = session_cookie(&response).unwrap();
    let (_, body) = app
        .get_json("/admin/core/projects/?q=gamma", Some(&cookie))
        .await;
    assert_eq!(body["database"], "filial2");
    assert_eq!(body["total"], 1);
    assert_eq!(body["rows"][0]["nome"], "Filial Gamma");
}

#[tokio::test]
async fn test_changelist_unknown_entity() {
    let app = TestApp::with_staff().await;
    let (status, body) = app.get_json("/admin/core/users/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_changelist_on_unconnected_database_fails() {
    let app = TestApp::with_staff().await;
    let response = app.select("filial3", Some(STAFF_TOKEN), None).await;
    let cookie = session_cookie(&response).unwrap();

    let (status, body) = app
        .get_json("/admin/core/projects/", Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "connection_not_found");
}

#[tokio::test]
async fn test_export_selected_rows() {
    let app = TestApp::with_staff().await;
    let response = app
        .export("financial-movements", r#"{"ids": ["1", 2]}"#, None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"Financial Movements.xlsx\""
    );
    let bytes = body_bytes(response).await;
    assert!(bytes.starts_with(b"PK"));

    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
    let sheet = workbook.worksheet_range("Financial Movements").unwrap();
    let cell = |row: u32, col: u32| sheet.get_value((row, col)).cloned().unwrap_or(Data::Empty);

    assert_eq!(cell(0, 0), Data::String("ID".to_string()));
    assert_eq!(cell(0, 3), Data::String("Amount".to_string()));
    assert_eq!(cell(0, 4), Data::String("Due Date".to_string()));
    // Rows follow the list ordering: latest due date first.
    assert_eq!(cell(1, 1), Data::String("T-002".to_string()));
    assert_eq!(cell(1, 3), Data::Float(20.0));
    assert_eq!(cell(1, 4), Data::String("10/04/2024".to_string()));
    assert_eq!(cell(1, 5), Data::String("09/04/2024".to_string()));
    assert_eq!(cell(2, 1), Data::String("T-001".to_string()));
    assert_eq!(cell(2, 3), Data::Float(150.75));
    assert_eq!(cell(2, 4), Data::String("05/03/2024".to_string()));
    assert_eq!(cell(2, 5), Data::Empty);
}

#[tokio::test]
async fn test_export_rejects_non_integer_keys() {
    let app = TestApp::with_staff().await;
    let response = app
        .export("financial-movements", r#"{"ids": ["T-001"]}"#, None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_export_rejected_for_other_entities() {
    let app = TestApp::with_staff().await;
    let response = app.export("projects", r#"{"ids": [1]}"#, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_export_requires_selection() {
    let app = TestApp::with_staff().await;
    let response = app
        .export("financial-movements", r#"{"ids": []}"#, None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_export_requires_staff() {
    let app = TestApp::with_staff().await;
    let request = Request::builder()
        .method("POST")
        .uri("/admin/core/financial-movements/export")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"ids": [1]}"#))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_coop_stripped_over_plain_http() {
    let app = TestApp::with_staff().await;

    let response = app
        .send(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("cross-origin-opener-policy").is_none());

    let response = app
        .send(
            Request::builder()
                .uri("/health")
                .header("x-forwarded-proto", "https")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(
        response.headers().get("cross-origin-opener-policy").unwrap(),
        "same-origin"
    );
}

#[tokio::test]
async fn test_coop_stripped_in_debug_mode() {
    let app = TestApp::new(vec![STAFF_TOKEN.to_string()], true).await;
    let response = app
        .send(
            Request::builder()
                .uri("/admin/")
                .header("x-forwarded-proto", "https")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert!(response.headers().get("cross-origin-opener-policy").is_none());
    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
}
