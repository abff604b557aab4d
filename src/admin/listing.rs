//! Change-list query building and loading.
//!
//! Builds dialect-specific SQL for a `ModelAdmin`: search over the search
//! fields, ordering, pagination, and the `pk IN (...)` selection used by the
//! export action.

use crate::admin::registry::ModelAdmin;
use crate::db::{DbPool, JsonRow, QueryExecutor};
use crate::error::{AdminError, AdminResult};
use crate::models::{DatabaseType, MAX_EXPORT_IDS, QueryParam};
use serde::{Deserialize, Serialize};

/// Escape character used in LIKE patterns on every backend.
const LIKE_ESCAPE: char = '!';

/// Query string of the change-list view.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    /// Search text; whitespace-separated terms must all match.
    #[serde(default)]
    pub q: Option<String>,
    /// 1-based page number.
    #[serde(default)]
    pub p: Option<u32>,
}

impl ListParams {
    pub fn page(&self) -> u32 {
        self.p.unwrap_or(1).max(1)
    }

    pub fn terms(&self) -> Vec<&str> {
        self.q
            .as_deref()
            .map(|q| q.split_whitespace().collect())
            .unwrap_or_default()
    }
}

/// SQL plus its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<QueryParam>,
}

/// One page of a change-list.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
    pub rows: Vec<JsonRow>,
}

/// Quote an identifier for the given backend.
pub fn quote_ident(db: DatabaseType, ident: &str) -> String {
    match db {
        DatabaseType::MySQL => format!("`{}`", ident.replace('`', "``")),
        DatabaseType::PostgreSQL | DatabaseType::SQLite => {
            format!("\"{}\"", ident.replace('"', "\"\""))
        }
    }
}

fn placeholder(db: DatabaseType, index: usize) -> String {
    match db {
        DatabaseType::PostgreSQL => format!("${}", index),
        DatabaseType::MySQL | DatabaseType::SQLite => "?".to_string(),
    }
}

/// Case-insensitive containment test for one column.
fn search_predicate(db: DatabaseType, column: &str, index: usize) -> String {
    let column = quote_ident(db, column);
    let ph = placeholder(db, index);
    match db {
        DatabaseType::PostgreSQL => {
            format!("CAST({column} AS TEXT) ILIKE {ph} ESCAPE '{LIKE_ESCAPE}'")
        }
        DatabaseType::MySQL => format!("CAST({column} AS CHAR) LIKE {ph} ESCAPE '{LIKE_ESCAPE}'"),
        DatabaseType::SQLite => format!("CAST({column} AS TEXT) LIKE {ph} ESCAPE '{LIKE_ESCAPE}'"),
    }
}

/// Wrap a search term as a `%term%` pattern with LIKE wildcards escaped.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if ch == LIKE_ESCAPE || ch == '%' || ch == '_' {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn select_list(admin: &ModelAdmin, db: DatabaseType) -> String {
    admin
        .columns
        .iter()
        .map(|c| quote_ident(db, c.field))
        .collect::<Vec<_>>()
        .join(", ")
}

fn order_by(admin: &ModelAdmin, db: DatabaseType) -> String {
    let keys = admin
        .sort_keys()
        .into_iter()
        .map(|(field, dir)| format!("{} {}", quote_ident(db, field), dir.as_sql()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(" ORDER BY {}", keys)
}

/// WHERE clause for the search terms: every term must match some search field.
fn where_clause(admin: &ModelAdmin, db: DatabaseType, terms: &[&str]) -> BuiltQuery {
    if terms.is_empty() || !admin.is_searchable() {
        return BuiltQuery {
            sql: String::new(),
            params: Vec::new(),
        };
    }

    let mut params = Vec::new();
    let mut groups = Vec::with_capacity(terms.len());
    for term in terms {
        let pattern = like_pattern(term);
        let mut ors = Vec::with_capacity(admin.search_fields.len());
        for field in admin.search_fields {
            params.push(QueryParam::String(pattern.clone()));
            ors.push(search_predicate(db, field, params.len()));
        }
        groups.push(format!("({})", ors.join(" OR ")));
    }

    BuiltQuery {
        sql: format!(" WHERE {}", groups.join(" AND ")),
        params,
    }
}

/// Build the `COUNT(*)` query for a search.
pub fn count_query(admin: &ModelAdmin, db: DatabaseType, params: &ListParams) -> BuiltQuery {
    let filter = where_clause(admin, db, &params.terms());
    BuiltQuery {
        sql: format!(
            "SELECT COUNT(*) FROM {}{}",
            quote_ident(db, admin.table()),
            filter.sql
        ),
        params: filter.params,
    }
}

/// Build the query for one page of a search.
pub fn page_query(admin: &ModelAdmin, db: DatabaseType, params: &ListParams) -> BuiltQuery {
    let filter = where_clause(admin, db, &params.terms());
    let page_size = u64::from(admin.page_size);
    let offset = u64::from(params.page() - 1) * page_size;
    BuiltQuery {
        sql: format!(
            "SELECT {} FROM {}{}{} LIMIT {} OFFSET {}",
            select_list(admin, db),
            quote_ident(db, admin.table()),
            filter.sql,
            order_by(admin, db),
            page_size,
            offset
        ),
        params: filter.params,
    }
}

/// Build the query selecting rows by primary key, in list order.
pub fn selection_query(
    admin: &ModelAdmin,
    db: DatabaseType,
    ids: &[QueryParam],
) -> AdminResult<BuiltQuery> {
    if ids.is_empty() {
        return Err(AdminError::invalid_input("No rows selected"));
    }
    if ids.len() > MAX_EXPORT_IDS {
        return Err(AdminError::invalid_input(format!(
            "Too many rows selected: {} (maximum {})",
            ids.len(),
            MAX_EXPORT_IDS
        )));
    }
    let keys = ids.iter().map(key_param).collect::<AdminResult<Vec<_>>>()?;

    let placeholders = (1..=ids.len())
        .map(|i| placeholder(db, i))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(BuiltQuery {
        sql: format!(
            "SELECT {} FROM {} WHERE {} IN ({}){}",
            select_list(admin, db),
            quote_ident(db, admin.table()),
            quote_ident(db, admin.primary_key),
            placeholders,
            order_by(admin, db)
        ),
        params: keys,
    })
}

/// Registered primary keys are integers. Form posts send them as strings,
/// which are bound as integers so the comparison type-checks on PostgreSQL.
fn key_param(param: &QueryParam) -> AdminResult<QueryParam> {
    match param {
        QueryParam::Int(v) => Ok(QueryParam::Int(*v)),
        QueryParam::String(s) => s.trim().parse::<i64>().map(QueryParam::Int).map_err(|_| {
            AdminError::invalid_input(format!("Primary key is not an integer: {:?}", s))
        }),
        other => Err(AdminError::invalid_input(format!(
            "Primary keys must be numbers or strings, got {}",
            other.type_name()
        ))),
    }
}

/// Load one change-list page from `pool`.
pub async fn load_page(
    executor: &QueryExecutor,
    pool: &DbPool,
    admin: &ModelAdmin,
    params: &ListParams,
) -> AdminResult<Page> {
    let db = pool.db_type();
    let count = count_query(admin, db, params);
    let total = executor
        .fetch_count(pool, &count.sql, &count.params)
        .await?;
    let page = page_query(admin, db, params);
    let rows = executor.fetch_rows(pool, &page.sql, &page.params).await?;

    Ok(Page {
        page: params.page(),
        page_size: admin.page_size,
        total,
        rows,
    })
}

/// Load the rows selected for export.
pub async fn load_selection(
    executor: &QueryExecutor,
    pool: &DbPool,
    admin: &ModelAdmin,
    ids: &[QueryParam],
) -> AdminResult<Vec<JsonRow>> {
    let query = selection_query(admin, pool.db_type(), ids)?;
    executor.fetch_rows(pool, &query.sql, &query.params).await
}
