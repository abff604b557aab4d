//! Query execution engine.
//!
//! Runs the read queries built by the admin layer against a routed pool,
//! with a timeout, and converts rows to JSON maps.

use crate::db::params::{
    bind_mysql_param, bind_mysql_scalar, bind_postgres_param, bind_postgres_scalar,
    bind_sqlite_param, bind_sqlite_scalar,
};
use crate::db::pool::DbPool;
use crate::db::types::RowToJson;
use crate::error::{AdminError, AdminResult};
use crate::models::{DEFAULT_QUERY_TIMEOUT_SECS, QueryParam};
use serde_json::{Map, Value as JsonValue};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::debug;

/// A row as column name → JSON value.
pub type JsonRow = Map<String, JsonValue>;

/// Query executor that handles database query execution.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    timeout: Duration,
}

impl QueryExecutor {
    /// Create a new query executor with default settings.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Execute a SELECT and return every row.
    pub async fn fetch_rows(
        &self,
        pool: &DbPool,
        sql: &str,
        params: &[QueryParam],
    ) -> AdminResult<Vec<JsonRow>> {
        let start = Instant::now();
        debug!(sql = %sql, params = params.len(), "Executing query");

        let rows = match pool {
            DbPool::MySql(p) => {
                let query = params
                    .iter()
                    .fold(sqlx::query(sql), |q, param| bind_mysql_param(q, param));
                let rows = self.run(query.fetch_all(p)).await?;
                rows.iter().map(RowToJson::to_json_map).collect::<Vec<_>>()
            }
            DbPool::Postgres(p) => {
                let query = params
                    .iter()
                    .fold(sqlx::query(sql), |q, param| bind_postgres_param(q, param));
                let rows = self.run(query.fetch_all(p)).await?;
                rows.iter().map(RowToJson::to_json_map).collect::<Vec<_>>()
            }
            DbPool::SQLite(p) => {
                let query = params
                    .iter()
                    .fold(sqlx::query(sql), |q, param| bind_sqlite_param(q, param));
                let rows = self.run(query.fetch_all(p)).await?;
                rows.iter().map(RowToJson::to_json_map).collect::<Vec<_>>()
            }
        };

        debug!(
            rows = rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query completed"
        );
        Ok(rows)
    }

    /// Execute a `SELECT COUNT(*)` style query.
    pub async fn fetch_count(
        &self,
        pool: &DbPool,
        sql: &str,
        params: &[QueryParam],
    ) -> AdminResult<i64> {
        debug!(sql = %sql, params = params.len(), "Executing count");

        match pool {
            DbPool::MySql(p) => {
                let query = params.iter().fold(
                    sqlx::query_scalar::<_, i64>(sql),
                    |q, param| bind_mysql_scalar(q, param),
                );
                self.run(query.fetch_one(p)).await
            }
            DbPool::Postgres(p) => {
                let query = params.iter().fold(
                    sqlx::query_scalar::<_, i64>(sql),
                    |q, param| bind_postgres_scalar(q, param),
                );
                self.run(query.fetch_one(p)).await
            }
            DbPool::SQLite(p) => {
                let query = params.iter().fold(
                    sqlx::query_scalar::<_, i64>(sql),
                    |q, param| bind_sqlite_scalar(q, param),
                );
                self.run(query.fetch_one(p)).await
            }
        }
    }

    async fn run<T>(&self, fut: impl Future<Output = Result<T, sqlx::Error>>) -> AdminResult<T> {
        match timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(AdminError::from),
            Err(_) => Err(AdminError::timeout("query", self.timeout.as_secs())),
        }
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn sqlite_pool() -> DbPool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE projetos_cadastro (codigo INTEGER PRIMARY KEY, nome TEXT, codint TEXT, inativo BOOLEAN)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO projetos_cadastro VALUES (1, 'Obra Norte', 'P-01', 0), (2, 'Obra Sul', NULL, 1)",
        )
        .execute(&pool)
        .await
        .unwrap();
        DbPool::SQLite(pool)
    }

    #[tokio::test]
    async fn test_fetch_rows_to_json() {
        let pool = sqlite_pool().await;
        let executor = QueryExecutor::new();
        let rows = executor
            .fetch_rows(
                &pool,
                "SELECT codigo, nome, codint, inativo FROM projetos_cadastro ORDER BY codigo",
                &[],
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["codigo"], JsonValue::from(1));
        assert_eq!(rows[0]["nome"], JsonValue::from("Obra Norte"));
        assert_eq!(rows[1]["codint"], JsonValue::Null);
        assert_eq!(rows[1]["inativo"], JsonValue::Bool(true));
    }

    #[tokio::test]
    async fn test_fetch_rows_with_params() {
        let pool = sqlite_pool().await;
        let rows = QueryExecutor::new()
            .fetch_rows(
                &pool,
                "SELECT nome FROM projetos_cadastro WHERE codigo = ?",
                &[QueryParam::Int(2)],
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["nome"], JsonValue::from("Obra Sul"));
    }

    #[tokio::test]
    async fn test_fetch_count() {
        let pool = sqlite_pool().await;
        let count = QueryExecutor::new()
            .fetch_count(
                &pool,
                "SELECT COUNT(*) FROM projetos_cadastro WHERE nome LIKE ?",
                &[QueryParam::from("%Norte%")],
            )
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_missing_table_is_database_error() {
        let pool = sqlite_pool().await;
        let err = QueryExecutor::new()
            .fetch_rows(&pool, "SELECT * FROM clientes_cadastro", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Database { .. }));
    }
}
