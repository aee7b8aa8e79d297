use std::sync::Arc;

use sqlx::sqlite::{SqliteArguments, SqliteQueryResult, SqliteRow};
use sqlx::{FromRow, Sqlite, SqlitePool};

use fitpact_domain::shared::DomainError;

/// Shared helpers for SQLite repositories: run queries against the pool
/// and map driver errors to `DomainError::Repository` with an operation
/// label for diagnostics.
pub struct SqliteRepositoryBase {
    pool: Arc<SqlitePool>,
}

impl SqliteRepositoryBase {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn execute<'q>(
        &self,
        query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
        context: &str,
    ) -> Result<SqliteQueryResult, DomainError> {
        query
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| DomainError::Repository(format!("{context}: {e}")))
    }

    pub async fn fetch_optional<'q, T>(
        &self,
        query: sqlx::query::QueryAs<'q, Sqlite, T, SqliteArguments<'q>>,
        context: &str,
    ) -> Result<Option<T>, DomainError>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        query
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(|e| DomainError::Repository(format!("{context}: {e}")))
    }

    pub async fn fetch_all<'q, T>(
        &self,
        query: sqlx::query::QueryAs<'q, Sqlite, T, SqliteArguments<'q>>,
        context: &str,
    ) -> Result<Vec<T>, DomainError>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        query
            .fetch_all(self.pool.as_ref())
            .await
            .map_err(|e| DomainError::Repository(format!("{context}: {e}")))
    }
}
