//! Statement execution engine.
//!
//! Every operation follows the same connection lifecycle: validate first
//! (where row data is involved), then lease exactly one connection, execute
//! exactly one statement, and let the lease return on scope exit, so the
//! connection is released on success, on error, and on panic alike.
//! Identifiers are backtick-quoted when interpolated into SQL text; values
//! are always bound positionally.

use crate::db::classify::returns_rows;
use crate::db::params::bind_param;
use crate::db::pool::DbPool;
use crate::db::rows::row_to_map;
use crate::error::{DbError, DbResult};
use crate::models::{EntryData, MutationSummary, QueryOutcome, Row, SqlParam};
use crate::schema::{SchemaCache, quote_ident};
use crate::validate::validate_entry;
use sqlx::mysql::MySqlQueryResult;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Executes single statements over leased pool connections.
#[derive(Debug, Clone)]
pub struct StatementExecutor {
    cache: Arc<SchemaCache>,
    statement_timeout: Duration,
}

impl StatementExecutor {
    pub fn new(cache: Arc<SchemaCache>, statement_timeout: Duration) -> Self {
        Self {
            cache,
            statement_timeout,
        }
    }

    /// Look up the schema and validate row data against it. Runs before any
    /// connection is acquired.
    fn validate(&self, table: &str, entry: &EntryData) -> DbResult<()> {
        let columns = self
            .cache
            .lookup(table)
            .ok_or_else(|| DbError::schema_not_found(table))?;
        validate_entry(table, &columns, entry)
    }

    /// Insert one row, binding values in column order.
    pub async fn insert(
        &self,
        pool: &DbPool,
        table: &str,
        entry: &EntryData,
    ) -> DbResult<MutationSummary> {
        self.validate(table, entry)?;
        let sql = build_insert(table, entry);
        let params: Vec<SqlParam> = entry.values().cloned().collect();
        let result = self.run_execute(pool, &sql, &params).await?;
        Ok(MutationSummary::new(
            result.last_insert_id(),
            result.rows_affected(),
        ))
    }

    /// Update the row with the given id. `NotFound` when nothing matched.
    pub async fn update(
        &self,
        pool: &DbPool,
        table: &str,
        entry: &EntryData,
        id: i64,
    ) -> DbResult<MutationSummary> {
        self.validate(table, entry)?;
        let sql = build_update(table, entry);
        let mut params: Vec<SqlParam> = entry.values().cloned().collect();
        params.push(SqlParam::Int(id));
        let result = self.run_execute(pool, &sql, &params).await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found(table, id));
        }
        Ok(MutationSummary::new(
            result.last_insert_id(),
            result.rows_affected(),
        ))
    }

    /// Delete the row with the given id. `NotFound` when nothing matched.
    pub async fn delete(&self, pool: &DbPool, table: &str, id: i64) -> DbResult<MutationSummary> {
        let sql = build_delete(table);
        let params = [SqlParam::Int(id)];
        let result = self.run_execute(pool, &sql, &params).await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found(table, id));
        }
        Ok(MutationSummary::new(
            result.last_insert_id(),
            result.rows_affected(),
        ))
    }

    /// Fetch the full table, optionally projecting a column subset.
    pub async fn select_all(
        &self,
        pool: &DbPool,
        table: &str,
        columns: Option<&[&str]>,
    ) -> DbResult<Vec<Row>> {
        let sql = build_select_all(table, columns);
        self.run_fetch(pool, &sql, &[]).await
    }

    /// Fetch rows matching all equality predicates in `entry`.
    pub async fn select_where(
        &self,
        pool: &DbPool,
        table: &str,
        entry: &EntryData,
        columns: Option<&[&str]>,
    ) -> DbResult<Vec<Row>> {
        self.validate(table, entry)?;
        let sql = build_select_where(table, columns, entry, false);
        let params: Vec<SqlParam> = entry.values().cloned().collect();
        self.run_fetch(pool, &sql, &params).await
    }

    /// Fetch the first matching row; `None` is the no-match result, never an
    /// error.
    pub async fn select_first_where(
        &self,
        pool: &DbPool,
        table: &str,
        entry: Option<&EntryData>,
        columns: Option<&[&str]>,
    ) -> DbResult<Option<Row>> {
        if let Some(entry) = entry {
            self.validate(table, entry)?;
        }
        let unconditional = EntryData::new();
        let entry = entry.unwrap_or(&unconditional);
        let sql = build_select_where(table, columns, entry, true);
        let params: Vec<SqlParam> = entry.values().cloned().collect();

        debug!(sql = %sql, "Executing single-row query");
        let mut conn = pool.acquire().await?;
        let mut query = sqlx::query(&sql);
        for param in &params {
            query = bind_param(query, param);
        }
        let fut = query.fetch_optional(conn.as_mut());
        let row = self.with_timeout("query execution", fut).await?;
        Ok(row.map(|r| row_to_map(&r)))
    }

    /// Execute caller-supplied SQL, normalizing the result shape: a row set
    /// for row-returning statements, `{insert_id, affected_rows}` otherwise.
    /// No schema validation; the caller owns correctness.
    pub async fn raw_query(
        &self,
        pool: &DbPool,
        sql: &str,
        params: &[SqlParam],
    ) -> DbResult<QueryOutcome> {
        if returns_rows(sql) {
            Ok(QueryOutcome::Rows(self.run_fetch(pool, sql, params).await?))
        } else {
            let result = self.run_execute(pool, sql, params).await?;
            Ok(QueryOutcome::Mutation(MutationSummary::new(
                result.last_insert_id(),
                result.rows_affected(),
            )))
        }
    }

    /// Execute through the driver's prepared-statement path, for statements
    /// reused verbatim with different bindings.
    pub async fn prepared(
        &self,
        pool: &DbPool,
        sql: &str,
        params: &[SqlParam],
    ) -> DbResult<Vec<Row>> {
        debug!(sql = %sql, params = params.len(), "Executing prepared statement");
        let mut conn = pool.acquire().await?;
        let mut query = sqlx::query(sql).persistent(true);
        for param in params {
            query = bind_param(query, param);
        }
        let fut = query.fetch_all(conn.as_mut());
        let rows = self.with_timeout("prepared statement", fut).await?;
        Ok(rows.iter().map(row_to_map).collect())
    }

    /// Execute one mutating statement over a fresh lease.
    async fn run_execute(
        &self,
        pool: &DbPool,
        sql: &str,
        params: &[SqlParam],
    ) -> DbResult<MySqlQueryResult> {
        debug!(sql = %sql, params = params.len(), "Executing statement");
        let mut conn = pool.acquire().await?;
        if params.is_empty() {
            // Unprepared path; DDL and similar statements cannot be prepared.
            let fut = sqlx::raw_sql(sql).execute(conn.as_mut());
            self.with_timeout("statement execution", fut).await
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            let fut = query.execute(conn.as_mut());
            self.with_timeout("statement execution", fut).await
        }
    }

    /// Fetch a row set over a fresh lease.
    async fn run_fetch(&self, pool: &DbPool, sql: &str, params: &[SqlParam]) -> DbResult<Vec<Row>> {
        debug!(sql = %sql, params = params.len(), "Executing query");
        let mut conn = pool.acquire().await?;
        let rows = if params.is_empty() {
            let fut = sqlx::raw_sql(sql).fetch_all(conn.as_mut());
            self.with_timeout("query execution", fut).await?
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            let fut = query.fetch_all(conn.as_mut());
            self.with_timeout("query execution", fut).await?
        };
        Ok(rows.iter().map(row_to_map).collect())
    }

    async fn with_timeout<T, F>(&self, operation: &str, fut: F) -> DbResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match timeout(self.statement_timeout, fut).await {
            Ok(result) => result.map_err(DbError::from),
            Err(_) => Err(DbError::timeout(operation, self.statement_timeout.as_secs())),
        }
    }
}

// =============================================================================
// Statement builders
// =============================================================================

fn column_list(columns: Option<&[&str]>) -> String {
    match columns {
        Some(cols) if !cols.is_empty() => cols
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", "),
        _ => "*".to_string(),
    }
}

fn build_insert(table: &str, entry: &EntryData) -> String {
    let columns: Vec<String> = entry.columns().map(quote_ident).collect();
    let placeholders = vec!["?"; entry.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        columns.join(", "),
        placeholders
    )
}

fn build_update(table: &str, entry: &EntryData) -> String {
    let assignments: Vec<String> = entry
        .columns()
        .map(|c| format!("{} = ?", quote_ident(c)))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE `id` = ?",
        quote_ident(table),
        assignments.join(", ")
    )
}

fn build_delete(table: &str) -> String {
    format!("DELETE FROM {} WHERE `id` = ?", quote_ident(table))
}

fn build_select_all(table: &str, columns: Option<&[&str]>) -> String {
    format!("SELECT {} FROM {}", column_list(columns), quote_ident(table))
}

fn build_select_where(
    table: &str,
    columns: Option<&[&str]>,
    entry: &EntryData,
    limit_one: bool,
) -> String {
    let predicates: Vec<String> = entry
        .columns()
        .map(|c| format!("{} = ?", quote_ident(c)))
        .collect();
    let conditions = if predicates.is_empty() {
        "1=1".to_string()
    } else {
        predicates.join(" AND ")
    };
    let mut sql = format!(
        "SELECT {} FROM {} WHERE {}",
        column_list(columns),
        quote_ident(table),
        conditions
    );
    if limit_one {
        sql.push_str(" LIMIT 1");
    }
    sql
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> EntryData {
        EntryData::new().set("name", "Alice").set("age", 30)
    }

    #[test]
    fn test_build_insert() {
        let sql = build_insert("users", &sample_entry());
        assert_eq!(sql, "INSERT INTO `users` (`name`, `age`) VALUES (?, ?)");
    }

    #[test]
    fn test_build_update_binds_id_last() {
        let sql = build_update("users", &sample_entry());
        assert_eq!(
            sql,
            "UPDATE `users` SET `name` = ?, `age` = ? WHERE `id` = ?"
        );
    }

    #[test]
    fn test_build_delete() {
        assert_eq!(build_delete("users"), "DELETE FROM `users` WHERE `id` = ?");
    }

    #[test]
    fn test_build_select_all() {
        assert_eq!(build_select_all("users", None), "SELECT * FROM `users`");
        assert_eq!(
            build_select_all("users", Some(&["id", "name"])),
            "SELECT `id`, `name` FROM `users`"
        );
        // empty projection falls back to *
        assert_eq!(build_select_all("users", Some(&[])), "SELECT * FROM `users`");
    }

    #[test]
    fn test_build_select_where() {
        let sql = build_select_where("users", None, &sample_entry(), false);
        assert_eq!(
            sql,
            "SELECT * FROM `users` WHERE `name` = ? AND `age` = ?"
        );
    }

    #[test]
    fn test_build_select_where_empty_predicates() {
        let sql = build_select_where("users", None, &EntryData::new(), true);
        assert_eq!(sql, "SELECT * FROM `users` WHERE 1=1 LIMIT 1");
    }

    #[test]
    fn test_executor_validates_against_cache() {
        let cache = Arc::new(SchemaCache::new());
        cache.register(
            "users",
            vec![crate::models::ColumnDef::new("name", "VARCHAR(50)")],
        );
        let executor = StatementExecutor::new(cache, Duration::from_secs(30));

        assert!(executor.validate("users", &EntryData::new().set("name", "A")).is_ok());
        assert!(matches!(
            executor.validate("users", &EntryData::new().set("ghost", "A")),
            Err(DbError::UnknownColumn { .. })
        ));
        assert!(matches!(
            executor.validate("missing", &EntryData::new()),
            Err(DbError::SchemaNotFound { .. })
        ));
    }
}
