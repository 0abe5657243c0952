//! Multi-statement transaction execution.
//!
//! A transaction reserves exactly one pooled connection for its whole
//! lifetime, runs statements strictly in the caller-supplied order, and is
//! all-or-nothing: the first failing statement rolls back everything before
//! it and stops the unit. The lease returns to the pool after
//! commit/rollback by scope exit, on every path.

use crate::db::classify::returns_rows;
use crate::db::params::bind_param;
use crate::db::pool::DbPool;
use crate::db::rows::row_to_map;
use crate::error::{DbError, DbResult};
use crate::models::{MutationSummary, QueryOutcome, SqlParam};
use sqlx::{Connection, MySql, Transaction};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Runs ordered statement sequences as single atomic units.
#[derive(Debug, Clone)]
pub struct TransactionCoordinator {
    statement_timeout: Duration,
}

impl TransactionCoordinator {
    pub fn new(statement_timeout: Duration) -> Self {
        Self { statement_timeout }
    }

    /// Execute `statements` in order inside one transaction.
    ///
    /// `params` entries pair with statements by index; a missing entry means
    /// an empty parameter list. Returns the per-statement outcomes in order.
    /// On the first failure the transaction is rolled back, later statements
    /// are never attempted, and the error names the failing index. A
    /// rollback failure is logged but the original failure is what
    /// propagates.
    pub async fn run(
        &self,
        pool: &DbPool,
        statements: &[String],
        params: &[Vec<SqlParam>],
    ) -> DbResult<Vec<QueryOutcome>> {
        let mut lease = pool.acquire().await?;
        let mut tx = lease.as_mut().begin().await.map_err(DbError::from)?;
        debug!(statements = statements.len(), "Transaction begun");

        let mut results = Vec::with_capacity(statements.len());
        for (index, sql) in statements.iter().enumerate() {
            let stmt_params = params.get(index).map(Vec::as_slice).unwrap_or(&[]);
            match self.run_statement(&mut tx, sql, stmt_params).await {
                Ok(outcome) => results.push(outcome),
                Err(cause) => {
                    warn!(index, error = %cause, "Transaction statement failed, rolling back");
                    if let Err(rollback_err) = tx.rollback().await {
                        // surface the original failure, not the rollback error
                        warn!(error = %rollback_err, "Rollback failed");
                    }
                    return Err(DbError::transaction_aborted(index, cause));
                }
            }
        }

        tx.commit().await.map_err(DbError::from)?;
        debug!(statements = statements.len(), "Transaction committed");
        Ok(results)
    }

    async fn run_statement(
        &self,
        tx: &mut Transaction<'_, MySql>,
        sql: &str,
        params: &[SqlParam],
    ) -> DbResult<QueryOutcome> {
        debug!(sql = %sql, params = params.len(), "Executing in transaction");
        if returns_rows(sql) {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            let rows = self.with_timeout(query.fetch_all(&mut **tx)).await?;
            Ok(QueryOutcome::Rows(rows.iter().map(row_to_map).collect()))
        } else if params.is_empty() {
            let result = self
                .with_timeout(sqlx::raw_sql(sql).execute(&mut **tx))
                .await?;
            Ok(QueryOutcome::Mutation(MutationSummary::new(
                result.last_insert_id(),
                result.rows_affected(),
            )))
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            let result = self.with_timeout(query.execute(&mut **tx)).await?;
            Ok(QueryOutcome::Mutation(MutationSummary::new(
                result.last_insert_id(),
                result.rows_affected(),
            )))
        }
    }

    async fn with_timeout<T, F>(&self, fut: F) -> DbResult<T>
    where
        F: std::future::Future<Output = Result<T, sqlx::Error>>,
    {
        match timeout(self.statement_timeout, fut).await {
            Ok(result) => result.map_err(DbError::from),
            Err(_) => Err(DbError::timeout(
                "transaction statement",
                self.statement_timeout.as_secs(),
            )),
        }
    }
}
