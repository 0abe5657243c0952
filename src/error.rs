//! Error types for sqlbridge.
//!
//! All fallible operations return [`DbResult`]. Validation failures carry
//! enough context (table, column, expected/actual kind) for the host to
//! report the problem without re-deriving it, and transaction failures name
//! the index of the statement that aborted the unit.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// Missing or malformed connection string or pool settings. Fatal at
    /// startup; the service refuses to construct.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Schema for table '{table}' not found")]
    SchemaNotFound { table: String },

    #[error("Column '{column}' does not exist in table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Type mismatch for column '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    /// No connection available within the configured bounds. Never retried
    /// by the core; retry policy belongs to the caller.
    #[error("Connection pool exhausted: {message}")]
    PoolExhausted { message: String },

    /// Zero rows affected by an update or delete that targets one id.
    #[error("No entry found with id {id} in table '{table}'")]
    NotFound { table: String, id: i64 },

    /// The database rejected a statement.
    #[error("Statement failed: {message}")]
    Statement {
        message: String,
        /// e.g. "23000" for an integrity constraint violation
        sql_state: Option<String>,
    },

    /// A statement inside a multi-statement transaction failed; the whole
    /// unit was rolled back. `index` is the zero-based position of the
    /// failing statement.
    #[error("Transaction aborted: statement #{index} failed: {source}")]
    TransactionAborted { index: usize, source: Box<DbError> },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout { operation: String, elapsed_secs: u64 },
}

impl DbError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a schema-not-found error.
    pub fn schema_not_found(table: impl Into<String>) -> Self {
        Self::SchemaNotFound {
            table: table.into(),
        }
    }

    /// Create an unknown-column error.
    pub fn unknown_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Create a type-mismatch error.
    pub fn type_mismatch(
        column: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            column: column.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a pool-exhausted error.
    pub fn pool_exhausted(message: impl Into<String>) -> Self {
        Self::PoolExhausted {
            message: message.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(table: impl Into<String>, id: i64) -> Self {
        Self::NotFound {
            table: table.into(),
            id,
        }
    }

    /// Create a statement error without an SQLSTATE code.
    pub fn statement(message: impl Into<String>) -> Self {
        Self::Statement {
            message: message.into(),
            sql_state: None,
        }
    }

    /// Create a transaction-aborted error wrapping the underlying cause.
    pub fn transaction_aborted(index: usize, source: DbError) -> Self {
        Self::TransactionAborted {
            index,
            source: Box::new(source),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, elapsed_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    /// Whether a caller-side retry could plausibly succeed. The core itself
    /// never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PoolExhausted { .. } | Self::Timeout { .. })
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::configuration(msg.to_string()),
            sqlx::Error::Database(db_err) => {
                let sql_state = db_err.code().map(|c| c.to_string());
                DbError::Statement {
                    message: db_err.message().to_string(),
                    sql_state,
                }
            }
            sqlx::Error::PoolTimedOut => {
                DbError::pool_exhausted("no connection became available within the acquire timeout")
            }
            sqlx::Error::PoolClosed => DbError::pool_exhausted("connection pool is shut down"),
            sqlx::Error::Io(io_err) => DbError::statement(format!("I/O error: {io_err}")),
            sqlx::Error::Tls(tls_err) => DbError::statement(format!("TLS error: {tls_err}")),
            sqlx::Error::Protocol(msg) => DbError::statement(format!("protocol error: {msg}")),
            sqlx::Error::ColumnNotFound(col) => {
                DbError::statement(format!("column not found: {col}"))
            }
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::statement(format!("failed to decode column {index}: {source}"))
            }
            sqlx::Error::Decode(source) => DbError::statement(format!("decode error: {source}")),
            sqlx::Error::RowNotFound => DbError::statement("no rows returned"),
            sqlx::Error::WorkerCrashed => DbError::statement("database worker crashed"),
            other => DbError::statement(format!("database error: {other}")),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbError::unknown_column("users", "nickname");
        assert_eq!(
            err.to_string(),
            "Column 'nickname' does not exist in table 'users'"
        );
    }

    #[test]
    fn test_type_mismatch_names_column_and_kinds() {
        let err = DbError::type_mismatch("age", "int", "text");
        let msg = err.to_string();
        assert!(msg.contains("age"));
        assert!(msg.contains("expected int"));
        assert!(msg.contains("got text"));
    }

    #[test]
    fn test_transaction_aborted_reports_index_and_cause() {
        let cause = DbError::statement("syntax error near 'FRM'");
        let err = DbError::transaction_aborted(1, cause);
        let msg = err.to_string();
        assert!(msg.contains("statement #1"));
        assert!(msg.contains("syntax error"));
    }

    #[test]
    fn test_error_retryable() {
        assert!(DbError::pool_exhausted("full").is_retryable());
        assert!(DbError::timeout("query", 30).is_retryable());
        assert!(!DbError::not_found("users", 7).is_retryable());
        assert!(!DbError::schema_not_found("users").is_retryable());
    }

    #[test]
    fn test_pool_timeout_maps_to_pool_exhausted() {
        let err: DbError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DbError::PoolExhausted { .. }));
    }

    #[test]
    fn test_pool_closed_maps_to_pool_exhausted() {
        let err: DbError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, DbError::PoolExhausted { .. }));
    }

    #[test]
    fn test_row_not_found_maps_to_statement() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::Statement { .. }));
    }
}
