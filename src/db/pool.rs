//! Connection pool management.
//!
//! Wraps a `sqlx::MySqlPool` and layers on the admission semantics the
//! driver does not provide: a bounded waiting queue. The pool is the sole
//! owner of network resources; callers hold connections only through
//! [`PooledConnection`] leases, which return the connection on drop so
//! release happens on every exit path by construction.

use crate::config::ConnectionSettings;
use crate::error::{DbError, DbResult};
use crate::models::PoolStatus;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{MySql, MySqlConnection, MySqlPool};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::info;

/// Bounded MySQL connection pool.
#[derive(Debug)]
pub struct DbPool {
    inner: MySqlPool,
    /// Admission gate; `None` when queueing is unbounded.
    gate: Option<Arc<Semaphore>>,
    connection_limit: u32,
    queue_limit: u32,
}

/// Admission gate for acquisition. Permits cover the connections themselves
/// plus `queue_limit` waiting slots, so at most `queue_limit` callers can be
/// parked behind a saturated pool; the next caller fails fast instead.
fn waiter_gate(connection_limit: u32, queue_limit: u32) -> Option<Arc<Semaphore>> {
    (queue_limit > 0).then(|| Arc::new(Semaphore::new((connection_limit + queue_limit) as usize)))
}

impl DbPool {
    /// Open a pool from parsed connection settings.
    ///
    /// Connections are established lazily up to the configured limit; the
    /// initial TCP connect is bounded by the connect timeout.
    pub async fn connect(settings: &ConnectionSettings) -> DbResult<Self> {
        let pool = &settings.pool;
        let connection_limit = pool.connection_limit_or_default();
        let queue_limit = pool.queue_limit_or_default();

        let mut options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .database(&settings.database)
            .charset(&settings.charset);
        if let Some(password) = &settings.password {
            options = options.password(password);
        }

        let connect = MySqlPoolOptions::new()
            .min_connections(pool.min_connections_or_default())
            .max_connections(connection_limit)
            .acquire_timeout(pool.acquire_timeout())
            .idle_timeout(Some(pool.idle_timeout()))
            .test_before_acquire(pool.test_before_acquire_or_default())
            .connect_with(options);

        let inner = tokio::time::timeout(pool.connect_timeout(), connect)
            .await
            .map_err(|_| DbError::timeout("database connect", pool.connect_timeout().as_secs()))?
            .map_err(DbError::from)?;

        info!(
            host = %settings.host,
            database = %settings.database,
            connection_limit,
            queue_limit,
            "Connection pool created"
        );

        Ok(Self {
            inner,
            gate: waiter_gate(connection_limit, queue_limit),
            connection_limit,
            queue_limit,
        })
    }

    /// Lease one connection.
    ///
    /// Blocks (suspends) while the pool is at capacity, up to the acquire
    /// timeout. When the waiting queue is bounded and already full, fails
    /// immediately with `PoolExhausted` instead of parking the caller.
    pub async fn acquire(&self) -> DbResult<PooledConnection> {
        let permit = match &self.gate {
            Some(gate) => match Arc::clone(gate).try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    return Err(DbError::pool_exhausted(format!(
                        "all {} connections in use and {} callers already queued",
                        self.connection_limit, self.queue_limit
                    )));
                }
            },
            None => None,
        };

        let conn = self.inner.acquire().await.map_err(DbError::from)?;
        Ok(PooledConnection {
            conn,
            _permit: permit,
        })
    }

    /// Point-in-time utilization snapshot. Never blocks, never mutates.
    pub fn status(&self) -> PoolStatus {
        let total = self.inner.size();
        let idle = self.inner.num_idle() as u32;
        PoolStatus {
            active: total.saturating_sub(idle),
            idle,
            total,
            configured_limit: self.connection_limit,
        }
    }

    /// No-op diagnostic round-trip. Used for the startup connectivity check
    /// and by the health monitor to encourage idle-connection recycling.
    pub async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.inner)
            .await
            .map_err(DbError::from)?;
        Ok(())
    }

    /// Stop accepting acquisitions, wait for outstanding leases to return,
    /// and close every underlying connection. Idempotent.
    pub async fn close(&self) {
        if self.inner.is_closed() {
            return;
        }
        info!("Closing connection pool");
        self.inner.close().await;
        info!("Connection pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

/// RAII lease on one pooled connection.
///
/// Exclusively held by one caller for the duration of the lease; dropping it
/// returns the connection to the idle set. Field order matters: the
/// connection must be back in the pool before the waiter slot frees.
pub struct PooledConnection {
    conn: PoolConnection<MySql>,
    _permit: Option<OwnedSemaphorePermit>,
}

impl PooledConnection {
    /// The underlying connection, for statement execution.
    pub fn as_mut(&mut self) -> &mut MySqlConnection {
        &mut self.conn
    }
}

impl std::fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("queued", &self._permit.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_queue_has_no_gate() {
        assert!(waiter_gate(50, 0).is_none());
    }

    #[test]
    fn test_gate_permit_accounting() {
        // limit 2, queue 1: three callers may hold or wait, the fourth fails
        let gate = waiter_gate(2, 1).unwrap();
        let p1 = tokio_test::block_on(Arc::clone(&gate).acquire_owned()).unwrap();
        let _p2 = tokio_test::block_on(Arc::clone(&gate).acquire_owned()).unwrap();
        let _p3 = tokio_test::block_on(Arc::clone(&gate).acquire_owned()).unwrap();

        assert!(Arc::clone(&gate).try_acquire_owned().is_err());

        // releasing one slot readmits exactly one caller
        drop(p1);
        assert!(Arc::clone(&gate).try_acquire_owned().is_ok());
    }
}
