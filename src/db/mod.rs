//! Database access layer.
//!
//! - Connection pool with bounded-queue acquisition
//! - Statement execution with guaranteed lease release
//! - Atomic multi-statement transactions
//! - Background pool health monitoring

pub mod classify;
pub mod executor;
pub mod monitor;
pub mod params;
pub mod pool;
pub mod rows;
pub mod transaction;

pub use executor::StatementExecutor;
pub use monitor::PoolHealthMonitor;
pub use pool::{DbPool, PooledConnection};
pub use transaction::TransactionCoordinator;
