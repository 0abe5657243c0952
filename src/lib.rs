//! sqlbridge
//!
//! An embeddable MySQL data-access layer: a bounded connection pool, an
//! in-memory schema cache that validates writes before they reach the
//! database, and a small surface of CRUD, raw-query, prepared-statement and
//! multi-statement transaction operations.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod schema;
pub mod service;
pub mod validate;

pub use config::{Config, ConnectionSettings, PoolSettings};
pub use error::{DbError, DbResult};
pub use service::SqlBridge;
