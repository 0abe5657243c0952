//! Data models shared across the crate.

pub mod query;
pub mod schema;
pub mod value;

pub use query::{MutationSummary, PoolStatus, QueryOutcome, Row};
pub use schema::{ColumnDef, ForeignKeyRef, ReferentialAction, TableDef};
pub use value::{EntryData, SqlParam, ValueKind};
