//! Query result models.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One result row: an ordered mapping of column name to decoded value.
/// Column order is preserved (serde_json `preserve_order`).
pub type Row = serde_json::Map<String, JsonValue>;

/// Normalized summary of a mutating statement. Both fields default to zero
/// when the driver does not report them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationSummary {
    pub insert_id: u64,
    pub affected_rows: u64,
}

impl MutationSummary {
    pub fn new(insert_id: u64, affected_rows: u64) -> Self {
        Self {
            insert_id,
            affected_rows,
        }
    }
}

/// Normalized outcome of a raw SQL statement: either a row set or a
/// mutation summary, depending on the statement shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    Rows(Vec<Row>),
    Mutation(MutationSummary),
}

impl QueryOutcome {
    /// The row set, if this outcome carries one.
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            Self::Rows(rows) => Some(rows),
            Self::Mutation(_) => None,
        }
    }

    /// The mutation summary, if this outcome carries one.
    pub fn mutation(&self) -> Option<MutationSummary> {
        match self {
            Self::Rows(_) => None,
            Self::Mutation(summary) => Some(*summary),
        }
    }
}

/// Point-in-time snapshot of pool utilization. Best effort: counters are
/// read without locking and may be momentarily inconsistent with each other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Connections currently leased to callers.
    pub active: u32,
    /// Connections sitting in the idle set.
    pub idle: u32,
    /// Connections currently open (active + idle).
    pub total: u32,
    /// The configured connection limit.
    pub configured_limit: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_summary_defaults_to_zero() {
        let summary = MutationSummary::default();
        assert_eq!(summary.insert_id, 0);
        assert_eq!(summary.affected_rows, 0);
    }

    #[test]
    fn test_outcome_accessors() {
        let outcome = QueryOutcome::Mutation(MutationSummary::new(7, 1));
        assert!(outcome.rows().is_none());
        assert_eq!(outcome.mutation().unwrap().insert_id, 7);

        let outcome = QueryOutcome::Rows(vec![Row::new()]);
        assert_eq!(outcome.rows().unwrap().len(), 1);
        assert!(outcome.mutation().is_none());
    }
}
