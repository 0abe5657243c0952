//! Schema cache and table DDL generation.
//!
//! The cache is the process-wide map from table name to column definitions,
//! populated once by `Initialize` and consulted (never mutated) by every
//! validated write afterwards. It is owned by the service object and
//! injected into the executor, never a module-level global.

use crate::models::{ColumnDef, SqlParam};
use std::collections::HashMap;
use std::sync::RwLock;

/// Process-wide table schema registry.
///
/// Registration happens during initialization; steady-state access is
/// read-only. Guarded by a `std::sync::RwLock` (never held across an await
/// point). Not persisted: schemas must be re-registered on every start.
#[derive(Debug, Default)]
pub struct SchemaCache {
    tables: RwLock<HashMap<String, Vec<ColumnDef>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store definitions under the table name, replacing any prior entry.
    pub fn register(&self, table: impl Into<String>, columns: Vec<ColumnDef>) {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        tables.insert(table.into(), columns);
    }

    /// Look up the definitions for a table. Pure read.
    pub fn lookup(&self, table: &str) -> Option<Vec<ColumnDef>> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        tables.get(table).cloned()
    }

    /// Number of registered tables.
    pub fn len(&self) -> usize {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Quote an identifier for MySQL, doubling any embedded backticks.
pub(crate) fn quote_ident(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Render a default value as a SQL literal. Strings are single-quoted with
/// embedded quotes doubled; everything else renders bare.
fn render_literal(value: &SqlParam) -> String {
    match value {
        SqlParam::Null => "NULL".to_string(),
        SqlParam::Bool(true) => "TRUE".to_string(),
        SqlParam::Bool(false) => "FALSE".to_string(),
        SqlParam::Int(v) => v.to_string(),
        SqlParam::Float(v) => v.to_string(),
        SqlParam::String(v) => format!("'{}'", v.replace('\'', "''")),
    }
}

/// Build a `CREATE TABLE IF NOT EXISTS` statement from column definitions.
///
/// Column order follows the definition order; foreign-key constraints are
/// appended after the column list.
pub fn build_create_table(table: &str, columns: &[ColumnDef]) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(columns.len());
    let mut constraints: Vec<String> = Vec::new();

    for col in columns {
        let mut def = format!("{} {}", quote_ident(&col.column_name), col.data_type);
        if col.is_primary_key {
            def.push_str(" PRIMARY KEY");
        }
        if col.auto_increment {
            def.push_str(" AUTO_INCREMENT");
        }
        if col.unique {
            def.push_str(" UNIQUE");
        }
        if let Some(default) = &col.default {
            def.push_str(&format!(" DEFAULT {}", render_literal(default)));
        }
        parts.push(def);

        if let Some(fk) = &col.foreign_key {
            let mut constraint = format!(
                "FOREIGN KEY ({}) REFERENCES {} ({})",
                quote_ident(&col.column_name),
                quote_ident(&fk.table),
                quote_ident(&fk.column),
            );
            if let Some(action) = fk.on_delete {
                constraint.push_str(&format!(" ON DELETE {}", action.as_sql()));
            }
            if let Some(action) = fk.on_update {
                constraint.push_str(&format!(" ON UPDATE {}", action.as_sql()));
            }
            constraints.push(constraint);
        }
    }

    parts.extend(constraints);
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(table),
        parts.join(", ")
    )
}
