//! Schema description models.
//!
//! A host supplies these at initialization time, typically deserialized from
//! JSON. They drive both table creation and write validation; after
//! registration they are immutable for the lifetime of the process.

use crate::models::SqlParam;
use serde::{Deserialize, Serialize};

/// Referential action for a foreign-key constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    Restrict,
    NoAction,
}

impl ReferentialAction {
    /// SQL keyword form.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::Restrict => "RESTRICT",
            Self::NoAction => "NO ACTION",
        }
    }
}

/// Foreign-key reference attached to one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    /// Referenced table.
    pub table: String,
    /// Referenced column.
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ReferentialAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<ReferentialAction>,
}

/// Definition of one table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub column_name: String,
    /// Declared SQL type, e.g. "INT", "VARCHAR(50)", "TEXT", "FLOAT".
    /// Classified by substring for validation; passed through verbatim to
    /// the generated DDL.
    pub data_type: String,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<SqlParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeyRef>,
}

impl ColumnDef {
    /// Create a plain column with just a name and type.
    pub fn new(column_name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            data_type: data_type.into(),
            is_primary_key: false,
            auto_increment: false,
            unique: false,
            default: None,
            foreign_key: None,
        }
    }

    /// Mark as primary key, builder-style.
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    /// Mark as auto-increment.
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Mark as unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// One table in the schema description handed to `Initialize`.
///
/// Tables are processed in sequence order, so a table referencing another
/// through a foreign key must come after its target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_builder() {
        let col = ColumnDef::new("id", "INT").primary_key().auto_increment();
        assert!(col.is_primary_key);
        assert!(col.auto_increment);
        assert!(!col.unique);
        assert!(col.default.is_none());
    }

    #[test]
    fn test_referential_action_sql() {
        assert_eq!(ReferentialAction::Cascade.as_sql(), "CASCADE");
        assert_eq!(ReferentialAction::SetNull.as_sql(), "SET NULL");
    }

    #[test]
    fn test_schema_description_from_json() {
        let json = r#"[
            {
                "name": "users",
                "columns": [
                    {"column_name": "id", "data_type": "INT", "is_primary_key": true, "auto_increment": true},
                    {"column_name": "name", "data_type": "VARCHAR(50)"}
                ]
            },
            {
                "name": "posts",
                "columns": [
                    {"column_name": "id", "data_type": "INT", "is_primary_key": true, "auto_increment": true},
                    {"column_name": "author_id", "data_type": "INT",
                     "foreign_key": {"table": "users", "column": "id", "on_delete": "cascade"}}
                ]
            }
        ]"#;
        let tables: Vec<TableDef> = serde_json::from_str(json).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "users");
        assert!(tables[0].columns[0].is_primary_key);
        let fk = tables[1].columns[1].foreign_key.as_ref().unwrap();
        assert_eq!(fk.table, "users");
        assert_eq!(fk.on_delete, Some(ReferentialAction::Cascade));
        assert!(fk.on_update.is_none());
    }
}
