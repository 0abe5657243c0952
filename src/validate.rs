//! Write validation against cached schemas.
//!
//! Advisory defense-in-depth, not a full SQL type system: declared types are
//! classified into four coarse classes by substring and the runtime value
//! kind must agree. Nullability, length limits and referential integrity are
//! left to the database engine.

use crate::error::{DbError, DbResult};
use crate::models::{ColumnDef, EntryData};

/// Coarse class of a declared column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    /// Contains "int": INT, BIGINT, TINYINT, ...
    Integer,
    /// Contains "varchar"
    VarString,
    /// Contains "text": TEXT, MEDIUMTEXT, ...
    Text,
    /// Contains "float"
    Float,
    /// Anything else; not checked
    Unclassified,
}

impl TypeClass {
    /// Expected-kind name for error messages.
    fn expected(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::VarString => "varchar",
            Self::Text => "text",
            Self::Float => "float",
            Self::Unclassified => "any",
        }
    }
}

/// Classify a declared type string by substring match. Checks run in order;
/// the first hit wins.
pub fn classify(data_type: &str) -> TypeClass {
    let lower = data_type.to_lowercase();
    if lower.contains("int") {
        TypeClass::Integer
    } else if lower.contains("varchar") {
        TypeClass::VarString
    } else if lower.contains("text") {
        TypeClass::Text
    } else if lower.contains("float") {
        TypeClass::Float
    } else {
        TypeClass::Unclassified
    }
}

/// Validate row data against a table's column definitions.
///
/// Fail-fast: the first offending column aborts the check. Every column in
/// `entry` must exist in the schema by exact name; integer- and float-class
/// columns require a numeric value, varchar- and text-class columns require
/// a textual value, unclassified columns are not checked.
pub fn validate_entry(table: &str, columns: &[ColumnDef], entry: &EntryData) -> DbResult<()> {
    for (column, value) in entry.iter() {
        let def = columns
            .iter()
            .find(|c| c.column_name == column)
            .ok_or_else(|| DbError::unknown_column(table, column))?;

        let matches = match classify(&def.data_type) {
            TypeClass::Integer | TypeClass::Float => value.is_numeric(),
            TypeClass::VarString | TypeClass::Text => value.is_textual(),
            TypeClass::Unclassified => true,
        };
        if !matches {
            return Err(DbError::type_mismatch(
                column,
                classify(&def.data_type).expected(),
                value.kind().name(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnDef, SqlParam};

    fn users_columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("id", "INT").primary_key().auto_increment(),
            ColumnDef::new("name", "VARCHAR(50)"),
            ColumnDef::new("bio", "TEXT"),
            ColumnDef::new("score", "FLOAT"),
            ColumnDef::new("joined", "DATETIME"),
        ]
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("INT"), TypeClass::Integer);
        assert_eq!(classify("bigint unsigned"), TypeClass::Integer);
        assert_eq!(classify("VARCHAR(50)"), TypeClass::VarString);
        assert_eq!(classify("MEDIUMTEXT"), TypeClass::Text);
        assert_eq!(classify("FLOAT(7,4)"), TypeClass::Float);
        assert_eq!(classify("DATETIME"), TypeClass::Unclassified);
        assert_eq!(classify("DECIMAL(10,2)"), TypeClass::Unclassified);
    }

    #[test]
    fn test_valid_entry_passes() {
        let entry = EntryData::new()
            .set("name", "Alice")
            .set("bio", "hello")
            .set("score", 9.5)
            .set("id", 1);
        assert!(validate_entry("users", &users_columns(), &entry).is_ok());
    }

    #[test]
    fn test_unknown_column_named() {
        let entry = EntryData::new().set("name", "Alice").set("nickname", "Al");
        let err = validate_entry("users", &users_columns(), &entry).unwrap_err();
        match err {
            DbError::UnknownColumn { table, column } => {
                assert_eq!(table, "users");
                assert_eq!(column, "nickname");
            }
            other => panic!("expected UnknownColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_numeric_where_string_expected() {
        let entry = EntryData::new().set("name", 42);
        let err = validate_entry("users", &users_columns(), &entry).unwrap_err();
        match err {
            DbError::TypeMismatch {
                column,
                expected,
                actual,
            } => {
                assert_eq!(column, "name");
                assert_eq!(expected, "varchar");
                assert_eq!(actual, "integer");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_string_where_numeric_expected() {
        let entry = EntryData::new().set("id", "seven");
        let err = validate_entry("users", &users_columns(), &entry).unwrap_err();
        assert!(matches!(err, DbError::TypeMismatch { .. }));
    }

    #[test]
    fn test_int_accepted_for_float_column() {
        let entry = EntryData::new().set("score", 9);
        assert!(validate_entry("users", &users_columns(), &entry).is_ok());
    }

    #[test]
    fn test_unclassified_type_not_checked() {
        // DATETIME is unclassified; any scalar kind passes
        let entry = EntryData::new().set("joined", "2024-01-01 00:00:00");
        assert!(validate_entry("users", &users_columns(), &entry).is_ok());
        let entry = EntryData::new().set("joined", 1704067200);
        assert!(validate_entry("users", &users_columns(), &entry).is_ok());
    }

    #[test]
    fn test_null_rejected_for_classified_column() {
        let entry = EntryData::new().set("name", SqlParam::Null);
        let err = validate_entry("users", &users_columns(), &entry).unwrap_err();
        assert!(matches!(err, DbError::TypeMismatch { .. }));
    }

    #[test]
    fn test_fail_fast_stops_at_first_offender() {
        // Both columns are invalid; the first one in entry order is reported
        let entry = EntryData::new().set("id", "x").set("ghost", 1);
        let err = validate_entry("users", &users_columns(), &entry).unwrap_err();
        assert!(matches!(err, DbError::TypeMismatch { column, .. } if column == "id"));
    }
}
