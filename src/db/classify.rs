//! Statement shape classification.
//!
//! `Query` and `Transaction` accept arbitrary SQL, so result normalization
//! needs to know whether a statement produces a row set or a mutation
//! summary before executing it. Parsing uses sqlparser's MySQL dialect; a
//! statement that does not parse (vendor syntax, hints) falls back to a
//! leading-keyword check rather than failing.

use sqlparser::ast::Statement;
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

/// Leading keywords of row-returning statements that don't parse as a plain
/// query (SHOW, DESCRIBE, ...) or don't parse at all.
const ROW_KEYWORDS: &[&str] = &[
    "SELECT", "SHOW", "DESCRIBE", "DESC", "EXPLAIN", "VALUES", "TABLE", "WITH",
];

/// Whether the statement produces a row set.
pub(crate) fn returns_rows(sql: &str) -> bool {
    match Parser::parse_sql(&MySqlDialect {}, sql) {
        Ok(statements) => match statements.first() {
            Some(Statement::Query(_)) => true,
            Some(_) => leading_keyword_returns_rows(sql),
            None => false,
        },
        Err(_) => leading_keyword_returns_rows(sql),
    }
}

fn leading_keyword_returns_rows(sql: &str) -> bool {
    sql.split_whitespace()
        .next()
        .map(|word| ROW_KEYWORDS.iter().any(|k| word.eq_ignore_ascii_case(k)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_returns_rows() {
        assert!(returns_rows("SELECT * FROM users"));
        assert!(returns_rows("  select 1"));
        assert!(returns_rows(
            "WITH recent AS (SELECT * FROM logs) SELECT * FROM recent"
        ));
    }

    #[test]
    fn test_show_and_describe_return_rows() {
        assert!(returns_rows("SHOW TABLES"));
        assert!(returns_rows("DESCRIBE users"));
        assert!(returns_rows("EXPLAIN SELECT * FROM users"));
    }

    #[test]
    fn test_mutations_do_not_return_rows() {
        assert!(!returns_rows("INSERT INTO users (name) VALUES (?)"));
        assert!(!returns_rows("UPDATE users SET name = ? WHERE id = ?"));
        assert!(!returns_rows("DELETE FROM users WHERE id = ?"));
        assert!(!returns_rows(
            "CREATE TABLE IF NOT EXISTS users (id INT PRIMARY KEY)"
        ));
        assert!(!returns_rows("DROP TABLE users"));
    }

    #[test]
    fn test_unparseable_falls_back_to_keyword() {
        assert!(returns_rows("SELECT /*+ vendor_hint */ broken ((("));
        assert!(!returns_rows("FLUSH PRIVILEGES totally (((broken"));
        assert!(!returns_rows(""));
        assert!(!returns_rows("   "));
    }
}
