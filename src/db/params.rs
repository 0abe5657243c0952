//! Parameter binding for MySQL queries.
//!
//! Values are always bound positionally; they never appear in SQL text.

use crate::models::SqlParam;
use sqlx::MySql;
use sqlx::mysql::MySqlArguments;

/// Bind one parameter to a query.
pub(crate) fn bind_param<'q>(
    query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    param: &'q SqlParam,
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    match param {
        SqlParam::Null => query.bind(None::<String>),
        SqlParam::Bool(v) => query.bind(*v),
        SqlParam::Int(v) => query.bind(*v),
        SqlParam::Float(v) => query.bind(*v),
        SqlParam::String(v) => query.bind(v.as_str()),
    }
}
