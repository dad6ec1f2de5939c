//! Rendering values as SQL literals.
//!
//! String values, and any value bound to a textual storage type, are
//! single-quoted with embedded quotes doubled. Everything else is bare.

use super::SqlType;
use crate::value::Value;

/// Render a value as a literal of the given storage type.
pub fn render(value: &Value, sql_type: SqlType) -> String {
    if value.is_null() {
        return "NULL".to_string();
    }
    if sql_type.is_textual() || matches!(value, Value::String(_)) {
        quote(&value.sql_text())
    } else {
        value.sql_text()
    }
}

/// Render a value by its own storage type.
pub fn render_own(value: &Value) -> String {
    render(value, value.storage_type())
}

/// Render a comma separated list of values of one storage type.
pub fn render_list(values: &[Value], sql_type: SqlType) -> String {
    values
        .iter()
        .map(|v| render(v, sql_type))
        .collect::<Vec<_>>()
        .join(", ")
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
