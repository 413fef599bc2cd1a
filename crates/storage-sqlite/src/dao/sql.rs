//! SQL text builders for the generic record helpers.
//!
//! Table and column names come from callers, so they are validated against
//! `[A-Za-z_][A-Za-z0-9_]*` before being quoted. Values are rendered as SQL
//! literals.

use ledgersync_core::errors::{Result, ValidationError};
use ledgersync_core::dao::RecordPatch;
use serde_json::Value;

/// Validates `name` and returns it double-quoted.
pub fn quote_identifier(name: &str) -> Result<String> {
    let mut chars = name.chars();
    let is_valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if !is_valid {
        return Err(ValidationError::InvalidIdentifier(name.to_string()).into());
    }

    Ok(format!("\"{}\"", name))
}

pub fn render_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote_string(s),
        // Nested values are stored as their JSON text
        Value::Array(_) | Value::Object(_) => quote_string(&value.to_string()),
    }
}

fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// `UPDATE "<table>" SET "<col>" = <literal>, ...` over every row.
pub fn build_update_statement(table: &str, patch: &RecordPatch) -> Result<String> {
    if patch.is_empty() {
        return Err(ValidationError::InvalidInput(format!(
            "empty patch for table {}",
            table
        ))
        .into());
    }

    let assignments = patch
        .iter()
        .map(|(column, value)| {
            Ok(format!(
                "{} = {}",
                quote_identifier(column)?,
                render_literal(value)
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(format!(
        "UPDATE {} SET {}",
        quote_identifier(table)?,
        assignments.join(", ")
    ))
}

/// Selects `column` of the first row of `table` as text.
pub fn build_select_first_value(table: &str, column: &str) -> Result<String> {
    Ok(format!(
        "SELECT CAST({} AS TEXT) AS value FROM {} LIMIT 1",
        quote_identifier(column)?,
        quote_identifier(table)?
    ))
}
