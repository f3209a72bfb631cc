//! # Serialized Array Values
//!
//! Array-typed config fields store a JSON object (or array) of records, each
//! record an object of `column -> cell`. Key order is significant: it gives
//! the row order and the column order of the rendered table, so decoding
//! relies on serde_json's `preserve_order` map.
//!
//! ```text
//! {"_1650": {"website": "base", "channel": "ecommerce"},
//!  "_1651": {"website": "fr",   "channel": "print"}}
//! ```

use serde_json::Value;

use crate::error::{ReportError, Result};
use crate::model::SerializedTable;

/// Decode the stored value of the field at `path` into a table.
///
/// Blank text and JSON `null` decode to an empty table. Anything that is not
/// a list of objects fails with [`ReportError::Decoding`].
pub fn decode_serialized_array(path: &str, raw: &str) -> Result<SerializedTable> {
    if raw.trim().is_empty() {
        return Ok(SerializedTable::default());
    }

    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ReportError::decoding(path, e.to_string()))?;

    let records: Vec<&Value> = match &value {
        Value::Null => return Ok(SerializedTable::default()),
        Value::Object(map) => map.values().collect(),
        Value::Array(items) => items.iter().collect(),
        other => {
            return Err(ReportError::decoding(
                path,
                format!("expected a list of records, found {}", json_kind(other)),
            ))
        }
    };

    let mut objects = Vec::with_capacity(records.len());
    for record in records {
        match record {
            Value::Object(map) => objects.push(map),
            other => {
                return Err(ReportError::decoding(
                    path,
                    format!("expected a record object, found {}", json_kind(other)),
                ))
            }
        }
    }

    let Some(first) = objects.first() else {
        return Ok(SerializedTable::default());
    };
    let headers: Vec<String> = first.keys().cloned().collect();

    let rows = objects
        .iter()
        .map(|record| {
            headers
                .iter()
                .map(|column| record.get(column).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();

    Ok(SerializedTable { headers, rows })
}

/// Text drawn for one cell.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) | Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
