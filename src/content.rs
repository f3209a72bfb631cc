//! # Row Dispatch
//!
//! Decides which of the three content shapes a config row is drawn as, and
//! produces the exact strings to draw. Evaluated in priority order:
//!
//! 1. serialized-array field: decoded table (or a blank line if empty)
//! 2. value containing a comma: one bullet per token
//! 3. anything else: a single `"<label> : <value>"` line
//!
//! Masking and edition lookup only apply to the third shape.

use crate::config::FieldPolicy;
use crate::edition::resolve_edition_name;
use crate::error::Result;
use crate::model::{ConfigRow, FieldDescriptor, SerializedTable};
use crate::serialized::decode_serialized_array;

/// What one row renders as.
#[derive(Debug, Clone, PartialEq)]
pub enum RowContent {
    /// `"<label> : "` followed by a bordered table.
    Table {
        heading: String,
        table: SerializedTable,
    },
    /// `"<label> : "` on a line of its own, then nothing but a blank line.
    EmptyTable { heading: String },
    /// `"<label> : "` followed by `"- <token>"` lines.
    Bullets { heading: String, items: Vec<String> },
    /// A complete label/value line.
    Line(String),
}

impl RowContent {
    pub fn classify(
        row: &ConfigRow,
        descriptor: &FieldDescriptor,
        policy: &FieldPolicy,
    ) -> Result<RowContent> {
        let heading = format!("{} : ", descriptor.label);

        if descriptor.is_serialized_array() {
            let table = decode_serialized_array(&row.path, &row.value)?;
            return Ok(if table.is_empty() {
                RowContent::EmptyTable { heading }
            } else {
                RowContent::Table { heading, table }
            });
        }

        if !row.value.is_empty() && row.value.contains(',') {
            let items = row.value.split(',').map(str::to_string).collect();
            return Ok(RowContent::Bullets { heading, items });
        }

        // The edition line is the edition name alone, without its label.
        if row.path == policy.edition_path {
            return Ok(RowContent::Line(resolve_edition_name(&row.value)));
        }

        let shown = if policy.is_masked(&row.path) && !row.value.is_empty() {
            policy.mask.clone()
        } else {
            row.value.clone()
        };
        Ok(RowContent::Line(format!("{}{}", heading, shown)))
    }

    /// Short name for log lines.
    pub fn shape(&self) -> &'static str {
        match self {
            RowContent::Table { .. } => "table",
            RowContent::EmptyTable { .. } => "empty table",
            RowContent::Bullets { .. } => "bullets",
            RowContent::Line(_) => "line",
        }
    }
}
