//! # Report Data Model
//!
//! The inputs the layout engine consumes: configuration rows, the metadata
//! describing how each row's field is displayed, and decoded array tables.

use serde::{Deserialize, Deserializer, Serialize};

/// One configuration entry, read once per report and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRow {
    /// Slash-delimited key: `section/group/field`.
    pub path: String,
    /// Raw stored value. A database `NULL` reads as an empty string.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub value: String,
}

impl ConfigRow {
    pub fn new(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }

    /// The `group` and `field` segments, if the path has at least three parts.
    pub fn group_and_field(&self) -> Option<(&str, &str)> {
        let mut parts = self.path.split('/');
        let _section = parts.next()?;
        let group = parts.next()?;
        let field = parts.next()?;
        Some((group, field))
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// How a field's value is stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageKind {
    #[default]
    Plain,
    /// A serialized list of uniform records, shown as a bordered table.
    SerializedArray,
}

/// Display metadata for one configuration field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub label: String,
    pub storage: StorageKind,
}

impl FieldDescriptor {
    pub fn new(label: impl Into<String>, storage: StorageKind) -> Self {
        Self {
            label: label.into(),
            storage,
        }
    }

    pub fn plain(label: impl Into<String>) -> Self {
        Self::new(label, StorageKind::Plain)
    }

    pub fn is_serialized_array(&self) -> bool {
        self.storage == StorageKind::SerializedArray
    }
}

/// A decoded serialized-array value.
///
/// Column headers come from the first record; every row holds its cells in
/// header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SerializedTable {
    /// No records, or a first record without any column.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Every string the table will draw: headers first, then cells row by row.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.headers
            .iter()
            .chain(self.rows.iter().flatten())
            .map(String::as_str)
    }
}
