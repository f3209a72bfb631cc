//! # Config Row Sources
//!
//! Where the report's rows come from. The host's config table is reduced to
//! an ordered list of `(path, value)` pairs; the report only ever asks for
//! the rows whose path contains a substring.

use std::path::PathBuf;

use log::debug;

use crate::error::{ReportError, Result};
use crate::model::ConfigRow;

/// A store of configuration rows.
pub trait ConfigSource {
    /// All rows whose path contains `path_filter`, in storage order.
    fn fetch_rows(&self, path_filter: &str) -> Result<Vec<ConfigRow>>;
}

fn matching(rows: &[ConfigRow], path_filter: &str) -> Vec<ConfigRow> {
    rows.iter()
        .filter(|row| row.path.contains(path_filter))
        .cloned()
        .collect()
}

/// Rows held in memory, e.g. already fetched by the caller.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigSource {
    rows: Vec<ConfigRow>,
}

impl MemoryConfigSource {
    pub fn new(rows: Vec<ConfigRow>) -> Self {
        Self { rows }
    }
}

impl ConfigSource for MemoryConfigSource {
    fn fetch_rows(&self, path_filter: &str) -> Result<Vec<ConfigRow>> {
        Ok(matching(&self.rows, path_filter))
    }
}

/// A JSON dump of the config table: an array of objects with at least
/// `path` and `value` columns. Other columns are ignored.
#[derive(Debug, Clone)]
pub struct JsonFileConfigSource {
    path: PathBuf,
}

impl JsonFileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigSource for JsonFileConfigSource {
    fn fetch_rows(&self, path_filter: &str) -> Result<Vec<ConfigRow>> {
        let json = std::fs::read_to_string(&self.path).map_err(|e| {
            ReportError::lookup_with(
                format!("cannot read config rows from '{}'", self.path.display()),
                e,
            )
        })?;
        let rows: Vec<ConfigRow> = serde_json::from_str(&json)?;
        let rows = matching(&rows, path_filter);
        debug!(
            "fetched {} config rows matching '{}' from {}",
            rows.len(),
            path_filter,
            self.path.display()
        );
        Ok(rows)
    }
}
