//! # Config Report
//!
//! Exports the connector's configuration values to a paginated PDF report.
//!
//! Each configuration row is rendered according to how its field stores
//! data: a plain `label : value` line, a bullet list for comma-separated
//! multiselect values, or a bordered table for serialized arrays. The layout
//! tracks a single vertical cursor per page and breaks pages before anything
//! would reach the footer zone.
//!
//! ## Architecture
//!
//! ```text
//! Input (config rows + system.xml)
//!       ↓
//!   [source] / [metadata]  Rows and field descriptors
//!       ↓
//!   [content]   Per-row shape: line, bullets or table
//!       ↓
//!   [layout]    Page-aware layout engine
//!       ↓
//!   [pdf]       Serialize to PDF bytes
//! ```

pub mod config;
pub mod content;
pub mod edition;
pub mod error;
pub mod font;
pub mod image_loader;
pub mod layout;
pub mod metadata;
pub mod model;
pub mod pdf;
pub mod serialized;
pub mod source;

use log::info;

use config::ReportConfig;
use error::Result;
use font::ReportFont;
use layout::{ReportDocument, ReportLayoutEngine};
use metadata::FieldMetadata;
use pdf::PdfWriter;
use source::ConfigSource;

/// Fetch the rows, resolve their descriptors and lay the report out.
pub fn generate_report(
    config: &ReportConfig,
    source: &dyn ConfigSource,
    metadata: &FieldMetadata,
) -> Result<ReportDocument> {
    let font = ReportFont::load(&config.font)?;
    generate_with_font(config, source, metadata, &font)
}

/// Render the report to PDF bytes.
///
/// This is the primary entry point.
pub fn render_report(
    config: &ReportConfig,
    source: &dyn ConfigSource,
    metadata: &FieldMetadata,
) -> Result<Vec<u8>> {
    let font = ReportFont::load(&config.font)?;
    let document = generate_with_font(config, source, metadata, &font)?;
    let bytes = PdfWriter::new(config.layout.font_size).write(&document, &font)?;
    info!(
        "rendered {} page(s), {} bytes",
        document.pages.len(),
        bytes.len()
    );
    Ok(bytes)
}

fn generate_with_font(
    config: &ReportConfig,
    source: &dyn ConfigSource,
    metadata: &FieldMetadata,
    font: &ReportFont,
) -> Result<ReportDocument> {
    config.layout.validate()?;
    let logo = image_loader::load_logo(config.logo.as_deref())?;

    let rows = source.fetch_rows(&config.path_filter)?;
    let resolved: Vec<_> = rows
        .into_iter()
        .map(|row| {
            let descriptor = metadata.resolve(&row);
            (row, descriptor)
        })
        .collect();

    ReportLayoutEngine::new(config, font, Some(&logo)).generate(&resolved)
}
