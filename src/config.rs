//! # Report Configuration
//!
//! Every number the layout engine uses lives in [`LayoutConfig`], and every
//! piece of fixed report text lives in [`ReportConfig`]. Both deserialize
//! from camelCase JSON with every field optional, so a config file only has
//! to mention what it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

/// Standard page sizes in PDF units (1/72 inch).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    /// ISO A4, rounded to whole units.
    #[default]
    A4,
    Letter,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in PDF units.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.0, 842.0),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Fixed visual constants of the report.
///
/// Vertical positions are measured from the bottom of the page, as in PDF
/// user space: the cursor starts at `page height - top_margin` and descends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub page_size: PageSize,
    /// Default vertical advance between lines.
    pub line_break: f64,
    /// Distance from the top edge to the first baseline of every page.
    pub top_margin: f64,
    /// Left edge of label/value lines.
    pub indent_text: f64,
    /// Left edge of bullets and array tables.
    pub indent_multiselect: f64,
    /// Left edge of the footer text.
    pub indent_footer: f64,
    /// Height of one array-table row.
    pub array_row_height: f64,
    /// Distance from a table row's top border to its text baseline.
    pub array_text_offset: f64,
    /// Extra width added to a table row on top of the measured cells.
    pub table_padding: f64,
    /// Anything at or below this height belongs to the footer.
    pub footer_start: f64,
    pub font_size: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            line_break: 20.0,
            top_margin: 20.0,
            indent_text: 100.0,
            indent_multiselect: 120.0,
            indent_footer: 50.0,
            array_row_height: 30.0,
            array_text_offset: 20.0,
            table_padding: 10.0,
            footer_start: 70.0,
            font_size: 10.0,
        }
    }
}

impl LayoutConfig {
    pub fn page_width(&self) -> f64 {
        self.page_size.dimensions().0
    }

    pub fn page_height(&self) -> f64 {
        self.page_size.dimensions().1
    }

    /// Cursor position at the top of every fresh page.
    pub fn page_top(&self) -> f64 {
        self.page_height() - self.top_margin
    }

    /// Reject layouts the engine cannot make progress on.
    pub fn validate(&self) -> Result<()> {
        let (w, h) = self.page_size.dimensions();
        let positive = [
            ("page width", w),
            ("page height", h),
            ("lineBreak", self.line_break),
            ("arrayRowHeight", self.array_row_height),
            ("fontSize", self.font_size),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ReportError::lookup(format!(
                    "layout {} must be positive, got {}",
                    name, value
                )));
            }
        }
        if self.footer_start < 0.0 || self.top_margin < 0.0 {
            return Err(ReportError::lookup(
                "layout footerStart and topMargin must not be negative",
            ));
        }
        // A fresh page must have room for at least one line above the footer.
        if self.page_top() - self.line_break.max(self.array_row_height) <= self.footer_start {
            return Err(ReportError::lookup(format!(
                "page height {} leaves no room above the footer zone ({})",
                h, self.footer_start
            )));
        }
        Ok(())
    }
}

/// Which font measures and draws the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FontSource {
    /// One of the base-14 PDF fonts, e.g. "Helvetica".
    Standard(String),
    /// Path to a TrueType/OpenType file that gets embedded.
    TrueType(String),
}

impl Default for FontSource {
    fn default() -> Self {
        FontSource::Standard("Helvetica".to_string())
    }
}

/// Support text repeated at the bottom of every page that overflows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FooterConfig {
    pub lines: [String; 2],
    /// Target of the clickable region over the second line.
    pub link_url: String,
}

impl Default for FooterConfig {
    fn default() -> Self {
        Self {
            lines: [
                "If you want to report a bug, ask a question or have a suggestion to make on Akeneo Connector for Magento 2,".to_string(),
                "please follow this steps to contact our Support Team".to_string(),
            ],
            link_url: "https://help.akeneo.com/magento2-connector/v100/articles/download-connector.html#what-can-i-do-if-i-have-a-question-to-ask-a-bug-to-report-or-a-suggestion-to-make-about-the-connector".to_string(),
        }
    }
}

/// Per-path rendering rules for plain label/value lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldPolicy {
    /// Credential paths whose non-empty values are never printed.
    pub masked_paths: Vec<String>,
    pub mask: String,
    /// Path whose stored code is shown as an edition name.
    pub edition_path: String,
}

impl Default for FieldPolicy {
    fn default() -> Self {
        Self {
            masked_paths: [
                "akeneo_connector/akeneo_api/base_url",
                "akeneo_connector/akeneo_api/password",
                "akeneo_connector/akeneo_api/username",
                "akeneo_connector/akeneo_api/client_id",
                "akeneo_connector/akeneo_api/client_secret",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
            mask: "****".to_string(),
            edition_path: "akeneo_connector/akeneo_api/edition".to_string(),
        }
    }
}

impl FieldPolicy {
    pub fn is_masked(&self, path: &str) -> bool {
        self.masked_paths.iter().any(|p| p == path)
    }
}

/// Everything needed to produce one report, besides the rows themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportConfig {
    pub layout: LayoutConfig,
    pub font: FontSource,
    pub title: String,
    /// Logo image source (data URI, file path or raw base64).
    /// `None` uses the logo bundled with the crate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub footer: FooterConfig,
    pub fields: FieldPolicy,
    /// Substring every fetched config path must contain.
    pub path_filter: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            font: FontSource::default(),
            title: "Akeneo Connector for Magento 2 - Configuration export".to_string(),
            logo: None,
            footer: FooterConfig::default(),
            fields: FieldPolicy::default(),
            path_filter: "akeneo".to_string(),
        }
    }
}

impl ReportConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ReportConfig = serde_json::from_str(json)?;
        config.layout.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ReportError::lookup_with(format!("cannot read config '{}'", path.display()), e)
        })?;
        Self::from_json_str(&json)
    }
}
