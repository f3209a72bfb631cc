//! # Font Management
//!
//! The report draws everything in one active font, and every horizontal
//! position that depends on text (the centered title, table cell widths,
//! centered cell text, the footer link) comes from measuring with that
//! font's real metrics:
//!
//! ```text
//! text -> UTF-16 code units -> glyph numbers -> advance widths
//!      -> sum / units-per-em * font size
//! ```
//!
//! Two kinds of font are supported: the standard PDF fonts (no embedding,
//! widths from the AFM tables in [`metrics`]) and TrueType/OpenType files
//! parsed with ttf-parser and embedded by the PDF writer.

pub mod metrics;

use std::collections::HashMap;
use std::path::Path;

use log::debug;

use crate::config::FontSource;
use crate::error::{ReportError, Result};

pub use metrics::StandardFontMetrics;
use metrics::{unicode_to_winansi, REPLACEMENT_CODE};

/// The standard PDF fonts the report knows metrics for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    Courier,
}

impl StandardFont {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Helvetica" => Some(StandardFont::Helvetica),
            "Courier" => Some(StandardFont::Courier),
            _ => None,
        }
    }

    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::Courier => "Courier",
        }
    }

    pub fn metrics(&self) -> StandardFontMetrics {
        match self {
            StandardFont::Helvetica => StandardFontMetrics::Helvetica,
            StandardFont::Courier => StandardFontMetrics::Courier,
        }
    }
}

/// A parsed TrueType/OpenType font.
#[derive(Debug, Clone)]
pub struct TrueTypeFont {
    /// PostScript name, sanitized for use as a PDF name.
    pub name: String,
    /// Raw font file, embedded as-is.
    pub data: Vec<u8>,
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
    pub cap_height: i16,
    /// Bounding box (x_min, y_min, x_max, y_max) in font units.
    pub bbox: (i16, i16, i16, i16),
    /// BMP code unit -> glyph id. Unmapped units use glyph 0.
    cmap: HashMap<u16, u16>,
    /// Advance width per glyph id.
    advances: Vec<u16>,
}

impl TrueTypeFont {
    pub fn from_bytes(data: Vec<u8>, fallback_name: &str) -> Result<Self> {
        let face = ttf_parser::Face::parse(&data, 0)
            .map_err(|e| ReportError::rendering(format!("failed to parse font '{}': {}", fallback_name, e)))?;

        let mut cmap = HashMap::new();
        for unit in 0u32..=0xFFFF {
            // Surrogate halves are not characters; they fall back to glyph 0.
            if let Some(ch) = char::from_u32(unit) {
                if let Some(glyph_id) = face.glyph_index(ch) {
                    cmap.insert(unit as u16, glyph_id.0);
                }
            }
        }

        let advances = (0..face.number_of_glyphs())
            .map(|gid| face.glyph_hor_advance(ttf_parser::GlyphId(gid)).unwrap_or(0))
            .collect();

        let name = face
            .names()
            .into_iter()
            .find(|n| n.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .and_then(|n| n.to_string())
            .unwrap_or_else(|| fallback_name.to_string());

        let bbox = face.global_bounding_box();
        let ascender = face.ascender();

        Ok(TrueTypeFont {
            name: sanitize_font_name(&name),
            units_per_em: face.units_per_em(),
            ascender,
            descender: face.descender(),
            cap_height: face.capital_height().unwrap_or(ascender),
            bbox: (bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max),
            cmap,
            advances,
            data,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            ReportError::rendering(format!("failed to read font '{}': {}", path.display(), e))
        })?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::from_bytes(data, &stem)
    }

    pub fn glyph_for_unit(&self, unit: u16) -> u16 {
        self.cmap.get(&unit).copied().unwrap_or(0)
    }

    pub fn advance(&self, glyph: u16) -> u16 {
        self.advances.get(glyph as usize).copied().unwrap_or(0)
    }
}

/// The font a report is measured and drawn with.
#[derive(Debug, Clone)]
pub enum ReportFont {
    Standard(StandardFont),
    TrueType(Box<TrueTypeFont>),
}

impl ReportFont {
    pub fn load(source: &FontSource) -> Result<Self> {
        match source {
            FontSource::Standard(name) => StandardFont::from_name(name)
                .map(ReportFont::Standard)
                .ok_or_else(|| {
                    ReportError::rendering(format!("no metrics for standard font '{}'", name))
                }),
            FontSource::TrueType(path) => {
                let font = TrueTypeFont::from_file(path)?;
                debug!(
                    "loaded TrueType font {} ({} glyphs, {} units/em)",
                    font.name,
                    font.advances.len(),
                    font.units_per_em
                );
                Ok(ReportFont::TrueType(Box::new(font)))
            }
        }
    }

    pub fn helvetica() -> Self {
        ReportFont::Standard(StandardFont::Helvetica)
    }

    /// Name used for the PDF /BaseFont entry.
    pub fn base_font_name(&self) -> &str {
        match self {
            ReportFont::Standard(font) => font.pdf_name(),
            ReportFont::TrueType(font) => &font.name,
        }
    }

    pub fn units_per_em(&self) -> u16 {
        match self {
            ReportFont::Standard(_) => StandardFontMetrics::UNITS_PER_EM,
            ReportFont::TrueType(font) => font.units_per_em,
        }
    }

    /// Glyph number for each UTF-16 code unit.
    ///
    /// For standard fonts the glyph number is the WinAnsi code; units the
    /// encoding lacks map to `?`, which is also what gets drawn for them.
    pub fn glyph_numbers(&self, units: &[u16]) -> Vec<u16> {
        match self {
            ReportFont::Standard(_) => units
                .iter()
                .map(|&u| unicode_to_winansi(u).unwrap_or(REPLACEMENT_CODE) as u16)
                .collect(),
            ReportFont::TrueType(font) => units.iter().map(|&u| font.glyph_for_unit(u)).collect(),
        }
    }

    /// Advance width of each glyph, in font units.
    pub fn glyph_widths(&self, glyphs: &[u16]) -> Vec<u16> {
        match self {
            ReportFont::Standard(font) => {
                let metrics = font.metrics();
                glyphs
                    .iter()
                    .map(|&g| metrics.code_width(g.min(0xFF) as u8))
                    .collect()
            }
            ReportFont::TrueType(font) => glyphs.iter().map(|&g| font.advance(g)).collect(),
        }
    }

    /// Rendered width of `text` at `font_size`, in PDF units.
    pub fn measure_width(&self, text: &str, font_size: f64) -> f64 {
        let units: Vec<u16> = text.encode_utf16().collect();
        let glyphs = self.glyph_numbers(&units);
        let total: u64 = self.glyph_widths(&glyphs).iter().map(|&w| w as u64).sum();
        (total as f64 / self.units_per_em() as f64) * font_size
    }
}

/// Rendered width of `text` in `font` at `font_size`.
pub fn measure_width(text: &str, font: &ReportFont, font_size: f64) -> f64 {
    font.measure_width(text, font_size)
}

/// Strip characters that are not allowed in a PDF name object.
fn sanitize_font_name(name: &str) -> String {
    let name: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if name.is_empty() {
        "CustomFont".to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_space_width() {
        let font = ReportFont::helvetica();
        let w = font.measure_width(" ", 12.0);
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn width_is_sum_of_glyph_advances() {
        let font = ReportFont::helvetica();
        // A=667, B=667 -> 1334 units at 10pt
        let w = measure_width("AB", &font, 10.0);
        assert!((w - 13.34).abs() < 1e-9);
        assert_eq!(measure_width("", &font, 10.0), 0.0);
    }

    #[test]
    fn width_scales_with_font_size() {
        let font = ReportFont::helvetica();
        let w10 = font.measure_width("Configuration", 10.0);
        let w20 = font.measure_width("Configuration", 20.0);
        assert!((w20 - 2.0 * w10).abs() < 1e-9);
    }

    #[test]
    fn unencodable_units_measure_as_replacement() {
        let font = ReportFont::helvetica();
        let question = font.measure_width("?", 10.0);
        assert!((font.measure_width("Ж", 10.0) - question).abs() < 1e-9);
        // Outside the BMP: two code units, two replacement glyphs.
        assert!((font.measure_width("😀", 10.0) - 2.0 * question).abs() < 1e-9);
    }

    #[test]
    fn control_characters_measure_as_replacement() {
        let font = ReportFont::helvetica();
        assert_eq!(font.glyph_numbers(&[0x0A, 0x09]), vec![b'?' as u16; 2]);
        let question = font.measure_width("?", 10.0);
        assert!((font.measure_width("a\nb", 10.0) - font.measure_width("a?b", 10.0)).abs() < 1e-9);
        assert!(question > 0.0);
    }

    #[test]
    fn courier_is_monospaced() {
        let font = ReportFont::Standard(StandardFont::Courier);
        assert!((font.measure_width("iW", 10.0) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn load_standard_font_by_name() {
        let font = ReportFont::load(&FontSource::Standard("Helvetica".to_string())).unwrap();
        assert_eq!(font.base_font_name(), "Helvetica");
        assert!(matches!(
            ReportFont::load(&FontSource::Standard("Comic Sans".to_string())),
            Err(ReportError::Rendering(_))
        ));
    }

    #[test]
    fn garbage_truetype_is_a_render_error() {
        assert!(matches!(
            TrueTypeFont::from_bytes(vec![0, 1, 2, 3], "broken"),
            Err(ReportError::Rendering(_))
        ));
        assert!(matches!(
            ReportFont::load(&FontSource::TrueType("/nonexistent/font.ttf".to_string())),
            Err(ReportError::Rendering(_))
        ));
    }

    const DEJAVU_MONO: &[u8] = include_bytes!("../../assets/DejaVuSansMono.ttf");

    fn dejavu() -> ReportFont {
        ReportFont::TrueType(Box::new(
            TrueTypeFont::from_bytes(DEJAVU_MONO.to_vec(), "fallback").unwrap(),
        ))
    }

    #[test]
    fn truetype_width_comes_from_face_advances() {
        let face = ttf_parser::Face::parse(DEJAVU_MONO, 0).unwrap();
        let units: u32 = "AB"
            .chars()
            .map(|c| face.glyph_hor_advance(face.glyph_index(c).unwrap()).unwrap() as u32)
            .sum();
        let expected = units as f64 / face.units_per_em() as f64 * 10.0;

        let font = dejavu();
        assert_eq!(font.units_per_em(), 2048);
        assert_eq!(font.base_font_name(), "DejaVuSansMono");
        assert!((font.measure_width("AB", 10.0) - expected).abs() < 1e-9);
        assert!((font.measure_width("AB", 20.0) - 2.0 * expected).abs() < 1e-9);
    }

    #[test]
    fn truetype_glyphs_follow_the_cmap() {
        let face = ttf_parser::Face::parse(DEJAVU_MONO, 0).unwrap();
        let font = dejavu();
        let glyphs = font.glyph_numbers(&['A' as u16, 'Ж' as u16]);
        assert_eq!(glyphs[0], face.glyph_index('A').unwrap().0);
        assert_eq!(glyphs[1], face.glyph_index('Ж').unwrap().0);
        // A lone surrogate is not a character and falls back to glyph 0.
        assert_eq!(font.glyph_numbers(&[0xD800]), vec![0]);
    }

    #[test]
    fn truetype_loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, DEJAVU_MONO).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let font = ReportFont::load(&FontSource::TrueType(path)).unwrap();
        match &font {
            ReportFont::TrueType(ttf) => assert_eq!(ttf.data.len(), DEJAVU_MONO.len()),
            _ => panic!("expected an embedded font"),
        }
    }

    #[test]
    fn font_names_are_sanitized() {
        assert_eq!(sanitize_font_name("Open Sans (Bold)"), "OpenSansBold");
        assert_eq!(sanitize_font_name("  "), "CustomFont");
    }
}
