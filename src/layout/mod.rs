//! # Report Layout Engine
//!
//! Turns an ordered list of config rows into pages of draw operations.
//!
//! The engine keeps one cursor: the current page and a vertical position
//! that starts at `page height - top margin` and only ever descends. Every
//! step that consumes vertical space first asks [`page_break::needs_break`]
//! whether the element would reach the footer zone. If it would, the engine
//! paginates:
//!
//! ```text
//! ON_PAGE --(needs_break)--> draw footer -> append page -> reset cursor --> ON_PAGE
//! ```
//!
//! The footer is therefore only drawn on pages that overflowed; the last
//! page gets none.
//!
//! Coordinates are PDF user space: origin bottom-left, y up.

pub mod page_break;
pub mod table;

use log::{debug, info};

use crate::config::{LayoutConfig, ReportConfig};
use crate::content::RowContent;
use crate::error::Result;
use crate::font::ReportFont;
use crate::image_loader::LoadedImage;
use crate::model::{ConfigRow, FieldDescriptor, SerializedTable};

use table::TableGeometry;

/// One primitive drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Text with its baseline starting at (x, y).
    Text { x: f64, y: f64, text: String },
    /// A stroked straight line.
    Line { x1: f64, y1: f64, x2: f64, y2: f64 },
    /// A stroked rectangle between two corners.
    Rect { x1: f64, y1: f64, x2: f64, y2: f64 },
    /// An image from [`ReportDocument::images`] stretched over a box.
    Image {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        image: usize,
    },
    /// A clickable region opening `uri`.
    Link {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        uri: String,
    },
}

/// A laid-out page ready for PDF serialization.
#[derive(Debug, Clone)]
pub struct ReportPage {
    pub width: f64,
    pub height: f64,
    pub ops: Vec<DrawOp>,
    /// Set once the support footer has been drawn on this page.
    pub has_footer: bool,
}

impl ReportPage {
    fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
            has_footer: false,
        }
    }

    /// Text operations in drawing order.
    pub fn text_ops(&self) -> impl Iterator<Item = (f64, f64, &str)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { x, y, text } => Some((*x, *y, text.as_str())),
            _ => None,
        })
    }

    pub fn texts(&self) -> Vec<&str> {
        self.text_ops().map(|(_, _, text)| text).collect()
    }

    pub fn links(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Link { uri, .. } => Some(uri.as_str()),
            _ => None,
        })
    }
}

/// The finished report.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub title: String,
    pub pages: Vec<ReportPage>,
    pub images: Vec<LoadedImage>,
}

/// Where the next element goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCursor {
    /// Index into the document's pages.
    pub page: usize,
    pub y: f64,
}

/// Lays out one report. Create a new engine for every report.
pub struct ReportLayoutEngine<'a> {
    config: &'a ReportConfig,
    layout: &'a LayoutConfig,
    font: &'a ReportFont,
    logo: Option<&'a LoadedImage>,
    pages: Vec<ReportPage>,
    cursor: LayoutCursor,
}

impl<'a> ReportLayoutEngine<'a> {
    /// `logo` is drawn under the title on the first page; `None` leaves it out.
    pub fn new(config: &'a ReportConfig, font: &'a ReportFont, logo: Option<&'a LoadedImage>) -> Self {
        Self {
            config,
            layout: &config.layout,
            font,
            logo,
            pages: Vec::new(),
            cursor: LayoutCursor { page: 0, y: 0.0 },
        }
    }

    /// Lay out every row, in order, below the header on the first page.
    pub fn generate(mut self, rows: &[(ConfigRow, FieldDescriptor)]) -> Result<ReportDocument> {
        self.add_page();

        let config = self.config;
        for (row, descriptor) in rows {
            let content = RowContent::classify(row, descriptor, &config.fields)?;
            debug!(
                "page {} y {:.1}: {} as {}",
                self.cursor.page + 1,
                self.cursor.y,
                row.path,
                content.shape()
            );
            self.render_row(content);
        }

        info!(
            "laid out {} config rows on {} page(s)",
            rows.len(),
            self.pages.len()
        );

        Ok(ReportDocument {
            title: self.config.title.clone(),
            pages: self.pages,
            images: self.logo.into_iter().cloned().collect(),
        })
    }

    fn render_row(&mut self, content: RowContent) {
        let layout = self.layout;
        match content {
            RowContent::Line(text) => {
                self.draw_text(layout.indent_text, text);
                self.line_break();
            }
            RowContent::Bullets { heading, items } => {
                self.draw_text(layout.indent_text, heading);
                for item in items {
                    self.line_break();
                    self.draw_text(layout.indent_multiselect, format!("- {}", item));
                }
                self.line_break();
            }
            RowContent::EmptyTable { heading } => {
                self.draw_text(layout.indent_text, heading);
                self.line_break();
            }
            RowContent::Table { heading, table } => {
                self.draw_text(layout.indent_text, heading);
                self.insert_table(&table);
            }
        }
    }

    fn insert_table(&mut self, table: &SerializedTable) {
        let layout = self.layout;
        let geometry =
            TableGeometry::measure(table, self.font, layout.font_size, layout.table_padding);

        self.line_break();
        self.table_row(&table.headers, &geometry);
        for row in &table.rows {
            self.table_row(row, &geometry);
        }
        self.line_break();
    }

    /// One bordered row: outline, centered cell texts, a divider after
    /// every column. Never split across pages.
    fn table_row(&mut self, cells: &[String], geometry: &TableGeometry) {
        let layout = self.layout;
        let row_height = layout.array_row_height;
        self.ensure_space(row_height);

        let left = layout.indent_multiselect;
        let top = self.cursor.y;
        let bottom = top - row_height;
        self.push(DrawOp::Rect {
            x1: left,
            y1: top,
            x2: left + geometry.row_width,
            y2: bottom,
        });

        for (column, cell) in cells.iter().enumerate() {
            let width = self.font.measure_width(cell, layout.font_size);
            self.push(DrawOp::Text {
                x: left + geometry.text_x(column, width),
                y: top - layout.array_text_offset,
                text: cell.clone(),
            });
            let divider = left + geometry.divider_x(column);
            self.push(DrawOp::Line {
                x1: divider,
                y1: top,
                x2: divider,
                y2: bottom,
            });
        }

        self.advance(row_height);
    }

    // ── Pagination ──────────────────────────────────────────────

    /// Start a new page if an element `next_height` tall would reach the
    /// footer zone.
    fn ensure_space(&mut self, next_height: f64) {
        if page_break::needs_break(self.cursor.y, next_height, self.layout.footer_start) {
            debug!(
                "page {} full at y {:.1} ({:.1} left, next element {:.1})",
                self.cursor.page + 1,
                self.cursor.y,
                page_break::remaining_height(self.cursor.y, self.layout.footer_start),
                next_height
            );
            self.draw_footer();
            self.add_page();
        }
    }

    fn advance(&mut self, height: f64) {
        self.cursor.y -= height;
    }

    fn line_break(&mut self) {
        let height = self.layout.line_break;
        self.ensure_space(height);
        self.advance(height);
    }

    fn add_page(&mut self) {
        let layout = self.layout;
        self.pages
            .push(ReportPage::new(layout.page_width(), layout.page_height()));
        self.cursor = LayoutCursor {
            page: self.pages.len() - 1,
            y: layout.page_top(),
        };

        if self.pages.len() == 1 {
            self.insert_header();
        }
    }

    /// Centered title, then the centered logo below it.
    fn insert_header(&mut self) {
        let layout = self.layout;
        let title = self.config.title.clone();
        let title_width = self.font.measure_width(&title, layout.font_size);
        self.draw_text((layout.page_width() - title_width) / 2.0, title);
        self.line_break();

        if let Some(logo) = self.logo {
            self.ensure_space(logo.height());
            let x1 = (layout.page_width() - logo.width()) / 2.0;
            let top = self.cursor.y;
            self.push(DrawOp::Image {
                x1,
                y1: top - logo.height(),
                x2: x1 + logo.width(),
                y2: top,
                image: 0,
            });
            self.advance(logo.height());
        }
    }

    /// Two support lines at the bottom of the page and a link over the
    /// second one.
    fn draw_footer(&mut self) {
        let layout = self.layout;
        let config = self.config;
        let footer = &config.footer;
        let first = layout.footer_start - layout.line_break;
        let second = layout.footer_start - 2.0 * layout.line_break;

        self.push(DrawOp::Text {
            x: layout.indent_footer,
            y: first,
            text: footer.lines[0].clone(),
        });
        self.push(DrawOp::Text {
            x: layout.indent_footer,
            y: second,
            text: footer.lines[1].clone(),
        });

        if !footer.link_url.is_empty() {
            let width = self.font.measure_width(&footer.lines[1], layout.font_size);
            self.push(DrawOp::Link {
                x1: layout.indent_footer,
                y1: second,
                x2: layout.indent_footer + width,
                y2: second + layout.font_size,
                uri: footer.link_url.clone(),
            });
        }

        if let Some(page) = self.pages.last_mut() {
            page.has_footer = true;
        }
    }

    fn draw_text(&mut self, x: f64, text: String) {
        let y = self.cursor.y;
        self.push(DrawOp::Text { x, y, text });
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.get_mut(self.cursor.page) {
            page.ops.push(op);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageSize;
    use crate::model::StorageKind;

    fn row(path: &str, label: &str, value: &str) -> (ConfigRow, FieldDescriptor) {
        (ConfigRow::new(path, value), FieldDescriptor::plain(label))
    }

    fn array_row(path: &str, label: &str, value: &str) -> (ConfigRow, FieldDescriptor) {
        (
            ConfigRow::new(path, value),
            FieldDescriptor::new(label, StorageKind::SerializedArray),
        )
    }

    /// 300 x 200 page: top at 180, footer from 40, room for six lines.
    fn small_config() -> ReportConfig {
        ReportConfig {
            layout: LayoutConfig {
                page_size: PageSize::Custom {
                    width: 300.0,
                    height: 200.0,
                },
                footer_start: 40.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn layout(config: &ReportConfig, rows: &[(ConfigRow, FieldDescriptor)]) -> ReportDocument {
        let font = ReportFont::helvetica();
        ReportLayoutEngine::new(config, &font, None)
            .generate(rows)
            .unwrap()
    }

    #[test]
    fn header_title_is_centered_on_first_page() {
        let config = ReportConfig::default();
        let doc = layout(&config, &[]);
        assert_eq!(doc.pages.len(), 1);

        let (x, y, text) = doc.pages[0].text_ops().next().unwrap();
        assert_eq!(text, config.title);
        assert_eq!(y, 822.0);
        let width = ReportFont::helvetica().measure_width(&config.title, 10.0);
        assert!((x - (595.0 - width) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn logo_is_centered_below_title() {
        let config = ReportConfig::default();
        let font = ReportFont::helvetica();
        let logo = crate::image_loader::bundled_logo().unwrap();
        let doc = ReportLayoutEngine::new(&config, &font, Some(&logo))
            .generate(&[row("a/b/c", "Label", "v")])
            .unwrap();

        assert_eq!(doc.images.len(), 1);
        let image = doc.pages[0]
            .ops
            .iter()
            .find(|op| matches!(op, DrawOp::Image { .. }))
            .unwrap();
        assert_eq!(
            image,
            &DrawOp::Image {
                x1: 97.5,
                y1: 502.0,
                x2: 497.5,
                y2: 802.0,
                image: 0
            }
        );
        // First row goes right below the logo.
        let (x, y, text) = doc.pages[0].text_ops().nth(1).unwrap();
        assert_eq!((x, y, text), (100.0, 502.0, "Label : v"));
    }

    #[test]
    fn plain_rows_descend_one_line_each() {
        let config = ReportConfig::default();
        let doc = layout(
            &config,
            &[row("a/b/one", "One", "1"), row("a/b/two", "Two", "2")],
        );
        let ops: Vec<_> = doc.pages[0].text_ops().skip(1).collect();
        assert_eq!(ops, vec![(100.0, 802.0, "One : 1"), (100.0, 782.0, "Two : 2")]);
    }

    #[test]
    fn bullets_are_indented_one_per_token() {
        let config = ReportConfig::default();
        let doc = layout(
            &config,
            &[row("a/b/m", "Families", "x,y"), row("a/b/n", "Next", "z")],
        );
        let ops: Vec<_> = doc.pages[0].text_ops().skip(1).collect();
        assert_eq!(
            ops,
            vec![
                (100.0, 802.0, "Families : "),
                (120.0, 782.0, "- x"),
                (120.0, 762.0, "- y"),
                (100.0, 742.0, "Next : z"),
            ]
        );
    }

    #[test]
    fn empty_serialized_array_emits_one_blank_line_and_no_table() {
        let config = ReportConfig::default();
        let doc = layout(
            &config,
            &[array_row("a/b/map", "Mapping", "[]"), row("a/b/n", "Next", "z")],
        );
        let page = &doc.pages[0];
        assert!(!page.ops.iter().any(|op| matches!(op, DrawOp::Rect { .. } | DrawOp::Line { .. })));
        let ops: Vec<_> = page.text_ops().skip(1).collect();
        assert_eq!(ops, vec![(100.0, 802.0, "Mapping : "), (100.0, 782.0, "Next : z")]);
    }

    #[test]
    fn serialized_array_draws_bordered_table() {
        let config = ReportConfig::default();
        let doc = layout(
            &config,
            &[array_row("a/b/map", "Mapping", r#"{"_1":{"A":"1","BB":"22"}}"#)],
        );
        let page = &doc.pages[0];

        let rects: Vec<_> = page
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Rect { .. }))
            .collect();
        assert_eq!(rects.len(), 2, "header row + one record");
        match rects[0] {
            DrawOp::Rect { x1, y1, x2, y2 } => {
                assert_eq!((*x1, *y1, *y2), (120.0, 782.0, 752.0));
                assert!((x2 - (120.0 + 36.68)).abs() < 1e-9);
            }
            _ => unreachable!(),
        }

        let dividers = page
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Line { .. }))
            .count();
        assert_eq!(dividers, 4);

        let texts = page.texts();
        assert_eq!(&texts[1..], &["Mapping : ", "A", "BB", "1", "22"]);
        let (_, header_y, _) = page.text_ops().nth(2).unwrap();
        assert_eq!(header_y, 762.0);
    }

    #[test]
    fn overflow_draws_footer_and_starts_new_page() {
        let config = small_config();
        let rows: Vec<_> = (0..12)
            .map(|i| row(&format!("a/b/f{}", i), &format!("Field {}", i), "v"))
            .collect();
        let doc = layout(&config, &rows);

        assert!(doc.pages.len() >= 2);
        for page in &doc.pages[..doc.pages.len() - 1] {
            assert!(page.has_footer);
            assert_eq!(page.links().count(), 1);
            let texts = page.texts();
            assert!(texts.contains(&config.footer.lines[0].as_str()));
            assert!(texts.contains(&config.footer.lines[1].as_str()));
        }
        // The last page keeps its remaining space and gets no footer.
        assert!(!doc.pages.last().unwrap().has_footer);

        // Title only on the first page.
        for page in &doc.pages[1..] {
            assert!(!page.texts().contains(&config.title.as_str()));
        }
    }

    #[test]
    fn content_never_enters_footer_zone() {
        let config = small_config();
        let mut rows: Vec<_> = (0..5)
            .map(|i| row(&format!("a/b/f{}", i), "Field", "v"))
            .collect();
        rows.push(row("a/b/multi", "Multi", "a,b,c,d,e,f,g,h"));
        rows.push(array_row(
            "a/b/map",
            "Map",
            r#"[{"k":"1","v":"2"},{"k":"3","v":"4"},{"k":"5","v":"6"},{"k":"7","v":"8"}]"#,
        ));
        let doc = layout(&config, &rows);
        let layout = &config.layout;

        for page in &doc.pages {
            for op in &page.ops {
                match op {
                    DrawOp::Text { y, text, .. } if !config.footer.lines.contains(text) => {
                        assert!(*y > layout.footer_start, "{} at {}", text, y);
                        assert!(*y < layout.page_top() + 1.0);
                    }
                    DrawOp::Rect { y2, .. } => assert!(*y2 > layout.footer_start),
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn table_rows_are_not_split_across_pages() {
        let config = small_config();
        let records: Vec<String> = (0..10)
            .map(|i| format!(r#"{{"col":"{}"}}"#, i))
            .collect();
        let value = format!("[{}]", records.join(","));
        let doc = layout(&config, &[array_row("a/b/map", "Map", &value)]);

        assert!(doc.pages.len() > 1);
        let row_height = config.layout.array_row_height;
        for page in &doc.pages {
            for op in &page.ops {
                if let DrawOp::Rect { y1, y2, .. } = op {
                    assert_eq!(y1 - y2, row_height);
                    assert!(*y1 <= config.layout.page_top());
                    assert!(*y2 > config.layout.footer_start);
                }
            }
        }
        let total_rects: usize = doc
            .pages
            .iter()
            .map(|p| p.ops.iter().filter(|op| matches!(op, DrawOp::Rect { .. })).count())
            .sum();
        assert_eq!(total_rects, 11);
    }

    #[test]
    fn page_count_grows_monotonically_with_rows() {
        let config = small_config();
        let mut last = 0;
        for n in 0..30 {
            let rows: Vec<_> = (0..n)
                .map(|i| row(&format!("a/b/f{}", i), "F", "v"))
                .collect();
            let pages = layout(&config, &rows).pages.len();
            assert!(pages >= last);
            last = pages;
        }
        assert!(last > 1);
    }

    #[test]
    fn decoding_failure_aborts_generation() {
        let config = ReportConfig::default();
        let font = ReportFont::helvetica();
        let result = ReportLayoutEngine::new(&config, &font, None)
            .generate(&[array_row("a/b/map", "Map", "{not json")]);
        assert!(matches!(result, Err(crate::error::ReportError::Decoding { .. })));
    }
}
