//! # Array Table Geometry
//!
//! Every column of a serialized-array table is as wide as the widest text
//! anywhere in the table (headers and cells alike), so the table is a grid
//! of equal cells:
//!
//! ```text
//! row width  = widest text * columns + padding
//! cell width = row width / columns
//! ```
//!
//! Text is centered horizontally in its cell.

use crate::font::ReportFont;
use crate::model::SerializedTable;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableGeometry {
    pub columns: usize,
    /// Widest measured header or cell text.
    pub max_text_width: f64,
    pub row_width: f64,
    pub cell_width: f64,
}

impl TableGeometry {
    pub fn measure(table: &SerializedTable, font: &ReportFont, font_size: f64, padding: f64) -> Self {
        let max_text_width = table
            .texts()
            .map(|text| font.measure_width(text, font_size))
            .fold(0.0, f64::max);
        let columns = table.headers.len().max(1);
        let row_width = max_text_width * columns as f64 + padding;

        TableGeometry {
            columns,
            max_text_width,
            row_width,
            cell_width: row_width / columns as f64,
        }
    }

    /// Offset from the table's left edge to the start of a centered text.
    pub fn text_x(&self, column: usize, text_width: f64) -> f64 {
        self.cell_width * column as f64 + (self.cell_width - text_width) / 2.0
    }

    /// Offset from the table's left edge to the right border of a column.
    pub fn divider_x(&self, column: usize) -> f64 {
        self.cell_width * (column + 1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> SerializedTable {
        SerializedTable {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn cell_width_comes_from_widest_text() {
        let font = ReportFont::helvetica();
        let g = TableGeometry::measure(&table(&["A", "BB"], &[&["1", "22"]]), &font, 10.0, 10.0);
        // "BB" = 2 * 667 units is the widest text.
        assert!((g.max_text_width - 13.34).abs() < 1e-9);
        assert!((g.row_width - 36.68).abs() < 1e-9);
        assert!((g.cell_width - 18.34).abs() < 1e-9);
        assert_eq!(g.columns, 2);
    }

    #[test]
    fn geometry_does_not_depend_on_order() {
        let font = ReportFont::helvetica();
        let a = TableGeometry::measure(&table(&["A", "BB"], &[&["1", "22"]]), &font, 10.0, 10.0);
        let b = TableGeometry::measure(&table(&["BB", "A"], &[&["22", "1"]]), &font, 10.0, 10.0);
        assert_eq!(a, b);
    }

    #[test]
    fn cell_text_can_be_the_widest() {
        let font = ReportFont::helvetica();
        let g = TableGeometry::measure(&table(&["a"], &[&["WWW"]]), &font, 10.0, 0.0);
        assert!((g.cell_width - font.measure_width("WWW", 10.0)).abs() < 1e-9);
    }

    #[test]
    fn text_is_centered_in_its_cell() {
        let g = TableGeometry {
            columns: 2,
            max_text_width: 20.0,
            row_width: 50.0,
            cell_width: 25.0,
        };
        assert_eq!(g.text_x(0, 5.0), 10.0);
        assert_eq!(g.text_x(1, 5.0), 35.0);
        assert_eq!(g.divider_x(0), 25.0);
        assert_eq!(g.divider_x(1), 50.0);
    }
}
