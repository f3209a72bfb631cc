//! Advance widths of the standard PDF fonts the report can use, from the
//! Adobe AFM files, indexed by WinAnsiEncoding code (1000 units per em).

/// Map a UTF-16 code unit to its WinAnsiEncoding byte.
pub fn unicode_to_winansi(unit: u16) -> Option<u8> {
    let cp = unit as u32;
    // ASCII printable and Latin-1 map directly
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    // Windows-1252 special mappings (0x80-0x9F)
    match cp {
        0x20AC => Some(0x80),
        0x201A => Some(0x82),
        0x0192 => Some(0x83),
        0x201E => Some(0x84),
        0x2026 => Some(0x85),
        0x2020 => Some(0x86),
        0x2021 => Some(0x87),
        0x02C6 => Some(0x88),
        0x2030 => Some(0x89),
        0x0160 => Some(0x8A),
        0x2039 => Some(0x8B),
        0x0152 => Some(0x8C),
        0x017D => Some(0x8E),
        0x2018 => Some(0x91),
        0x2019 => Some(0x92),
        0x201C => Some(0x93),
        0x201D => Some(0x94),
        0x2022 => Some(0x95),
        0x2013 => Some(0x96),
        0x2014 => Some(0x97),
        0x02DC => Some(0x98),
        0x2122 => Some(0x99),
        0x0161 => Some(0x9A),
        0x203A => Some(0x9B),
        0x0153 => Some(0x9C),
        0x017E => Some(0x9E),
        0x0178 => Some(0x9F),
        _ => None,
    }
}

/// Code drawn in place of anything WinAnsi cannot encode.
pub const REPLACEMENT_CODE: u8 = b'?';

/// Helvetica, WinAnsi codes 0x20..=0xFF. Codes below 0x20 have no glyph.
const HELVETICA_WIDTHS: [u16; 224] = [
    // 0x20
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0x30
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    // 0x40
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    // 0x50
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    // 0x60
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    // 0x70
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, 0,
    // 0x80
    556, 0, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0,
    // 0x90
    0, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 0, 500, 667,
    // 0xA0
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    // 0xB0
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    // 0xC0
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    // 0xD0
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    // 0xE0
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,
    // 0xF0
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
];

/// Courier is monospaced.
const COURIER_WIDTH: u16 = 600;

/// Width table of one standard font.
#[derive(Debug, Clone, Copy)]
pub enum StandardFontMetrics {
    Helvetica,
    Courier,
}

impl StandardFontMetrics {
    pub const UNITS_PER_EM: u16 = 1000;

    /// Advance width of a WinAnsi code, in font units. Codes come from
    /// [`unicode_to_winansi`], which never yields one below 0x20.
    pub fn code_width(&self, code: u8) -> u16 {
        debug_assert!(code >= 0x20, "control code {:#04x} has no glyph", code);
        match self {
            StandardFontMetrics::Helvetica => {
                HELVETICA_WIDTHS[usize::from(code.saturating_sub(0x20))]
            }
            StandardFontMetrics::Courier => COURIER_WIDTH,
        }
    }
}
