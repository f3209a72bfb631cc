//! # PDF Serializer
//!
//! Writes a laid-out [`ReportDocument`] as a PDF 1.7 file. The subset of
//! PDF the report needs is small enough to write by hand: one font, at most
//! one image, stroked lines and rectangles, text, and link annotations.
//!
//! ```text
//! %PDF-1.7
//! 1 0 obj  Catalog
//! 2 0 obj  Pages
//! 3.. obj  font objects, image XObjects, then per page:
//!          link annotations, content stream, page dictionary
//! xref / trailer / %%EOF
//! ```
//!
//! Standard fonts are referenced by name with WinAnsiEncoding. TrueType
//! fonts are embedded whole as CIDFontType2 with Identity-H encoding, so the
//! text operands are the same glyph numbers the layout measured with.

use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>

use log::debug;
use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::{ReportError, Result};
use crate::font::metrics::{unicode_to_winansi, REPLACEMENT_CODE};
use crate::font::{ReportFont, TrueTypeFont};
use crate::image_loader::{ImagePixelData, JpegColorSpace, LoadedImage};
use crate::layout::{DrawOp, ReportDocument, ReportPage};

const FONT_RESOURCE: &str = "F1";

pub struct PdfWriter {
    font_size: f64,
}

/// Tracks allocated PDF objects during writing. Object ids are indices.
struct PdfBuilder {
    objects: Vec<Vec<u8>>,
}

impl PdfBuilder {
    fn new() -> Self {
        // 0 = placeholder (PDF objects are 1-indexed), 1 = Catalog, 2 = Pages
        Self {
            objects: vec![Vec::new(), Vec::new(), Vec::new()],
        }
    }

    fn push(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(data);
        self.objects.len() - 1
    }

    fn push_stream(&mut self, dict_entries: &str, content: &[u8]) -> usize {
        let mut data: Vec<u8> = Vec::new();
        let _ = write!(
            data,
            "<< {} /Length {} >>\nstream\n",
            dict_entries,
            content.len()
        );
        data.extend_from_slice(content);
        data.extend_from_slice(b"\nendstream");
        self.push(data)
    }
}

impl PdfWriter {
    pub fn new(font_size: f64) -> Self {
        Self { font_size }
    }

    /// Serialize the document. Fails if a draw operation cannot be encoded.
    pub fn write(&self, document: &ReportDocument, font: &ReportFont) -> Result<Vec<u8>> {
        let mut builder = PdfBuilder::new();

        let font_id = match font {
            ReportFont::Standard(standard) => builder.push(
                format!(
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                    standard.pdf_name()
                )
                .into_bytes(),
            ),
            ReportFont::TrueType(ttf) => {
                Self::write_truetype_font(&mut builder, ttf, &document.pages)
            }
        };

        let image_ids: Vec<usize> = document
            .images
            .iter()
            .map(|image| Self::write_image_xobject(&mut builder, image))
            .collect();

        let mut page_ids = Vec::with_capacity(document.pages.len());
        for (index, page) in document.pages.iter().enumerate() {
            let content = self.build_content_stream(page, font, image_ids.len())?;
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);
            let content_id = builder.push_stream("/Filter /FlateDecode", &compressed);

            let mut annot_ids = Vec::new();
            for op in &page.ops {
                if let DrawOp::Link { x1, y1, x2, y2, uri } = op {
                    let annot = Self::link_annotation(*x1, *y1, *x2, *y2, uri)?;
                    annot_ids.push(builder.push(annot.into_bytes()));
                }
            }

            let xobjects: String = image_ids
                .iter()
                .enumerate()
                .map(|(i, id)| format!("/Im{} {} 0 R", i, id))
                .collect::<Vec<_>>()
                .join(" ");
            let mut resources = format!("/Font << /{} {} 0 R >>", FONT_RESOURCE, font_id);
            if !xobjects.is_empty() {
                let _ = write!(resources, " /XObject << {} >>", xobjects);
            }
            let annots = if annot_ids.is_empty() {
                String::new()
            } else {
                let refs: Vec<String> = annot_ids.iter().map(|id| format!("{} 0 R", id)).collect();
                format!(" /Annots [{}]", refs.join(" "))
            };

            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                 /Contents {} 0 R /Resources << {} >>{} >>",
                fmt_num(page.width),
                fmt_num(page.height),
                content_id,
                resources,
                annots
            );
            page_ids.push(builder.push(page_dict.into_bytes()));
            debug!(
                "page {}: {} draw ops, {} link(s)",
                index + 1,
                page.ops.len(),
                annot_ids.len()
            );
        }

        builder.objects[1] = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();
        let kids: Vec<String> = page_ids.iter().map(|id| format!("{} 0 R", id)).collect();
        builder.objects[2] = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            page_ids.len()
        )
        .into_bytes();

        let info_id = builder.push(
            format!(
                "<< /Title ({}) /Producer (config-report) /Creator (config-report) >>",
                escape_pdf_string(&document.title)
            )
            .into_bytes(),
        );

        Ok(Self::serialize(&builder, info_id))
    }

    /// PDF operators for one page.
    fn build_content_stream(
        &self,
        page: &ReportPage,
        font: &ReportFont,
        image_count: usize,
    ) -> Result<String> {
        let mut stream = String::new();
        // Black strokes, 1 unit wide
        stream.push_str("0 0 0 RG\n1 w\n");

        for op in &page.ops {
            match op {
                DrawOp::Text { x, y, text } => {
                    let _ = write!(
                        stream,
                        "BT\n/{} {} Tf\n{} {} Td\n{} Tj\nET\n",
                        FONT_RESOURCE,
                        fmt_num(self.font_size),
                        fmt_num(*x),
                        fmt_num(*y),
                        encode_text(text, font)
                    );
                }
                DrawOp::Line { x1, y1, x2, y2 } => {
                    let _ = write!(
                        stream,
                        "{} {} m\n{} {} l\nS\n",
                        fmt_num(*x1),
                        fmt_num(*y1),
                        fmt_num(*x2),
                        fmt_num(*y2)
                    );
                }
                DrawOp::Rect { x1, y1, x2, y2 } => {
                    let _ = write!(
                        stream,
                        "{} {} {} {} re\nS\n",
                        fmt_num(x1.min(*x2)),
                        fmt_num(y1.min(*y2)),
                        fmt_num((x2 - x1).abs()),
                        fmt_num((y2 - y1).abs())
                    );
                }
                DrawOp::Image {
                    x1,
                    y1,
                    x2,
                    y2,
                    image,
                } => {
                    if *image >= image_count {
                        return Err(ReportError::rendering(format!(
                            "draw operation references missing image {}",
                            image
                        )));
                    }
                    let _ = write!(
                        stream,
                        "q\n{} 0 0 {} {} {} cm\n/Im{} Do\nQ\n",
                        fmt_num(x2 - x1),
                        fmt_num(y2 - y1),
                        fmt_num(*x1),
                        fmt_num(*y1),
                        image
                    );
                }
                // Links become annotations, not content.
                DrawOp::Link { .. } => {}
            }
        }

        Ok(stream)
    }

    fn link_annotation(x1: f64, y1: f64, x2: f64, y2: f64, uri: &str) -> Result<String> {
        if uri.is_empty() || !uri.chars().all(|c| c.is_ascii_graphic()) {
            return Err(ReportError::rendering(format!(
                "invalid link target '{}'",
                uri
            )));
        }
        Ok(format!(
            "<< /Type /Annot /Subtype /Link /Rect [{} {} {} {}] /Border [0 0 0] \
             /A << /Type /Action /S /URI /URI ({}) >> >>",
            fmt_num(x1.min(x2)),
            fmt_num(y1.min(y2)),
            fmt_num(x1.max(x2)),
            fmt_num(y1.max(y2)),
            escape_pdf_string(uri)
        ))
    }

    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let color_space = match color_space {
                    JpegColorSpace::DeviceRGB => "/DeviceRGB",
                    JpegColorSpace::DeviceGray => "/DeviceGray",
                };
                builder.push_stream(
                    &format!(
                        "/Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace {} /BitsPerComponent 8 /Filter /DCTDecode",
                        image.width_px, image.height_px, color_space
                    ),
                    data,
                )
            }
            ImagePixelData::Decoded { rgb, alpha } => {
                let smask_ref = alpha
                    .as_ref()
                    .map(|alpha| {
                        let id = builder.push_stream(
                            &format!(
                                "/Type /XObject /Subtype /Image /Width {} /Height {} \
                                 /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /FlateDecode",
                                image.width_px, image.height_px
                            ),
                            &compress_to_vec_zlib(alpha, 6),
                        );
                        format!(" /SMask {} 0 R", id)
                    })
                    .unwrap_or_default();

                builder.push_stream(
                    &format!(
                        "/Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode{}",
                        image.width_px, image.height_px, smask_ref
                    ),
                    &compress_to_vec_zlib(rgb, 6),
                )
            }
        }
    }

    /// Embed a TrueType font: FontFile2, FontDescriptor, CIDFont, ToUnicode
    /// and the Type0 root. Returns the Type0 object id.
    fn write_truetype_font(builder: &mut PdfBuilder, font: &TrueTypeFont, pages: &[ReportPage]) -> usize {
        // glyph -> first code unit drawn with it, for widths and ToUnicode
        let mut used: BTreeMap<u16, u16> = BTreeMap::new();
        for page in pages {
            for (_, _, text) in page.text_ops() {
                for unit in text.encode_utf16() {
                    used.entry(font.glyph_for_unit(unit)).or_insert(unit);
                }
            }
        }

        let compressed = compress_to_vec_zlib(&font.data, 6);
        let fontfile_id = builder.push_stream(
            &format!("/Length1 {} /Filter /FlateDecode", font.data.len()),
            &compressed,
        );

        let scale = 1000.0 / font.units_per_em as f64;
        let to_pdf = |v: i16| (v as f64 * scale) as i32;
        let (x_min, y_min, x_max, y_max) = font.bbox;
        let descriptor_id = builder.push(
            format!(
                "<< /Type /FontDescriptor /FontName /{} /Flags 4 \
                 /FontBBox [{} {} {} {}] /ItalicAngle 0 \
                 /Ascent {} /Descent {} /CapHeight {} /StemV 80 \
                 /FontFile2 {} 0 R >>",
                font.name,
                to_pdf(x_min),
                to_pdf(y_min),
                to_pdf(x_max),
                to_pdf(y_max),
                to_pdf(font.ascender),
                to_pdf(font.descender),
                to_pdf(font.cap_height),
                fontfile_id
            )
            .into_bytes(),
        );

        let mut widths = String::from("[");
        for &glyph in used.keys() {
            let _ = write!(
                widths,
                " {} [{}]",
                glyph,
                (font.advance(glyph) as f64 * scale) as u32
            );
        }
        widths.push_str(" ]");
        let default_width = (font.advance(0) as f64 * scale) as u32;

        let cidfont_id = builder.push(
            format!(
                "<< /Type /Font /Subtype /CIDFontType2 /BaseFont /{} \
                 /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> \
                 /FontDescriptor {} 0 R /DW {} /W {} /CIDToGIDMap /Identity >>",
                font.name, descriptor_id, default_width, widths
            )
            .into_bytes(),
        );

        let cmap = build_tounicode_cmap(&used, &font.name);
        let tounicode_id =
            builder.push_stream("/Filter /FlateDecode", &compress_to_vec_zlib(cmap.as_bytes(), 6));

        builder.push(
            format!(
                "<< /Type /Font /Subtype /Type0 /BaseFont /{} /Encoding /Identity-H \
                 /DescendantFonts [{} 0 R] /ToUnicode {} 0 R >>",
                font.name, cidfont_id, tounicode_id
            )
            .into_bytes(),
        )
    }

    fn serialize(builder: &PdfBuilder, info_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, data) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in &offsets[1..] {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_id,
            xref_offset
        );

        output
    }
}

/// Text operand for `Tj`: a literal WinAnsi string for standard fonts, a
/// hex string of glyph ids for embedded ones.
fn encode_text(text: &str, font: &ReportFont) -> String {
    let units: Vec<u16> = text.encode_utf16().collect();
    match font {
        ReportFont::Standard(_) => {
            let mut out = String::from("(");
            for &unit in &units {
                let b = unicode_to_winansi(unit).unwrap_or(REPLACEMENT_CODE);
                match b {
                    b'\\' => out.push_str("\\\\"),
                    b'(' => out.push_str("\\("),
                    b')' => out.push_str("\\)"),
                    0x20..=0x7E => out.push(b as char),
                    _ => {
                        let _ = write!(out, "\\{:03o}", b);
                    }
                }
            }
            out.push(')');
            out
        }
        ReportFont::TrueType(_) => {
            let mut out = String::from("<");
            for glyph in font.glyph_numbers(&units) {
                let _ = write!(out, "{:04X}", glyph);
            }
            out.push('>');
            out
        }
    }
}

/// ToUnicode CMap so text can be copied out of the PDF.
fn build_tounicode_cmap(glyph_to_unit: &BTreeMap<u16, u16>, font_name: &str) -> String {
    let mut cmap = String::new();
    cmap.push_str("/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n");
    cmap.push_str("/CIDSystemInfo\n<< /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
    let _ = writeln!(cmap, "/CMapName /{}-UTF16 def", font_name);
    cmap.push_str("/CMapType 2 def\n1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

    let entries: Vec<(&u16, &u16)> = glyph_to_unit.iter().collect();
    // beginbfchar blocks hold at most 100 entries
    for chunk in entries.chunks(100) {
        let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
        for (glyph, unit) in chunk {
            let _ = writeln!(cmap, "<{:04X}> <{:04X}>", glyph, unit);
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    cmap
}

fn escape_pdf_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// Compact number formatting: up to 3 decimals, no trailing zeros.
fn fmt_num(v: f64) -> String {
    let s = format!("{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" || s.is_empty() {
        "0".to_string()
    } else {
        s.to_string()
    }
}
