// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Builtin PDF renderer — lays out plain text or a single image on fresh pages
// with `printpdf` 0.8. Used when no external generation engine is available.

use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, RawImage,
    RawImageData, RawImageFormat, TextItem, XObjectTransform,
};
use stampwerk_core::error::Result;
use tracing::{debug, info, instrument};

use crate::image::processor::ImageProcessor;

/// Page sizes the builtin renderer lays out on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

impl PageSize {
    fn dimensions(&self) -> (Mm, Mm) {
        match self {
            Self::A4 => (Mm(210.0), Mm(297.0)),
            Self::Letter => (Mm(215.9), Mm(279.4)),
        }
    }
}

const FONT_SIZE_PT: f32 = 11.0;
const LINE_HEIGHT_PT: f32 = 14.0;
const TEXT_MARGIN_MM: f32 = 20.0;
const IMAGE_MARGIN_MM: f32 = 15.0;
const IMAGE_DPI: f32 = 150.0;

/// Creates new PDFs from text or images.
pub struct PdfWriter {
    page_size: PageSize,
    title: Option<String>,
}

impl PdfWriter {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            page_size,
            title: None,
        }
    }

    pub fn a4() -> Self {
        Self::new(PageSize::A4)
    }

    /// Title stored in the document metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Lay out `text` top to bottom in Helvetica, wrapping long lines and
    /// breaking pages as needed. Empty input yields one blank page.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub fn create_from_text(&self, text: &str) -> Result<Vec<u8>> {
        let (page_w, page_h) = self.page_size.dimensions();
        let title = self.title.as_deref().unwrap_or("Stampwerk Document");
        info!(page_size = ?self.page_size, title, "Rendering text PDF");

        let margin_pt = Mm(TEXT_MARGIN_MM).into_pt().0;
        let usable_width_pt = page_w.into_pt().0 - 2.0 * margin_pt;
        let char_width_pt = 0.5 * FONT_SIZE_PT;
        let max_chars = ((usable_width_pt / char_width_pt) as usize).max(1);

        let lines = wrap_text(text, max_chars);
        let page_h_pt = page_h.into_pt().0;
        let lines_per_page = (((page_h_pt - 2.0 * margin_pt) / LINE_HEIGHT_PT) as usize).max(1);

        let mut pages: Vec<PdfPage> = lines
            .chunks(lines_per_page)
            .map(|chunk| {
                let mut ops = Vec::with_capacity(chunk.len() * 5);
                for (row, line) in chunk.iter().enumerate() {
                    let y_pt = page_h_pt - margin_pt - row as f32 * LINE_HEIGHT_PT;
                    ops.push(Op::StartTextSection);
                    ops.push(Op::SetTextCursor {
                        pos: Point {
                            x: Pt(margin_pt),
                            y: Pt(y_pt),
                        },
                    });
                    ops.push(Op::SetFontSizeBuiltinFont {
                        size: Pt(FONT_SIZE_PT),
                        font: BuiltinFont::Helvetica,
                    });
                    ops.push(Op::WriteTextBuiltinFont {
                        items: vec![TextItem::Text(line.clone())],
                        font: BuiltinFont::Helvetica,
                    });
                    ops.push(Op::EndTextSection);
                }
                PdfPage::new(page_w, page_h, ops)
            })
            .collect();

        if pages.is_empty() {
            pages.push(PdfPage::new(page_w, page_h, Vec::new()));
        }
        debug!(lines = lines.len(), pages = pages.len(), "Text laid out");

        let mut doc = PdfDocument::new(title);
        doc.with_pages(pages);
        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        Ok(doc.save(&PdfSaveOptions::default(), &mut warnings))
    }

    /// Place one image centred on a single page, scaled down to fit inside
    /// the margins but never enlarged.
    #[instrument(skip(self, image_bytes), fields(bytes_len = image_bytes.len()))]
    pub fn create_from_image(&self, image_bytes: &[u8]) -> Result<Vec<u8>> {
        let (page_w, page_h) = self.page_size.dimensions();
        let title = self.title.as_deref().unwrap_or("Stampwerk Image");

        let prepared = ImageProcessor::prepare(image_bytes)?;
        info!(
            width = prepared.width,
            height = prepared.height,
            "Rendering image PDF"
        );

        let raw = RawImage {
            pixels: RawImageData::U8(prepared.pixels.rgb),
            width: prepared.width as usize,
            height: prepared.height as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };

        let mut doc = PdfDocument::new(title);
        let xobject_id = doc.add_image(&raw);

        let margin_pt = Mm(IMAGE_MARGIN_MM).into_pt().0;
        let usable_w_pt = page_w.into_pt().0 - 2.0 * margin_pt;
        let usable_h_pt = page_h.into_pt().0 - 2.0 * margin_pt;

        let native_w_pt = prepared.width as f32 / IMAGE_DPI * 72.0;
        let native_h_pt = prepared.height as f32 / IMAGE_DPI * 72.0;
        let scale = (usable_w_pt / native_w_pt)
            .min(usable_h_pt / native_h_pt)
            .min(1.0);

        let x_offset = margin_pt + (usable_w_pt - native_w_pt * scale) / 2.0;
        let y_offset = margin_pt + (usable_h_pt - native_h_pt * scale) / 2.0;

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(x_offset)),
                translate_y: Some(Pt(y_offset)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(IMAGE_DPI),
                rotate: None,
            },
        }];
        doc.with_pages(vec![PdfPage::new(page_w, page_h, ops)]);
        debug!(scale, x_offset, y_offset, "Image placed");

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        Ok(doc.save(&PdfSaveOptions::default(), &mut warnings))
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::a4()
    }
}

/// Word-wrap `text` to lines of at most `max_width` characters.
///
/// Existing line breaks are kept; words longer than a line are split.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let rest = word.split_off(max_width);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let word: String = word.into_iter().collect();
            let current_len = current.chars().count();
            if current.is_empty() {
                current = word;
            } else if current_len + 1 + word.chars().count() <= max_width {
                current.push(' ');
                current.push_str(&word);
            } else {
                lines.push(std::mem::replace(&mut current, word));
            }
        }
        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(
            wrap_text("the quick brown fox", 10),
            vec!["the quick", "brown fox"]
        );
    }

    #[test]
    fn keeps_blank_lines_and_splits_long_words() {
        assert_eq!(wrap_text("a\n\nb", 5), vec!["a", "", "b"]);
        assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
    }

    #[test]
    fn text_pdf_parses_back() {
        let bytes = PdfWriter::a4()
            .with_title("Notes")
            .create_from_text("hello\nworld")
            .unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn long_text_spans_pages() {
        let text = "line\n".repeat(200);
        let bytes = PdfWriter::new(PageSize::Letter)
            .create_from_text(&text)
            .unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() > 1);
    }

    #[test]
    fn image_pdf_has_one_page() {
        let img = ::image::RgbImage::from_pixel(20, 10, ::image::Rgb([0, 128, 255]));
        let mut png = std::io::Cursor::new(Vec::new());
        img.write_to(&mut png, ::image::ImageFormat::Png).unwrap();

        let bytes = PdfWriter::default()
            .create_from_image(png.get_ref())
            .unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn non_image_bytes_are_rejected() {
        assert!(PdfWriter::default().create_from_image(b"plain text").is_err());
    }
}
