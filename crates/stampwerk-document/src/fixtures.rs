// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Small in-memory documents and images for tests, shared with downstream
// crates through the `test-fixtures` feature.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};

/// A document with `pages` pages, each showing "Page N", sharing inherited
/// resources.
pub fn sample_pdf(pages: u32) -> Vec<u8> {
    build(pages, false)
}

/// Like [`sample_pdf`], with an AcroForm holding one text field, `name`,
/// whose widget sits on page 1.
pub fn form_pdf(pages: u32) -> Vec<u8> {
    build(pages, true)
}

/// A 4x2 half-transparent red PNG.
pub fn sample_png() -> Vec<u8> {
    let img = ::image::RgbaImage::from_pixel(4, 2, ::image::Rgba([255, 0, 0, 128]));
    let mut bytes = std::io::Cursor::new(Vec::new());
    img.write_to(&mut bytes, ::image::ImageFormat::Png)
        .expect("PNG encoding into memory");
    bytes.into_inner()
}

/// Every string shown with `Tj` on 1-based page `page_number`.
pub fn shown_strings(document: &Document, page_number: u32) -> Vec<String> {
    painted(document, page_number)
        .into_iter()
        .filter_map(|item| item.strip_prefix("Tj ").map(str::to_string))
        .collect()
}

/// Text and XObject paints on 1-based page `page_number`, in content order:
/// `"Tj <text>"` or `"Do <name>"`.
pub fn painted(document: &Document, page_number: u32) -> Vec<String> {
    let page_id = document.get_pages()[&page_number];
    let content = document
        .get_and_decode_page_content(page_id)
        .expect("decodable page content");
    content
        .operations
        .iter()
        .filter_map(|op| match (op.operator.as_str(), op.operands.first()) {
            ("Tj", Some(Object::String(bytes, _))) => {
                Some(format!("Tj {}", String::from_utf8_lossy(bytes)))
            }
            ("Do", Some(Object::Name(name))) => Some(format!("Do {}", String::from_utf8_lossy(name))),
            _ => None,
        })
        .collect()
}

fn build(pages: u32, with_form: bool) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for number in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("Page {number}"))]),
                Operation::new("ET", vec![]),
            ],
        };
        let encoded = content.encode().expect("content encoding");
        let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let mut catalog = dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    };

    if with_form && let Some(Object::Reference(first_page)) = kids.first().cloned() {
        let field_id = doc.add_object(dictionary! {
            "FT" => "Tx",
            "T" => Object::string_literal("name"),
            "Subtype" => "Widget",
            "Rect" => vec![72.into(), 600.into(), 272.into(), 620.into()],
            "P" => first_page,
        });
        if let Ok(Object::Dictionary(page)) = doc.get_object_mut(first_page) {
            page.set("Annots", vec![Object::Reference(field_id)]);
        }
        catalog.set(
            "AcroForm",
            dictionary! { "Fields" => vec![Object::Reference(field_id)] },
        );
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("saving into memory");
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_fixture_has_one_named_field() {
        let document = Document::load_mem(&form_pdf(2)).unwrap();
        assert_eq!(document.get_pages().len(), 2);
        assert_eq!(shown_strings(&document, 2), vec!["Page 2".to_string()]);

        let doc = crate::PdfDocument::from_bytes(&form_pdf(1)).unwrap();
        let fields = doc.form_fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "name");
    }
}
