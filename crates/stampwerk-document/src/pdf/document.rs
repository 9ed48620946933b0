// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Editable PDF document — open an existing file with `lopdf`, draw text,
// images, and lines onto its pages, and serialise the result.
//
// Every drawing call appends a new content stream to the page. The page's
// original content is wrapped in a `q ... Q` pair the first time the page is
// touched, so whatever graphics state it leaves behind cannot leak into ours.

use std::collections::{BTreeMap, HashMap, HashSet};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use stampwerk_core::error::{Result, StampwerkError};
use stampwerk_core::types::{Point, Rect, Rgb};
use tracing::{debug, info, instrument, warn};

use crate::image::processor::{EmbeddableImage, PixelData};
use crate::pdf::text::{StandardFont, encode_win_ansi, object_text};

/// Guard against cyclic `/Parent` chains in malformed page trees.
const MAX_TREE_DEPTH: usize = 64;

/// Line spacing as a multiple of the font size for multi-line text.
const LINE_SPACING: f32 = 1.2;

/// How to draw one run of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub position: Point,
    pub font: StandardFont,
    pub size: f32,
    pub color: Rgb,
    /// Counter-clockwise rotation in degrees around `position`.
    pub rotation: f32,
}

/// An existing PDF opened for modification.
///
/// Wraps `lopdf::Document` and caches the page list, which the modifier never
/// changes.
pub struct PdfDocument {
    /// The underlying lopdf document.
    document: Document,
    /// Page object IDs in page order (index 0 is page 1).
    page_ids: Vec<ObjectId>,
    /// Font dictionaries already added to this document.
    font_ids: HashMap<StandardFont, ObjectId>,
    /// Pages whose original content has already been isolated.
    isolated_pages: HashSet<ObjectId>,
}

impl PdfDocument {
    // -- Construction ---------------------------------------------------------

    /// Parse a PDF already read into memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_named(data, "<memory>")
    }

    /// Parse a PDF already read into memory, naming it for error messages.
    #[instrument(skip(data), fields(bytes_len = data.len()))]
    pub fn from_bytes_named(data: &[u8], name: &str) -> Result<Self> {
        let document =
            Document::load_mem(data).map_err(|err| StampwerkError::DocumentOpenError {
                path: name.to_string(),
                reason: err.to_string(),
            })?;

        let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();
        debug!(pages = page_ids.len(), "PDF loaded");

        Ok(Self {
            document,
            page_ids,
            font_ids: HashMap::new(),
            isolated_pages: HashSet::new(),
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.page_ids.len() as u32
    }

    /// Object ID of the page at `index` (0-based).
    pub fn page_id(&self, index: u32) -> Result<ObjectId> {
        self.page_ids
            .get(index as usize)
            .copied()
            .ok_or(StampwerkError::PageOutOfRange {
                index,
                page_count: self.page_count(),
            })
    }

    /// Borrow the underlying lopdf document.
    pub fn inner(&self) -> &Document {
        &self.document
    }

    pub(crate) fn inner_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Entries of the `/Info` dictionary that hold text (Title, Author, ...).
    pub fn info(&self) -> BTreeMap<String, String> {
        let mut info = BTreeMap::new();
        let Ok(info_obj) = self.document.trailer.get(b"Info") else {
            return info;
        };
        let Some(dict) = resolve_dict(&self.document, info_obj) else {
            return info;
        };
        for (key, value) in dict.iter() {
            if let Some(text) = object_text(value) {
                info.insert(String::from_utf8_lossy(key).into_owned(), text);
            }
        }
        info
    }

    // -- Drawing --------------------------------------------------------------

    /// Draw text on the page at `index`. Newlines start a new line below.
    #[instrument(skip(self, text, style), fields(page = index, text_len = text.len()))]
    pub fn draw_text(&mut self, index: u32, text: &str, style: &TextStyle) -> Result<()> {
        let page_id = self.page_id(index)?;
        let font_name = style.font.resource_name();
        let font_id = self.font_object(style.font);
        self.register_resource(page_id, "Font", &font_name, font_id)?;

        let Rgb { r, g, b } = style.color;
        let mut operations = vec![
            Operation::new("q", vec![]),
            Operation::new("rg", vec![r.into(), g.into(), b.into()]),
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(font_name.into_bytes()), style.size.into()],
            ),
            Operation::new("TL", vec![(style.size * LINE_SPACING).into()]),
        ];

        let (x, y) = (style.position.x, style.position.y);
        if style.rotation == 0.0 {
            operations.push(Operation::new("Td", vec![x.into(), y.into()]));
        } else {
            let (sin, cos) = style.rotation.to_radians().sin_cos();
            operations.push(Operation::new(
                "Tm",
                vec![
                    cos.into(),
                    sin.into(),
                    (-sin).into(),
                    cos.into(),
                    x.into(),
                    y.into(),
                ],
            ));
        }

        for (line_no, line) in text.lines().enumerate() {
            if line_no > 0 {
                operations.push(Operation::new("T*", vec![]));
            }
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(line), lopdf::StringFormat::Literal)],
            ));
        }

        operations.push(Operation::new("ET", vec![]));
        operations.push(Operation::new("Q", vec![]));

        self.append_content(page_id, operations)
    }

    /// Draw a straight line, e.g. a signing line under a typed signature.
    pub fn draw_line(
        &mut self,
        index: u32,
        from: Point,
        to: Point,
        width: f32,
        color: Rgb,
    ) -> Result<()> {
        let page_id = self.page_id(index)?;
        let Rgb { r, g, b } = color;
        let operations = vec![
            Operation::new("q", vec![]),
            Operation::new("RG", vec![r.into(), g.into(), b.into()]),
            Operation::new("w", vec![width.into()]),
            Operation::new("m", vec![from.x.into(), from.y.into()]),
            Operation::new("l", vec![to.x.into(), to.y.into()]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ];
        self.append_content(page_id, operations)
    }

    /// Add an image XObject to the document and return its object ID.
    ///
    /// The same image can then be drawn on any number of pages.
    #[instrument(skip_all, fields(width = image.width, height = image.height))]
    pub fn embed_image(&mut self, image: &EmbeddableImage) -> Result<ObjectId> {
        let PixelData { rgb, alpha } = &image.pixels;

        let mut image_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width as i64,
            "Height" => image.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        };

        if let Some(alpha) = alpha {
            let mask = compressed_stream(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => image.width as i64,
                    "Height" => image.height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                alpha.clone(),
            );
            let mask_id = self.document.add_object(mask);
            image_dict.set("SMask", Object::Reference(mask_id));
        }

        let image_id = self
            .document
            .add_object(compressed_stream(image_dict, rgb.clone()));
        debug!(?image_id, has_alpha = alpha.is_some(), "Image embedded");
        Ok(image_id)
    }

    /// Draw a previously embedded image, stretched to fill `rect`.
    #[instrument(skip(self), fields(page = index))]
    pub fn draw_image(&mut self, index: u32, image_id: ObjectId, rect: Rect) -> Result<()> {
        let page_id = self.page_id(index)?;
        let name = format!("SwIm{}", image_id.0);
        self.register_resource(page_id, "XObject", &name, image_id)?;

        let operations = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    rect.width().into(),
                    0.into(),
                    0.into(),
                    rect.height().into(),
                    rect.x1.into(),
                    rect.y1.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ];
        self.append_content(page_id, operations)
    }

    // -- Output ---------------------------------------------------------------

    /// Serialise the document.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.document
            .save_to(&mut output)
            .map_err(|err| StampwerkError::PdfError(format!("failed to serialise PDF: {err}")))?;
        info!(output_bytes = output.len(), "PDF serialised");
        Ok(output)
    }

    // -- Helpers --------------------------------------------------------------

    /// The font dictionary for `font`, added on first use.
    fn font_object(&mut self, font: StandardFont) -> ObjectId {
        if let Some(id) = self.font_ids.get(&font) {
            return *id;
        }
        let id = self.document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        self.font_ids.insert(font, id);
        id
    }

    /// The resources that apply to a page: its own, or the nearest inherited
    /// ones from the page tree.
    fn effective_resources(&self, page_id: ObjectId) -> Dictionary {
        let mut current = page_id;
        for _ in 0..MAX_TREE_DEPTH {
            let Ok(Object::Dictionary(node)) = self.document.get_object(current) else {
                break;
            };
            if let Ok(resources) = node.get(b"Resources") {
                return resolve_dict(&self.document, resources)
                    .cloned()
                    .unwrap_or_else(Dictionary::new);
            }
            match node.get(b"Parent") {
                Ok(Object::Reference(parent)) => current = *parent,
                _ => break,
            }
        }
        Dictionary::new()
    }

    /// Make `name` refer to `target` in the page's `/category` resources.
    ///
    /// The page receives its own inline copy of its resources so shared or
    /// inherited dictionaries used by other pages are left untouched.
    fn register_resource(
        &mut self,
        page_id: ObjectId,
        category: &str,
        name: &str,
        target: ObjectId,
    ) -> Result<()> {
        let mut resources = self.effective_resources(page_id);
        let mut entries = resources
            .get(category.as_bytes())
            .ok()
            .and_then(|entries| resolve_dict(&self.document, entries))
            .cloned()
            .unwrap_or_else(Dictionary::new);

        entries.set(name, Object::Reference(target));
        resources.set(category, Object::Dictionary(entries));

        match self.document.get_object_mut(page_id) {
            Ok(Object::Dictionary(page)) => {
                page.set("Resources", Object::Dictionary(resources));
                Ok(())
            }
            _ => Err(StampwerkError::PdfError(format!(
                "page object {page_id:?} is not a dictionary"
            ))),
        }
    }

    /// Append a content stream to a page.
    fn append_content(&mut self, page_id: ObjectId, operations: Vec<Operation>) -> Result<()> {
        let encoded = Content { operations }
            .encode()
            .map_err(|err| StampwerkError::PdfError(format!("failed to encode content: {err}")))?;

        let existing: Vec<Object> = match self.document.get_object(page_id) {
            Ok(Object::Dictionary(page)) => match page.get(b"Contents") {
                Ok(Object::Reference(id)) => match self.document.get_object(*id) {
                    Ok(Object::Array(items)) => items.clone(),
                    _ => vec![Object::Reference(*id)],
                },
                Ok(Object::Array(items)) => items.clone(),
                Ok(_) => {
                    warn!(?page_id, "Unexpected /Contents, replacing");
                    Vec::new()
                }
                Err(_) => Vec::new(),
            },
            _ => {
                return Err(StampwerkError::PdfError(format!(
                    "page object {page_id:?} is not a dictionary"
                )));
            }
        };

        let mut contents = Vec::with_capacity(existing.len() + 3);
        if self.isolated_pages.insert(page_id) && !existing.is_empty() {
            let save = self.document.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            let restore = self.document.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
            contents.push(Object::Reference(save));
            contents.extend(existing);
            contents.push(Object::Reference(restore));
        } else {
            contents.extend(existing);
        }

        let stream_id = self.document.add_object(Stream::new(Dictionary::new(), encoded));
        contents.push(Object::Reference(stream_id));

        if let Ok(Object::Dictionary(page)) = self.document.get_object_mut(page_id) {
            page.set("Contents", Object::Array(contents));
        }
        Ok(())
    }
}

/// Follow a reference (if any) to a dictionary, or to a stream's dictionary.
pub(crate) fn resolve_dict<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match object {
        Object::Dictionary(dict) => Some(dict),
        Object::Reference(id) => match document.get_object(*id) {
            Ok(Object::Dictionary(dict)) => Some(dict),
            Ok(Object::Stream(stream)) => Some(&stream.dict),
            _ => None,
        },
        _ => None,
    }
}

/// Build a stream and Flate-compress it when possible.
fn compressed_stream(dict: Dictionary, content: Vec<u8>) -> Stream {
    let mut stream = Stream::new(dict, content);
    if let Err(err) = stream.compress() {
        debug!(%err, "Stream left uncompressed");
    }
    stream
}
