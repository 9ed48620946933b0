// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// stampwerk-document — Document layer for Stampwerk.
//
// Provides the editable PDF model (pages, text, images, form fields), image
// preparation for embedding, validator-gated text extraction, and generation
// of new PDFs through external engines or the builtin text renderer.

pub mod extract;
#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;
pub mod generate;
pub mod image;
pub mod pdf;

// Re-export the primary structs so callers can use `stampwerk_document::PdfDocument` etc.
pub use extract::{ExtractOptions, ExtractedText, TextExtractor};
pub use generate::{Engine, EngineProbe, GenerationToolchain};
pub use crate::image::processor::{EmbeddableImage, ImageProcessor};
pub use pdf::document::{PdfDocument, TextStyle};
pub use pdf::forms::{FieldKind, FormField};
pub use pdf::text::StandardFont;
pub use pdf::writer::{PageSize, PdfWriter};
