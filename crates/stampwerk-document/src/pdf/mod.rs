// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — editing existing documents with `lopdf` and creating new ones
// with `printpdf`.

pub mod document;
pub mod forms;
pub mod text;
pub mod writer;

pub use document::PdfDocument;
pub use writer::PdfWriter;
