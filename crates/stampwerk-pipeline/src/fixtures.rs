// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File-based helpers over the document crate's test documents.

use std::path::{Path, PathBuf};

use lopdf::Document;
use stampwerk_document::fixtures;

pub(crate) use stampwerk_document::fixtures::{form_pdf, sample_png};

/// Write a `pages`-page document to `dir/name`.
pub(crate) fn write_pdf(dir: &Path, name: &str, pages: u32) -> PathBuf {
    write_bytes(dir, name, &fixtures::sample_pdf(pages))
}

/// Write `bytes` to `dir/name`.
pub(crate) fn write_bytes(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Every string shown with `Tj` on 1-based page `page_number` of `path`.
pub(crate) fn shown_strings(path: &Path, page_number: u32) -> Vec<String> {
    fixtures::shown_strings(&Document::load(path).unwrap(), page_number)
}

/// Text and image paints on page `page_number` of `path`, in content order.
pub(crate) fn painted(path: &Path, page_number: u32) -> Vec<String> {
    fixtures::painted(&Document::load(path).unwrap(), page_number)
}
