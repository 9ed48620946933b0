// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-document page expansion.

use stampwerk_core::geometry::parse_page_range;
use stampwerk_core::types::{EditSet, PageAddressed, PageTarget};

/// Resolve every page-agnostic edit against a document of `total_pages`.
///
/// An `AllPages` edit becomes one copy per page index `0..total_pages`; a
/// `Range` edit becomes one copy per page the range selects. Concrete edits
/// and form fills pass through. The input set is left untouched.
pub fn expand(edits: &EditSet, total_pages: u32) -> EditSet {
    EditSet::new(
        expand_kind(edits.text(), total_pages),
        expand_kind(edits.signatures(), total_pages),
        edits.forms().to_vec(),
        expand_kind(edits.images(), total_pages),
    )
}

fn expand_kind<E: PageAddressed>(edits: &[E], total_pages: u32) -> Vec<E> {
    let mut expanded = Vec::with_capacity(edits.len());
    for edit in edits {
        match edit.page() {
            PageTarget::Index(_) => expanded.push(edit.clone()),
            PageTarget::AllPages => {
                expanded.extend((0..total_pages).map(|index| edit.on_page(PageTarget::Index(index))));
            }
            PageTarget::Range(spec) => {
                expanded.extend(
                    parse_page_range(spec, total_pages)
                        .into_iter()
                        .map(|page| edit.on_page(PageTarget::Index(page - 1))),
                );
            }
        }
    }
    expanded
}
