// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// stampwerk-pipeline — The modification pipeline.
//
// Turns templates, edit files, and command-line edits into one `EditSet`,
// expands page-agnostic edits per document, applies them to one document or a
// whole directory, and aggregates the outcomes.

pub mod batch;
pub mod expander;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod modifier;
pub mod report;
pub mod request;
pub mod templates;

pub use batch::{BatchCoordinator, BatchProgress, BatchRequest, SilentProgress, discover_inputs};
pub use expander::expand;
pub use modifier::DocumentModifier;
pub use request::{BuiltRequest, ModificationRequestBuilder, parse_edit_config};
pub use templates::{TemplateCatalog, TemplateInfo};
