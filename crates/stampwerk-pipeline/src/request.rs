// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Modification request builder — merges a template, an edit file, and
// command-line edits into one `EditSet`.
//
// Sources are combined by union, never override: within each kind, template
// edits come first, then edits from the file, then command-line edits. A
// malformed edit file fails the whole request before any document is opened.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::Deserialize;
use stampwerk_core::error::{Result, StampwerkError};
use stampwerk_core::types::{
    EditSet, FormFieldEdit, FormValue, ImageEdit, PageTarget, Point, Rect, Rgb, SignatureEdit,
    SignatureSource, TextEdit,
};
use tracing::{debug, warn};

use crate::templates::TemplateCatalog;

// -- Edit file format ---------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEditConfig {
    #[serde(default)]
    text: Vec<RawText>,
    #[serde(default)]
    signatures: Vec<RawSignature>,
    #[serde(default)]
    forms: RawForms,
    #[serde(default)]
    images: Vec<RawImage>,
}

/// Page addressing shared by every page-addressed entry.
#[derive(Debug, Default, Deserialize)]
struct RawPage {
    page: Option<u32>,
    #[serde(default)]
    all_pages: bool,
    pages: Option<String>,
}

impl RawPage {
    /// `all_pages` wins over `pages`, which wins over `page`; nothing given
    /// means the first page.
    fn target(self) -> PageTarget {
        if self.all_pages {
            PageTarget::AllPages
        } else if let Some(spec) = self.pages {
            PageTarget::Range(spec)
        } else {
            PageTarget::Index(self.page.unwrap_or(0))
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawText {
    text: String,
    x: f32,
    y: f32,
    #[serde(flatten)]
    page: RawPage,
    font_size: Option<f32>,
    color: Option<Rgb>,
    font: Option<String>,
    rotation: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct RawSignature {
    #[serde(rename = "box")]
    rect: Rect,
    text: Option<String>,
    image: Option<PathBuf>,
    #[serde(flatten)]
    page: RawPage,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    path: PathBuf,
    #[serde(rename = "box")]
    rect: Rect,
    #[serde(flatten)]
    page: RawPage,
}

/// `forms` is either `{"name": value}` or `[{"name": .., "value": ..}]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawForms {
    List(Vec<FormFieldEdit>),
    Map(BTreeMap<String, FormValue>),
}

impl Default for RawForms {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl RawEditConfig {
    /// Convert to edits, resolving relative image paths against `base_dir`.
    fn into_edit_set(self, base_dir: Option<&Path>) -> Result<EditSet> {
        let resolve = |path: PathBuf| match base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        };

        let text = self
            .text
            .into_iter()
            .map(|raw| TextEdit {
                text: raw.text,
                position: Point { x: raw.x, y: raw.y },
                page: raw.page.target(),
                font_size: raw.font_size,
                color: raw.color,
                font: raw.font,
                rotation: raw.rotation,
            })
            .collect();

        let signatures = self
            .signatures
            .into_iter()
            .enumerate()
            .map(|(position, raw)| {
                let source = match (raw.text, raw.image) {
                    (Some(text), None) => SignatureSource::Text(text),
                    (None, Some(image)) => SignatureSource::Image(resolve(image)),
                    _ => {
                        return Err(StampwerkError::ConfigParseError(format!(
                            "signature #{} needs exactly one of \"text\" or \"image\"",
                            position + 1
                        )));
                    }
                };
                Ok(SignatureEdit {
                    rect: raw.rect,
                    source,
                    page: raw.page.target(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let forms = match self.forms {
            RawForms::List(list) => list,
            RawForms::Map(map) => map
                .into_iter()
                .map(|(name, value)| FormFieldEdit { name, value })
                .collect(),
        };

        let images = self
            .images
            .into_iter()
            .map(|raw| ImageEdit {
                path: resolve(raw.path),
                rect: raw.rect,
                page: raw.page.target(),
            })
            .collect();

        Ok(EditSet::new(text, signatures, forms, images))
    }
}

/// Parse an edit file's JSON text.
///
/// Relative image paths are kept as given.
pub fn parse_edit_config(json: &str) -> Result<EditSet> {
    let raw: RawEditConfig = serde_json::from_str(json)
        .map_err(|err| StampwerkError::ConfigParseError(err.to_string()))?;
    raw.into_edit_set(None)
}

/// Read and parse an edit file. Relative image paths are taken relative to
/// the file's directory.
pub fn load_edit_config(path: &Path) -> Result<EditSet> {
    let json = std::fs::read_to_string(path).map_err(|err| {
        StampwerkError::ConfigParseError(format!("cannot read {}: {err}", path.display()))
    })?;
    let raw: RawEditConfig = serde_json::from_str(&json)
        .map_err(|err| StampwerkError::ConfigParseError(format!("{}: {err}", path.display())))?;
    raw.into_edit_set(path.parent())
}

// -- Builder ------------------------------------------------------------------

/// The merged request and any warnings raised while building it.
#[derive(Debug, Clone)]
pub struct BuiltRequest {
    pub edits: EditSet,
    pub warnings: Vec<String>,
}

/// Collects edit sources and merges them.
#[derive(Debug, Default)]
pub struct ModificationRequestBuilder {
    template: Option<String>,
    config_path: Option<PathBuf>,
    text: Vec<TextEdit>,
    signatures: Vec<SignatureEdit>,
    forms: Vec<FormFieldEdit>,
    images: Vec<ImageEdit>,
    all_pages: bool,
    now: Option<NaiveDateTime>,
}

impl ModificationRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn template(mut self, name: impl Into<String>) -> Self {
        self.template = Some(name.into());
        self
    }

    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn add_text(mut self, edit: TextEdit) -> Self {
        self.text.push(edit);
        self
    }

    pub fn add_signature(mut self, edit: SignatureEdit) -> Self {
        self.signatures.push(edit);
        self
    }

    pub fn fill_field(mut self, edit: FormFieldEdit) -> Self {
        self.forms.push(edit);
        self
    }

    pub fn add_image(mut self, edit: ImageEdit) -> Self {
        self.images.push(edit);
        self
    }

    /// Retarget every text edit, from any source, to all pages.
    pub fn all_pages(mut self, all_pages: bool) -> Self {
        self.all_pages = all_pages;
        self
    }

    /// Evaluate templates as of `now` instead of the current local time.
    pub fn at(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    /// Merge every source into one edit set.
    ///
    /// Fails only on an unreadable or malformed edit file. An unknown
    /// template is reported as a warning and contributes nothing.
    pub fn build(self) -> Result<BuiltRequest> {
        let mut warnings = Vec::new();

        let from_file = match &self.config_path {
            Some(path) => load_edit_config(path)?,
            None => EditSet::empty(),
        };

        let from_template = match &self.template {
            Some(name) => {
                let now = self.now.unwrap_or_else(|| Local::now().naive_local());
                match TemplateCatalog::resolve(name, now) {
                    Ok(edits) => edits,
                    Err(err) => {
                        warn!(template = %name, "Unknown template, continuing without it");
                        warnings.push(format!("{err}; continuing without a template"));
                        EditSet::empty()
                    }
                }
            }
            None => EditSet::empty(),
        };

        let mut text = concat(from_template.text(), from_file.text(), self.text);
        if self.all_pages {
            for edit in &mut text {
                edit.page = PageTarget::AllPages;
            }
        }
        let signatures = concat(
            from_template.signatures(),
            from_file.signatures(),
            self.signatures,
        );
        let forms = concat(from_template.forms(), from_file.forms(), self.forms);
        let images = concat(from_template.images(), from_file.images(), self.images);

        let edits = EditSet::new(text, signatures, forms, images);
        debug!(
            edits = edits.len(),
            template = from_template.len(),
            file = from_file.len(),
            "Request built"
        );
        Ok(BuiltRequest { edits, warnings })
    }
}

fn concat<T: Clone>(template: &[T], file: &[T], cli: Vec<T>) -> Vec<T> {
    let mut merged = Vec::with_capacity(template.len() + file.len() + cli.len());
    merged.extend_from_slice(template);
    merged.extend_from_slice(file);
    merged.extend(cli);
    merged
}
