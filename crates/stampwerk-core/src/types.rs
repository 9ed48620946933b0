// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Stampwerk modification pipeline.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StampwerkError;

// -- Identifiers --------------------------------------------------------------

/// Unique identifier for one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// -- Geometry -----------------------------------------------------------------

/// An anchor point in PDF user space (points, origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// A non-degenerate bounding box in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RectRepr", into = "[f32; 4]")]
pub struct Rect {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Rect {
    /// Build a box, rejecting zero or negative extents.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Result<Self, StampwerkError> {
        if x2 <= x1 || y2 <= y1 {
            return Err(StampwerkError::MalformedGeometry(format!(
                "box ({x1},{y1},{x2},{y2}) needs x2 > x1 and y2 > y1"
            )));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }
}

/// Accepted serialised forms of a [`Rect`]: `[x1,y1,x2,y2]` or `"x1,y1,x2,y2"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RectRepr {
    Array([f32; 4]),
    Text(String),
}

impl TryFrom<RectRepr> for Rect {
    type Error = StampwerkError;

    fn try_from(repr: RectRepr) -> Result<Self, Self::Error> {
        match repr {
            RectRepr::Array([x1, y1, x2, y2]) => Rect::new(x1, y1, x2, y2),
            RectRepr::Text(text) => crate::geometry::parse_box(&text),
        }
    }
}

impl From<Rect> for [f32; 4] {
    fn from(rect: Rect) -> Self {
        [rect.x1, rect.y1, rect.x2, rect.y2]
    }
}

/// An RGB colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ColorRepr", into = "[f32; 3]")]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
        }
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::BLACK
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Array([f32; 3]),
    Text(String),
}

impl TryFrom<ColorRepr> for Rgb {
    type Error = StampwerkError;

    fn try_from(repr: ColorRepr) -> Result<Self, Self::Error> {
        match repr {
            ColorRepr::Array([r, g, b]) => Ok(Rgb::new(r, g, b)),
            ColorRepr::Text(text) => crate::geometry::parse_color(&text),
        }
    }
}

impl From<Rgb> for [f32; 3] {
    fn from(color: Rgb) -> Self {
        [color.r, color.g, color.b]
    }
}

// -- Page addressing ----------------------------------------------------------

/// Which page(s) an edit targets.
///
/// Only `Index` may reach the document modifier; `AllPages` and `Range` are
/// resolved per document once its page count is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageTarget {
    /// A concrete 0-based page index.
    Index(u32),
    /// Replicate on every page of the document.
    AllPages,
    /// A 1-based page-range expression such as `1,3-5`.
    Range(String),
}

impl PageTarget {
    /// The concrete page index, if this target is already resolved.
    pub fn index(&self) -> Option<u32> {
        match self {
            Self::Index(index) => Some(*index),
            _ => None,
        }
    }

    pub fn is_concrete(&self) -> bool {
        matches!(self, Self::Index(_))
    }
}

impl Default for PageTarget {
    fn default() -> Self {
        Self::Index(0)
    }
}

impl std::fmt::Display for PageTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(index) => write!(f, "page {}", index + 1),
            Self::AllPages => write!(f, "all pages"),
            Self::Range(spec) => write!(f, "pages {spec}"),
        }
    }
}

/// Edits that address a page and can be replicated across pages.
pub trait PageAddressed: Clone {
    fn page(&self) -> &PageTarget;

    /// A copy of this edit retargeted to `page`.
    fn on_page(&self, page: PageTarget) -> Self;
}

// -- Edits --------------------------------------------------------------------

/// Insert a line of text at an anchor point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextEdit {
    pub text: String,
    pub position: Point,
    pub page: PageTarget,
    pub font_size: Option<f32>,
    pub color: Option<Rgb>,
    /// One of the 14 standard PDF font names, e.g. `Helvetica-Bold`.
    pub font: Option<String>,
    /// Counter-clockwise rotation in degrees around the anchor.
    pub rotation: Option<f32>,
}

impl TextEdit {
    pub fn new(text: impl Into<String>, position: Point) -> Self {
        Self {
            text: text.into(),
            position,
            page: PageTarget::default(),
            font_size: None,
            color: None,
            font: None,
            rotation: None,
        }
    }
}

impl PageAddressed for TextEdit {
    fn page(&self) -> &PageTarget {
        &self.page
    }

    fn on_page(&self, page: PageTarget) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }
}

/// Where a signature's appearance comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureSource {
    /// A raster image (PNG/JPEG) scaled into the box.
    Image(PathBuf),
    /// A typed name drawn into the box above a signing line.
    Text(String),
}

/// Place a visual signature inside a bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureEdit {
    pub rect: Rect,
    pub source: SignatureSource,
    pub page: PageTarget,
}

impl PageAddressed for SignatureEdit {
    fn page(&self) -> &PageTarget {
        &self.page
    }

    fn on_page(&self, page: PageTarget) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }
}

/// A value to write into a form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Bool(bool),
    Text(String),
    /// An enumerated option of a radio group or choice field.
    Option { option: String },
}

impl std::fmt::Display for FormValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "\"{value}\""),
            Self::Option { option } => write!(f, "option {option}"),
        }
    }
}

/// Fill a form field, matched case-sensitively by fully-qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormFieldEdit {
    pub name: String,
    pub value: FormValue,
}

/// Draw an image scaled into a bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageEdit {
    pub path: PathBuf,
    pub rect: Rect,
    pub page: PageTarget,
}

impl PageAddressed for ImageEdit {
    fn page(&self) -> &PageTarget {
        &self.page
    }

    fn on_page(&self, page: PageTarget) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }
}

// -- Edit set -----------------------------------------------------------------

/// The canonical, immutable collection of requested edits, grouped by kind.
///
/// Built once per invocation and shared read-only across documents; page
/// expansion produces a new set rather than mutating this one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditSet {
    text: Vec<TextEdit>,
    signatures: Vec<SignatureEdit>,
    forms: Vec<FormFieldEdit>,
    images: Vec<ImageEdit>,
}

impl EditSet {
    pub fn new(
        text: Vec<TextEdit>,
        signatures: Vec<SignatureEdit>,
        forms: Vec<FormFieldEdit>,
        images: Vec<ImageEdit>,
    ) -> Self {
        Self {
            text,
            signatures,
            forms,
            images,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &[TextEdit] {
        &self.text
    }

    pub fn signatures(&self) -> &[SignatureEdit] {
        &self.signatures
    }

    pub fn forms(&self) -> &[FormFieldEdit] {
        &self.forms
    }

    pub fn images(&self) -> &[ImageEdit] {
        &self.images
    }

    /// Total number of edits across all kinds.
    pub fn len(&self) -> usize {
        self.text.len() + self.signatures.len() + self.forms.len() + self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any page-addressed edit still needs per-document expansion.
    pub fn needs_expansion(&self) -> bool {
        self.text.iter().any(|e| !e.page.is_concrete())
            || self.signatures.iter().any(|e| !e.page.is_concrete())
            || self.images.iter().any(|e| !e.page.is_concrete())
    }
}

// -- Results ------------------------------------------------------------------

/// Edits that actually mutated a document, by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditCounts {
    pub forms_filled: u32,
    pub signatures_added: u32,
    pub text_insertions: u32,
    pub images_inserted: u32,
}

impl EditCounts {
    pub fn total(&self) -> u32 {
        self.forms_filled + self.signatures_added + self.text_insertions + self.images_inserted
    }
}

/// The result of modifying one document. Never mutated once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModificationOutcome {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub success: bool,
    pub counts: EditCounts,
    /// Edits that were attempted but did not apply (soft failures).
    pub skipped: u32,
    /// One message per skipped edit.
    pub warnings: Vec<String>,
    pub page_count: Option<u32>,
    pub elapsed: Duration,
    pub error_message: Option<String>,
}

impl ModificationOutcome {
    /// Total edits that mutated the document.
    pub fn modifications_applied(&self) -> u32 {
        self.counts.total()
    }

    /// A hard failure: nothing was written for this document.
    pub fn failed(
        input_path: PathBuf,
        output_path: PathBuf,
        error: &StampwerkError,
        elapsed: Duration,
    ) -> Self {
        Self {
            input_path,
            output_path,
            success: false,
            counts: EditCounts::default(),
            skipped: 0,
            warnings: Vec::new(),
            page_count: None,
            elapsed,
            error_message: Some(error.to_string()),
        }
    }

    /// File name of the input, for reports.
    pub fn display_name(&self) -> String {
        self.input_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.input_path.display().to_string())
    }
}

/// How the batch coordinator schedules documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    #[default]
    Sequential,
    Parallel,
}

impl std::fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Parallel => write!(f, "parallel"),
        }
    }
}

/// Aggregated outcomes of a batch run, in file discovery order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub strategy: ExecutionStrategy,
    pub outcomes: Vec<ModificationOutcome>,
    pub elapsed: Duration,
    /// Set instead of outcomes when the run was a preview.
    pub preview: Option<String>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.success).count()
    }

    /// Edits applied across every successful document.
    pub fn total_edits(&self) -> u32 {
        self.outcomes
            .iter()
            .filter(|o| o.success)
            .map(ModificationOutcome::modifications_applied)
            .sum()
    }

    pub fn is_preview(&self) -> bool {
        self.preview.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, success: bool, text: u32) -> ModificationOutcome {
        ModificationOutcome {
            input_path: PathBuf::from(name),
            output_path: PathBuf::from(format!("out/{name}")),
            success,
            counts: EditCounts {
                text_insertions: text,
                ..EditCounts::default()
            },
            skipped: 0,
            warnings: Vec::new(),
            page_count: Some(1),
            elapsed: Duration::from_millis(5),
            error_message: None,
        }
    }

    #[test]
    fn rect_deserialises_from_array_and_string() {
        let a: Rect = serde_json::from_str("[1, 2, 3, 4]").unwrap();
        let b: Rect = serde_json::from_str("\"1,2,3,4\"").unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_str::<Rect>("[3, 2, 1, 4]").is_err());
        assert_eq!(a.width(), 2.0);
    }

    #[test]
    fn colour_deserialises_from_hex() {
        let c: Rgb = serde_json::from_str("\"#00ff00\"").unwrap();
        assert_eq!(c, Rgb::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn form_values_are_untagged() {
        let v: FormValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, FormValue::Bool(true));
        let v: FormValue = serde_json::from_str("\"Jane\"").unwrap();
        assert_eq!(v, FormValue::Text("Jane".into()));
        let v: FormValue = serde_json::from_str(r#"{"option": "B"}"#).unwrap();
        assert_eq!(v, FormValue::Option { option: "B".into() });
    }

    #[test]
    fn on_page_only_changes_target() {
        let edit = TextEdit {
            page: PageTarget::AllPages,
            font_size: Some(20.0),
            ..TextEdit::new("X", Point { x: 1.0, y: 2.0 })
        };
        let moved = edit.on_page(PageTarget::Index(3));
        assert_eq!(moved.page, PageTarget::Index(3));
        assert_eq!(moved.text, edit.text);
        assert_eq!(moved.font_size, edit.font_size);
    }

    #[test]
    fn report_totals_count_only_successes() {
        let report = BatchReport {
            run_id: RunId::new(),
            started_at: Utc::now(),
            strategy: ExecutionStrategy::Sequential,
            outcomes: vec![
                outcome("a.pdf", true, 2),
                outcome("b.pdf", false, 0),
                outcome("c.pdf", true, 1),
            ],
            elapsed: Duration::from_millis(20),
            preview: None,
        };
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.total_edits(), 3);
    }

    #[test]
    fn needs_expansion_detects_unresolved_targets() {
        let fixed = EditSet::new(
            vec![TextEdit::new("A", Point { x: 0.0, y: 0.0 })],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        assert!(!fixed.needs_expansion());

        let everywhere = EditSet::new(
            vec![TextEdit {
                page: PageTarget::AllPages,
                ..TextEdit::new("A", Point { x: 0.0, y: 0.0 })
            }],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        assert!(everywhere.needs_expansion());
        assert_eq!(everywhere.len(), 1);
    }
}
