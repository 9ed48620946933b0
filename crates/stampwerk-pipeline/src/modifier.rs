// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-document modifier — opens one PDF, applies an `EditSet` to it, and
// writes the result.
//
// Edits are applied by kind in a fixed order: form fields, signatures, text,
// images. A failing edit is recorded and skipped; only failing to open the
// input or to write the output fails the document. Output is written to a
// temporary sibling first and renamed into place, so a failed document never
// leaves a partial file behind.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use lopdf::ObjectId;
use stampwerk_core::config::StampwerkConfig;
use stampwerk_core::error::{Result, StampwerkError};
use stampwerk_core::types::{
    EditCounts, EditSet, ImageEdit, ModificationOutcome, PageTarget, Point, Rect, Rgb,
    SignatureEdit, SignatureSource, TextEdit,
};
use stampwerk_document::{ImageProcessor, PdfDocument, StandardFont, TextStyle};
use tracing::{debug, info, instrument, warn};

use crate::expander::expand;

/// Bytes of every image an edit set refers to, read before the edit pass.
type ImageBytes = HashMap<PathBuf, std::result::Result<Arc<Vec<u8>>, String>>;

/// Images already embedded in the document: object ID and pixel size.
type Embedded = HashMap<PathBuf, (ObjectId, u32, u32)>;

/// Text settings used where an edit leaves them out.
#[derive(Debug, Clone)]
struct TextDefaults {
    font: StandardFont,
    size: f32,
    color: Rgb,
}

/// Applies edit sets to documents.
#[derive(Debug, Clone)]
pub struct DocumentModifier {
    defaults: TextDefaults,
}

impl DocumentModifier {
    pub fn new(config: &StampwerkConfig) -> Self {
        let font = StandardFont::from_name(&config.default_font).unwrap_or_else(|| {
            warn!(font = %config.default_font, "Unknown default font, using Helvetica");
            StandardFont::Helvetica
        });
        Self {
            defaults: TextDefaults {
                font,
                size: config.default_font_size,
                color: config.default_color,
            },
        }
    }

    /// Apply `edits` to the PDF at `input` and write the result to `output`.
    ///
    /// Never fails: open and write errors are reported in the outcome.
    #[instrument(skip(self, edits), fields(input = %input.display(), edits = edits.len()))]
    pub async fn apply(&self, input: &Path, output: &Path, edits: &EditSet) -> ModificationOutcome {
        let started = Instant::now();
        match self.try_apply(input, output, edits, started).await {
            Ok(outcome) => {
                info!(
                    applied = outcome.modifications_applied(),
                    skipped = outcome.skipped,
                    elapsed_ms = outcome.elapsed.as_millis() as u64,
                    "Document modified"
                );
                outcome
            }
            Err(err) => {
                warn!(%err, "Document failed");
                ModificationOutcome::failed(
                    input.to_path_buf(),
                    output.to_path_buf(),
                    &err,
                    started.elapsed(),
                )
            }
        }
    }

    async fn try_apply(
        &self,
        input: &Path,
        output: &Path,
        edits: &EditSet,
        started: Instant,
    ) -> Result<ModificationOutcome> {
        let name = input.display().to_string();
        let data = tokio::fs::read(input)
            .await
            .map_err(|err| StampwerkError::DocumentOpenError {
                path: name.clone(),
                reason: err.to_string(),
            })?;
        let images = preload_images(edits).await;

        let edits = edits.clone();
        let defaults = self.defaults.clone();
        let (bytes, tally) =
            tokio::task::spawn_blocking(move || edit_document(&data, &name, &edits, &images, &defaults))
                .await
                .map_err(|err| StampwerkError::PdfError(format!("edit task failed: {err}")))??;

        persist(output, &bytes).await?;

        Ok(ModificationOutcome {
            input_path: input.to_path_buf(),
            output_path: output.to_path_buf(),
            success: true,
            counts: tally.counts,
            skipped: tally.skipped,
            warnings: tally.warnings,
            page_count: Some(tally.page_count),
            elapsed: started.elapsed(),
            error_message: None,
        })
    }
}

// -- Edit pass ----------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum EditKind {
    Form,
    Signature,
    Text,
    Image,
}

/// Running totals for one document.
#[derive(Debug, Default)]
struct EditTally {
    counts: EditCounts,
    skipped: u32,
    warnings: Vec<String>,
    page_count: u32,
}

impl EditTally {
    fn record(&mut self, kind: EditKind, label: impl FnOnce() -> String, result: Result<()>) {
        match result {
            Ok(()) => {
                let counter = match kind {
                    EditKind::Form => &mut self.counts.forms_filled,
                    EditKind::Signature => &mut self.counts.signatures_added,
                    EditKind::Text => &mut self.counts.text_insertions,
                    EditKind::Image => &mut self.counts.images_inserted,
                };
                *counter += 1;
            }
            Err(err) => {
                let label = label();
                debug!(?kind, %label, %err, soft = err.is_soft(), "Edit skipped");
                self.skipped += 1;
                self.warnings.push(format!("{label}: {err}"));
            }
        }
    }
}

/// Apply every edit to the document in `data` and serialise it.
fn edit_document(
    data: &[u8],
    name: &str,
    edits: &EditSet,
    images: &ImageBytes,
    defaults: &TextDefaults,
) -> Result<(Vec<u8>, EditTally)> {
    let mut document = PdfDocument::from_bytes_named(data, name)?;
    let page_count = document.page_count();

    let expanded;
    let edits = if edits.needs_expansion() {
        expanded = expand(edits, page_count);
        &expanded
    } else {
        edits
    };

    let mut tally = EditTally {
        page_count,
        ..EditTally::default()
    };
    let mut embedded = Embedded::new();

    for form in edits.forms() {
        let result = document.set_field_value(&form.name, &form.value);
        tally.record(EditKind::Form, || format!("form field '{}'", form.name), result);
    }

    for signature in edits.signatures() {
        let result = apply_signature(&mut document, signature, images, &mut embedded, defaults);
        tally.record(
            EditKind::Signature,
            || format!("signature on {}", signature.page),
            result,
        );
    }

    for text in edits.text() {
        let result = apply_text(&mut document, text, defaults, &mut tally.warnings);
        tally.record(
            EditKind::Text,
            || format!("text '{}' on {}", text.text, text.page),
            result,
        );
    }

    for image in edits.images() {
        let result = apply_image(&mut document, image, images, &mut embedded);
        tally.record(
            EditKind::Image,
            || format!("image {} on {}", image.path.display(), image.page),
            result,
        );
    }

    let bytes = document.to_bytes()?;
    Ok((bytes, tally))
}

fn page_index(page: &PageTarget) -> Result<u32> {
    page.index().ok_or_else(|| {
        StampwerkError::InvalidArgument(format!("{page} was not resolved to a single page"))
    })
}

fn apply_text(
    document: &mut PdfDocument,
    edit: &TextEdit,
    defaults: &TextDefaults,
    warnings: &mut Vec<String>,
) -> Result<()> {
    let index = page_index(&edit.page)?;
    let font = match edit.font.as_deref() {
        None => defaults.font,
        Some(name) => StandardFont::from_name(name).unwrap_or_else(|| {
            warnings.push(format!(
                "unknown font '{name}', used {} instead",
                defaults.font.base_font()
            ));
            defaults.font
        }),
    };
    let style = TextStyle {
        position: edit.position,
        font,
        size: edit.font_size.unwrap_or(defaults.size),
        color: edit.color.unwrap_or(defaults.color),
        rotation: edit.rotation.unwrap_or(0.0),
    };
    document.draw_text(index, &edit.text, &style)
}

fn apply_signature(
    document: &mut PdfDocument,
    edit: &SignatureEdit,
    images: &ImageBytes,
    embedded: &mut Embedded,
    defaults: &TextDefaults,
) -> Result<()> {
    let index = page_index(&edit.page)?;
    let rect = edit.rect;
    match &edit.source {
        SignatureSource::Image(path) => {
            document.page_id(index)?;
            let (image_id, width, height) = embed_cached(document, path, images, embedded)?;
            document.draw_image(index, image_id, fit_within(rect, width, height))
        }
        SignatureSource::Text(name) => {
            let font = StandardFont::TimesItalic;
            let chars = name.chars().count().max(1) as f32;
            let size = (rect.height() * 0.5)
                .min(rect.width() * 0.9 / (chars * font.average_width()))
                .max(4.0);
            let text_width = chars * font.average_width() * size;
            let baseline = rect.y1 + rect.height() * 0.3;
            let style = TextStyle {
                position: Point {
                    x: rect.x1 + (rect.width() - text_width).max(0.0) / 2.0,
                    y: baseline,
                },
                font,
                size,
                color: defaults.color,
                rotation: 0.0,
            };
            document.draw_text(index, name, &style)?;
            let line_y = rect.y1 + rect.height() * 0.2;
            document.draw_line(
                index,
                Point {
                    x: rect.x1,
                    y: line_y,
                },
                Point {
                    x: rect.x2,
                    y: line_y,
                },
                0.75,
                defaults.color,
            )
        }
    }
}

fn apply_image(
    document: &mut PdfDocument,
    edit: &ImageEdit,
    images: &ImageBytes,
    embedded: &mut Embedded,
) -> Result<()> {
    let index = page_index(&edit.page)?;
    document.page_id(index)?;
    let (image_id, _, _) = embed_cached(document, &edit.path, images, embedded)?;
    document.draw_image(index, image_id, edit.rect)
}

/// Embed the image at `path` once per document, returning its object and
/// pixel size.
fn embed_cached(
    document: &mut PdfDocument,
    path: &Path,
    images: &ImageBytes,
    embedded: &mut Embedded,
) -> Result<(ObjectId, u32, u32)> {
    if let Some(cached) = embedded.get(path) {
        return Ok(*cached);
    }
    let bytes = match images.get(path) {
        Some(Ok(bytes)) => bytes,
        Some(Err(reason)) => {
            return Err(StampwerkError::ImageError(format!(
                "cannot read {}: {reason}",
                path.display()
            )));
        }
        None => {
            return Err(StampwerkError::ImageError(format!(
                "{} was not loaded",
                path.display()
            )));
        }
    };
    let prepared = ImageProcessor::prepare(bytes)?;
    let id = document.embed_image(&prepared)?;
    let entry = (id, prepared.width, prepared.height);
    embedded.insert(path.to_path_buf(), entry);
    Ok(entry)
}

/// The largest box with the image's aspect ratio, centred in `rect`.
fn fit_within(rect: Rect, width: u32, height: u32) -> Rect {
    if width == 0 || height == 0 {
        return rect;
    }
    let scale = (rect.width() / width as f32).min(rect.height() / height as f32);
    let (w, h) = (width as f32 * scale, height as f32 * scale);
    let x1 = rect.x1 + (rect.width() - w) / 2.0;
    let y1 = rect.y1 + (rect.height() - h) / 2.0;
    Rect::new(x1, y1, x1 + w, y1 + h).unwrap_or(rect)
}

// -- I/O ----------------------------------------------------------------------

/// Read every image the edits refer to. Read failures are kept per path and
/// surface when the edit that needs the image is applied.
async fn preload_images(edits: &EditSet) -> ImageBytes {
    let paths = edits
        .signatures()
        .iter()
        .filter_map(|edit| match &edit.source {
            SignatureSource::Image(path) => Some(path),
            SignatureSource::Text(_) => None,
        })
        .chain(edits.images().iter().map(|edit| &edit.path));

    let mut images = ImageBytes::new();
    for path in paths {
        if images.contains_key(path) {
            continue;
        }
        let loaded = tokio::fs::read(path)
            .await
            .map(Arc::new)
            .map_err(|err| err.to_string());
        images.insert(path.clone(), loaded);
    }
    images
}

/// `<dir>/.<name>.partial`, next to the final output.
fn partial_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".into());
    output.with_file_name(format!(".{name}.partial"))
}

/// Write `bytes` to `output` through a temporary sibling.
async fn persist(output: &Path, bytes: &[u8]) -> Result<()> {
    let partial = partial_path(output);
    let write = async {
        if let Some(parent) = output.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&partial, bytes).await?;
        tokio::fs::rename(&partial, output).await
    };

    if let Err(err) = write.await {
        if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
            debug!(%cleanup, "No partial output to remove");
        }
        return Err(StampwerkError::PersistError {
            path: output.display().to_string(),
            reason: err.to_string(),
        });
    }
    debug!(path = %output.display(), bytes = bytes.len(), "Output written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_keeps_aspect_ratio_and_centres() {
        let rect = Rect::new(400.0, 50.0, 550.0, 100.0).unwrap();
        let fitted = fit_within(rect, 200, 100);
        assert_eq!(fitted.height(), 50.0);
        assert_eq!(fitted.width(), 100.0);
        assert_eq!(fitted.x1, 425.0);
        assert_eq!(fitted.y1, 50.0);
    }

    #[test]
    fn partial_output_is_a_hidden_sibling() {
        assert_eq!(
            partial_path(Path::new("/out/report.pdf")),
            PathBuf::from("/out/.report.pdf.partial")
        );
    }

    #[test]
    fn tally_counts_by_kind_and_keeps_skip_messages() {
        let mut tally = EditTally::default();
        tally.record(EditKind::Text, || "text".into(), Ok(()));
        tally.record(
            EditKind::Form,
            || "form field 'x'".into(),
            Err(StampwerkError::FieldNotFound("x".into())),
        );
        tally.record(EditKind::Image, || "image".into(), Ok(()));

        assert_eq!(tally.counts.text_insertions, 1);
        assert_eq!(tally.counts.images_inserted, 1);
        assert_eq!(tally.counts.forms_filled, 0);
        assert_eq!(tally.skipped, 1);
        assert!(tally.warnings[0].starts_with("form field 'x'"));
    }

    #[test]
    fn unknown_default_font_falls_back() {
        let config = StampwerkConfig {
            default_font: "Wingdings".into(),
            ..StampwerkConfig::default()
        };
        let modifier = DocumentModifier::new(&config);
        assert_eq!(modifier.defaults.font, StandardFont::Helvetica);
    }

    // -- End to end -----------------------------------------------------------

    use crate::fixtures::{form_pdf, painted, sample_png, shown_strings, write_bytes, write_pdf};
    use crate::request::parse_edit_config;
    use crate::templates::TemplateCatalog;
    use chrono::NaiveDate;
    use stampwerk_core::types::{FormFieldEdit, FormValue};

    fn modifier() -> DocumentModifier {
        DocumentModifier::new(&StampwerkConfig::default())
    }

    fn text_only(text: Vec<TextEdit>) -> EditSet {
        EditSet::new(text, Vec::new(), Vec::new(), Vec::new())
    }

    #[tokio::test]
    async fn stamps_first_page_only() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_pdf(dir.path(), "in.pdf", 2);
        let output = dir.path().join("out.pdf");
        let edits = text_only(vec![TextEdit::new("APPROVED", Point { x: 450.0, y: 50.0 })]);

        let outcome = modifier().apply(&input, &output, &edits).await;

        assert!(outcome.success, "{:?}", outcome.error_message);
        assert_eq!(outcome.counts.text_insertions, 1);
        assert_eq!(outcome.page_count, Some(2));
        assert!(shown_strings(&output, 1).contains(&"APPROVED".to_string()));
        assert!(!shown_strings(&output, 2).contains(&"APPROVED".to_string()));
    }

    #[tokio::test]
    async fn missing_field_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_pdf(dir.path(), "plain.pdf", 1);
        let output = dir.path().join("out.pdf");
        let edits = EditSet::new(
            Vec::new(),
            Vec::new(),
            vec![FormFieldEdit {
                name: "nonexistent".into(),
                value: FormValue::Text("x".into()),
            }],
            Vec::new(),
        );

        let outcome = modifier().apply(&input, &output, &edits).await;

        assert!(outcome.success);
        assert_eq!(outcome.counts.forms_filled, 0);
        assert_eq!(outcome.skipped, 1);
        assert!(outcome.warnings[0].contains("nonexistent"));
        assert!(output.exists());
    }

    #[tokio::test]
    async fn kinds_apply_in_fixed_order_whatever_the_listing() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_bytes(dir.path(), "form.pdf", &form_pdf(1));
        let logo = dir.path().join("logo.png");
        std::fs::write(&logo, sample_png()).unwrap();
        let output = dir.path().join("out.pdf");
        // Listed images first, forms last.
        let config = serde_json::json!({
            "images": [{"path": logo, "box": [10, 10, 50, 30]}],
            "text": [{"text": "Received", "x": 72, "y": 100}],
            "signatures": [{"box": [400, 50, 550, 100], "text": "Jane Doe"}],
            "forms": [
                {"name": "name", "value": "Jane Doe"},
                {"name": "Name", "value": "wrong case"}
            ]
        });
        let edits = parse_edit_config(&config.to_string()).unwrap();

        let outcome = modifier().apply(&input, &output, &edits).await;

        assert!(outcome.success, "{:?}", outcome.error_message);
        assert_eq!(
            outcome.counts,
            EditCounts {
                forms_filled: 1,
                signatures_added: 1,
                text_insertions: 1,
                images_inserted: 1,
            }
        );
        assert_eq!(outcome.skipped, 1);
        assert!(outcome.warnings[0].contains("'Name'"), "{:?}", outcome.warnings);

        let written = PdfDocument::from_bytes(&std::fs::read(&output).unwrap()).unwrap();
        assert_eq!(written.form_fields()[0].value.as_deref(), Some("Jane Doe"));

        let paints = painted(&output, 1);
        let at = |wanted: &str| {
            paints
                .iter()
                .position(|item| item.starts_with(wanted))
                .unwrap_or_else(|| panic!("{wanted} not painted in {paints:?}"))
        };
        assert!(at("Tj Page 1") < at("Tj Jane Doe"));
        assert!(at("Tj Jane Doe") < at("Tj Received"));
        assert!(at("Tj Received") < at("Do "));
    }

    #[tokio::test]
    async fn all_pages_text_lands_on_every_page() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_pdf(dir.path(), "four.pdf", 4);
        let output = dir.path().join("out.pdf");
        let edits = text_only(vec![TextEdit {
            page: PageTarget::AllPages,
            ..TextEdit::new("DRAFT", Point { x: 100.0, y: 400.0 })
        }]);

        let outcome = modifier().apply(&input, &output, &edits).await;

        assert_eq!(outcome.counts.text_insertions, 4);
        for page in 1..=4 {
            assert!(shown_strings(&output, page).contains(&"DRAFT".to_string()));
        }
    }

    #[tokio::test]
    async fn template_plus_one_edit() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_pdf(dir.path(), "in.pdf", 1);
        let output = dir.path().join("out.pdf");
        let now = NaiveDate::from_ymd_opt(2026, 3, 14)
            .and_then(|date| date.and_hms_opt(9, 0, 0))
            .unwrap();
        let template = TemplateCatalog::resolve("approval-stamp", now).unwrap();
        let mut text = template.text().to_vec();
        text.push(TextEdit::new("Ref 42", Point { x: 50.0, y: 750.0 }));

        let outcome = modifier().apply(&input, &output, &text_only(text)).await;

        assert_eq!(outcome.modifications_applied(), 3);
        let shown = shown_strings(&output, 1);
        assert!(shown.contains(&"APPROVED".to_string()));
        assert!(shown.contains(&"Approved: 2026-03-14".to_string()));
        assert!(shown.contains(&"Ref 42".to_string()));
    }

    #[tokio::test]
    async fn out_of_range_page_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_pdf(dir.path(), "in.pdf", 1);
        let output = dir.path().join("out.pdf");
        let edits = text_only(vec![TextEdit {
            page: PageTarget::Index(5),
            ..TextEdit::new("nowhere", Point { x: 0.0, y: 0.0 })
        }]);

        let outcome = modifier().apply(&input, &output, &edits).await;

        assert!(outcome.success);
        assert_eq!(outcome.modifications_applied(), 0);
        assert_eq!(outcome.skipped, 1);
    }

    #[tokio::test]
    async fn typed_signature_and_missing_image() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_pdf(dir.path(), "in.pdf", 1);
        let output = dir.path().join("out.pdf");
        let rect = Rect::new(400.0, 50.0, 550.0, 100.0).unwrap();
        let edits = EditSet::new(
            Vec::new(),
            vec![
                SignatureEdit {
                    rect,
                    source: SignatureSource::Text("Jane Doe".into()),
                    page: PageTarget::Index(0),
                },
                SignatureEdit {
                    rect,
                    source: SignatureSource::Image(dir.path().join("missing.png")),
                    page: PageTarget::Index(0),
                },
            ],
            Vec::new(),
            Vec::new(),
        );

        let outcome = modifier().apply(&input, &output, &edits).await;

        assert!(outcome.success);
        assert_eq!(outcome.counts.signatures_added, 1);
        assert_eq!(outcome.skipped, 1);
        assert!(shown_strings(&output, 1).contains(&"Jane Doe".to_string()));
    }

    #[tokio::test]
    async fn unreadable_input_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("corrupt.pdf");
        std::fs::write(&input, b"this is not a pdf").unwrap();
        let output = dir.path().join("out.pdf");

        let outcome = modifier().apply(&input, &output, &EditSet::empty()).await;

        assert!(!outcome.success);
        assert!(outcome.error_message.is_some());
        assert_eq!(outcome.modifications_applied(), 0);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn persist_failure_fails_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_pdf(dir.path(), "in.pdf", 1);
        // A regular file where the output directory should be.
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"").unwrap();
        let output = blocker.join("out.pdf");
        let edits = text_only(vec![TextEdit::new("x", Point { x: 0.0, y: 0.0 })]);

        let outcome = modifier().apply(&input, &output, &edits).await;

        assert!(!outcome.success);
        assert!(outcome.error_message.unwrap().contains("blocked"));
    }
}
