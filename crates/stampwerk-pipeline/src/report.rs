// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-text rendering of edit sets, outcomes, and batch reports.

use std::path::PathBuf;
use std::time::Duration;

use stampwerk_core::types::{BatchReport, EditSet, ModificationOutcome, Rect, SignatureSource};

/// Elapsed time rounded for display.
pub fn format_elapsed(elapsed: Duration) -> String {
    if elapsed.as_secs() >= 1 {
        format!("{:.2}s", elapsed.as_secs_f64())
    } else {
        format!("{}ms", elapsed.as_millis())
    }
}

fn format_rect(rect: Rect) -> String {
    let [x1, y1, x2, y2] = <[f32; 4]>::from(rect);
    format!("({x1},{y1},{x2},{y2})")
}

/// Describe every edit in `edits`, one per line, grouped by kind in the order
/// they are applied.
pub fn describe_edits(edits: &EditSet) -> String {
    if edits.is_empty() {
        return "  (no edits)\n".to_string();
    }

    let mut out = String::new();
    for form in edits.forms() {
        out.push_str(&format!("  form      {} = {}\n", form.name, form.value));
    }
    for signature in edits.signatures() {
        let source = match &signature.source {
            SignatureSource::Image(path) => format!("image {}", path.display()),
            SignatureSource::Text(text) => format!("text \"{text}\""),
        };
        out.push_str(&format!(
            "  signature {source} in {} on {}\n",
            format_rect(signature.rect),
            signature.page
        ));
    }
    for text in edits.text() {
        out.push_str(&format!(
            "  text      \"{}\" at ({},{}) on {}",
            text.text, text.position.x, text.position.y, text.page
        ));
        if let Some(size) = text.font_size {
            out.push_str(&format!(", {size}pt"));
        }
        if let Some(font) = &text.font {
            out.push_str(&format!(", {font}"));
        }
        if let Some(rotation) = text.rotation {
            out.push_str(&format!(", rotated {rotation}\u{b0}"));
        }
        out.push('\n');
    }
    for image in edits.images() {
        out.push_str(&format!(
            "  image     {} in {} on {}\n",
            image.path.display(),
            format_rect(image.rect),
            image.page
        ));
    }
    out
}

/// What a batch run would do, without touching any document.
pub fn preview_text(edits: &EditSet, files: &[PathBuf]) -> String {
    let mut out = format!("Edits ({}):\n", edits.len());
    out.push_str(&describe_edits(edits));
    out.push_str(&format!("Files ({}):\n", files.len()));
    for file in files {
        out.push_str(&format!("  {}\n", file.display()));
    }
    if edits.needs_expansion() {
        out.push_str("Edits targeting all pages or page ranges are expanded per document.\n");
    }
    out
}

/// One-line summary of a single document.
pub fn outcome_line(outcome: &ModificationOutcome) -> String {
    if !outcome.success {
        return format!(
            "{}: FAILED: {}",
            outcome.display_name(),
            outcome.error_message.as_deref().unwrap_or("unknown error")
        );
    }

    let mut line = format!(
        "{}: {} edit(s) applied",
        outcome.display_name(),
        outcome.modifications_applied()
    );
    if outcome.skipped > 0 {
        line.push_str(&format!(", {} skipped", outcome.skipped));
    }
    line.push_str(&format!(" in {}", format_elapsed(outcome.elapsed)));
    line
}

/// Summary table of a finished batch, followed by totals and any failures.
pub fn summary_table(report: &BatchReport) -> String {
    let name_width = report
        .outcomes
        .iter()
        .map(|o| o.display_name().chars().count())
        .max()
        .unwrap_or(0)
        .max(4);

    let mut out = format!(
        "{:<name_width$}  {:<6}  {:>4}  {:>4}  {:>4}  {:>4}  {:>4}  {:>8}\n",
        "FILE", "STATUS", "TEXT", "SIG", "FORM", "IMG", "SKIP", "TIME"
    );
    for outcome in &report.outcomes {
        let status = if outcome.success { "ok" } else { "FAILED" };
        let counts = outcome.counts;
        out.push_str(&format!(
            "{:<name_width$}  {:<6}  {:>4}  {:>4}  {:>4}  {:>4}  {:>4}  {:>8}\n",
            outcome.display_name(),
            status,
            counts.text_insertions,
            counts.signatures_added,
            counts.forms_filled,
            counts.images_inserted,
            outcome.skipped,
            format_elapsed(outcome.elapsed)
        ));
    }

    out.push_str(&format!(
        "\n{} file(s): {} succeeded, {} failed, {} edit(s) applied ({}, {})\n",
        report.outcomes.len(),
        report.succeeded(),
        report.failed(),
        report.total_edits(),
        report.strategy,
        format_elapsed(report.elapsed)
    ));

    let failures: Vec<&ModificationOutcome> =
        report.outcomes.iter().filter(|o| !o.success).collect();
    if !failures.is_empty() {
        out.push_str("\nFailures:\n");
        for outcome in failures {
            out.push_str(&format!("  {}\n", outcome_line(outcome)));
        }
    }
    out
}
