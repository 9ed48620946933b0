// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand implementations and the edit-flag translation they share.

pub(crate) mod batch;
pub(crate) mod extract;
pub(crate) mod generate;
pub(crate) mod modify;
pub(crate) mod templates;

use std::process::ExitCode;

use stampwerk_core::config::StampwerkConfig;
use stampwerk_core::error::{Result, StampwerkError};
use stampwerk_core::geometry::{parse_box, parse_color, parse_point};
use stampwerk_core::human_errors::{Severity, humanize_error};
use stampwerk_core::types::{
    FormFieldEdit, FormValue, ImageEdit, PageTarget, SignatureEdit, SignatureSource, TextEdit,
};
use stampwerk_pipeline::{BuiltRequest, ModificationRequestBuilder};
use tracing::warn;

use crate::cli::EditArgs;

/// Exit status when a document could not be processed.
pub(crate) const EXIT_DOCUMENT_FAILED: u8 = 1;
/// Exit status when the request was rejected before any file was touched.
pub(crate) const EXIT_INVALID_REQUEST: u8 = 2;

/// Print `err` for a person and pick the exit status.
pub(crate) fn report_error(err: &StampwerkError) -> ExitCode {
    let human = humanize_error(err);
    eprintln!("error: {}", human.message);
    eprintln!("  hint: {}", human.suggestion);
    match human.severity {
        Severity::Fatal => ExitCode::from(EXIT_INVALID_REQUEST),
        Severity::DocumentFailure | Severity::SoftFailure => ExitCode::from(EXIT_DOCUMENT_FAILED),
    }
}

/// Turn the edit flags into one merged edit set.
///
/// Geometry and colour are parsed here so a typo fails before any document
/// is opened.
pub(crate) fn build_request(args: &EditArgs, config: &StampwerkConfig) -> Result<BuiltRequest> {
    let page = match (&args.pages, args.page_index) {
        (Some(spec), _) => PageTarget::Range(spec.clone()),
        (None, index) => PageTarget::Index(index.unwrap_or(0)),
    };

    let mut builder = ModificationRequestBuilder::new().all_pages(args.all_pages);
    if let Some(name) = &args.template {
        builder = builder.template(name);
    }
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }

    if let Some(text) = &args.add_text {
        let color = args.color.as_deref().map(parse_color).transpose()?;
        builder = builder.add_text(TextEdit {
            page: page.clone(),
            font_size: args.font_size.or(Some(config.default_font_size)),
            color,
            font: args.font.clone(),
            rotation: args.rotation,
            ..TextEdit::new(text.as_str(), parse_point(&args.position)?)
        });
    }

    let signature = match (&args.add_signature_image, &args.add_signature_text) {
        (Some(path), _) => Some(SignatureSource::Image(path.clone())),
        (None, Some(name)) => Some(SignatureSource::Text(name.clone())),
        (None, None) => None,
    };
    if let Some(source) = signature {
        builder = builder.add_signature(SignatureEdit {
            rect: parse_box(&args.signature_box)?,
            source,
            page: page.clone(),
        });
    }

    for assignment in &args.fill_field {
        builder = builder.fill_field(parse_assignment(assignment)?);
    }

    if let Some(path) = &args.add_image {
        let rect = args
            .image_box
            .as_deref()
            .ok_or_else(|| StampwerkError::InvalidArgument("--add-image needs --image-box".into()))?;
        builder = builder.add_image(ImageEdit {
            path: path.clone(),
            rect: parse_box(rect)?,
            page,
        });
    }

    let built = builder.build()?;
    for warning in &built.warnings {
        warn!(%warning, "Request warning");
        eprintln!("warning: {warning}");
    }
    Ok(built)
}

/// `NAME=VALUE`; the value is taken as text and interpreted per field kind.
fn parse_assignment(assignment: &str) -> Result<FormFieldEdit> {
    match assignment.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok(FormFieldEdit {
            name: name.trim().to_string(),
            value: FormValue::Text(value.to_string()),
        }),
        _ => Err(StampwerkError::InvalidArgument(format!(
            "--fill-field expects NAME=VALUE, got '{assignment}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stampwerk_core::types::Point;

    fn args() -> EditArgs {
        EditArgs {
            position: "72,72".into(),
            signature_box: "400,50,550,100".into(),
            ..EditArgs::default()
        }
    }

    #[test]
    fn no_flags_build_an_empty_request() {
        let built = build_request(&args(), &StampwerkConfig::default()).unwrap();
        assert!(built.edits.is_empty());
    }

    #[test]
    fn text_flags_become_one_text_edit() {
        let edits = EditArgs {
            add_text: Some("APPROVED".into()),
            position: "450,50".into(),
            page_index: Some(1),
            color: Some("#ff0000".into()),
            ..args()
        };
        let built = build_request(&edits, &StampwerkConfig::default()).unwrap();
        let text = &built.edits.text()[0];
        assert_eq!(text.position, Point { x: 450.0, y: 50.0 });
        assert_eq!(text.page, PageTarget::Index(1));
        assert_eq!(text.font_size, Some(12.0));
    }

    #[test]
    fn template_and_flag_are_added_together() {
        let edits = EditArgs {
            template: Some("approval-stamp".into()),
            add_text: Some("mine".into()),
            ..args()
        };
        let built = build_request(&edits, &StampwerkConfig::default()).unwrap();
        assert_eq!(built.edits.text().len(), 3);
        assert_eq!(built.edits.text()[2].text, "mine");
    }

    #[test]
    fn bad_geometry_fails_before_anything_runs() {
        let edits = EditArgs {
            add_text: Some("x".into()),
            position: "1,2,3".into(),
            ..args()
        };
        assert!(matches!(
            build_request(&edits, &StampwerkConfig::default()),
            Err(StampwerkError::MalformedGeometry(_))
        ));
    }

    #[test]
    fn field_assignments_need_a_name() {
        assert_eq!(parse_assignment("agree=Yes").unwrap().name, "agree");
        assert_eq!(
            parse_assignment("note=a=b").unwrap().value,
            FormValue::Text("a=b".into())
        );
        assert!(parse_assignment("=x").is_err());
        assert!(parse_assignment("novalue").is_err());
    }

    #[test]
    fn pages_flag_targets_a_range() {
        let edits = EditArgs {
            add_signature_text: Some("J. Doe".into()),
            pages: Some("2-3".into()),
            ..args()
        };
        let built = build_request(&edits, &StampwerkConfig::default()).unwrap();
        assert_eq!(built.edits.signatures()[0].page, PageTarget::Range("2-3".into()));
    }
}
