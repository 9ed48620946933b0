// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the command line.
//
// Every technical error is mapped to a plain sentence with a concrete next step.
// Severity decides whether the CLI exits, skips a file, or only warns.

use crate::error::StampwerkError;

/// How far an error reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// One edit did not apply; the document is still saved.
    SoftFailure,
    /// One document failed; other documents in a batch are unaffected.
    DocumentFailure,
    /// The request itself is invalid; nothing is processed.
    Fatal,
}

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// One-line summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `StampwerkError` into something a person at a terminal can act on.
pub fn humanize_error(err: &StampwerkError) -> HumanError {
    match err {
        StampwerkError::MalformedGeometry(detail) => HumanError {
            message: format!("A position or box could not be read ({detail})."),
            suggestion: "Positions are written x,y and boxes x1,y1,x2,y2, in points from the bottom-left corner.".into(),
            severity: Severity::Fatal,
        },

        StampwerkError::ConfigParseError(detail) => HumanError {
            message: "The edit configuration file is not valid.".into(),
            suggestion: format!("Fix the JSON and run again; no documents were changed. ({detail})"),
            severity: Severity::Fatal,
        },

        StampwerkError::InvalidArgument(detail) => HumanError {
            message: format!("An option value is not valid: {detail}."),
            suggestion: "Run with --help to see the accepted formats.".into(),
            severity: Severity::Fatal,
        },

        StampwerkError::DocumentOpenError { path, .. } => HumanError {
            message: format!("{path} could not be opened as a PDF."),
            suggestion: "Check that the file exists and opens in a PDF viewer.".into(),
            severity: Severity::DocumentFailure,
        },

        StampwerkError::PersistError { path, .. } => HumanError {
            message: format!("The result could not be saved to {path}."),
            suggestion: "Check that the output folder exists, is writable, and has free space.".into(),
            severity: Severity::DocumentFailure,
        },

        StampwerkError::UnsafeFile(detail) => HumanError {
            message: "The file was rejected by the safety checks.".into(),
            suggestion: format!("Inspect the file before processing it. ({detail})"),
            severity: Severity::DocumentFailure,
        },

        StampwerkError::FieldNotFound(name) => HumanError {
            message: format!("The form has no field called \"{name}\"."),
            suggestion: "Field names are case-sensitive; list them with a PDF form inspector.".into(),
            severity: Severity::SoftFailure,
        },

        StampwerkError::TypeMismatch { field, reason } => HumanError {
            message: format!("The field \"{field}\" cannot take that value."),
            suggestion: format!("Use a value that matches the field type. ({reason})"),
            severity: Severity::SoftFailure,
        },

        StampwerkError::UnsupportedImageFormat(detail) => HumanError {
            message: "An image could not be used.".into(),
            suggestion: format!("Save the image as PNG or JPEG and try again. ({detail})"),
            severity: Severity::SoftFailure,
        },

        StampwerkError::PageOutOfRange { index, page_count } => HumanError {
            message: format!(
                "Page {} does not exist; the document has {page_count} page(s).",
                index + 1
            ),
            suggestion: "Pick a page inside the document, or use --all-pages.".into(),
            severity: Severity::SoftFailure,
        },

        StampwerkError::TemplateNotFound(name) => HumanError {
            message: format!("There is no template called \"{name}\"."),
            suggestion: "Run `stampwerk templates` to see the available names.".into(),
            severity: Severity::SoftFailure,
        },

        StampwerkError::PdfError(_) => HumanError {
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged. Try re-saving it from a PDF viewer.".into(),
            severity: Severity::DocumentFailure,
        },

        StampwerkError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as PNG.".into(),
            severity: Severity::SoftFailure,
        },

        StampwerkError::Engine(detail) => HumanError {
            message: "The document engine failed.".into(),
            suggestion: format!("Check that the engine is installed and the input is valid. ({detail})"),
            severity: Severity::Fatal,
        },

        StampwerkError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "The file couldn't be found.".into(),
                suggestion: "Check the path; it may have been moved or deleted.".into(),
                severity: Severity::Fatal,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Permission denied.".into(),
                suggestion: "Check the file and folder permissions.".into(),
                severity: Severity::Fatal,
            },
            _ => HumanError {
                message: "There was a problem reading or writing a file.".into(),
                suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                severity: Severity::Fatal,
            },
        },

        StampwerkError::Serialization(_) => HumanError {
            message: "Data could not be encoded or decoded.".into(),
            suggestion: "Check any JSON you supplied; otherwise please report it.".into(),
            severity: Severity::Fatal,
        },
    }
}
