// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Stampwerk.

use thiserror::Error;

/// Top-level error type for all Stampwerk operations.
#[derive(Debug, Error)]
pub enum StampwerkError {
    // -- Pre-flight errors (abort before any document is touched) --
    #[error("malformed geometry: {0}")]
    MalformedGeometry(String),

    #[error("could not parse edit configuration: {0}")]
    ConfigParseError(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // -- Per-document errors --
    #[error("could not open document {path}: {reason}")]
    DocumentOpenError { path: String, reason: String },

    #[error("could not write document {path}: {reason}")]
    PersistError { path: String, reason: String },

    #[error("file failed safety checks: {0}")]
    UnsafeFile(String),

    // -- Per-edit soft failures --
    #[error("form field not found: {0}")]
    FieldNotFound(String),

    #[error("form field {field} cannot take that value: {reason}")]
    TypeMismatch { field: String, reason: String },

    #[error("unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    #[error("page index {index} out of range (document has {page_count} pages)")]
    PageOutOfRange { index: u32, page_count: u32 },

    // -- Soft, request-level --
    #[error("unknown template: {0}")]
    TemplateNotFound(String),

    // -- Document layer --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("document engine failed: {0}")]
    Engine(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StampwerkError {
    /// Whether this error is local to a single edit and must not fail the
    /// containing document.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            Self::FieldNotFound(_)
                | Self::TypeMismatch { .. }
                | Self::UnsupportedImageFormat(_)
                | Self::PageOutOfRange { .. }
                | Self::TemplateNotFound(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, StampwerkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_edit_errors_are_soft() {
        assert!(StampwerkError::FieldNotFound("name".into()).is_soft());
        assert!(
            StampwerkError::PageOutOfRange {
                index: 4,
                page_count: 2
            }
            .is_soft()
        );
        assert!(!StampwerkError::ConfigParseError("eof".into()).is_soft());
        assert!(
            !StampwerkError::DocumentOpenError {
                path: "a.pdf".into(),
                reason: "missing".into()
            }
            .is_soft()
        );
    }
}
