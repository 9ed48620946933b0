// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text extraction — pull the text layer and document info out of a PDF.
//
// Files are always screened by the safety validator before they are parsed.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use stampwerk_core::error::{Result, StampwerkError};
use stampwerk_core::geometry::parse_page_range;
use stampwerk_security::FileSafetyValidator;
use tracing::{debug, info, instrument, warn};

use crate::pdf::document::PdfDocument;

/// What to extract.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Password for encrypted documents.
    pub password: Option<String>,
    /// Stop after this many pages.
    pub max_pages: Option<u32>,
    /// 1-based page range expression, e.g. `1,3-5`.
    pub pages: Option<String>,
}

/// Text of one page.
#[derive(Debug, Clone, Serialize)]
pub struct PageText {
    /// 1-based page number.
    pub page: u32,
    pub text: String,
}

/// Everything extracted from one document.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedText {
    /// Text of the extracted pages, separated by form feeds.
    pub text: String,
    /// Pages in the whole document, not just the extracted ones.
    pub page_count: u32,
    pub pages: Vec<PageText>,
    /// Text entries of the `/Info` dictionary.
    pub info: BTreeMap<String, String>,
}

/// Extract text from an in-memory PDF.
///
/// The bytes are not screened; callers holding a path go through
/// [`TextExtractor`], which validates first.
#[instrument(skip(data, options), fields(bytes_len = data.len()))]
pub fn extract(data: &[u8], options: &ExtractOptions) -> Result<ExtractedText> {
    extract_named(data, "<memory>", options)
}

fn extract_named(data: &[u8], name: &str, options: &ExtractOptions) -> Result<ExtractedText> {
    let mut document = PdfDocument::from_bytes_named(data, name)?;

    if document.inner().is_encrypted()
        && let Some(password) = &options.password
    {
        document
            .inner_mut()
            .decrypt(password)
            .map_err(|err| StampwerkError::DocumentOpenError {
                path: name.to_string(),
                reason: format!("cannot decrypt: {err}"),
            })?;
        debug!("Document decrypted");
    }

    let page_count = document.page_count();
    let mut selected: Vec<u32> = match &options.pages {
        Some(spec) => parse_page_range(spec, page_count),
        None => (1..=page_count).collect(),
    };
    if let Some(max) = options.max_pages {
        selected.truncate(max as usize);
    }

    let pages: Vec<PageText> = selected
        .into_iter()
        .map(|page| {
            let text = document.inner().extract_text(&[page]).unwrap_or_else(|err| {
                warn!(page, %err, "No text extracted from page");
                String::new()
            });
            PageText { page, text }
        })
        .collect();

    let text = pages
        .iter()
        .map(|page| page.text.trim_end())
        .collect::<Vec<_>>()
        .join("\n\u{c}\n");

    info!(page_count, extracted = pages.len(), chars = text.len(), "Text extracted");
    Ok(ExtractedText {
        text,
        page_count,
        pages,
        info: document.info(),
    })
}

/// Validator-gated text extraction from files.
pub struct TextExtractor {
    validator: FileSafetyValidator,
}

impl TextExtractor {
    pub fn new(validator: FileSafetyValidator) -> Self {
        Self { validator }
    }

    /// Screen `path`, then extract its text.
    ///
    /// A file the validator rejects is never parsed and yields `UnsafeFile`.
    #[instrument(skip(self, options), fields(path = %path.display()))]
    pub async fn extract_file(&self, path: &Path, options: &ExtractOptions) -> Result<ExtractedText> {
        let validator = self.validator.clone();
        let owned_path = path.to_path_buf();
        let report = tokio::task::spawn_blocking(move || validator.validate(&owned_path))
            .await
            .map_err(|err| StampwerkError::PdfError(format!("validation task failed: {err}")))?;
        if !report.safe {
            return Err(StampwerkError::UnsafeFile(format!(
                "{}: {}",
                path.display(),
                report.summary()
            )));
        }
        for issue in &report.issues {
            warn!(issue = %issue.message, "Validator warning");
        }

        let name = path.display().to_string();
        let data = tokio::fs::read(path)
            .await
            .map_err(|err| StampwerkError::DocumentOpenError {
                path: name.clone(),
                reason: err.to_string(),
            })?;

        let options = options.clone();
        tokio::task::spawn_blocking(move || extract_named(&data, &name, &options))
            .await
            .map_err(|err| StampwerkError::PdfError(format!("extraction task failed: {err}")))?
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(FileSafetyValidator::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_pdf;

    #[test]
    fn extracts_every_page_by_default() {
        let extracted = extract(&sample_pdf(3), &ExtractOptions::default()).unwrap();
        assert_eq!(extracted.page_count, 3);
        assert_eq!(extracted.pages.len(), 3);
        assert!(extracted.pages[1].text.contains("Page"));
    }

    #[test]
    fn page_range_and_limit_select_pages() {
        let options = ExtractOptions {
            pages: Some("2-3,1".into()),
            max_pages: Some(2),
            ..Default::default()
        };
        let extracted = extract(&sample_pdf(4), &options).unwrap();
        let numbers: Vec<u32> = extracted.pages.iter().map(|p| p.page).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(extracted.page_count, 4);
    }

    #[tokio::test]
    async fn unsafe_files_are_never_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, sample_pdf(1)).unwrap();

        let err = TextExtractor::default()
            .extract_file(&path, &ExtractOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StampwerkError::UnsafeFile(_)));
    }

    #[tokio::test]
    async fn screened_files_are_extracted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, sample_pdf(2)).unwrap();

        let extracted = TextExtractor::default()
            .extract_file(&path, &ExtractOptions::default())
            .await
            .unwrap();
        assert_eq!(extracted.page_count, 2);
    }

    #[tokio::test]
    async fn pinned_digest_must_match() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        let bytes = sample_pdf(1);
        std::fs::write(&path, &bytes).unwrap();

        let pinned = TextExtractor::new(
            FileSafetyValidator::default().with_expected_sha256(stampwerk_security::hash_bytes(&bytes)),
        );
        assert!(pinned.extract_file(&path, &ExtractOptions::default()).await.is_ok());

        let wrong = TextExtractor::new(FileSafetyValidator::default().with_expected_sha256("0".repeat(64)));
        let err = wrong
            .extract_file(&path, &ExtractOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StampwerkError::UnsafeFile(ref detail) if detail.contains("checksum")));
    }
}
