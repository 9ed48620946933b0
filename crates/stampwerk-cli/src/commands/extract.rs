// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `stampwerk extract <input>`

use std::path::Path;
use std::process::ExitCode;

use stampwerk_core::config::StampwerkConfig;
use stampwerk_core::error::Result;
use stampwerk_document::{ExtractOptions, TextExtractor};
use stampwerk_security::FileSafetyValidator;

/// The validator for `extract`, pinned to `sha256` when one is given.
pub(crate) fn validator(config: &StampwerkConfig, sha256: Option<String>) -> FileSafetyValidator {
    let validator = FileSafetyValidator::new(config.max_file_size_bytes);
    match sha256 {
        Some(digest) => validator.with_expected_sha256(digest),
        None => validator,
    }
}

pub(crate) async fn run(
    input: &Path,
    output: Option<&Path>,
    options: ExtractOptions,
    json: bool,
    validator: FileSafetyValidator,
) -> Result<ExitCode> {
    let extractor = TextExtractor::new(validator);
    let extracted = extractor.extract_file(input, &options).await?;

    let rendered = if json {
        serde_json::to_string_pretty(&extracted)?
    } else {
        extracted.text
    };

    match output {
        Some(path) => {
            tokio::fs::write(path, rendered).await?;
            eprintln!(
                "Extracted {} of {} page(s) to {}",
                extracted.pages.len(),
                extracted.page_count,
                path.display()
            );
        }
        None => println!("{rendered}"),
    }
    Ok(ExitCode::SUCCESS)
}
