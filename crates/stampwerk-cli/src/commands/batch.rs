// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `stampwerk batch-modify <input_dir> <output_dir>`
//
// Exits 0 once the batch has run, however many files failed; failures are
// listed in the summary.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use stampwerk_core::config::StampwerkConfig;
use stampwerk_core::error::Result;
use stampwerk_core::types::{ExecutionStrategy, ModificationOutcome};
use stampwerk_pipeline::report::{outcome_line, summary_table};
use stampwerk_pipeline::{BatchCoordinator, BatchProgress, BatchRequest, DocumentModifier};
use stampwerk_security::FileSafetyValidator;

use super::build_request;
use crate::cli::EditArgs;

/// Batch-only flags.
pub(crate) struct BatchFlags<'a> {
    pub(crate) pattern: Option<&'a str>,
    pub(crate) preview_only: bool,
    pub(crate) parallel: bool,
    pub(crate) validate: bool,
}

/// Prints one line to stderr per finished file.
struct ConsoleProgress;

impl BatchProgress for ConsoleProgress {
    fn on_start(&self, total: usize) {
        eprintln!("Processing {total} file(s)");
    }

    fn on_outcome(&self, position: usize, total: usize, outcome: &ModificationOutcome) {
        eprintln!("[{}/{total}] {}", position + 1, outcome_line(outcome));
    }
}

pub(crate) async fn run(
    input_dir: &Path,
    output_dir: &Path,
    flags: BatchFlags<'_>,
    args: &EditArgs,
    config: &StampwerkConfig,
) -> Result<ExitCode> {
    let built = build_request(args, config)?;

    let strategy = if flags.parallel {
        ExecutionStrategy::Parallel
    } else {
        config.default_strategy
    };
    let request = BatchRequest {
        input_dir: input_dir.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        pattern: flags.pattern.unwrap_or(&config.batch_pattern).to_string(),
        edits: Arc::new(built.edits),
        strategy,
        preview_only: flags.preview_only,
        validate_inputs: flags.validate || config.validate_batch_inputs,
    };

    let coordinator = BatchCoordinator::new(
        DocumentModifier::new(config),
        FileSafetyValidator::new(config.max_file_size_bytes),
    )
    .with_progress(Arc::new(ConsoleProgress));
    let report = coordinator.run_batch(&request).await?;

    match &report.preview {
        Some(preview) => print!("{preview}"),
        None => print!("{}", summary_table(&report)),
    }
    Ok(ExitCode::SUCCESS)
}
