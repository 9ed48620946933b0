// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `stampwerk modify <input> <output>`

use std::path::Path;
use std::process::ExitCode;

use stampwerk_core::config::StampwerkConfig;
use stampwerk_core::error::Result;
use stampwerk_pipeline::DocumentModifier;
use stampwerk_pipeline::report::outcome_line;
use tracing::info;

use super::{EXIT_DOCUMENT_FAILED, build_request};
use crate::cli::EditArgs;

pub(crate) async fn run(
    input: &Path,
    output: &Path,
    args: &EditArgs,
    config: &StampwerkConfig,
) -> Result<ExitCode> {
    let request = build_request(args, config)?;
    info!(edits = request.edits.len(), "Modifying one document");

    let outcome = DocumentModifier::new(config)
        .apply(input, output, &request.edits)
        .await;

    println!("{}", outcome_line(&outcome));
    for warning in &outcome.warnings {
        eprintln!("  skipped: {warning}");
    }

    if outcome.success {
        println!("Saved to {}", outcome.output_path.display());
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_DOCUMENT_FAILED))
    }
}
