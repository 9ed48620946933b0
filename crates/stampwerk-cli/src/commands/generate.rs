// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `stampwerk generate <input> <output>`

use std::path::Path;
use std::process::ExitCode;

use stampwerk_core::error::{Result, StampwerkError};
use stampwerk_document::{Engine, EngineProbe, GenerationToolchain, PdfWriter};

pub(crate) async fn run(
    input: &Path,
    output: &Path,
    engine: Option<&str>,
    title: Option<&str>,
) -> Result<ExitCode> {
    let requested = engine
        .map(|name| {
            Engine::from_name(name).ok_or_else(|| {
                StampwerkError::InvalidArgument(format!(
                    "unknown engine '{name}' (pandoc, typst, latex, builtin)"
                ))
            })
        })
        .transpose()?;

    let mut writer = PdfWriter::a4();
    if let Some(title) = title {
        writer = writer.with_title(title);
    }

    let probe = EngineProbe::new();
    let used = GenerationToolchain::new(&probe)
        .with_writer(writer)
        .generate(input, output, requested)
        .await?;

    println!("Generated {} with {used}", output.display());
    Ok(ExitCode::SUCCESS)
}
