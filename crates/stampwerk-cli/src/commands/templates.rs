// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `stampwerk templates`

use std::process::ExitCode;

use stampwerk_core::error::Result;
use stampwerk_document::EngineProbe;
use stampwerk_pipeline::TemplateCatalog;

pub(crate) async fn run(engines: bool) -> Result<ExitCode> {
    let templates = TemplateCatalog::list();
    let width = templates
        .iter()
        .map(|template| template.name.len())
        .max()
        .unwrap_or(0);

    println!("Templates:");
    for template in templates {
        println!("  {:<width$}  {}", template.name, template.description);
    }

    if engines {
        println!("\nEngines:");
        let probe = EngineProbe::new();
        for (engine, available) in probe.survey().await {
            let state = if available { "available" } else { "not installed" };
            println!("  {:<8}  {state}", engine.to_string());
        }
    }
    Ok(ExitCode::SUCCESS)
}
