// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// stampwerk — command-line entry point.
//
// Reports go to stdout; logs, progress, and errors go to stderr.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use stampwerk_core::config::StampwerkConfig;
use stampwerk_core::error::Result;
use stampwerk_document::ExtractOptions;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::commands::batch::BatchFlags;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            tracing::debug!(%err, "Command failed");
            commands::report_error(&err)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = StampwerkConfig::resolve(cli.settings.as_deref())?;

    match cli.command {
        Command::Modify {
            input,
            output,
            edits,
        } => commands::modify::run(&input, &output, &edits, &config).await,
        Command::BatchModify {
            input_dir,
            output_dir,
            pattern,
            preview_only,
            parallel,
            validate,
            edits,
        } => {
            let flags = BatchFlags {
                pattern: pattern.as_deref(),
                preview_only,
                parallel,
                validate,
            };
            commands::batch::run(&input_dir, &output_dir, flags, &edits, &config).await
        }
        Command::Extract {
            input,
            output,
            pages,
            password,
            max_pages,
            json,
            sha256,
        } => {
            let options = ExtractOptions {
                password,
                max_pages,
                pages,
            };
            let validator = commands::extract::validator(&config, sha256);
            commands::extract::run(&input, output.as_deref(), options, json, validator).await
        }
        Command::Generate {
            input,
            output,
            engine,
            title,
        } => commands::generate::run(&input, &output, engine.as_deref(), title.as_deref()).await,
        Command::Templates { engines } => commands::templates::run(engines).await,
    }
}
