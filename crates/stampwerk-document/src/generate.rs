// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document generation — turn source documents into PDFs with an external
// engine (pandoc, typst, pdflatex) or the builtin renderer.
//
// Which engines are installed is discovered by an `EngineProbe`. One probe is
// built per process and passed to the toolchain; it fills its cache on first
// use and never forgets an answer.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Serialize;
use stampwerk_core::error::{Result, StampwerkError};
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::pdf::writer::PdfWriter;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp"];

/// Longest stderr excerpt carried into an error message.
const STDERR_EXCERPT: usize = 600;

/// A PDF generation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Engine {
    Pandoc,
    Typst,
    Latex,
    /// The in-process text and image renderer.
    Builtin,
}

impl Engine {
    pub const ALL: [Engine; 4] = [Self::Pandoc, Self::Typst, Self::Latex, Self::Builtin];

    /// Executable that implements the engine, `None` for the builtin one.
    pub fn binary(&self) -> Option<&'static str> {
        match self {
            Self::Pandoc => Some("pandoc"),
            Self::Typst => Some("typst"),
            Self::Latex => Some("pdflatex"),
            Self::Builtin => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "pandoc" => Some(Self::Pandoc),
            "typst" => Some(Self::Typst),
            "latex" | "pdflatex" | "tex" => Some(Self::Latex),
            "builtin" | "text" => Some(Self::Builtin),
            _ => None,
        }
    }

    /// The engine suited to a source file, judged by its extension.
    pub fn for_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "md" | "markdown" | "rst" | "html" | "htm" | "docx" | "odt" | "org" => Self::Pandoc,
            "typ" => Self::Typst,
            "tex" | "latex" => Self::Latex,
            _ => Self::Builtin,
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pandoc => "pandoc",
            Self::Typst => "typst",
            Self::Latex => "pdflatex",
            Self::Builtin => "builtin",
        };
        f.write_str(name)
    }
}

/// Finds out which engines are installed, remembering each answer.
#[derive(Debug, Default)]
pub struct EngineProbe {
    cache: Mutex<HashMap<Engine, bool>>,
}

impl EngineProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `engine` can be run. External engines are probed with
    /// `--version` the first time they are asked about.
    pub async fn is_available(&self, engine: Engine) -> bool {
        let Some(binary) = engine.binary() else {
            return true;
        };

        let mut cache = self.cache.lock().await;
        if let Some(available) = cache.get(&engine) {
            return *available;
        }

        let available = Command::new(binary)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .is_ok_and(|status| status.success());
        debug!(%engine, available, "Engine probed");
        cache.insert(engine, available);
        available
    }

    /// Probe every engine.
    pub async fn survey(&self) -> Vec<(Engine, bool)> {
        let mut results = Vec::with_capacity(Engine::ALL.len());
        for engine in Engine::ALL {
            results.push((engine, self.is_available(engine).await));
        }
        results
    }
}

/// Converts source documents to PDF.
pub struct GenerationToolchain<'a> {
    probe: &'a EngineProbe,
    writer: PdfWriter,
}

impl<'a> GenerationToolchain<'a> {
    pub fn new(probe: &'a EngineProbe) -> Self {
        Self {
            probe,
            writer: PdfWriter::a4(),
        }
    }

    /// Use `writer` for builtin rendering.
    pub fn with_writer(mut self, writer: PdfWriter) -> Self {
        self.writer = writer;
        self
    }

    /// Convert `input` to a PDF at `output` and return the engine used.
    ///
    /// Without an explicit engine the input's extension decides. A requested
    /// external engine that is not installed is an error; an automatically
    /// chosen one falls back to the builtin renderer for sources that are
    /// readable as plain text.
    #[instrument(skip(self), fields(input = %input.display(), output = %output.display()))]
    pub async fn generate(
        &self,
        input: &Path,
        output: &Path,
        requested: Option<Engine>,
    ) -> Result<Engine> {
        let engine = match requested {
            Some(engine) => {
                if !self.probe.is_available(engine).await {
                    return Err(StampwerkError::Engine(format!("{engine} is not installed")));
                }
                engine
            }
            None => {
                let preferred = Engine::for_path(input);
                if self.probe.is_available(preferred).await {
                    preferred
                } else if matches!(preferred, Engine::Pandoc) {
                    warn!(%preferred, "Engine not installed, rendering source as plain text");
                    Engine::Builtin
                } else {
                    return Err(StampwerkError::Engine(format!(
                        "{preferred} is needed for {} but is not installed",
                        input.display()
                    )));
                }
            }
        };

        match engine {
            Engine::Builtin => self.render_builtin(input, output).await?,
            Engine::Pandoc => {
                let mut command = Command::new("pandoc");
                command.arg(input).arg("-o").arg(output);
                run(engine, command).await?;
            }
            Engine::Typst => {
                let mut command = Command::new("typst");
                command.arg("compile").arg(input).arg(output);
                run(engine, command).await?;
            }
            Engine::Latex => self.run_latex(input, output).await?,
        }

        info!(%engine, "Document generated");
        Ok(engine)
    }

    async fn render_builtin(&self, input: &Path, output: &Path) -> Result<()> {
        let data = tokio::fs::read(input).await?;
        let is_image = input
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));

        let pdf = if is_image {
            self.writer.create_from_image(&data)?
        } else {
            self.writer
                .create_from_text(&String::from_utf8_lossy(&data))?
        };
        tokio::fs::write(output, pdf).await?;
        Ok(())
    }

    /// pdflatex names its output after the input, in the output directory.
    async fn run_latex(&self, input: &Path, output: &Path) -> Result<()> {
        let out_dir = output
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut command = Command::new("pdflatex");
        command
            .arg("-interaction=nonstopmode")
            .arg("-halt-on-error")
            .arg(format!("-output-directory={}", out_dir.display()))
            .arg(input);
        run(Engine::Latex, command).await?;

        let stem = input
            .file_stem()
            .ok_or_else(|| StampwerkError::InvalidArgument("input has no file name".into()))?;
        let produced = out_dir.join(format!("{}.pdf", stem.to_string_lossy()));
        if produced != output {
            tokio::fs::rename(&produced, output).await?;
        }
        Ok(())
    }
}

/// Run an engine process to completion, turning a failed exit into an error.
async fn run(engine: Engine, mut command: Command) -> Result<()> {
    let result = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|err| StampwerkError::Engine(format!("failed to start {engine}: {err}")))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        let excerpt: String = stderr
            .chars()
            .rev()
            .take(STDERR_EXCERPT)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        return Err(StampwerkError::Engine(format!(
            "{engine} exited with {}: {}",
            result.status.code().unwrap_or(-1),
            excerpt.trim()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engines_follow_extensions() {
        assert_eq!(Engine::for_path(Path::new("notes.MD")), Engine::Pandoc);
        assert_eq!(Engine::for_path(Path::new("paper.typ")), Engine::Typst);
        assert_eq!(Engine::for_path(Path::new("thesis.tex")), Engine::Latex);
        assert_eq!(Engine::for_path(Path::new("readme.txt")), Engine::Builtin);
        assert_eq!(Engine::for_path(Path::new("scan.png")), Engine::Builtin);
        assert_eq!(Engine::from_name("PDFLATEX"), Some(Engine::Latex));
        assert_eq!(Engine::from_name("word"), None);
    }

    #[tokio::test]
    async fn probe_remembers_answers() {
        let probe = EngineProbe::new();
        assert!(probe.cache.lock().await.is_empty());
        let first = probe.is_available(Engine::Typst).await;
        assert_eq!(probe.cache.lock().await.get(&Engine::Typst), Some(&first));
        assert_eq!(probe.is_available(Engine::Typst).await, first);

        assert!(probe.is_available(Engine::Builtin).await);
        assert!(!probe.cache.lock().await.contains_key(&Engine::Builtin));
    }

    #[tokio::test]
    async fn builtin_renders_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("memo.txt");
        let output = dir.path().join("memo.pdf");
        std::fs::write(&input, "Quarterly memo\nAll good.").unwrap();

        let probe = EngineProbe::new();
        let engine = GenerationToolchain::new(&probe)
            .generate(&input, &output, None)
            .await
            .unwrap();
        assert_eq!(engine, Engine::Builtin);

        let pdf = std::fs::read(&output).unwrap();
        assert_eq!(lopdf::Document::load_mem(&pdf).unwrap().get_pages().len(), 1);
    }
}
