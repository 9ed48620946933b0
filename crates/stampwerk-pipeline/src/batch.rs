// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch coordinator — applies one edit set to every matching PDF in a
// directory.
//
// Files are discovered once, sorted by name, and that order is the order of
// the report whatever the strategy. Sequential runs process one file at a
// time and report progress as each finishes. Parallel runs start every file
// at once and report only after all of them have settled. A failing file,
// even one whose task panics, never affects the others.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use globset::{Glob, GlobMatcher};
use stampwerk_core::error::{Result, StampwerkError};
use stampwerk_core::types::{BatchReport, EditSet, ExecutionStrategy, ModificationOutcome, RunId};
use stampwerk_security::FileSafetyValidator;
use tracing::{debug, info, instrument, warn};

use crate::modifier::DocumentModifier;
use crate::report::preview_text;

/// Everything a batch run needs.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// File-name glob, e.g. `*.pdf` or `invoice-*`.
    pub pattern: String,
    pub edits: Arc<EditSet>,
    pub strategy: ExecutionStrategy,
    /// Describe the run instead of performing it.
    pub preview_only: bool,
    /// Screen every input with the safety validator before opening it.
    pub validate_inputs: bool,
}

/// Observes a batch run as outcomes arrive.
pub trait BatchProgress: Send + Sync {
    /// Called once the files are known, before any is processed.
    fn on_start(&self, _total: usize) {}

    /// Called once per file with its 0-based position in discovery order.
    fn on_outcome(&self, position: usize, total: usize, outcome: &ModificationOutcome);
}

/// Progress observer that ignores everything.
pub struct SilentProgress;

impl BatchProgress for SilentProgress {
    fn on_outcome(&self, _position: usize, _total: usize, _outcome: &ModificationOutcome) {}
}

/// Runs batches with one modifier and validator.
pub struct BatchCoordinator {
    modifier: Arc<DocumentModifier>,
    validator: FileSafetyValidator,
    progress: Arc<dyn BatchProgress>,
}

impl BatchCoordinator {
    pub fn new(modifier: DocumentModifier, validator: FileSafetyValidator) -> Self {
        Self {
            modifier: Arc::new(modifier),
            validator,
            progress: Arc::new(SilentProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn BatchProgress>) -> Self {
        self.progress = progress;
        self
    }

    /// Run `request`.
    ///
    /// Fails only before any document is touched: an unreadable input
    /// directory, an invalid pattern, or an output directory that cannot be
    /// created. Per-file failures are recorded in the report.
    #[instrument(skip_all, fields(
        input_dir = %request.input_dir.display(),
        pattern = %request.pattern,
        strategy = %request.strategy,
    ))]
    pub async fn run_batch(&self, request: &BatchRequest) -> Result<BatchReport> {
        let started = Instant::now();
        let started_at = Utc::now();
        let run_id = RunId::new();

        let files = discover_inputs(&request.input_dir, &request.pattern).await?;
        info!(%run_id, files = files.len(), edits = request.edits.len(), "Batch started");

        if request.preview_only {
            return Ok(BatchReport {
                run_id,
                started_at,
                strategy: request.strategy,
                outcomes: Vec::new(),
                elapsed: started.elapsed(),
                preview: Some(preview_text(&request.edits, &files)),
            });
        }

        tokio::fs::create_dir_all(&request.output_dir)
            .await
            .map_err(|err| StampwerkError::PersistError {
                path: request.output_dir.display().to_string(),
                reason: format!("cannot create output directory: {err}"),
            })?;

        let jobs: Vec<Job> = files
            .into_iter()
            .map(|input| {
                let output = output_path(&request.output_dir, &input);
                Job { input, output }
            })
            .collect();

        self.progress.on_start(jobs.len());
        let validator = request.validate_inputs.then(|| self.validator.clone());

        let outcomes = match request.strategy {
            ExecutionStrategy::Sequential => self.run_sequential(jobs, &request.edits, validator).await,
            ExecutionStrategy::Parallel => self.run_parallel(jobs, &request.edits, validator).await,
        };

        let report = BatchReport {
            run_id,
            started_at,
            strategy: request.strategy,
            outcomes,
            elapsed: started.elapsed(),
            preview: None,
        };
        info!(
            %run_id,
            succeeded = report.succeeded(),
            failed = report.failed(),
            edits = report.total_edits(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Batch finished"
        );
        Ok(report)
    }

    async fn run_sequential(
        &self,
        jobs: Vec<Job>,
        edits: &Arc<EditSet>,
        validator: Option<FileSafetyValidator>,
    ) -> Vec<ModificationOutcome> {
        let total = jobs.len();
        let mut outcomes = Vec::with_capacity(total);
        for (position, job) in jobs.into_iter().enumerate() {
            let outcome = process_one(&self.modifier, validator.as_ref(), job, edits).await;
            self.progress.on_outcome(position, total, &outcome);
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn run_parallel(
        &self,
        jobs: Vec<Job>,
        edits: &Arc<EditSet>,
        validator: Option<FileSafetyValidator>,
    ) -> Vec<ModificationOutcome> {
        let total = jobs.len();
        let handles: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let modifier = Arc::clone(&self.modifier);
                let edits = Arc::clone(edits);
                let validator = validator.clone();
                let fallback = job.clone();
                let handle = tokio::spawn(async move {
                    process_one(&modifier, validator.as_ref(), job, &edits).await
                });
                (fallback, handle)
            })
            .collect();
        debug!(tasks = handles.len(), "All files dispatched");

        // Awaiting in spawn order is the barrier and keeps discovery order.
        let mut outcomes = Vec::with_capacity(total);
        for (job, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(input = %job.input.display(), %err, "File task did not complete");
                    ModificationOutcome::failed(
                        job.input,
                        job.output,
                        &StampwerkError::PdfError(format!("processing task failed: {err}")),
                        Duration::ZERO,
                    )
                }
            };
            outcomes.push(outcome);
        }

        for (position, outcome) in outcomes.iter().enumerate() {
            self.progress.on_outcome(position, total, outcome);
        }
        outcomes
    }
}

#[derive(Debug, Clone)]
struct Job {
    input: PathBuf,
    output: PathBuf,
}

/// Screen (if asked) and modify one file.
async fn process_one(
    modifier: &DocumentModifier,
    validator: Option<&FileSafetyValidator>,
    job: Job,
    edits: &EditSet,
) -> ModificationOutcome {
    if let Some(validator) = validator {
        let started = Instant::now();
        let screener = validator.clone();
        let path = job.input.clone();
        let rejection = match tokio::task::spawn_blocking(move || screener.validate(&path)).await {
            Ok(report) if report.safe => None,
            Ok(report) => Some(StampwerkError::UnsafeFile(report.summary())),
            Err(err) => Some(StampwerkError::PdfError(format!("validation task failed: {err}"))),
        };
        if let Some(err) = rejection {
            warn!(input = %job.input.display(), %err, "Input rejected");
            return ModificationOutcome::failed(job.input, job.output, &err, started.elapsed());
        }
    }
    modifier.apply(&job.input, &job.output, edits).await
}

/// `output_dir/<input file name>`.
fn output_path(output_dir: &Path, input: &Path) -> PathBuf {
    match input.file_name() {
        Some(name) => output_dir.join(name),
        None => output_dir.join(input),
    }
}

fn compile_pattern(pattern: &str) -> Result<GlobMatcher> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|err| StampwerkError::InvalidArgument(format!("bad pattern '{pattern}': {err}")))
}

/// Regular files directly inside `dir` whose name matches `pattern` and has
/// a `.pdf` extension (any case), sorted by path.
pub async fn discover_inputs(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = compile_pattern(pattern)?;
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|err| {
        StampwerkError::InvalidArgument(format!("cannot read {}: {err}", dir.display()))
    })?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let Some(name) = path.file_name() else {
            continue;
        };
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if !is_pdf || !matcher.is_match(name) {
            continue;
        }
        if tokio::fs::metadata(&path)
            .await
            .is_ok_and(|metadata| metadata.is_file())
        {
            files.push(path);
        }
    }
    files.sort();
    debug!(found = files.len(), "Inputs discovered");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"%PDF-1.4\n%%EOF\n").unwrap();
    }

    #[tokio::test]
    async fn discovery_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "c.txt", "notes.pdf.bak", "invoice-2.pdf"] {
            touch(dir.path(), name);
        }
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let names: Vec<String> = discover_inputs(dir.path(), "*")
            .await
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf", "invoice-2.pdf"]);

        let invoices = discover_inputs(dir.path(), "invoice-*").await.unwrap();
        assert_eq!(invoices.len(), 1);
    }

    #[tokio::test]
    async fn discovery_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover_inputs(dir.path(), "[").await,
            Err(StampwerkError::InvalidArgument(_))
        ));
        assert!(matches!(
            discover_inputs(&dir.path().join("missing"), "*.pdf").await,
            Err(StampwerkError::InvalidArgument(_))
        ));
    }

    // -- Whole batches --------------------------------------------------------

    use crate::fixtures::{shown_strings, write_pdf};
    use stampwerk_core::config::StampwerkConfig;
    use stampwerk_core::types::{Point, TextEdit};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        started: Mutex<Option<usize>>,
        seen: Mutex<Vec<(usize, String)>>,
    }

    impl BatchProgress for Recorder {
        fn on_start(&self, total: usize) {
            *self.started.lock().unwrap() = Some(total);
        }

        fn on_outcome(&self, position: usize, _total: usize, outcome: &ModificationOutcome) {
            self.seen.lock().unwrap().push((position, outcome.display_name()));
        }
    }

    /// Three inputs; the middle one is not a PDF.
    fn three_inputs() -> (tempfile::TempDir, BatchRequest) {
        let dir = tempfile::tempdir().unwrap();
        let input_dir = dir.path().join("in");
        std::fs::create_dir(&input_dir).unwrap();
        write_pdf(&input_dir, "a.pdf", 1);
        std::fs::write(input_dir.join("b.pdf"), b"garbage").unwrap();
        write_pdf(&input_dir, "c.pdf", 2);

        let request = BatchRequest {
            input_dir,
            output_dir: dir.path().join("out"),
            pattern: "*.pdf".into(),
            edits: Arc::new(EditSet::new(
                vec![TextEdit::new("BATCH", Point { x: 10.0, y: 10.0 })],
                Vec::new(),
                Vec::new(),
                Vec::new(),
            )),
            strategy: ExecutionStrategy::Sequential,
            preview_only: false,
            validate_inputs: false,
        };
        (dir, request)
    }

    fn coordinator() -> BatchCoordinator {
        BatchCoordinator::new(
            DocumentModifier::new(&StampwerkConfig::default()),
            FileSafetyValidator::default(),
        )
    }

    async fn run_with(strategy: ExecutionStrategy) {
        let (_dir, mut request) = three_inputs();
        request.strategy = strategy;
        let recorder = Arc::new(Recorder::default());
        let report = coordinator()
            .with_progress(recorder.clone())
            .run_batch(&request)
            .await
            .unwrap();

        let names: Vec<String> = report.outcomes.iter().map(|o| o.display_name()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf", "c.pdf"]);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!report.outcomes[1].success);
        assert_eq!(report.total_edits(), 2);
        assert_eq!(report.strategy, strategy);

        assert!(request.output_dir.join("a.pdf").exists());
        assert!(!request.output_dir.join("b.pdf").exists());
        assert!(shown_strings(&request.output_dir.join("c.pdf"), 1).contains(&"BATCH".to_string()));

        assert_eq!(*recorder.started.lock().unwrap(), Some(3));
        let seen = recorder.seen.lock().unwrap();
        assert_eq!(
            seen.iter().map(|(position, _)| *position).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[tokio::test]
    async fn sequential_batch_isolates_a_corrupt_file() {
        run_with(ExecutionStrategy::Sequential).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn parallel_batch_isolates_a_corrupt_file() {
        run_with(ExecutionStrategy::Parallel).await;
    }

    #[tokio::test]
    async fn preview_touches_nothing() {
        let (_dir, mut request) = three_inputs();
        request.preview_only = true;
        let report = coordinator().run_batch(&request).await.unwrap();

        assert!(report.is_preview());
        assert!(report.outcomes.is_empty());
        let preview = report.preview.unwrap();
        assert!(preview.contains("Files (3):"));
        assert!(preview.contains("\"BATCH\""));
        assert!(!request.output_dir.exists());
    }

    #[tokio::test]
    async fn validation_rejects_oversized_inputs() {
        let (_dir, mut request) = three_inputs();
        request.validate_inputs = true;
        let report = BatchCoordinator::new(
            DocumentModifier::new(&StampwerkConfig::default()),
            FileSafetyValidator::new(4),
        )
        .run_batch(&request)
        .await
        .unwrap();

        assert_eq!(report.failed(), 3);
        assert!(
            report.outcomes[0]
                .error_message
                .as_deref()
                .unwrap()
                .contains("safety")
        );
    }

    #[tokio::test]
    async fn empty_directory_is_an_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let request = BatchRequest {
            input_dir: dir.path().to_path_buf(),
            output_dir: dir.path().join("out"),
            pattern: "*.pdf".into(),
            edits: Arc::new(EditSet::empty()),
            strategy: ExecutionStrategy::Parallel,
            preview_only: false,
            validate_inputs: false,
        };
        let report = coordinator().run_batch(&request).await.unwrap();
        assert!(report.outcomes.is_empty());
        assert_eq!(report.total_edits(), 0);
    }

    #[test]
    fn outputs_keep_the_input_name() {
        assert_eq!(
            output_path(Path::new("/out"), Path::new("/in/report.pdf")),
            PathBuf::from("/out/report.pdf")
        );
    }
}
