//! Workflow orchestration: drives a [`JobRequest`] through its stages and
//! produces a [`RunSummary`].
//!
//! The orchestrator advances monotonically through
//! `Idle → CollectingInput → Processing(stage) → Reporting → Done`, with
//! `Failed` as the terminal state of a fatal error. Per-file failures never
//! fail a run on their own: a failed file is excluded from later stages and
//! reported, and only a stage that loses ALL of its inputs raises the fatal
//! [`SlideforgeError::AllInputsFailed`].
//!
//! Intermediate artifacts of the full workflow (enhanced copies, the
//! unnumbered merge) live in a [`tempfile::TempDir`] and are removed when
//! the run finishes; only final outputs land in the output directory.

use crate::collect::{self, FileKind, FileSet};
use crate::config::{JobRequest, Operation};
use crate::error::SlideforgeError;
use crate::ops::{enhance, images, merge, number};
use crate::report::{RunSummary, Stage, StageResult, WorkflowState};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Run one job to completion.
///
/// Returns `Ok(RunSummary)` when the run reached its final output, even if
/// some files failed along the way; returns `Err` only on fatal errors.
pub async fn run(request: JobRequest) -> Result<RunSummary, SlideforgeError> {
    let mut orchestrator = Orchestrator::new(request);
    match orchestrator.execute().await {
        Ok(summary) => Ok(summary),
        Err(e) => {
            warn!("Run failed in state {}: {e}", orchestrator.state);
            orchestrator.state = WorkflowState::Failed;
            Err(e)
        }
    }
}

/// Blocking wrapper around [`run`] for synchronous callers.
pub fn run_sync(request: JobRequest) -> Result<RunSummary, SlideforgeError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| SlideforgeError::Internal(format!("failed to start runtime: {e}")))?;
    runtime.block_on(run(request))
}

struct Orchestrator {
    request: JobRequest,
    state: WorkflowState,
    stages: Vec<StageResult>,
    outputs: Vec<PathBuf>,
}

impl Orchestrator {
    fn new(request: JobRequest) -> Self {
        Orchestrator {
            request,
            state: WorkflowState::Idle,
            stages: Vec::new(),
            outputs: Vec::new(),
        }
    }

    async fn execute(&mut self) -> Result<RunSummary, SlideforgeError> {
        let started = Instant::now();
        info!(
            "Starting {} run: {} → {}",
            self.request.operation,
            self.request.input_path.display(),
            self.request.output_dir.display()
        );

        // Collection happens before any output directory is created, so a
        // mis-specified input leaves the filesystem untouched.
        self.state = WorkflowState::CollectingInput;
        let kind = match self.request.operation {
            Operation::ImagesToPdf => FileKind::Image,
            _ => FileKind::Pdf,
        };
        let files = collect::collect(&self.request.input_path, kind)?;

        std::fs::create_dir_all(&self.request.output_dir).map_err(|e| {
            SlideforgeError::WriteError {
                path: self.request.output_dir.clone(),
                detail: e.to_string(),
            }
        })?;

        if let Some(ref cb) = self.request.progress_callback {
            cb.on_run_start(files.len());
        }

        match self.request.operation {
            Operation::Enhance => self.run_enhance(&files).await?,
            Operation::MergeSlides => self.run_merge(&files).await?,
            Operation::AddPageNumbers => self.run_number(&files).await?,
            Operation::ImagesToPdf => self.run_images(&files).await?,
            Operation::Full => self.run_full(&files).await?,
        }

        self.state = WorkflowState::Reporting;
        let failed: usize = self.stages.iter().map(|s| s.failed.len()).sum();
        let succeeded: usize = self.stages.iter().map(|s| s.succeeded.len()).sum();
        if let Some(ref cb) = self.request.progress_callback {
            cb.on_run_complete(succeeded, failed);
        }

        self.state = WorkflowState::Done;
        info!(
            "Run complete: {} output(s), {} per-file failure(s), {} ms",
            self.outputs.len(),
            failed,
            started.elapsed().as_millis()
        );

        Ok(RunSummary {
            operation: self.request.operation,
            state: self.state,
            stages: std::mem::take(&mut self.stages),
            outputs: std::mem::take(&mut self.outputs),
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    async fn run_enhance(&mut self, files: &FileSet) -> Result<(), SlideforgeError> {
        self.enter(Stage::Enhance, files.len());
        let stage = enhance::enhance_set(files, &self.request.output_dir, &self.request).await?;
        fatal_if_all_failed(&stage)?;

        self.outputs.extend(stage.succeeded.iter().cloned());

        if self.request.combine && !stage.succeeded.is_empty() {
            let combined = self.output_file("_combined");
            enhance::combine_outputs(&stage.succeeded, &combined).await?;
            self.outputs.push(combined);
        }

        self.stages.push(stage);
        Ok(())
    }

    async fn run_merge(&mut self, files: &FileSet) -> Result<(), SlideforgeError> {
        self.enter(Stage::MergeSlides, files.len());
        let merged = self.output_file("_merged");
        let stage = merge::merge_to_a4(files, &merged, &self.request).await?;
        fatal_if_all_failed(&stage)?;

        self.outputs.push(merged);
        self.stages.push(stage);
        Ok(())
    }

    async fn run_number(&mut self, files: &FileSet) -> Result<(), SlideforgeError> {
        // Numbering is a single-document operation; a directory holding
        // several PDFs is a mis-specified job, not a batch.
        if files.len() > 1 {
            return Err(SlideforgeError::InvalidConfig(format!(
                "add-page-numbers stamps a single PDF, but '{}' holds {} PDF files; \
                 pass one file instead",
                self.request.input_path.display(),
                files.len()
            )));
        }

        self.enter(Stage::AddPageNumbers, files.len());
        let input = &files.paths()[0];
        let output = self.output_file("_numbered");

        let pages = number::add_page_numbers(
            input,
            &output,
            self.request.position,
            self.request.start_page,
        )
        .await?;
        debug!("Stamped {pages} page(s)");

        let mut stage = StageResult::new(Stage::AddPageNumbers);
        stage.record_success(output.clone());
        if let Some(ref cb) = self.request.progress_callback {
            cb.on_file_complete(Stage::AddPageNumbers, &file_name(input));
        }

        self.outputs.push(output);
        self.stages.push(stage);
        Ok(())
    }

    async fn run_images(&mut self, files: &FileSet) -> Result<(), SlideforgeError> {
        self.enter(Stage::ImagesToPdf, files.len());
        let final_output = self.output_file("");

        if self.request.position.is_anchor() {
            // Pack into a scratch file, then stamp into the final output.
            let scratch = scratch_dir()?;
            let unnumbered = scratch.path().join("unnumbered.pdf");

            let stage = images::images_to_pdf(files, &unnumbered, &self.request).await?;
            fatal_if_all_failed(&stage)?;
            self.stages.push(stage);

            self.stamp_stage(&unnumbered, &final_output).await?;
        } else {
            let stage = images::images_to_pdf(files, &final_output, &self.request).await?;
            fatal_if_all_failed(&stage)?;
            self.stages.push(stage);
        }

        self.outputs.push(final_output);
        Ok(())
    }

    /// Enhance → MergeSlides → AddPageNumbers, with exclusion-and-continue:
    /// a file that fails a stage is dropped from later stages, and the run
    /// proceeds with the rest.
    async fn run_full(&mut self, files: &FileSet) -> Result<(), SlideforgeError> {
        let scratch = scratch_dir()?;
        let final_output = self.output_file("");

        self.enter(Stage::Enhance, files.len());
        let enhance_stage = enhance::enhance_set(files, scratch.path(), &self.request).await?;
        fatal_if_all_failed(&enhance_stage)?;
        let enhanced = FileSet::from_paths(FileKind::Pdf, enhance_stage.succeeded.clone())?;
        self.stages.push(enhance_stage);

        self.enter(Stage::MergeSlides, enhanced.len());
        if self.request.position.is_anchor() {
            let merged = scratch.path().join("merged.pdf");
            let merge_stage = merge::merge_to_a4(&enhanced, &merged, &self.request).await?;
            fatal_if_all_failed(&merge_stage)?;
            self.stages.push(merge_stage);

            self.stamp_stage(&merged, &final_output).await?;
        } else {
            // Numbering skipped: the merge output IS the final document.
            let merge_stage = merge::merge_to_a4(&enhanced, &final_output, &self.request).await?;
            fatal_if_all_failed(&merge_stage)?;
            self.stages.push(merge_stage);
        }

        self.outputs.push(final_output);
        Ok(())
    }

    /// Numbering sub-stage shared by the images and full workflows: stamp
    /// `source` into `output`, recording the stage and firing the per-file
    /// completion callback.
    async fn stamp_stage(&mut self, source: &Path, output: &Path) -> Result<(), SlideforgeError> {
        self.enter(Stage::AddPageNumbers, 1);
        let pages = number::add_page_numbers(
            source,
            output,
            self.request.position,
            self.request.start_page,
        )
        .await?;
        debug!("Stamped {pages} page(s)");

        let mut stage = StageResult::new(Stage::AddPageNumbers);
        stage.record_success(output.to_path_buf());
        if let Some(ref cb) = self.request.progress_callback {
            cb.on_file_complete(Stage::AddPageNumbers, &file_name(output));
        }
        self.stages.push(stage);
        Ok(())
    }

    fn enter(&mut self, stage: Stage, total: usize) {
        self.state = WorkflowState::Processing(stage);
        info!("Stage {stage}: {total} file(s)");
        if let Some(ref cb) = self.request.progress_callback {
            cb.on_stage_start(stage, total);
        }
    }

    /// `<output_dir>/<base_name><suffix>.pdf`
    fn output_file(&self, suffix: &str) -> PathBuf {
        self.request
            .output_dir
            .join(format!("{}{}.pdf", self.request.base_name, suffix))
    }
}

fn fatal_if_all_failed(stage: &StageResult) -> Result<(), SlideforgeError> {
    if stage.all_failed() {
        return Err(SlideforgeError::AllInputsFailed {
            stage: stage.stage.to_string(),
            total: stage.total(),
            first_error: stage.failed[0].reason.clone(),
        });
    }
    Ok(())
}

fn scratch_dir() -> Result<tempfile::TempDir, SlideforgeError> {
    tempfile::TempDir::new()
        .map_err(|e| SlideforgeError::Internal(format!("failed to create scratch dir: {e}")))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FileError;
    use tempfile::TempDir;

    // Fatal-path tests only: they fail during collection, before any pdfium
    // binding is attempted.

    #[tokio::test]
    async fn missing_input_is_fatal_and_writes_nothing() {
        let out = TempDir::new().unwrap();
        let out_dir = out.path().join("results");
        let request = JobRequest::builder(
            Operation::Enhance,
            "/no/such/path",
            &out_dir,
        )
        .build()
        .unwrap();

        let err = run(request).await.unwrap_err();
        assert!(matches!(err, SlideforgeError::PathNotFound { .. }));
        assert!(!out_dir.exists(), "output dir must not be created on fatal input errors");
    }

    #[tokio::test]
    async fn empty_directory_is_fatal() {
        let input = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let request = JobRequest::builder(Operation::MergeSlides, input.path(), out.path())
            .build()
            .unwrap();

        let err = run(request).await.unwrap_err();
        assert!(matches!(err, SlideforgeError::EmptyInputSet { .. }));
    }

    #[tokio::test]
    async fn wrong_extension_is_fatal() {
        let input = TempDir::new().unwrap();
        let doc = input.path().join("notes.txt");
        std::fs::write(&doc, "hello").unwrap();
        let out = TempDir::new().unwrap();

        let request = JobRequest::builder(Operation::AddPageNumbers, &doc, out.path())
            .build()
            .unwrap();

        let err = run(request).await.unwrap_err();
        assert!(matches!(err, SlideforgeError::UnsupportedFileType { .. }));
    }

    #[tokio::test]
    async fn numbering_rejects_multi_file_directories() {
        let input = TempDir::new().unwrap();
        std::fs::write(input.path().join("a.pdf"), b"%PDF-1.4").unwrap();
        std::fs::write(input.path().join("b.pdf"), b"%PDF-1.4").unwrap();
        let out = TempDir::new().unwrap();

        let request = JobRequest::builder(Operation::AddPageNumbers, input.path(), out.path())
            .build()
            .unwrap();

        let err = run(request).await.unwrap_err();
        match err {
            SlideforgeError::InvalidConfig(msg) => {
                assert!(msg.contains("2 PDF files"), "got: {msg}");
            }
            other => panic!("expected InvalidConfig, got {other}"),
        }
    }

    #[tokio::test]
    async fn images_operation_collects_images_not_pdfs() {
        let input = TempDir::new().unwrap();
        std::fs::write(input.path().join("deck.pdf"), b"%PDF-1.7").unwrap();
        let out = TempDir::new().unwrap();

        let request = JobRequest::builder(Operation::ImagesToPdf, input.path(), out.path())
            .build()
            .unwrap();

        // The only file present is a PDF, so image collection finds nothing.
        let err = run(request).await.unwrap_err();
        assert!(matches!(err, SlideforgeError::EmptyInputSet { .. }));
    }

    #[test]
    fn all_failed_check_raises_fatal() {
        let mut stage = StageResult::new(Stage::Enhance);
        stage.record_failure(FileError::RenderFailed {
            path: "a.pdf".into(),
            detail: "corrupt".into(),
        });
        stage.record_failure(FileError::RenderFailed {
            path: "b.pdf".into(),
            detail: "also corrupt".into(),
        });

        let err = fatal_if_all_failed(&stage).unwrap_err();
        match err {
            SlideforgeError::AllInputsFailed {
                stage,
                total,
                first_error,
            } => {
                assert_eq!(stage, "enhance");
                assert_eq!(total, 2);
                assert!(first_error.contains("corrupt"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn partial_failure_is_not_fatal() {
        let mut stage = StageResult::new(Stage::MergeSlides);
        stage.record_success("a.pdf".into());
        stage.record_failure(FileError::RenderFailed {
            path: "b.pdf".into(),
            detail: "bad".into(),
        });
        assert!(fatal_if_all_failed(&stage).is_ok());
    }
}
