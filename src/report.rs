//! Run reporting: per-stage results and the final run summary.
//!
//! Every stage produces a [`StageResult`] recording which input files
//! succeeded and which failed, with the failure reason. The orchestrator
//! aggregates them into a [`RunSummary`] so the caller always sees which
//! files succeeded even when some failed — partial failure is an explicit,
//! inspectable contract, not a swallowed exception.
//!
//! All types serialise with serde for the CLI's `--json` output.

use crate::config::Operation;
use crate::error::FileError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One processing stage within a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Enhance,
    MergeSlides,
    AddPageNumbers,
    ImagesToPdf,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Enhance => "enhance",
            Stage::MergeSlides => "merge-slides",
            Stage::AddPageNumbers => "add-page-numbers",
            Stage::ImagesToPdf => "images-to-pdf",
        };
        f.write_str(name)
    }
}

/// A recorded per-file failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFailure {
    /// The input file that failed.
    pub path: PathBuf,
    /// Human-readable failure reason.
    pub reason: String,
}

impl From<FileError> for FileFailure {
    fn from(e: FileError) -> Self {
        FileFailure {
            path: e.path().clone(),
            reason: e.to_string(),
        }
    }
}

/// The outcome of one stage: outputs produced plus recorded failures.
///
/// In the full workflow, only `succeeded` paths propagate to the next
/// stage — a file that failed earlier is excluded, never retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: Stage,
    /// Output files produced (or, for single-output stages, the inputs
    /// that contributed successfully).
    pub succeeded: Vec<PathBuf>,
    /// Inputs that failed, with reasons. Never aborts the stage on its own.
    pub failed: Vec<FileFailure>,
}

impl StageResult {
    pub fn new(stage: Stage) -> Self {
        StageResult {
            stage,
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn record_success(&mut self, path: PathBuf) {
        self.succeeded.push(path);
    }

    pub fn record_failure(&mut self, error: FileError) {
        self.failed.push(error.into());
    }

    /// True when the stage processed at least one input and lost all of them.
    pub fn all_failed(&self) -> bool {
        self.succeeded.is_empty() && !self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Orchestrator state, advanced monotonically through a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowState {
    Idle,
    CollectingInput,
    Processing(Stage),
    Reporting,
    Done,
    Failed,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowState::Idle => f.write_str("idle"),
            WorkflowState::CollectingInput => f.write_str("collecting-input"),
            WorkflowState::Processing(stage) => write!(f, "processing({stage})"),
            WorkflowState::Reporting => f.write_str("reporting"),
            WorkflowState::Done => f.write_str("done"),
            WorkflowState::Failed => f.write_str("failed"),
        }
    }
}

/// The final report for one run.
///
/// Returned by [`crate::workflow::run`] on any run that reached Reporting;
/// a fatal error returns `Err(SlideforgeError)` instead and no summary is
/// produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// The operation that was requested.
    pub operation: Operation,
    /// Terminal state — always [`WorkflowState::Done`] in an `Ok` summary.
    pub state: WorkflowState,
    /// Per-stage results in execution order.
    pub stages: Vec<StageResult>,
    /// Final output files, in the order they were produced.
    pub outputs: Vec<PathBuf>,
    /// Wall-clock duration of the whole run.
    pub duration_ms: u64,
}

impl RunSummary {
    /// Total per-file failures recorded across all stages.
    pub fn failed_count(&self) -> usize {
        self.stages.iter().map(|s| s.failed.len()).sum()
    }

    /// True when every stage completed without a single per-file failure.
    pub fn is_clean(&self) -> bool {
        self.failed_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FileError;

    #[test]
    fn stage_result_counts() {
        let mut r = StageResult::new(Stage::Enhance);
        r.record_success(PathBuf::from("a_enhanced.pdf"));
        r.record_failure(FileError::RenderFailed {
            path: PathBuf::from("b.pdf"),
            detail: "corrupt xref".into(),
        });
        assert_eq!(r.total(), 2);
        assert!(!r.all_failed());
        assert_eq!(r.failed[0].path, PathBuf::from("b.pdf"));
        assert!(r.failed[0].reason.contains("corrupt xref"));
    }

    #[test]
    fn all_failed_requires_failures() {
        let r = StageResult::new(Stage::MergeSlides);
        assert!(!r.all_failed(), "an untouched stage has not failed");

        let mut r = StageResult::new(Stage::MergeSlides);
        r.record_failure(FileError::RenderFailed {
            path: PathBuf::from("x.pdf"),
            detail: "bad".into(),
        });
        assert!(r.all_failed());
    }

    #[test]
    fn summary_aggregates_failures() {
        let mut enhance = StageResult::new(Stage::Enhance);
        enhance.record_success(PathBuf::from("a.pdf"));
        enhance.record_failure(FileError::RenderFailed {
            path: PathBuf::from("b.pdf"),
            detail: "bad".into(),
        });
        let merge = StageResult::new(Stage::MergeSlides);

        let summary = RunSummary {
            operation: Operation::Full,
            state: WorkflowState::Done,
            stages: vec![enhance, merge],
            outputs: vec![PathBuf::from("out/lecture.pdf")],
            duration_ms: 1234,
        };
        assert_eq!(summary.failed_count(), 1);
        assert!(!summary.is_clean());
    }

    #[test]
    fn summary_serialises_to_json() {
        let summary = RunSummary {
            operation: Operation::Enhance,
            state: WorkflowState::Done,
            stages: vec![StageResult::new(Stage::Enhance)],
            outputs: vec![],
            duration_ms: 7,
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"Enhance\""));
        assert!(json.contains("\"Done\""));
    }

    #[test]
    fn workflow_state_display() {
        assert_eq!(
            WorkflowState::Processing(Stage::AddPageNumbers).to_string(),
            "processing(add-page-numbers)"
        );
        assert_eq!(WorkflowState::Failed.to_string(), "failed");
    }
}
