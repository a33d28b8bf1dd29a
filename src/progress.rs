//! Progress-callback trait for per-file workflow events.
//!
//! Inject an [`Arc<dyn JobProgressCallback>`] via
//! [`crate::config::JobRequestBuilder::progress_callback`] to receive
//! events as each stage processes its files.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a terminal progress bar, a log file, or a GUI without
//! the library knowing anything about how the host application communicates.
//! The trait is `Send + Sync` because the enhance stage may process files
//! concurrently.

use crate::report::Stage;
use std::sync::Arc;

/// Called by the orchestrator as each stage processes its files.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. When enhancement runs concurrently,
/// `on_file_complete` and `on_file_error` may be called from different
/// threads; implementations must protect shared mutable state.
pub trait JobProgressCallback: Send + Sync {
    /// Called once after input collection, before the first stage.
    fn on_run_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called when a stage begins, with the number of files it will process.
    fn on_stage_start(&self, stage: Stage, total_files: usize) {
        let _ = (stage, total_files);
    }

    /// Called when one input file has been processed successfully.
    fn on_file_complete(&self, stage: Stage, file_name: &str) {
        let _ = (stage, file_name);
    }

    /// Called when one input file failed; the stage continues.
    fn on_file_error(&self, stage: Stage, file_name: &str, error: &str) {
        let _ = (stage, file_name, error);
    }

    /// Called once after the last stage, with success/failure counts.
    fn on_run_complete(&self, succeeded: usize, failed: usize) {
        let _ = (succeeded, failed);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl JobProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::JobRequest`].
pub type ProgressCallback = Arc<dyn JobProgressCallback>;
