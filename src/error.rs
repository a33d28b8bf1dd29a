//! Error types for the slideforge library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SlideforgeError`] — **Fatal**: the run cannot proceed at all (missing
//!   input path, invalid numbering position, every file in a stage failed).
//!   Returned as `Err(SlideforgeError)` from [`crate::workflow::run`].
//!
//! * [`FileError`] — **Non-fatal**: a single input file failed (corrupt PDF,
//!   undecodable image) but the other files are fine. Recorded in
//!   [`crate::report::StageResult`] so callers can inspect partial
//!   success rather than losing the whole batch to one bad file.
//!
//! The split mirrors the propagation policy: path-resolution and job
//! configuration errors indicate a mis-specified job and stop the run
//! immediately; per-file decode/processing errors are isolated and the
//! stage continues.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the slideforge library.
///
/// Per-file failures use [`FileError`] and are stored in
/// [`crate::report::StageResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum SlideforgeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The input path does not exist.
    #[error("Input path not found: '{path}'\nCheck the path exists and is readable.")]
    PathNotFound { path: PathBuf },

    /// A single-file input has the wrong extension for the operation.
    #[error("Unsupported file type: '{path}' (expected {expected})")]
    UnsupportedFileType { path: PathBuf, expected: String },

    /// A directory input matched zero files of the required kind.
    #[error("No {expected} files found in '{path}'")]
    EmptyInputSet { path: PathBuf, expected: String },

    /// The source PDF cannot be parsed.
    #[error("Cannot read PDF '{path}': {detail}")]
    UnreadablePdf { path: PathBuf, detail: String },

    // ── Job configuration errors ──────────────────────────────────────────
    /// The numbering position is not one of the five recognised anchors.
    #[error(
        "Invalid page-number position '{input}'\n\
         Expected one of: top-left, top-right, bottom-left, bottom-right, center."
    )]
    InvalidPosition { input: String },

    /// Builder validation failed.
    #[error("Invalid job: {0}")]
    InvalidConfig(String),

    // ── Stage errors ──────────────────────────────────────────────────────
    /// The resolved inputs yielded zero slides to merge.
    #[error("No slides found: the selected PDFs produced zero pages")]
    NoSlidesFound,

    /// Could not create or write an output file.
    #[error("Failed to write '{path}': {detail}")]
    WriteError { path: PathBuf, detail: String },

    /// Every input to a stage failed; the stage would produce nothing.
    #[error("All {total} inputs failed during {stage}.\nFirst error: {first_error}")]
    AllInputsFailed {
        stage: String,
        total: usize,
        first_error: String,
    },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy, or place\n\
the pdfium shared library in the working directory or system library path.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single input file.
///
/// Stored in [`crate::report::StageResult`] when a file fails.
/// The stage continues unless ALL of its inputs fail.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    /// The PDF could not be opened or a page could not be rasterised.
    #[error("'{path}': rasterisation failed: {detail}")]
    RenderFailed { path: PathBuf, detail: String },

    /// The file's content could not be decoded as an image.
    #[error("'{path}': unsupported image format: {detail}")]
    DecodeFailed { path: PathBuf, detail: String },

    /// The per-file output document could not be written.
    #[error("'{path}': failed to save output: {detail}")]
    SaveFailed { path: PathBuf, detail: String },
}

impl FileError {
    /// The input file this error refers to.
    pub fn path(&self) -> &PathBuf {
        match self {
            FileError::RenderFailed { path, .. }
            | FileError::DecodeFailed { path, .. }
            | FileError::SaveFailed { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_inputs_failed_display() {
        let e = SlideforgeError::AllInputsFailed {
            stage: "enhance".into(),
            total: 3,
            first_error: "corrupt header".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("All 3 inputs"), "got: {msg}");
        assert!(msg.contains("corrupt header"));
    }

    #[test]
    fn invalid_position_lists_anchors() {
        let e = SlideforgeError::InvalidPosition {
            input: "middle".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("'middle'"));
        assert!(msg.contains("bottom-right"));
    }

    #[test]
    fn empty_input_set_display() {
        let e = SlideforgeError::EmptyInputSet {
            path: PathBuf::from("/tmp/decks"),
            expected: "PDF".into(),
        };
        assert!(e.to_string().contains("/tmp/decks"));
    }

    #[test]
    fn file_error_path_accessor() {
        let e = FileError::DecodeFailed {
            path: PathBuf::from("scan.jpg"),
            detail: "truncated".into(),
        };
        assert_eq!(e.path(), &PathBuf::from("scan.jpg"));
        assert!(e.to_string().contains("truncated"));
    }
}
