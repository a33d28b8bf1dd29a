//! # slideforge
//!
//! Turn lecture-slide PDFs and scanned images into print-ready documents:
//! enhance dark slides for printing, stack several slides per A4 sheet,
//! stamp running page numbers, and pack image sets into PDFs.
//!
//! ## Pipeline
//!
//! ```text
//!  input path ──collect──> FileSet ──stage(s)──> output PDFs + RunSummary
//!
//!  full workflow:
//!  PDFs ──enhance──> enhanced copies ──merge──> A4 sheets ──number──> final PDF
//! ```
//!
//! Every run is described by one [`JobRequest`] and driven by
//! [`workflow::run`]. Failures split two ways: fatal [`SlideforgeError`]s
//! abort the run, per-file [`FileError`]s are recorded in the
//! [`RunSummary`] and the remaining files continue.
//!
//! ## Example
//!
//! ```rust,no_run
//! use slideforge::{JobRequest, Operation, NumberPosition};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), slideforge::SlideforgeError> {
//! let request = JobRequest::builder(Operation::Full, "slides/", "out/")
//!     .base_name("lecture")
//!     .position(NumberPosition::BottomRight)
//!     .build()?;
//!
//! let summary = slideforge::run(request).await?;
//! println!("wrote {:?} with {} failures", summary.outputs, summary.failed_count());
//! # Ok(())
//! # }
//! ```
//!
//! PDF rasterisation and writing use the `pdfium-render` crate; the pdfium
//! shared library is located via `PDFIUM_LIB_PATH`, the working directory,
//! or the system library path.

pub mod collect;
pub mod config;
pub mod error;
pub mod ops;
pub mod progress;
pub mod report;
pub mod workflow;

pub use collect::{collect, FileKind, FileSet};
pub use config::{JobRequest, JobRequestBuilder, NumberPosition, Operation};
pub use error::{FileError, SlideforgeError};
pub use progress::{JobProgressCallback, NoopProgressCallback, ProgressCallback};
pub use report::{FileFailure, RunSummary, Stage, StageResult, WorkflowState};
pub use workflow::{run, run_sync};
