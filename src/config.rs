//! Job configuration types.
//!
//! One run is described by a single [`JobRequest`], built via its
//! [`JobRequestBuilder`] and immutable thereafter. Keeping every knob in one
//! struct keeps runs independently testable and re-entrant: there is no
//! process-wide mutable state, and two orchestrators with different requests
//! can run in the same process without interfering.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! documented defaults for the rest.

use crate::error::SlideforgeError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// The operation a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Enhance each input PDF independently (optionally combining outputs).
    Enhance,
    /// Composite every page of every input onto A4 sheets.
    MergeSlides,
    /// Stamp a running page number onto a single PDF.
    AddPageNumbers,
    /// Pack images into a PDF, one full page per image.
    ImagesToPdf,
    /// Enhance → MergeSlides → AddPageNumbers in sequence.
    Full,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Enhance => "enhance",
            Operation::MergeSlides => "merge-slides",
            Operation::AddPageNumbers => "add-page-numbers",
            Operation::ImagesToPdf => "images-to-pdf",
            Operation::Full => "full",
        };
        f.write_str(name)
    }
}

/// Where the running page number is stamped.
///
/// The five non-[`None`](NumberPosition::None) values are the recognised
/// anchors. [`None`](NumberPosition::None) means "no numbering" and is only
/// valid for operations where numbering is optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NumberPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
    /// Skip numbering entirely.
    None,
}

impl NumberPosition {
    /// True for the five placement anchors, false for `None`.
    pub fn is_anchor(&self) -> bool {
        !matches!(self, NumberPosition::None)
    }
}

impl FromStr for NumberPosition {
    type Err = SlideforgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "top-left" | "top left" => Ok(NumberPosition::TopLeft),
            "top-right" | "top right" => Ok(NumberPosition::TopRight),
            "bottom-left" | "bottom left" => Ok(NumberPosition::BottomLeft),
            "bottom-right" | "bottom right" => Ok(NumberPosition::BottomRight),
            "center" | "centre" => Ok(NumberPosition::Center),
            "none" => Ok(NumberPosition::None),
            other => Err(SlideforgeError::InvalidPosition {
                input: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for NumberPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NumberPosition::TopLeft => "top-left",
            NumberPosition::TopRight => "top-right",
            NumberPosition::BottomLeft => "bottom-left",
            NumberPosition::BottomRight => "bottom-right",
            NumberPosition::Center => "center",
            NumberPosition::None => "none",
        };
        f.write_str(name)
    }
}

/// Immutable description of one run.
///
/// Built via [`JobRequest::builder()`].
///
/// # Example
/// ```rust
/// use slideforge::{JobRequest, Operation, NumberPosition};
///
/// let request = JobRequest::builder(Operation::Full, "slides/", "out/")
///     .base_name("lecture")
///     .position(NumberPosition::BottomRight)
///     .start_page(1)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct JobRequest {
    /// Which operation to run.
    pub operation: Operation,

    /// Input file or directory.
    pub input_path: PathBuf,

    /// Directory receiving all outputs. Created if missing.
    pub output_dir: PathBuf,

    /// Base name (no extension) for derived output files. Default: "output".
    pub base_name: String,

    /// Page-number anchor. Default: bottom-right.
    pub position: NumberPosition,

    /// First printed page number (≥ 1). Default: 1.
    ///
    /// Values above 1 support numbering continuation across previously-split
    /// documents; the printed number still increases by exactly 1 per page.
    pub start_page: u32,

    /// Enhance-only mode: also append all enhanced documents into one
    /// combined PDF, in input order. Default: false.
    pub combine: bool,

    /// Rasterisation DPI for Enhance / MergeSlides / ImagesToPdf.
    /// Range: 72–400. Default: 300 (print quality).
    pub dpi: u32,

    /// Cap on the longest rendered edge in pixels. Default: 4000.
    ///
    /// A safety cap independent of DPI: a 300-DPI render of an oversized
    /// page could exhaust memory, so either dimension is capped and the
    /// other scales proportionally.
    pub max_rendered_pixels: u32,

    /// Slides stacked per A4 sheet in MergeSlides. Default: 3.
    pub slides_per_page: u32,

    /// Contrast boost applied during enhancement, in percent. Default: 50.0.
    pub contrast: f32,

    /// Unsharp-mask blur sigma. Default: 1.5.
    pub sharpen_sigma: f32,

    /// Unsharp-mask threshold. Default: 2.
    pub sharpen_threshold: i32,

    /// Files enhanced concurrently. Default: 4.
    ///
    /// Enhancement is CPU-bound and per-file independent, so files may be
    /// processed in parallel; results are re-ordered afterwards so the
    /// aggregation is order-independent.
    pub concurrency: usize,

    /// Progress event sink. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for JobRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobRequest")
            .field("operation", &self.operation)
            .field("input_path", &self.input_path)
            .field("output_dir", &self.output_dir)
            .field("base_name", &self.base_name)
            .field("position", &self.position)
            .field("start_page", &self.start_page)
            .field("combine", &self.combine)
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("slides_per_page", &self.slides_per_page)
            .field("concurrency", &self.concurrency)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn JobProgressCallback>"),
            )
            .finish()
    }
}

impl JobRequest {
    /// Create a builder for the given operation and paths.
    pub fn builder(
        operation: Operation,
        input_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> JobRequestBuilder {
        JobRequestBuilder {
            request: JobRequest {
                operation,
                input_path: input_path.into(),
                output_dir: output_dir.into(),
                base_name: "output".to_string(),
                position: NumberPosition::default(),
                start_page: 1,
                combine: false,
                dpi: 300,
                max_rendered_pixels: 4000,
                slides_per_page: 3,
                contrast: 50.0,
                sharpen_sigma: 1.5,
                sharpen_threshold: 2,
                concurrency: 4,
                progress_callback: None,
            },
        }
    }
}

/// Builder for [`JobRequest`].
#[derive(Debug)]
pub struct JobRequestBuilder {
    request: JobRequest,
}

impl JobRequestBuilder {
    pub fn base_name(mut self, name: impl Into<String>) -> Self {
        self.request.base_name = name.into();
        self
    }

    pub fn position(mut self, position: NumberPosition) -> Self {
        self.request.position = position;
        self
    }

    pub fn start_page(mut self, page: u32) -> Self {
        self.request.start_page = page;
        self
    }

    pub fn combine(mut self, v: bool) -> Self {
        self.request.combine = v;
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.request.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.request.max_rendered_pixels = px.max(100);
        self
    }

    pub fn slides_per_page(mut self, n: u32) -> Self {
        self.request.slides_per_page = n.clamp(1, 8);
        self
    }

    pub fn contrast(mut self, percent: f32) -> Self {
        self.request.contrast = percent.clamp(0.0, 200.0);
        self
    }

    pub fn sharpen(mut self, sigma: f32, threshold: i32) -> Self {
        self.request.sharpen_sigma = sigma.max(0.1);
        self.request.sharpen_threshold = threshold.max(0);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.request.concurrency = n.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.request.progress_callback = Some(cb);
        self
    }

    /// Build the request, validating constraints.
    pub fn build(self) -> Result<JobRequest, SlideforgeError> {
        let r = &self.request;
        if r.start_page < 1 {
            return Err(SlideforgeError::InvalidConfig(format!(
                "start page must be ≥ 1, got {}",
                r.start_page
            )));
        }
        if r.base_name.trim().is_empty() {
            return Err(SlideforgeError::InvalidConfig(
                "base name must not be empty".into(),
            ));
        }
        if r.operation == Operation::AddPageNumbers && !r.position.is_anchor() {
            return Err(SlideforgeError::InvalidPosition {
                input: r.position.to_string(),
            });
        }
        Ok(self.request)
    }
}
