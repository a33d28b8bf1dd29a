//! Processing stages.
//!
//! Each stage is an async entry point that moves the heavy pdfium and
//! image work onto the blocking pool:
//!
//! ```text
//! enhance:  PDF  --render--> pages --invert/contrast/sharpen--> new PDF
//! merge:    PDFs --render--> slides --stack onto A4 sheets--> one PDF
//! number:   PDF  --watermark overlay--> numbered PDF
//! images:   PNG/JPEG --decode--> one full page each --> one PDF
//! ```
//!
//! [`raster`] holds the pdfium plumbing shared by the stages.

pub mod enhance;
pub mod images;
pub mod merge;
pub mod number;
pub mod raster;
