//! MergeSlides stage: treat each page of every input as one slide and
//! composite slides onto A4 sheets, a fixed number per sheet.
//!
//! The layout policy is purely positional: slides are stacked
//! top-to-bottom, each scaled to the slot height (clamped to the sheet
//! width, preserving aspect ratio) and centred horizontally. No
//! content-aware reflow.

use crate::collect::FileSet;
use crate::config::JobRequest;
use crate::error::SlideforgeError;
use crate::ops::raster;
use crate::report::{Stage, StageResult};
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A4 physical size in points.
pub(crate) const A4_WIDTH_PT: f32 = 595.275;
pub(crate) const A4_HEIGHT_PT: f32 = 841.89;

/// Merge every page of every input into one A4-sheet PDF at `output_path`.
///
/// Per-file rasterisation failures are recorded and excluded; the merge
/// proceeds with the remaining slides. Zero slides from otherwise-readable
/// inputs is [`SlideforgeError::NoSlidesFound`].
pub async fn merge_to_a4(
    files: &FileSet,
    output_path: &Path,
    request: &JobRequest,
) -> Result<StageResult, SlideforgeError> {
    let inputs: Vec<PathBuf> = files.iter().cloned().collect();
    let output = output_path.to_path_buf();
    let request = request.clone();

    tokio::task::spawn_blocking(move || merge_blocking(&inputs, &output, &request))
        .await
        .map_err(|e| SlideforgeError::Internal(format!("merge task panicked: {e}")))?
}

fn merge_blocking(
    inputs: &[PathBuf],
    output: &Path,
    request: &JobRequest,
) -> Result<StageResult, SlideforgeError> {
    let pdfium = raster::bind_pdfium()?;
    let mut stage = StageResult::new(Stage::MergeSlides);
    let mut slides: Vec<DynamicImage> = Vec::new();

    // FileSet order, then page order within each file.
    for input in inputs {
        match raster::render_all_pages(&pdfium, input, request.dpi, request.max_rendered_pixels) {
            Ok(pages) => {
                debug!("{}: {} slide(s)", input.display(), pages.len());
                slides.extend(pages);
                stage.record_success(input.clone());
                if let Some(ref cb) = request.progress_callback {
                    cb.on_file_complete(Stage::MergeSlides, &name_of(input));
                }
            }
            Err(e) => {
                if let Some(ref cb) = request.progress_callback {
                    cb.on_file_error(Stage::MergeSlides, &name_of(input), &e.to_string());
                }
                stage.record_failure(e);
            }
        }
    }

    if stage.all_failed() {
        // The caller raises AllInputsFailed; no output is written.
        return Ok(stage);
    }
    if slides.is_empty() {
        return Err(SlideforgeError::NoSlidesFound);
    }

    let (sheet_w, sheet_h) = a4_sheet_pixels(request.dpi);
    let sheets = compose_sheets(&slides, request.slides_per_page, sheet_w, sheet_h);
    info!(
        "Composed {} slide(s) onto {} A4 sheet(s) ({} per sheet)",
        slides.len(),
        sheets.len(),
        request.slides_per_page
    );

    let mut document = pdfium
        .create_new_pdf()
        .map_err(|e| SlideforgeError::Internal(format!("{e:?}")))?;
    for sheet in &sheets {
        let image = DynamicImage::ImageRgb8(sheet.clone());
        raster::append_image_page(&mut document, &image, A4_WIDTH_PT, A4_HEIGHT_PT).map_err(
            |e| SlideforgeError::WriteError {
                path: output.to_path_buf(),
                detail: format!("{e:?}"),
            },
        )?;
    }

    raster::save_document(&document, output)?;
    Ok(stage)
}

/// A4 sheet size in pixels at the given DPI (210 × 297 mm).
pub(crate) fn a4_sheet_pixels(dpi: u32) -> (u32, u32) {
    (
        (210.0 / 25.4 * dpi as f64).round() as u32,
        (297.0 / 25.4 * dpi as f64).round() as u32,
    )
}

/// Scale a slide to fit a slot of `slot_h` pixels: scale to the slot
/// height, then clamp to the sheet width preserving aspect ratio.
pub(crate) fn fit_slide(slide_w: u32, slide_h: u32, sheet_w: u32, slot_h: u32) -> (u32, u32) {
    if slide_w == 0 || slide_h == 0 {
        return (1, 1);
    }
    let scale = slot_h as f64 / slide_h as f64;
    let scaled_w = (slide_w as f64 * scale).round() as u32;
    if scaled_w <= sheet_w {
        (scaled_w.max(1), slot_h.max(1))
    } else {
        let scale = sheet_w as f64 / slide_w as f64;
        let scaled_h = (slide_h as f64 * scale).round() as u32;
        (sheet_w, scaled_h.max(1))
    }
}

/// Composite `slides` onto white A4 sheets, `slides_per_page` per sheet,
/// stacked top-to-bottom and centred horizontally.
pub(crate) fn compose_sheets(
    slides: &[DynamicImage],
    slides_per_page: u32,
    sheet_w: u32,
    sheet_h: u32,
) -> Vec<RgbImage> {
    let per_page = slides_per_page.max(1);
    let slot_h = sheet_h / per_page;

    slides
        .chunks(per_page as usize)
        .map(|chunk| {
            let mut sheet = RgbImage::from_pixel(sheet_w, sheet_h, Rgb([255, 255, 255]));
            let mut y_cursor: u32 = 0;
            for slide in chunk {
                let (w, h) = fit_slide(slide.width(), slide.height(), sheet_w, slot_h);
                let resized = image::imageops::resize(&slide.to_rgb8(), w, h, FilterType::Lanczos3);
                let x = (sheet_w.saturating_sub(w)) / 2;
                image::imageops::overlay(&mut sheet, &resized, x as i64, y_cursor as i64);
                y_cursor += h;
            }
            sheet
        })
        .collect()
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
