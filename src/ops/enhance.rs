//! Enhance stage: rasterise each PDF page, run the filter pipeline
//! (invert → contrast boost → unsharp mask), and rebuild a PDF with one
//! full-page image per page.
//!
//! Files are independent, so they may be processed concurrently
//! (`buffer_unordered`); results are re-ordered by input index afterwards
//! so aggregation is order-independent. A corrupt source is recorded as a
//! per-file failure and never aborts the remaining files.

use crate::collect::FileSet;
use crate::config::JobRequest;
use crate::error::{FileError, SlideforgeError};
use crate::ops::raster;
use crate::report::{Stage, StageResult};
use futures::stream::{self, StreamExt};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Enhance every file in `files`, writing `<stem>_enhanced.pdf` into
/// `out_dir` for each.
///
/// Returns a [`StageResult`] whose `succeeded` entries are the output
/// paths, in input order. Inputs are never mutated or deleted.
pub async fn enhance_set(
    files: &FileSet,
    out_dir: &Path,
    request: &JobRequest,
) -> Result<StageResult, SlideforgeError> {
    let total = files.len();
    info!("Enhancing {} PDF file(s) into {}", total, out_dir.display());

    let mut outcomes: Vec<(usize, PathBuf, Result<(), FileError>)> =
        stream::iter(files.iter().cloned().enumerate().map(|(idx, input)| {
            let request = request.clone();
            let output = enhanced_output_name(out_dir, &input);
            async move {
                let result = {
                    let task_input = input.clone();
                    let task_output = output.clone();
                    let task_request = request.clone();
                    tokio::task::spawn_blocking(move || {
                        enhance_file_blocking(&task_input, &task_output, &task_request)
                    })
                    .await
                    .unwrap_or_else(|e| {
                        Err(FileError::RenderFailed {
                            path: input.clone(),
                            detail: format!("enhance task panicked: {e}"),
                        })
                    })
                };

                if let Some(ref cb) = request.progress_callback {
                    let name = file_name(&input);
                    match &result {
                        Ok(()) => cb.on_file_complete(Stage::Enhance, &name),
                        Err(e) => cb.on_file_error(Stage::Enhance, &name, &e.to_string()),
                    }
                }

                (idx, output, result)
            }
        }))
        .buffer_unordered(request.concurrency)
        .collect()
        .await;

    // Restore input order — aggregation must not depend on completion order.
    outcomes.sort_by_key(|(idx, _, _)| *idx);

    let mut stage = StageResult::new(Stage::Enhance);
    for (_, output, result) in outcomes {
        match result {
            Ok(()) => stage.record_success(output),
            Err(e) => stage.record_failure(e),
        }
    }

    info!(
        "Enhance complete: {}/{} file(s) succeeded",
        stage.succeeded.len(),
        total
    );
    Ok(stage)
}

/// Append all documents in `sources`, in order, into a single PDF at `dest`.
///
/// Used by Enhance-only mode when `combine` is requested.
pub async fn combine_outputs(
    sources: &[PathBuf],
    dest: &Path,
) -> Result<(), SlideforgeError> {
    let sources = sources.to_vec();
    let dest = dest.to_path_buf();

    tokio::task::spawn_blocking(move || combine_blocking(&sources, &dest))
        .await
        .map_err(|e| SlideforgeError::Internal(format!("combine task panicked: {e}")))?
}

fn combine_blocking(sources: &[PathBuf], dest: &Path) -> Result<(), SlideforgeError> {
    let pdfium = raster::bind_pdfium()?;
    let mut combined = pdfium
        .create_new_pdf()
        .map_err(|e| SlideforgeError::Internal(format!("{e:?}")))?;

    for source in sources {
        let document = raster::load_document(&pdfium, source)?;
        combined
            .pages_mut()
            .append(&document)
            .map_err(|e| SlideforgeError::WriteError {
                path: dest.to_path_buf(),
                detail: format!("appending {}: {e:?}", source.display()),
            })?;
    }

    raster::save_document(&combined, dest)?;
    debug!("Combined {} document(s) into {}", sources.len(), dest.display());
    Ok(())
}

fn enhance_file_blocking(
    input: &Path,
    output: &Path,
    request: &JobRequest,
) -> Result<(), FileError> {
    let pdfium = raster::bind_pdfium().map_err(|e| FileError::RenderFailed {
        path: input.to_path_buf(),
        detail: e.to_string(),
    })?;

    let pages = raster::render_all_pages(&pdfium, input, request.dpi, request.max_rendered_pixels)?;
    if pages.is_empty() {
        return Err(FileError::RenderFailed {
            path: input.to_path_buf(),
            detail: "document has no pages".into(),
        });
    }

    let mut document = pdfium.create_new_pdf().map_err(|e| FileError::SaveFailed {
        path: input.to_path_buf(),
        detail: format!("{e:?}"),
    })?;

    for page_image in &pages {
        let enhanced = enhance_page(
            page_image,
            request.contrast,
            request.sharpen_sigma,
            request.sharpen_threshold,
        );
        let (w_pt, h_pt) =
            raster::page_size_for_image(enhanced.width(), enhanced.height(), request.dpi);
        raster::append_image_page(&mut document, &enhanced, w_pt, h_pt).map_err(|e| {
            FileError::SaveFailed {
                path: input.to_path_buf(),
                detail: format!("{e:?}"),
            }
        })?;
    }

    document
        .save_to_file(output)
        .map_err(|e| FileError::SaveFailed {
            path: input.to_path_buf(),
            detail: format!("{e:?}"),
        })?;

    debug!(
        "Enhanced {} ({} pages) → {}",
        input.display(),
        pages.len(),
        output.display()
    );
    Ok(())
}

/// The filter pipeline applied to one rasterised page: invert colours,
/// boost contrast, sharpen with an unsharp mask.
pub(crate) fn enhance_page(
    image: &DynamicImage,
    contrast: f32,
    sharpen_sigma: f32,
    sharpen_threshold: i32,
) -> DynamicImage {
    let mut inverted = image.clone();
    inverted.invert();
    inverted
        .adjust_contrast(contrast)
        .unsharpen(sharpen_sigma, sharpen_threshold)
}

/// Output path for one enhanced input: `<out_dir>/<stem>_enhanced.pdf`.
pub(crate) fn enhanced_output_name(out_dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    out_dir.join(format!("{stem}_enhanced.pdf"))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::{collect, FileKind};
    use crate::config::Operation;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    #[test]
    fn enhance_page_preserves_dimensions() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 30, Rgb([10, 10, 10])));
        let out = enhance_page(&img, 50.0, 1.5, 2);
        assert_eq!(out.width(), 40);
        assert_eq!(out.height(), 30);
    }

    #[test]
    fn enhance_page_inverts_dark_to_light() {
        // A near-black page becomes near-white after inversion, and the
        // contrast/sharpen passes must not flip it back.
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([5, 5, 5])));
        let out = enhance_page(&img, 50.0, 1.5, 2).to_rgb8();
        let px = out.get_pixel(4, 4);
        assert!(px[0] > 200, "expected light pixel, got {:?}", px);
    }

    #[test]
    fn output_name_appends_suffix() {
        let out = enhanced_output_name(Path::new("/out"), Path::new("/in/deck 01.pdf"));
        assert_eq!(out, PathBuf::from("/out/deck 01_enhanced.pdf"));
    }

    #[tokio::test]
    async fn enhance_set_records_failures_in_input_order() {
        // Unprocessable inputs exercise the concurrent fan-out without a
        // usable PDF: every file must come back as a recorded failure, in
        // input order, with no panic and no abort.
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"%PDF-1.4 junk").unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"%PDF-1.4 junk").unwrap();
        let files = collect(dir.path(), FileKind::Pdf).unwrap();

        let request = JobRequest::builder(Operation::Enhance, dir.path(), dir.path())
            .concurrency(2)
            .build()
            .unwrap();

        let stage = enhance_set(&files, dir.path(), &request).await.unwrap();
        assert!(stage.succeeded.is_empty());
        assert_eq!(stage.failed.len(), 2);
        assert!(stage.failed[0].path.ends_with("a.pdf"));
        assert!(stage.failed[1].path.ends_with("b.pdf"));
    }
}
