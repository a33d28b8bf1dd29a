//! ImagesToPdf stage: pack a set of images into a single PDF, one full
//! page per image.
//!
//! Each page takes the physical size implied by the image's pixel
//! dimensions at the request DPI, so a 2480x3508 scan at 300 DPI becomes
//! an A4 page. Undecodable images are recorded per file and skipped.

use crate::collect::FileSet;
use crate::config::JobRequest;
use crate::error::{FileError, SlideforgeError};
use crate::ops::raster;
use crate::report::{Stage, StageResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Build one PDF at `output_path` from every image in `files`, in order.
///
/// Per-file decode failures are recorded and excluded; the PDF is built
/// from the rest. When every input fails to decode the caller raises
/// [`SlideforgeError::AllInputsFailed`] from the returned stage and no
/// output is written.
pub async fn images_to_pdf(
    files: &FileSet,
    output_path: &Path,
    request: &JobRequest,
) -> Result<StageResult, SlideforgeError> {
    let inputs: Vec<PathBuf> = files.iter().cloned().collect();
    let output = output_path.to_path_buf();
    let request = request.clone();

    tokio::task::spawn_blocking(move || pack_blocking(&inputs, &output, &request))
        .await
        .map_err(|e| SlideforgeError::Internal(format!("image packing task panicked: {e}")))?
}

fn pack_blocking(
    inputs: &[PathBuf],
    output: &Path,
    request: &JobRequest,
) -> Result<StageResult, SlideforgeError> {
    let pdfium = raster::bind_pdfium()?;
    let mut stage = StageResult::new(Stage::ImagesToPdf);

    let mut document = pdfium
        .create_new_pdf()
        .map_err(|e| SlideforgeError::Internal(format!("{e:?}")))?;

    for input in inputs {
        match image::open(input) {
            Ok(decoded) => {
                let (w_pt, h_pt) =
                    raster::page_size_for_image(decoded.width(), decoded.height(), request.dpi);
                raster::append_image_page(&mut document, &decoded, w_pt, h_pt).map_err(|e| {
                    SlideforgeError::WriteError {
                        path: output.to_path_buf(),
                        detail: format!("{e:?}"),
                    }
                })?;
                debug!(
                    "Added {} as a {:.0}x{:.0} pt page",
                    input.display(),
                    w_pt,
                    h_pt
                );
                stage.record_success(input.clone());
                if let Some(ref cb) = request.progress_callback {
                    cb.on_file_complete(Stage::ImagesToPdf, &name_of(input));
                }
            }
            Err(e) => {
                let error = FileError::DecodeFailed {
                    path: input.clone(),
                    detail: e.to_string(),
                };
                if let Some(ref cb) = request.progress_callback {
                    cb.on_file_error(Stage::ImagesToPdf, &name_of(input), &error.to_string());
                }
                stage.record_failure(error);
            }
        }
    }

    if stage.all_failed() {
        // The caller raises AllInputsFailed; no output is written.
        return Ok(stage);
    }

    raster::save_document(&document, output)?;
    info!(
        "Packed {}/{} image(s) into {}",
        stage.succeeded.len(),
        inputs.len(),
        output.display()
    );
    Ok(stage)
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use crate::ops::raster::page_size_for_image;

    #[test]
    fn a4_scan_maps_back_to_a4_points() {
        let (w, h) = page_size_for_image(2480, 3508, 300);
        assert!((w - 595.2).abs() < 1.0, "got {w}");
        assert!((h - 841.9).abs() < 1.0, "got {h}");
    }

    #[test]
    fn square_image_gives_square_page() {
        let (w, h) = page_size_for_image(1500, 1500, 150);
        assert_eq!(w, h);
        assert!((w - 720.0).abs() < 0.01);
    }
}
