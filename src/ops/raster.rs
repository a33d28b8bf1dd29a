//! Shared pdfium plumbing: library binding, document loading, and page
//! rasterisation used by the enhance and merge stages.
//!
//! ## Why blocking functions?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. Every function here is synchronous and must be called from
//! inside `tokio::task::spawn_blocking`; each blocking task binds its own
//! [`Pdfium`] instance.
//!
//! ## Why cap pixels, not DPI?
//!
//! Page sizes vary wildly: an A0 poster at 300 DPI would produce an
//! enormous bitmap. `max_rendered_pixels` caps the longest edge regardless
//! of physical size, keeping memory bounded.

use crate::error::{FileError, SlideforgeError};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// Bind to a pdfium library.
///
/// Resolution order: `PDFIUM_LIB_PATH` env var, then the working directory,
/// then the system library path.
pub(crate) fn bind_pdfium() -> Result<Pdfium, SlideforgeError> {
    let bindings = if let Ok(path) = std::env::var("PDFIUM_LIB_PATH") {
        Pdfium::bind_to_library(&path)
    } else {
        Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
    }
    .map_err(|e| SlideforgeError::PdfiumBindingFailed(format!("{e:?}")))?;

    Ok(Pdfium::new(bindings))
}

/// Load a PDF, mapping parse failures to [`SlideforgeError::UnreadablePdf`].
pub(crate) fn load_document<'a>(
    pdfium: &'a Pdfium,
    path: &Path,
) -> Result<PdfDocument<'a>, SlideforgeError> {
    pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| SlideforgeError::UnreadablePdf {
            path: path.to_path_buf(),
            detail: format!("{e:?}"),
        })
}

/// Rasterise every page of the PDF at `path`.
///
/// The target width is derived from the page's physical width at `dpi`;
/// either dimension is capped at `max_pixels`. Any failure — open error or
/// a single bad page — is reported as a per-file [`FileError`], since one
/// broken input must not abort the rest of the batch.
pub(crate) fn render_all_pages(
    pdfium: &Pdfium,
    path: &Path,
    dpi: u32,
    max_pixels: u32,
) -> Result<Vec<DynamicImage>, FileError> {
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| FileError::RenderFailed {
            path: path.to_path_buf(),
            detail: format!("{e:?}"),
        })?;

    let pages = document.pages();
    let mut images = Vec::with_capacity(pages.len() as usize);

    for (index, page) in pages.iter().enumerate() {
        let target_width = page_target_width(page.width().value, dpi, max_pixels);
        let config = PdfRenderConfig::new()
            .set_target_width(target_width as i32)
            .set_maximum_height(max_pixels as i32);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| FileError::RenderFailed {
                path: path.to_path_buf(),
                detail: format!("page {}: {e:?}", index + 1),
            })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered {} page {} → {}x{} px",
            path.display(),
            index + 1,
            image.width(),
            image.height()
        );
        images.push(image);
    }

    Ok(images)
}

/// Pixel width for a page of `width_pts` rendered at `dpi`, capped.
pub(crate) fn page_target_width(width_pts: f32, dpi: u32, max_pixels: u32) -> u32 {
    let px = (width_pts / 72.0 * dpi as f32).round() as u32;
    px.clamp(1, max_pixels)
}

/// Page dimensions in points for an image of the given pixel size at `dpi`.
pub(crate) fn page_size_for_image(px_width: u32, px_height: u32, dpi: u32) -> (f32, f32) {
    (
        px_width as f32 * 72.0 / dpi as f32,
        px_height as f32 * 72.0 / dpi as f32,
    )
}

/// Append one page sized `width_pt` × `height_pt` containing `image`
/// scaled to fill it.
pub(crate) fn append_image_page(
    document: &mut PdfDocument,
    image: &DynamicImage,
    width_pt: f32,
    height_pt: f32,
) -> Result<(), PdfiumError> {
    let mut page = document.pages_mut().create_page_at_end(
        PdfPagePaperSize::Custom(PdfPoints::new(width_pt), PdfPoints::new(height_pt)),
    )?;

    page.objects_mut().create_image_object(
        PdfPoints::ZERO,
        PdfPoints::ZERO,
        image,
        Some(PdfPoints::new(width_pt)),
        Some(PdfPoints::new(height_pt)),
    )?;

    Ok(())
}

/// Save `document` to `path`, mapping failures to [`SlideforgeError::WriteError`].
pub(crate) fn save_document(
    document: &PdfDocument,
    path: &Path,
) -> Result<(), SlideforgeError> {
    document
        .save_to_file(path)
        .map_err(|e| SlideforgeError::WriteError {
            path: path.to_path_buf(),
            detail: format!("{e:?}"),
        })
}
