//! AddPageNumbers stage: stamp a running number onto every page of a
//! single PDF as an additive overlay.
//!
//! The stamp is a Helvetica 12pt text object added on top of the existing
//! content via pdfium's page watermarking — nothing is replaced and the
//! page count is preserved. The number printed on the Nth page (1-indexed)
//! is `start_page + N − 1`, so numbering can continue across
//! previously-split documents.

use crate::config::NumberPosition;
use crate::error::SlideforgeError;
use crate::ops::raster;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

const FONT_SIZE_PT: f32 = 12.0;
const MARGIN_PT: f32 = 24.0;

/// Stamp page numbers onto `input`, writing the result to `output`.
///
/// Returns the number of pages stamped (== the input page count).
pub async fn add_page_numbers(
    input: &Path,
    output: &Path,
    position: NumberPosition,
    start_page: u32,
) -> Result<usize, SlideforgeError> {
    if !position.is_anchor() {
        return Err(SlideforgeError::InvalidPosition {
            input: position.to_string(),
        });
    }

    let input = input.to_path_buf();
    let output = output.to_path_buf();

    tokio::task::spawn_blocking(move || {
        stamp_blocking(&input, &output, position, start_page)
    })
    .await
    .map_err(|e| SlideforgeError::Internal(format!("numbering task panicked: {e}")))?
}

fn stamp_blocking(
    input: &Path,
    output: &Path,
    position: NumberPosition,
    start_page: u32,
) -> Result<usize, SlideforgeError> {
    let pdfium = raster::bind_pdfium()?;
    let mut document = raster::load_document(&pdfium, input)?;

    let page_count = document.pages().len() as usize;
    info!(
        "Stamping {} page(s) of {} at {} starting from {}",
        page_count,
        input.display(),
        position,
        start_page
    );

    let font = document.fonts_mut().helvetica();

    document
        .pages()
        .watermark(|group, index, width, height| {
            let number = start_page as usize + index as usize;
            let mut object = PdfPageTextObject::new(
                &document,
                number.to_string(),
                font,
                PdfPoints::new(FONT_SIZE_PT),
            )?;
            object.set_fill_color(PdfColor::new(0, 0, 0, 255))?;

            let (x, y) = anchor_point(
                position,
                width.value,
                height.value,
                object.width()?.value,
                object.height()?.value,
            );
            object.translate(PdfPoints::new(x), PdfPoints::new(y))?;

            group.push(&mut object.into())
        })
        .map_err(|e| SlideforgeError::UnreadablePdf {
            path: input.to_path_buf(),
            detail: format!("{e:?}"),
        })?;

    raster::save_document(&document, output)?;
    debug!("Numbered PDF written to {}", output.display());
    Ok(page_count)
}

/// Bottom-left coordinates for a stamp of `text_w` × `text_h` points at the
/// requested anchor, inset by a uniform margin.
pub(crate) fn anchor_point(
    position: NumberPosition,
    page_w: f32,
    page_h: f32,
    text_w: f32,
    text_h: f32,
) -> (f32, f32) {
    match position {
        NumberPosition::TopLeft => (MARGIN_PT, page_h - text_h - MARGIN_PT),
        NumberPosition::TopRight => (page_w - text_w - MARGIN_PT, page_h - text_h - MARGIN_PT),
        NumberPosition::BottomLeft => (MARGIN_PT, MARGIN_PT),
        NumberPosition::BottomRight => (page_w - text_w - MARGIN_PT, MARGIN_PT),
        NumberPosition::Center => ((page_w - text_w) / 2.0, (page_h - text_h) / 2.0),
        // Validated upstream; a None position never reaches the stamp loop.
        NumberPosition::None => (MARGIN_PT, MARGIN_PT),
    }
}
