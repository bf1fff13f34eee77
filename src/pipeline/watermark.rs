//! Watermark overlay: stamp one image onto every page of a PDF.
//!
//! ## Why fold opacity into the alpha channel?
//!
//! pdfium exposes no per-object opacity knob for image objects, but PNG alpha
//! is honoured when the image is composited onto the page. Scaling the
//! stamp's alpha channel once at construction gives the same visual result as
//! a canvas-level fill alpha, and costs nothing per page.
//!
//! Placement matches the established output: centred horizontally, anchored
//! at the bottom edge, width capped at [`MAX_STAMP_WIDTH_PT`] preserving the
//! aspect ratio. Pixel dimensions of the stamp are treated as points, so a
//! 300 px-wide logo prints 300 pt wide on every page.

use crate::error::Pdf2DraftError;
use image::{DynamicImage, RgbaImage};
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Widest the stamp may print, in PDF points (450 pt on an A4 page).
pub const MAX_STAMP_WIDTH_PT: f32 = 450.0;

/// Load the watermark image and fold `alpha` into its alpha channel.
///
/// Fails with [`Pdf2DraftError::WatermarkAssetMissing`] if the file is absent
/// (checked here, once, not per document).
pub fn prepare_stamp(path: &Path, alpha: f32) -> Result<RgbaImage, Pdf2DraftError> {
    if !path.is_file() {
        return Err(Pdf2DraftError::WatermarkAssetMissing {
            path: path.to_path_buf(),
        });
    }

    let image = image::open(path).map_err(|e| Pdf2DraftError::WatermarkAssetInvalid {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let mut rgba = image.to_rgba8();
    for pixel in rgba.pixels_mut() {
        pixel[3] = (f32::from(pixel[3]) * alpha).round() as u8;
    }

    debug!(
        "Prepared watermark stamp {}x{} px at alpha {:.2}",
        rgba.width(),
        rgba.height(),
        alpha
    );
    Ok(rgba)
}

/// Printed stamp size in points: native pixel size, width capped at
/// [`MAX_STAMP_WIDTH_PT`], aspect ratio preserved.
fn stamp_size_pt(stamp: &RgbaImage) -> (f32, f32) {
    let (w, h) = (stamp.width() as f32, stamp.height() as f32);
    if w > MAX_STAMP_WIDTH_PT {
        (MAX_STAMP_WIDTH_PT, h * MAX_STAMP_WIDTH_PT / w)
    } else {
        (w, h)
    }
}

/// Write a watermarked copy of `input` at `output`, stamping every page.
///
/// Blocking; called from `spawn_blocking` by
/// [`crate::pipeline::PdfTransform`].
pub fn watermark_blocking(
    input: &Path,
    output: &Path,
    stamp: &RgbaImage,
) -> Result<(), Pdf2DraftError> {
    let pdfium = Pdfium::default();

    let document =
        pdfium
            .load_pdf_from_file(input, None)
            .map_err(|e| Pdf2DraftError::Pdf {
                path: input.to_path_buf(),
                detail: format!("{e:?}"),
            })?;

    let (stamp_w, stamp_h) = stamp_size_pt(stamp);
    let stamp_image = DynamicImage::ImageRgba8(stamp.clone());
    let page_count = document.pages().len();

    for index in 0..page_count {
        let mut page = document
            .pages()
            .get(index)
            .map_err(|e| Pdf2DraftError::Pdf {
                path: input.to_path_buf(),
                detail: format!("page {}: {e:?}", index + 1),
            })?;

        let page_width = page.width().value;
        let x = (page_width - stamp_w) / 2.0;

        page.objects_mut()
            .create_image_object(
                PdfPoints::new(x),
                PdfPoints::new(0.0),
                &stamp_image,
                Some(PdfPoints::new(stamp_w)),
                Some(PdfPoints::new(stamp_h)),
            )
            .map_err(|e| Pdf2DraftError::Pdf {
                path: input.to_path_buf(),
                detail: format!("stamping page {}: {e:?}", index + 1),
            })?;
    }

    document
        .save_to_file(output)
        .map_err(|e| Pdf2DraftError::Pdf {
            path: output.to_path_buf(),
            detail: format!("saving watermarked copy: {e:?}"),
        })?;

    info!(
        "Watermarked {} page(s): {} -> {}",
        page_count,
        input.display(),
        output.display()
    );
    Ok(())
}
