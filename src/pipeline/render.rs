//! Page rasterisation: render every page of a PDF to PNG files.
//!
//! Filenames embed the document base name and a 1-based page index padded to
//! the digit count of the total page count (`deck_page_07.png` for a
//! 10-page document). The publish stage recovers page order with a plain
//! lexicographic filename sort, so padding is load-bearing, not cosmetic.
//!
//! Pre-existing workspace contents are left alone; callers wanting a clean
//! workspace delete it first.

use crate::error::Pdf2DraftError;
use image::ImageFormat;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Points per inch in PDF user space.
const PDF_POINTS_PER_INCH: f32 = 72.0;

/// Zero-pad width needed for `total` pages (1 → 1, 10 → 2, 150 → 3).
fn index_width(total: usize) -> usize {
    total.max(1).to_string().len()
}

/// Render every page of `pdf` at `dpi` into `workspace`.
///
/// Blocking; called from `spawn_blocking` by
/// [`crate::pipeline::PdfTransform`].
pub fn render_pages_blocking(
    pdf: &Path,
    workspace: &Path,
    base_name: &str,
    dpi: u32,
) -> Result<(), Pdf2DraftError> {
    let pdfium = Pdfium::default();

    let document = pdfium
        .load_pdf_from_file(pdf, None)
        .map_err(|e| Pdf2DraftError::Pdf {
            path: pdf.to_path_buf(),
            detail: format!("{e:?}"),
        })?;

    let pages = document.pages();
    let total = pages.len() as usize;
    let width = index_width(total);
    debug!("Rendering {} page(s) of {} at {} DPI", total, pdf.display(), dpi);

    let render_config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / PDF_POINTS_PER_INCH);

    for (index, page) in pages.iter().enumerate() {
        let page_num = index + 1;
        let bitmap =
            page.render_with_config(&render_config)
                .map_err(|e| Pdf2DraftError::RasterisationFailed {
                    path: pdf.to_path_buf(),
                    page: page_num,
                    detail: format!("{e:?}"),
                })?;

        let image_path = workspace.join(format!("{base_name}_page_{page_num:0width$}.png"));
        bitmap
            .as_image()
            .save_with_format(&image_path, ImageFormat::Png)
            .map_err(|e| Pdf2DraftError::RasterisationFailed {
                path: pdf.to_path_buf(),
                page: page_num,
                detail: format!("writing {}: {e}", image_path.display()),
            })?;
    }

    info!(
        "Rasterised {} page(s) into {}",
        total,
        workspace.display()
    );
    Ok(())
}
