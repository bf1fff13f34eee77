//! Transform stages: watermark overlay and page rasterisation.
//!
//! Each submodule implements exactly one transformation step over pdfium.
//! Keeping stages separate makes each independently testable and lets us
//! swap the PDF backend without touching the rest of the crate.
//!
//! ## Data Flow
//!
//! ```text
//! input.pdf ──▶ watermark ──▶ <base>_watermarked.pdf ──▶ render ──▶ workspace/
//!               (pdfium overlay)                          (pdfium, 300 DPI PNGs)
//! ```
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread, preventing the Tokio worker threads from stalling during CPU-heavy
//! rendering. The run remains strictly sequential: each blocking task is
//! awaited before the next begins.

pub mod render;
pub mod watermark;

use crate::error::Pdf2DraftError;
use crate::store::DocumentStore;
use async_trait::async_trait;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Seam between the orchestrator and the PDF backend.
///
/// The orchestrator only needs "brand this file" and "turn that file into
/// ordered page images in its workspace"; tests substitute a stub to exercise
/// failure isolation without a pdfium binary.
#[async_trait]
pub trait DocumentTransform: Send + Sync {
    /// Write a watermarked copy of `input` at `output`. `input` is never
    /// mutated.
    async fn watermark(&self, input: &Path, output: &Path) -> Result<(), Pdf2DraftError>;

    /// Rasterise every page of `pdf` into the workspace keyed by
    /// `base_name` (created via `store` if absent) and return the workspace
    /// path. The key is the *source* document's base name, not the stem of
    /// `pdf`, which is usually the watermarked copy.
    async fn rasterize(
        &self,
        pdf: &Path,
        base_name: &str,
        store: &DocumentStore,
    ) -> Result<PathBuf, Pdf2DraftError>;
}

/// pdfium-backed [`DocumentTransform`].
///
/// The watermark asset is checked and decoded once at construction; a missing
/// or undecodable file fails the run before any document is touched.
#[derive(Debug, Clone)]
pub struct PdfTransform {
    /// Watermark pixels with the configured opacity already folded into the
    /// alpha channel.
    stamp: Arc<RgbaImage>,
    dpi: u32,
}

impl PdfTransform {
    /// Build a transform from the watermark image at `watermark_image`,
    /// composited at `alpha` (clamped to `[0, 1]`), rendering pages at `dpi`.
    pub fn new(
        watermark_image: &Path,
        alpha: f32,
        dpi: u32,
    ) -> Result<Self, Pdf2DraftError> {
        let stamp = watermark::prepare_stamp(watermark_image, alpha.clamp(0.0, 1.0))?;
        Ok(Self {
            stamp: Arc::new(stamp),
            dpi,
        })
    }
}

#[async_trait]
impl DocumentTransform for PdfTransform {
    async fn watermark(&self, input: &Path, output: &Path) -> Result<(), Pdf2DraftError> {
        let input = input.to_path_buf();
        let output = output.to_path_buf();
        let stamp = Arc::clone(&self.stamp);

        tokio::task::spawn_blocking(move || {
            watermark::watermark_blocking(&input, &output, &stamp)
        })
        .await
        .map_err(|e| Pdf2DraftError::Internal(format!("Watermark task panicked: {e}")))?
    }

    async fn rasterize(
        &self,
        pdf: &Path,
        base_name: &str,
        store: &DocumentStore,
    ) -> Result<PathBuf, Pdf2DraftError> {
        let workspace = store.ensure_workspace(base_name)?;
        let pdf = pdf.to_path_buf();
        let target = workspace.clone();
        let base_name = base_name.to_string();
        let dpi = self.dpi;

        tokio::task::spawn_blocking(move || {
            render::render_pages_blocking(&pdf, &target, &base_name, dpi)
        })
        .await
        .map_err(|e| Pdf2DraftError::Internal(format!("Render task panicked: {e}")))??;

        Ok(workspace)
    }
}
