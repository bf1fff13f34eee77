//! Error types for the pdf2draft library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2DraftError`] — **Fatal at the point raised**: a component could not
//!   complete an operation (missing credential, absent input folder, a remote
//!   endpoint declaring `errmsg`). Returned as `Err(Pdf2DraftError)` from
//!   every component operation.
//!
//! * [`DocumentError`] — **Non-fatal**: one document of a batch failed but the
//!   others are fine. Stored inside [`crate::run::DocumentOutcome`] so callers
//!   can inspect partial success rather than losing the whole run to one bad
//!   file.
//!
//! Only the orchestrator in [`crate::run`] downgrades a `Pdf2DraftError` into
//! a `DocumentError`; everywhere else errors propagate with `?`.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2draft library.
///
/// Per-document failures use [`DocumentError`] and are stored in
/// [`crate::run::DocumentOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Pdf2DraftError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// A mandatory credential or setting is absent or invalid at startup.
    #[error("Invalid configuration: {0}")]
    Config(String),

    // ── Storage errors ────────────────────────────────────────────────────
    /// The source folder does not exist.
    #[error("Input folder not found: '{path}'\nCheck the path or pass --folder.")]
    FolderNotFound { path: PathBuf },

    /// A workspace was requested before it was ever created.
    #[error("Workspace not found for '{base_name}': expected at '{path}'")]
    WorkspaceNotFound { base_name: String, path: PathBuf },

    // ── Transform errors ──────────────────────────────────────────────────
    /// The watermark image is absent. Raised eagerly at transform
    /// construction, never per call.
    #[error("Watermark image not found: '{path}'\nSet PDF2DRAFT_WATERMARK to an existing PNG or JPEG.")]
    WatermarkAssetMissing { path: PathBuf },

    /// The watermark image exists but could not be decoded.
    #[error("Watermark image '{path}' could not be decoded: {detail}")]
    WatermarkAssetInvalid { path: PathBuf, detail: String },

    /// pdfium failed to open or process a PDF.
    #[error("PDF error for '{path}': {detail}")]
    Pdf { path: PathBuf, detail: String },

    /// pdfium returned an error while rendering a specific page.
    #[error("Rasterisation failed for page {page} of '{path}': {detail}")]
    RasterisationFailed {
        path: PathBuf,
        page: usize,
        detail: String,
    },

    // ── Remote errors ─────────────────────────────────────────────────────
    /// Token acquisition failed; no authenticated call may follow.
    #[error("WeChat authentication failed: {0}")]
    Auth(String),

    /// An asset upload was rejected or returned no identifier.
    #[error("WeChat upload failed for '{path}': {detail}")]
    Upload { path: PathBuf, detail: String },

    /// Draft submission failed at the transport or protocol level.
    #[error("WeChat draft submission failed: {0}")]
    Publish(String),

    // ── I/O and catch-all ─────────────────────────────────────────────────
    /// Filesystem operation failed.
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2DraftError {
    /// Wrap an I/O error with the path it concerned.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Pdf2DraftError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A non-fatal error for a single document of a batch.
///
/// Stored in [`crate::run::DocumentOutcome`] when a document fails. The run
/// continues with the remaining documents.
#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    /// Watermarking or rasterisation failed.
    #[error("'{source_path}': transform failed: {detail}")]
    TransformFailed {
        source_path: PathBuf,
        detail: String,
    },

    /// Uploading assets or submitting the draft failed.
    #[error("'{source_path}': publish failed: {detail}")]
    PublishFailed {
        source_path: PathBuf,
        detail: String,
    },
}

impl DocumentError {
    /// The source document this failure concerns.
    pub fn source_path(&self) -> &PathBuf {
        match self {
            DocumentError::TransformFailed { source_path, .. } => source_path,
            DocumentError::PublishFailed { source_path, .. } => source_path,
        }
    }
}
