//! # pdf2draft
//!
//! Watermark PDF files, rasterise them into page images, and publish those
//! images as WeChat Official Account "graphic-text" draft articles.
//!
//! ## Why this crate?
//!
//! Publishing a PDF to an Official Account by hand is a chore: brand each
//! file, export every page as an image, upload a cover, upload each page,
//! assemble the draft payload, clean up the intermediates. This crate
//! automates the whole chore over a folder of PDFs in one invocation, with
//! per-document failure isolation so one bad file never sinks the batch.
//!
//! ## Pipeline Overview
//!
//! ```text
//! folder/*.pdf
//!  │
//!  ├─ 1. Store      list inputs, derive per-document workspaces
//!  ├─ 2. Watermark  stamp every page via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Render     rasterise pages to 300 DPI PNGs in the workspace
//!  ├─ 4. Publish    token → cover upload → page uploads → draft submission
//!  └─ 5. Cleanup    best-effort delete of watermarked file + workspace
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2draft::{run, PdfTransform, PublishConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credentials from WECHAT_APPID / WECHAT_APPSECRET
//!     let config = PublishConfig::from_env()?;
//!     let transform = PdfTransform::new(
//!         &config.watermark_image,
//!         config.watermark_alpha,
//!         config.dpi,
//!     )?;
//!     let report = run(&config, &transform).await?;
//!     println!("{} published, {} failed", report.succeeded(), report.failed());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2draft` binary (clap + anyhow + tracing-subscriber + dotenvy) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2draft = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod pipeline;
pub mod publish;
pub mod run;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PublishConfig, PublishConfigBuilder, RunMode, DEFAULT_API_BASE};
pub use error::{DocumentError, Pdf2DraftError};
pub use pipeline::{DocumentTransform, PdfTransform};
pub use publish::{Article, ArticleSource, ImageUrl, MediaId, Publisher};
pub use run::{run, DocumentOutcome, RunReport};
pub use store::DocumentStore;
