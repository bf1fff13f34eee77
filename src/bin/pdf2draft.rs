//! CLI binary for pdf2draft.
//!
//! A thin shim over the library crate: loads `.env`, maps flags and
//! environment variables to a `PublishConfig`, runs the pipeline, and prints
//! a per-document summary.

use anyhow::{Context, Result};
use clap::Parser;
use pdf2draft::{run, PdfTransform, PublishConfig, RunMode};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Publish every PDF on the desktop, one draft per file
  pdf2draft

  # Publish a specific folder as one multi-article draft
  pdf2draft --folder ./reports --batch

  # Stronger watermark
  pdf2draft --alpha 0.8 --folder ./reports

ENVIRONMENT VARIABLES:
  WECHAT_APPID              Official Account app id (required)
  WECHAT_APPSECRET          Official Account app secret (required)
  PDF2DRAFT_FOLDER          Input folder (default: ~/Desktop)
  PDF2DRAFT_OUTPUT_ROOT     Output root directory (default: output)
  PDF2DRAFT_WATERMARK       Watermark image (default: resources/watermark.png)
  PDF2DRAFT_WATERMARK_ALPHA Watermark opacity 0-1 (default: 0.5)
  PDF2DRAFT_COVER           Cover image (default: resources/cover_image.jpg)
  PDF2DRAFT_AUTHOR          Article author line
  PDF2DRAFT_DIGEST          Article digest line
  PDF2DRAFT_BATCH           Set to 1 for one batched multi-article draft

SETUP:
  1. Put credentials in .env:   WECHAT_APPID=... / WECHAT_APPSECRET=...
  2. Drop PDFs in a folder and run:  pdf2draft --folder ./inbox
"#;

/// Watermark PDFs and publish them as WeChat draft articles.
#[derive(Parser, Debug)]
#[command(name = "pdf2draft", version, about, after_help = AFTER_HELP)]
struct Cli {
    /// Folder scanned for .pdf files (overrides PDF2DRAFT_FOLDER)
    #[arg(long, value_name = "PATH")]
    folder: Option<PathBuf>,

    /// Watermark opacity, 0.0-1.0 (overrides PDF2DRAFT_WATERMARK_ALPHA)
    #[arg(long, value_name = "ALPHA")]
    alpha: Option<f32>,

    /// Submit one batched multi-article draft instead of one draft per file
    #[arg(long)]
    batch: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env first, so from_env sees it; missing .env is fine.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pdf2draft=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = PublishConfig::from_env().context("loading configuration")?;
    if let Some(folder) = cli.folder {
        config.folder = folder;
    }
    if let Some(alpha) = cli.alpha {
        config.watermark_alpha = alpha.clamp(0.0, 1.0);
    }
    if cli.batch {
        config.mode = RunMode::Batched;
    }

    if !config.folder.is_dir() {
        anyhow::bail!("input folder does not exist: {}", config.folder.display());
    }

    let transform = PdfTransform::new(
        &config.watermark_image,
        config.watermark_alpha,
        config.dpi,
    )
    .context("preparing watermark transform")?;

    let report = run(&config, &transform).await.context("publishing run")?;

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(()) => println!("ok    {}", outcome.source.display()),
            Err(e) => println!("FAIL  {e}"),
        }
    }
    for media_id in &report.draft_media_ids {
        println!("draft {media_id}");
    }

    if report.failed() > 0 && report.succeeded() == 0 && !report.outcomes.is_empty() {
        anyhow::bail!("all {} document(s) failed", report.failed());
    }

    Ok(())
}
