//! Orchestrator: drive every input PDF through transform and publish.
//!
//! Two run modes share the same per-document transform step and differ in
//! how drafts are grouped and when cleanup happens:
//!
//! * [`RunMode::PerDocument`] — watermark, rasterise, submit a
//!   single-article draft, delete that document's artifacts, then move on.
//! * [`RunMode::Batched`] — transform everything first, submit one
//!   multi-article draft covering the successes, then delete every collected
//!   artifact whether or not the submission succeeded.
//!
//! ## Failure containment
//!
//! One document failing to transform or publish never aborts the others, and
//! one cleanup failure never blocks further cleanup. Instead of catching
//! panics or treating errors as control flow, each document produces a
//! [`DocumentOutcome`] record; the caller inspects the aggregated
//! [`RunReport`] after the loop. Cleanup failures are logged and never
//! re-raised.

use crate::config::{PublishConfig, RunMode};
use crate::error::{DocumentError, Pdf2DraftError};
use crate::pipeline::DocumentTransform;
use crate::publish::{ArticleSource, MediaId, Publisher};
use crate::store::DocumentStore;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What happened to one input document.
#[derive(Debug)]
pub struct DocumentOutcome {
    /// The source PDF this outcome concerns.
    pub source: PathBuf,
    /// `Ok(())` when the document made it into a submitted or collected
    /// draft; the per-document error otherwise.
    pub result: Result<(), DocumentError>,
}

/// Aggregated result of one orchestrator run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// One outcome per discovered input. Per-document mode records them in
    /// processing order; batched mode records transform failures as they
    /// happen and the rest once the draft submission resolves.
    pub outcomes: Vec<DocumentOutcome>,
    /// Media ids of submitted drafts: one per document in per-document mode,
    /// at most one in batched mode.
    pub draft_media_ids: Vec<MediaId>,
}

impl RunReport {
    /// Number of documents that completed without error.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Number of documents that failed.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// A transformed document awaiting publish and cleanup.
struct TransformedDocument {
    source: PathBuf,
    title: String,
    watermarked: PathBuf,
    workspace: PathBuf,
}

/// Run the full pipeline over every PDF in the configured folder.
///
/// Fatal errors (absent input folder, watermark asset missing, failed
/// authentication) abort the run before any document is processed; once the
/// per-document loop starts, failures are contained per document.
pub async fn run(
    config: &PublishConfig,
    transform: &dyn DocumentTransform,
) -> Result<RunReport, Pdf2DraftError> {
    let store = DocumentStore::new(&config.folder, &config.output_root)?;
    let inputs = store.list_inputs()?;
    if inputs.is_empty() {
        info!("No PDF inputs in {}; nothing to do", config.folder.display());
        return Ok(RunReport::default());
    }

    let publisher = Publisher::connect(config).await?;
    info!(
        "Processing {} document(s) in {:?} mode",
        inputs.len(),
        config.mode
    );

    match config.mode {
        RunMode::PerDocument => run_per_document(config, &store, transform, &publisher, inputs).await,
        RunMode::Batched => run_batched(config, &store, transform, &publisher, inputs).await,
    }
}

/// Watermark and rasterise one input, returning its collected artifacts.
async fn transform_document(
    store: &DocumentStore,
    transform: &dyn DocumentTransform,
    source: &Path,
) -> Result<TransformedDocument, Pdf2DraftError> {
    let title = DocumentStore::base_name(source);
    let watermarked = store.watermarked_path(&title);
    transform.watermark(source, &watermarked).await?;
    let workspace = transform.rasterize(&watermarked, &title, store).await?;
    Ok(TransformedDocument {
        source: source.to_path_buf(),
        title,
        watermarked,
        workspace,
    })
}

/// Delete one document's watermarked file and workspace. Best-effort: every
/// failure is logged and swallowed so the remaining cleanup still runs.
fn cleanup_document(store: &DocumentStore, doc: &TransformedDocument) {
    if let Err(e) = std::fs::remove_file(&doc.watermarked) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(
                "Cleanup: could not remove {}: {}",
                doc.watermarked.display(),
                e
            );
        }
    }
    if let Err(e) = store.delete_workspace(&doc.workspace) {
        warn!(
            "Cleanup: could not remove workspace {}: {}",
            doc.workspace.display(),
            e
        );
    }
}

/// One draft per document, cleaned up immediately after its submission.
async fn run_per_document(
    config: &PublishConfig,
    store: &DocumentStore,
    transform: &dyn DocumentTransform,
    publisher: &Publisher,
    inputs: Vec<PathBuf>,
) -> Result<RunReport, Pdf2DraftError> {
    let mut report = RunReport::default();

    for source in inputs {
        info!("Processing {}", source.display());

        let doc = match transform_document(store, transform, &source).await {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Transform failed for {}: {}", source.display(), e);
                report.outcomes.push(DocumentOutcome {
                    source: source.clone(),
                    result: Err(DocumentError::TransformFailed {
                        source_path: source,
                        detail: e.to_string(),
                    }),
                });
                continue;
            }
        };

        let sources = [ArticleSource {
            title: doc.title.clone(),
            workspace: doc.workspace.clone(),
        }];
        let result = publisher
            .create_article(store, &sources, &config.cover_image)
            .await;

        cleanup_document(store, &doc);

        match result {
            Ok(media_id) => {
                report.draft_media_ids.push(media_id);
                report.outcomes.push(DocumentOutcome {
                    source: doc.source,
                    result: Ok(()),
                });
            }
            Err(e) => {
                warn!("Publish failed for {}: {}", doc.source.display(), e);
                report.outcomes.push(DocumentOutcome {
                    source: doc.source.clone(),
                    result: Err(DocumentError::PublishFailed {
                        source_path: doc.source,
                        detail: e.to_string(),
                    }),
                });
            }
        }
    }

    info!(
        "Run complete: {} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );
    Ok(report)
}

/// Transform everything, submit one multi-article draft from the successes,
/// then clean up every collected artifact regardless of the submission's
/// fate.
async fn run_batched(
    config: &PublishConfig,
    store: &DocumentStore,
    transform: &dyn DocumentTransform,
    publisher: &Publisher,
    inputs: Vec<PathBuf>,
) -> Result<RunReport, Pdf2DraftError> {
    let mut report = RunReport::default();
    let mut transformed = Vec::new();

    for source in inputs {
        info!("Transforming {}", source.display());
        match transform_document(store, transform, &source).await {
            Ok(doc) => transformed.push(doc),
            Err(e) => {
                warn!("Transform failed for {}: {}", source.display(), e);
                report.outcomes.push(DocumentOutcome {
                    source: source.clone(),
                    result: Err(DocumentError::TransformFailed {
                        source_path: source,
                        detail: e.to_string(),
                    }),
                });
            }
        }
    }

    if transformed.is_empty() {
        info!("No document survived the transform stage; skipping draft submission");
        return Ok(report);
    }

    let sources: Vec<ArticleSource> = transformed
        .iter()
        .map(|doc| ArticleSource {
            title: doc.title.clone(),
            workspace: doc.workspace.clone(),
        })
        .collect();

    let result = publisher
        .create_article(store, &sources, &config.cover_image)
        .await;

    // Deferred cleanup covers every collected document, success or not.
    for doc in &transformed {
        cleanup_document(store, doc);
    }

    match result {
        Ok(media_id) => {
            report.draft_media_ids.push(media_id);
            for doc in transformed {
                report.outcomes.push(DocumentOutcome {
                    source: doc.source,
                    result: Ok(()),
                });
            }
        }
        Err(e) => {
            warn!("Batched draft submission failed: {}", e);
            for doc in transformed {
                report.outcomes.push(DocumentOutcome {
                    source: doc.source.clone(),
                    result: Err(DocumentError::PublishFailed {
                        source_path: doc.source,
                        detail: e.to_string(),
                    }),
                });
            }
        }
    }

    info!(
        "Run complete: {} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );
    Ok(report)
}
