//! WeChat Official Account publishing: token, uploads, draft submission.
//!
//! The remote contract is three call types behind one bearer token:
//!
//! 1. token exchange — `GET /cgi-bin/token?grant_type=client_credential&…`
//! 2. asset upload — multipart `POST`, either the *material* endpoint
//!    (persistent, returns a `media_id`, used for covers) or the *temp image*
//!    endpoint (transient, returns a `url`, used for inline page images)
//! 3. draft submission — JSON `POST /cgi-bin/draft/add`
//!
//! WeChat signals failure inside an HTTP 200 body: success is defined by the
//! presence of the expected field (`access_token` / `media_id` / `url`), not
//! by status code. Every response type below therefore models both shapes
//! and [`ApiOutcome::into_result`] centralises the check.
//!
//! ## Asset classes
//!
//! Persistent media ids and transient URLs come from different endpoints,
//! have different remote lifetimes, and are never interchangeable; the
//! [`MediaId`] and `ImageUrl` newtypes keep them apart at compile time.
//!
//! ## Throttling
//!
//! The temp-image endpoint rejects rapid-fire uploads from one token, so the
//! article-assembly loop blocks for a uniformly random 1–3 s after every
//! transient upload. The pause is part of the upload flow's contract with
//! the platform and is taken even for the final image of an article.

use crate::config::PublishConfig;
use crate::error::Pdf2DraftError;
use crate::store::DocumentStore;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

// ── Wire types ───────────────────────────────────────────────────────────

/// Identifier of a persistent remote asset (material endpoint).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaId(pub String);

impl std::fmt::Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// URL of a transient remote asset (temp-image endpoint).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUrl(pub String);

/// One article of a draft, exactly as the draft endpoint expects it.
#[derive(Debug, Clone, Serialize)]
pub struct Article {
    pub title: String,
    pub thumb_media_id: String,
    pub author: String,
    pub digest: String,
    pub content: String,
    pub content_source_url: String,
    pub need_open_comment: u8,
    pub only_fans_can_comment: u8,
}

#[derive(Serialize)]
struct DraftPayload<'a> {
    articles: &'a [Article],
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[allow(dead_code)]
    expires_in: Option<u64>,
    #[serde(flatten)]
    outcome: ApiOutcome,
}

#[derive(Deserialize)]
struct MaterialResponse {
    media_id: Option<String>,
    #[serde(flatten)]
    outcome: ApiOutcome,
}

#[derive(Deserialize)]
struct TempImageResponse {
    url: Option<String>,
    #[serde(flatten)]
    outcome: ApiOutcome,
}

#[derive(Deserialize)]
struct DraftResponse {
    media_id: Option<String>,
    #[serde(flatten)]
    outcome: ApiOutcome,
}

/// The error half every WeChat response may carry, even under HTTP 200.
#[derive(Debug, Deserialize)]
struct ApiOutcome {
    errcode: Option<i64>,
    errmsg: Option<String>,
}

impl ApiOutcome {
    /// Resolve `value` against the remote-declared error fields.
    ///
    /// The expected field wins when present; otherwise the remote message
    /// (or a placeholder) becomes the error detail.
    fn into_result<T>(self, value: Option<T>) -> Result<T, String> {
        match value {
            Some(v) => Ok(v),
            None => {
                let msg = self.errmsg.unwrap_or_else(|| "unknown error".to_string());
                match self.errcode {
                    Some(code) => Err(format!("{msg} (errcode {code})")),
                    None => Err(msg),
                }
            }
        }
    }
}

// ── Publisher ────────────────────────────────────────────────────────────

/// A document to publish as one article: its title and the workspace holding
/// its rasterised page images.
#[derive(Debug, Clone)]
pub struct ArticleSource {
    pub title: String,
    pub workspace: PathBuf,
}

/// Authenticated WeChat client.
///
/// Construction performs the token exchange eagerly; a failed exchange means
/// no usable instance exists, so no authenticated call can ever run with an
/// empty token. The token is cached for the instance's lifetime and never
/// refreshed: an expiry mid-run surfaces as a remote-call failure, matching
/// the no-retry policy of the rest of the crate.
#[derive(Debug)]
pub struct Publisher {
    http: reqwest::Client,
    api_base: String,
    access_token: String,
    upload_delay_secs: RangeInclusive<u64>,
    author: String,
    digest: String,
}

impl Publisher {
    /// Exchange the configured credentials for an access token and return a
    /// ready-to-use client.
    ///
    /// # Errors
    /// [`Pdf2DraftError::Config`] if the credentials are blank;
    /// [`Pdf2DraftError::Auth`] on transport failure or a remote-declared
    /// error (`errmsg` body, missing/empty `access_token`).
    pub async fn connect(config: &PublishConfig) -> Result<Self, Pdf2DraftError> {
        if config.app_id.is_empty() || config.app_secret.is_empty() {
            return Err(Pdf2DraftError::Config(
                "WeChat app id and secret are required".into(),
            ));
        }

        let http = reqwest::Client::new();
        let url = format!("{}/cgi-bin/token", config.api_base);
        let response = http
            .get(&url)
            .query(&[
                ("grant_type", "client_credential"),
                ("appid", config.app_id.as_str()),
                ("secret", config.app_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Pdf2DraftError::Auth(e.to_string()))?
            .error_for_status()
            .map_err(|e| Pdf2DraftError::Auth(e.to_string()))?;

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| Pdf2DraftError::Auth(format!("malformed token response: {e}")))?;

        let token = body
            .outcome
            .into_result(body.access_token.filter(|t| !t.is_empty()))
            .map_err(Pdf2DraftError::Auth)?;

        info!("WeChat access token acquired");
        Ok(Self {
            http,
            api_base: config.api_base.clone(),
            access_token: token,
            upload_delay_secs: config.upload_delay_secs.clone(),
            author: config.author.clone(),
            digest: config.digest.clone(),
        })
    }

    /// Read a local file into a one-part multipart form (field `media`).
    async fn media_form(path: &Path) -> Result<reqwest::multipart::Form, Pdf2DraftError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Pdf2DraftError::io(path, e))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "media".to_string());
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        Ok(reqwest::multipart::Form::new().part("media", part))
    }

    /// Upload a file to the *material* endpoint, yielding a persistent
    /// [`MediaId`]. Used for cover images.
    pub async fn upload_material(&self, path: &Path) -> Result<MediaId, Pdf2DraftError> {
        let url = format!("{}/cgi-bin/material/add_material", self.api_base);
        let form = Self::media_form(path).await?;

        let response = self
            .http
            .post(&url)
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("type", "image"),
            ])
            .multipart(form)
            .send()
            .await
            .map_err(|e| Pdf2DraftError::Upload {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?
            .error_for_status()
            .map_err(|e| Pdf2DraftError::Upload {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;

        let body: MaterialResponse =
            response.json().await.map_err(|e| Pdf2DraftError::Upload {
                path: path.to_path_buf(),
                detail: format!("malformed upload response: {e}"),
            })?;

        let media_id = body
            .outcome
            .into_result(body.media_id)
            .map_err(|detail| Pdf2DraftError::Upload {
                path: path.to_path_buf(),
                detail,
            })?;

        debug!("Uploaded material {} -> {}", path.display(), media_id);
        Ok(MediaId(media_id))
    }

    /// Upload a file to the *temp image* endpoint, yielding a transient
    /// [`ImageUrl`]. Used for inline page images.
    pub async fn upload_temp_image(&self, path: &Path) -> Result<ImageUrl, Pdf2DraftError> {
        let url = format!("{}/cgi-bin/media/uploadimg", self.api_base);
        let form = Self::media_form(path).await?;

        let response = self
            .http
            .post(&url)
            .query(&[("access_token", self.access_token.as_str())])
            .multipart(form)
            .send()
            .await
            .map_err(|e| Pdf2DraftError::Upload {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?
            .error_for_status()
            .map_err(|e| Pdf2DraftError::Upload {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;

        let body: TempImageResponse =
            response.json().await.map_err(|e| Pdf2DraftError::Upload {
                path: path.to_path_buf(),
                detail: format!("malformed upload response: {e}"),
            })?;

        let image_url = body
            .outcome
            .into_result(body.url)
            .map_err(|detail| Pdf2DraftError::Upload {
                path: path.to_path_buf(),
                detail,
            })?;

        debug!("Uploaded temp image {} -> {}", path.display(), image_url);
        Ok(ImageUrl(image_url))
    }

    /// Submit a draft of the given articles, yielding the draft's media id.
    pub async fn create_draft(&self, articles: &[Article]) -> Result<MediaId, Pdf2DraftError> {
        let url = format!("{}/cgi-bin/draft/add", self.api_base);

        let response = self
            .http
            .post(&url)
            .query(&[("access_token", self.access_token.as_str())])
            .json(&DraftPayload { articles })
            .send()
            .await
            .map_err(|e| Pdf2DraftError::Publish(e.to_string()))?
            .error_for_status()
            .map_err(|e| Pdf2DraftError::Publish(e.to_string()))?;

        let body: DraftResponse = response
            .json()
            .await
            .map_err(|e| Pdf2DraftError::Publish(format!("malformed draft response: {e}")))?;

        let media_id = body
            .outcome
            .into_result(body.media_id)
            .map_err(Pdf2DraftError::Publish)?;

        info!("Draft created: media_id={}", media_id);
        Ok(MediaId(media_id))
    }

    /// Composed operation: upload the cover once, upload every page image of
    /// every source in filename order, assemble one [`Article`] per source,
    /// and submit a single draft.
    ///
    /// This is the operation external callers use; the individual uploads are
    /// building blocks.
    pub async fn create_article(
        &self,
        store: &DocumentStore,
        sources: &[ArticleSource],
        cover_image: &Path,
    ) -> Result<MediaId, Pdf2DraftError> {
        let cover = self.upload_material(cover_image).await?;

        let mut articles = Vec::with_capacity(sources.len());
        for source in sources {
            let pages = store.list_page_images(&source.workspace)?;
            if pages.is_empty() {
                warn!(
                    "Workspace {} holds no page images; article '{}' will be empty",
                    source.workspace.display(),
                    source.title
                );
            }

            let mut content = String::new();
            for page in &pages {
                let url = self.upload_temp_image(page).await?;
                self.pause_between_uploads().await;
                content.push_str(&format!("<img src=\"{}\" />", url.0));
            }

            articles.push(Article {
                title: source.title.clone(),
                thumb_media_id: cover.0.clone(),
                author: self.author.clone(),
                digest: self.digest.clone(),
                content,
                content_source_url: String::new(),
                need_open_comment: 1,
                only_fans_can_comment: 0,
            });
        }

        self.create_draft(&articles).await
    }

    /// Block for a random duration drawn from the configured delay range.
    async fn pause_between_uploads(&self) {
        let secs = rand::thread_rng().gen_range(self.upload_delay_secs.clone());
        if secs > 0 {
            debug!("Throttling {}s before next upload", secs);
            tokio::time::sleep(Duration::from_secs(secs)).await;
        }
    }
}
