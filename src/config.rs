//! Configuration for a publishing run.
//!
//! All behaviour is controlled through [`PublishConfig`], built via its
//! [`PublishConfigBuilder`] or loaded once from the environment with
//! [`PublishConfig::from_env`]. Components receive the config by reference at
//! construction time; nothing reads the environment after startup, so every
//! component is testable in isolation.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! documented defaults for the rest.

use crate::error::Pdf2DraftError;
use std::ops::RangeInclusive;
use std::path::PathBuf;

/// Default WeChat API host. Overridable for tests against a mock server.
pub const DEFAULT_API_BASE: &str = "https://api.weixin.qq.com";

/// How the orchestrator groups documents into drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// One single-article draft per document, cleaned up immediately after
    /// that document's submission. (default)
    #[default]
    PerDocument,
    /// One multi-article draft covering every successfully transformed
    /// document, with cleanup deferred until after the single submission.
    Batched,
}

/// Configuration for a publishing run.
///
/// Built via [`PublishConfig::builder()`] or [`PublishConfig::from_env()`].
///
/// # Example
/// ```rust
/// use pdf2draft::PublishConfig;
///
/// let config = PublishConfig::builder()
///     .app_id("wx0123456789abcdef")
///     .app_secret("secret")
///     .folder("./inbox")
///     .watermark_alpha(0.5)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Folder scanned for `.pdf` inputs. Default: `$HOME/Desktop`.
    pub folder: PathBuf,

    /// Root under which watermarked files and per-document workspaces are
    /// written. Default: `output`.
    pub output_root: PathBuf,

    /// Watermark image overlaid on every page. Default: `resources/watermark.png`.
    ///
    /// Checked eagerly when the transform stage is constructed; a missing
    /// file fails the whole run before any document is touched.
    pub watermark_image: PathBuf,

    /// Watermark opacity in `[0, 1]`. Default: 0.5. Out-of-range values are
    /// clamped, matching how the overlay is composited.
    pub watermark_alpha: f32,

    /// Cover image uploaded as the persistent thumbnail asset of every
    /// article. Default: `resources/cover_image.jpg`.
    pub cover_image: PathBuf,

    /// WeChat Official Account app id. Mandatory.
    pub app_id: String,

    /// WeChat Official Account app secret. Mandatory.
    pub app_secret: String,

    /// API host, no trailing slash. Default: [`DEFAULT_API_BASE`].
    pub api_base: String,

    /// Rendering DPI for page rasterisation. Default: 300.
    ///
    /// 300 DPI keeps small print legible once WeChat recompresses the inline
    /// images; the temp-image endpoint accepts files up to 1 MB per image,
    /// which A4 at 300 DPI stays under for typical text pages.
    pub dpi: u32,

    /// Inclusive range (whole seconds) for the randomised pause after each
    /// transient image upload. Default: `1..=3`.
    ///
    /// The WeChat temp-image endpoint throttles rapid-fire uploads from the
    /// same token. The pause is a required behaviour of the upload flow, not
    /// an optimisation; tests may set `0..=0` to collapse it.
    pub upload_delay_secs: RangeInclusive<u64>,

    /// Author string stamped on every article. Default: `"pdf2draft"`.
    pub author: String,

    /// Digest (summary) string stamped on every article.
    pub digest: String,

    /// Draft grouping strategy. Default: [`RunMode::PerDocument`].
    pub mode: RunMode,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            folder: default_folder(),
            output_root: PathBuf::from("output"),
            watermark_image: PathBuf::from("resources/watermark.png"),
            watermark_alpha: 0.5,
            cover_image: PathBuf::from("resources/cover_image.jpg"),
            app_id: String::new(),
            app_secret: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            dpi: 300,
            upload_delay_secs: 1..=3,
            author: "pdf2draft".to_string(),
            digest: "Automatically generated PDF share".to_string(),
            mode: RunMode::PerDocument,
        }
    }
}

/// Platform default input folder: the user's desktop.
fn default_folder() -> PathBuf {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join("Desktop")
}

impl PublishConfig {
    /// Create a new builder for `PublishConfig`.
    pub fn builder() -> PublishConfigBuilder {
        PublishConfigBuilder {
            config: Self::default(),
        }
    }

    /// Load configuration from the environment, reading each variable once.
    ///
    /// `WECHAT_APPID` and `WECHAT_APPSECRET` are mandatory; everything else
    /// falls back to the documented defaults. Callers that want `.env`
    /// support (the CLI does) load it before calling this.
    pub fn from_env() -> Result<Self, Pdf2DraftError> {
        let mut builder = Self::builder();

        if let Some(v) = env_nonempty("WECHAT_APPID") {
            builder = builder.app_id(v);
        }
        if let Some(v) = env_nonempty("WECHAT_APPSECRET") {
            builder = builder.app_secret(v);
        }
        if let Some(v) = env_nonempty("PDF2DRAFT_FOLDER") {
            builder = builder.folder(v);
        }
        if let Some(v) = env_nonempty("PDF2DRAFT_OUTPUT_ROOT") {
            builder = builder.output_root(v);
        }
        if let Some(v) = env_nonempty("PDF2DRAFT_WATERMARK") {
            builder = builder.watermark_image(v);
        }
        if let Some(v) = env_nonempty("PDF2DRAFT_WATERMARK_ALPHA") {
            let alpha = v.parse::<f32>().map_err(|_| {
                Pdf2DraftError::Config(format!(
                    "PDF2DRAFT_WATERMARK_ALPHA must be a number in [0,1], got '{v}'"
                ))
            })?;
            builder = builder.watermark_alpha(alpha);
        }
        if let Some(v) = env_nonempty("PDF2DRAFT_COVER") {
            builder = builder.cover_image(v);
        }
        if let Some(v) = env_nonempty("PDF2DRAFT_API_BASE") {
            builder = builder.api_base(v);
        }
        if let Some(v) = env_nonempty("PDF2DRAFT_AUTHOR") {
            builder = builder.author(v);
        }
        if let Some(v) = env_nonempty("PDF2DRAFT_DIGEST") {
            builder = builder.digest(v);
        }
        if let Some(v) = env_nonempty("PDF2DRAFT_BATCH") {
            let batched = matches!(v.as_str(), "1" | "true" | "yes" | "on");
            builder = builder.mode(if batched {
                RunMode::Batched
            } else {
                RunMode::PerDocument
            });
        }

        builder.build()
    }
}

/// Read an environment variable, treating empty as unset.
fn env_nonempty(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Builder for [`PublishConfig`].
#[derive(Debug)]
pub struct PublishConfigBuilder {
    config: PublishConfig,
}

impl PublishConfigBuilder {
    pub fn folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.folder = path.into();
        self
    }

    pub fn output_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_root = path.into();
        self
    }

    pub fn watermark_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.watermark_image = path.into();
        self
    }

    pub fn watermark_alpha(mut self, alpha: f32) -> Self {
        self.config.watermark_alpha = alpha.clamp(0.0, 1.0);
        self
    }

    pub fn cover_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cover_image = path.into();
        self
    }

    pub fn app_id(mut self, id: impl Into<String>) -> Self {
        self.config.app_id = id.into();
        self
    }

    pub fn app_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.app_secret = secret.into();
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        self.config.api_base = base;
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn upload_delay_secs(mut self, range: RangeInclusive<u64>) -> Self {
        self.config.upload_delay_secs = range;
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.config.author = author.into();
        self
    }

    pub fn digest(mut self, digest: impl Into<String>) -> Self {
        self.config.digest = digest.into();
        self
    }

    pub fn mode(mut self, mode: RunMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Build the configuration, validating the mandatory credentials.
    pub fn build(self) -> Result<PublishConfig, Pdf2DraftError> {
        let c = &self.config;
        if c.app_id.is_empty() || c.app_secret.is_empty() {
            return Err(Pdf2DraftError::Config(
                "WeChat app id and secret are required \
                 (set WECHAT_APPID and WECHAT_APPSECRET)"
                    .into(),
            ));
        }
        if c.upload_delay_secs.is_empty() {
            return Err(Pdf2DraftError::Config(format!(
                "upload delay range is empty: {:?}",
                c.upload_delay_secs
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> PublishConfigBuilder {
        PublishConfig::builder().app_id("id").app_secret("secret")
    }

    #[test]
    fn missing_credentials_rejected() {
        let err = PublishConfig::builder().build().unwrap_err();
        assert!(err.to_string().contains("WECHAT_APPID"));
    }

    #[test]
    fn alpha_is_clamped() {
        let c = minimal().watermark_alpha(1.7).build().unwrap();
        assert_eq!(c.watermark_alpha, 1.0);
        let c = minimal().watermark_alpha(-0.2).build().unwrap();
        assert_eq!(c.watermark_alpha, 0.0);
    }

    #[test]
    fn api_base_trailing_slash_stripped() {
        let c = minimal().api_base("http://localhost:9001/").build().unwrap();
        assert_eq!(c.api_base, "http://localhost:9001");
    }

    #[test]
    fn empty_delay_range_rejected() {
        #[allow(clippy::reversed_empty_ranges)]
        let err = minimal().upload_delay_secs(3..=1).build().unwrap_err();
        assert!(err.to_string().contains("delay"));
    }

    #[test]
    fn defaults_match_documented_values() {
        let c = minimal().build().unwrap();
        assert_eq!(c.dpi, 300);
        assert_eq!(c.upload_delay_secs, 1..=3);
        assert_eq!(c.api_base, DEFAULT_API_BASE);
        assert_eq!(c.mode, RunMode::PerDocument);
    }
}
