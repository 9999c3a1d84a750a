//! Client configuration.
//!
//! Every knob lives in [`ClientConfig`], built via [`ClientConfigBuilder`].
//! The backend origin is fixed at build time through the
//! `SUBCRUNCHER_API_URL` environment variable; the builder's `base_url`
//! setter exists for embedding and tests (pointing at a mock server), not as
//! a user-facing runtime override.
//!
//! # Example
//! ```rust
//! use subcruncher::ClientConfig;
//!
//! let config = ClientConfig::builder()
//!     .base_url("https://convert.example.com")
//!     .timeout_secs(30)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.timeout_secs, 30);
//! ```

use crate::error::ConfigError;
use reqwest::Url;
use std::path::PathBuf;

/// Backend origin baked in at compile time.
pub const DEFAULT_BASE_URL: &str = match option_env!("SUBCRUNCHER_API_URL") {
    Some(url) => url,
    None => "https://subcruncher-server-czdggue2awdze4gz.uksouth-01.azurewebsites.net",
};

/// Configuration shared by every component of the client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin every request is resolved against, without a trailing
    /// slash.
    pub base_url: String,

    /// Fixed per-request timeout in seconds. Default: 10.
    ///
    /// This is the only bound on a hung call; nothing cancels a request when
    /// the user navigates away.
    pub timeout_secs: u64,

    /// Directory holding `session.json`. Default: `<config dir>/subcruncher`.
    pub session_dir: PathBuf,

    /// Where downloaded artifacts are written. Default: current directory.
    pub download_dir: PathBuf,

    /// Directory containing `libpdfium`. If None, the current directory and
    /// then the system library path are tried.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Width in pixels of a rasterised preview page at 100 % zoom. Default: 600.
    pub preview_base_width: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.trim_end_matches('/').to_string(),
            timeout_secs: 10,
            session_dir: default_session_dir(),
            download_dir: PathBuf::from("."),
            pdfium_lib_path: None,
            preview_base_width: 600,
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
            base_url: None,
        }
    }

    /// Location of the persisted session file.
    pub fn session_file(&self) -> PathBuf {
        self.session_dir.join("session.json")
    }
}

fn default_session_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("subcruncher")
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
    base_url: Option<String>,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn session_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.session_dir = dir.into();
        self
    }

    pub fn download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.download_dir = dir.into();
        self
    }

    pub fn pdfium_lib_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(dir.into());
        self
    }

    pub fn preview_base_width(mut self, px: u32) -> Self {
        self.config.preview_base_width = px;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<ClientConfig, ConfigError> {
        if let Some(raw) = self.base_url.take() {
            self.config.base_url = parse_base_url(&raw)?;
        }
        let c = &self.config;
        if c.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(c.timeout_secs));
        }
        if !(100..=4000).contains(&c.preview_base_width) {
            return Err(ConfigError::InvalidPreviewWidth(c.preview_base_width));
        }
        Ok(self.config)
    }
}

/// Parse an origin, accepting a bare host (`example.com`) as `https://`.
fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let raw = raw.trim();
    let candidate = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };
    let url = Url::parse(&candidate).map_err(|e| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: "missing host".into(),
        });
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}
