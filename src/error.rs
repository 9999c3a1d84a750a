//! Error types for the subcruncher client.
//!
//! Each concern gets its own enum so callers can match on what actually went
//! wrong without string inspection:
//!
//! * [`ConfigError`]: builder validation rejected a value.
//! * [`ApiError`]: the backend could not be reached or answered non-2xx.
//! * [`AuthError`]: sign-in / sign-up failed; carries the message a user
//!   should see.
//! * [`StorageError`]: the persisted session file could not be read/written.
//! * [`WorkflowError`]: the conversion workflow rejected input or failed.
//! * [`PreviewError`]: the preview renderer could not open or draw a page.
//!
//! None of these are fatal to the process: every failure leaves the client in
//! an interactive state from which the user can retry.

use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Builder validation failures for [`crate::config::ClientConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Request timeout must be at least 1s, got {0}s")]
    InvalidTimeout(u64),

    #[error("Preview width must be 100–4000 px, got {0}")]
    InvalidPreviewWidth(u32),
}

/// Outbound HTTP failures.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered with a non-2xx status.
    #[error("HTTP {status} from {endpoint}{}", message_suffix(.message))]
    Status {
        endpoint: String,
        status: StatusCode,
        /// Server-supplied `message` field, when the body carried one.
        message: Option<String>,
    },

    /// The request exceeded the client's fixed timeout.
    #[error("Request to {endpoint} timed out after {secs}s")]
    Timeout { endpoint: String, secs: u64 },

    /// Connection refused, DNS failure, TLS failure, reset, …
    #[error("Could not reach {endpoint}: {reason}\nCheck your internet connection.")]
    Network { endpoint: String, reason: String },

    /// A 2xx body could not be decoded into the expected shape.
    #[error("Unexpected response body from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    #[error("Invalid endpoint '{path}': {reason}")]
    InvalidUrl { path: String, reason: String },
}

fn message_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

impl ApiError {
    /// The server-supplied message, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Failures of the auth endpoints.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Sign-in failed: {0}")]
    SignIn(#[source] ApiError),

    #[error("Sign-up failed: {0}")]
    SignUp(#[source] ApiError),
}

impl AuthError {
    pub const SIGN_IN_FALLBACK: &'static str = "Failed to sign in. Please try again.";
    pub const SIGN_UP_FALLBACK: &'static str = "Failed to sign up. Please try again.";

    /// Message to show the user: the server's own message when it sent one,
    /// otherwise a generic fallback.
    pub fn message(&self) -> String {
        let (source, fallback) = match self {
            AuthError::SignIn(e) => (e, Self::SIGN_IN_FALLBACK),
            AuthError::SignUp(e) => (e, Self::SIGN_UP_FALLBACK),
        };
        source
            .server_message()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

/// Failures of the client-side persisted state.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Session storage I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Session storage at '{path}' is not valid JSON: {source}")]
    Serde {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not serialise value for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures of the conversion workflow.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Client-side validation: wrong file type. Never reaches the backend.
    #[error("Please upload a valid .docx file")]
    InvalidFileType { name: String },

    #[error("Could not read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write converted file '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Nothing has been converted yet.
    #[error("No converted document is available")]
    NothingToDownload,

    #[error("Conversion failed: {0}")]
    Api(#[from] ApiError),
}

/// Failures of the preview renderer.
///
/// These are logged and leave the preview in its loading state; they are not
/// reported as conversion failures.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Unsupported document format (first bytes: {magic:?})")]
    UnsupportedFormat { magic: Vec<u8> },

    #[error("Document is corrupt: {detail}")]
    CorruptDocument { detail: String },

    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH to the directory containing libpdfium to enable PDF previews."
    )]
    PdfiumBindingFailed(String),

    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    #[error("Rendering failed for page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    #[error("Failed to write preview image '{path}': {detail}")]
    WriteFailed { path: PathBuf, detail: String },

    #[error("Internal error: {0}")]
    Internal(String),
}
