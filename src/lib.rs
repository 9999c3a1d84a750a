//! # subcruncher
//!
//! Client library and terminal front end for the SubCruncher document
//! conversion service.
//!
//! Users sign in, pick a `.docx` file and a conversion mode, and get the
//! converted document back either as a paginated, zoomable preview or as a
//! file on disk. The conversion itself happens on the backend; this crate is
//! the client side: HTTP calls, session persistence, navigation rules and the
//! preview renderer.
//!
//! ## Flow Overview
//!
//! ```text
//! navigate(path)
//!  │
//!  ├─ RouteGuard        /dashboard needs a session, / goes to /login
//!  ├─ header policy     /login, /signup, /404 hide the chrome
//!  └─ Store::dispatch   pure reduce + explicit persistence effect
//!
//! convert(intent)
//!  │
//!  ├─ InFlightSlot      at most one request at a time
//!  ├─ ApiClient         POST /process/convert (multipart: file, mode)
//!  └─ preview | disk    pdfium / docx pagination, or converted_<name>
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use subcruncher::{App, ClientConfig, Credentials, ConvertIntent, FileSessionStorage, NoopNotifier};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::default();
//!     let storage = FileSessionStorage::new(config.session_file());
//!     let mut app = App::new(config, storage, Arc::new(NoopNotifier))?;
//!
//!     app.sign_in(&Credentials::new("me@example.com", "secret")).await?;
//!
//!     let workflow = app.workflow_mut();
//!     workflow.select_path("report.docx".as_ref()).await?;
//!     let outcome = workflow.convert(ConvertIntent::Download).await?;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `subcruncher` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! subcruncher = { version = "0.3", default-features = false }
//! ```
//!
//! PDF previews need a pdfium shared library at runtime. Point
//! [`ClientConfig::pdfium_lib_path`] at its directory, or install it where the
//! system loader finds it. DOCX previews have no native dependency.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod layout;
pub mod notify;
pub mod preview;
pub mod routing;
pub mod session;
pub mod store;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use api::ApiClient;
pub use app::{App, FormState};
pub use auth::{AuthResponse, AuthService, Credentials, SignupPayload};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{ApiError, AuthError, ConfigError, PreviewError, StorageError, WorkflowError};
pub use layout::{Layout, Screen};
pub use notify::{NoopNotifier, NotificationLevel, Notifier, RecordingNotifier, SharedNotifier};
pub use preview::{DocumentKind, DocumentRenderer, Preview, PreviewState, PreviewStatus, RenderedPage};
pub use routing::{header_visibility, Resolution, Route, RouteGuard, Visibility};
pub use session::{FileSessionStorage, MemorySessionStorage, SessionStorage};
pub use store::{Action, Store, UiState, User};
pub use workflow::{
    ConversionMode, ConversionWorkflow, ConvertIntent, ConvertOutcome, InFlightSlot, WorkflowState,
};
