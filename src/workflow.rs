//! Upload → convert → preview or download.
//!
//! ```text
//! Idle ──select──▶ FileSelected ──convert──▶ Converting ──ok──▶ Previewed | Downloaded
//!                       ▲                         │
//!                       └──────────failure────────┘
//! ```
//!
//! Selecting a new file from any state goes back to `FileSelected` and drops
//! the previous artifact. A failed request keeps the selected file so the user
//! can retry. Only one conversion may be in flight at a time; see
//! [`InFlightSlot`].

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::{ApiError, WorkflowError};
use crate::notify::{NotificationLevel, SharedNotifier};
use crate::preview::{Preview, PreviewStatus};
use reqwest::multipart::{Form, Part};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const CONVERT_PATH: &str = "/process/convert";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Inline error shown after a failed request.
pub const CONVERSION_FAILED: &str = "Conversion failed";

pub const TOAST_FILE_SELECTED: &str = "File selected successfully!";
pub const TOAST_CONVERTING: &str = "Converting file...";
pub const TOAST_CONVERTED: &str = "File converted successfully!";
pub const TOAST_CONVERT_FAILED: &str = "Failed to convert file";
pub const TOAST_DOWNLOADED: &str = "File downloaded!";
pub const TOAST_READ_FAILED: &str = "Could not read file";

/// Name used for the download when no file is selected any more.
const FALLBACK_NAME: &str = "document.docx";

// ── Conversion mode ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversionMode {
    /// L500 format to Chamber format.
    #[default]
    L500ToChamber,
    /// Chamber format to L500 format.
    ChamberToL500,
}

impl ConversionMode {
    /// Identifier sent in the `mode` form field.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::L500ToChamber => "l500_chamber",
            Self::ChamberToL500 => "chamber_l500",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::L500ToChamber => "L500 to Chamber",
            Self::ChamberToL500 => "Chamber to L500",
        }
    }
}

impl fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ConversionMode {
    type Err = String;

    /// Accepts `forward`/`reverse` as well as the wire names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" | "l500_chamber" => Ok(Self::L500ToChamber),
            "reverse" | "chamber_l500" => Ok(Self::ChamberToL500),
            other => Err(format!(
                "unknown conversion mode '{other}' (expected forward or reverse)"
            )),
        }
    }
}

// ── Inputs and outputs ──────────────────────────────────────────────────────

/// A user-chosen `.docx` file, held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    bytes: Arc<Vec<u8>>,
}

impl SelectedFile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// The backend's response body. Never persisted except by an explicit download.
#[derive(Debug, Clone)]
pub struct Artifact {
    bytes: Arc<Vec<u8>>,
    download_name: String,
}

impl Artifact {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// `converted_<original name>`.
    pub fn download_name(&self) -> &str {
        &self.download_name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertIntent {
    Preview,
    Download,
}

impl ConvertIntent {
    fn query(&self) -> [(&'static str, &'static str); 1] {
        match self {
            Self::Preview => [("preview", "true")],
            Self::Download => [("download", "true")],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    FileSelected,
    Converting,
    Previewed,
    Downloaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoFile,
    InFlight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertOutcome {
    /// The artifact is loaded for preview. `pages` is `None` when the renderer
    /// could not open it; the preview then stays in its loading state.
    Previewed { pages: Option<usize> },
    Downloaded { path: PathBuf },
    /// Nothing was sent.
    Skipped(SkipReason),
}

// ── In-flight guard ─────────────────────────────────────────────────────────

/// Single-slot token preventing overlapping conversions.
///
/// Clones share the slot. [`InFlightSlot::try_acquire`] hands out at most one
/// live [`InFlightGuard`]; dropping the guard frees the slot.
#[derive(Debug, Clone, Default)]
pub struct InFlightSlot(Arc<AtomicBool>);

impl InFlightSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<InFlightGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(Arc::clone(&self.0)))
    }

    pub fn is_held(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ── Workflow ────────────────────────────────────────────────────────────────

pub struct ConversionWorkflow {
    api: ApiClient,
    config: ClientConfig,
    notifier: SharedNotifier,
    slot: InFlightSlot,
    mode: ConversionMode,
    file: Option<SelectedFile>,
    artifact: Option<Artifact>,
    preview: PreviewStatus,
    state: WorkflowState,
    error: Option<String>,
}

impl ConversionWorkflow {
    pub fn new(api: ApiClient, config: ClientConfig, notifier: SharedNotifier) -> Self {
        Self {
            api,
            config,
            notifier,
            slot: InFlightSlot::new(),
            mode: ConversionMode::default(),
            file: None,
            artifact: None,
            preview: PreviewStatus::Empty,
            state: WorkflowState::Idle,
            error: None,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn mode(&self) -> ConversionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ConversionMode) {
        debug!("Conversion mode: {}", mode.wire_name());
        self.mode = mode;
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    /// Inline error for the dashboard, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn preview(&self) -> &PreviewStatus {
        &self.preview
    }

    pub fn preview_mut(&mut self) -> &mut PreviewStatus {
        &mut self.preview
    }

    /// A handle on the in-flight slot, shared with this workflow.
    pub fn in_flight(&self) -> InFlightSlot {
        self.slot.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.slot.is_held()
    }

    pub fn can_convert(&self) -> bool {
        self.file.is_some() && !self.slot.is_held()
    }

    /// Accept `name`/`bytes` as the file to convert.
    ///
    /// Anything not named `*.docx` is rejected locally: the inline error is
    /// set and the previous selection (if any) stays. Only the last path
    /// component of `name` is kept.
    pub fn select_file(
        &mut self,
        name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<&SelectedFile, WorkflowError> {
        let name = base_name(&name.into());
        if !has_docx_extension(&name) {
            let err = WorkflowError::InvalidFileType { name };
            warn!("Rejected file selection: {:?}", err);
            self.error = Some(err.to_string());
            return Err(err);
        }

        info!("Selected '{}' ({} bytes)", name, bytes.len());
        self.artifact = None;
        self.preview = PreviewStatus::Empty;
        self.error = None;
        self.state = WorkflowState::FileSelected;
        self.notifier
            .notify(NotificationLevel::Success, TOAST_FILE_SELECTED);

        Ok(self.file.insert(SelectedFile {
            name,
            bytes: Arc::new(bytes),
        }))
    }

    /// Read `path` from disk and select it.
    pub async fn select_path(&mut self, path: &Path) -> Result<&SelectedFile, WorkflowError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        // Validate before touching the disk.
        if !has_docx_extension(&name) {
            return self.select_file(name, Vec::new());
        }

        match tokio::fs::read(path).await {
            Ok(bytes) => self.select_file(name, bytes),
            Err(source) => {
                let err = WorkflowError::ReadFailed {
                    path: path.to_path_buf(),
                    source,
                };
                error!("{}", err);
                self.error = Some(err.to_string());
                self.notifier
                    .notify(NotificationLevel::Error, TOAST_READ_FAILED);
                Err(err)
            }
        }
    }

    /// Send the selected file to the backend.
    ///
    /// Returns [`ConvertOutcome::Skipped`] without any network traffic when no
    /// file is selected or a conversion is already running.
    pub async fn convert(&mut self, intent: ConvertIntent) -> Result<ConvertOutcome, WorkflowError> {
        let Some(file) = self.file.clone() else {
            debug!("Convert ignored: no file selected");
            return Ok(ConvertOutcome::Skipped(SkipReason::NoFile));
        };
        let Some(_guard) = self.slot.try_acquire() else {
            debug!("Convert ignored: a conversion is already in flight");
            return Ok(ConvertOutcome::Skipped(SkipReason::InFlight));
        };

        // ── Step 1: reset and announce ───────────────────────────────────────
        self.state = WorkflowState::Converting;
        self.error = None;
        self.artifact = None;
        self.preview = PreviewStatus::Empty;
        self.notifier.notify(NotificationLevel::Info, TOAST_CONVERTING);
        self.notifier.loading_started(TOAST_CONVERTING);

        // ── Step 2: request ──────────────────────────────────────────────────
        let response = self.request(&file, intent).await;
        self.notifier.loading_finished();

        let bytes = match response {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Conversion of '{}' failed: {}", file.name, e);
                self.fail();
                return Err(WorkflowError::Api(e));
            }
        };
        info!("Converted '{}' → {} bytes", file.name, bytes.len());

        let artifact = Artifact {
            bytes: Arc::new(bytes),
            download_name: format!("converted_{}", file.name),
        };

        // ── Step 3: hand the artifact to preview or disk ─────────────────────
        let outcome = match intent {
            ConvertIntent::Preview => {
                self.preview = load_preview(&artifact, &self.config).await;
                self.state = WorkflowState::Previewed;
                ConvertOutcome::Previewed {
                    pages: self
                        .preview
                        .preview()
                        .map(|p| p.state().total_pages()),
                }
            }
            ConvertIntent::Download => {
                let dir = self.config.download_dir.clone();
                match write_artifact(&artifact, &dir).await {
                    Ok(path) => {
                        self.state = WorkflowState::Downloaded;
                        ConvertOutcome::Downloaded { path }
                    }
                    Err(e) => {
                        error!("{}", e);
                        self.fail();
                        return Err(e);
                    }
                }
            }
        };

        self.artifact = Some(artifact);
        self.notifier.notify(NotificationLevel::Success, TOAST_CONVERTED);
        Ok(outcome)
    }

    /// Save the last converted artifact into `dir` without another request.
    pub async fn download(&mut self, dir: &Path) -> Result<PathBuf, WorkflowError> {
        let artifact = self
            .artifact
            .as_ref()
            .ok_or(WorkflowError::NothingToDownload)?;
        let path = write_artifact(artifact, dir).await?;
        self.notifier.notify(NotificationLevel::Success, TOAST_DOWNLOADED);
        Ok(path)
    }

    /// Forget the selection, the artifact and any error.
    pub fn clear(&mut self) {
        self.file = None;
        self.artifact = None;
        self.preview = PreviewStatus::Empty;
        self.error = None;
        self.state = WorkflowState::Idle;
    }

    async fn request(&self, file: &SelectedFile, intent: ConvertIntent) -> Result<Vec<u8>, ApiError> {
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(DOCX_MIME)
            .map_err(|e| ApiError::Decode {
                endpoint: CONVERT_PATH.to_string(),
                reason: e.to_string(),
            })?;
        let form = Form::new()
            .part("file", part)
            .text("mode", self.mode.wire_name());

        self.api
            .post_multipart(CONVERT_PATH, &intent.query(), form)
            .await
    }

    fn fail(&mut self) {
        self.notifier
            .notify(NotificationLevel::Error, TOAST_CONVERT_FAILED);
        self.error = Some(CONVERSION_FAILED.to_string());
        self.state = if self.file.is_some() {
            WorkflowState::FileSelected
        } else {
            WorkflowState::Idle
        };
    }
}

/// Open the artifact for preview. Failures are logged and leave the preview
/// in [`PreviewStatus::Loading`].
async fn load_preview(artifact: &Artifact, config: &ClientConfig) -> PreviewStatus {
    match Preview::load(Arc::clone(&artifact.bytes), config).await {
        Ok(preview) => PreviewStatus::Ready(preview),
        Err(e) => {
            warn!("Preview unavailable: {}", e);
            PreviewStatus::Loading
        }
    }
}

/// Matches the browser file picker's filter: exact, lower-case `.docx`.
fn has_docx_extension(name: &str) -> bool {
    name.ends_with(".docx")
}

fn base_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Atomic write: temp file in `dir`, then rename to the final name.
async fn write_artifact(artifact: &Artifact, dir: &Path) -> Result<PathBuf, WorkflowError> {
    let name = if artifact.download_name.is_empty() {
        format!("converted_{FALLBACK_NAME}")
    } else {
        artifact.download_name.clone()
    };
    let path = dir.join(&name);
    let write_failed = |source| WorkflowError::WriteFailed {
        path: path.clone(),
        source,
    };

    tokio::fs::create_dir_all(dir).await.map_err(write_failed)?;

    let tmp_path = dir.join(format!(".{name}.tmp"));
    tokio::fs::write(&tmp_path, artifact.bytes())
        .await
        .map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(write_failed)?;

    info!("Saved {} ({} bytes)", path.display(), artifact.bytes.len());
    Ok(path)
}
