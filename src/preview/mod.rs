//! Paginated, zoomable preview of a converted artifact.
//!
//! The artifact is either a PDF (rasterised by pdfium) or a DOCX (paginated
//! text). Its kind is decided from the leading bytes, not from any filename
//! or header the server sent.
//!
//! ## Why spawn_blocking?
//!
//! Both renderers do CPU-bound work (pdfium rasterisation, zip inflate and
//! XML parsing). [`Preview::load`] and [`Preview::render_current`] move that
//! work onto the blocking pool so the Tokio workers stay responsive.

pub mod docx;
pub mod pdf;
pub mod state;

pub use state::PreviewState;

use crate::config::ClientConfig;
use crate::error::PreviewError;
use image::{DynamicImage, ImageFormat};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const PDF_MAGIC: &[u8] = b"%PDF";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Identify a document from its leading bytes.
    pub fn sniff(bytes: &[u8]) -> Result<Self, PreviewError> {
        if bytes.starts_with(PDF_MAGIC) {
            Ok(Self::Pdf)
        } else if bytes.starts_with(ZIP_MAGIC) {
            Ok(Self::Docx)
        } else {
            Err(PreviewError::UnsupportedFormat {
                magic: bytes.iter().take(8).copied().collect(),
            })
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

/// One drawn page.
#[derive(Debug, Clone)]
pub enum RenderedPage {
    Raster(DynamicImage),
    Text(Vec<String>),
}

impl RenderedPage {
    /// Write the page to `path`: PNG for rasters, UTF-8 lines for text.
    pub fn write_to(&self, path: &Path) -> Result<(), PreviewError> {
        let write_failed = |detail: String| PreviewError::WriteFailed {
            path: path.to_path_buf(),
            detail,
        };
        match self {
            Self::Raster(image) => image
                .save_with_format(path, ImageFormat::Png)
                .map_err(|e| write_failed(e.to_string())),
            Self::Text(lines) => {
                let mut body = lines.join("\n");
                body.push('\n');
                std::fs::write(path, body).map_err(|e| write_failed(e.to_string()))
            }
        }
    }

    /// Lines to show in a terminal. Rasters get a one-line summary.
    pub fn display_lines(&self) -> Vec<String> {
        match self {
            Self::Raster(image) => vec![format!(
                "[page image {}x{} px]",
                image.width(),
                image.height()
            )],
            Self::Text(lines) => lines.clone(),
        }
    }
}

/// Something that can count and draw the pages of one document.
///
/// Implementations are blocking; [`Preview`] calls them on the blocking pool.
pub trait DocumentRenderer: Send + Sync {
    fn kind(&self) -> DocumentKind;

    fn page_count(&self) -> usize;

    /// Draw page `index` (0-based) at `scale` (1.0 = 100 %).
    fn render_page(&self, index: usize, scale: f32) -> Result<RenderedPage, PreviewError>;
}

/// Open `bytes` with the renderer matching their sniffed kind. Blocking.
pub fn open_renderer(
    bytes: Arc<Vec<u8>>,
    config: &ClientConfig,
) -> Result<Arc<dyn DocumentRenderer>, PreviewError> {
    match DocumentKind::sniff(&bytes)? {
        DocumentKind::Pdf => Ok(Arc::new(pdf::PdfRenderer::open(
            bytes,
            config.pdfium_lib_path.clone(),
            config.preview_base_width,
        )?)),
        DocumentKind::Docx => Ok(Arc::new(docx::DocxRenderer::open(&bytes)?)),
    }
}

/// A loaded document plus its page and zoom state.
pub struct Preview {
    renderer: Arc<dyn DocumentRenderer>,
    state: PreviewState,
}

impl std::fmt::Debug for Preview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preview")
            .field("kind", &self.renderer.kind())
            .field("state", &self.state)
            .finish()
    }
}

impl Preview {
    /// Sniff and open `bytes` on the blocking pool.
    pub async fn load(bytes: Arc<Vec<u8>>, config: &ClientConfig) -> Result<Self, PreviewError> {
        let config = config.clone();
        let renderer = tokio::task::spawn_blocking(move || open_renderer(bytes, &config))
            .await
            .map_err(|e| PreviewError::Internal(format!("Preview load task panicked: {}", e)))??;
        Ok(Self::with_renderer(renderer))
    }

    pub fn with_renderer(renderer: Arc<dyn DocumentRenderer>) -> Self {
        let state = PreviewState::new(renderer.page_count());
        Self { renderer, state }
    }

    pub fn kind(&self) -> DocumentKind {
        self.renderer.kind()
    }

    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut PreviewState {
        &mut self.state
    }

    /// Draw the current page at the current zoom.
    pub async fn render_current(&self) -> Result<RenderedPage, PreviewError> {
        let renderer = Arc::clone(&self.renderer);
        let index = self.state.current_page() - 1;
        let scale = self.state.scale();
        debug!("Rendering preview page {} at {:.1}x", index + 1, scale);

        tokio::task::spawn_blocking(move || renderer.render_page(index, scale))
            .await
            .map_err(|e| PreviewError::Internal(format!("Render task panicked: {}", e)))?
    }
}

/// What the preview pane currently shows.
#[derive(Debug, Default)]
pub enum PreviewStatus {
    /// Nothing converted yet.
    #[default]
    Empty,
    /// An artifact arrived but could not be rendered (or is still opening).
    Loading,
    Ready(Preview),
}

impl PreviewStatus {
    pub fn preview(&self) -> Option<&Preview> {
        match self {
            Self::Ready(p) => Some(p),
            _ => None,
        }
    }

    pub fn preview_mut(&mut self) -> Option<&mut Preview> {
        match self {
            Self::Ready(p) => Some(p),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_by_magic_bytes() {
        assert_eq!(DocumentKind::sniff(b"%PDF-1.7\n...").unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::sniff(b"PK\x03\x04rest").unwrap(), DocumentKind::Docx);
        let err = DocumentKind::sniff(b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, PreviewError::UnsupportedFormat { ref magic } if magic == b"<html>oo"));
        assert!(DocumentKind::sniff(b"").is_err());
    }

    #[tokio::test]
    async fn load_and_page_through_docx() {
        let bytes = Arc::new(docx::tests::three_page_docx());
        let mut preview = Preview::load(bytes, &ClientConfig::default()).await.unwrap();
        assert_eq!(preview.kind(), DocumentKind::Docx);
        assert_eq!(preview.state().total_pages(), 3);

        preview.state_mut().next_page();
        let page = preview.render_current().await.unwrap();
        assert!(page.display_lines().iter().any(|l| l == "Page two"));
    }

    #[tokio::test]
    async fn load_rejects_unknown_bytes() {
        let err = Preview::load(Arc::new(b"not a document".to_vec()), &ClientConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PreviewError::UnsupportedFormat { .. }));
    }

    #[test]
    fn text_page_writes_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.txt");
        RenderedPage::Text(vec!["a".into(), "b".into()])
            .write_to(&path)
            .unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "a\nb\n");
    }
}
