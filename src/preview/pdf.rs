//! PDF previews: rasterise one page at a time via pdfium.
//!
//! pdfium wraps a C++ library with thread-local state, so every call here is
//! blocking and is expected to run inside `tokio::task::spawn_blocking` (see
//! [`super::Preview`]). The document bytes are kept in memory and reopened
//! for each render; pdfium documents borrow both the library handle and the
//! byte buffer, which makes them awkward to keep alive across awaits.

use super::{DocumentKind, DocumentRenderer, RenderedPage};
use crate::error::PreviewError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub struct PdfRenderer {
    bytes: Arc<Vec<u8>>,
    lib_path: Option<PathBuf>,
    base_width: u32,
    page_count: usize,
}

impl PdfRenderer {
    /// Open `bytes` once to discover the page count.
    pub fn open(
        bytes: Arc<Vec<u8>>,
        lib_path: Option<PathBuf>,
        base_width: u32,
    ) -> Result<Self, PreviewError> {
        let pdfium = bind_pdfium(lib_path.as_deref())?;
        let document = pdfium
            .load_pdf_from_byte_slice(&bytes, None)
            .map_err(|e| PreviewError::CorruptDocument {
                detail: format!("{:?}", e),
            })?;
        let page_count = document.pages().len() as usize;
        info!("PDF preview loaded: {} pages", page_count);
        drop(document);

        Ok(Self {
            bytes,
            lib_path,
            base_width,
            page_count,
        })
    }
}

impl DocumentRenderer for PdfRenderer {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Pdf
    }

    fn page_count(&self) -> usize {
        self.page_count
    }

    fn render_page(&self, index: usize, scale: f32) -> Result<RenderedPage, PreviewError> {
        if index >= self.page_count {
            return Err(PreviewError::PageOutOfRange {
                page: index + 1,
                total: self.page_count,
            });
        }

        let pdfium = bind_pdfium(self.lib_path.as_deref())?;
        let document = pdfium
            .load_pdf_from_byte_slice(&self.bytes, None)
            .map_err(|e| PreviewError::CorruptDocument {
                detail: format!("{:?}", e),
            })?;

        let page = document
            .pages()
            .get(index as u16)
            .map_err(|e| PreviewError::RenderFailed {
                page: index + 1,
                detail: format!("{:?}", e),
            })?;

        let width = (self.base_width as f32 * scale).round().max(1.0) as i32;
        let render_config = PdfRenderConfig::new().set_target_width(width);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| PreviewError::RenderFailed {
                page: index + 1,
                detail: format!("{:?}", e),
            })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered preview page {} → {}x{} px",
            index + 1,
            image.width(),
            image.height()
        );
        Ok(RenderedPage::Raster(image))
    }
}

/// Bind to libpdfium: the configured directory if any, otherwise the current
/// directory and then the system library path.
fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, PreviewError> {
    let bindings = match lib_path {
        Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| PreviewError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}
