//! DOCX previews: paginated plain text from `word/document.xml`.
//!
//! Pages break where the document itself asks for one:
//!
//! * an explicit page break run (`<w:br w:type="page"/>`),
//! * a paragraph with `<w:pageBreakBefore/>`,
//! * a paragraph carrying a section break (`<w:sectPr>` in its properties).
//!
//! `<w:lastRenderedPageBreak/>` markers left by Word's own layout are ignored;
//! they describe a layout this renderer does not reproduce.
//!
//! Zoom changes the wrap width: at 200 % half as many columns fit.

use super::{DocumentKind, DocumentRenderer, RenderedPage};
use crate::error::PreviewError;
use roxmltree::Node;
use std::io::{Cursor, Read};
use tracing::{debug, info};

const DOCUMENT_PART: &str = "word/document.xml";
/// Columns per line at 100 % zoom.
pub const BASE_COLUMNS: usize = 80;

/// One paragraph of extracted text; soft line breaks are kept as `\n`.
type Paragraph = String;

pub struct DocxRenderer {
    pages: Vec<Vec<Paragraph>>,
}

impl DocxRenderer {
    pub fn open(bytes: &[u8]) -> Result<Self, PreviewError> {
        let corrupt = |detail: String| PreviewError::CorruptDocument { detail };

        let mut archive =
            zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| corrupt(e.to_string()))?;
        let mut part = archive
            .by_name(DOCUMENT_PART)
            .map_err(|e| corrupt(format!("{DOCUMENT_PART}: {e}")))?;
        let mut xml = String::new();
        part.read_to_string(&mut xml)
            .map_err(|e| corrupt(format!("{DOCUMENT_PART}: {e}")))?;

        let pages = paginate(&xml)?;
        info!("DOCX preview loaded: {} pages", pages.len());
        Ok(Self { pages })
    }

    /// Raw paragraphs per page.
    pub fn pages(&self) -> &[Vec<Paragraph>] {
        &self.pages
    }
}

impl DocumentRenderer for DocxRenderer {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Docx
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn render_page(&self, index: usize, scale: f32) -> Result<RenderedPage, PreviewError> {
        let page = self.pages.get(index).ok_or(PreviewError::PageOutOfRange {
            page: index + 1,
            total: self.pages.len(),
        })?;

        let columns = ((BASE_COLUMNS as f32 / scale).round() as usize).max(10);
        let mut lines = Vec::new();
        for paragraph in page {
            for segment in paragraph.split('\n') {
                if segment.trim().is_empty() {
                    lines.push(String::new());
                    continue;
                }
                lines.extend(
                    textwrap::wrap(segment, columns)
                        .into_iter()
                        .map(|l| l.into_owned()),
                );
            }
        }
        debug!("Rendered DOCX page {} at {} columns", index + 1, columns);
        Ok(RenderedPage::Text(lines))
    }
}

/// Split `document.xml` into pages of paragraphs.
fn paginate(xml: &str) -> Result<Vec<Vec<Paragraph>>, PreviewError> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| PreviewError::CorruptDocument {
        detail: format!("{DOCUMENT_PART}: {e}"),
    })?;

    let mut pages: Vec<Vec<Paragraph>> = vec![Vec::new()];

    let top_level_paragraphs = doc.descendants().filter(|n| {
        is(n, "p") && !n.ancestors().skip(1).any(|a| is(&a, "p"))
    });

    for p in top_level_paragraphs {
        let props = p.children().find(|c| is(c, "pPr"));
        let break_before = props.is_some_and(|pp| pp.children().any(|c| is(&c, "pageBreakBefore")));
        let section_end = props.is_some_and(|pp| pp.children().any(|c| is(&c, "sectPr")));

        if break_before && !current(&pages).is_empty() {
            pages.push(Vec::new());
        }

        let mut text = String::new();
        for node in p.descendants() {
            if node.ancestors().any(|a| is(&a, "Fallback") || is(&a, "pPr")) {
                continue;
            }
            match node.tag_name().name() {
                "t" if node.is_element() => text.push_str(node.text().unwrap_or("")),
                "tab" if node.is_element() => text.push('\t'),
                "br" | "cr" if node.is_element() => {
                    if node
                        .attributes()
                        .any(|a| a.name() == "type" && a.value() == "page")
                    {
                        if let Some(page) = pages.last_mut() {
                            page.push(std::mem::take(&mut text));
                        }
                        pages.push(Vec::new());
                    } else {
                        text.push('\n');
                    }
                }
                _ => {}
            }
        }
        if let Some(page) = pages.last_mut() {
            page.push(text);
        }

        if section_end {
            pages.push(Vec::new());
        }
    }

    // A trailing break leaves an empty page behind; drop it unless it's the only one.
    while pages.len() > 1 && pages.last().is_some_and(|p| p.iter().all(|l| l.is_empty())) {
        pages.pop();
    }
    Ok(pages)
}

fn is(node: &Node<'_, '_>, local_name: &str) -> bool {
    node.is_element() && node.tag_name().name() == local_name
}

fn current(pages: &[Vec<Paragraph>]) -> &[Paragraph] {
    pages.last().map(Vec::as_slice).unwrap_or(&[])
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    const NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;

    fn para(text: &str) -> String {
        format!("<w:p><w:r><w:t>{text}</w:t></w:r></w:p>")
    }

    fn page_break() -> &'static str {
        r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#
    }

    /// Build a minimal .docx in memory.
    pub(crate) fn docx_with_body(body: &str) -> Vec<u8> {
        let xml = format!(r#"<?xml version="1.0" encoding="UTF-8"?><w:document {NS}><w:body>{body}</w:body></w:document>"#);
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(DOCUMENT_PART, zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    pub(crate) fn three_page_docx() -> Vec<u8> {
        docx_with_body(&format!(
            "{}{}{}{}{}",
            para("Page one"),
            page_break(),
            para("Page two"),
            page_break(),
            para("Page three")
        ))
    }

    #[test]
    fn explicit_page_breaks_split_pages() {
        let r = DocxRenderer::open(&three_page_docx()).unwrap();
        assert_eq!(r.page_count(), 3);
        assert_eq!(r.pages()[0], vec!["Page one".to_string(), String::new()]);
        assert!(r.pages()[2].contains(&"Page three".to_string()));
    }

    #[test]
    fn single_paragraph_is_one_page() {
        let r = DocxRenderer::open(&docx_with_body(&para("Hello"))).unwrap();
        assert_eq!(r.page_count(), 1);
        match r.render_page(0, 1.0).unwrap() {
            RenderedPage::Text(lines) => assert_eq!(lines, vec!["Hello".to_string()]),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn page_break_before_and_section_breaks() {
        let body = format!(
            "{}<w:p><w:pPr><w:pageBreakBefore/></w:pPr><w:r><w:t>Two</w:t></w:r></w:p>\
             <w:p><w:pPr><w:sectPr/></w:pPr><w:r><w:t>Still two</w:t></w:r></w:p>{}",
            para("One"),
            para("Three")
        );
        let r = DocxRenderer::open(&docx_with_body(&body)).unwrap();
        assert_eq!(r.page_count(), 3);
        assert_eq!(r.pages()[1], vec!["Two".to_string(), "Still two".to_string()]);
    }

    #[test]
    fn last_rendered_page_break_is_ignored() {
        let body = r#"<w:p><w:r><w:lastRenderedPageBreak/><w:t>Same page</w:t></w:r></w:p>"#;
        let r = DocxRenderer::open(&docx_with_body(body)).unwrap();
        assert_eq!(r.page_count(), 1);
    }

    #[test]
    fn trailing_page_break_does_not_add_blank_page() {
        let body = format!("{}{}", para("Only"), page_break());
        let r = DocxRenderer::open(&docx_with_body(&body)).unwrap();
        assert_eq!(r.page_count(), 1);
    }

    #[test]
    fn zoom_narrows_wrap_width() {
        let long = "word ".repeat(60);
        let r = DocxRenderer::open(&docx_with_body(&para(long.trim()))).unwrap();
        let lines_at = |scale| match r.render_page(0, scale).unwrap() {
            RenderedPage::Text(lines) => lines.len(),
            _ => unreachable!(),
        };
        assert!(lines_at(2.0) > lines_at(1.0));
        assert!(lines_at(0.5) < lines_at(1.0));
    }

    #[test]
    fn out_of_range_page() {
        let r = DocxRenderer::open(&docx_with_body(&para("x"))).unwrap();
        assert!(matches!(
            r.render_page(5, 1.0),
            Err(PreviewError::PageOutOfRange { page: 6, total: 1 })
        ));
    }

    #[test]
    fn not_a_zip_is_corrupt() {
        let err = DocxRenderer::open(b"PK\x03\x04 definitely not a zip").err().unwrap();
        assert!(matches!(err, PreviewError::CorruptDocument { .. }));
    }
}
