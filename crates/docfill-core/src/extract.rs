//! Plain-text extraction from DOCX and PDF buffers

use tracing::debug;

use crate::backend::Backends;
use crate::error::DocfillError;
use crate::kind::DocumentKind;

/// Extracts the text of a document through the configured backends
#[derive(Debug, Clone, Default)]
pub struct TextExtractor {
    backends: Backends,
}

impl TextExtractor {
    pub fn new(backends: Backends) -> Self {
        Self { backends }
    }

    /// Extract text given a type tag such as `"docx"` or `".pdf"`
    pub fn extract(&self, bytes: &[u8], tag: &str) -> Result<String, DocfillError> {
        let kind = DocumentKind::from_tag(tag)?;
        self.extract_kind(bytes, kind)
    }

    pub fn extract_kind(&self, bytes: &[u8], kind: DocumentKind) -> Result<String, DocfillError> {
        let text = match kind {
            DocumentKind::Docx => self.extract_docx(bytes)?,
            DocumentKind::Pdf => self.extract_pdf(bytes)?,
        };
        debug!("Extracted {} chars from {} ({} bytes)", text.len(), kind, bytes.len());
        Ok(text)
    }

    /// Body paragraphs, then every table cell; empty strings dropped
    fn extract_docx(&self, bytes: &[u8]) -> Result<String, DocfillError> {
        let document = self.backends.document.open(bytes)?;

        let parts: Vec<String> = document
            .paragraph_texts()
            .into_iter()
            .chain(document.table_cell_texts())
            .filter(|text| !text.is_empty())
            .collect();

        Ok(parts.join("\n"))
    }

    /// Every page in order; a page without text contributes an empty line
    fn extract_pdf(&self, bytes: &[u8]) -> Result<String, DocfillError> {
        let pages = self.backends.pdf.page_texts(bytes)?;

        Ok(pages
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// Extract the text of `bytes`, interpreting it according to `tag`
pub fn extract_text(backends: &Backends, bytes: &[u8], tag: &str) -> Result<String, DocfillError> {
    TextExtractor::new(backends.clone()).extract(bytes, tag)
}
