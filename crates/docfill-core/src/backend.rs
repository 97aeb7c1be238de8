//! Pluggable document and PDF backends
//!
//! The extractor and filler never talk to a parsing library directly. They go
//! through the traits below, and the host decides at startup which
//! implementation is wired in:
//!
//! | Capability | Available backend | Fallback |
//! |------------|-------------------|----------|
//! | DOCX object model | [`crate::ooxml::OoxmlBackend`] (feature `ooxml`) | [`UnavailableDocumentBackend`] |
//! | PDF text | [`crate::pdf::LopdfBackend`] (feature `pdf`) | [`UnavailablePdfBackend`] |
//!
//! An unavailable backend answers every call with
//! [`DocfillError::MissingDependency`].

use std::fmt;
use std::sync::Arc;

use crate::error::DocfillError;

/// An opened word-processing document
pub trait DocumentModel {
    /// Text of each body paragraph, in document order
    fn paragraph_texts(&self) -> Vec<String>;

    /// Text of each cell of each body table, row-major
    fn table_cell_texts(&self) -> Vec<String>;

    /// Visit every fillable paragraph (body, headers, footers, table cells).
    ///
    /// `edit` receives the paragraph text and returns the replacement, or
    /// `None` to leave the paragraph alone. Returns how many paragraphs were
    /// rewritten.
    fn rewrite_paragraphs(&mut self, edit: &mut dyn FnMut(&str) -> Option<String>) -> usize;

    /// Serialize the (possibly modified) document to a fresh buffer
    fn save(&mut self) -> Result<Vec<u8>, DocfillError>;
}

/// Provider of the DOCX document object model
pub trait DocumentBackend: Send + Sync {
    /// Backend identifier
    fn name(&self) -> &'static str;

    /// Parse a DOCX buffer
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn DocumentModel>, DocfillError>;
}

/// Provider of PDF text extraction
pub trait PdfBackend: Send + Sync {
    /// Backend identifier
    fn name(&self) -> &'static str;

    /// Text of each page in page order; `None` for pages without text
    fn page_texts(&self, bytes: &[u8]) -> Result<Vec<Option<String>>, DocfillError>;
}

/// Stand-in used when no DOCX library is compiled in
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableDocumentBackend;

impl DocumentBackend for UnavailableDocumentBackend {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn open(&self, _bytes: &[u8]) -> Result<Box<dyn DocumentModel>, DocfillError> {
        Err(DocfillError::MissingDependency("DOCX".to_string()))
    }
}

/// Stand-in used when no PDF library is compiled in
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailablePdfBackend;

impl PdfBackend for UnavailablePdfBackend {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn page_texts(&self, _bytes: &[u8]) -> Result<Vec<Option<String>>, DocfillError> {
        Err(DocfillError::MissingDependency("PDF".to_string()))
    }
}

/// The pair of backends the core functions run against
#[derive(Clone)]
pub struct Backends {
    pub document: Arc<dyn DocumentBackend>,
    pub pdf: Arc<dyn PdfBackend>,
}

impl Backends {
    pub fn new(document: Arc<dyn DocumentBackend>, pdf: Arc<dyn PdfBackend>) -> Self {
        Self { document, pdf }
    }

    /// Both capabilities missing
    pub fn unavailable() -> Self {
        Self::new(
            Arc::new(UnavailableDocumentBackend),
            Arc::new(UnavailablePdfBackend),
        )
    }

    pub fn with_document(mut self, document: Arc<dyn DocumentBackend>) -> Self {
        self.document = document;
        self
    }

    pub fn with_pdf(mut self, pdf: Arc<dyn PdfBackend>) -> Self {
        self.pdf = pdf;
        self
    }
}

impl Default for Backends {
    /// Real backends for every compiled-in feature, stand-ins for the rest
    fn default() -> Self {
        #[cfg(feature = "ooxml")]
        let document: Arc<dyn DocumentBackend> = Arc::new(crate::ooxml::OoxmlBackend);
        #[cfg(not(feature = "ooxml"))]
        let document: Arc<dyn DocumentBackend> = Arc::new(UnavailableDocumentBackend);

        #[cfg(feature = "pdf")]
        let pdf: Arc<dyn PdfBackend> = Arc::new(crate::pdf::LopdfBackend);
        #[cfg(not(feature = "pdf"))]
        let pdf: Arc<dyn PdfBackend> = Arc::new(UnavailablePdfBackend);

        Self::new(document, pdf)
    }
}

impl fmt::Debug for Backends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backends")
            .field("document", &self.document.name())
            .field("pdf", &self.pdf.name())
            .finish()
    }
}
