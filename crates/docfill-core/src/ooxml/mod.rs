//! DOCX backend built on `zip` + `quick-xml`

mod document;
mod package;
mod paragraph;
mod xml;

pub use document::WordDocument;
pub use package::Package;
pub use paragraph::{paragraph_text, set_paragraph_text};
pub use xml::{XmlElement, XmlNode, XmlTree};

use crate::backend::{DocumentBackend, DocumentModel};
use crate::error::DocfillError;

/// Native Office Open XML backend
#[derive(Debug, Default, Clone, Copy)]
pub struct OoxmlBackend;

impl DocumentBackend for OoxmlBackend {
    fn name(&self) -> &'static str {
        "ooxml"
    }

    fn open(&self, bytes: &[u8]) -> Result<Box<dyn DocumentModel>, DocfillError> {
        Ok(Box::new(WordDocument::open(bytes)?))
    }
}
