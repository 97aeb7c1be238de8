//! Text extraction, key/value parsing and placeholder filling for DOCX/PDF
//!
//! The three pieces compose into one flow:
//! - [`extract_text`]: plain text of a DOCX or PDF buffer
//! - [`parse_key_values`]: `key: value` lines into a [`KeyValues`] mapping
//! - [`fill_template`]: replace `{{key}}` markers in a DOCX template
//!
//! Parsing libraries sit behind the traits in [`backend`]; [`Backends::default`]
//! wires whatever the `ooxml` and `pdf` features compiled in.

pub mod backend;
pub mod error;
pub mod extract;
pub mod fill;
pub mod keyvalue;
pub mod kind;
pub mod placeholder;

#[cfg(feature = "ooxml")]
pub mod ooxml;
#[cfg(feature = "pdf")]
pub mod pdf;

#[cfg(all(feature = "ooxml", any(test, feature = "test-fixtures")))]
pub mod fixtures;

pub use backend::{Backends, DocumentBackend, DocumentModel, PdfBackend};
pub use error::DocfillError;
pub use extract::{extract_text, TextExtractor};
pub use fill::{fill_template, FillReport, TemplateFiller};
pub use keyvalue::{parse_key_values, KeyValues};
pub use kind::{extension_tag, DocumentKind, DOCX_MIME, PDF_MIME};
pub use placeholder::{find_placeholders, placeholder};

/// Extract text with the default backends
pub fn extract(bytes: &[u8], tag: &str) -> Result<String, DocfillError> {
    extract_text(&Backends::default(), bytes, tag)
}

/// Fill a DOCX template with the default backends
pub fn fill(template: &[u8], values: &KeyValues) -> Result<Vec<u8>, DocfillError> {
    fill_template(&Backends::default(), template, values)
}
