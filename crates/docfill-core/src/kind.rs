//! Document kinds and type-tag inference

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::DocfillError;

/// MIME type of a Word document
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// MIME type of a PDF document
pub const PDF_MIME: &str = "application/pdf";

/// The two document formats understood by the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Docx,
    Pdf,
}

impl DocumentKind {
    /// Parse a type tag such as `"docx"`, `".PDF"` or `"Pdf"`
    pub fn from_tag(tag: &str) -> Result<Self, DocfillError> {
        let normalized = normalize_tag(tag);
        match normalized.as_str() {
            "docx" => Ok(DocumentKind::Docx),
            "pdf" => Ok(DocumentKind::Pdf),
            _ => Err(DocfillError::UnsupportedFormat(tag.to_string())),
        }
    }

    /// Infer the kind from a file name's suffix
    pub fn from_file_name(file_name: &str) -> Result<Self, DocfillError> {
        Self::from_tag(&extension_tag(file_name))
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentKind::Docx => "docx",
            DocumentKind::Pdf => "pdf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentKind::Docx => DOCX_MIME,
            DocumentKind::Pdf => PDF_MIME,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for DocumentKind {
    type Err = DocfillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s)
    }
}

/// Type tag of a file name: the last suffix, lowercased, without the dot.
///
/// Returns an empty string when the name has no suffix. Dotfiles such as
/// `.docx` have no suffix, matching how paths usually treat them.
pub fn extension_tag(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);

    match base.rfind('.') {
        Some(0) | None => String::new(),
        Some(idx) => base[idx + 1..].to_lowercase(),
    }
}

fn normalize_tag(tag: &str) -> String {
    let trimmed = tag.trim();
    trimmed.strip_prefix('.').unwrap_or(trimmed).to_lowercase()
}
