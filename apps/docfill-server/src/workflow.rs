//! Template + base document flow
//!
//! Mirrors what the upload page does with two files: read the base document,
//! turn its `chave: valor` lines into values, and fill the template when it is
//! a DOCX. Problems along the way become notices for the user instead of
//! failing the whole request.

use docfill_core::{
    extension_tag, extract_text, parse_key_values, Backends, DocfillError, DocumentKind,
    FillReport, KeyValues, TemplateFiller, DOCX_MIME,
};
use serde::Serialize;
use tracing::{info, warn};

/// Download name of a filled template
pub const FILLED_FILE_NAME: &str = "template-preenchido.docx";

/// An uploaded file
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Lowercase suffix without the dot, e.g. `docx`
    pub fn tag(&self) -> String {
        extension_tag(&self.file_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A message shown to the user next to the result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilledDocument {
    pub file_name: &'static str,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
    pub report: FillReport,
}

/// Everything the flow produced for one pair of uploads
#[derive(Debug, Clone)]
pub struct Outcome {
    pub template_tag: String,
    pub base_tag: String,
    pub base_text: String,
    pub values: KeyValues,
    pub notices: Vec<Notice>,
    pub filled: Option<FilledDocument>,
}

impl Outcome {
    pub fn has_errors(&self) -> bool {
        self.notices.iter().any(|n| n.level == NoticeLevel::Error)
    }
}

pub fn run(backends: &Backends, template: &Upload, base: &Upload) -> Outcome {
    let template_tag = template.tag();
    let base_tag = base.tag();
    let mut notices = vec![Notice::new(
        NoticeLevel::Info,
        format!(
            "Template: {} ({}) | Base: {} ({})",
            template.file_name,
            template_tag.to_uppercase(),
            base.file_name,
            base_tag.to_uppercase()
        ),
    )];

    let base_text = match extract_text(backends, &base.bytes, &base_tag) {
        Ok(text) => text,
        Err(err @ DocfillError::MissingDependency(_)) => {
            warn!("Base document {} not read: {}", base.file_name, err);
            notices.push(Notice::new(
                NoticeLevel::Error,
                format!(
                    "Nao foi possivel ler o documento base: {}. Instale a dependencia e recarregue a pagina.",
                    err
                ),
            ));
            String::new()
        }
        Err(err) => {
            warn!("Base document {} not read: {}", base.file_name, err);
            notices.push(Notice::new(
                NoticeLevel::Error,
                format!("Erro ao ler o documento base: {}", err),
            ));
            String::new()
        }
    };

    let values = parse_key_values(&base_text);
    if values.is_empty() {
        notices.push(Notice::new(
            NoticeLevel::Warning,
            "Nao foram encontrados pares `chave: valor` no documento base. Verifique o arquivo enviado.",
        ));
    }

    let is_docx_template = matches!(DocumentKind::from_tag(&template_tag), Ok(DocumentKind::Docx));

    let mut filled = None;
    if !values.is_empty() && is_docx_template {
        match TemplateFiller::new(backends.clone()).fill_with_report(&template.bytes, &values) {
            Ok((bytes, report)) => {
                info!(
                    "Filled {}: {} paragraphs rewritten",
                    template.file_name, report.rewritten_paragraphs
                );
                notices.push(Notice::new(
                    NoticeLevel::Success,
                    "Template preenchido com sucesso! Faca o download abaixo.",
                ));
                filled = Some(FilledDocument {
                    file_name: FILLED_FILE_NAME,
                    mime_type: DOCX_MIME,
                    bytes,
                    report,
                });
            }
            Err(err @ DocfillError::MissingDependency(_)) => {
                notices.push(Notice::new(
                    NoticeLevel::Error,
                    format!(
                        "Nao foi possivel editar o template DOCX: {}. Instale a dependencia e recarregue a pagina.",
                        err
                    ),
                ));
            }
            Err(err) => {
                warn!("Filling {} failed: {}", template.file_name, err);
                notices.push(Notice::new(
                    NoticeLevel::Error,
                    format!("Ocorreu um erro ao preencher o template: {}", err),
                ));
            }
        }
    }

    if !is_docx_template {
        notices.push(Notice::new(
            NoticeLevel::Info,
            "No momento apenas templates DOCX podem ser alterados automaticamente. Voce ainda pode usar o texto extraido para atualizar o PDF manualmente.",
        ));
    }

    Outcome {
        template_tag,
        base_tag,
        base_text,
        values,
        notices,
        filled,
    }
}
