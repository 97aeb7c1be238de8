//! API handlers for the docfill server
//!
//! Provides REST endpoints for:
//! - Text extraction with key/value preview
//! - The full template + base flow, as JSON
//! - Filled template download

use std::collections::HashMap;

use axum::{
    extract::{Multipart, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use docfill_core::{
    extract_text, parse_key_values, DocumentKind, FillReport, KeyValues, TemplateFiller,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ServerError;
use crate::workflow::{self, Notice, Upload, FILLED_FILE_NAME};
use crate::AppState;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Handler: GET /
pub async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub backends: BackendInfo,
}

#[derive(Serialize)]
pub struct BackendInfo {
    pub document: &'static str,
    pub pdf: &'static str,
}

/// Handler: GET /health
pub async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "docfill-server",
        version: env!("CARGO_PKG_VERSION"),
        backends: BackendInfo {
            document: state.backends.document.name(),
            pdf: state.backends.pdf.name(),
        },
    })
}

/// Extraction response
#[derive(Serialize)]
pub struct ExtractResponse {
    pub success: bool,
    pub kind: DocumentKind,
    pub text: String,
    pub pairs: KeyValues,
}

/// Handler: POST /api/extract
///
/// Multipart field `file`; the type comes from an optional `kind` field or
/// from the file name.
pub async fn handle_extract(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>, ServerError> {
    let mut fields = read_fields(multipart).await?;
    let file = take_field(&mut fields, "file")?;

    let tag = match fields.remove("kind") {
        Some(kind) => String::from_utf8_lossy(&kind.bytes).trim().to_string(),
        None => file.tag(),
    };
    let kind = DocumentKind::from_tag(&tag)?;
    info!("Extract request: {} ({}, {} bytes)", file.file_name, kind, file.bytes.len());

    let backends = state.backends.clone();
    let text = run_blocking(move || extract_text(&backends, &file.bytes, kind.extension())).await??;
    let pairs = parse_key_values(&text);

    Ok(Json(ExtractResponse {
        success: true,
        kind,
        text,
        pairs,
    }))
}

#[derive(Serialize)]
pub struct FileInfo {
    pub file_name: String,
    pub kind: String,
}

#[derive(Serialize)]
pub struct FilledInfo {
    pub file_name: &'static str,
    pub mime_type: &'static str,
    /// Base64-encoded DOCX
    pub data: String,
    pub report: FillReport,
}

/// Template + base flow response
#[derive(Serialize)]
pub struct ProcessResponse {
    pub success: bool,
    pub template: FileInfo,
    pub base: FileInfo,
    pub base_text: String,
    pub pairs: KeyValues,
    pub notices: Vec<Notice>,
    pub filled: Option<FilledInfo>,
}

/// Handler: POST /api/process
///
/// Runs the whole flow and reports problems as notices.
pub async fn handle_process(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ProcessResponse>, ServerError> {
    let (template, base) = read_pair(multipart).await?;
    info!(
        "Process request: template={}, base={}",
        template.file_name, base.file_name
    );

    let template_name = template.file_name.clone();
    let base_name = base.file_name.clone();
    let backends = state.backends.clone();
    let outcome = run_blocking(move || workflow::run(&backends, &template, &base)).await?;

    let filled = outcome.filled.as_ref().map(|doc| FilledInfo {
        file_name: doc.file_name,
        mime_type: doc.mime_type,
        data: STANDARD.encode(&doc.bytes),
        report: doc.report.clone(),
    });

    Ok(Json(ProcessResponse {
        success: !outcome.has_errors(),
        template: FileInfo {
            file_name: template_name,
            kind: outcome.template_tag,
        },
        base: FileInfo {
            file_name: base_name,
            kind: outcome.base_tag,
        },
        base_text: outcome.base_text,
        pairs: outcome.values,
        notices: outcome.notices,
        filled,
    }))
}

/// Handler: POST /api/fill
///
/// Strict variant of the flow that answers with the filled DOCX itself.
pub async fn handle_fill(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ServerError> {
    let (template, base) = read_pair(multipart).await?;

    if DocumentKind::from_tag(&template.tag())? != DocumentKind::Docx {
        return Err(ServerError::Unsupported(format!(
            "{}: only DOCX templates can be filled",
            template.file_name
        )));
    }
    let base_kind = DocumentKind::from_tag(&base.tag())?;

    let backends = state.backends.clone();
    let (bytes, report) = run_blocking(move || -> Result<_, ServerError> {
        let text = extract_text(&backends, &base.bytes, base_kind.extension())?;
        let values = parse_key_values(&text);
        if values.is_empty() {
            return Err(ServerError::NoValues);
        }
        Ok(TemplateFiller::new(backends).fill_with_report(&template.bytes, &values)?)
    })
    .await??;

    debug!(
        "Fill produced {} bytes, {} unresolved placeholders",
        bytes.len(),
        report.unresolved_placeholders.len()
    );

    Ok((
        [
            (header::CONTENT_TYPE, DocumentKind::Docx.mime_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", FILLED_FILE_NAME),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Run synchronous document work on the blocking pool
async fn run_blocking<T, F>(work: F) -> Result<T, ServerError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ServerError::Internal(format!("Worker task failed: {}", e)))
}

/// Collect every multipart field by name
async fn read_fields(mut multipart: Multipart) -> Result<HashMap<String, Upload>, ServerError> {
    let mut fields = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::InvalidRequest(format!("Failed to read upload: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| name.clone());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::InvalidRequest(format!("Failed to read field {}: {}", name, e)))?;

        debug!("Received field '{}' ({}, {} bytes)", name, file_name, bytes.len());
        fields.insert(name, Upload::new(file_name, bytes.to_vec()));
    }

    Ok(fields)
}

fn take_field(fields: &mut HashMap<String, Upload>, name: &'static str) -> Result<Upload, ServerError> {
    fields.remove(name).ok_or(ServerError::MissingField(name))
}

async fn read_pair(multipart: Multipart) -> Result<(Upload, Upload), ServerError> {
    let mut fields = read_fields(multipart).await?;
    let template = take_field(&mut fields, "template")?;
    let base = take_field(&mut fields, "base")?;
    Ok((template, base))
}
