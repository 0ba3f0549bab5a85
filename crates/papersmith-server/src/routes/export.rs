//! Document export route

use axum::{
    Json, Router,
    body::Body,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, header},
    response::Response,
    routing::post,
};
use std::time::Instant;
use tracing::{debug, info};

use crate::{
    AppState,
    error::{ApiError, Result},
    models::ExportRequest,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/export", post(export_document))
}

/// Render a registered template with the request data and return the PDF
async fn export_document(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload.map_err(|e| ApiError::malformed(e.body_text()))?;
    let started = Instant::now();

    let template = state
        .registry
        .resolve_for_rendering(&request.template)
        .await?;

    let html = template.render(&request.data)?;
    debug!(template = %request.template, html_len = html.len(), "Template rendered");

    let pdf = state.renderer.render_pdf(&html).await?;

    info!(
        template = %request.template,
        renderer = state.renderer.name(),
        pdf_bytes = pdf.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Exported document"
    );

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename={}",
        sanitize_file_name(&request.file_name)
    ))
    .map_err(|_| ApiError::malformed("Invalid file_name"))?;

    Response::builder()
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CONTENT_LENGTH, pdf.len())
        .body(Body::from(pdf))
        .map_err(|e| ApiError::internal(e.to_string()))
}

/// Make `file_name` safe to embed in a Content-Disposition header
fn sanitize_file_name(file_name: &str) -> String {
    let cleaned: String = file_name
        .trim()
        .chars()
        .map(|c| match c {
            '"' | ';' | '\\' | '/' => '_',
            c if c.is_control() || !c.is_ascii() => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() {
        "document.pdf".to_string()
    } else {
        cleaned
    }
}
