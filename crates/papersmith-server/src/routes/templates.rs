//! Template registration route

use axum::{
    Router,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    routing::post,
};
use tracing::{debug, info};

use crate::{
    AppState,
    error::{ApiError, Result},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/templates", post(register_template))
}

/// Register a new template from a multipart form
///
/// Fields: `template` holds the name, `file` the template source.
async fn register_template(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<StatusCode> {
    let mut multipart = multipart.map_err(|e| ApiError::malformed(e.body_text()))?;
    let mut name = None;
    let mut content = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::malformed(format!("Invalid multipart body: {}", e)))?
    {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some("template") => {
                name = Some(field.text().await.map_err(|e| {
                    ApiError::malformed(format!("Failed to read 'template' field: {}", e))
                })?);
            }
            Some("file") => {
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::malformed(format!("Failed to read 'file' field: {}", e))
                })?;
                content = Some(
                    String::from_utf8(bytes.to_vec())
                        .map_err(|_| ApiError::malformed("Template file must be UTF-8"))?,
                );
            }
            other => debug!(field = ?other, "Ignoring unknown multipart field"),
        }
    }

    let name = name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::malformed("Missing 'template' field"))?;
    let content = content.ok_or_else(|| ApiError::malformed("Missing 'file' field"))?;

    info!(template = %name, bytes = content.len(), "Registering template");
    state.registry.register_template(&name, &content).await?;

    Ok(StatusCode::CREATED)
}
