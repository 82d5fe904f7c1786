//! `POST /` — multipart upload/remove, dispatched on the `:action` field
//! (spec.md §4.I).
//!
//! Same handler shape as [`crate::handlers::simple`] (state read, then a
//! plain `Result<_, AppError>`); the multipart body itself is read through
//! axum's own `Multipart` extractor (its `multipart` Cargo feature is
//! already on in the teacher's dependency table's generalized form).

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::response::IntoResponse;

use crate::error::AppError;
use crate::urlutil::escape_html;
use crate::AppState;

/// One multipart field, collected eagerly. Small artifact set assumed (spec
/// budget, §2); no streaming-to-disk during the multipart read itself.
struct Fields {
    action: Option<String>,
    name: Option<String>,
    version: Option<String>,
    content_filename: Option<String>,
    content_bytes: Option<Vec<u8>>,
    signature_filename: Option<String>,
    signature_bytes: Option<Vec<u8>>,
}

async fn collect_fields(mut multipart: Multipart) -> Result<Fields, AppError> {
    let mut fields = Fields {
        action: None,
        name: None,
        version: None,
        content_filename: None,
        content_bytes: None,
        signature_filename: None,
        signature_bytes: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "content" => {
                fields.content_filename = field.file_name().map(|s| s.to_string());
                fields.content_bytes = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("reading upload body: {e}")))?
                        .to_vec(),
                );
            }
            "gpg_signature" => {
                fields.signature_filename = field.file_name().map(|s| s.to_string());
                fields.signature_bytes = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("reading signature body: {e}")))?
                        .to_vec(),
                );
            }
            ":action" => {
                fields.action = Some(
                    field.text().await.map_err(|e| AppError::BadRequest(format!(
                        "malformed ':action' field: {e}"
                    )))?,
                );
            }
            "name" => {
                fields.name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("malformed 'name' field: {e}")))?,
                );
            }
            "version" => {
                fields.version = Some(
                    field.text().await.map_err(|e| AppError::BadRequest(format!(
                        "malformed 'version' field: {e}"
                    )))?,
                );
            }
            _ => {
                let _ = field.bytes().await;
            }
        }
    }

    Ok(fields)
}

pub async fn upload_or_remove(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let fields = collect_fields(multipart).await?;

    let Some(action) = fields.action else {
        return Err(AppError::BadRequest("Missing ':action' field!".to_string()));
    };

    match action.as_str() {
        "file_upload" => handle_file_upload(state.as_ref(), fields).await,
        "remove_pkg" => handle_remove_pkg(state.as_ref(), fields),
        other => Err(AppError::BadRequest(format!(
            "Unsupported ':action' field: {}",
            escape_html(other)
        ))),
    }
}

async fn handle_file_upload(
    state: &AppState,
    fields: Fields,
) -> Result<impl IntoResponse, AppError> {
    let filename = fields
        .content_filename
        .ok_or_else(|| AppError::BadRequest("Missing 'content' file field!".to_string()))?;
    let data = fields.content_bytes.unwrap_or_default();
    state.catalog.upload(&filename, &data)?;

    // A detached signature uploaded alongside `content` is itself a
    // `.asc` artifact and gets its own entry on disk (spec.md §4.A's
    // signature kind), not just acknowledged and discarded.
    if let Some(sig_filename) = fields.signature_filename {
        let sig_data = fields.signature_bytes.unwrap_or_default();
        state.catalog.upload(&sig_filename, &sig_data)?;
    }

    Ok(axum::http::StatusCode::OK)
}

/// Render a present-but-possibly-empty field as its escaped value, and an
/// absent field as the literal text `None` — the two are distinct states a
/// client can send and must be distinguishable in the error message.
fn render_field(field: &Option<String>) -> String {
    match field {
        Some(s) => escape_html(s),
        None => "None".to_string(),
    }
}

fn handle_remove_pkg(state: &AppState, fields: Fields) -> Result<impl IntoResponse, AppError> {
    let name_missing = fields.name.as_deref().unwrap_or("").is_empty();
    let version_missing = fields.version.as_deref().unwrap_or("").is_empty();

    if name_missing || version_missing {
        return Err(AppError::BadRequest(format!(
            "Missing 'name'/'version' fields: name={}, version={}",
            render_field(&fields.name),
            render_field(&fields.version),
        )));
    }

    let name = fields.name.unwrap();
    let version = fields.version.unwrap();
    state.catalog.remove(&name, &version)?;
    Ok(axum::http::StatusCode::OK)
}
