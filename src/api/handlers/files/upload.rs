use crate::api::error::AppError;
use axum::{
    Extension, Json,
    extract::{Multipart, State},
    http::StatusCode,
};

use super::types::*;

/// Multipart upload: a `file` part plus an optional `folder_id` text part.
/// `folder_id` must precede `file` for it to take effect, which is how the
/// admin client sends it.
pub async fn upload_file(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<crate::utils::auth::Claims>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FileResponse>), AppError> {
    let mut folder_id: Option<String> = None;
    let mut uploaded: Option<crate::entities::files::Model> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string());
        match field_name.as_deref() {
            Some("folder_id") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid folder_id field: {}", e)))?;
                if !value.is_empty() {
                    folder_id = Some(value);
                }
            }
            Some("file") => {
                let original_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or(AppError::BadRequest("File part has no filename".to_string()))?;
                let declared_mime = field.content_type().map(|s| s.to_string());

                let data = field.bytes().await.map_err(|e| {
                    AppError::PayloadTooLarge(format!("Failed to read file body: {}", e))
                })?;

                let record = state
                    .file_service
                    .upload_file(
                        &claims.sub,
                        folder_id.clone(),
                        &original_name,
                        declared_mime,
                        data.to_vec(),
                    )
                    .await?;
                uploaded = Some(record);
            }
            _ => {}
        }
    }

    let record = uploaded.ok_or(AppError::BadRequest(
        "Multipart body is missing a 'file' part".to_string(),
    ))?;

    let is_shared = false; // brand new file, nothing granted yet
    Ok((
        StatusCode::CREATED,
        Json(file_response(&state, record, is_shared).await),
    ))
}
