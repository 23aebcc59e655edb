use crate::api::error::AppError;
use crate::entities::prelude::*;
use crate::services::access::{AccessLevel, AccessService};
use crate::services::share_service::ShareService;
use axum::{
    Extension, Json,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::Response,
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use sea_orm::EntityTrait;
use tokio_util::io::ReaderStream;

use super::types::*;

/// File metadata with fresh presigned URLs.
pub async fn get_file(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<crate::utils::auth::Claims>,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, AppError> {
    let file = Files::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("File not found".to_string()))?;

    if !AccessService::can_access_file(&state.db, &claims.sub, &file, AccessLevel::Read).await? {
        return Err(AppError::NotFound("File not found".to_string()));
    }

    let is_shared = ShareService::file_has_shares(&state.db, &file.id).await?;
    Ok(Json(file_response(&state, file, is_shared).await))
}

/// Streams the object bytes as an attachment.
pub async fn download_file(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<crate::utils::auth::Claims>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let file = Files::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("File not found".to_string()))?;

    if !AccessService::can_access_file(&state.db, &claims.sub, &file, AccessLevel::Read).await? {
        return Err(AppError::NotFound("File not found".to_string()));
    }

    let output = state
        .storage
        .get_object_stream(&file.storage_key)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to read object: {}", e)))?;

    let disposition = format!(
        "attachment; filename*=UTF-8''{}",
        utf8_percent_encode(&file.filename, NON_ALPHANUMERIC)
    );

    let stream = ReaderStream::new(output.body.into_async_read());
    let body = Body::from_stream(stream);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, file.mime_type.clone())
        .header(header::CONTENT_LENGTH, file.file_size)
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}
