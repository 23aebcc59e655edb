use crate::AppState;
use crate::entities::{files, folders};
use crate::services::thumbnail_service::ThumbnailService;
use chrono::{DateTime, Utc};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct ListFilesQuery {
    pub parent_id: Option<String>,
    pub search: Option<String>,
    /// "image", "video", "audio", "document", "archive" or "other"
    pub mime_class: Option<String>,
    pub min_size: Option<i64>,
    pub max_size: Option<i64>,
}

#[derive(Serialize)]
pub struct FileResponse {
    pub id: String,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub file_size: i64,
    pub folder_id: Option<String>,
    pub content_hash: String,
    pub is_shared: bool,
    pub download_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct FolderResponse {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub owner_id: String,
    pub is_public: bool,
    pub access_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct FolderTreeEntry {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateFolderRequest {
    pub name: String,
    pub parent_id: Option<String>,
    pub is_public: Option<bool>,
    pub access_type: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateFolderRequest {
    pub name: Option<String>,
    pub parent_id: Option<String>,
    pub is_public: Option<bool>,
    pub access_type: Option<String>,
}

#[derive(Deserialize)]
pub struct RenameFileRequest {
    pub name: Option<String>,
    pub folder_id: Option<String>,
}

#[derive(Deserialize)]
pub struct BulkMoveRequest {
    pub item_ids: Vec<String>,
    pub target_parent_id: Option<String>,
}

#[derive(Deserialize)]
pub struct BulkDeleteRequest {
    pub item_ids: Vec<String>,
}

impl FolderResponse {
    pub fn from_model(folder: folders::Model) -> Self {
        Self {
            id: folder.id,
            name: folder.name,
            parent_id: folder.parent_id,
            owner_id: folder.user_id,
            is_public: folder.is_public,
            access_type: folder.access_type,
            created_at: folder.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Build the response shape for a file, presigning fresh download and
/// thumbnail URLs. Presigning failures degrade to absent URLs.
pub async fn file_response(state: &AppState, file: files::Model, is_shared: bool) -> FileResponse {
    let disposition = format!(
        "attachment; filename*=UTF-8''{}",
        utf8_percent_encode(&file.filename, NON_ALPHANUMERIC)
    );

    let download_url = match state
        .storage
        .presigned_url(
            &file.storage_key,
            state.config.presign_expiry_secs,
            &disposition,
        )
        .await
    {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::warn!("Failed to presign download for {}: {}", file.id, e);
            None
        }
    };

    let thumbnail_url = if file.has_thumbnail {
        match state
            .storage
            .presigned_url(
                &ThumbnailService::thumbnail_key(&file.id),
                state.config.presign_expiry_secs,
                "inline",
            )
            .await
        {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("Failed to presign thumbnail for {}: {}", file.id, e);
                None
            }
        }
    } else {
        None
    };

    FileResponse {
        id: file.id,
        filename: file.filename,
        original_name: file.original_name,
        mime_type: file.mime_type,
        file_size: file.file_size,
        folder_id: file.folder_id,
        content_hash: file.content_hash,
        is_shared,
        download_url,
        thumbnail_url,
        created_at: file.created_at.unwrap_or_else(Utc::now),
        updated_at: file.updated_at,
    }
}
