use crate::api::error::AppError;
use crate::entities::files;
use crate::services::audit::{AuditEventType, AuditService};
use crate::services::thumbnail_service::ThumbnailService;
use crate::utils::validation::{sanitize_filename, validate_file_size, validate_mime_type};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ModelTrait, Set};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::FileService;

impl FileService {
    /// Store an uploaded file: validate, write the row, then push the
    /// bytes to the object store (rolling the row back if that fails) and
    /// kick off thumbnail generation for raster images.
    pub async fn upload_file(
        &self,
        user_id: &str,
        folder_id: Option<String>,
        original_name: &str,
        declared_mime: Option<String>,
        data: Vec<u8>,
    ) -> Result<files::Model, AppError> {
        validate_file_size(data.len(), self.config.max_upload_size)
            .map_err(|e| AppError::PayloadTooLarge(e.to_string()))?;

        let sanitized =
            sanitize_filename(original_name).map_err(|e| AppError::BadRequest(e.to_string()))?;

        let parent = self.resolve_parent(user_id, folder_id).await?;
        let parent_id = parent.as_ref().map(|f| f.id.clone());

        // Trust magic bytes over the client's declared type
        let mime_type = infer::get(&data)
            .map(|kind| kind.mime_type().to_string())
            .or(declared_mime)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        validate_mime_type(&mime_type).map_err(|e| AppError::BadRequest(e.to_string()))?;

        let filename = self
            .available_name(user_id, &sanitized, parent_id.as_deref())
            .await?;

        let mut hasher = Sha256::new();
        hasher.update(&data);
        let content_hash = hex::encode(hasher.finalize());

        let id = Uuid::new_v4().to_string();
        let storage_key = format!("files/{}/{}", id, filename);

        let record = files::ActiveModel {
            id: Set(id.clone()),
            user_id: Set(user_id.to_string()),
            folder_id: Set(parent_id),
            original_name: Set(original_name.to_string()),
            filename: Set(filename.clone()),
            mime_type: Set(mime_type.clone()),
            file_size: Set(data.len() as i64),
            storage_key: Set(storage_key.clone()),
            content_hash: Set(content_hash),
            has_thumbnail: Set(false),
            created_at: Set(Some(Utc::now())),
            updated_at: Set(Some(Utc::now())),
        };
        let record = record.insert(&self.db).await?;

        if let Err(e) = self.storage.upload_file(&storage_key, data).await {
            // Roll the row back so no phantom file lingers
            let _ = record.clone().delete(&self.db).await;
            return Err(AppError::Internal(format!("Failed to store file: {}", e)));
        }

        AuditService::log(
            &self.db,
            AuditEventType::FileUpload,
            Some(user_id.to_string()),
            Some(record.id.clone()),
            Some(filename),
        )
        .await;

        if ThumbnailService::supports(&record.mime_type) {
            let db = self.db.clone();
            let storage = self.storage.clone();
            let file_id = record.id.clone();
            tokio::spawn(async move {
                let thumbnails = ThumbnailService::new(db, storage);
                if let Err(e) = thumbnails.generate_thumbnail(&file_id).await {
                    tracing::warn!("Thumbnail generation failed for {}: {}", file_id, e);
                }
            });
        }

        Ok(record)
    }
}
