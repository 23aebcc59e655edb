use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::access::{AccessLevel, AccessService};
use crate::services::audit::{AuditEventType, AuditService};
use crate::services::thumbnail_service::ThumbnailService;
use sea_orm::{ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter};

use super::FileService;

impl FileService {
    /// Delete a file. Owner only; readers get 403, everyone else 404.
    /// The object store cleanup is best-effort.
    pub async fn delete_file(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        let file = Files::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound("File not found".to_string()))?;

        if file.user_id != user_id {
            if AccessService::can_access_file(&self.db, user_id, &file, AccessLevel::Read).await? {
                return Err(AppError::Forbidden(
                    "Only the owner may delete a file".to_string(),
                ));
            }
            return Err(AppError::NotFound("File not found".to_string()));
        }

        let storage_key = file.storage_key.clone();
        let had_thumbnail = file.has_thumbnail;
        let file_id = file.id.clone();
        let filename = file.filename.clone();

        file.delete(&self.db).await?;

        if let Err(e) = self.storage.delete_file(&storage_key).await {
            tracing::warn!("Failed to delete object {}: {}", storage_key, e);
        }
        if had_thumbnail {
            let thumb_key = ThumbnailService::thumbnail_key(&file_id);
            if let Err(e) = self.storage.delete_file(&thumb_key).await {
                tracing::warn!("Failed to delete thumbnail {}: {}", thumb_key, e);
            }
        }

        AuditService::log(
            &self.db,
            AuditEventType::FileDelete,
            Some(user_id.to_string()),
            Some(file_id),
            Some(filename),
        )
        .await;

        Ok(())
    }

    /// Delete a folder. Owner only, and only when it holds no child
    /// folders and no files.
    pub async fn delete_folder(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        let folder = Folders::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound("Folder not found".to_string()))?;

        if folder.user_id != user_id {
            if AccessService::can_access_folder(&self.db, user_id, &folder, AccessLevel::Read)
                .await?
            {
                return Err(AppError::Forbidden(
                    "Only the owner may delete a folder".to_string(),
                ));
            }
            return Err(AppError::NotFound("Folder not found".to_string()));
        }

        let child_folders = Folders::find()
            .filter(folders::Column::ParentId.eq(&folder.id))
            .count(&self.db)
            .await?;
        let child_files = Files::find()
            .filter(files::Column::FolderId.eq(&folder.id))
            .count(&self.db)
            .await?;

        if child_folders > 0 || child_files > 0 {
            return Err(AppError::Conflict(
                "Folder is not empty; delete or move its contents first".to_string(),
            ));
        }

        let folder_id = folder.id.clone();
        let name = folder.name.clone();
        folder.delete(&self.db).await?;

        AuditService::log(
            &self.db,
            AuditEventType::FolderDelete,
            Some(user_id.to_string()),
            Some(folder_id),
            Some(name),
        )
        .await;

        Ok(())
    }
}
