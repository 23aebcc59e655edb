use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::access::{AccessLevel, AccessService};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};

use super::{BulkOutcome, FileService};

impl FileService {
    /// Move a mixed list of file and folder ids into `target_parent_id`
    /// (root sentinels accepted). Items that are missing, not writable,
    /// name-conflicting or cycle-forming are skipped and reported, never
    /// fatal. A per-user lock serializes concurrent bulk mutations.
    pub async fn bulk_move(
        &self,
        user_id: &str,
        item_ids: Vec<String>,
        target_parent_id: Option<String>,
    ) -> Result<BulkOutcome, AppError> {
        let _lock = self.bulk_lock.lock(user_id).await;
        tracing::info!("🔒 Scoped lock acquired for bulk move by user {}", user_id);

        let target = self.resolve_parent(user_id, target_parent_id).await?;
        let target_id = target.as_ref().map(|f| f.id.clone());

        let mut processed = 0;
        let mut skipped = Vec::new();

        for id in item_ids {
            if self
                .move_one(user_id, &id, target_id.as_deref())
                .await?
            {
                processed += 1;
            } else {
                skipped.push(id);
            }
        }

        Ok(BulkOutcome { processed, skipped })
    }

    async fn move_one(
        &self,
        user_id: &str,
        id: &str,
        target_id: Option<&str>,
    ) -> Result<bool, AppError> {
        if let Some(file) = Files::find_by_id(id).one(&self.db).await? {
            if !AccessService::can_access_file(&self.db, user_id, &file, AccessLevel::Write).await?
            {
                return Ok(false);
            }
            if self
                .file_name_taken(&file.user_id, &file.filename, target_id, Some(&file.id))
                .await?
            {
                return Ok(false);
            }

            let mut active: files::ActiveModel = file.into();
            active.folder_id = Set(target_id.map(str::to_string));
            active.updated_at = Set(Some(Utc::now()));
            active.update(&self.db).await?;
            return Ok(true);
        }

        if let Some(folder) = Folders::find_by_id(id).one(&self.db).await? {
            if !AccessService::can_access_folder(&self.db, user_id, &folder, AccessLevel::Write)
                .await?
            {
                return Ok(false);
            }
            if let Some(target_id) = target_id {
                if self.assert_no_cycle(&folder, target_id).await.is_err() {
                    return Ok(false);
                }
            }

            let mut active: folders::ActiveModel = folder.into();
            active.parent_id = Set(target_id.map(str::to_string));
            active.updated_at = Set(Some(Utc::now()));
            active.update(&self.db).await?;
            return Ok(true);
        }

        Ok(false)
    }

    /// Delete a mixed list of file and folder ids. Owner-only; folders
    /// must be empty. Anything else is skipped and reported.
    pub async fn bulk_delete(
        &self,
        user_id: &str,
        item_ids: Vec<String>,
    ) -> Result<BulkOutcome, AppError> {
        let _lock = self.bulk_lock.lock(user_id).await;
        tracing::info!(
            "🔒 Scoped lock acquired for bulk delete by user {}",
            user_id
        );

        let mut processed = 0;
        let mut skipped = Vec::new();

        for id in item_ids {
            if self.delete_one(user_id, &id).await? {
                processed += 1;
            } else {
                skipped.push(id);
            }
        }

        Ok(BulkOutcome { processed, skipped })
    }

    async fn delete_one(&self, user_id: &str, id: &str) -> Result<bool, AppError> {
        if let Some(file) = Files::find_by_id(id).one(&self.db).await? {
            if file.user_id != user_id {
                return Ok(false);
            }
            return match self.delete_file(user_id, id).await {
                Ok(()) => Ok(true),
                Err(AppError::Database(e)) => Err(AppError::Database(e)),
                Err(_) => Ok(false),
            };
        }

        if let Some(folder) = Folders::find_by_id(id).one(&self.db).await? {
            if folder.user_id != user_id {
                return Ok(false);
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
                return Ok(false);
            }
            return match self.delete_folder(user_id, id).await {
                Ok(()) => Ok(true),
                Err(AppError::Database(e)) => Err(AppError::Database(e)),
                Err(_) => Ok(false),
            };
        }

        Ok(false)
    }
}
