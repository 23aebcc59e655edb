use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::access::AccessLevel;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

pub struct ShareService;

impl ShareService {
    /// Grant `level` on one file or folder to another user. Only the owner
    /// may grant; re-granting to the same user updates the level in place.
    pub async fn create_share(
        db: &DatabaseConnection,
        created_by: &str,
        file_id: Option<String>,
        folder_id: Option<String>,
        shared_with_user_id: String,
        level: AccessLevel,
    ) -> Result<shares::Model, AppError> {
        if file_id.is_some() == folder_id.is_some() {
            return Err(AppError::BadRequest(
                "Exactly one of file_id and folder_id must be set".to_string(),
            ));
        }
        if shared_with_user_id == created_by {
            return Err(AppError::BadRequest(
                "Cannot share an item with yourself".to_string(),
            ));
        }

        // Subject must exist and belong to the grantor
        if let Some(ref id) = file_id {
            Files::find_by_id(id)
                .filter(files::Column::UserId.eq(created_by))
                .one(db)
                .await?
                .ok_or(AppError::NotFound(
                    "File not found or access denied".to_string(),
                ))?;
        }
        if let Some(ref id) = folder_id {
            Folders::find_by_id(id)
                .filter(folders::Column::UserId.eq(created_by))
                .one(db)
                .await?
                .ok_or(AppError::NotFound(
                    "Folder not found or access denied".to_string(),
                ))?;
        }

        Users::find_by_id(&shared_with_user_id)
            .one(db)
            .await?
            .ok_or(AppError::NotFound("Target user not found".to_string()))?;

        let mut cond = Condition::all().add(shares::Column::SharedWithUserId.eq(&shared_with_user_id));
        cond = match (&file_id, &folder_id) {
            (Some(id), _) => cond.add(shares::Column::FileId.eq(id)),
            (_, Some(id)) => cond.add(shares::Column::FolderId.eq(id)),
            _ => unreachable!(),
        };

        if let Some(existing) = Shares::find().filter(cond).one(db).await? {
            let mut active: shares::ActiveModel = existing.into();
            active.access_level = Set(level.as_str().to_string());
            return Ok(active.update(db).await?);
        }

        let share = shares::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            file_id: Set(file_id),
            folder_id: Set(folder_id),
            created_by: Set(created_by.to_string()),
            shared_with_user_id: Set(shared_with_user_id),
            access_level: Set(level.as_str().to_string()),
            created_at: Set(Some(Utc::now())),
        };

        Ok(share.insert(db).await?)
    }

    /// Grants the user created, optionally narrowed to one subject.
    pub async fn list_created(
        db: &DatabaseConnection,
        user_id: &str,
        file_id: Option<String>,
        folder_id: Option<String>,
    ) -> Result<Vec<shares::Model>, AppError> {
        let mut cond = Condition::all().add(shares::Column::CreatedBy.eq(user_id));
        if let Some(id) = file_id {
            cond = cond.add(shares::Column::FileId.eq(id));
        }
        if let Some(id) = folder_id {
            cond = cond.add(shares::Column::FolderId.eq(id));
        }

        Ok(Shares::find()
            .filter(cond)
            .order_by_desc(shares::Column::CreatedAt)
            .all(db)
            .await?)
    }

    /// Revoke a grant; only its creator may.
    pub async fn revoke(
        db: &DatabaseConnection,
        share_id: &str,
        user_id: &str,
    ) -> Result<(), AppError> {
        let share = Shares::find_by_id(share_id)
            .filter(shares::Column::CreatedBy.eq(user_id))
            .one(db)
            .await?
            .ok_or(AppError::NotFound("Share not found".to_string()))?;

        let share: shares::ActiveModel = share.into();
        share.delete(db).await?;
        Ok(())
    }

    /// Files other users granted to `user_id`, with the grant rows.
    pub async fn files_shared_with(
        db: &DatabaseConnection,
        user_id: &str,
    ) -> Result<Vec<(shares::Model, files::Model)>, AppError> {
        let rows = Shares::find()
            .filter(shares::Column::SharedWithUserId.eq(user_id))
            .filter(shares::Column::FileId.is_not_null())
            .find_also_related(Files)
            .order_by_desc(shares::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(share, file)| file.map(|f| (share, f)))
            .collect())
    }

    /// Folders other users granted to `user_id`, with the grant rows.
    pub async fn folders_shared_with(
        db: &DatabaseConnection,
        user_id: &str,
    ) -> Result<Vec<(shares::Model, folders::Model)>, AppError> {
        let rows = Shares::find()
            .filter(shares::Column::SharedWithUserId.eq(user_id))
            .filter(shares::Column::FolderId.is_not_null())
            .find_also_related(Folders)
            .order_by_desc(shares::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(share, folder)| folder.map(|f| (share, f)))
            .collect())
    }

    /// Whether any grant exists on the given file.
    pub async fn file_has_shares(
        db: &DatabaseConnection,
        file_id: &str,
    ) -> Result<bool, AppError> {
        use sea_orm::PaginatorTrait;
        let count = Shares::find()
            .filter(shares::Column::FileId.eq(file_id))
            .count(db)
            .await?;
        Ok(count > 0)
    }
}
