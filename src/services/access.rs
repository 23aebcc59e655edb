use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter};

/// Guard against runaway parent chains (legacy data could contain a cycle
/// predating the move-time check).
const MAX_TREE_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    Read,
    Write,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Read => "read",
            AccessLevel::Write => "write",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "read" => Some(AccessLevel::Read),
            "write" => Some(AccessLevel::Write),
            _ => None,
        }
    }
}

/// Visibility checks for files and folders: ownership, direct grants, and
/// grants or public flags inherited from ancestor folders.
pub struct AccessService;

impl AccessService {
    /// Whether `user_id` may access `file` at `level`. Owners always may;
    /// others need a grant on the file or on an ancestor folder, or (for
    /// reads) a public ancestor.
    pub async fn can_access_file(
        db: &DatabaseConnection,
        user_id: &str,
        file: &files::Model,
        level: AccessLevel,
    ) -> Result<bool, AppError> {
        if file.user_id == user_id {
            return Ok(true);
        }

        if Self::grant_covers(db, user_id, Some(&file.id), None, level).await? {
            return Ok(true);
        }

        match &file.folder_id {
            Some(folder_id) => Self::chain_covers(db, user_id, folder_id, level).await,
            None => Ok(false),
        }
    }

    /// Whether `user_id` may access `folder` at `level`, checking the
    /// folder itself and then its ancestor chain.
    pub async fn can_access_folder(
        db: &DatabaseConnection,
        user_id: &str,
        folder: &folders::Model,
        level: AccessLevel,
    ) -> Result<bool, AppError> {
        if folder.user_id == user_id {
            return Ok(true);
        }
        Self::chain_covers(db, user_id, &folder.id, level).await
    }

    /// Walks `start_id` and its ancestors looking for anything that covers
    /// the requested level.
    async fn chain_covers(
        db: &DatabaseConnection,
        user_id: &str,
        start_id: &str,
        level: AccessLevel,
    ) -> Result<bool, AppError> {
        let mut current_id = Some(start_id.to_string());
        let mut depth = 0;

        while let Some(id) = current_id {
            if depth >= MAX_TREE_DEPTH {
                break;
            }
            depth += 1;

            let Some(folder) = Folders::find_by_id(&id).one(db).await? else {
                break;
            };

            if folder.user_id == user_id {
                return Ok(true);
            }
            if folder.is_public && level == AccessLevel::Read {
                return Ok(true);
            }
            if Self::grant_covers(db, user_id, None, Some(&folder.id), level).await? {
                return Ok(true);
            }

            current_id = folder.parent_id;
        }

        Ok(false)
    }

    /// Whether a direct grant on the given file or folder covers `level`.
    /// A write grant implies read.
    async fn grant_covers(
        db: &DatabaseConnection,
        user_id: &str,
        file_id: Option<&str>,
        folder_id: Option<&str>,
        level: AccessLevel,
    ) -> Result<bool, AppError> {
        let mut cond = Condition::all().add(shares::Column::SharedWithUserId.eq(user_id));
        if let Some(id) = file_id {
            cond = cond.add(shares::Column::FileId.eq(id));
        }
        if let Some(id) = folder_id {
            cond = cond.add(shares::Column::FolderId.eq(id));
        }

        let grant = Shares::find().filter(cond).one(db).await?;

        Ok(match grant {
            Some(grant) => match level {
                AccessLevel::Read => true,
                AccessLevel::Write => grant.access_level == AccessLevel::Write.as_str(),
            },
            None => false,
        })
    }
}
