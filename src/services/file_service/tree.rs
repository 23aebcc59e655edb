use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::access::{AccessLevel, AccessService};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder};
use std::collections::{HashMap, HashSet, VecDeque};

use super::FileService;

/// Matches the cap in the access checks; a move can never create a chain
/// this deep because cycles are rejected.
const MAX_TREE_DEPTH: usize = 64;

impl FileService {
    /// All folders the user can see: their own, folders granted to them,
    /// public folders, and every descendant of those. Returned flat and
    /// name-ordered; clients assemble the tree from `parent_id`.
    pub async fn visible_folders(&self, user_id: &str) -> Result<Vec<folders::Model>, AppError> {
        let all = Folders::find()
            .order_by_asc(folders::Column::Name)
            .all(&self.db)
            .await?;

        let granted: HashSet<String> = Shares::find()
            .filter(shares::Column::SharedWithUserId.eq(user_id))
            .filter(shares::Column::FolderId.is_not_null())
            .all(&self.db)
            .await?
            .into_iter()
            .filter_map(|s| s.folder_id)
            .collect();

        let mut children: HashMap<Option<String>, Vec<String>> = HashMap::new();
        for folder in &all {
            children
                .entry(folder.parent_id.clone())
                .or_default()
                .push(folder.id.clone());
        }

        let mut visible: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();

        for folder in &all {
            if folder.user_id == user_id || folder.is_public || granted.contains(&folder.id) {
                if visible.insert(folder.id.clone()) {
                    queue.push_back(folder.id.clone());
                }
            }
        }

        // Visibility flows down the tree
        while let Some(id) = queue.pop_front() {
            if let Some(kids) = children.get(&Some(id)) {
                for kid in kids {
                    if visible.insert(kid.clone()) {
                        queue.push_back(kid.clone());
                    }
                }
            }
        }

        Ok(all
            .into_iter()
            .filter(|f| visible.contains(&f.id))
            .collect())
    }

    /// Breadcrumb chain from the root down to `folder_id`. The target must
    /// be readable; the chain truncates at the first ancestor that is not.
    pub async fn folder_path(
        &self,
        user_id: &str,
        folder_id: &str,
    ) -> Result<Vec<folders::Model>, AppError> {
        let folder = Folders::find_by_id(folder_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound("Folder not found".to_string()))?;

        if !AccessService::can_access_folder(&self.db, user_id, &folder, AccessLevel::Read).await? {
            return Err(AppError::NotFound("Folder not found".to_string()));
        }

        let mut path = vec![folder.clone()];
        let mut current_id = folder.parent_id;
        let mut depth = 0;

        while let Some(id) = current_id {
            if depth >= MAX_TREE_DEPTH {
                break;
            }
            depth += 1;

            let Some(parent) = Folders::find_by_id(&id).one(&self.db).await? else {
                break;
            };
            if !AccessService::can_access_folder(&self.db, user_id, &parent, AccessLevel::Read)
                .await?
            {
                break;
            }

            current_id = parent.parent_id.clone();
            path.insert(0, parent);
        }

        Ok(path)
    }

    /// Resolve a client-supplied parent id. `None`, `"root"` and `"0"`
    /// mean the root; anything else must be a folder the user can write
    /// into. Invisible folders read as missing.
    pub async fn resolve_parent(
        &self,
        user_id: &str,
        parent_id: Option<String>,
    ) -> Result<Option<folders::Model>, AppError> {
        let id = match parent_id {
            None => return Ok(None),
            Some(id) if id == "root" || id == "0" => return Ok(None),
            Some(id) => id,
        };

        let folder = Folders::find_by_id(&id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound(
                "Parent folder not found or access denied".to_string(),
            ))?;

        if !AccessService::can_access_folder(&self.db, user_id, &folder, AccessLevel::Write).await?
        {
            return Err(AppError::NotFound(
                "Parent folder not found or access denied".to_string(),
            ));
        }

        Ok(Some(folder))
    }

    /// Reject a folder move that would place `folder` under itself or one
    /// of its descendants.
    pub async fn assert_no_cycle(
        &self,
        folder: &folders::Model,
        new_parent_id: &str,
    ) -> Result<(), AppError> {
        if new_parent_id == folder.id {
            return Err(AppError::BadRequest(
                "Cannot move a folder into itself".to_string(),
            ));
        }

        let mut current_id = Some(new_parent_id.to_string());
        let mut depth = 0;

        while let Some(id) = current_id {
            if depth >= MAX_TREE_DEPTH {
                break;
            }
            depth += 1;

            let Some(parent) = Folders::find_by_id(&id).one(&self.db).await? else {
                break;
            };
            if parent.id == folder.id {
                return Err(AppError::BadRequest(
                    "Cannot move a folder into its own subfolder".to_string(),
                ));
            }
            current_id = parent.parent_id;
        }

        Ok(())
    }

    /// Whether `filename` is already taken in the destination. Folder
    /// contents share one namespace; root is per-user.
    pub async fn file_name_taken(
        &self,
        user_id: &str,
        filename: &str,
        folder_id: Option<&str>,
        exclude_file_id: Option<&str>,
    ) -> Result<bool, AppError> {
        let mut cond = Condition::all().add(files::Column::Filename.eq(filename));
        match folder_id {
            Some(id) => {
                cond = cond.add(files::Column::FolderId.eq(id));
            }
            None => {
                cond = cond
                    .add(files::Column::FolderId.is_null())
                    .add(files::Column::UserId.eq(user_id));
            }
        }
        if let Some(id) = exclude_file_id {
            cond = cond.add(files::Column::Id.ne(id));
        }

        Ok(Files::find().filter(cond).one(&self.db).await?.is_some())
    }

    /// First free variant of `filename` in the destination: `name.ext`,
    /// then `name (2).ext`, `name (3).ext`, ...
    pub async fn available_name(
        &self,
        user_id: &str,
        filename: &str,
        folder_id: Option<&str>,
    ) -> Result<String, AppError> {
        if !self
            .file_name_taken(user_id, filename, folder_id, None)
            .await?
        {
            return Ok(filename.to_string());
        }

        let (stem, ext) = match filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), Some(ext.to_string())),
            _ => (filename.to_string(), None),
        };

        for n in 2..1000 {
            let candidate = match &ext {
                Some(ext) => format!("{} ({}).{}", stem, n, ext),
                None => format!("{} ({})", stem, n),
            };
            if !self
                .file_name_taken(user_id, &candidate, folder_id, None)
                .await?
            {
                return Ok(candidate);
            }
        }

        Err(AppError::Conflict(format!(
            "Could not find a free name for '{}'",
            filename
        )))
    }
}
