use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::access::{AccessLevel, AccessService};
use crate::services::share_service::ShareService;
use crate::utils::validation::mime_class;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder,
    sea_query::{Expr, Func},
};

use super::types::*;

/// Lists files either inside one folder (`parent_id`, default root) or as
/// a search over the caller's own tree. The two scopes never mix.
pub async fn list_files(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<crate::utils::auth::Claims>,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<Vec<FileResponse>>, AppError> {
    let search_mode = query.search.is_some()
        || query.mime_class.is_some()
        || query.min_size.is_some()
        || query.max_size.is_some();

    let mut cond = Condition::all();

    if search_mode {
        // Searches cover everything the caller owns, wherever it sits
        cond = cond.add(files::Column::UserId.eq(&claims.sub));

        if let Some(ref search) = query.search {
            cond = cond.add(
                Expr::expr(Func::lower(Expr::col(files::Column::Filename)))
                    .like(format!("%{}%", search.to_lowercase())),
            );
        }
        if let Some(min) = query.min_size {
            cond = cond.add(files::Column::FileSize.gte(min));
        }
        if let Some(max) = query.max_size {
            cond = cond.add(files::Column::FileSize.lte(max));
        }
    } else {
        match query.parent_id.as_deref() {
            None | Some("root") | Some("0") => {
                cond = cond
                    .add(files::Column::FolderId.is_null())
                    .add(files::Column::UserId.eq(&claims.sub));
            }
            Some(folder_id) => {
                let folder = Folders::find_by_id(folder_id)
                    .one(&state.db)
                    .await?
                    .ok_or(AppError::NotFound("Folder not found".to_string()))?;
                if !AccessService::can_access_folder(
                    &state.db,
                    &claims.sub,
                    &folder,
                    AccessLevel::Read,
                )
                .await?
                {
                    return Err(AppError::NotFound("Folder not found".to_string()));
                }
                cond = cond.add(files::Column::FolderId.eq(folder_id));
            }
        }
    }

    let items = Files::find()
        .filter(cond)
        .order_by_desc(files::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let mut result = Vec::new();
    for file in items {
        if let Some(ref class) = query.mime_class {
            if mime_class(&file.mime_type) != class.as_str() {
                continue;
            }
        }

        let is_shared = ShareService::file_has_shares(&state.db, &file.id)
            .await
            .unwrap_or(false);
        result.push(file_response(&state, file, is_shared).await);
    }

    Ok(Json(result))
}

/// Flat list of every folder the caller can see, for the sidebar tree.
pub async fn folder_tree(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<crate::utils::auth::Claims>,
) -> Result<Json<Vec<FolderTreeEntry>>, AppError> {
    let folders = state.file_service.visible_folders(&claims.sub).await?;

    let result: Vec<FolderTreeEntry> = folders
        .into_iter()
        .map(|f| FolderTreeEntry {
            id: f.id,
            name: f.name,
            parent_id: f.parent_id,
        })
        .collect();

    Ok(Json(result))
}

/// Breadcrumb chain for a folder, root first.
pub async fn folder_path(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<crate::utils::auth::Claims>,
    Path(id): Path<String>,
) -> Result<Json<Vec<FolderResponse>>, AppError> {
    let path = state.file_service.folder_path(&claims.sub, &id).await?;

    Ok(Json(
        path.into_iter().map(FolderResponse::from_model).collect(),
    ))
}
