use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::access::{AccessLevel, AccessService};
use crate::utils::validation::sanitize_filename;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};
use uuid::Uuid;

use super::types::*;

const ACCESS_TYPES: &[&str] = &["private", "shared", "public"];

pub async fn create_folder(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<crate::utils::auth::Claims>,
    Json(req): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<FolderResponse>), AppError> {
    let name = sanitize_filename(&req.name).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let parent = state
        .file_service
        .resolve_parent(&claims.sub, req.parent_id)
        .await?;

    let access_type = req.access_type.unwrap_or_else(|| "private".to_string());
    if !ACCESS_TYPES.contains(&access_type.as_str()) {
        return Err(AppError::BadRequest(format!(
            "access_type must be one of {:?}",
            ACCESS_TYPES
        )));
    }
    let is_public = req.is_public.unwrap_or(access_type == "public");

    let folder = folders::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        user_id: Set(claims.sub),
        name: Set(name),
        parent_id: Set(parent.map(|f| f.id)),
        is_public: Set(is_public),
        access_type: Set(access_type),
        created_at: Set(Some(Utc::now())),
        updated_at: Set(Some(Utc::now())),
    };
    let folder = folder.insert(&state.db).await?;

    Ok((StatusCode::CREATED, Json(FolderResponse::from_model(folder))))
}

/// Rename and/or move a folder; owners may also retune its visibility.
pub async fn update_folder(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<crate::utils::auth::Claims>,
    Path(id): Path<String>,
    Json(req): Json<UpdateFolderRequest>,
) -> Result<Json<FolderResponse>, AppError> {
    let folder = Folders::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("Folder not found".to_string()))?;

    if !AccessService::can_access_folder(&state.db, &claims.sub, &folder, AccessLevel::Write)
        .await?
    {
        return Err(AppError::NotFound("Folder not found".to_string()));
    }

    let is_owner = folder.user_id == claims.sub;
    if (req.is_public.is_some() || req.access_type.is_some()) && !is_owner {
        return Err(AppError::Forbidden(
            "Only the owner may change folder visibility".to_string(),
        ));
    }

    let mut active = folder.clone().into_active_model();

    if let Some(ref name) = req.name {
        let name = sanitize_filename(name).map_err(|e| AppError::BadRequest(e.to_string()))?;
        active.name = Set(name);
    }

    if let Some(parent_id) = req.parent_id {
        let parent = state
            .file_service
            .resolve_parent(&claims.sub, Some(parent_id))
            .await?;
        if let Some(ref parent) = parent {
            state.file_service.assert_no_cycle(&folder, &parent.id).await?;
        }
        active.parent_id = Set(parent.map(|f| f.id));
    }

    if let Some(access_type) = req.access_type {
        if !ACCESS_TYPES.contains(&access_type.as_str()) {
            return Err(AppError::BadRequest(format!(
                "access_type must be one of {:?}",
                ACCESS_TYPES
            )));
        }
        if req.is_public.is_none() {
            active.is_public = Set(access_type == "public");
        }
        active.access_type = Set(access_type);
    }
    if let Some(is_public) = req.is_public {
        active.is_public = Set(is_public);
    }

    active.updated_at = Set(Some(Utc::now()));
    let updated = active.update(&state.db).await?;

    Ok(Json(FolderResponse::from_model(updated)))
}

pub async fn delete_folder(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<crate::utils::auth::Claims>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.file_service.delete_folder(&claims.sub, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rename and/or move a file. Same-named destinations conflict; nothing
/// is overwritten.
pub async fn rename_file(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<crate::utils::auth::Claims>,
    Path(id): Path<String>,
    Json(req): Json<RenameFileRequest>,
) -> Result<Json<FileResponse>, AppError> {
    let file = Files::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("File not found".to_string()))?;

    if !AccessService::can_access_file(&state.db, &claims.sub, &file, AccessLevel::Write).await? {
        return Err(AppError::NotFound("File not found".to_string()));
    }

    let target_name = match req.name {
        Some(ref name) => sanitize_filename(name).map_err(|e| AppError::BadRequest(e.to_string()))?,
        None => file.filename.clone(),
    };

    let target_folder_id = match req.folder_id {
        Some(folder_id) => state
            .file_service
            .resolve_parent(&claims.sub, Some(folder_id))
            .await?
            .map(|f| f.id),
        None => file.folder_id.clone(),
    };

    if state
        .file_service
        .file_name_taken(
            &file.user_id,
            &target_name,
            target_folder_id.as_deref(),
            Some(&file.id),
        )
        .await?
    {
        return Err(AppError::Conflict(format!(
            "A file named '{}' already exists in the destination",
            target_name
        )));
    }

    let mut active = file.into_active_model();
    active.filename = Set(target_name);
    active.folder_id = Set(target_folder_id);
    active.updated_at = Set(Some(Utc::now()));
    let updated = active.update(&state.db).await?;

    Ok(Json(file_response(&state, updated, false).await))
}

pub async fn delete_file(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<crate::utils::auth::Claims>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.file_service.delete_file(&claims.sub, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn bulk_move(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<crate::utils::auth::Claims>,
    Json(req): Json<BulkMoveRequest>,
) -> Result<Json<crate::services::file_service::BulkOutcome>, AppError> {
    let outcome = state
        .file_service
        .bulk_move(&claims.sub, req.item_ids, req.target_parent_id)
        .await?;
    Ok(Json(outcome))
}

pub async fn bulk_delete(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<crate::utils::auth::Claims>,
    Json(req): Json<BulkDeleteRequest>,
) -> Result<Json<crate::services::file_service::BulkOutcome>, AppError> {
    let outcome = state
        .file_service
        .bulk_delete(&claims.sub, req.item_ids)
        .await?;
    Ok(Json(outcome))
}
