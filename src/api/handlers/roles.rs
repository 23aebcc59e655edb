use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::permission_service::{PermissionService, keys};
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// ── Request / Response Types ──────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    #[validate(length(max = 250))]
    pub description: Option<String>,
    #[serde(default)]
    pub permission_keys: Vec<String>,
}

#[derive(Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1, max = 64))]
    pub name: Option<String>,
    #[validate(length(max = 250))]
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct SetRolePermissionsRequest {
    pub permission_keys: Vec<String>,
}

#[derive(Serialize)]
pub struct PermissionResponse {
    pub id: String,
    pub key: String,
    pub description: Option<String>,
}

#[derive(Serialize)]
pub struct RoleResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_system: bool,
    pub permission_keys: Vec<String>,
    pub created_at: DateTime<Utc>,
}

fn role_response(role: roles::Model, permissions: Vec<permissions::Model>) -> RoleResponse {
    let mut permission_keys: Vec<String> = permissions.into_iter().map(|p| p.key).collect();
    permission_keys.sort();

    RoleResponse {
        id: role.id,
        name: role.name,
        description: role.description,
        is_system: role.is_system,
        permission_keys,
        created_at: role.created_at.unwrap_or_else(Utc::now),
    }
}

async fn resolve_permission_ids(
    db: &sea_orm::DatabaseConnection,
    keys: &[String],
) -> Result<Vec<String>, AppError> {
    let mut ids = Vec::with_capacity(keys.len());
    for key in keys {
        let permission = Permissions::find()
            .filter(permissions::Column::Key.eq(key))
            .one(db)
            .await?
            .ok_or_else(|| AppError::BadRequest(format!("Unknown permission '{}'", key)))?;
        ids.push(permission.id);
    }
    Ok(ids)
}

// ── Handlers ──────────────────────────────────────────────────────────

pub async fn list_permissions(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<PermissionResponse>>, AppError> {
    let permissions = Permissions::find()
        .order_by_asc(permissions::Column::Key)
        .all(&state.db)
        .await?;

    Ok(Json(
        permissions
            .into_iter()
            .map(|p| PermissionResponse {
                id: p.id,
                key: p.key,
                description: p.description,
            })
            .collect(),
    ))
}

pub async fn list_roles(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<RoleResponse>>, AppError> {
    let rows = Roles::find()
        .order_by_asc(roles::Column::Name)
        .find_with_related(Permissions)
        .all(&state.db)
        .await?;

    Ok(Json(
        rows.into_iter()
            .map(|(role, permissions)| role_response(role, permissions))
            .collect(),
    ))
}

pub async fn create_role(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<RoleResponse>), AppError> {
    PermissionService::require(&state.db, &claims.sub, keys::ROLES_MANAGE).await?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let existing = Roles::find()
        .filter(roles::Column::Name.eq(&req.name))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!(
            "Role '{}' already exists",
            req.name
        )));
    }

    let permission_ids = resolve_permission_ids(&state.db, &req.permission_keys).await?;

    let role = roles::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(req.name),
        description: Set(req.description),
        is_system: Set(false),
        created_at: Set(Some(Utc::now())),
    };
    let role = role.insert(&state.db).await?;

    for permission_id in permission_ids {
        let link = role_permissions::ActiveModel {
            role_id: Set(role.id.clone()),
            permission_id: Set(permission_id),
        };
        link.insert(&state.db).await?;
    }

    let permissions = role.find_related(Permissions).all(&state.db).await?;
    Ok((
        StatusCode::CREATED,
        Json(role_response(role, permissions)),
    ))
}

pub async fn update_role(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Json<RoleResponse>, AppError> {
    PermissionService::require(&state.db, &claims.sub, keys::ROLES_MANAGE).await?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let role = Roles::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("Role not found".to_string()))?;

    if req.name.is_some() && role.is_system {
        return Err(AppError::Conflict(
            "Built-in roles cannot be renamed".to_string(),
        ));
    }

    let mut active = role.into_active_model();
    if let Some(name) = req.name {
        let clash = Roles::find()
            .filter(roles::Column::Name.eq(&name))
            .filter(roles::Column::Id.ne(&id))
            .one(&state.db)
            .await?;
        if clash.is_some() {
            return Err(AppError::Conflict(format!("Role '{}' already exists", name)));
        }
        active.name = Set(name);
    }
    if let Some(description) = req.description {
        active.description = Set(Some(description));
    }

    let updated = active.update(&state.db).await?;
    let permissions = updated.find_related(Permissions).all(&state.db).await?;
    Ok(Json(role_response(updated, permissions)))
}

pub async fn delete_role(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    PermissionService::require(&state.db, &claims.sub, keys::ROLES_MANAGE).await?;

    let role = Roles::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("Role not found".to_string()))?;

    if role.is_system {
        return Err(AppError::Conflict(
            "Built-in roles cannot be deleted".to_string(),
        ));
    }

    let assigned = UserRoles::find()
        .filter(user_roles::Column::RoleId.eq(&role.id))
        .count(&state.db)
        .await?;
    if assigned > 0 {
        return Err(AppError::Conflict(format!(
            "Role is still assigned to {} users",
            assigned
        )));
    }

    RolePermissions::delete_many()
        .filter(role_permissions::Column::RoleId.eq(&role.id))
        .exec(&state.db)
        .await?;
    role.delete(&state.db).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Replace a role's permission set.
pub async fn set_role_permissions(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<SetRolePermissionsRequest>,
) -> Result<Json<RoleResponse>, AppError> {
    PermissionService::require(&state.db, &claims.sub, keys::ROLES_MANAGE).await?;

    let role = Roles::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("Role not found".to_string()))?;

    let permission_ids = resolve_permission_ids(&state.db, &req.permission_keys).await?;

    RolePermissions::delete_many()
        .filter(role_permissions::Column::RoleId.eq(&role.id))
        .exec(&state.db)
        .await?;

    for permission_id in permission_ids {
        let link = role_permissions::ActiveModel {
            role_id: Set(role.id.clone()),
            permission_id: Set(permission_id),
        };
        link.insert(&state.db).await?;
    }

    let permissions = role.find_related(Permissions).all(&state.db).await?;
    Ok(Json(role_response(role, permissions)))
}
