use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::permission_service::{PermissionService, keys};
use crate::utils::auth::{Claims, hash_password, verify_password};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 120))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(url)]
    pub avatar_url: Option<String>,
    pub current_password: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub new_password: Option<String>,
}

#[derive(Serialize)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
}

#[derive(Deserialize)]
pub struct SetUserRolesRequest {
    pub role_ids: Vec<String>,
}

async fn role_names(
    db: &sea_orm::DatabaseConnection,
    user_id: &str,
) -> Result<Vec<String>, AppError> {
    let roles = Users::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?
        .find_related(Roles)
        .all(db)
        .await?;
    Ok(roles.into_iter().map(|r| r.name).collect())
}

pub async fn get_profile(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = Users::find_by_id(&claims.sub)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let roles = role_names(&state.db, &user.id).await?;
    let mut permissions: Vec<String> = PermissionService::user_permissions(&state.db, &user.id)
        .await?
        .into_iter()
        .collect();
    permissions.sort();

    Ok(Json(ProfileResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        name: user.name,
        avatar_url: user.avatar_url,
        roles,
        permissions,
        created_at: user.created_at.unwrap_or_else(Utc::now),
    }))
}

pub async fn update_profile(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let user = Users::find_by_id(&claims.sub)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let mut active = user.clone().into_active_model();

    if let Some(name) = req.name {
        active.name = Set(Some(name));
    }
    if let Some(email) = req.email {
        active.email = Set(Some(email));
    }
    if let Some(avatar_url) = req.avatar_url {
        active.avatar_url = Set(Some(avatar_url));
    }

    if let Some(new_password) = req.new_password {
        let current = req.current_password.ok_or(AppError::BadRequest(
            "current_password is required to change the password".to_string(),
        ))?;
        let ok = verify_password(&current, &user.password_hash)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        if !ok {
            return Err(AppError::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }
        active.password_hash =
            Set(hash_password(&new_password).map_err(|e| AppError::Internal(e.to_string()))?);
    }

    active.update(&state.db).await?;

    get_profile(State(state), Extension(claims)).await
}

/// Admin listing of users with their role names.
pub async fn list_users(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    PermissionService::require(&state.db, &claims.sub, keys::USERS_MANAGE).await?;

    let users_with_roles = Users::find()
        .order_by_asc(users::Column::Username)
        .find_with_related(Roles)
        .all(&state.db)
        .await?;

    let result = users_with_roles
        .into_iter()
        .map(|(user, roles)| UserSummary {
            id: user.id,
            username: user.username,
            name: user.name,
            email: user.email,
            roles: roles.into_iter().map(|r| r.name).collect(),
        })
        .collect();

    Ok(Json(result))
}

/// Replace a user's role set.
pub async fn set_user_roles(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<SetUserRolesRequest>,
) -> Result<Json<UserSummary>, AppError> {
    PermissionService::require(&state.db, &claims.sub, keys::USERS_MANAGE).await?;

    let user = Users::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    for role_id in &req.role_ids {
        Roles::find_by_id(role_id)
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Role '{}' not found", role_id)))?;
    }

    UserRoles::delete_many()
        .filter(user_roles::Column::UserId.eq(&user.id))
        .exec(&state.db)
        .await?;

    for role_id in req.role_ids {
        let link = user_roles::ActiveModel {
            user_id: Set(user.id.clone()),
            role_id: Set(role_id),
        };
        link.insert(&state.db).await?;
    }

    let roles = role_names(&state.db, &user.id).await?;
    Ok(Json(UserSummary {
        id: user.id,
        username: user.username,
        name: user.name,
        email: user.email,
        roles,
    }))
}
