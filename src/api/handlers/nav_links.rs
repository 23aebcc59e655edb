use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::cache;
use crate::services::permission_service::{PermissionService, keys};
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Deserialize, Validate)]
pub struct CreateNavLinkRequest {
    #[validate(length(min = 1, max = 80))]
    pub label: String,
    #[validate(length(min = 1, max = 500))]
    pub url: String,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub is_external: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

#[derive(Deserialize, Validate)]
pub struct UpdateNavLinkRequest {
    #[validate(length(min = 1, max = 80))]
    pub label: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub url: Option<String>,
    pub position: Option<i32>,
    pub is_external: Option<bool>,
    pub visible: Option<bool>,
}

#[derive(Deserialize)]
pub struct ReorderRequest {
    pub ordered_ids: Vec<String>,
}

#[derive(Serialize)]
pub struct NavLinkResponse {
    pub id: String,
    pub label: String,
    pub url: String,
    pub position: i32,
    pub is_external: bool,
    pub visible: bool,
    pub created_at: DateTime<Utc>,
}

fn default_visible() -> bool {
    true
}

impl NavLinkResponse {
    fn from_model(link: nav_links::Model) -> Self {
        Self {
            id: link.id,
            label: link.label,
            url: link.url,
            position: link.position,
            is_external: link.is_external,
            visible: link.visible,
            created_at: link.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Public navigation: visible links in display order, served from the
/// response cache when warm.
pub async fn public_navigation(
    State(state): State<crate::AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    if let Some(cached) = state.cache.get(cache::NAVIGATION_KEY) {
        return Ok(Json(cached));
    }

    let links = NavLinks::find()
        .filter(nav_links::Column::Visible.eq(true))
        .order_by_asc(nav_links::Column::Position)
        .all(&state.db)
        .await?;

    let result: Vec<NavLinkResponse> =
        links.into_iter().map(NavLinkResponse::from_model).collect();

    let value = serde_json::to_value(result).map_err(|e| AppError::Internal(e.to_string()))?;
    state.cache.insert(cache::NAVIGATION_KEY, value.clone());

    Ok(Json(value))
}

/// Admin listing including hidden links.
pub async fn list_nav_links(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<NavLinkResponse>>, AppError> {
    PermissionService::require(&state.db, &claims.sub, keys::NAVIGATION_MANAGE).await?;

    let links = NavLinks::find()
        .order_by_asc(nav_links::Column::Position)
        .all(&state.db)
        .await?;

    Ok(Json(
        links.into_iter().map(NavLinkResponse::from_model).collect(),
    ))
}

pub async fn create_nav_link(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateNavLinkRequest>,
) -> Result<(StatusCode, Json<NavLinkResponse>), AppError> {
    PermissionService::require(&state.db, &claims.sub, keys::NAVIGATION_MANAGE).await?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let link = nav_links::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        label: Set(req.label),
        url: Set(req.url),
        position: Set(req.position),
        is_external: Set(req.is_external),
        visible: Set(req.visible),
        created_at: Set(Some(Utc::now())),
        updated_at: Set(Some(Utc::now())),
    };
    let link = link.insert(&state.db).await?;
    state.cache.invalidate(cache::NAVIGATION_KEY);

    Ok((StatusCode::CREATED, Json(NavLinkResponse::from_model(link))))
}

pub async fn update_nav_link(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<UpdateNavLinkRequest>,
) -> Result<Json<NavLinkResponse>, AppError> {
    PermissionService::require(&state.db, &claims.sub, keys::NAVIGATION_MANAGE).await?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let link = NavLinks::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("Navigation link not found".to_string()))?;

    let mut active = link.into_active_model();
    if let Some(label) = req.label {
        active.label = Set(label);
    }
    if let Some(url) = req.url {
        active.url = Set(url);
    }
    if let Some(position) = req.position {
        active.position = Set(position);
    }
    if let Some(is_external) = req.is_external {
        active.is_external = Set(is_external);
    }
    if let Some(visible) = req.visible {
        active.visible = Set(visible);
    }
    active.updated_at = Set(Some(Utc::now()));

    let updated = active.update(&state.db).await?;
    state.cache.invalidate(cache::NAVIGATION_KEY);
    Ok(Json(NavLinkResponse::from_model(updated)))
}

pub async fn delete_nav_link(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    PermissionService::require(&state.db, &claims.sub, keys::NAVIGATION_MANAGE).await?;

    let link = NavLinks::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("Navigation link not found".to_string()))?;

    link.delete(&state.db).await?;
    state.cache.invalidate(cache::NAVIGATION_KEY);
    Ok(StatusCode::NO_CONTENT)
}

/// Rewrite every position from the full ordered id list.
pub async fn reorder_nav_links(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<Vec<NavLinkResponse>>, AppError> {
    PermissionService::require(&state.db, &claims.sub, keys::NAVIGATION_MANAGE).await?;

    for (position, id) in req.ordered_ids.iter().enumerate() {
        let link = NavLinks::find_by_id(id)
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::BadRequest(format!("Unknown link '{}'", id)))?;

        let mut active = link.into_active_model();
        active.position = Set(position as i32);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&state.db).await?;
    }
    state.cache.invalidate(cache::NAVIGATION_KEY);

    let links = NavLinks::find()
        .order_by_asc(nav_links::Column::Position)
        .all(&state.db)
        .await?;

    Ok(Json(
        links.into_iter().map(NavLinkResponse::from_model).collect(),
    ))
}
