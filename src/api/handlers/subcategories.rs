use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::cache;
use crate::services::permission_service::{PermissionService, keys};
use crate::utils::auth::Claims;
use crate::utils::slug::slugify;
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
pub struct CreateSubcategoryRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub slug: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct UpdateSubcategoryRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    pub slug: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Serialize)]
pub struct SubcategoryResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SubcategoryResponse {
    fn from_model(sub: subcategories::Model) -> Self {
        Self {
            id: sub.id,
            name: sub.name,
            slug: sub.slug,
            description: sub.description,
            created_at: sub.created_at.unwrap_or_else(Utc::now),
        }
    }
}

async fn subcategory_slug_taken(
    db: &sea_orm::DatabaseConnection,
    candidate: &str,
    ignore_id: Option<&str>,
) -> Result<bool, AppError> {
    let mut query = Subcategories::find().filter(subcategories::Column::Slug.eq(candidate));
    if let Some(id) = ignore_id {
        query = query.filter(subcategories::Column::Id.ne(id));
    }
    Ok(query.one(db).await?.is_some())
}

async fn subcategory_slug(
    db: &sea_orm::DatabaseConnection,
    name: &str,
    explicit: Option<&str>,
    ignore_id: Option<&str>,
) -> Result<String, AppError> {
    if let Some(explicit) = explicit {
        let slug = slugify(explicit);
        if slug.is_empty() {
            return Err(AppError::BadRequest("Slug cannot be empty".to_string()));
        }
        if subcategory_slug_taken(db, &slug, ignore_id).await? {
            return Err(AppError::Conflict(format!("Slug '{}' already in use", slug)));
        }
        return Ok(slug);
    }

    let base = slugify(name);
    let base = if base.is_empty() {
        "subcategory".to_string()
    } else {
        base
    };

    for n in 1..100 {
        let candidate = if n == 1 {
            base.clone()
        } else {
            format!("{}-{}", base, n)
        };
        if !subcategory_slug_taken(db, &candidate, ignore_id).await? {
            return Ok(candidate);
        }
    }

    Ok(format!("{}-{}", base, &Uuid::new_v4().to_string()[..8]))
}

pub async fn list_subcategories(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<SubcategoryResponse>>, AppError> {
    let subcategories = Subcategories::find()
        .order_by_asc(subcategories::Column::Name)
        .all(&state.db)
        .await?;

    Ok(Json(
        subcategories
            .into_iter()
            .map(SubcategoryResponse::from_model)
            .collect(),
    ))
}

pub async fn create_subcategory(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateSubcategoryRequest>,
) -> Result<(StatusCode, Json<SubcategoryResponse>), AppError> {
    PermissionService::require(&state.db, &claims.sub, keys::CATEGORIES_MANAGE).await?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let slug = subcategory_slug(&state.db, &req.name, req.slug.as_deref(), None).await?;

    let sub = subcategories::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(req.name),
        slug: Set(slug),
        description: Set(req.description),
        created_at: Set(Some(Utc::now())),
        updated_at: Set(Some(Utc::now())),
    };
    let sub = sub.insert(&state.db).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubcategoryResponse::from_model(sub)),
    ))
}

pub async fn update_subcategory(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSubcategoryRequest>,
) -> Result<Json<SubcategoryResponse>, AppError> {
    PermissionService::require(&state.db, &claims.sub, keys::CATEGORIES_MANAGE).await?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let sub = Subcategories::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("Subcategory not found".to_string()))?;

    let mut active = sub.into_active_model();

    if let Some(slug) = req.slug {
        let slug = subcategory_slug(&state.db, "", Some(&slug), Some(&id)).await?;
        active.slug = Set(slug);
    }
    if let Some(name) = req.name {
        active.name = Set(name);
    }
    if let Some(description) = req.description {
        active.description = Set(Some(description));
    }
    active.updated_at = Set(Some(Utc::now()));

    let updated = active.update(&state.db).await?;
    state.cache.invalidate(cache::MENU_KEY);
    Ok(Json(SubcategoryResponse::from_model(updated)))
}

/// Deleting a subcategory detaches it from every category first.
pub async fn delete_subcategory(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    PermissionService::require(&state.db, &claims.sub, keys::CATEGORIES_MANAGE).await?;

    let sub = Subcategories::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("Subcategory not found".to_string()))?;

    CategorySubcategories::delete_many()
        .filter(category_subcategories::Column::SubcategoryId.eq(&sub.id))
        .exec(&state.db)
        .await?;
    sub.delete(&state.db).await?;
    state.cache.invalidate(cache::MENU_KEY);

    Ok(StatusCode::NO_CONTENT)
}
