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
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// ── Request / Response Types ──────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub slug: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(url)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub show_on_menu: bool,
    #[serde(default)]
    pub menu_order: i32,
}

#[derive(Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    pub slug: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(url)]
    pub cover_image: Option<String>,
    pub show_on_menu: Option<bool>,
    pub menu_order: Option<i32>,
}

#[derive(Deserialize)]
pub struct SetSubcategoriesRequest {
    pub subcategory_ids: Vec<String>,
}

#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub show_on_menu: bool,
    pub menu_order: i32,
    pub subcategory_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct MenuCategory {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub menu_order: i32,
    pub subcategories: Vec<MenuSubcategory>,
}

#[derive(Serialize)]
pub struct MenuSubcategory {
    pub id: String,
    pub name: String,
    pub slug: String,
}

async fn category_response(
    db: &sea_orm::DatabaseConnection,
    category: categories::Model,
) -> Result<CategoryResponse, AppError> {
    let subcategory_ids = CategorySubcategories::find()
        .filter(category_subcategories::Column::CategoryId.eq(&category.id))
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.subcategory_id)
        .collect();

    Ok(CategoryResponse {
        id: category.id,
        name: category.name,
        slug: category.slug,
        description: category.description,
        cover_image: category.cover_image,
        show_on_menu: category.show_on_menu,
        menu_order: category.menu_order,
        subcategory_ids,
        created_at: category.created_at.unwrap_or_else(Utc::now),
    })
}

async fn category_slug_taken(
    db: &sea_orm::DatabaseConnection,
    candidate: &str,
    ignore_id: Option<&str>,
) -> Result<bool, AppError> {
    let mut query = Categories::find().filter(categories::Column::Slug.eq(candidate));
    if let Some(id) = ignore_id {
        query = query.filter(categories::Column::Id.ne(id));
    }
    Ok(query.one(db).await?.is_some())
}

/// Slug for a category: explicit slugs conflict with 409, generated ones
/// get a numeric suffix.
async fn category_slug(
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
        if category_slug_taken(db, &slug, ignore_id).await? {
            return Err(AppError::Conflict(format!("Slug '{}' already in use", slug)));
        }
        return Ok(slug);
    }

    let base = slugify(name);
    let base = if base.is_empty() {
        "category".to_string()
    } else {
        base
    };

    for n in 1..100 {
        let candidate = if n == 1 {
            base.clone()
        } else {
            format!("{}-{}", base, n)
        };
        if !category_slug_taken(db, &candidate, ignore_id).await? {
            return Ok(candidate);
        }
    }

    Ok(format!("{}-{}", base, &Uuid::new_v4().to_string()[..8]))
}

// ── Handlers ──────────────────────────────────────────────────────────

pub async fn list_categories(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = Categories::find()
        .order_by_asc(categories::Column::MenuOrder)
        .order_by_asc(categories::Column::Name)
        .all(&state.db)
        .await?;

    let mut result = Vec::new();
    for category in categories {
        result.push(category_response(&state.db, category).await?);
    }
    Ok(Json(result))
}

pub async fn get_category(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> Result<Json<CategoryResponse>, AppError> {
    let category = Categories::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("Category not found".to_string()))?;

    Ok(Json(category_response(&state.db, category).await?))
}

pub async fn create_category(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), AppError> {
    PermissionService::require(&state.db, &claims.sub, keys::CATEGORIES_MANAGE).await?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let slug = category_slug(&state.db, &req.name, req.slug.as_deref(), None).await?;

    let category = categories::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(req.name),
        slug: Set(slug),
        description: Set(req.description),
        cover_image: Set(req.cover_image),
        show_on_menu: Set(req.show_on_menu),
        menu_order: Set(req.menu_order),
        created_at: Set(Some(Utc::now())),
        updated_at: Set(Some(Utc::now())),
    };
    let category = category.insert(&state.db).await?;
    state.cache.invalidate(cache::MENU_KEY);

    Ok((
        StatusCode::CREATED,
        Json(category_response(&state.db, category).await?),
    ))
}

pub async fn update_category(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, AppError> {
    PermissionService::require(&state.db, &claims.sub, keys::CATEGORIES_MANAGE).await?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let category = Categories::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("Category not found".to_string()))?;

    let mut active = category.into_active_model();

    if let Some(slug) = req.slug {
        let slug = category_slug(&state.db, "", Some(&slug), Some(&id)).await?;
        active.slug = Set(slug);
    }
    if let Some(name) = req.name {
        active.name = Set(name);
    }
    if let Some(description) = req.description {
        active.description = Set(Some(description));
    }
    if let Some(cover_image) = req.cover_image {
        active.cover_image = Set(Some(cover_image));
    }
    if let Some(show_on_menu) = req.show_on_menu {
        active.show_on_menu = Set(show_on_menu);
    }
    if let Some(menu_order) = req.menu_order {
        active.menu_order = Set(menu_order);
    }
    active.updated_at = Set(Some(Utc::now()));

    let updated = active.update(&state.db).await?;
    state.cache.invalidate(cache::MENU_KEY);
    Ok(Json(category_response(&state.db, updated).await?))
}

pub async fn delete_category(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    PermissionService::require(&state.db, &claims.sub, keys::CATEGORIES_MANAGE).await?;

    let category = Categories::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("Category not found".to_string()))?;

    let in_use = Publications::find()
        .filter(publications::Column::CategoryId.eq(&category.id))
        .count(&state.db)
        .await?;
    if in_use > 0 {
        return Err(AppError::Conflict(format!(
            "Category still has {} publications",
            in_use
        )));
    }

    CategorySubcategories::delete_many()
        .filter(category_subcategories::Column::CategoryId.eq(&category.id))
        .exec(&state.db)
        .await?;
    category.delete(&state.db).await?;
    state.cache.invalidate(cache::MENU_KEY);

    Ok(StatusCode::NO_CONTENT)
}

/// Replace the subcategories attached to a category.
pub async fn set_subcategories(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<SetSubcategoriesRequest>,
) -> Result<Json<CategoryResponse>, AppError> {
    PermissionService::require(&state.db, &claims.sub, keys::CATEGORIES_MANAGE).await?;

    let category = Categories::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("Category not found".to_string()))?;

    for sub_id in &req.subcategory_ids {
        Subcategories::find_by_id(sub_id)
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Subcategory '{}' not found", sub_id)))?;
    }

    CategorySubcategories::delete_many()
        .filter(category_subcategories::Column::CategoryId.eq(&category.id))
        .exec(&state.db)
        .await?;

    for sub_id in req.subcategory_ids {
        let link = category_subcategories::ActiveModel {
            category_id: Set(category.id.clone()),
            subcategory_id: Set(sub_id),
        };
        link.insert(&state.db).await?;
    }
    state.cache.invalidate(cache::MENU_KEY);

    Ok(Json(category_response(&state.db, category).await?))
}

/// Public menu: `show_on_menu` categories ordered by `menu_order`, each
/// with its subcategories. Served from the response cache when warm.
pub async fn menu(
    State(state): State<crate::AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    if let Some(cached) = state.cache.get(cache::MENU_KEY) {
        return Ok(Json(cached));
    }

    let rows = Categories::find()
        .filter(categories::Column::ShowOnMenu.eq(true))
        .order_by_asc(categories::Column::MenuOrder)
        .order_by_asc(categories::Column::Name)
        .find_with_related(Subcategories)
        .all(&state.db)
        .await?;

    let result: Vec<MenuCategory> = rows
        .into_iter()
        .map(|(category, subcategories)| MenuCategory {
            id: category.id,
            name: category.name,
            slug: category.slug,
            menu_order: category.menu_order,
            subcategories: subcategories
                .into_iter()
                .map(|s| MenuSubcategory {
                    id: s.id,
                    name: s.name,
                    slug: s.slug,
                })
                .collect(),
        })
        .collect();

    let value =
        serde_json::to_value(result).map_err(|e| AppError::Internal(e.to_string()))?;
    state.cache.insert(cache::MENU_KEY, value.clone());

    Ok(Json(value))
}
