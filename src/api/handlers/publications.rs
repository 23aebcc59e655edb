use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::permission_service::{PermissionService, keys};
use crate::services::publication_service::{
    PublicationService, PublicationStatus, WorkflowAction,
};
use crate::utils::auth::Claims;
use crate::utils::pagination::{PageRequest, PageResponse};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    sea_query::{Expr, Func},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

// ── Request / Response Types ──────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CreatePublicationRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub slug: Option<String>,
    #[validate(length(max = 1000))]
    pub summary: Option<String>,
    pub body: Option<String>,
    #[validate(url)]
    pub cover_image: Option<String>,
    pub category_id: String,
    pub subcategory_id: Option<String>,
    #[serde(default)]
    pub attachment_file_ids: Vec<String>,
}

#[derive(Deserialize, Validate)]
pub struct UpdatePublicationRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub slug: Option<String>,
    #[validate(length(max = 1000))]
    pub summary: Option<String>,
    pub body: Option<String>,
    #[validate(url)]
    pub cover_image: Option<String>,
    pub category_id: Option<String>,
    pub subcategory_id: Option<String>,
    pub attachment_file_ids: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct RejectRequest {
    pub note: Option<String>,
}

#[derive(Deserialize)]
pub struct ListPublicationsQuery {
    pub status: Option<String>,
    pub category_id: Option<String>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Deserialize)]
pub struct PublicListQuery {
    pub category_id: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Serialize)]
pub struct AttachmentInfo {
    pub id: String,
    pub filename: String,
    pub mime_type: String,
    pub file_size: i64,
}

#[derive(Serialize)]
pub struct PublicationResponse {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub body: Option<String>,
    pub cover_image: Option<String>,
    pub status: String,
    pub review_note: Option<String>,
    pub category_id: String,
    pub category_name: Option<String>,
    pub subcategory_id: Option<String>,
    pub created_by: String,
    pub attachments: Vec<AttachmentInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

fn page_request(page: Option<u64>, page_size: Option<u64>) -> PageRequest {
    let default = PageRequest::default();
    PageRequest {
        page: page.unwrap_or(default.page),
        page_size: page_size.unwrap_or(default.page_size),
    }
}

async fn publication_response(
    db: &DatabaseConnection,
    publication: publications::Model,
    category_name: Option<String>,
) -> Result<PublicationResponse, AppError> {
    let attachments = PublicationService::attachments(db, &publication.id)
        .await?
        .into_iter()
        .map(|f| AttachmentInfo {
            id: f.id,
            filename: f.filename,
            mime_type: f.mime_type,
            file_size: f.file_size,
        })
        .collect();

    Ok(PublicationResponse {
        id: publication.id,
        title: publication.title,
        slug: publication.slug,
        summary: publication.summary,
        body: publication.body,
        cover_image: publication.cover_image,
        status: publication.status,
        review_note: publication.review_note,
        category_id: publication.category_id,
        category_name,
        subcategory_id: publication.subcategory_id,
        created_by: publication.created_by,
        attachments,
        created_at: publication.created_at.unwrap_or_else(Utc::now),
        updated_at: publication.updated_at,
    })
}

async fn category_names(
    db: &DatabaseConnection,
    publications: &[publications::Model],
) -> Result<HashMap<String, String>, AppError> {
    let ids: Vec<String> = publications.iter().map(|p| p.category_id.clone()).collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let categories = Categories::find()
        .filter(categories::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(categories.into_iter().map(|c| (c.id, c.name)).collect())
}

async fn paged_response(
    db: &DatabaseConnection,
    cond: Condition,
    req: &PageRequest,
) -> Result<PageResponse<PublicationResponse>, AppError> {
    let total = Publications::find().filter(cond.clone()).count(db).await?;

    let rows = Publications::find()
        .filter(cond)
        .order_by_desc(publications::Column::CreatedAt)
        .offset(req.offset())
        .limit(req.limit())
        .all(db)
        .await?;

    let names = category_names(db, &rows).await?;

    let mut items = Vec::new();
    for row in rows {
        let name = names.get(&row.category_id).cloned();
        items.push(publication_response(db, row, name).await?);
    }

    Ok(PageResponse::new(items, req, total))
}

// ── Authenticated Handlers ────────────────────────────────────────────

pub async fn create_publication(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePublicationRequest>,
) -> Result<(StatusCode, Json<PublicationResponse>), AppError> {
    PermissionService::require(&state.db, &claims.sub, keys::CONTENT_CREATE).await?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let category = Categories::find_by_id(&req.category_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::BadRequest("Unknown category".to_string()))?;

    if let Some(ref sub_id) = req.subcategory_id {
        Subcategories::find_by_id(sub_id)
            .one(&state.db)
            .await?
            .ok_or(AppError::BadRequest("Unknown subcategory".to_string()))?;
    }

    // Check attachments up front so a bad list leaves no stray draft
    for file_id in &req.attachment_file_ids {
        let file = Files::find_by_id(file_id)
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File '{}' not found", file_id)))?;
        if !crate::services::access::AccessService::can_access_file(
            &state.db,
            &claims.sub,
            &file,
            crate::services::access::AccessLevel::Read,
        )
        .await?
        {
            return Err(AppError::NotFound(format!("File '{}' not found", file_id)));
        }
    }

    let slug =
        PublicationService::unique_slug(&state.db, &req.title, req.slug.as_deref(), None).await?;

    let publication = publications::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        title: Set(req.title),
        slug: Set(slug),
        summary: Set(req.summary),
        body: Set(req.body),
        cover_image: Set(req.cover_image),
        status: Set(PublicationStatus::Draft.as_str().to_string()),
        review_note: Set(None),
        category_id: Set(req.category_id),
        subcategory_id: Set(req.subcategory_id),
        created_by: Set(claims.sub.clone()),
        created_at: Set(Some(Utc::now())),
        updated_at: Set(Some(Utc::now())),
    };
    let publication = publication.insert(&state.db).await?;

    if !req.attachment_file_ids.is_empty() {
        PublicationService::set_attachments(
            &state.db,
            &publication.id,
            &req.attachment_file_ids,
            &claims.sub,
        )
        .await?;
    }

    Ok((
        StatusCode::CREATED,
        Json(publication_response(&state.db, publication, Some(category.name)).await?),
    ))
}

/// Admin listing. Reviewers see everything; everyone else their own.
pub async fn list_publications(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListPublicationsQuery>,
) -> Result<Json<PageResponse<PublicationResponse>>, AppError> {
    let is_reviewer =
        PermissionService::has_permission(&state.db, &claims.sub, keys::CONTENT_REVIEW).await?;

    let mut cond = Condition::all();
    if !is_reviewer {
        cond = cond.add(publications::Column::CreatedBy.eq(&claims.sub));
    }
    if let Some(ref status) = query.status {
        PublicationStatus::parse(status)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown status '{}'", status)))?;
        cond = cond.add(publications::Column::Status.eq(status));
    }
    if let Some(ref category_id) = query.category_id {
        cond = cond.add(publications::Column::CategoryId.eq(category_id));
    }
    if let Some(ref search) = query.search {
        let pattern = format!("%{}%", search.to_lowercase());
        cond = cond.add(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col(publications::Column::Title)))
                        .like(pattern.clone()),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col(publications::Column::Summary)))
                        .like(pattern),
                ),
        );
    }

    let req = page_request(query.page, query.page_size);
    Ok(Json(paged_response(&state.db, cond, &req).await?))
}

pub async fn get_publication(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<PublicationResponse>, AppError> {
    let publication = Publications::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("Publication not found".to_string()))?;

    let is_reviewer =
        PermissionService::has_permission(&state.db, &claims.sub, keys::CONTENT_REVIEW).await?;
    let approved = publication.status == PublicationStatus::Approved.as_str();

    if publication.created_by != claims.sub && !is_reviewer && !approved {
        return Err(AppError::NotFound("Publication not found".to_string()));
    }

    let category_name = Categories::find_by_id(&publication.category_id)
        .one(&state.db)
        .await?
        .map(|c| c.name);

    Ok(Json(
        publication_response(&state.db, publication, category_name).await?,
    ))
}

pub async fn update_publication(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePublicationRequest>,
) -> Result<Json<PublicationResponse>, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let publication = Publications::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("Publication not found".to_string()))?;

    let is_reviewer =
        PermissionService::has_permission(&state.db, &claims.sub, keys::CONTENT_REVIEW).await?;
    let is_creator = publication.created_by == claims.sub;

    if !is_creator && !is_reviewer {
        return Err(AppError::NotFound("Publication not found".to_string()));
    }

    let status = PublicationStatus::parse(&publication.status).ok_or_else(|| {
        AppError::Internal(format!("Corrupt publication status '{}'", publication.status))
    })?;

    // Creators may touch drafts and rejected records freely; editing an
    // approved record sends it back through moderation. Pending records
    // are frozen until reviewed.
    let revert_to_draft = if is_reviewer {
        false
    } else {
        match status {
            PublicationStatus::Draft | PublicationStatus::Rejected => false,
            PublicationStatus::Approved => true,
            PublicationStatus::Pending => {
                return Err(AppError::Conflict(
                    "Cannot edit a publication while it is pending review".to_string(),
                ));
            }
        }
    };

    if let Some(ref category_id) = req.category_id {
        Categories::find_by_id(category_id)
            .one(&state.db)
            .await?
            .ok_or(AppError::BadRequest("Unknown category".to_string()))?;
    }
    if let Some(ref sub_id) = req.subcategory_id {
        Subcategories::find_by_id(sub_id)
            .one(&state.db)
            .await?
            .ok_or(AppError::BadRequest("Unknown subcategory".to_string()))?;
    }

    let mut active = publication.clone().into_active_model();

    if let Some(slug) = req.slug {
        let slug =
            PublicationService::unique_slug(&state.db, "", Some(&slug), Some(&id)).await?;
        active.slug = Set(slug);
    }
    if let Some(title) = req.title {
        active.title = Set(title);
    }
    if let Some(summary) = req.summary {
        active.summary = Set(Some(summary));
    }
    if let Some(body) = req.body {
        active.body = Set(Some(body));
    }
    if let Some(cover_image) = req.cover_image {
        active.cover_image = Set(Some(cover_image));
    }
    if let Some(category_id) = req.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(sub_id) = req.subcategory_id {
        active.subcategory_id = Set(Some(sub_id));
    }
    if revert_to_draft {
        active.status = Set(PublicationStatus::Draft.as_str().to_string());
        active.review_note = Set(None);
    }
    active.updated_at = Set(Some(Utc::now()));

    let updated = active.update(&state.db).await?;

    if let Some(ref file_ids) = req.attachment_file_ids {
        PublicationService::set_attachments(&state.db, &updated.id, file_ids, &claims.sub).await?;
    }

    let category_name = Categories::find_by_id(&updated.category_id)
        .one(&state.db)
        .await?
        .map(|c| c.name);

    Ok(Json(
        publication_response(&state.db, updated, category_name).await?,
    ))
}

pub async fn delete_publication(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let publication = Publications::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("Publication not found".to_string()))?;

    let is_reviewer =
        PermissionService::has_permission(&state.db, &claims.sub, keys::CONTENT_REVIEW).await?;
    if publication.created_by != claims.sub && !is_reviewer {
        return Err(AppError::NotFound("Publication not found".to_string()));
    }

    PublicationAttachments::delete_many()
        .filter(publication_attachments::Column::PublicationId.eq(&publication.id))
        .exec(&state.db)
        .await?;

    let publication: publications::ActiveModel = publication.into();
    publication.delete(&state.db).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn submit_publication(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<PublicationResponse>, AppError> {
    let updated = PublicationService::apply_transition(
        &state.db,
        &id,
        WorkflowAction::Submit,
        &claims.sub,
        None,
    )
    .await?;

    Ok(Json(publication_response(&state.db, updated, None).await?))
}

pub async fn approve_publication(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<PublicationResponse>, AppError> {
    let updated = PublicationService::apply_transition(
        &state.db,
        &id,
        WorkflowAction::Approve,
        &claims.sub,
        None,
    )
    .await?;

    Ok(Json(publication_response(&state.db, updated, None).await?))
}

pub async fn reject_publication(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<RejectRequest>,
) -> Result<Json<PublicationResponse>, AppError> {
    let updated = PublicationService::apply_transition(
        &state.db,
        &id,
        WorkflowAction::Reject,
        &claims.sub,
        req.note,
    )
    .await?;

    Ok(Json(publication_response(&state.db, updated, None).await?))
}

// ── Public (unauthenticated) Handlers ─────────────────────────────────

/// Approved publications for the public site.
pub async fn public_list(
    State(state): State<crate::AppState>,
    Query(query): Query<PublicListQuery>,
) -> Result<Json<PageResponse<PublicationResponse>>, AppError> {
    let mut cond = Condition::all()
        .add(publications::Column::Status.eq(PublicationStatus::Approved.as_str()));
    if let Some(ref category_id) = query.category_id {
        cond = cond.add(publications::Column::CategoryId.eq(category_id));
    }

    let req = page_request(query.page, query.page_size);
    Ok(Json(paged_response(&state.db, cond, &req).await?))
}

pub async fn public_get(
    State(state): State<crate::AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PublicationResponse>, AppError> {
    let publication = Publications::find()
        .filter(publications::Column::Slug.eq(&slug))
        .filter(publications::Column::Status.eq(PublicationStatus::Approved.as_str()))
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("Publication not found".to_string()))?;

    let category_name = Categories::find_by_id(&publication.category_id)
        .one(&state.db)
        .await?
        .map(|c| c.name);

    Ok(Json(
        publication_response(&state.db, publication, category_name).await?,
    ))
}
