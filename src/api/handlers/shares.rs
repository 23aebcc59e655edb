use crate::api::error::AppError;
use crate::entities::shares;
use crate::services::access::AccessLevel;
use crate::services::audit::{AuditEventType, AuditService};
use crate::services::share_service::ShareService;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Request / Response Types ──────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateShareRequest {
    pub file_id: Option<String>,
    pub folder_id: Option<String>,
    pub shared_with_user_id: String,
    /// "read" or "write"
    pub access_level: String,
}

#[derive(Serialize)]
pub struct ShareResponse {
    pub id: String,
    pub file_id: Option<String>,
    pub folder_id: Option<String>,
    pub shared_with_user_id: String,
    pub access_level: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct SharedFileEntry {
    pub id: String,
    pub filename: String,
    pub mime_type: String,
    pub file_size: i64,
    pub owner_id: String,
    pub access_level: String,
    pub shared_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct SharedFolderEntry {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub access_level: String,
    pub shared_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct ListSharesQuery {
    pub file_id: Option<String>,
    pub folder_id: Option<String>,
}

impl ShareResponse {
    fn from_model(share: shares::Model) -> Self {
        Self {
            id: share.id,
            file_id: share.file_id,
            folder_id: share.folder_id,
            shared_with_user_id: share.shared_with_user_id,
            access_level: share.access_level,
            created_at: share.created_at.unwrap_or_else(Utc::now),
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────────

pub async fn create_share(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateShareRequest>,
) -> Result<(StatusCode, Json<ShareResponse>), AppError> {
    let level = AccessLevel::parse(&req.access_level).ok_or(AppError::BadRequest(
        "access_level must be 'read' or 'write'".to_string(),
    ))?;

    let share = ShareService::create_share(
        &state.db,
        &claims.sub,
        req.file_id,
        req.folder_id,
        req.shared_with_user_id,
        level,
    )
    .await?;

    AuditService::log(
        &state.db,
        AuditEventType::ShareGrant,
        Some(claims.sub),
        Some(share.id.clone()),
        Some(share.access_level.clone()),
    )
    .await;

    Ok((StatusCode::CREATED, Json(ShareResponse::from_model(share))))
}

pub async fn list_shares(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListSharesQuery>,
) -> Result<Json<Vec<ShareResponse>>, AppError> {
    let shares =
        ShareService::list_created(&state.db, &claims.sub, query.file_id, query.folder_id).await?;

    Ok(Json(
        shares.into_iter().map(ShareResponse::from_model).collect(),
    ))
}

pub async fn revoke_share(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    ShareService::revoke(&state.db, &id, &claims.sub).await?;

    AuditService::log(
        &state.db,
        AuditEventType::ShareRevoke,
        Some(claims.sub),
        Some(id),
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn shared_with_me_files(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<SharedFileEntry>>, AppError> {
    let rows = ShareService::files_shared_with(&state.db, &claims.sub).await?;

    let result = rows
        .into_iter()
        .map(|(share, file)| SharedFileEntry {
            id: file.id,
            filename: file.filename,
            mime_type: file.mime_type,
            file_size: file.file_size,
            owner_id: file.user_id,
            access_level: share.access_level,
            shared_at: share.created_at.unwrap_or_else(Utc::now),
        })
        .collect();

    Ok(Json(result))
}

pub async fn shared_with_me_folders(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<SharedFolderEntry>>, AppError> {
    let rows = ShareService::folders_shared_with(&state.db, &claims.sub).await?;

    let result = rows
        .into_iter()
        .map(|(share, folder)| SharedFolderEntry {
            id: folder.id,
            name: folder.name,
            owner_id: folder.user_id,
            access_level: share.access_level,
            shared_at: share.created_at.unwrap_or_else(Utc::now),
        })
        .collect();

    Ok(Json(result))
}
