use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::access::{AccessLevel, AccessService};
use crate::services::audit::{AuditEventType, AuditService};
use crate::services::permission_service::{PermissionService, keys};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl PublicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationStatus::Draft => "draft",
            PublicationStatus::Pending => "pending",
            PublicationStatus::Approved => "approved",
            PublicationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(PublicationStatus::Draft),
            "pending" => Some(PublicationStatus::Pending),
            "approved" => Some(PublicationStatus::Approved),
            "rejected" => Some(PublicationStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowAction {
    Submit,
    Approve,
    Reject,
}

impl WorkflowAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowAction::Submit => "submit",
            WorkflowAction::Approve => "approve",
            WorkflowAction::Reject => "reject",
        }
    }
}

/// The moderation state machine. Returns the next status, or None when the
/// transition is not allowed from `current`.
pub fn next_status(
    current: PublicationStatus,
    action: WorkflowAction,
) -> Option<PublicationStatus> {
    use PublicationStatus::*;
    use WorkflowAction::*;

    match (current, action) {
        (Draft, Submit) | (Rejected, Submit) => Some(Pending),
        (Pending, Approve) => Some(Approved),
        (Pending, Reject) => Some(Rejected),
        _ => None,
    }
}

pub struct PublicationService;

impl PublicationService {
    /// Apply a workflow action. Submitting is reserved to the creator;
    /// approving and rejecting require the review permission. Invalid
    /// transitions are a 409 naming the offending pair.
    pub async fn apply_transition(
        db: &DatabaseConnection,
        publication_id: &str,
        action: WorkflowAction,
        actor_id: &str,
        review_note: Option<String>,
    ) -> Result<publications::Model, AppError> {
        let publication = Publications::find_by_id(publication_id)
            .one(db)
            .await?
            .ok_or(AppError::NotFound("Publication not found".to_string()))?;

        match action {
            WorkflowAction::Submit => {
                if publication.created_by != actor_id {
                    return Err(AppError::Forbidden(
                        "Only the creator may submit a publication".to_string(),
                    ));
                }
            }
            WorkflowAction::Approve | WorkflowAction::Reject => {
                PermissionService::require(db, actor_id, keys::CONTENT_REVIEW).await?;
            }
        }

        let current = PublicationStatus::parse(&publication.status).ok_or_else(|| {
            AppError::Internal(format!("Corrupt publication status '{}'", publication.status))
        })?;

        let next = next_status(current, action).ok_or_else(|| {
            AppError::Conflict(format!(
                "Cannot {} a publication in status '{}'",
                action.as_str(),
                current.as_str()
            ))
        })?;

        let mut active: publications::ActiveModel = publication.into();
        active.status = Set(next.as_str().to_string());
        active.review_note = Set(match action {
            WorkflowAction::Reject => review_note.clone(),
            _ => None,
        });
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(db).await?;

        let event = match action {
            WorkflowAction::Submit => AuditEventType::PublicationSubmit,
            WorkflowAction::Approve => AuditEventType::PublicationApprove,
            WorkflowAction::Reject => AuditEventType::PublicationReject,
        };
        AuditService::log(
            db,
            event,
            Some(actor_id.to_string()),
            Some(updated.id.clone()),
            review_note,
        )
        .await;

        Ok(updated)
    }

    /// Replace a publication's attachment list. Every file must be
    /// readable by the actor; order is preserved via `position`.
    pub async fn set_attachments(
        db: &DatabaseConnection,
        publication_id: &str,
        file_ids: &[String],
        actor_id: &str,
    ) -> Result<(), AppError> {
        for file_id in file_ids {
            let file = Files::find_by_id(file_id)
                .one(db)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("File '{}' not found", file_id)))?;

            if !AccessService::can_access_file(db, actor_id, &file, AccessLevel::Read).await? {
                return Err(AppError::NotFound(format!("File '{}' not found", file_id)));
            }
        }

        PublicationAttachments::delete_many()
            .filter(publication_attachments::Column::PublicationId.eq(publication_id))
            .exec(db)
            .await?;

        for (position, file_id) in file_ids.iter().enumerate() {
            let attachment = publication_attachments::ActiveModel {
                publication_id: Set(publication_id.to_string()),
                file_id: Set(file_id.clone()),
                position: Set(position as i32),
            };
            attachment.insert(db).await?;
        }

        Ok(())
    }

    /// Attached files in display order.
    pub async fn attachments(
        db: &DatabaseConnection,
        publication_id: &str,
    ) -> Result<Vec<files::Model>, AppError> {
        let rows = PublicationAttachments::find()
            .filter(publication_attachments::Column::PublicationId.eq(publication_id))
            .order_by_asc(publication_attachments::Column::Position)
            .find_also_related(Files)
            .all(db)
            .await?;

        Ok(rows.into_iter().filter_map(|(_, file)| file).collect())
    }

    /// Derive a unique slug from `title` (or an explicit slug). Explicit
    /// slugs conflict with 409; generated ones get a numeric suffix.
    pub async fn unique_slug(
        db: &DatabaseConnection,
        title: &str,
        explicit: Option<&str>,
        ignore_id: Option<&str>,
    ) -> Result<String, AppError> {
        if let Some(explicit) = explicit {
            let slug = crate::utils::slug::slugify(explicit);
            if slug.is_empty() {
                return Err(AppError::BadRequest("Slug cannot be empty".to_string()));
            }
            if Self::slug_taken(db, &slug, ignore_id).await? {
                return Err(AppError::Conflict(format!("Slug '{}' already in use", slug)));
            }
            return Ok(slug);
        }

        let base = crate::utils::slug::slugify(title);
        let base = if base.is_empty() {
            "publication".to_string()
        } else {
            base
        };

        if !Self::slug_taken(db, &base, ignore_id).await? {
            return Ok(base);
        }

        for n in 2..100 {
            let candidate = format!("{}-{}", base, n);
            if !Self::slug_taken(db, &candidate, ignore_id).await? {
                return Ok(candidate);
            }
        }

        // Practically unreachable; fall back to a random suffix
        Ok(format!("{}-{}", base, &uuid::Uuid::new_v4().to_string()[..8]))
    }

    async fn slug_taken(
        db: &DatabaseConnection,
        candidate: &str,
        ignore_id: Option<&str>,
    ) -> Result<bool, AppError> {
        let mut query = Publications::find().filter(publications::Column::Slug.eq(candidate));
        if let Some(id) = ignore_id {
            query = query.filter(publications::Column::Id.ne(id));
        }
        Ok(query.one(db).await?.is_some())
    }
}
