use crate::entities::audit_logs;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub enum AuditEventType {
    FileUpload,
    FileDelete,
    FolderDelete,
    ShareGrant,
    ShareRevoke,
    PublicationSubmit,
    PublicationApprove,
    PublicationReject,
}

impl AuditEventType {
    fn as_str(&self) -> &'static str {
        match self {
            AuditEventType::FileUpload => "file.upload",
            AuditEventType::FileDelete => "file.delete",
            AuditEventType::FolderDelete => "folder.delete",
            AuditEventType::ShareGrant => "share.grant",
            AuditEventType::ShareRevoke => "share.revoke",
            AuditEventType::PublicationSubmit => "publication.submit",
            AuditEventType::PublicationApprove => "publication.approve",
            AuditEventType::PublicationReject => "publication.reject",
        }
    }
}

pub struct AuditService;

impl AuditService {
    /// Append an audit record. Failures are logged and swallowed; auditing
    /// never fails the operation it records.
    pub async fn log(
        db: &DatabaseConnection,
        event_type: AuditEventType,
        actor_id: Option<String>,
        subject_id: Option<String>,
        detail: Option<String>,
    ) {
        let entry = audit_logs::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            event_type: Set(event_type.as_str().to_string()),
            actor_id: Set(actor_id),
            subject_id: Set(subject_id),
            detail: Set(detail),
            created_at: Set(Utc::now()),
        };

        if let Err(e) = entry.insert(db).await {
            tracing::error!("Failed to write audit log: {}", e);
        }
    }
}
