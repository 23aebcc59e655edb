use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::publication_service::PublicationStatus;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct PublicationCounts {
    pub draft: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
}

#[derive(Debug, Serialize)]
pub struct FileTotals {
    pub count: u64,
    pub total_size: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub publications: PublicationCounts,
    pub files: FileTotals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<u64>,
}

pub struct StatsService;

impl StatsService {
    /// Dashboard numbers. File totals are always caller-scoped; callers
    /// with the global flag additionally see site-wide publication counts
    /// and category/user totals.
    pub async fn dashboard(
        db: &DatabaseConnection,
        user_id: &str,
        global: bool,
    ) -> Result<DashboardStats, AppError> {
        let mut counts = PublicationCounts {
            draft: 0,
            pending: 0,
            approved: 0,
            rejected: 0,
        };

        for status in [
            PublicationStatus::Draft,
            PublicationStatus::Pending,
            PublicationStatus::Approved,
            PublicationStatus::Rejected,
        ] {
            let mut query =
                Publications::find().filter(publications::Column::Status.eq(status.as_str()));
            if !global {
                query = query.filter(publications::Column::CreatedBy.eq(user_id));
            }
            let count = query.count(db).await?;
            match status {
                PublicationStatus::Draft => counts.draft = count,
                PublicationStatus::Pending => counts.pending = count,
                PublicationStatus::Approved => counts.approved = count,
                PublicationStatus::Rejected => counts.rejected = count,
            }
        }

        let own_files = Files::find()
            .filter(files::Column::UserId.eq(user_id))
            .all(db)
            .await?;
        let files = FileTotals {
            count: own_files.len() as u64,
            total_size: own_files.iter().map(|f| f.file_size).sum(),
        };

        let (categories, users) = if global {
            (
                Some(Categories::find().count(db).await?),
                Some(Users::find().count(db).await?),
            )
        } else {
            (None, None)
        };

        Ok(DashboardStats {
            publications: counts,
            files,
            categories,
            users,
        })
    }
}
