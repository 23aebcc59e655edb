use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::collections::HashSet;

/// The fixed permission catalog. Seeded at boot, referenced by handlers.
pub mod keys {
    pub const CONTENT_CREATE: &str = "content.create";
    pub const CONTENT_REVIEW: &str = "content.review";
    pub const CATEGORIES_MANAGE: &str = "categories.manage";
    pub const NAVIGATION_MANAGE: &str = "navigation.manage";
    pub const ROLES_MANAGE: &str = "roles.manage";
    pub const USERS_MANAGE: &str = "users.manage";
}

pub struct PermissionService;

impl PermissionService {
    /// All permission keys granted to a user through their roles.
    pub async fn user_permissions(
        db: &DatabaseConnection,
        user_id: &str,
    ) -> Result<HashSet<String>, AppError> {
        let role_ids: Vec<String> = UserRoles::find()
            .filter(user_roles::Column::UserId.eq(user_id))
            .all(db)
            .await?
            .into_iter()
            .map(|link| link.role_id)
            .collect();

        if role_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let permission_ids: Vec<String> = RolePermissions::find()
            .filter(role_permissions::Column::RoleId.is_in(role_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|link| link.permission_id)
            .collect();

        if permission_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let perms = Permissions::find()
            .filter(permissions::Column::Id.is_in(permission_ids))
            .all(db)
            .await?;

        Ok(perms.into_iter().map(|p| p.key).collect())
    }

    pub async fn has_permission(
        db: &DatabaseConnection,
        user_id: &str,
        key: &str,
    ) -> Result<bool, AppError> {
        Ok(Self::user_permissions(db, user_id).await?.contains(key))
    }

    /// Fails with 403 when the user lacks the permission.
    pub async fn require(
        db: &DatabaseConnection,
        user_id: &str,
        key: &str,
    ) -> Result<(), AppError> {
        if Self::has_permission(db, user_id, key).await? {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Missing permission '{}'",
                key
            )))
        }
    }
}
