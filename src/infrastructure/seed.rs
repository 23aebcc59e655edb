use crate::config::AppConfig;
use crate::entities::{prelude::*, *};
use crate::services::permission_service::keys;
use crate::utils::auth::hash_password;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::info;
use uuid::Uuid;

/// Seeds the fixed permission catalog, the built-in roles and the admin
/// account. Every step is idempotent so the seed runs on each boot.
pub async fn seed_initial_data(db: &DatabaseConnection, config: &AppConfig) -> anyhow::Result<()> {
    info!("🌱 Seeding permission catalog and built-in roles...");

    let catalog: &[(&str, &str)] = &[
        (keys::CONTENT_CREATE, "Create and edit own publications"),
        (keys::CONTENT_REVIEW, "Approve or reject pending publications"),
        (keys::CATEGORIES_MANAGE, "Manage categories and subcategories"),
        (keys::NAVIGATION_MANAGE, "Manage navigation links"),
        (keys::ROLES_MANAGE, "Manage roles and their permissions"),
        (keys::USERS_MANAGE, "List users and assign roles"),
    ];

    for (key, description) in catalog {
        let exists = Permissions::find()
            .filter(permissions::Column::Key.eq(*key))
            .one(db)
            .await?;

        if exists.is_none() {
            let model = permissions::ActiveModel {
                id: Set(Uuid::new_v4().to_string()),
                key: Set(key.to_string()),
                description: Set(Some(description.to_string())),
            };
            model.insert(db).await?;
        }
    }

    let builtin_roles: &[(&str, &str, &[&str])] = &[
        (
            "admin",
            "Full access to every feature",
            &[
                keys::CONTENT_CREATE,
                keys::CONTENT_REVIEW,
                keys::CATEGORIES_MANAGE,
                keys::NAVIGATION_MANAGE,
                keys::ROLES_MANAGE,
                keys::USERS_MANAGE,
            ],
        ),
        ("editor", "Creates content", &[keys::CONTENT_CREATE]),
        (
            "moderator",
            "Creates and reviews content",
            &[keys::CONTENT_CREATE, keys::CONTENT_REVIEW],
        ),
    ];

    for (name, description, perm_keys) in builtin_roles {
        let role = match Roles::find()
            .filter(roles::Column::Name.eq(*name))
            .one(db)
            .await?
        {
            Some(role) => role,
            None => {
                let model = roles::ActiveModel {
                    id: Set(Uuid::new_v4().to_string()),
                    name: Set(name.to_string()),
                    description: Set(Some(description.to_string())),
                    is_system: Set(true),
                    created_at: Set(Some(Utc::now())),
                };
                model.insert(db).await?
            }
        };

        for key in *perm_keys {
            let permission = Permissions::find()
                .filter(permissions::Column::Key.eq(*key))
                .one(db)
                .await?
                .ok_or_else(|| anyhow::anyhow!("permission '{}' missing after seed", key))?;

            let linked = RolePermissions::find_by_id((role.id.clone(), permission.id.clone()))
                .one(db)
                .await?;

            if linked.is_none() {
                let model = role_permissions::ActiveModel {
                    role_id: Set(role.id.clone()),
                    permission_id: Set(permission.id.clone()),
                };
                model.insert(db).await?;
            }
        }
    }

    seed_admin_user(db, config).await?;

    Ok(())
}

async fn seed_admin_user(db: &DatabaseConnection, config: &AppConfig) -> anyhow::Result<()> {
    let existing = Users::find()
        .filter(users::Column::Username.eq(&config.admin_username))
        .one(db)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    info!("🌱 Creating admin account '{}'", config.admin_username);

    let admin = users::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        username: Set(config.admin_username.clone()),
        password_hash: Set(hash_password(&config.admin_password)?),
        email: Set(None),
        name: Set(Some("Administrator".to_string())),
        avatar_url: Set(None),
        created_at: Set(Some(Utc::now())),
    };
    let admin = admin.insert(db).await?;

    let admin_role = Roles::find()
        .filter(roles::Column::Name.eq("admin"))
        .one(db)
        .await?
        .ok_or_else(|| anyhow::anyhow!("admin role missing after seed"))?;

    let link = user_roles::ActiveModel {
        user_id: Set(admin.id),
        role_id: Set(admin_role.id),
    };
    link.insert(db).await?;

    Ok(())
}
