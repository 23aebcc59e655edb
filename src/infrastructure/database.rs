use crate::config::AppConfig;
use crate::entities::{
    audit_logs, categories, category_subcategories, files, folders, nav_links, permissions,
    publication_attachments, publications, role_permissions, roles, shares, subcategories,
    user_roles, users,
};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::env;
use std::time::Duration;
use tracing::info;

pub async fn setup_database(config: &AppConfig) -> anyhow::Result<DatabaseConnection> {
    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    info!("📂 Database: {}", db_url);

    let mut opt = ConnectOptions::new(&db_url);
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;
    crate::infrastructure::seed::seed_initial_data(&db, config).await?;

    Ok(db)
}

/// Bootstraps the schema from the entity definitions, in foreign-key
/// dependency order. Statements are `IF NOT EXISTS` so restarts are cheap.
pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let stmts = vec![
        schema
            .create_table_from_entity(users::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(roles::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(permissions::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(role_permissions::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(user_roles::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(folders::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(files::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(shares::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(categories::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(subcategories::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(category_subcategories::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(publications::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(publication_attachments::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(nav_links::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(audit_logs::Entity)
            .if_not_exists()
            .to_owned(),
    ];

    for stmt in stmts {
        let stmt = builder.build(&stmt);
        db.execute(stmt).await?;
    }

    // Hot-path lookup indexes not derivable from the entities
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_folders_parent_id ON folders(parent_id);",
        "CREATE INDEX IF NOT EXISTS idx_files_folder_id ON files(folder_id);",
        "CREATE INDEX IF NOT EXISTS idx_files_user_id ON files(user_id);",
        "CREATE INDEX IF NOT EXISTS idx_shares_grantee ON shares(shared_with_user_id);",
        "CREATE INDEX IF NOT EXISTS idx_publications_status ON publications(status);",
    ];
    for sql in indexes {
        let _ = db
            .execute(sea_orm::Statement::from_string(builder, sql.to_string()))
            .await;
    }

    Ok(())
}
