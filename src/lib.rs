pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::cache::ResponseCache;
use crate::services::file_service::FileService;
use crate::services::storage::StorageService;
use axum::{
    Router,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use api::handlers;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub storage: Arc<dyn StorageService>,
    pub file_service: Arc<FileService>,
    pub cache: ResponseCache,
    pub config: AppConfig,
}

pub fn create_app(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/navigation", get(handlers::nav_links::public_navigation))
        .route("/categories/menu", get(handlers::categories::menu))
        .route(
            "/public/publications",
            get(handlers::publications::public_list),
        )
        .route(
            "/public/publications/:slug",
            get(handlers::publications::public_get),
        );

    let protected = Router::new()
        // File manager
        .route("/folders", post(handlers::files::create_folder))
        .route("/folders/tree", get(handlers::files::folder_tree))
        .route(
            "/folders/:id",
            put(handlers::files::update_folder).delete(handlers::files::delete_folder),
        )
        .route("/folders/:id/path", get(handlers::files::folder_path))
        .route("/files", get(handlers::files::list_files))
        .route("/files/upload", post(handlers::files::upload_file))
        .route(
            "/files/:id",
            get(handlers::files::get_file).delete(handlers::files::delete_file),
        )
        .route("/files/:id/download", get(handlers::files::download_file))
        .route("/files/:id/rename", put(handlers::files::rename_file))
        .route("/files/bulk-move", post(handlers::files::bulk_move))
        .route("/files/bulk-delete", post(handlers::files::bulk_delete))
        // Sharing
        .route(
            "/shares",
            post(handlers::shares::create_share).get(handlers::shares::list_shares),
        )
        .route("/shares/:id", axum::routing::delete(handlers::shares::revoke_share))
        .route(
            "/shares/with-me/files",
            get(handlers::shares::shared_with_me_files),
        )
        .route(
            "/shares/with-me/folders",
            get(handlers::shares::shared_with_me_folders),
        )
        // Taxonomy
        .route(
            "/categories",
            get(handlers::categories::list_categories).post(handlers::categories::create_category),
        )
        .route(
            "/categories/:id",
            get(handlers::categories::get_category)
                .put(handlers::categories::update_category)
                .delete(handlers::categories::delete_category),
        )
        .route(
            "/categories/:id/subcategories",
            put(handlers::categories::set_subcategories),
        )
        .route(
            "/subcategories",
            get(handlers::subcategories::list_subcategories)
                .post(handlers::subcategories::create_subcategory),
        )
        .route(
            "/subcategories/:id",
            put(handlers::subcategories::update_subcategory)
                .delete(handlers::subcategories::delete_subcategory),
        )
        // Publications
        .route(
            "/publications",
            get(handlers::publications::list_publications)
                .post(handlers::publications::create_publication),
        )
        .route(
            "/publications/:id",
            get(handlers::publications::get_publication)
                .put(handlers::publications::update_publication)
                .delete(handlers::publications::delete_publication),
        )
        .route(
            "/publications/:id/submit",
            post(handlers::publications::submit_publication),
        )
        .route(
            "/publications/:id/approve",
            post(handlers::publications::approve_publication),
        )
        .route(
            "/publications/:id/reject",
            post(handlers::publications::reject_publication),
        )
        // Access control
        .route("/permissions", get(handlers::roles::list_permissions))
        .route(
            "/roles",
            get(handlers::roles::list_roles).post(handlers::roles::create_role),
        )
        .route(
            "/roles/:id",
            put(handlers::roles::update_role).delete(handlers::roles::delete_role),
        )
        .route(
            "/roles/:id/permissions",
            put(handlers::roles::set_role_permissions),
        )
        // Accounts
        .route("/users", get(handlers::users::list_users))
        .route("/users/:id/roles", put(handlers::users::set_user_roles))
        .route(
            "/users/me",
            get(handlers::users::get_profile).put(handlers::users::update_profile),
        )
        // Navigation management
        .route(
            "/nav-links",
            get(handlers::nav_links::list_nav_links).post(handlers::nav_links::create_nav_link),
        )
        .route(
            "/nav-links/reorder",
            put(handlers::nav_links::reorder_nav_links),
        )
        .route(
            "/nav-links/:id",
            put(handlers::nav_links::update_nav_link).delete(handlers::nav_links::delete_nav_link),
        )
        // Dashboard & system
        .route("/dashboard/stats", get(handlers::dashboard::dashboard_stats))
        .route("/system/cache", get(handlers::dashboard::cache_stats))
        .route_layer(from_fn_with_state(
            state.clone(),
            api::middleware::auth::auth_middleware,
        ));

    let allowed_origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    public
        .merge(protected)
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(axum::extract::DefaultBodyLimit::max(
            state.config.max_upload_size + 10 * 1024 * 1024, // multipart overhead buffer
        ))
        .with_state(state)
}
