use crate::api::error::AppError;
use crate::services::cache::CacheStats;
use crate::services::permission_service::{PermissionService, keys};
use crate::services::stats_service::{DashboardStats, StatsService};
use crate::utils::auth::Claims;
use axum::{Extension, Json, extract::State};

/// Dashboard numbers. Admins see site-wide totals, everyone else their
/// own scope.
pub async fn dashboard_stats(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<DashboardStats>, AppError> {
    let global =
        PermissionService::has_permission(&state.db, &claims.sub, keys::USERS_MANAGE).await?;

    let stats = StatsService::dashboard(&state.db, &claims.sub, global).await?;
    Ok(Json(stats))
}

/// What the response cache currently holds.
pub async fn cache_stats(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<CacheStats>, AppError> {
    PermissionService::require(&state.db, &claims.sub, keys::USERS_MANAGE).await?;
    Ok(Json(state.cache.stats()))
}
