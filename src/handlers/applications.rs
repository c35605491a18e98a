use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::app::AppState;
use crate::database::models::GroupApplication;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::ApplicationDecision;
use crate::stats::{get_group_application_stats, Point};

use super::require_member;

/// POST /api/groups/:id/applications - apply as the current user
pub async fn create(State(state): State<AppState>, auth: AuthUser, Path(group_id): Path<i64>) -> ApiResult<GroupApplication> {
    let application = state.applications.apply(auth.user_id, group_id).await?;
    Ok(ApiResponse::created(application))
}

/// PATCH /api/applications/:id - accept, decline or withdraw
pub async fn decide(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    payload: Result<Json<ApplicationDecision>, JsonRejection>,
) -> ApiResult<GroupApplication> {
    let Json(decision) = payload?;
    let application = state.applications.decide(auth.user_id, id, decision).await?;
    Ok(ApiResponse::success(application))
}

/// GET /api/groups/:id/application-stats
pub async fn stats(State(state): State<AppState>, auth: AuthUser, Path(group_id): Path<i64>) -> ApiResult<Vec<Point>> {
    let ds = state.models.datastore();
    let group = ds.get_group(group_id).await?;
    require_member(ds, group_id, auth.user_id).await?;
    Ok(ApiResponse::success(get_group_application_stats(ds, &group).await?))
}
