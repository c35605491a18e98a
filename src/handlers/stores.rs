use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::database::models::{History, Store};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

use super::require_member;

/// POST /api/stores
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Store> {
    let Json(payload) = payload?;
    let store = state.stores.create(auth.user_id, payload).await?;
    Ok(ApiResponse::created(store))
}

/// GET /api/stores/:id
pub async fn get(State(state): State<AppState>, auth: AuthUser, Path(id): Path<i64>) -> ApiResult<Store> {
    let store = state.stores.get(id).await?;
    require_member(state.models.datastore(), store.group_id, auth.user_id).await?;
    Ok(ApiResponse::success(store))
}

/// PATCH /api/stores/:id - partial update; permission checks happen in the service
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Store> {
    let Json(payload) = payload?;
    let store = state.stores.update(auth.user_id, id, payload).await?;
    Ok(ApiResponse::success(store))
}

/// GET /api/stores/:id/history
pub async fn history(State(state): State<AppState>, auth: AuthUser, Path(id): Path<i64>) -> ApiResult<Vec<History>> {
    let store = state.stores.get(id).await?;
    require_member(state.models.datastore(), store.group_id, auth.user_id).await?;
    Ok(ApiResponse::success(state.stores.history(id).await?))
}
