use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::PickupDate;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

use super::require_editor;

#[derive(Debug, Deserialize)]
pub struct CancelInput {
    /// Posted to the pickup conversation
    #[serde(default)]
    pub message: String,
}

/// POST /api/pickups/:id/cancel
pub async fn cancel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    payload: Result<Json<CancelInput>, JsonRejection>,
) -> ApiResult<PickupDate> {
    let Json(input) = payload?;
    let ds = state.models.datastore();
    let mut pickup = ds.get_pickup(id).await?;
    let store = ds.get_store(pickup.store_id).await?;
    require_editor(ds, store.group_id, auth.user_id).await?;

    if pickup.is_cancelled() {
        return Err(ApiError::conflict("Pickup is already cancelled"));
    }
    let now = state.models.now();
    if pickup.date < now {
        return Err(ApiError::bad_request("You can't cancel a pickup that is in the past"));
    }

    pickup.cancelled_at = Some(now);
    pickup.last_changed_by = Some(auth.user_id);
    pickup.last_changed_message = input.message;
    let pickup = state.models.save(pickup).await?;
    Ok(ApiResponse::success(pickup))
}
