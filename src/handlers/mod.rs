// HTTP handlers. Every route except /health requires a Bearer JWT
// (see `middleware::AuthUser`); group-scoped routes also check membership.
pub mod applications;
pub mod conversations;
pub mod health;
pub mod pickups;
pub mod stores;

use crate::database::models::GroupMembership;
use crate::database::Datastore;
use crate::error::ApiError;

pub(crate) async fn require_member(ds: &dyn Datastore, group_id: i64, user_id: i64) -> Result<GroupMembership, ApiError> {
    ds.get_membership(group_id, user_id)
        .await?
        .ok_or_else(|| ApiError::forbidden("You are not a member of this group."))
}

pub(crate) async fn require_editor(ds: &dyn Datastore, group_id: i64, user_id: i64) -> Result<GroupMembership, ApiError> {
    let membership = require_member(ds, group_id, user_id).await?;
    if !membership.is_editor() {
        return Err(ApiError::forbidden("You need to be a group editor"));
    }
    Ok(membership)
}
