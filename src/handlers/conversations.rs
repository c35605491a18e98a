use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::app::AppState;
use crate::database::models::{ConversationMessage, ConversationMessageReaction, ConversationParticipant};
use crate::database::Datastore;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

use super::require_member;

#[derive(Debug, Deserialize, Validate)]
pub struct MessageInput {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub content: String,
    /// Root message when replying in a thread
    pub thread: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReactionInput {
    #[validate(length(min = 1, max = 100, message = "Invalid reaction name"))]
    pub name: String,
}

async fn require_participant(ds: &dyn Datastore, conversation_id: i64, user_id: i64) -> Result<ConversationParticipant, ApiError> {
    ds.get_conversation(conversation_id).await?;
    ds.find_participant(conversation_id, user_id)
        .await?
        .ok_or_else(|| ApiError::forbidden("You are not in this conversation"))
}

/// GET /api/conversations/:id/messages
pub async fn list_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Vec<ConversationMessage>> {
    let ds = state.models.datastore();
    require_participant(ds, id, auth.user_id).await?;
    Ok(ApiResponse::success(ds.list_messages(id).await?))
}

/// POST /api/conversations/:id/messages
pub async fn create_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    payload: Result<Json<MessageInput>, JsonRejection>,
) -> ApiResult<ConversationMessage> {
    let Json(input) = payload?;
    input.validate()?;
    require_participant(state.models.datastore(), id, auth.user_id).await?;

    let now = state.models.now();
    let message = match input.thread {
        Some(thread) => ConversationMessage::reply_to(thread, id, auth.user_id, input.content, now),
        None => ConversationMessage::new(id, auth.user_id, input.content, now),
    };
    let message = state.models.save(message).await?;
    Ok(ApiResponse::created(message))
}

/// POST /api/messages/:id/reactions
pub async fn create_reaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    payload: Result<Json<ReactionInput>, JsonRejection>,
) -> ApiResult<ConversationMessageReaction> {
    let Json(input) = payload?;
    input.validate()?;
    let message = state.models.datastore().get_message(id).await?;
    require_participant(state.models.datastore(), message.conversation_id, auth.user_id).await?;

    let reaction = state
        .models
        .save(ConversationMessageReaction::new(id, auth.user_id, input.name))
        .await?;
    Ok(ApiResponse::created(reaction))
}

/// POST /api/conversations/:id/participants - join as the current user
pub async fn join(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<ConversationParticipant> {
    let ds = state.models.datastore();
    let conversation = ds.get_conversation(id).await?;
    if let Some(group_id) = conversation.group_id {
        require_member(ds, group_id, auth.user_id).await?;
    }
    if ds.find_participant(id, auth.user_id).await?.is_some() {
        return Err(ApiError::conflict("You are already in this conversation"));
    }

    let participant = state.models.save(ConversationParticipant::new(id, auth.user_id)).await?;
    Ok(ApiResponse::created(participant))
}

/// DELETE /api/conversations/:id/participants/me
pub async fn leave(State(state): State<AppState>, auth: AuthUser, Path(id): Path<i64>) -> ApiResult<()> {
    let participant = state
        .models
        .datastore()
        .find_participant(id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("You are not in this conversation"))?;
    state.models.delete(participant).await?;
    Ok(ApiResponse::<()>::no_content())
}
