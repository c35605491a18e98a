use std::collections::BTreeMap;

use crate::database::models::{Conversation, ConversationMessage, ConversationMessageReaction};
use crate::database::{DatabaseError, ModelService};
use crate::stats::applications::group_tags;
use crate::stats::{Point, MEASUREMENT_EVENTS};

/// Tags describing a conversation; group tags only when it belongs to one
async fn conversation_tags(models: &ModelService, conversation: &Conversation) -> Result<BTreeMap<String, String>, DatabaseError> {
    let mut tags = BTreeMap::from([("type".to_string(), conversation.target_type.to_string())]);
    if let Some(group_id) = conversation.group_id {
        let group = models.datastore().get_group(group_id).await?;
        tags.extend(group_tags(&group));
    }
    Ok(tags)
}

pub async fn message_written(models: &ModelService, message: &ConversationMessage) -> Result<(), DatabaseError> {
    let conversation = models.datastore().get_conversation(message.conversation_id).await?;
    let field = if message.is_thread_reply() { "thread_message" } else { "message" };

    let point = Point::new(MEASUREMENT_EVENTS)
        .tags(conversation_tags(models, &conversation).await?)
        .field(field, 1);
    models.stats().write_points(vec![point]);
    Ok(())
}

pub async fn reaction_given(models: &ModelService, reaction: &ConversationMessageReaction) -> Result<(), DatabaseError> {
    let message = models.datastore().get_message(reaction.message_id).await?;
    let conversation = models.datastore().get_conversation(message.conversation_id).await?;

    let point = Point::new(MEASUREMENT_EVENTS)
        .tags(conversation_tags(models, &conversation).await?)
        .field("message_reaction", 1);
    models.stats().write_points(vec![point]);
    Ok(())
}
