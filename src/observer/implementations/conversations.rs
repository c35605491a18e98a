use async_trait::async_trait;
use std::time::Duration;

use crate::config;
use crate::database::models::{
    ConversationMessage, ConversationMessageReaction, ConversationParticipant,
    ConversationThreadParticipant, ModelKind,
};
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, PostSaveObserver, PreDeleteObserver, PreSaveObserver, Signal};
use crate::stats;
use crate::tasks::Job;

/// Initializes a thread on its first reply and adds the reply author to it
pub struct CreateThreadParticipant;

impl Observer for CreateThreadParticipant {
    fn name(&self) -> &'static str {
        "create_thread_participant"
    }

    fn signal(&self) -> Signal {
        Signal::PreSave
    }

    fn applies_to_model(&self, kind: ModelKind) -> bool {
        kind == ModelKind::Message
    }

    fn priority(&self) -> u8 {
        10
    }
}

#[async_trait]
impl PreSaveObserver for CreateThreadParticipant {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let message: ConversationMessage = ctx.require_instance(self.name())?;
        let thread_id = match message.thread_id {
            Some(thread_id) if message.is_thread_reply() => thread_id,
            _ => return Ok(()),
        };

        let ds = ctx.models.datastore();
        let mut thread = ds.get_message(thread_id).await?;
        if thread.conversation_id != message.conversation_id {
            return Err(ObserverError::ValidationError(
                "Thread is not in the same conversation".to_string(),
            ));
        }
        if thread.is_thread_reply() {
            return Err(ObserverError::ValidationError(
                "Replies cannot start their own thread".to_string(),
            ));
        }

        if thread.thread_id.is_none() {
            ds.insert_thread_participant(&ConversationThreadParticipant::new(thread.id, thread.author_id))
                .await?;
            thread.thread_id = Some(thread.id);
            ds.update_message(&thread).await?;
            tracing::debug!("Initialized thread {}", thread.id);
        }

        if message.author_id != thread.author_id
            && ds.find_thread_participant(thread.id, message.author_id).await?.is_none()
        {
            ds.insert_thread_participant(&ConversationThreadParticipant::new(thread.id, message.author_id))
                .await?;
        }

        Ok(())
    }
}

/// Authors have read what they just wrote
pub struct MarkAsRead;

impl Observer for MarkAsRead {
    fn name(&self) -> &'static str {
        "mark_as_read"
    }

    fn signal(&self) -> Signal {
        Signal::PostSave
    }

    fn applies_to_model(&self, kind: ModelKind) -> bool {
        kind == ModelKind::Message
    }

    fn priority(&self) -> u8 {
        10
    }
}

#[async_trait]
impl PostSaveObserver for MarkAsRead {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError> {
        if !ctx.created {
            return Ok(());
        }
        let message: ConversationMessage = ctx.require_instance(self.name())?;
        let ds = ctx.models.datastore();

        match message.thread_id {
            Some(thread_id) if message.is_thread_reply() => {
                let mut participant = ds
                    .find_thread_participant(thread_id, message.author_id)
                    .await?
                    .ok_or_else(|| {
                        ObserverError::NotFound(format!(
                            "user {} is not a participant of thread {}",
                            message.author_id, thread_id
                        ))
                    })?;
                participant.seen_up_to = Some(message.id);
                ds.update_thread_participant(&participant).await?;
            }
            _ => {
                let mut participant = ds
                    .find_participant(message.conversation_id, message.author_id)
                    .await?
                    .ok_or_else(|| {
                        ObserverError::NotFound(format!(
                            "user {} is not a participant of conversation {}",
                            message.author_id, message.conversation_id
                        ))
                    })?;
                participant.seen_up_to = Some(message.id);
                ctx.models.save(participant).await?;
            }
        }

        Ok(())
    }
}

/// Schedules the delayed notification job for a new message
pub struct NotifyParticipants;

impl Observer for NotifyParticipants {
    fn name(&self) -> &'static str {
        "notify_participants"
    }

    fn signal(&self) -> Signal {
        Signal::PostSave
    }

    fn applies_to_model(&self, kind: ModelKind) -> bool {
        kind == ModelKind::Message
    }
}

#[async_trait]
impl PostSaveObserver for NotifyParticipants {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError> {
        if !ctx.created {
            return Ok(());
        }
        let message: ConversationMessage = ctx.require_instance(self.name())?;
        let delay = Duration::from_secs(config::config().tasks.notification_delay_secs);
        ctx.models
            .tasks()
            .schedule(Job::NotifyParticipants { message_id: message.id }, delay)?;
        Ok(())
    }
}

pub struct MessageCreated;

impl Observer for MessageCreated {
    fn name(&self) -> &'static str {
        "message_created"
    }

    fn signal(&self) -> Signal {
        Signal::PostSave
    }

    fn applies_to_model(&self, kind: ModelKind) -> bool {
        kind == ModelKind::Message
    }

    fn priority(&self) -> u8 {
        90
    }
}

#[async_trait]
impl PostSaveObserver for MessageCreated {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError> {
        if !ctx.created {
            return Ok(());
        }
        let message: ConversationMessage = ctx.require_instance(self.name())?;
        stats::conversations::message_written(&ctx.models, &message).await?;
        Ok(())
    }
}

pub struct ReactionCreated;

impl Observer for ReactionCreated {
    fn name(&self) -> &'static str {
        "reaction_created"
    }

    fn signal(&self) -> Signal {
        Signal::PostSave
    }

    fn applies_to_model(&self, kind: ModelKind) -> bool {
        kind == ModelKind::Reaction
    }

    fn priority(&self) -> u8 {
        90
    }
}

#[async_trait]
impl PostSaveObserver for ReactionCreated {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError> {
        if !ctx.created {
            return Ok(());
        }
        let reaction: ConversationMessageReaction = ctx.require_instance(self.name())?;
        stats::conversations::reaction_given(&ctx.models, &reaction).await?;
        Ok(())
    }
}

pub struct SetConversationUpdatedAtOnCreate;

impl Observer for SetConversationUpdatedAtOnCreate {
    fn name(&self) -> &'static str {
        "set_conversation_updated_at_on_create"
    }

    fn signal(&self) -> Signal {
        Signal::PostSave
    }

    fn applies_to_model(&self, kind: ModelKind) -> bool {
        kind == ModelKind::Participant
    }
}

#[async_trait]
impl PostSaveObserver for SetConversationUpdatedAtOnCreate {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError> {
        if !ctx.created {
            return Ok(());
        }
        let participant: ConversationParticipant = ctx.require_instance(self.name())?;
        ctx.models
            .datastore()
            .touch_conversation(participant.conversation_id, ctx.models.now())
            .await?;
        Ok(())
    }
}

pub struct SetConversationUpdatedAtOnDelete;

impl Observer for SetConversationUpdatedAtOnDelete {
    fn name(&self) -> &'static str {
        "set_conversation_updated_at_on_delete"
    }

    fn signal(&self) -> Signal {
        Signal::PreDelete
    }

    fn applies_to_model(&self, kind: ModelKind) -> bool {
        kind == ModelKind::Participant
    }
}

#[async_trait]
impl PreDeleteObserver for SetConversationUpdatedAtOnDelete {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError> {
        let participant: ConversationParticipant = ctx.require_instance(self.name())?;
        ctx.models
            .datastore()
            .touch_conversation(participant.conversation_id, ctx.models.now())
            .await?;
        Ok(())
    }
}
