//! Fixtures for tests: an in-memory model service with a pinned clock and
//! recording stats/task sinks

use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::clock::{Clock, FixedClock};
use crate::database::models::{
    Conversation, ConversationMessage, ConversationParticipant, ConversationType, Group,
    GroupMembership, Store,
};
use crate::database::{Datastore, MemoryDatastore, ModelService};
use crate::observer::ObserverPipeline;
use crate::services::StoreService;
use crate::stats::RecordingWriter;
use crate::tasks::RecordingTaskQueue;

pub struct TestContext {
    pub datastore: Arc<MemoryDatastore>,
    pub stats: Arc<RecordingWriter>,
    pub tasks: Arc<RecordingTaskQueue>,
    pub clock: Arc<FixedClock>,
    pub models: ModelService,
    next_user: AtomicI64,
}

impl TestContext {
    pub fn new() -> Self {
        let datastore = Arc::new(MemoryDatastore::new());
        let stats = Arc::new(RecordingWriter::new());
        let tasks = Arc::new(RecordingTaskQueue::new());
        let clock = Arc::new(FixedClock::new(Self::start_time()));
        let models = ModelService::new(
            datastore.clone(),
            Arc::new(ObserverPipeline::with_default_observers()),
            stats.clone(),
            tasks.clone(),
            clock.clone(),
        );

        Self {
            datastore,
            stats,
            tasks,
            clock,
            models,
            next_user: AtomicI64::new(100),
        }
    }

    pub fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 10, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// A fresh user id
    pub fn next_user(&self) -> i64 {
        self.next_user.fetch_add(1, Ordering::SeqCst)
    }

    pub fn store_service(&self) -> StoreService {
        StoreService::new(self.models.clone())
    }

    pub async fn create_group(&self, name: &str) -> anyhow::Result<Group> {
        Ok(self.datastore.insert_group(&Group::new(name, self.now())).await?)
    }

    pub async fn create_group_with_conversation(&self, name: &str) -> anyhow::Result<(Group, Conversation)> {
        let group = self.create_group(name).await?;
        let conversation = Conversation::new(ConversationType::Group, Some(group.id), Some(group.id), self.now());
        let conversation = self.datastore.insert_conversation(&conversation).await?;
        Ok((group, conversation))
    }

    pub async fn add_member(&self, group_id: i64, user_id: i64) -> anyhow::Result<()> {
        self.datastore.upsert_membership(&GroupMembership::new(group_id, user_id)).await?;
        Ok(())
    }

    pub async fn add_editor(&self, group_id: i64, user_id: i64) -> anyhow::Result<()> {
        self.datastore.upsert_membership(&GroupMembership::editor(group_id, user_id)).await?;
        Ok(())
    }

    pub async fn create_store(&self, group_id: i64, name: &str) -> anyhow::Result<Store> {
        Ok(self.datastore.insert_store(&Store::new(group_id, name)).await?)
    }

    /// Add a conversation participant through the model service
    pub async fn join(&self, conversation_id: i64, user_id: i64) -> anyhow::Result<ConversationParticipant> {
        Ok(self.models.save(ConversationParticipant::new(conversation_id, user_id)).await?)
    }

    /// Write a top-level message through the model service
    pub async fn write(&self, conversation_id: i64, author_id: i64, content: &str) -> anyhow::Result<ConversationMessage> {
        let message = ConversationMessage::new(conversation_id, author_id, content, self.now());
        Ok(self.models.save(message).await?)
    }

    pub async fn messages_in(&self, conversation_id: i64) -> anyhow::Result<Vec<ConversationMessage>> {
        Ok(self.datastore.list_messages(conversation_id).await?)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
