use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::database::manager::DatabaseError;
use crate::database::models::{
    ApplicationStatus, Conversation, ConversationMessage, ConversationMessageReaction,
    ConversationParticipant, ConversationThreadParticipant, ConversationType, Group,
    GroupApplication, GroupMembership, History, PickupDate, PickupSeries, Store,
};

/// Writes of a store update that must land together
#[derive(Debug, Clone, Default)]
pub struct StoreUpdateBatch {
    pub store: Option<Store>,
    pub series: Vec<PickupSeries>,
    pub pickups_to_create: Vec<PickupDate>,
    pub pickups_to_delete: Vec<i64>,
    pub history: Option<History>,
}

/// Persistence seam for all models. Plain writes here never emit signals;
/// signal-emitting writes go through `ModelService`.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Connectivity check; stores without a connection are always healthy
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    // === Groups ===
    async fn get_group(&self, id: i64) -> Result<Group, DatabaseError>;
    async fn list_groups(&self) -> Result<Vec<Group>, DatabaseError>;
    async fn insert_group(&self, group: &Group) -> Result<Group, DatabaseError>;
    async fn update_group(&self, group: &Group) -> Result<(), DatabaseError>;
    async fn get_membership(&self, group_id: i64, user_id: i64) -> Result<Option<GroupMembership>, DatabaseError>;
    async fn upsert_membership(&self, membership: &GroupMembership) -> Result<(), DatabaseError>;

    // === Applications ===
    async fn get_application(&self, id: i64) -> Result<GroupApplication, DatabaseError>;
    async fn insert_application(&self, application: &GroupApplication) -> Result<GroupApplication, DatabaseError>;
    async fn update_application(&self, application: &GroupApplication) -> Result<GroupApplication, DatabaseError>;
    async fn count_applications_by_status(&self, group_id: i64) -> Result<Vec<(ApplicationStatus, i64)>, DatabaseError>;
    async fn has_pending_application(&self, group_id: i64, user_id: i64) -> Result<bool, DatabaseError>;

    // === Conversations ===
    async fn get_conversation(&self, id: i64) -> Result<Conversation, DatabaseError>;
    async fn find_conversation(&self, target_type: ConversationType, target_id: i64) -> Result<Option<Conversation>, DatabaseError>;
    async fn insert_conversation(&self, conversation: &Conversation) -> Result<Conversation, DatabaseError>;
    async fn touch_conversation(&self, id: i64, at: DateTime<Utc>) -> Result<(), DatabaseError>;

    // === Messages ===
    async fn get_message(&self, id: i64) -> Result<ConversationMessage, DatabaseError>;
    async fn list_messages(&self, conversation_id: i64) -> Result<Vec<ConversationMessage>, DatabaseError>;
    async fn insert_message(&self, message: &ConversationMessage) -> Result<ConversationMessage, DatabaseError>;
    async fn update_message(&self, message: &ConversationMessage) -> Result<ConversationMessage, DatabaseError>;

    // === Participants ===
    async fn get_participant(&self, id: i64) -> Result<ConversationParticipant, DatabaseError>;
    async fn find_participant(&self, conversation_id: i64, user_id: i64) -> Result<Option<ConversationParticipant>, DatabaseError>;
    async fn list_participants(&self, conversation_id: i64) -> Result<Vec<ConversationParticipant>, DatabaseError>;
    async fn insert_participant(&self, participant: &ConversationParticipant) -> Result<ConversationParticipant, DatabaseError>;
    async fn update_participant(&self, participant: &ConversationParticipant) -> Result<ConversationParticipant, DatabaseError>;
    async fn delete_participant(&self, id: i64) -> Result<(), DatabaseError>;

    // === Thread participants ===
    async fn find_thread_participant(&self, thread_id: i64, user_id: i64) -> Result<Option<ConversationThreadParticipant>, DatabaseError>;
    async fn list_thread_participants(&self, thread_id: i64) -> Result<Vec<ConversationThreadParticipant>, DatabaseError>;
    async fn insert_thread_participant(&self, participant: &ConversationThreadParticipant) -> Result<ConversationThreadParticipant, DatabaseError>;
    async fn update_thread_participant(&self, participant: &ConversationThreadParticipant) -> Result<ConversationThreadParticipant, DatabaseError>;

    // === Reactions ===
    async fn get_reaction(&self, id: i64) -> Result<ConversationMessageReaction, DatabaseError>;
    async fn insert_reaction(&self, reaction: &ConversationMessageReaction) -> Result<ConversationMessageReaction, DatabaseError>;

    // === Stores ===
    async fn get_store(&self, id: i64) -> Result<Store, DatabaseError>;
    async fn insert_store(&self, store: &Store) -> Result<Store, DatabaseError>;
    /// Apply every write of the batch atomically
    async fn commit_store_update(&self, batch: StoreUpdateBatch) -> Result<(), DatabaseError>;

    // === Pickups ===
    async fn get_pickup(&self, id: i64) -> Result<PickupDate, DatabaseError>;
    async fn insert_pickup(&self, pickup: &PickupDate) -> Result<PickupDate, DatabaseError>;
    async fn update_pickup(&self, pickup: &PickupDate) -> Result<PickupDate, DatabaseError>;
    async fn delete_pickup(&self, id: i64) -> Result<(), DatabaseError>;
    async fn list_pickups_for_series(&self, series_id: i64) -> Result<Vec<PickupDate>, DatabaseError>;
    async fn insert_series(&self, series: &PickupSeries) -> Result<PickupSeries, DatabaseError>;
    async fn list_series_for_store(&self, store_id: i64) -> Result<Vec<PickupSeries>, DatabaseError>;

    // === History ===
    async fn insert_history(&self, history: &History) -> Result<History, DatabaseError>;
    async fn list_history_for_store(&self, store_id: i64) -> Result<Vec<History>, DatabaseError>;
}
