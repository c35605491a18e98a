use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::database::datastore::{Datastore, StoreUpdateBatch};
use crate::database::manager::DatabaseError;
use crate::database::models::{
    ApplicationStatus, Conversation, ConversationMessage, ConversationMessageReaction,
    ConversationParticipant, ConversationThreadParticipant, ConversationType, Group,
    GroupApplication, GroupMembership, History, PickupDate, PickupSeries, Store,
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    groups: BTreeMap<i64, Group>,
    memberships: HashMap<(i64, i64), GroupMembership>,
    applications: BTreeMap<i64, GroupApplication>,
    conversations: BTreeMap<i64, Conversation>,
    messages: BTreeMap<i64, ConversationMessage>,
    participants: BTreeMap<i64, ConversationParticipant>,
    thread_participants: BTreeMap<i64, ConversationThreadParticipant>,
    reactions: BTreeMap<i64, ConversationMessageReaction>,
    stores: BTreeMap<i64, Store>,
    series: BTreeMap<i64, PickupSeries>,
    pickups: BTreeMap<i64, PickupDate>,
    history: BTreeMap<i64, History>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

fn fetch<T: Clone>(table: &BTreeMap<i64, T>, what: &str, id: i64) -> Result<T, DatabaseError> {
    table.get(&id).cloned().ok_or_else(|| DatabaseError::not_found(what, id))
}

fn replace<T: Clone>(table: &mut BTreeMap<i64, T>, what: &str, id: i64, row: &T) -> Result<T, DatabaseError> {
    match table.get_mut(&id) {
        Some(existing) => {
            *existing = row.clone();
            Ok(row.clone())
        }
        None => Err(DatabaseError::not_found(what, id)),
    }
}

/// In-process datastore used for development and tests
#[derive(Default)]
pub struct MemoryDatastore {
    tables: RwLock<Tables>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn get_group(&self, id: i64) -> Result<Group, DatabaseError> {
        fetch(&self.tables.read().await.groups, "Group", id)
    }

    async fn list_groups(&self) -> Result<Vec<Group>, DatabaseError> {
        Ok(self.tables.read().await.groups.values().cloned().collect())
    }

    async fn insert_group(&self, group: &Group) -> Result<Group, DatabaseError> {
        let mut tables = self.tables.write().await;
        let mut row = group.clone();
        row.id = tables.allocate_id();
        tables.groups.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_group(&self, group: &Group) -> Result<(), DatabaseError> {
        replace(&mut self.tables.write().await.groups, "Group", group.id, group).map(|_| ())
    }

    async fn get_membership(&self, group_id: i64, user_id: i64) -> Result<Option<GroupMembership>, DatabaseError> {
        Ok(self.tables.read().await.memberships.get(&(group_id, user_id)).cloned())
    }

    async fn upsert_membership(&self, membership: &GroupMembership) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.groups.contains_key(&membership.group_id) {
            return Err(DatabaseError::not_found("Group", membership.group_id));
        }
        tables
            .memberships
            .insert((membership.group_id, membership.user_id), membership.clone());
        Ok(())
    }

    async fn get_application(&self, id: i64) -> Result<GroupApplication, DatabaseError> {
        fetch(&self.tables.read().await.applications, "Application", id)
    }

    async fn insert_application(&self, application: &GroupApplication) -> Result<GroupApplication, DatabaseError> {
        let mut tables = self.tables.write().await;
        let mut row = application.clone();
        row.id = tables.allocate_id();
        tables.applications.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_application(&self, application: &GroupApplication) -> Result<GroupApplication, DatabaseError> {
        replace(&mut self.tables.write().await.applications, "Application", application.id, application)
    }

    async fn count_applications_by_status(&self, group_id: i64) -> Result<Vec<(ApplicationStatus, i64)>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut counts: BTreeMap<ApplicationStatus, i64> = BTreeMap::new();
        for application in tables.applications.values().filter(|a| a.group_id == group_id) {
            *counts.entry(application.status).or_insert(0) += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn has_pending_application(&self, group_id: i64, user_id: i64) -> Result<bool, DatabaseError> {
        Ok(self.tables.read().await.applications.values().any(|a| {
            a.group_id == group_id && a.user_id == user_id && a.status == ApplicationStatus::Pending
        }))
    }

    async fn get_conversation(&self, id: i64) -> Result<Conversation, DatabaseError> {
        fetch(&self.tables.read().await.conversations, "Conversation", id)
    }

    async fn find_conversation(&self, target_type: ConversationType, target_id: i64) -> Result<Option<Conversation>, DatabaseError> {
        Ok(self
            .tables
            .read()
            .await
            .conversations
            .values()
            .find(|c| c.target_type == target_type && c.target_id == Some(target_id))
            .cloned())
    }

    async fn insert_conversation(&self, conversation: &Conversation) -> Result<Conversation, DatabaseError> {
        let mut tables = self.tables.write().await;
        let mut row = conversation.clone();
        row.id = tables.allocate_id();
        tables.conversations.insert(row.id, row.clone());
        Ok(row)
    }

    async fn touch_conversation(&self, id: i64, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        let conversation = tables
            .conversations
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::not_found("Conversation", id))?;
        conversation.updated_at = at;
        Ok(())
    }

    async fn get_message(&self, id: i64) -> Result<ConversationMessage, DatabaseError> {
        fetch(&self.tables.read().await.messages, "Message", id)
    }

    async fn list_messages(&self, conversation_id: i64) -> Result<Vec<ConversationMessage>, DatabaseError> {
        Ok(self
            .tables
            .read()
            .await
            .messages
            .values()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    async fn insert_message(&self, message: &ConversationMessage) -> Result<ConversationMessage, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.conversations.contains_key(&message.conversation_id) {
            return Err(DatabaseError::not_found("Conversation", message.conversation_id));
        }
        let mut row = message.clone();
        row.id = tables.allocate_id();
        tables.messages.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_message(&self, message: &ConversationMessage) -> Result<ConversationMessage, DatabaseError> {
        replace(&mut self.tables.write().await.messages, "Message", message.id, message)
    }

    async fn get_participant(&self, id: i64) -> Result<ConversationParticipant, DatabaseError> {
        fetch(&self.tables.read().await.participants, "Participant", id)
    }

    async fn find_participant(&self, conversation_id: i64, user_id: i64) -> Result<Option<ConversationParticipant>, DatabaseError> {
        Ok(self
            .tables
            .read()
            .await
            .participants
            .values()
            .find(|p| p.conversation_id == conversation_id && p.user_id == user_id)
            .cloned())
    }

    async fn list_participants(&self, conversation_id: i64) -> Result<Vec<ConversationParticipant>, DatabaseError> {
        Ok(self
            .tables
            .read()
            .await
            .participants
            .values()
            .filter(|p| p.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    async fn insert_participant(&self, participant: &ConversationParticipant) -> Result<ConversationParticipant, DatabaseError> {
        let mut tables = self.tables.write().await;
        let duplicate = tables
            .participants
            .values()
            .any(|p| p.conversation_id == participant.conversation_id && p.user_id == participant.user_id);
        if duplicate {
            return Err(DatabaseError::QueryError(format!(
                "user {} already participates in conversation {}",
                participant.user_id, participant.conversation_id
            )));
        }
        let mut row = participant.clone();
        row.id = tables.allocate_id();
        tables.participants.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_participant(&self, participant: &ConversationParticipant) -> Result<ConversationParticipant, DatabaseError> {
        replace(&mut self.tables.write().await.participants, "Participant", participant.id, participant)
    }

    async fn delete_participant(&self, id: i64) -> Result<(), DatabaseError> {
        self.tables
            .write()
            .await
            .participants
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DatabaseError::not_found("Participant", id))
    }

    async fn find_thread_participant(&self, thread_id: i64, user_id: i64) -> Result<Option<ConversationThreadParticipant>, DatabaseError> {
        Ok(self
            .tables
            .read()
            .await
            .thread_participants
            .values()
            .find(|p| p.thread_id == thread_id && p.user_id == user_id)
            .cloned())
    }

    async fn list_thread_participants(&self, thread_id: i64) -> Result<Vec<ConversationThreadParticipant>, DatabaseError> {
        Ok(self
            .tables
            .read()
            .await
            .thread_participants
            .values()
            .filter(|p| p.thread_id == thread_id)
            .cloned()
            .collect())
    }

    async fn insert_thread_participant(&self, participant: &ConversationThreadParticipant) -> Result<ConversationThreadParticipant, DatabaseError> {
        let mut tables = self.tables.write().await;
        let mut row = participant.clone();
        row.id = tables.allocate_id();
        tables.thread_participants.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_thread_participant(&self, participant: &ConversationThreadParticipant) -> Result<ConversationThreadParticipant, DatabaseError> {
        replace(&mut self.tables.write().await.thread_participants, "ThreadParticipant", participant.id, participant)
    }

    async fn get_reaction(&self, id: i64) -> Result<ConversationMessageReaction, DatabaseError> {
        fetch(&self.tables.read().await.reactions, "Reaction", id)
    }

    async fn insert_reaction(&self, reaction: &ConversationMessageReaction) -> Result<ConversationMessageReaction, DatabaseError> {
        let mut tables = self.tables.write().await;
        let mut row = reaction.clone();
        row.id = tables.allocate_id();
        tables.reactions.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_store(&self, id: i64) -> Result<Store, DatabaseError> {
        fetch(&self.tables.read().await.stores, "Store", id)
    }

    async fn insert_store(&self, store: &Store) -> Result<Store, DatabaseError> {
        let mut tables = self.tables.write().await;
        let mut row = store.clone();
        row.id = tables.allocate_id();
        tables.stores.insert(row.id, row.clone());
        Ok(row)
    }

    async fn commit_store_update(&self, batch: StoreUpdateBatch) -> Result<(), DatabaseError> {
        // One write guard for the whole batch; validate before mutating anything
        let mut tables = self.tables.write().await;

        if let Some(store) = &batch.store {
            if !tables.stores.contains_key(&store.id) {
                return Err(DatabaseError::not_found("Store", store.id));
            }
        }
        if let Some(series) = batch.series.iter().find(|s| !tables.series.contains_key(&s.id)) {
            return Err(DatabaseError::not_found("PickupSeries", series.id));
        }

        if let Some(store) = batch.store {
            tables.stores.insert(store.id, store);
        }
        for series in batch.series {
            tables.series.insert(series.id, series);
        }
        for id in batch.pickups_to_delete {
            tables.pickups.remove(&id);
        }
        for pickup in batch.pickups_to_create {
            let mut row = pickup;
            row.id = tables.allocate_id();
            tables.pickups.insert(row.id, row);
        }
        if let Some(history) = batch.history {
            let mut row = history;
            row.id = tables.allocate_id();
            tables.history.insert(row.id, row);
        }
        Ok(())
    }

    async fn get_pickup(&self, id: i64) -> Result<PickupDate, DatabaseError> {
        fetch(&self.tables.read().await.pickups, "Pickup", id)
    }

    async fn insert_pickup(&self, pickup: &PickupDate) -> Result<PickupDate, DatabaseError> {
        let mut tables = self.tables.write().await;
        let mut row = pickup.clone();
        row.id = tables.allocate_id();
        tables.pickups.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_pickup(&self, pickup: &PickupDate) -> Result<PickupDate, DatabaseError> {
        replace(&mut self.tables.write().await.pickups, "Pickup", pickup.id, pickup)
    }

    async fn delete_pickup(&self, id: i64) -> Result<(), DatabaseError> {
        self.tables
            .write()
            .await
            .pickups
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DatabaseError::not_found("Pickup", id))
    }

    async fn list_pickups_for_series(&self, series_id: i64) -> Result<Vec<PickupDate>, DatabaseError> {
        Ok(self
            .tables
            .read()
            .await
            .pickups
            .values()
            .filter(|p| p.series_id == Some(series_id))
            .cloned()
            .collect())
    }

    async fn insert_series(&self, series: &PickupSeries) -> Result<PickupSeries, DatabaseError> {
        let mut tables = self.tables.write().await;
        let mut row = series.clone();
        row.id = tables.allocate_id();
        tables.series.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list_series_for_store(&self, store_id: i64) -> Result<Vec<PickupSeries>, DatabaseError> {
        Ok(self
            .tables
            .read()
            .await
            .series
            .values()
            .filter(|s| s.store_id == store_id)
            .cloned()
            .collect())
    }

    async fn insert_history(&self, history: &History) -> Result<History, DatabaseError> {
        let mut tables = self.tables.write().await;
        let mut row = history.clone();
        row.id = tables.allocate_id();
        tables.history.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list_history_for_store(&self, store_id: i64) -> Result<Vec<History>, DatabaseError> {
        Ok(self
            .tables
            .read()
            .await
            .history
            .values()
            .filter(|h| h.store_id == Some(store_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::StoreStatus;

    #[tokio::test]
    async fn counts_applications_per_status() {
        let db = MemoryDatastore::new();
        let now = Utc::now();
        let group = db.insert_group(&Group::new("A", now)).await.unwrap();
        let other = db.insert_group(&Group::new("B", now)).await.unwrap();

        for (status, n) in [(ApplicationStatus::Pending, 2), (ApplicationStatus::Declined, 1)] {
            for user in 0..n {
                let mut application = GroupApplication::new(group.id, user, now);
                application.status = status;
                db.insert_application(&application).await.unwrap();
            }
        }
        db.insert_application(&GroupApplication::new(other.id, 9, now)).await.unwrap();

        let counts = db.count_applications_by_status(group.id).await.unwrap();
        assert_eq!(counts, vec![(ApplicationStatus::Pending, 2), (ApplicationStatus::Declined, 1)]);
    }

    #[tokio::test]
    async fn store_batch_with_unknown_series_writes_nothing() {
        let db = MemoryDatastore::new();
        let group = db.insert_group(&Group::new("A", Utc::now())).await.unwrap();
        let store = db.insert_store(&Store::new(group.id, "Bakery")).await.unwrap();

        let mut changed = store.clone();
        changed.status = StoreStatus::Active;
        let mut ghost = PickupSeries::new(store.id, Utc::now());
        ghost.id = 999;

        let result = db
            .commit_store_update(StoreUpdateBatch {
                store: Some(changed),
                series: vec![ghost],
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(DatabaseError::NotFound(_))));
        assert_eq!(db.get_store(store.id).await.unwrap().status, StoreStatus::Created);
    }

    #[tokio::test]
    async fn duplicate_participant_is_rejected() {
        let db = MemoryDatastore::new();
        let now = Utc::now();
        let conversation = db
            .insert_conversation(&Conversation::new(ConversationType::Private, None, None, now))
            .await
            .unwrap();
        db.insert_participant(&ConversationParticipant::new(conversation.id, 1)).await.unwrap();
        assert!(db.insert_participant(&ConversationParticipant::new(conversation.id, 1)).await.is_err());
    }
}
