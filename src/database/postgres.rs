use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::database::datastore::{Datastore, StoreUpdateBatch};
use crate::database::manager::DatabaseError;
use crate::database::models::{
    ApplicationStatus, Conversation, ConversationMessage, ConversationMessageReaction,
    ConversationParticipant, ConversationThreadParticipant, ConversationType, Group,
    GroupApplication, GroupMembership, History, PickupDate, PickupSeries, Store,
};

const STORE_COLUMNS: &str = "id, name, description, group_id, address, latitude, longitude, \
    weeks_in_advance, status, last_changed_message, last_changed_by, created_by";

const PICKUP_COLUMNS: &str = "id, series_id, store_id, date, description, cancelled_at, \
    last_changed_by, last_changed_message";

/// Datastore backed by a Postgres pool
#[derive(Clone)]
pub struct PgDatastore {
    pool: PgPool,
}

impl PgDatastore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_pickup_in(tx: &mut Transaction<'_, Postgres>, pickup: &PickupDate) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO pickup_dates (series_id, store_id, date, description, cancelled_at, last_changed_by, last_changed_message) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(pickup.series_id)
        .bind(pickup.store_id)
        .bind(pickup.date)
        .bind(&pickup.description)
        .bind(pickup.cancelled_at)
        .bind(pickup.last_changed_by)
        .bind(&pickup.last_changed_message)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

fn expect_row<T>(row: Option<T>, what: &str, id: i64) -> Result<T, DatabaseError> {
    row.ok_or_else(|| DatabaseError::not_found(what, id))
}

#[async_trait]
impl Datastore for PgDatastore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_group(&self, id: i64) -> Result<Group, DatabaseError> {
        let row = sqlx::query_as::<_, Group>("SELECT id, name, status, last_active_at FROM groups WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        expect_row(row, "Group", id)
    }

    async fn list_groups(&self) -> Result<Vec<Group>, DatabaseError> {
        Ok(sqlx::query_as::<_, Group>("SELECT id, name, status, last_active_at FROM groups ORDER BY id")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert_group(&self, group: &Group) -> Result<Group, DatabaseError> {
        Ok(sqlx::query_as::<_, Group>(
            "INSERT INTO groups (name, status, last_active_at) VALUES ($1, $2, $3) \
             RETURNING id, name, status, last_active_at",
        )
        .bind(&group.name)
        .bind(group.status.as_str())
        .bind(group.last_active_at)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_group(&self, group: &Group) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE groups SET name = $2, status = $3, last_active_at = $4 WHERE id = $1")
            .bind(group.id)
            .bind(&group.name)
            .bind(group.status.as_str())
            .bind(group.last_active_at)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Group", group.id));
        }
        Ok(())
    }

    async fn get_membership(&self, group_id: i64, user_id: i64) -> Result<Option<GroupMembership>, DatabaseError> {
        Ok(sqlx::query_as::<_, GroupMembership>(
            "SELECT group_id, user_id, roles FROM group_memberships WHERE group_id = $1 AND user_id = $2",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn upsert_membership(&self, membership: &GroupMembership) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO group_memberships (group_id, user_id, roles) VALUES ($1, $2, $3) \
             ON CONFLICT (group_id, user_id) DO UPDATE SET roles = EXCLUDED.roles",
        )
        .bind(membership.group_id)
        .bind(membership.user_id)
        .bind(&membership.roles)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_application(&self, id: i64) -> Result<GroupApplication, DatabaseError> {
        let row = sqlx::query_as::<_, GroupApplication>(
            "SELECT id, group_id, user_id, status, created_at, decided_at FROM group_applications WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        expect_row(row, "Application", id)
    }

    async fn insert_application(&self, application: &GroupApplication) -> Result<GroupApplication, DatabaseError> {
        Ok(sqlx::query_as::<_, GroupApplication>(
            "INSERT INTO group_applications (group_id, user_id, status, created_at, decided_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, group_id, user_id, status, created_at, decided_at",
        )
        .bind(application.group_id)
        .bind(application.user_id)
        .bind(application.status.as_str())
        .bind(application.created_at)
        .bind(application.decided_at)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_application(&self, application: &GroupApplication) -> Result<GroupApplication, DatabaseError> {
        let row = sqlx::query_as::<_, GroupApplication>(
            "UPDATE group_applications SET status = $2, decided_at = $3 WHERE id = $1 \
             RETURNING id, group_id, user_id, status, created_at, decided_at",
        )
        .bind(application.id)
        .bind(application.status.as_str())
        .bind(application.decided_at)
        .fetch_optional(&self.pool)
        .await?;
        expect_row(row, "Application", application.id)
    }

    async fn count_applications_by_status(&self, group_id: i64) -> Result<Vec<(ApplicationStatus, i64)>, DatabaseError> {
        let rows = sqlx::query(
            "SELECT status, COUNT(*) AS count FROM group_applications WHERE group_id = $1 GROUP BY status",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = Vec::with_capacity(rows.len());
        for row in rows {
            let status: String = row.try_get("status")?;
            let count: i64 = row.try_get("count")?;
            let status = status.parse::<ApplicationStatus>().map_err(DatabaseError::QueryError)?;
            counts.push((status, count));
        }
        counts.sort();
        Ok(counts)
    }

    async fn has_pending_application(&self, group_id: i64, user_id: i64) -> Result<bool, DatabaseError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM group_applications WHERE group_id = $1 AND user_id = $2 AND status = $3)",
        )
        .bind(group_id)
        .bind(user_id)
        .bind(ApplicationStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn get_conversation(&self, id: i64) -> Result<Conversation, DatabaseError> {
        let row = sqlx::query_as::<_, Conversation>(
            "SELECT id, target_type, target_id, group_id, updated_at FROM conversations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        expect_row(row, "Conversation", id)
    }

    async fn find_conversation(&self, target_type: ConversationType, target_id: i64) -> Result<Option<Conversation>, DatabaseError> {
        Ok(sqlx::query_as::<_, Conversation>(
            "SELECT id, target_type, target_id, group_id, updated_at FROM conversations \
             WHERE target_type = $1 AND target_id = $2",
        )
        .bind(target_type.as_str())
        .bind(target_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn insert_conversation(&self, conversation: &Conversation) -> Result<Conversation, DatabaseError> {
        Ok(sqlx::query_as::<_, Conversation>(
            "INSERT INTO conversations (target_type, target_id, group_id, updated_at) VALUES ($1, $2, $3, $4) \
             RETURNING id, target_type, target_id, group_id, updated_at",
        )
        .bind(conversation.target_type.as_str())
        .bind(conversation.target_id)
        .bind(conversation.group_id)
        .bind(conversation.updated_at)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn touch_conversation(&self, id: i64, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE conversations SET updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Conversation", id));
        }
        Ok(())
    }

    async fn get_message(&self, id: i64) -> Result<ConversationMessage, DatabaseError> {
        let row = sqlx::query_as::<_, ConversationMessage>(
            "SELECT id, conversation_id, author_id, content, thread_id, created_at FROM conversation_messages WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        expect_row(row, "Message", id)
    }

    async fn list_messages(&self, conversation_id: i64) -> Result<Vec<ConversationMessage>, DatabaseError> {
        Ok(sqlx::query_as::<_, ConversationMessage>(
            "SELECT id, conversation_id, author_id, content, thread_id, created_at FROM conversation_messages \
             WHERE conversation_id = $1 ORDER BY id",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_message(&self, message: &ConversationMessage) -> Result<ConversationMessage, DatabaseError> {
        Ok(sqlx::query_as::<_, ConversationMessage>(
            "INSERT INTO conversation_messages (conversation_id, author_id, content, thread_id, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, conversation_id, author_id, content, thread_id, created_at",
        )
        .bind(message.conversation_id)
        .bind(message.author_id)
        .bind(&message.content)
        .bind(message.thread_id)
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_message(&self, message: &ConversationMessage) -> Result<ConversationMessage, DatabaseError> {
        let row = sqlx::query_as::<_, ConversationMessage>(
            "UPDATE conversation_messages SET content = $2, thread_id = $3 WHERE id = $1 \
             RETURNING id, conversation_id, author_id, content, thread_id, created_at",
        )
        .bind(message.id)
        .bind(&message.content)
        .bind(message.thread_id)
        .fetch_optional(&self.pool)
        .await?;
        expect_row(row, "Message", message.id)
    }

    async fn get_participant(&self, id: i64) -> Result<ConversationParticipant, DatabaseError> {
        let row = sqlx::query_as::<_, ConversationParticipant>(
            "SELECT id, conversation_id, user_id, seen_up_to, email_notifications \
             FROM conversation_participants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        expect_row(row, "Participant", id)
    }

    async fn find_participant(&self, conversation_id: i64, user_id: i64) -> Result<Option<ConversationParticipant>, DatabaseError> {
        Ok(sqlx::query_as::<_, ConversationParticipant>(
            "SELECT id, conversation_id, user_id, seen_up_to, email_notifications \
             FROM conversation_participants WHERE conversation_id = $1 AND user_id = $2",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_participants(&self, conversation_id: i64) -> Result<Vec<ConversationParticipant>, DatabaseError> {
        Ok(sqlx::query_as::<_, ConversationParticipant>(
            "SELECT id, conversation_id, user_id, seen_up_to, email_notifications \
             FROM conversation_participants WHERE conversation_id = $1 ORDER BY id",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_participant(&self, participant: &ConversationParticipant) -> Result<ConversationParticipant, DatabaseError> {
        Ok(sqlx::query_as::<_, ConversationParticipant>(
            "INSERT INTO conversation_participants (conversation_id, user_id, seen_up_to, email_notifications) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, conversation_id, user_id, seen_up_to, email_notifications",
        )
        .bind(participant.conversation_id)
        .bind(participant.user_id)
        .bind(participant.seen_up_to)
        .bind(participant.email_notifications)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_participant(&self, participant: &ConversationParticipant) -> Result<ConversationParticipant, DatabaseError> {
        let row = sqlx::query_as::<_, ConversationParticipant>(
            "UPDATE conversation_participants SET seen_up_to = $2, email_notifications = $3 WHERE id = $1 \
             RETURNING id, conversation_id, user_id, seen_up_to, email_notifications",
        )
        .bind(participant.id)
        .bind(participant.seen_up_to)
        .bind(participant.email_notifications)
        .fetch_optional(&self.pool)
        .await?;
        expect_row(row, "Participant", participant.id)
    }

    async fn delete_participant(&self, id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM conversation_participants WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Participant", id));
        }
        Ok(())
    }

    async fn find_thread_participant(&self, thread_id: i64, user_id: i64) -> Result<Option<ConversationThreadParticipant>, DatabaseError> {
        Ok(sqlx::query_as::<_, ConversationThreadParticipant>(
            "SELECT id, thread_id, user_id, seen_up_to, muted \
             FROM conversation_thread_participants WHERE thread_id = $1 AND user_id = $2",
        )
        .bind(thread_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_thread_participants(&self, thread_id: i64) -> Result<Vec<ConversationThreadParticipant>, DatabaseError> {
        Ok(sqlx::query_as::<_, ConversationThreadParticipant>(
            "SELECT id, thread_id, user_id, seen_up_to, muted \
             FROM conversation_thread_participants WHERE thread_id = $1 ORDER BY id",
        )
        .bind(thread_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_thread_participant(&self, participant: &ConversationThreadParticipant) -> Result<ConversationThreadParticipant, DatabaseError> {
        Ok(sqlx::query_as::<_, ConversationThreadParticipant>(
            "INSERT INTO conversation_thread_participants (thread_id, user_id, seen_up_to, muted) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, thread_id, user_id, seen_up_to, muted",
        )
        .bind(participant.thread_id)
        .bind(participant.user_id)
        .bind(participant.seen_up_to)
        .bind(participant.muted)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_thread_participant(&self, participant: &ConversationThreadParticipant) -> Result<ConversationThreadParticipant, DatabaseError> {
        let row = sqlx::query_as::<_, ConversationThreadParticipant>(
            "UPDATE conversation_thread_participants SET seen_up_to = $2, muted = $3 WHERE id = $1 \
             RETURNING id, thread_id, user_id, seen_up_to, muted",
        )
        .bind(participant.id)
        .bind(participant.seen_up_to)
        .bind(participant.muted)
        .fetch_optional(&self.pool)
        .await?;
        expect_row(row, "ThreadParticipant", participant.id)
    }

    async fn get_reaction(&self, id: i64) -> Result<ConversationMessageReaction, DatabaseError> {
        let row = sqlx::query_as::<_, ConversationMessageReaction>(
            "SELECT id, message_id, user_id, name FROM conversation_message_reactions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        expect_row(row, "Reaction", id)
    }

    async fn insert_reaction(&self, reaction: &ConversationMessageReaction) -> Result<ConversationMessageReaction, DatabaseError> {
        Ok(sqlx::query_as::<_, ConversationMessageReaction>(
            "INSERT INTO conversation_message_reactions (message_id, user_id, name) VALUES ($1, $2, $3) \
             RETURNING id, message_id, user_id, name",
        )
        .bind(reaction.message_id)
        .bind(reaction.user_id)
        .bind(&reaction.name)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_store(&self, id: i64) -> Result<Store, DatabaseError> {
        let row = sqlx::query_as::<_, Store>(&format!("SELECT {} FROM stores WHERE id = $1", STORE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        expect_row(row, "Store", id)
    }

    async fn insert_store(&self, store: &Store) -> Result<Store, DatabaseError> {
        Ok(sqlx::query_as::<_, Store>(&format!(
            "INSERT INTO stores (name, description, group_id, address, latitude, longitude, weeks_in_advance, \
             status, last_changed_message, last_changed_by, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {}",
            STORE_COLUMNS
        ))
        .bind(&store.name)
        .bind(&store.description)
        .bind(store.group_id)
        .bind(&store.address)
        .bind(store.latitude)
        .bind(store.longitude)
        .bind(store.weeks_in_advance)
        .bind(store.status.as_str())
        .bind(&store.last_changed_message)
        .bind(store.last_changed_by)
        .bind(store.created_by)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn commit_store_update(&self, batch: StoreUpdateBatch) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        if let Some(store) = &batch.store {
            let result = sqlx::query(
                "UPDATE stores SET name = $2, description = $3, group_id = $4, address = $5, latitude = $6, \
                 longitude = $7, weeks_in_advance = $8, status = $9, last_changed_message = $10, \
                 last_changed_by = $11 WHERE id = $1",
            )
            .bind(store.id)
            .bind(&store.name)
            .bind(&store.description)
            .bind(store.group_id)
            .bind(&store.address)
            .bind(store.latitude)
            .bind(store.longitude)
            .bind(store.weeks_in_advance)
            .bind(store.status.as_str())
            .bind(&store.last_changed_message)
            .bind(store.last_changed_by)
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() == 0 {
                return Err(DatabaseError::not_found("Store", store.id));
            }
        }

        for series in &batch.series {
            let result = sqlx::query(
                "UPDATE pickup_series SET start_date = $2, description = $3, last_changed_by = $4, \
                 last_changed_message = $5 WHERE id = $1",
            )
            .bind(series.id)
            .bind(series.start_date)
            .bind(&series.description)
            .bind(series.last_changed_by)
            .bind(&series.last_changed_message)
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() == 0 {
                return Err(DatabaseError::not_found("PickupSeries", series.id));
            }
        }

        if !batch.pickups_to_delete.is_empty() {
            sqlx::query("DELETE FROM pickup_dates WHERE id = ANY($1)")
                .bind(&batch.pickups_to_delete)
                .execute(&mut *tx)
                .await?;
        }

        for pickup in &batch.pickups_to_create {
            Self::insert_pickup_in(&mut tx, pickup).await?;
        }

        if let Some(history) = &batch.history {
            sqlx::query(
                "INSERT INTO history (typus, group_id, store_id, users, payload, before, after, date) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(history.typus.as_str())
            .bind(history.group_id)
            .bind(history.store_id)
            .bind(&history.users)
            .bind(&history.payload)
            .bind(&history.before)
            .bind(&history.after)
            .bind(history.date)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_pickup(&self, id: i64) -> Result<PickupDate, DatabaseError> {
        let row = sqlx::query_as::<_, PickupDate>(&format!("SELECT {} FROM pickup_dates WHERE id = $1", PICKUP_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        expect_row(row, "Pickup", id)
    }

    async fn insert_pickup(&self, pickup: &PickupDate) -> Result<PickupDate, DatabaseError> {
        Ok(sqlx::query_as::<_, PickupDate>(&format!(
            "INSERT INTO pickup_dates (series_id, store_id, date, description, cancelled_at, last_changed_by, \
             last_changed_message) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            PICKUP_COLUMNS
        ))
        .bind(pickup.series_id)
        .bind(pickup.store_id)
        .bind(pickup.date)
        .bind(&pickup.description)
        .bind(pickup.cancelled_at)
        .bind(pickup.last_changed_by)
        .bind(&pickup.last_changed_message)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_pickup(&self, pickup: &PickupDate) -> Result<PickupDate, DatabaseError> {
        let row = sqlx::query_as::<_, PickupDate>(&format!(
            "UPDATE pickup_dates SET series_id = $2, date = $3, description = $4, cancelled_at = $5, \
             last_changed_by = $6, last_changed_message = $7 WHERE id = $1 RETURNING {}",
            PICKUP_COLUMNS
        ))
        .bind(pickup.id)
        .bind(pickup.series_id)
        .bind(pickup.date)
        .bind(&pickup.description)
        .bind(pickup.cancelled_at)
        .bind(pickup.last_changed_by)
        .bind(&pickup.last_changed_message)
        .fetch_optional(&self.pool)
        .await?;
        expect_row(row, "Pickup", pickup.id)
    }

    async fn delete_pickup(&self, id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM pickup_dates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Pickup", id));
        }
        Ok(())
    }

    async fn list_pickups_for_series(&self, series_id: i64) -> Result<Vec<PickupDate>, DatabaseError> {
        Ok(sqlx::query_as::<_, PickupDate>(&format!(
            "SELECT {} FROM pickup_dates WHERE series_id = $1 ORDER BY date",
            PICKUP_COLUMNS
        ))
        .bind(series_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_series(&self, series: &PickupSeries) -> Result<PickupSeries, DatabaseError> {
        Ok(sqlx::query_as::<_, PickupSeries>(
            "INSERT INTO pickup_series (store_id, start_date, description, last_changed_by, last_changed_message) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, store_id, start_date, description, last_changed_by, last_changed_message",
        )
        .bind(series.store_id)
        .bind(series.start_date)
        .bind(&series.description)
        .bind(series.last_changed_by)
        .bind(&series.last_changed_message)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_series_for_store(&self, store_id: i64) -> Result<Vec<PickupSeries>, DatabaseError> {
        Ok(sqlx::query_as::<_, PickupSeries>(
            "SELECT id, store_id, start_date, description, last_changed_by, last_changed_message \
             FROM pickup_series WHERE store_id = $1 ORDER BY id",
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_history(&self, history: &History) -> Result<History, DatabaseError> {
        Ok(sqlx::query_as::<_, History>(
            "INSERT INTO history (typus, group_id, store_id, users, payload, before, after, date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id, typus, group_id, store_id, users, payload, before, after, date",
        )
        .bind(history.typus.as_str())
        .bind(history.group_id)
        .bind(history.store_id)
        .bind(&history.users)
        .bind(&history.payload)
        .bind(&history.before)
        .bind(&history.after)
        .bind(history.date)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_history_for_store(&self, store_id: i64) -> Result<Vec<History>, DatabaseError> {
        Ok(sqlx::query_as::<_, History>(
            "SELECT id, typus, group_id, store_id, users, payload, before, after, date \
             FROM history WHERE store_id = $1 ORDER BY id",
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
