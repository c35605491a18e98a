use async_trait::async_trait;

use crate::database::models::{
    Conversation, ConversationMessage, ConversationParticipant, ConversationType, ModelKind, PickupDate,
};
use crate::database::ModelService;
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, PreSaveObserver, Signal};

/// Posts the cancellation message into the pickup's conversation when a
/// pickup is cancelled
pub struct SendMessageOnCancelledPickup;

impl Observer for SendMessageOnCancelledPickup {
    fn name(&self) -> &'static str {
        "send_message_on_cancelled_pickup"
    }

    fn signal(&self) -> Signal {
        Signal::PreSave
    }

    fn applies_to_model(&self, kind: ModelKind) -> bool {
        kind == ModelKind::Pickup
    }
}

#[async_trait]
impl PreSaveObserver for SendMessageOnCancelledPickup {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        if ctx.created {
            return Ok(());
        }
        let pickup: PickupDate = ctx.require_instance(self.name())?;
        let old = match ctx.previous_as::<PickupDate>() {
            Some(old) => old,
            None => ctx.models.datastore().get_pickup(pickup.id).await?,
        };

        if pickup.cancelled_at.is_none() || old.cancelled_at.is_some() {
            return Ok(());
        }

        let author = pickup.last_changed_by.ok_or_else(|| {
            ObserverError::ValidationError("A cancelled pickup needs last_changed_by".to_string())
        })?;

        let conversation = pickup_conversation(&ctx.models, &pickup).await?;
        if ctx.models.datastore().find_participant(conversation.id, author).await?.is_none() {
            ctx.models.save(ConversationParticipant::new(conversation.id, author)).await?;
        }

        let message = ConversationMessage::new(
            conversation.id,
            author,
            pickup.last_changed_message.clone(),
            ctx.models.now(),
        );
        ctx.models.save(message).await?;
        tracing::info!("Pickup {} cancelled by user {}", pickup.id, author);
        Ok(())
    }
}

/// The pickup's conversation, created on first use
pub async fn pickup_conversation(models: &ModelService, pickup: &PickupDate) -> Result<Conversation, ObserverError> {
    let ds = models.datastore();
    if let Some(conversation) = ds.find_conversation(ConversationType::Pickup, pickup.id).await? {
        return Ok(conversation);
    }

    let store = ds.get_store(pickup.store_id).await?;
    let conversation = Conversation::new(ConversationType::Pickup, Some(pickup.id), Some(store.group_id), models.now());
    Ok(ds.insert_conversation(&conversation).await?)
}

#[cfg(test)]
mod tests {
    use crate::database::models::{ConversationType, PickupDate};
    use crate::database::Datastore;
    use crate::observer::ObserverError;
    use crate::testing::TestContext;
    use chrono::Duration;

    async fn pickup(test: &TestContext) -> PickupDate {
        let group = test.create_group("Pickups").await.unwrap();
        let store = test.create_store(group.id, "Bakery").await.unwrap();
        test.datastore
            .insert_pickup(&PickupDate::new(store.id, test.now() + Duration::days(1)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn cancelling_posts_message_to_pickup_conversation() {
        let test = TestContext::new();
        let mut pickup = pickup(&test).await;

        pickup.cancelled_at = Some(test.now());
        pickup.last_changed_by = Some(5);
        pickup.last_changed_message = "Shop closed today".to_string();
        test.models.save(pickup.clone()).await.unwrap();

        let conversation = test
            .datastore
            .find_conversation(ConversationType::Pickup, pickup.id)
            .await
            .unwrap()
            .expect("pickup conversation");
        let messages = test.messages_in(conversation.id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].author_id, 5);
        assert_eq!(messages[0].content, "Shop closed today");
    }

    #[tokio::test]
    async fn already_cancelled_pickup_sends_nothing() {
        let test = TestContext::new();
        let mut pickup = pickup(&test).await;
        pickup.cancelled_at = Some(test.now());
        pickup.last_changed_by = Some(5);
        let pickup = test.models.save(pickup).await.unwrap();

        let mut again = pickup.clone();
        again.last_changed_message = "still closed".to_string();
        test.models.save(again).await.unwrap();

        let conversation = test
            .datastore
            .find_conversation(ConversationType::Pickup, pickup.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(test.messages_in(conversation.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn new_or_uncancelled_pickups_send_nothing() {
        let test = TestContext::new();
        let mut pickup = pickup(&test).await;

        pickup.description = "bring bags".to_string();
        test.models.save(pickup.clone()).await.unwrap();

        let mut created = PickupDate::new(pickup.store_id, test.now());
        created.cancelled_at = Some(test.now());
        created.last_changed_by = Some(5);
        test.models.save(created).await.unwrap();

        assert!(test
            .datastore
            .find_conversation(ConversationType::Pickup, pickup.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn cancelling_without_author_aborts_save() {
        let test = TestContext::new();
        let mut pickup = pickup(&test).await;
        pickup.cancelled_at = Some(test.now());

        let result = test.models.save(pickup.clone()).await;
        assert!(matches!(result, Err(ObserverError::ValidationError(_))));
        assert!(!test.datastore.get_pickup(pickup.id).await.unwrap().is_cancelled());
    }
}
