use std::sync::Mutex;

use tracing::info;

use crate::database::models::ConversationMessage;
use crate::database::{DatabaseError, Datastore};

/// Delivers message notifications to users
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &ConversationMessage, recipients: &[i64]);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &ConversationMessage, recipients: &[i64]) {
        info!(
            "Notifying {} participants about message {} in conversation {}",
            recipients.len(), message.id, message.conversation_id
        );
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(i64, Vec<i64>)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(message id, recipients)` per delivery
    pub fn sent(&self) -> Vec<(i64, Vec<i64>)> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &ConversationMessage, recipients: &[i64]) {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((message.id, recipients.to_vec()));
    }
}

/// Users to notify about a message: everyone in the conversation (or thread,
/// for replies) except the author who wants notifications and has not seen it yet.
pub async fn notification_recipients(datastore: &dyn Datastore, message: &ConversationMessage) -> Result<Vec<i64>, DatabaseError> {
    let recipients = match message.thread_id {
        Some(thread_id) if message.is_thread_reply() => datastore
            .list_thread_participants(thread_id)
            .await?
            .into_iter()
            .filter(|p| p.user_id != message.author_id && !p.muted && !p.has_seen(message.id))
            .map(|p| p.user_id)
            .collect(),
        _ => datastore
            .list_participants(message.conversation_id)
            .await?
            .into_iter()
            .filter(|p| p.user_id != message.author_id && p.email_notifications && !p.has_seen(message.id))
            .map(|p| p.user_id)
            .collect(),
    };
    Ok(recipients)
}

/// Job body: notify everyone who has not read the message by now
pub async fn notify_participants(
    datastore: &dyn Datastore,
    notifier: &dyn Notifier,
    message_id: i64,
) -> Result<Vec<i64>, DatabaseError> {
    let message = datastore.get_message(message_id).await?;
    let recipients = notification_recipients(datastore, &message).await?;
    if !recipients.is_empty() {
        notifier.notify(&message, &recipients);
    }
    Ok(recipients)
}
