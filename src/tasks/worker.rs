use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::database::Datastore;
use crate::stats::{record_group_stats, PointWriter};
use crate::tasks::{notify_participants, Job, Notifier, ScheduledJob, TaskError};

/// Runs scheduled jobs once their delay has passed
pub struct TaskWorker {
    receiver: mpsc::UnboundedReceiver<ScheduledJob>,
    datastore: Arc<dyn Datastore>,
    stats: Arc<dyn PointWriter>,
    notifier: Arc<dyn Notifier>,
}

impl TaskWorker {
    pub fn new(
        receiver: mpsc::UnboundedReceiver<ScheduledJob>,
        datastore: Arc<dyn Datastore>,
        stats: Arc<dyn PointWriter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { receiver, datastore, stats, notifier }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Receive jobs until every queue handle is dropped
    pub async fn run(mut self) {
        info!("Task worker started");
        while let Some(ScheduledJob { job, delay }) = self.receiver.recv().await {
            let datastore = self.datastore.clone();
            let stats = self.stats.clone();
            let notifier = self.notifier.clone();

            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                debug!("Running {:?}", job);
                if let Err(e) = run_job(datastore.as_ref(), stats.as_ref(), notifier.as_ref(), &job).await {
                    error!("Job {:?} failed: {}", job, e);
                }
            });
        }
        info!("Task worker stopped");
    }
}

pub async fn run_job(
    datastore: &dyn Datastore,
    stats: &dyn PointWriter,
    notifier: &dyn Notifier,
    job: &Job,
) -> Result<(), TaskError> {
    match job {
        Job::NotifyParticipants { message_id } => {
            notify_participants(datastore, notifier, *message_id).await?;
        }
        Job::RecordGroupStats => {
            record_group_stats(datastore, stats).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{ConversationMessage, ConversationParticipant};
    use crate::tasks::{ChannelTaskQueue, RecordingNotifier, TaskQueue};
    use crate::testing::TestContext;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn runs_jobs_after_their_delay() {
        let test = TestContext::new();
        let (_, conversation) = test.create_group_with_conversation("Delayed").await.unwrap();
        let ds = test.datastore.clone();
        let message = ds
            .insert_message(&ConversationMessage::new(conversation.id, 1, "later", test.now()))
            .await
            .unwrap();
        ds.insert_participant(&ConversationParticipant::new(conversation.id, 2)).await.unwrap();

        let (queue, receiver) = ChannelTaskQueue::new();
        let notifier = Arc::new(RecordingNotifier::new());
        let worker = TaskWorker::new(receiver, ds, test.stats.clone(), notifier.clone());
        let handle = worker.spawn();

        queue
            .schedule(Job::NotifyParticipants { message_id: message.id }, Duration::from_secs(300))
            .unwrap();

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert!(notifier.sent().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(notifier.sent(), vec![(message.id, vec![2])]);

        drop(queue);
        handle.await.unwrap();
    }
}
