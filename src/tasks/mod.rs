//! Delayed background jobs

pub mod notifications;
pub mod worker;

pub use notifications::{notify_participants, LogNotifier, Notifier, RecordingNotifier};
pub use worker::TaskWorker;

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Job {
    NotifyParticipants { message_id: i64 },
    RecordGroupStats,
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task queue is closed")]
    QueueClosed,

    #[error(transparent)]
    Database(#[from] crate::database::DatabaseError),
}

/// Schedules a job to run after a delay
pub trait TaskQueue: Send + Sync {
    fn schedule(&self, job: Job, delay: Duration) -> Result<(), TaskError>;
}

#[derive(Debug)]
pub struct ScheduledJob {
    pub job: Job,
    pub delay: Duration,
}

/// Queue feeding a `TaskWorker` over an unbounded channel
#[derive(Clone)]
pub struct ChannelTaskQueue {
    sender: mpsc::UnboundedSender<ScheduledJob>,
}

impl ChannelTaskQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ScheduledJob>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl TaskQueue for ChannelTaskQueue {
    fn schedule(&self, job: Job, delay: Duration) -> Result<(), TaskError> {
        tracing::debug!("Scheduling {:?} in {:?}", job, delay);
        self.sender
            .send(ScheduledJob { job, delay })
            .map_err(|_| TaskError::QueueClosed)
    }
}

/// Captures scheduled jobs without running them
#[derive(Debug, Default)]
pub struct RecordingTaskQueue {
    jobs: Mutex<Vec<(Job, Duration)>>,
}

impl RecordingTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs(&self) -> Vec<(Job, Duration)> {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl TaskQueue for RecordingTaskQueue {
    fn schedule(&self, job: Job, delay: Duration) -> Result<(), TaskError> {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner()).push((job, delay));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_queue_delivers_jobs() {
        let (queue, mut receiver) = ChannelTaskQueue::new();
        queue.schedule(Job::RecordGroupStats, Duration::from_secs(1)).unwrap();

        let scheduled = receiver.recv().await.unwrap();
        assert_eq!(scheduled.job, Job::RecordGroupStats);
        assert_eq!(scheduled.delay, Duration::from_secs(1));
    }

    #[test]
    fn closed_channel_reports_error() {
        let (queue, receiver) = ChannelTaskQueue::new();
        drop(receiver);
        assert!(matches!(
            queue.schedule(Job::RecordGroupStats, Duration::ZERO),
            Err(TaskError::QueueClosed)
        ));
    }
}
