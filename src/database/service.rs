use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::database::datastore::Datastore;
use crate::database::manager::DatabaseError;
use crate::database::models::{Group, Instance, Model, ModelKind};
use crate::observer::{ObserverContext, ObserverError, ObserverPipeline, Signal};
use crate::stats::PointWriter;
use crate::tasks::TaskQueue;

/// Performs model writes and fires their signals.
///
/// `save` runs `PreSave` observers (any error aborts the write), persists the
/// instance, then runs `PostSave` observers whose errors are only logged.
/// Observers receive a clone one recursion level deeper so nested saves are
/// bounded by the pipeline's maximum depth.
#[derive(Clone)]
pub struct ModelService {
    datastore: Arc<dyn Datastore>,
    pipeline: Arc<ObserverPipeline>,
    stats: Arc<dyn PointWriter>,
    tasks: Arc<dyn TaskQueue>,
    clock: Arc<dyn Clock>,
    depth: usize,
}

impl ModelService {
    pub fn new(
        datastore: Arc<dyn Datastore>,
        pipeline: Arc<ObserverPipeline>,
        stats: Arc<dyn PointWriter>,
        tasks: Arc<dyn TaskQueue>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { datastore, pipeline, stats, tasks, clock, depth: 0 }
    }

    pub fn datastore(&self) -> &dyn Datastore {
        self.datastore.as_ref()
    }

    pub fn stats(&self) -> &dyn PointWriter {
        self.stats.as_ref()
    }

    pub fn tasks(&self) -> &dyn TaskQueue {
        self.tasks.as_ref()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Clone for use inside an observer
    pub fn nested(&self) -> Self {
        Self { depth: self.depth + 1, ..self.clone() }
    }

    /// Save an instance, inserting when its id is 0
    pub async fn save<M: Model>(&self, instance: M) -> Result<M, ObserverError> {
        let created = !instance.is_saved();
        let previous = if created {
            None
        } else {
            Some(self.load(M::KIND, instance.id()).await?)
        };

        let mut pre = ObserverContext::new(Signal::PreSave, instance.into_instance(), self.nested())
            .with_previous(previous.clone())
            .with_created(created);
        self.pipeline.dispatch(&mut pre).await?;

        let ObserverContext { instance, errors, .. } = pre;
        if let Some(error) = errors.into_iter().next() {
            return Err(error);
        }

        let saved = self.persist(instance, created).await?;
        debug!("Saved {:?} {} (created={})", saved.kind(), saved.id(), created);

        let mut post = ObserverContext::new(Signal::PostSave, saved.clone(), self.nested())
            .with_previous(previous)
            .with_created(created);
        self.pipeline.dispatch(&mut post).await?;
        for error in &post.errors {
            warn!("post_save receiver failed for {:?} {}: {}", saved.kind(), saved.id(), error);
        }

        M::from_instance(saved)
            .ok_or_else(|| ObserverError::SystemError(format!("saved instance is not a {:?}", M::KIND)))
    }

    /// Delete an instance after its `PreDelete` observers succeed
    pub async fn delete<M: Model>(&self, instance: M) -> Result<(), ObserverError> {
        let id = instance.id();
        let mut ctx = ObserverContext::new(Signal::PreDelete, instance.into_instance(), self.nested());
        self.pipeline.dispatch(&mut ctx).await?;
        if let Some(error) = ctx.errors.into_iter().next() {
            return Err(error);
        }

        match M::KIND {
            ModelKind::Participant => self.datastore.delete_participant(id).await?,
            ModelKind::Pickup => self.datastore.delete_pickup(id).await?,
            kind => {
                return Err(ObserverError::SystemError(format!("{:?} cannot be deleted", kind)));
            }
        }
        debug!("Deleted {:?} {}", M::KIND, id);
        Ok(())
    }

    /// Record activity on a group
    pub async fn refresh_active_status(&self, group_id: i64) -> Result<Group, DatabaseError> {
        let mut group = self.datastore.get_group(group_id).await?;
        group.refresh_active_status(self.clock.now());
        self.datastore.update_group(&group).await?;
        Ok(group)
    }

    async fn load(&self, kind: ModelKind, id: i64) -> Result<Instance, DatabaseError> {
        let ds = &self.datastore;
        Ok(match kind {
            ModelKind::Message => Instance::Message(ds.get_message(id).await?),
            ModelKind::Reaction => Instance::Reaction(ds.get_reaction(id).await?),
            ModelKind::Participant => Instance::Participant(ds.get_participant(id).await?),
            ModelKind::Pickup => Instance::Pickup(ds.get_pickup(id).await?),
            ModelKind::Application => Instance::Application(ds.get_application(id).await?),
        })
    }

    async fn persist(&self, instance: Instance, created: bool) -> Result<Instance, ObserverError> {
        let ds = &self.datastore;
        let saved = match (instance, created) {
            (Instance::Message(m), true) => Instance::Message(ds.insert_message(&m).await?),
            (Instance::Message(m), false) => Instance::Message(ds.update_message(&m).await?),
            (Instance::Reaction(r), true) => Instance::Reaction(ds.insert_reaction(&r).await?),
            (Instance::Reaction(_), false) => {
                return Err(ObserverError::ValidationError("Reactions cannot be changed".to_string()));
            }
            (Instance::Participant(p), true) => Instance::Participant(ds.insert_participant(&p).await?),
            (Instance::Participant(p), false) => Instance::Participant(ds.update_participant(&p).await?),
            (Instance::Pickup(p), true) => Instance::Pickup(ds.insert_pickup(&p).await?),
            (Instance::Pickup(p), false) => Instance::Pickup(ds.update_pickup(&p).await?),
            (Instance::Application(a), true) => Instance::Application(ds.insert_application(&a).await?),
            (Instance::Application(a), false) => Instance::Application(ds.update_application(&a).await?),
        };
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{ApplicationStatus, GroupApplication, GroupStatus};
    use crate::testing::TestContext;

    #[tokio::test]
    async fn save_assigns_id_and_update_keeps_it() {
        let test = TestContext::new();
        let group = test.create_group("Savers").await.unwrap();

        let application = test.models.save(GroupApplication::new(group.id, 7, test.now())).await.unwrap();
        assert!(application.is_saved());

        let mut accepted = application.clone();
        accepted.status = ApplicationStatus::Accepted;
        let accepted = test.models.save(accepted).await.unwrap();
        assert_eq!(accepted.id, application.id);
        assert_eq!(
            test.datastore.get_application(application.id).await.unwrap().status,
            ApplicationStatus::Accepted
        );
    }

    #[tokio::test]
    async fn saving_unknown_instance_fails_with_not_found() {
        let test = TestContext::new();
        let mut application = GroupApplication::new(1, 7, test.now());
        application.id = 999;

        let result = test.models.save(application).await;
        assert!(matches!(result, Err(ObserverError::NotFound(_))));
    }

    #[tokio::test]
    async fn refresh_active_status_reactivates_group() {
        let test = TestContext::new();
        let mut group = test.create_group("Sleepy").await.unwrap();
        group.status = GroupStatus::Inactive;
        test.datastore.update_group(&group).await.unwrap();

        test.clock.advance(chrono::Duration::days(1));
        let refreshed = test.models.refresh_active_status(group.id).await.unwrap();
        assert_eq!(refreshed.status, GroupStatus::Active);
        assert_eq!(refreshed.last_active_at, test.now());
    }
}
