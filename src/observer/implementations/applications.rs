use async_trait::async_trait;

use crate::database::models::{GroupApplication, ModelKind};
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, PostSaveObserver, PreSaveObserver, Signal};
use crate::stats;

pub struct ApplicationCreated;

impl Observer for ApplicationCreated {
    fn name(&self) -> &'static str {
        "application_created"
    }

    fn signal(&self) -> Signal {
        Signal::PostSave
    }

    fn applies_to_model(&self, kind: ModelKind) -> bool {
        kind == ModelKind::Application
    }
}

#[async_trait]
impl PostSaveObserver for ApplicationCreated {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError> {
        if !ctx.created {
            return Ok(());
        }
        let application: GroupApplication = ctx.require_instance(self.name())?;
        stats::applications::application_pending(&ctx.models, &application).await?;
        Ok(())
    }
}

/// Emits a status event when an existing application changes status
pub struct ApplicationStatusChanged;

impl Observer for ApplicationStatusChanged {
    fn name(&self) -> &'static str {
        "application_status_changed"
    }

    fn signal(&self) -> Signal {
        Signal::PreSave
    }

    fn applies_to_model(&self, kind: ModelKind) -> bool {
        kind == ModelKind::Application
    }

    fn priority(&self) -> u8 {
        90
    }
}

#[async_trait]
impl PreSaveObserver for ApplicationStatusChanged {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        if ctx.created {
            return Ok(());
        }
        let application: GroupApplication = ctx.require_instance(self.name())?;
        let changed = match ctx.previous_as::<GroupApplication>() {
            Some(old) => old.status != application.status,
            None => true,
        };
        if changed {
            stats::applications::application_status_update(&ctx.models, &application).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::database::models::{ApplicationStatus, GroupApplication};
    use crate::stats::Point;
    use crate::testing::TestContext;
    use chrono::Duration;

    #[tokio::test]
    async fn creating_application_emits_pending_event() {
        let test = TestContext::new();
        let group = test.create_group("Applicants").await.unwrap();

        test.models
            .save(GroupApplication::new(group.id, test.next_user(), test.now()))
            .await
            .unwrap();

        let expected = Point::new("karrot.events")
            .tag("group", group.id)
            .tag("group_status", "active")
            .field("application_pending", 1);
        assert_eq!(test.stats.last_batch(), Some(vec![expected]));
    }

    #[tokio::test]
    async fn accepting_reports_alive_seconds() {
        let test = TestContext::new();
        let group = test.create_group("Applicants").await.unwrap();
        let two_hours_ago = test.now() - Duration::hours(2);

        let mut application = test
            .models
            .save(GroupApplication::new(group.id, test.next_user(), two_hours_ago))
            .await
            .unwrap();
        test.stats.clear();

        application.status = ApplicationStatus::Accepted;
        test.models.save(application).await.unwrap();

        let expected = Point::new("karrot.events")
            .tag("group", group.id)
            .tag("group_status", "active")
            .tag("application_status", "accepted")
            .field("application_accepted", 1)
            .field("application_alive_seconds", 7200)
            .field("application_accepted_alive_seconds", 7200);
        assert_eq!(test.stats.last_batch(), Some(vec![expected]));
    }

    #[tokio::test]
    async fn saving_without_status_change_emits_nothing() {
        let test = TestContext::new();
        let group = test.create_group("Applicants").await.unwrap();
        let application = test
            .models
            .save(GroupApplication::new(group.id, test.next_user(), test.now()))
            .await
            .unwrap();
        test.stats.clear();

        test.models.save(application).await.unwrap();
        assert!(test.stats.batches().is_empty());
    }
}
