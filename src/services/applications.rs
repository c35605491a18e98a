use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::database::models::{ApplicationStatus, GroupApplication, GroupMembership};
use crate::database::{DatabaseError, ModelService};
use crate::observer::ObserverError;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("You are already a member of this group.")]
    AlreadyMember,

    #[error("You already have a pending application for this group.")]
    AlreadyApplied,

    #[error("Application is not pending.")]
    NotPending,

    #[error("Status must be one of accepted, declined or withdrawn.")]
    InvalidDecision,

    #[error("{0}")]
    PermissionDenied(String),

    #[error(transparent)]
    Observer(#[from] ObserverError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Body of `PATCH /api/applications/:id`
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationDecision {
    pub status: ApplicationStatus,
}

/// Group applications: applying and deciding. Every status change is saved
/// through the model service so application receivers see it.
#[derive(Clone)]
pub struct ApplicationService {
    models: ModelService,
}

impl ApplicationService {
    pub fn new(models: ModelService) -> Self {
        Self { models }
    }

    pub async fn apply(&self, user: i64, group_id: i64) -> Result<GroupApplication, ApplicationError> {
        let ds = self.models.datastore();
        ds.get_group(group_id).await?;
        if ds.get_membership(group_id, user).await?.is_some() {
            return Err(ApplicationError::AlreadyMember);
        }
        if ds.has_pending_application(group_id, user).await? {
            return Err(ApplicationError::AlreadyApplied);
        }

        let application = self
            .models
            .save(GroupApplication::new(group_id, user, self.models.now()))
            .await?;
        info!("User {} applied to group {}", user, group_id);
        Ok(application)
    }

    /// Editors accept or decline; the applicant may withdraw
    pub async fn decide(
        &self,
        user: i64,
        application_id: i64,
        decision: ApplicationDecision,
    ) -> Result<GroupApplication, ApplicationError> {
        let ds = self.models.datastore();
        let mut application = ds.get_application(application_id).await?;
        if application.status != ApplicationStatus::Pending {
            return Err(ApplicationError::NotPending);
        }

        match decision.status {
            ApplicationStatus::Accepted | ApplicationStatus::Declined => {
                let editor = ds
                    .get_membership(application.group_id, user)
                    .await?
                    .map(|m| m.is_editor())
                    .unwrap_or(false);
                if !editor {
                    return Err(ApplicationError::PermissionDenied(
                        "You need to be a group editor".to_string(),
                    ));
                }
            }
            ApplicationStatus::Withdrawn => {
                if application.user_id != user {
                    return Err(ApplicationError::PermissionDenied(
                        "Only the applicant can withdraw an application.".to_string(),
                    ));
                }
            }
            ApplicationStatus::Pending => return Err(ApplicationError::InvalidDecision),
        }

        application.status = decision.status;
        application.decided_at = Some(self.models.now());
        let application = self.models.save(application).await?;

        if application.status == ApplicationStatus::Accepted {
            ds.upsert_membership(&GroupMembership::new(application.group_id, application.user_id))
                .await?;
            self.models.refresh_active_status(application.group_id).await?;
        }

        info!(
            "Application {} is now {} (by user {})",
            application.id, application.status, user
        );
        Ok(application)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Datastore;
    use crate::testing::TestContext;

    async fn pending(test: &TestContext) -> (i64, i64, GroupApplication) {
        let group = test.create_group("Applicants").await.unwrap();
        let editor = test.next_user();
        test.add_editor(group.id, editor).await.unwrap();
        let service = ApplicationService::new(test.models.clone());
        let application = service.apply(test.next_user(), group.id).await.unwrap();
        (group.id, editor, application)
    }

    fn decision(status: ApplicationStatus) -> ApplicationDecision {
        ApplicationDecision { status }
    }

    #[tokio::test]
    async fn accepting_adds_membership() {
        let test = TestContext::new();
        let (group, editor, application) = pending(&test).await;
        let service = ApplicationService::new(test.models.clone());

        let accepted = service
            .decide(editor, application.id, decision(ApplicationStatus::Accepted))
            .await
            .unwrap();
        assert_eq!(accepted.status, ApplicationStatus::Accepted);
        assert_eq!(accepted.decided_at, Some(test.now()));
        assert!(test.datastore.get_membership(group, application.user_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn applying_twice_or_as_member_fails() {
        let test = TestContext::new();
        let (group, editor, application) = pending(&test).await;
        let service = ApplicationService::new(test.models.clone());

        let again = service.apply(application.user_id, group).await;
        assert!(matches!(again, Err(ApplicationError::AlreadyApplied)));

        let member = service.apply(editor, group).await;
        assert!(matches!(member, Err(ApplicationError::AlreadyMember)));
    }

    #[tokio::test]
    async fn only_editors_decide_and_only_applicants_withdraw() {
        let test = TestContext::new();
        let (_, editor, application) = pending(&test).await;
        let service = ApplicationService::new(test.models.clone());

        let by_applicant = service
            .decide(application.user_id, application.id, decision(ApplicationStatus::Accepted))
            .await;
        assert!(matches!(by_applicant, Err(ApplicationError::PermissionDenied(_))));

        let by_editor = service
            .decide(editor, application.id, decision(ApplicationStatus::Withdrawn))
            .await;
        assert!(matches!(by_editor, Err(ApplicationError::PermissionDenied(_))));

        let withdrawn = service
            .decide(application.user_id, application.id, decision(ApplicationStatus::Withdrawn))
            .await
            .unwrap();
        assert_eq!(withdrawn.status, ApplicationStatus::Withdrawn);

        let late = service
            .decide(editor, application.id, decision(ApplicationStatus::Declined))
            .await;
        assert!(matches!(late, Err(ApplicationError::NotPending)));
    }
}
