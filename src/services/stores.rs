use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};
use validator::Validate;

use crate::config;
use crate::database::models::{History, HistoryTypus, PickupDate, PickupSeries, Store, StoreStatus};
use crate::database::{DatabaseError, ModelService, StoreUpdateBatch};

const REQUIRED: &str = "This field is required.";
const NOT_A_MEMBER: &str = "You are not a member of this group.";
const NOT_AN_EDITOR: &str = "You need to be a group editor";

/// Upper bound for `weeks_in_advance`; each week is one pickup per series
pub const MAX_WEEKS_IN_ADVANCE: i32 = 52;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid store data")]
    Invalid(HashMap<String, String>),

    #[error("Malformed store data: {0}")]
    Malformed(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl StoreError {
    fn field(field: &str, message: impl Into<String>) -> Self {
        StoreError::Invalid(HashMap::from([(field.to_string(), message.into())]))
    }
}

/// Writable store fields as sent by clients. Absent fields are left unchanged
/// on update. `last_changed_by` is never read from input.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct StoreInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "Set at least one week in advance"))]
    pub weeks_in_advance: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_changed_message: Option<String>,
}

impl StoreInput {
    /// Trim text fields; the description keeps its whitespace
    fn normalize(&mut self) {
        for text in [&mut self.name, &mut self.address, &mut self.last_changed_message] {
            if let Some(value) = text {
                *value = value.trim().to_string();
            }
        }
    }
}

/// Input that passed validation, with the parsed status
#[derive(Debug, Clone)]
struct ValidatedStore {
    input: StoreInput,
    status: Option<StoreStatus>,
    user: i64,
}

impl ValidatedStore {
    fn apply(&self, store: &mut Store) {
        let input = &self.input;
        if let Some(name) = &input.name {
            store.name = name.clone();
        }
        if let Some(description) = &input.description {
            store.description = description.clone();
        }
        if let Some(group) = input.group {
            store.group_id = group;
        }
        if let Some(address) = &input.address {
            store.address = address.clone();
        }
        if input.latitude.is_some() {
            store.latitude = input.latitude;
        }
        if input.longitude.is_some() {
            store.longitude = input.longitude;
        }
        if let Some(weeks) = input.weeks_in_advance {
            store.weeks_in_advance = weeks;
        }
        if let Some(status) = self.status {
            store.status = status;
        }
        if let Some(message) = &input.last_changed_message {
            store.last_changed_message = message.clone();
        }
        store.last_changed_by = Some(self.user);
    }

    /// Validated fields as the stored representation names them
    fn fields(&self) -> Map<String, Value> {
        let mut fields = match serde_json::to_value(&self.input) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        if let Some(status) = self.status {
            fields.insert("status".to_string(), Value::from(status.as_str()));
        }
        fields.insert("last_changed_by".to_string(), Value::from(self.user));
        fields
    }
}

/// Store serializer: validation, permissions, persistence and history
#[derive(Clone)]
pub struct StoreService {
    models: ModelService,
    name_min_length: usize,
    description_max_length: usize,
}

impl StoreService {
    pub fn new(models: ModelService) -> Self {
        let stores = &config::config().stores;
        Self {
            models,
            name_min_length: stores.name_min_length,
            description_max_length: stores.description_max_length,
        }
    }

    pub fn with_name_min_length(mut self, min: usize) -> Self {
        self.name_min_length = min;
        self
    }

    pub fn with_description_max_length(mut self, max: usize) -> Self {
        self.description_max_length = max;
        self
    }

    pub async fn get(&self, store_id: i64) -> Result<Store, StoreError> {
        Ok(self.models.datastore().get_store(store_id).await?)
    }

    pub async fn history(&self, store_id: i64) -> Result<Vec<History>, StoreError> {
        let ds = self.models.datastore();
        ds.get_store(store_id).await?;
        Ok(ds.list_history_for_store(store_id).await?)
    }

    /// Create a store from a raw payload
    pub async fn create(&self, user: i64, payload: Value) -> Result<Store, StoreError> {
        let validated = self.validate(user, &payload, None).await?;

        let mut missing = HashMap::new();
        let name = validated.input.name.clone().unwrap_or_default();
        if validated.input.name.is_none() {
            missing.insert("name".to_string(), REQUIRED.to_string());
        }
        let group_id = validated.input.group.unwrap_or_default();
        if validated.input.group.is_none() {
            missing.insert("group".to_string(), REQUIRED.to_string());
        }
        if !missing.is_empty() {
            return Err(StoreError::Invalid(missing));
        }

        let mut store = Store::new(group_id, name);
        validated.apply(&mut store);
        store.created_by = Some(user);

        let ds = self.models.datastore();
        let store = ds.insert_store(&store).await?;
        ds.insert_history(&History {
            id: 0,
            typus: HistoryTypus::StoreCreate,
            group_id: store.group_id,
            store_id: Some(store.id),
            users: vec![user],
            payload,
            before: None,
            after: Some(snapshot(&store)),
            date: self.models.now(),
        })
        .await?;
        self.models.refresh_active_status(store.group_id).await?;

        info!("User {} created store {} in group {}", user, store.id, store.group_id);
        Ok(store)
    }

    /// Partially update a store. All writes land together or not at all.
    pub async fn update(&self, user: i64, store_id: i64, payload: Value) -> Result<Store, StoreError> {
        let ds = self.models.datastore();
        let existing = ds.get_store(store_id).await?;
        let validated = self.validate(user, &payload, Some(&existing)).await?;

        let before = snapshot(&existing);
        let changed = get_changed_data(&before, &validated.fields());

        let mut store = existing.clone();
        validated.apply(&mut store);
        let after = snapshot(&store);

        let mut batch = StoreUpdateBatch {
            store: Some(store.clone()),
            ..Default::default()
        };

        let status_activated = changed.contains_key("status") && store.is_active();
        if changed.contains_key("weeks_in_advance") || status_activated {
            let now = self.models.now();
            for mut series in ds.list_series_for_store(store.id).await? {
                series.last_changed_by = store.last_changed_by;
                series.last_changed_message = store.last_changed_message.clone();

                let pickups = ds.list_pickups_for_series(series.id).await?;
                let (create, delete) = plan_pickup_overrides(&store, &series, &pickups, now)?;
                debug!(
                    "Series {}: creating {} pickups, deleting {}",
                    series.id, create.len(), delete.len()
                );
                batch.pickups_to_create.extend(create);
                batch.pickups_to_delete.extend(delete);
                batch.series.push(series);
            }
        }

        if before != after {
            batch.history = Some(History {
                id: 0,
                typus: HistoryTypus::StoreModify,
                group_id: store.group_id,
                store_id: Some(store.id),
                users: vec![user],
                payload: Value::Object(changed),
                before: Some(before),
                after: Some(after),
                date: self.models.now(),
            });
        }

        ds.commit_store_update(batch).await?;
        self.models.refresh_active_status(store.group_id).await?;

        Ok(store)
    }

    async fn validate(&self, user: i64, payload: &Value, existing: Option<&Store>) -> Result<ValidatedStore, StoreError> {
        let mut input: StoreInput =
            serde_json::from_value(payload.clone()).map_err(|e| StoreError::Malformed(e.to_string()))?;
        input.normalize();

        // Permission failures win over field errors
        if let Some(group_id) = input.group {
            self.check_group_permissions(group_id, user).await?;
        }
        if let Some(store) = existing {
            if input.group != Some(store.group_id) {
                self.check_group_permissions(store.group_id, user).await?;
            }
        }

        let mut errors: HashMap<String, String> = HashMap::new();
        if let Err(validation) = input.validate() {
            for (field, field_errors) in validation.field_errors() {
                if let Some(error) = field_errors.first() {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    errors.insert(field.to_string(), message);
                }
            }
        }

        if let Some(name) = &input.name {
            if name.chars().count() < self.name_min_length {
                errors.insert(
                    "name".to_string(),
                    format!("Ensure this field has at least {} characters.", self.name_min_length),
                );
            }
        }

        if let Some(weeks) = input.weeks_in_advance {
            if weeks > MAX_WEEKS_IN_ADVANCE {
                errors.insert(
                    "weeks_in_advance".to_string(),
                    format!("Ensure this value is less than or equal to {}.", MAX_WEEKS_IN_ADVANCE),
                );
            }
        }

        if let Some(description) = &input.description {
            if description.chars().count() > self.description_max_length {
                errors.insert(
                    "description".to_string(),
                    format!("Ensure this field has no more than {} characters.", self.description_max_length),
                );
            }
        }

        let status = match input.status.as_deref() {
            Some(raw) => match raw.parse::<StoreStatus>() {
                Ok(status) => Some(status),
                Err(message) => {
                    errors.insert("status".to_string(), message);
                    None
                }
            },
            // the choice field's default only applies on create
            None if existing.is_none() => Some(StoreStatus::default()),
            None => None,
        };

        if !errors.is_empty() {
            return Err(StoreError::Invalid(errors));
        }

        Ok(ValidatedStore { input, status, user })
    }

    async fn check_group_permissions(&self, group_id: i64, user: i64) -> Result<(), StoreError> {
        let ds = self.models.datastore();
        match ds.get_group(group_id).await {
            Ok(_) => {}
            Err(DatabaseError::NotFound(_)) => {
                return Err(StoreError::field(
                    "group",
                    format!("Invalid pk \"{}\" - object does not exist.", group_id),
                ));
            }
            Err(e) => return Err(e.into()),
        }

        let membership = ds
            .get_membership(group_id, user)
            .await?
            .ok_or_else(|| StoreError::PermissionDenied(NOT_A_MEMBER.to_string()))?;
        if !membership.is_editor() {
            return Err(StoreError::PermissionDenied(NOT_AN_EDITOR.to_string()));
        }
        Ok(())
    }
}

/// Full serialized form used for history snapshots
pub fn snapshot(store: &Store) -> Value {
    serde_json::to_value(store).unwrap_or(Value::Null)
}

/// Fields of `validated` whose value differs from the stored representation
pub fn get_changed_data(stored: &Value, validated: &Map<String, Value>) -> Map<String, Value> {
    validated
        .iter()
        .filter(|(key, value)| stored.get(key.as_str()) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Pickups to create and delete so a series matches its store: one pickup per
/// weekly occurrence within `weeks_in_advance` for active stores, none for
/// inactive ones. Past and cancelled pickups are never touched.
pub fn plan_pickup_overrides(
    store: &Store,
    series: &PickupSeries,
    existing: &[PickupDate],
    now: DateTime<Utc>,
) -> Result<(Vec<PickupDate>, Vec<i64>), StoreError> {
    let dates = if store.is_active() {
        let until = Duration::try_weeks(i64::from(store.weeks_in_advance))
            .and_then(|ahead| now.checked_add_signed(ahead))
            .ok_or_else(|| StoreError::field("weeks_in_advance", "Too many weeks in advance."))?;
        series.occurrences(now, until)
    } else {
        Vec::new()
    };

    let future: Vec<&PickupDate> = existing.iter().filter(|p| p.date >= now).collect();

    let create = dates
        .iter()
        .filter(|date| !existing.iter().any(|p| p.date == **date))
        .map(|date| PickupDate::for_series(series, *date))
        .collect();

    let delete = future
        .into_iter()
        .filter(|p| !p.is_cancelled() && !dates.contains(&p.date))
        .map(|p| p.id)
        .collect();

    Ok((create, delete))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Datastore;
    use crate::testing::TestContext;
    use serde_json::json;

    async fn editor_context() -> (TestContext, i64, i64) {
        let test = TestContext::new();
        let group = test.create_group("Editors").await.unwrap();
        let user = test.next_user();
        test.add_editor(group.id, user).await.unwrap();
        (test, group.id, user)
    }

    fn field_errors(result: Result<Store, StoreError>) -> HashMap<String, String> {
        match result {
            Err(StoreError::Invalid(errors)) => errors,
            other => panic!("expected field errors, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn create_sets_authors_history_and_defaults() {
        let (test, group, user) = editor_context().await;
        test.clock.advance(Duration::hours(1));

        let payload = json!({"name": "  Bakery  ", "group": group, "description": "  fresh bread\n"});
        let store = test.store_service().create(user, payload.clone()).await.unwrap();

        assert_eq!(store.name, "Bakery");
        assert_eq!(store.description, "  fresh bread\n");
        assert_eq!(store.status, StoreStatus::Created);
        assert_eq!(store.created_by, Some(user));
        assert_eq!(store.last_changed_by, Some(user));

        let history = test.datastore.list_history_for_store(store.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].typus, HistoryTypus::StoreCreate);
        assert_eq!(history[0].users, vec![user]);
        assert_eq!(history[0].payload, payload);
        assert_eq!(history[0].after, Some(snapshot(&store)));

        let group = test.datastore.get_group(group).await.unwrap();
        assert_eq!(group.last_active_at, test.now());
    }

    #[tokio::test]
    async fn create_requires_name_and_group() {
        let (test, _, user) = editor_context().await;
        let errors = field_errors(test.store_service().create(user, json!({"address": "Main St"})).await);
        assert_eq!(errors["name"], REQUIRED);
        assert_eq!(errors["group"], REQUIRED);
    }

    #[tokio::test]
    async fn rejects_short_names_bad_weeks_and_unknown_status() {
        let (test, group, user) = editor_context().await;
        let payload = json!({"name": " ab ", "group": group, "weeks_in_advance": 0, "status": "open"});
        let errors = field_errors(test.store_service().create(user, payload).await);

        assert_eq!(errors["name"], "Ensure this field has at least 3 characters.");
        assert_eq!(errors["weeks_in_advance"], "Set at least one week in advance");
        assert_eq!(errors["status"], "\"open\" is not a valid choice.");
    }

    #[tokio::test]
    async fn rejects_long_descriptions() {
        let (test, group, user) = editor_context().await;
        let service = test.store_service().with_description_max_length(10);
        let payload = json!({"name": "Bakery", "group": group, "description": "x".repeat(11)});
        let errors = field_errors(service.create(user, payload).await);
        assert_eq!(errors["description"], "Ensure this field has no more than 10 characters.");
    }

    #[tokio::test]
    async fn non_members_and_non_editors_are_denied() {
        let (test, group, _) = editor_context().await;
        let outsider = test.next_user();
        let member = test.next_user();
        test.add_member(group, member).await.unwrap();
        let payload = json!({"name": "Bakery", "group": group});

        let result = test.store_service().create(outsider, payload.clone()).await;
        assert!(matches!(result, Err(StoreError::PermissionDenied(m)) if m == NOT_A_MEMBER));

        let result = test.store_service().create(member, payload).await;
        assert!(matches!(result, Err(StoreError::PermissionDenied(m)) if m == NOT_AN_EDITOR));
    }

    #[tokio::test]
    async fn permission_errors_win_over_field_errors() {
        let (test, group, _) = editor_context().await;
        let result = test.store_service().create(test.next_user(), json!({"name": "x", "group": group})).await;
        assert!(matches!(result, Err(StoreError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn update_writes_modify_history_with_changed_fields() {
        let (test, group, user) = editor_context().await;
        let service = test.store_service();
        let store = service.create(user, json!({"name": "Bakery", "group": group})).await.unwrap();

        let other = test.next_user();
        test.add_editor(group, other).await.unwrap();
        let updated = service
            .update(other, store.id, json!({"name": "Bakery", "address": "Main St 1"}))
            .await
            .unwrap();
        assert_eq!(updated.address, "Main St 1");
        assert_eq!(updated.last_changed_by, Some(other));

        let history = test.datastore.list_history_for_store(store.id).await.unwrap();
        assert_eq!(history.len(), 2);
        let modify = &history[1];
        assert_eq!(modify.typus, HistoryTypus::StoreModify);
        assert_eq!(modify.users, vec![other]);
        assert_eq!(modify.payload, json!({"address": "Main St 1", "last_changed_by": other}));
        assert_eq!(modify.before, Some(snapshot(&store)));
        assert_eq!(modify.after, Some(snapshot(&updated)));
    }

    #[tokio::test]
    async fn unchanged_update_writes_no_history() {
        let (test, group, user) = editor_context().await;
        let service = test.store_service();
        let store = service.create(user, json!({"name": "Bakery", "group": group})).await.unwrap();

        service.update(user, store.id, json!({"name": "Bakery"})).await.unwrap();
        assert_eq!(test.datastore.list_history_for_store(store.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_requires_editor_of_store_group() {
        let (test, group, user) = editor_context().await;
        let store = test.store_service().create(user, json!({"name": "Bakery", "group": group})).await.unwrap();

        let result = test
            .store_service()
            .update(test.next_user(), store.id, json!({"address": "Elsewhere"}))
            .await;
        assert!(matches!(result, Err(StoreError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn activating_store_fills_series_pickups() {
        let (test, group, user) = editor_context().await;
        let service = test.store_service();
        let store = service
            .create(user, json!({"name": "Bakery", "group": group, "weeks_in_advance": 2}))
            .await
            .unwrap();
        let series = test
            .datastore
            .insert_series(&PickupSeries::new(store.id, test.now() + Duration::hours(2)))
            .await
            .unwrap();

        service
            .update(user, store.id, json!({"status": "active", "last_changed_message": "we start"}))
            .await
            .unwrap();

        let pickups = test.datastore.list_pickups_for_series(series.id).await.unwrap();
        assert_eq!(pickups.len(), 2);
        assert!(pickups.iter().all(|p| p.last_changed_by == Some(user)));

        let series = test.datastore.list_series_for_store(store.id).await.unwrap();
        assert_eq!(series[0].last_changed_message, "we start");
        assert_eq!(series[0].last_changed_by, Some(user));
    }

    #[tokio::test]
    async fn status_change_to_inactive_state_leaves_series_alone() {
        let (test, group, user) = editor_context().await;
        let service = test.store_service();
        let store = service.create(user, json!({"name": "Bakery", "group": group})).await.unwrap();
        let series = test
            .datastore
            .insert_series(&PickupSeries::new(store.id, test.now() + Duration::hours(2)))
            .await
            .unwrap();

        service.update(user, store.id, json!({"status": "negotiating"})).await.unwrap();
        assert!(test.datastore.list_pickups_for_series(series.id).await.unwrap().is_empty());
    }

    #[test]
    fn plan_keeps_cancelled_and_past_pickups() {
        let now = TestContext::start_time();
        let mut store = Store::new(1, "Bakery");
        store.id = 1;
        store.status = StoreStatus::Active;
        store.weeks_in_advance = 1;
        let mut series = PickupSeries::new(1, now - Duration::weeks(3) + Duration::hours(1));
        series.id = 7;

        let mut past = PickupDate::for_series(&series, now - Duration::weeks(1));
        past.id = 1;
        let mut stray = PickupDate::for_series(&series, now + Duration::days(2));
        stray.id = 2;
        let mut cancelled = PickupDate::for_series(&series, now + Duration::days(3));
        cancelled.id = 3;
        cancelled.cancelled_at = Some(now);

        let (create, delete) =
            plan_pickup_overrides(&store, &series, &[past, stray, cancelled.clone()], now).unwrap();
        assert_eq!(create.len(), 1);
        assert_eq!(create[0].date, now + Duration::hours(1));
        assert_eq!(create[0].series_id, Some(7));
        assert_eq!(delete, vec![2]);

        store.status = StoreStatus::Archived;
        let (create, delete) = plan_pickup_overrides(&store, &series, &[cancelled], now).unwrap();
        assert!(create.is_empty());
        assert!(delete.is_empty());
    }

    #[test]
    fn plan_for_inactive_store_deletes_future_uncancelled_pickups() {
        let now = TestContext::start_time();
        let mut store = Store::new(1, "Bakery");
        store.id = 1;
        store.status = StoreStatus::Negotiating;
        let mut series = PickupSeries::new(1, now - Duration::weeks(3) + Duration::hours(1));
        series.id = 7;

        let mut past = PickupDate::for_series(&series, now - Duration::weeks(1) + Duration::hours(1));
        past.id = 1;
        let mut upcoming = PickupDate::for_series(&series, now + Duration::hours(1));
        upcoming.id = 2;
        let mut cancelled = PickupDate::for_series(&series, now + Duration::weeks(1) + Duration::hours(1));
        cancelled.id = 3;
        cancelled.cancelled_at = Some(now);

        let (create, delete) = plan_pickup_overrides(&store, &series, &[past, upcoming, cancelled], now).unwrap();
        assert!(create.is_empty());
        assert_eq!(delete, vec![2]);
    }

    #[test]
    fn plan_reports_overflowing_horizon_as_field_error() {
        let now = TestContext::start_time();
        let mut store = Store::new(1, "Bakery");
        store.status = StoreStatus::Active;
        store.weeks_in_advance = i32::MAX;
        let series = PickupSeries::new(1, now);

        let result = plan_pickup_overrides(&store, &series, &[], now);
        assert!(matches!(result, Err(StoreError::Invalid(errors)) if errors.contains_key("weeks_in_advance")));
    }

    #[tokio::test]
    async fn weeks_in_advance_is_bounded() {
        let (test, group, user) = editor_context().await;
        let service = test.store_service();
        let store = service
            .create(user, json!({"name": "Bakery", "group": group, "status": "active"}))
            .await
            .unwrap();
        let series = test
            .datastore
            .insert_series(&PickupSeries::new(store.id, test.now() + Duration::hours(2)))
            .await
            .unwrap();

        let errors = field_errors(service.update(user, store.id, json!({"weeks_in_advance": i32::MAX})).await);
        assert_eq!(errors["weeks_in_advance"], "Ensure this value is less than or equal to 52.");
        assert!(test.datastore.list_pickups_for_series(series.id).await.unwrap().is_empty());

        service
            .update(user, store.id, json!({"weeks_in_advance": MAX_WEEKS_IN_ADVANCE}))
            .await
            .unwrap();
        let pickups = test.datastore.list_pickups_for_series(series.id).await.unwrap();
        assert_eq!(pickups.len(), MAX_WEEKS_IN_ADVANCE as usize);
    }

    #[tokio::test]
    async fn weeks_change_on_archived_store_clears_upcoming_pickups() {
        let (test, group, user) = editor_context().await;
        let service = test.store_service();
        let store = service
            .create(user, json!({"name": "Bakery", "group": group, "status": "active", "weeks_in_advance": 2}))
            .await
            .unwrap();
        let series = test
            .datastore
            .insert_series(&PickupSeries::new(store.id, test.now() - Duration::weeks(2) + Duration::hours(2)))
            .await
            .unwrap();
        let past = test
            .datastore
            .insert_pickup(&PickupDate::for_series(&series, test.now() - Duration::weeks(1) + Duration::hours(2)))
            .await
            .unwrap();
        let upcoming = test
            .datastore
            .insert_pickup(&PickupDate::for_series(&series, test.now() + Duration::hours(2)))
            .await
            .unwrap();
        let mut cancelled = PickupDate::for_series(&series, test.now() + Duration::weeks(1) + Duration::hours(2));
        cancelled.cancelled_at = Some(test.now());
        let cancelled = test.datastore.insert_pickup(&cancelled).await.unwrap();

        service.update(user, store.id, json!({"status": "archived"})).await.unwrap();
        service.update(user, store.id, json!({"weeks_in_advance": 3})).await.unwrap();

        let remaining: Vec<i64> = test
            .datastore
            .list_pickups_for_series(series.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert!(remaining.contains(&past.id));
        assert!(remaining.contains(&cancelled.id));
        assert!(!remaining.contains(&upcoming.id));
    }

    #[tokio::test]
    async fn name_min_length_is_configurable() {
        let (test, group, user) = editor_context().await;
        let service = test.store_service().with_name_min_length(5);
        let errors = field_errors(service.create(user, json!({"name": "Shop", "group": group})).await);
        assert_eq!(errors["name"], "Ensure this field has at least 5 characters.");
    }

    #[test]
    fn changed_data_only_lists_differences() {
        let stored = json!({"name": "Bakery", "weeks_in_advance": 4, "status": "created"});
        let validated = json!({"name": "Bakery", "weeks_in_advance": 2, "status": "active"});
        let changed = get_changed_data(&stored, validated.as_object().unwrap());
        assert_eq!(Value::Object(changed), json!({"weeks_in_advance": 2, "status": "active"}));
    }
}
