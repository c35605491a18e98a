use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{info, warn};

use crate::database::models::{ApplicationStatus, Group, GroupApplication};
use crate::database::{Datastore, DatabaseError, ModelService};
use crate::stats::{Point, PointWriter, MEASUREMENT_EVENTS, MEASUREMENT_GROUP_APPLICATIONS};

pub fn group_tags(group: &Group) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("group".to_string(), group.id.to_string()),
        ("group_status".to_string(), group.status.to_string()),
    ])
}

/// Application counts of one group, total and per status
pub async fn get_group_application_stats(
    datastore: &dyn Datastore,
    group: &Group,
) -> Result<Vec<Point>, DatabaseError> {
    let counts: BTreeMap<ApplicationStatus, i64> = datastore
        .count_applications_by_status(group.id)
        .await?
        .into_iter()
        .collect();

    let mut point = Point::new(MEASUREMENT_GROUP_APPLICATIONS)
        .tags(group_tags(group))
        .field("count_total", counts.values().sum());
    for status in ApplicationStatus::ALL {
        let count = counts.get(status).copied().unwrap_or(0);
        point = point.field(format!("count_status_{}", status), count);
    }

    Ok(vec![point])
}

pub fn application_pending_point(group: &Group) -> Point {
    Point::new(MEASUREMENT_EVENTS)
        .tags(group_tags(group))
        .field("application_pending", 1)
}

pub fn application_status_update_point(group: &Group, application: &GroupApplication, now: DateTime<Utc>) -> Point {
    let status = application.status;
    let mut point = Point::new(MEASUREMENT_EVENTS)
        .tags(group_tags(group))
        .tag("application_status", status)
        .field(format!("application_{}", status), 1);

    if status != ApplicationStatus::Pending {
        let alive_seconds = alive_seconds(application.created_at, now);
        point = point
            .field("application_alive_seconds", alive_seconds)
            .field(format!("application_{}_alive_seconds", status), alive_seconds);
    }

    point
}

fn alive_seconds(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (now - created_at).num_milliseconds();
    (millis as f64 / 1000.0).round() as i64
}

pub async fn application_pending(models: &ModelService, application: &GroupApplication) -> Result<(), DatabaseError> {
    let group = models.datastore().get_group(application.group_id).await?;
    models.stats().write_points(vec![application_pending_point(&group)]);
    Ok(())
}

pub async fn application_status_update(models: &ModelService, application: &GroupApplication) -> Result<(), DatabaseError> {
    let group = models.datastore().get_group(application.group_id).await?;
    models
        .stats()
        .write_points(vec![application_status_update_point(&group, application, models.now())]);
    Ok(())
}

/// Application stats points of every group; groups that fail are skipped
pub async fn collect_group_stats(datastore: &dyn Datastore) -> Result<Vec<Point>, DatabaseError> {
    let groups = datastore.list_groups().await?;
    let results = join_all(groups.iter().map(|group| get_group_application_stats(datastore, group))).await;

    let mut points = Vec::with_capacity(groups.len());
    for (group, result) in groups.iter().zip(results) {
        match result {
            Ok(group_points) => points.extend(group_points),
            Err(e) => warn!("Skipping application stats for group {}: {}", group.id, e),
        }
    }
    Ok(points)
}

/// Write the application stats point of every group
pub async fn record_group_stats(datastore: &dyn Datastore, writer: &dyn PointWriter) -> Result<usize, DatabaseError> {
    let points = collect_group_stats(datastore).await?;
    let written = points.len();
    writer.write_points(points);
    info!("Recorded application stats for {} groups", written);
    Ok(written)
}
