use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Declined,
    Withdrawn,
}

super::text_enum!(ApplicationStatus {
    Pending => "pending",
    Accepted => "accepted",
    Declined => "declined",
    Withdrawn => "withdrawn",
});

/// A user's request to join a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct GroupApplication {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "group")]
    pub group_id: i64,
    #[serde(rename = "user")]
    pub user_id: i64,
    #[sqlx(try_from = "String")]
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl GroupApplication {
    pub fn new(group_id: i64, user_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            group_id,
            user_id,
            status: ApplicationStatus::Pending,
            created_at: now,
            decided_at: None,
        }
    }
}
