use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryTypus {
    StoreCreate,
    StoreModify,
}

super::text_enum!(HistoryTypus {
    StoreCreate => "STORE_CREATE",
    StoreModify => "STORE_MODIFY",
});

/// Append-only audit entry for a change to a tracked entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct History {
    #[serde(default)]
    pub id: i64,
    #[sqlx(try_from = "String")]
    pub typus: HistoryTypus,
    #[serde(rename = "group")]
    pub group_id: i64,
    #[serde(rename = "store")]
    pub store_id: Option<i64>,
    pub users: Vec<i64>,
    pub payload: Value,
    pub before: Option<Value>,
    pub after: Option<Value>,
    pub date: DateTime<Utc>,
}
