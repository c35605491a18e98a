use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Created,
    Negotiating,
    Active,
    Declined,
    Archived,
}

super::text_enum!(StoreStatus {
    Created => "created",
    Negotiating => "negotiating",
    Active => "active",
    Declined => "declined",
    Archived => "archived",
});

impl Default for StoreStatus {
    fn default() -> Self {
        StoreStatus::Created
    }
}

/// A physical food pickup location managed by a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Store {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(rename = "group")]
    pub group_id: i64,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub weeks_in_advance: i32,
    #[sqlx(try_from = "String")]
    pub status: StoreStatus,
    pub last_changed_message: String,
    pub last_changed_by: Option<i64>,
    pub created_by: Option<i64>,
}

impl Store {
    pub const DEFAULT_WEEKS_IN_ADVANCE: i32 = 4;

    pub fn new(group_id: i64, name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: String::new(),
            group_id,
            address: String::new(),
            latitude: None,
            longitude: None,
            weeks_in_advance: Self::DEFAULT_WEEKS_IN_ADVANCE,
            status: StoreStatus::default(),
            last_changed_message: String::new(),
            last_changed_by: None,
            created_by: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == StoreStatus::Active
    }
}
