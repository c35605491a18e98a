use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role that allows changing stores, pickups and applications of a group
pub const ROLE_EDITOR: &str = "editor";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    Active,
    Inactive,
    Playground,
}

super::text_enum!(GroupStatus {
    Active => "active",
    Inactive => "inactive",
    Playground => "playground",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Group {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub status: GroupStatus,
    pub last_active_at: DateTime<Utc>,
}

impl Group {
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            status: GroupStatus::Active,
            last_active_at: now,
        }
    }

    /// Record activity; an inactive group becomes active again
    pub fn refresh_active_status(&mut self, now: DateTime<Utc>) {
        self.last_active_at = now;
        if self.status == GroupStatus::Inactive {
            self.status = GroupStatus::Active;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct GroupMembership {
    pub group_id: i64,
    pub user_id: i64,
    pub roles: Vec<String>,
}

impl GroupMembership {
    pub fn new(group_id: i64, user_id: i64) -> Self {
        Self { group_id, user_id, roles: Vec::new() }
    }

    pub fn editor(group_id: i64, user_id: i64) -> Self {
        Self { group_id, user_id, roles: vec![ROLE_EDITOR.to_string()] }
    }

    pub fn is_editor(&self) -> bool {
        self.roles.iter().any(|role| role == ROLE_EDITOR)
    }
}
