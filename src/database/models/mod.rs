pub mod application;
pub mod conversation;
pub mod group;
pub mod history;
pub mod pickup;
pub mod store;

pub use application::{ApplicationStatus, GroupApplication};
pub use conversation::{
    Conversation, ConversationMessage, ConversationMessageReaction, ConversationParticipant,
    ConversationThreadParticipant, ConversationType,
};
pub use group::{Group, GroupMembership, GroupStatus, ROLE_EDITOR};
pub use history::{History, HistoryTypus};
pub use pickup::{PickupDate, PickupSeries};
pub use store::{Store, StoreStatus};

use serde::{Deserialize, Serialize};

/// Generates string conversions for enums stored as TEXT columns.
/// Rows decode through `#[sqlx(try_from = "String")]`.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("\"{}\" is not a valid choice.", other)),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

pub(crate) use text_enum;

/// Model kinds that emit save/delete signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    Message,
    Reaction,
    Participant,
    Pickup,
    Application,
}

/// A model instance flowing through signal dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum Instance {
    Message(ConversationMessage),
    Reaction(ConversationMessageReaction),
    Participant(ConversationParticipant),
    Pickup(PickupDate),
    Application(GroupApplication),
}

impl Instance {
    pub fn kind(&self) -> ModelKind {
        match self {
            Instance::Message(_) => ModelKind::Message,
            Instance::Reaction(_) => ModelKind::Reaction,
            Instance::Participant(_) => ModelKind::Participant,
            Instance::Pickup(_) => ModelKind::Pickup,
            Instance::Application(_) => ModelKind::Application,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Instance::Message(m) => m.id,
            Instance::Reaction(r) => r.id,
            Instance::Participant(p) => p.id,
            Instance::Pickup(p) => p.id,
            Instance::Application(a) => a.id,
        }
    }
}

/// Persisted models with signal support. An `id` of 0 marks an unsaved instance.
pub trait Model: Clone + Send + Sync + Sized + 'static {
    const KIND: ModelKind;

    fn id(&self) -> i64;

    fn into_instance(self) -> Instance;

    fn from_instance(instance: Instance) -> Option<Self>;

    fn is_saved(&self) -> bool {
        self.id() != 0
    }
}

macro_rules! impl_model {
    ($ty:ty, $kind:ident) => {
        impl Model for $ty {
            const KIND: ModelKind = ModelKind::$kind;

            fn id(&self) -> i64 {
                self.id
            }

            fn into_instance(self) -> Instance {
                Instance::$kind(self)
            }

            fn from_instance(instance: Instance) -> Option<Self> {
                match instance {
                    Instance::$kind(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

impl_model!(ConversationMessage, Message);
impl_model!(ConversationMessageReaction, Reaction);
impl_model!(ConversationParticipant, Participant);
impl_model!(PickupDate, Pickup);
impl_model!(GroupApplication, Application);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_enum_parses_and_rejects() {
        assert_eq!("active".parse::<StoreStatus>(), Ok(StoreStatus::Active));
        assert_eq!(
            "open".parse::<StoreStatus>(),
            Err("\"open\" is not a valid choice.".to_string())
        );
        assert_eq!(ApplicationStatus::ALL.len(), 4);
    }

    #[test]
    fn instance_round_trips_through_model() {
        let application = GroupApplication::new(1, 2, chrono::Utc::now());
        let instance = application.clone().into_instance();
        assert_eq!(instance.kind(), ModelKind::Application);
        assert_eq!(GroupApplication::from_instance(instance), Some(application));
        assert!(PickupDate::from_instance(Instance::Application(GroupApplication::new(1, 2, chrono::Utc::now()))).is_none());
    }
}
