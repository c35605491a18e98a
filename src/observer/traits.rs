use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::database::models::ModelKind;
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;

/// Model lifecycle signals fired by the model service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// Before the row is written; errors abort the write
    PreSave,
    /// After the row is written; errors are logged only
    PostSave,
    /// Before the row is removed; errors abort the delete
    PreDelete,
}

/// Base trait for all observers with metadata and applicability checks
pub trait Observer: Send + Sync {
    /// Observer name for logging and debugging
    fn name(&self) -> &'static str;

    /// Which signal this observer listens to
    fn signal(&self) -> Signal;

    /// Check if observer applies to this model kind
    fn applies_to_model(&self, kind: ModelKind) -> bool;

    /// Execution timeout (default 5 seconds)
    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    /// Priority within the signal (lower numbers execute first)
    fn priority(&self) -> u8 {
        50
    }
}

/// Runs before a save and may rewrite the instance being saved
#[async_trait]
pub trait PreSaveObserver: Observer {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError>;
}

#[async_trait]
pub trait PostSaveObserver: Observer {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError>;
}

#[async_trait]
pub trait PreDeleteObserver: Observer {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError>;
}

/// Concrete observer types for dynamic dispatch
pub enum ObserverBox {
    PreSave(Box<dyn PreSaveObserver>),
    PostSave(Box<dyn PostSaveObserver>),
    PreDelete(Box<dyn PreDeleteObserver>),
}

impl ObserverBox {
    pub fn name(&self) -> &'static str {
        match self {
            ObserverBox::PreSave(o) => o.name(),
            ObserverBox::PostSave(o) => o.name(),
            ObserverBox::PreDelete(o) => o.name(),
        }
    }

    /// The signal is fixed by the variant, not by what the observer reports
    pub fn signal(&self) -> Signal {
        match self {
            ObserverBox::PreSave(_) => Signal::PreSave,
            ObserverBox::PostSave(_) => Signal::PostSave,
            ObserverBox::PreDelete(_) => Signal::PreDelete,
        }
    }

    pub fn applies_to_model(&self, kind: ModelKind) -> bool {
        match self {
            ObserverBox::PreSave(o) => o.applies_to_model(kind),
            ObserverBox::PostSave(o) => o.applies_to_model(kind),
            ObserverBox::PreDelete(o) => o.applies_to_model(kind),
        }
    }

    pub fn timeout(&self) -> Duration {
        match self {
            ObserverBox::PreSave(o) => o.timeout(),
            ObserverBox::PostSave(o) => o.timeout(),
            ObserverBox::PreDelete(o) => o.timeout(),
        }
    }

    pub fn priority(&self) -> u8 {
        match self {
            ObserverBox::PreSave(o) => o.priority(),
            ObserverBox::PostSave(o) => o.priority(),
            ObserverBox::PreDelete(o) => o.priority(),
        }
    }

    pub async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        match self {
            ObserverBox::PreSave(o) => o.execute(ctx).await,
            ObserverBox::PostSave(o) => o.execute(ctx).await,
            ObserverBox::PreDelete(o) => o.execute(ctx).await,
        }
    }
}
