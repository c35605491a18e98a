use crate::database::models::{Instance, Model};
use crate::database::service::ModelService;
use crate::observer::error::ObserverError;
use crate::observer::traits::Signal;

/// Data flowing through one signal dispatch
pub struct ObserverContext {
    pub signal: Signal,

    /// The instance being saved or deleted. Pre-save observers may rewrite it.
    pub instance: Instance,

    /// Stored state before this save; `None` on create and on delete
    pub previous: Option<Instance>,

    /// True when the save inserted a new row
    pub created: bool,

    /// Model service for secondary writes, one recursion level deeper
    pub models: ModelService,

    /// Failures collected while the signal ran
    pub errors: Vec<ObserverError>,
}

impl ObserverContext {
    pub fn new(signal: Signal, instance: Instance, models: ModelService) -> Self {
        Self {
            signal,
            instance,
            previous: None,
            created: false,
            models,
            errors: Vec::new(),
        }
    }

    pub fn with_previous(mut self, previous: Option<Instance>) -> Self {
        self.previous = previous;
        self
    }

    pub fn with_created(mut self, created: bool) -> Self {
        self.created = created;
        self
    }

    /// Typed view of the instance, `None` if it is another model kind
    pub fn instance_as<M: Model>(&self) -> Option<M> {
        M::from_instance(self.instance.clone())
    }

    pub fn previous_as<M: Model>(&self) -> Option<M> {
        self.previous.clone().and_then(M::from_instance)
    }

    /// Typed instance or a system error naming the observer
    pub fn require_instance<M: Model>(&self, observer: &str) -> Result<M, ObserverError> {
        self.instance_as::<M>().ok_or_else(|| {
            ObserverError::SystemError(format!(
                "{} received a {:?} instance",
                observer,
                self.instance.kind()
            ))
        })
    }
}
