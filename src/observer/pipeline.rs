use std::collections::HashMap;
use std::time::Instant;
use tokio::time::timeout;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{ObserverBox, Signal};

/// Observer registry keyed by signal. Observers of one signal run in
/// priority order, each under its own timeout.
pub struct ObserverPipeline {
    observers: HashMap<Signal, Vec<ObserverBox>>,

    max_recursion_depth: usize,
}

impl ObserverPipeline {
    /// Create new observer pipeline with empty observer registry
    pub fn new() -> Self {
        Self {
            observers: HashMap::new(),
            max_recursion_depth: 3,
        }
    }

    /// Pipeline with every model receiver registered
    pub fn with_default_observers() -> Self {
        let mut pipeline = Self::new();
        crate::observer::implementations::register_all(&mut pipeline);
        pipeline
    }

    pub fn register_observer(&mut self, observer: ObserverBox) {
        let signal = observer.signal();
        let name = observer.name();

        let observers = self.observers.entry(signal).or_default();
        observers.push(observer);
        // Stable sort keeps registration order within a priority
        observers.sort_by_key(|o| o.priority());

        tracing::debug!("Registered observer '{}' for {:?}", name, signal);
    }

    pub fn observer_names(&self, signal: Signal) -> Vec<&'static str> {
        self.observers
            .get(&signal)
            .map(|observers| observers.iter().map(|o| o.name()).collect())
            .unwrap_or_default()
    }

    pub fn max_recursion_depth(&self) -> usize {
        self.max_recursion_depth
    }

    /// Run every observer registered for `ctx.signal` that applies to the
    /// instance's model kind. Observer failures are collected in `ctx.errors`;
    /// only a recursion overflow is returned directly.
    pub async fn dispatch(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let depth = ctx.models.depth();
        if depth > self.max_recursion_depth {
            return Err(ObserverError::RecursionError {
                depth,
                max_depth: self.max_recursion_depth,
            });
        }

        let observers = match self.observers.get(&ctx.signal) {
            Some(obs) => obs,
            None => {
                tracing::debug!("No observers registered for {:?}", ctx.signal);
                return Ok(());
            }
        };

        let kind = ctx.instance.kind();
        tracing::debug!(
            "Dispatching {:?} for {:?} {} (depth {})",
            ctx.signal, kind, ctx.instance.id(), depth
        );

        for observer in observers {
            if !observer.applies_to_model(kind) {
                tracing::trace!("Observer {} skipped - doesn't apply to {:?}", observer.name(), kind);
                continue;
            }

            let observer_start = Instant::now();
            let result = timeout(observer.timeout(), observer.execute(ctx)).await;
            let execution_time = observer_start.elapsed();

            match result {
                Ok(Ok(())) => {
                    tracing::debug!(
                        "Observer: {} completed successfully in {:?}",
                        observer.name(), execution_time
                    );
                }
                Ok(Err(error)) => {
                    tracing::warn!(
                        "Observer: {} failed in {:?}: {}",
                        observer.name(), execution_time, error
                    );
                    ctx.errors.push(error);
                }
                Err(_elapsed) => {
                    tracing::error!(
                        "Observer: {} timed out after {:?}",
                        observer.name(), observer.timeout()
                    );
                    ctx.errors.push(ObserverError::TimeoutError(format!(
                        "Observer {} timed out after {:?}",
                        observer.name(),
                        observer.timeout()
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Default for ObserverPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{GroupApplication, ModelKind, Model};
    use crate::observer::traits::{Observer, PostSaveObserver};
    use crate::testing::TestContext;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct Named {
        name: &'static str,
        priority: u8,
        log: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
        sleep: Option<Duration>,
    }

    impl Observer for Named {
        fn name(&self) -> &'static str {
            self.name
        }

        fn signal(&self) -> Signal {
            Signal::PostSave
        }

        fn applies_to_model(&self, kind: ModelKind) -> bool {
            kind == ModelKind::Application
        }

        fn timeout(&self) -> Duration {
            Duration::from_millis(50)
        }

        fn priority(&self) -> u8 {
            self.priority
        }
    }

    #[async_trait]
    impl PostSaveObserver for Named {
        async fn execute(&self, _ctx: &ObserverContext) -> Result<(), ObserverError> {
            if let Some(sleep) = self.sleep {
                tokio::time::sleep(sleep).await;
            }
            self.log.lock().unwrap().push(self.name);
            if self.fail {
                return Err(ObserverError::ValidationError(self.name.to_string()));
            }
            Ok(())
        }
    }

    fn named(name: &'static str, priority: u8, log: &Arc<Mutex<Vec<&'static str>>>) -> Named {
        Named { name, priority, log: log.clone(), fail: false, sleep: None }
    }

    fn context(test: &TestContext) -> ObserverContext {
        let application = GroupApplication::new(1, 2, test.now());
        ObserverContext::new(Signal::PostSave, application.into_instance(), test.models.nested())
    }

    #[tokio::test]
    async fn runs_observers_in_priority_order() {
        let test = TestContext::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = ObserverPipeline::new();
        pipeline.register_observer(ObserverBox::PostSave(Box::new(named("late", 90, &log))));
        pipeline.register_observer(ObserverBox::PostSave(Box::new(named("early", 10, &log))));
        pipeline.register_observer(ObserverBox::PostSave(Box::new(named("middle", 50, &log))));

        let mut ctx = context(&test);
        pipeline.dispatch(&mut ctx).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["early", "middle", "late"]);
        assert!(ctx.errors.is_empty());
    }

    #[tokio::test]
    async fn collects_failures_and_keeps_going() {
        let test = TestContext::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = ObserverPipeline::new();
        let mut failing = named("failing", 10, &log);
        failing.fail = true;
        pipeline.register_observer(ObserverBox::PostSave(Box::new(failing)));
        pipeline.register_observer(ObserverBox::PostSave(Box::new(named("after", 20, &log))));

        let mut ctx = context(&test);
        pipeline.dispatch(&mut ctx).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["failing", "after"]);
        assert_eq!(ctx.errors.len(), 1);
    }

    #[tokio::test]
    async fn slow_observer_times_out() {
        let test = TestContext::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = ObserverPipeline::new();
        let mut slow = named("slow", 10, &log);
        slow.sleep = Some(Duration::from_secs(1));
        pipeline.register_observer(ObserverBox::PostSave(Box::new(slow)));

        let mut ctx = context(&test);
        pipeline.dispatch(&mut ctx).await.unwrap();

        assert!(log.lock().unwrap().is_empty());
        assert!(matches!(ctx.errors.as_slice(), [ObserverError::TimeoutError(_)]));
    }

    #[tokio::test]
    async fn skips_observers_for_other_models() {
        let test = TestContext::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = ObserverPipeline::new();
        pipeline.register_observer(ObserverBox::PostSave(Box::new(named("applications", 10, &log))));

        let pickup = crate::database::models::PickupDate::new(1, test.now());
        let mut ctx = ObserverContext::new(Signal::PostSave, pickup.into_instance(), test.models.nested());
        pipeline.dispatch(&mut ctx).await.unwrap();

        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_dispatch_beyond_max_depth() {
        let test = TestContext::new();
        let pipeline = ObserverPipeline::new();
        let mut models = test.models.clone();
        for _ in 0..=pipeline.max_recursion_depth() {
            models = models.nested();
        }
        let application = GroupApplication::new(1, 2, test.now());
        let mut ctx = ObserverContext::new(Signal::PreSave, application.into_instance(), models);

        let result = pipeline.dispatch(&mut ctx).await;
        assert!(matches!(result, Err(ObserverError::RecursionError { depth: 4, max_depth: 3 })));
    }

    #[test]
    fn default_pipeline_registers_every_receiver() {
        let pipeline = ObserverPipeline::with_default_observers();
        let pre_save = pipeline.observer_names(Signal::PreSave);
        let post_save = pipeline.observer_names(Signal::PostSave);
        let pre_delete = pipeline.observer_names(Signal::PreDelete);

        for name in ["create_thread_participant", "send_message_on_cancelled_pickup", "application_status_changed"] {
            assert!(pre_save.contains(&name), "missing {}", name);
        }
        for name in [
            "mark_as_read", "notify_participants", "message_created", "reaction_created",
            "set_conversation_updated_at_on_create", "application_created",
        ] {
            assert!(post_save.contains(&name), "missing {}", name);
        }
        assert_eq!(pre_delete, vec!["set_conversation_updated_at_on_delete"]);
    }
}
