use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::context::ActionContext;

use super::registry::PeriodicRegistry;

/// Declared periodic action of a component.
#[derive(Debug, Clone)]
pub struct PeriodicActionSpec<A> {
    pub uuid: String,
    pub action: A,
    pub params: Option<Value>,
    pub interval: Option<Duration>,
}

impl<A> PeriodicActionSpec<A> {
    pub fn new(uuid: impl Into<String>, action: A) -> Self {
        Self {
            uuid: uuid.into(),
            action,
            params: None,
            interval: None,
        }
    }

    /// Spec with a freshly generated uuid.
    pub fn anonymous(action: A) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), action)
    }

    pub fn with_params(mut self, params: impl Into<Value>) -> Self {
        self.params = Some(params.into());
        self
    }

    pub fn every(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }
}

/// Component that declares the periodic actions it runs while mounted.
pub trait PeriodicComponent {
    type Action;

    fn periodic_actions(&self) -> Vec<PeriodicActionSpec<Self::Action>>;
}

/// Periodic actions owned by one mounted component.
///
/// Remembers every uuid it started so unmounting (or dropping the scope)
/// stops exactly those.
pub struct PeriodicScope<C: ActionContext> {
    registry: PeriodicRegistry<C>,
    context: Arc<C>,
    started: Vec<String>,
}

impl<C: ActionContext> PeriodicScope<C> {
    pub fn new(registry: PeriodicRegistry<C>, context: Arc<C>) -> Self {
        Self {
            registry,
            context,
            started: Vec::new(),
        }
    }

    /// New scope with `component`'s declared actions already started.
    pub fn mount<P>(registry: PeriodicRegistry<C>, context: Arc<C>, component: &P) -> Self
    where
        P: PeriodicComponent<Action = C::Action>,
    {
        let mut scope = Self::new(registry, context);
        scope.did_mount(component.periodic_actions());
        scope
    }

    pub fn start_periodic_action(
        &mut self,
        uuid: &str,
        action: C::Action,
        params: Option<Value>,
        interval: Option<Duration>,
    ) -> bool {
        let started = self
            .registry
            .start_periodic_action(&self.context, uuid, action, params, interval);
        if started {
            self.started.push(uuid.to_string());
        }
        started
    }

    pub fn stop_periodic_action(&mut self, uuid: &str) -> bool {
        self.started.retain(|u| u != uuid);
        self.registry.stop_periodic_action(uuid)
    }

    /// Start every spec; returns how many were started.
    pub fn did_mount<I>(&mut self, specs: I) -> usize
    where
        I: IntoIterator<Item = PeriodicActionSpec<C::Action>>,
    {
        let mut started = 0;
        for spec in specs {
            if self.start_periodic_action(&spec.uuid, spec.action, spec.params, spec.interval) {
                started += 1;
            }
        }
        started
    }

    /// Stop everything this scope started.
    pub fn will_unmount(&mut self) {
        for uuid in std::mem::take(&mut self.started) {
            self.registry.stop_periodic_action(&uuid);
        }
    }

    pub fn started(&self) -> &[String] {
        &self.started
    }

    pub fn registry(&self) -> &PeriodicRegistry<C> {
        &self.registry
    }
}

impl<C: ActionContext> Drop for PeriodicScope<C> {
    fn drop(&mut self) {
        self.will_unmount();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::context::{FnAction, LocalContext};

    struct Dashboard {
        refresh: FnAction,
    }

    impl PeriodicComponent for Dashboard {
        type Action = FnAction;

        fn periodic_actions(&self) -> Vec<PeriodicActionSpec<FnAction>> {
            vec![
                PeriodicActionSpec::new("refresh", self.refresh.clone()),
                PeriodicActionSpec::new("slow", self.refresh.clone()).every(Duration::from_secs(1)),
            ]
        }
    }

    fn counting() -> (FnAction, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let hits = Arc::clone(&count);
        let action = FnAction::new("count", move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
            async { Ok(Value::Null) }
        });
        (action, count)
    }

    #[tokio::test(start_paused = true)]
    async fn mount_starts_and_unmount_stops() {
        let registry = PeriodicRegistry::new();
        let (refresh, count) = counting();

        let mut scope = PeriodicScope::mount(
            registry.clone(),
            Arc::new(LocalContext),
            &Dashboard { refresh },
        );
        assert_eq!(scope.started(), &["refresh".to_string(), "slow".to_string()]);
        assert_eq!(
            registry.active_intervals(),
            vec![Duration::from_millis(100), Duration::from_secs(1)]
        );

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        scope.will_unmount();
        assert!(registry.is_empty());
        assert!(scope.started().is_empty());
    }

    #[tokio::test]
    async fn drop_unmounts() {
        let registry = PeriodicRegistry::new();
        let (action, _) = counting();
        {
            let mut scope = PeriodicScope::new(registry.clone(), Arc::new(LocalContext));
            let specs = [
                PeriodicActionSpec::anonymous(action.clone()),
                PeriodicActionSpec::new("poll", action),
            ];
            assert_eq!(scope.did_mount(specs), 2);
            assert_eq!(registry.len(), 2);
        }
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn scope_only_stops_its_own_actions() {
        let registry = PeriodicRegistry::new();
        let ctx = Arc::new(LocalContext);
        let (action, _) = counting();

        assert!(registry.start_periodic_action(&ctx, "global", action.clone(), None, None));
        let mut scope = PeriodicScope::new(registry.clone(), Arc::clone(&ctx));
        assert!(!scope.start_periodic_action("global", action.clone(), None, None));
        assert!(scope.start_periodic_action("local", action, None, None));

        drop(scope);
        assert!(registry.is_registered("global"));
        assert!(!registry.is_registered("local"));
    }

    #[test]
    fn anonymous_specs_get_distinct_uuids() {
        let a = PeriodicActionSpec::anonymous(());
        let b = PeriodicActionSpec::anonymous(());
        assert_ne!(a.uuid, b.uuid);
        assert_eq!(a.uuid.len(), 36);
    }
}
