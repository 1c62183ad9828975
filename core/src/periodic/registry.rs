use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::PeriodicConfig;
use crate::context::ActionContext;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
struct PeriodicEntry<A> {
    uuid: String,
    action: A,
    params: Option<Value>,
}

type SharedEntries<A> = Arc<Mutex<Vec<PeriodicEntry<A>>>>;

/// Actions sharing one interval, driven by a single timer.
struct Batch<A> {
    entries: SharedEntries<A>,
    timer: JoinHandle<()>,
}

struct RegistryState<A> {
    batches: HashMap<Duration, Batch<A>>,
    uuids: HashMap<String, Duration>,
}

impl<A> Default for RegistryState<A> {
    fn default() -> Self {
        Self {
            batches: HashMap::new(),
            uuids: HashMap::new(),
        }
    }
}

/// Registry of recurring actions batched by interval.
///
/// Cloning yields another handle to the same registry. Each distinct
/// interval owns one tokio timer; every tick dispatches the batch's actions
/// in registration order through the context that created the batch.
pub struct PeriodicRegistry<C: ActionContext> {
    state: Arc<Mutex<RegistryState<C::Action>>>,
    default_interval: Duration,
}

impl<C: ActionContext> Clone for PeriodicRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            default_interval: self.default_interval,
        }
    }
}

impl<C: ActionContext> Default for PeriodicRegistry<C> {
    fn default() -> Self {
        Self::with_config(&PeriodicConfig::default())
    }
}

impl<C: ActionContext> PeriodicRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &PeriodicConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(RegistryState::default())),
            default_interval: config.default_interval().max(MIN_INTERVAL),
        }
    }

    pub fn default_interval(&self) -> Duration {
        self.default_interval
    }

    /// Register `action` to run every `interval`.
    ///
    /// Without an explicit interval, a numeric `params` is taken as the
    /// interval in milliseconds (and the action gets no params); otherwise
    /// the default interval applies.
    ///
    /// Returns `false` when `uuid` is empty or already registered, or when
    /// no tokio runtime is available to drive the timer.
    pub fn start_periodic_action(
        &self,
        context: &Arc<C>,
        uuid: &str,
        action: C::Action,
        params: Option<Value>,
        interval: Option<Duration>,
    ) -> bool {
        if uuid.is_empty() {
            return false;
        }

        let (params, interval) = self.resolve_interval(params, interval);
        let mut state = self.lock();

        if state.uuids.contains_key(uuid) {
            tracing::debug!(target: "flux.periodic", uuid, "periodic action already registered");
            return false;
        }

        if !state.batches.contains_key(&interval) {
            let runtime = match Handle::try_current() {
                Ok(runtime) => runtime,
                Err(err) => {
                    tracing::warn!(target: "flux.periodic", uuid, error = %err, "no runtime for periodic timer");
                    return false;
                }
            };
            let entries: SharedEntries<C::Action> = Arc::new(Mutex::new(Vec::new()));
            let timer = runtime.spawn(run_batch(Arc::clone(context), Arc::clone(&entries), interval));
            state.batches.insert(interval, Batch { entries, timer });
            tracing::debug!(target: "flux.periodic", interval_ms = interval.as_millis() as u64, "periodic timer started");
        }

        if let Some(batch) = state.batches.get(&interval) {
            lock_entries(&batch.entries).push(PeriodicEntry {
                uuid: uuid.to_string(),
                action,
                params,
            });
        }
        state.uuids.insert(uuid.to_string(), interval);

        tracing::debug!(
            target: "flux.periodic",
            uuid,
            interval_ms = interval.as_millis() as u64,
            "periodic action registered"
        );
        true
    }

    /// Unregister `uuid`. The interval's timer stops with its last action.
    ///
    /// Returns `false` when `uuid` is unknown.
    pub fn stop_periodic_action(&self, uuid: &str) -> bool {
        let mut state = self.lock();

        let Some(interval) = state.uuids.remove(uuid) else {
            return false;
        };

        let now_empty = match state.batches.get(&interval) {
            Some(batch) => {
                let mut entries = lock_entries(&batch.entries);
                if let Some(pos) = entries.iter().position(|e| e.uuid == uuid) {
                    entries.remove(pos);
                }
                entries.is_empty()
            }
            None => false,
        };

        if now_empty {
            if let Some(batch) = state.batches.remove(&interval) {
                batch.timer.abort();
            }
            tracing::debug!(target: "flux.periodic", interval_ms = interval.as_millis() as u64, "periodic timer stopped");
        }

        tracing::debug!(target: "flux.periodic", uuid, "periodic action unregistered");
        true
    }

    pub fn is_registered(&self, uuid: &str) -> bool {
        self.lock().uuids.contains_key(uuid)
    }

    pub fn interval_of(&self, uuid: &str) -> Option<Duration> {
        self.lock().uuids.get(uuid).copied()
    }

    /// Intervals that currently own a timer, shortest first.
    pub fn active_intervals(&self) -> Vec<Duration> {
        let mut intervals: Vec<Duration> = self.lock().batches.keys().copied().collect();
        intervals.sort();
        intervals
    }

    /// Number of registered actions.
    pub fn len(&self) -> usize {
        self.lock().uuids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop every action and timer.
    pub fn clear(&self) {
        let mut state = self.lock();
        for (_, batch) in state.batches.drain() {
            batch.timer.abort();
        }
        state.uuids.clear();
    }

    fn resolve_interval(
        &self,
        params: Option<Value>,
        interval: Option<Duration>,
    ) -> (Option<Value>, Duration) {
        let (params, interval) = match (interval, params) {
            (Some(interval), params) => (params, interval),
            (None, Some(Value::Number(ms))) => {
                let ms = ms.as_f64().unwrap_or(0.0).max(0.0);
                (None, Duration::from_millis(ms as u64))
            }
            (None, params) => (params, self.default_interval),
        };
        (params, interval.max(MIN_INTERVAL))
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState<C::Action>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn lock_entries<A>(entries: &SharedEntries<A>) -> MutexGuard<'_, Vec<PeriodicEntry<A>>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run_batch<C: ActionContext>(
    context: Arc<C>,
    entries: SharedEntries<C::Action>,
    period: Duration,
) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let due: Vec<PeriodicEntry<C::Action>> = lock_entries(&entries).clone();
        for entry in due {
            let context = Arc::clone(&context);
            tokio::spawn(async move {
                if let Err(err) = context.execute_action(&entry.action, entry.params).await {
                    tracing::debug!(
                        target: "flux.periodic",
                        uuid = %entry.uuid,
                        error = %err,
                        "periodic action failed"
                    );
                }
            });
        }
    }
}
