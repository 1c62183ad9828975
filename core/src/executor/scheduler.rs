use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::{Semaphore, TryAcquireError};

use crate::config::ExecutorConfig;
use crate::error::ExecutorError;

use super::graph::TaskGraph;
use super::traits::GraphExecutor;
use super::types::{AutoOutcome, TaskMap, TaskState};

/// Default [`GraphExecutor`]: dependency-ordered, maximally concurrent,
/// fail-fast.
#[derive(Debug, Clone, Default)]
pub struct AutoExecutor {
    config: ExecutorConfig,
}

impl AutoExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }
}

#[async_trait]
impl GraphExecutor for AutoExecutor {
    async fn run<T, E>(&self, tasks: TaskMap<T, E>) -> Result<AutoOutcome<T, E>, ExecutorError>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        run_auto(tasks, self.config.max_concurrency).await
    }
}

/// Execute a task map respecting dependency order
///
/// Every task whose dependencies have all succeeded is spawned right away,
/// or as soon as a slot frees up when `max_concurrency` is set. The first
/// task error halts the run: nothing else is spawned, tasks still waiting
/// for a slot stay `Pending`, and the outcome is returned immediately with
/// the results gathered so far. Tasks already running are detached, not
/// aborted.
///
/// Must be called from within a tokio runtime.
///
/// # Arguments
///
/// * `tasks` - Task map to execute
/// * `max_concurrency` - Maximum number of concurrent tasks (`None` = unbounded)
pub async fn run_auto<T, E>(
    tasks: TaskMap<T, E>,
    max_concurrency: Option<usize>,
) -> Result<AutoOutcome<T, E>, ExecutorError>
where
    T: Send + 'static,
    E: Send + 'static,
{
    let graph = TaskGraph::from_task_map(&tasks)?;
    graph.validate()?;

    let mut remaining: HashMap<String, usize> = graph
        .task_ids()
        .iter()
        .map(|id| (id.clone(), graph.dependencies(id).len()))
        .collect();
    let mut results: BTreeMap<String, Option<T>> = BTreeMap::new();
    let mut states: BTreeMap<String, TaskState> = BTreeMap::new();
    let mut runnables = HashMap::with_capacity(tasks.len());
    for (id, spec) in tasks {
        results.insert(id.clone(), None);
        states.insert(id.clone(), TaskState::Pending);
        runnables.insert(id, spec.runnable);
    }

    let sem = max_concurrency.map(|n| Arc::new(Semaphore::new(n.max(1))));
    let mut ready: VecDeque<String> = graph.roots().into();
    let mut running = FuturesUnordered::new();

    tracing::debug!(
        target: "flux.flow",
        tasks = graph.len(),
        roots = ready.len(),
        max_concurrency = ?max_concurrency,
        "task graph started"
    );

    loop {
        // Dispatch only while a permit is at hand; ready tasks beyond the cap
        // stay Pending until a running task finishes.
        while let Some(task_id) = ready.front().cloned() {
            let permit = match &sem {
                Some(sem) => match Arc::clone(sem).try_acquire_owned() {
                    Ok(permit) => Some(permit),
                    Err(TryAcquireError::NoPermits) => break,
                    Err(TryAcquireError::Closed) => {
                        return Err(ExecutorError::Runner(
                            "semaphore closed unexpectedly".into(),
                        ))
                    }
                },
                None => None,
            };
            ready.pop_front();

            let Some(runnable) = runnables.remove(&task_id) else {
                continue;
            };

            states.insert(task_id.clone(), TaskState::Running);
            tracing::debug!(target: "flux.flow", task = %task_id, "task started");

            let handle = tokio::spawn(async move {
                let _permit = permit;
                runnable().await
            });

            running.push(async move { (task_id, handle.await) });
        }

        let Some((task_id, joined)) = running.next().await else {
            break;
        };

        match joined {
            Ok(Ok(value)) => {
                tracing::debug!(target: "flux.flow", task = %task_id, "task succeeded");
                results.insert(task_id.clone(), Some(value));
                states.insert(task_id.clone(), TaskState::Succeeded);

                for dependent in graph.dependents(&task_id) {
                    if let Some(count) = remaining.get_mut(dependent) {
                        *count -= 1;
                        if *count == 0 {
                            ready.push_back(dependent.clone());
                        }
                    }
                }
            }
            Ok(Err(error)) => {
                states.insert(task_id.clone(), TaskState::Failed);
                let not_started = states
                    .values()
                    .filter(|s| **s == TaskState::Pending)
                    .count();
                tracing::warn!(
                    target: "flux.flow",
                    task = %task_id,
                    in_flight = running.len(),
                    not_started,
                    "task failed, halting graph"
                );
                // Dropping the join handles detaches in-flight tasks.
                return Ok(AutoOutcome {
                    error: Some(error),
                    results,
                    states,
                });
            }
            Err(join_error) => {
                tracing::error!(target: "flux.flow", task = %task_id, error = %join_error, "task panicked");
                return Err(ExecutorError::TaskPanicked {
                    task_id,
                    message: join_error.to_string(),
                });
            }
        }
    }

    tracing::debug!(target: "flux.flow", tasks = results.len(), "task graph completed");

    Ok(AutoOutcome {
        error: None,
        results,
        states,
    })
}
