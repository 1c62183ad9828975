use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::config::ExecutorConfig;
use crate::context::ActionContext;
use crate::error::{ExecutorError, TaskErrors};
use crate::executor::{AutoExecutor, AutoOutcome, GraphExecutor};

use super::builder::build_tasks;
use super::callbacks::ErrorContinuation;
use super::descriptor::ActionMap;

/// Task name -> produced data; `None` when the task failed or never ran.
pub type TaskResults = BTreeMap<String, Option<Value>>;

/// Final report of one action map run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Execution {
    /// Failed tasks, absent when nothing failed
    pub err: Option<TaskErrors>,

    /// Every task of the input map
    pub results: TaskResults,
}

impl Execution {
    pub fn is_ok(&self) -> bool {
        self.err.is_none()
    }

    /// Data produced by `task_name`, if it produced any.
    pub fn result(&self, task_name: &str) -> Option<&Value> {
        self.results.get(task_name).and_then(Option::as_ref)
    }

    fn failed_count(&self) -> usize {
        self.err.as_ref().map_or(0, TaskErrors::len)
    }
}

/// Context plus scheduler, the two collaborators both entry points need.
pub struct ActionRunner<C, X = AutoExecutor> {
    context: Arc<C>,
    executor: Arc<X>,
}

impl<C, X> Clone for ActionRunner<C, X> {
    fn clone(&self) -> Self {
        Self {
            context: Arc::clone(&self.context),
            executor: Arc::clone(&self.executor),
        }
    }
}

impl<C: ActionContext> ActionRunner<C> {
    pub fn new(context: Arc<C>) -> Self {
        Self::with_executor(context, AutoExecutor::default())
    }

    pub fn with_config(context: Arc<C>, config: ExecutorConfig) -> Self {
        Self::with_executor(context, AutoExecutor::new(config))
    }
}

impl<C, X> ActionRunner<C, X>
where
    C: ActionContext,
    X: GraphExecutor + 'static,
{
    pub fn with_executor(context: Arc<C>, executor: X) -> Self {
        Self {
            context,
            executor: Arc::new(executor),
        }
    }

    pub fn context(&self) -> &Arc<C> {
        &self.context
    }

    /// Best-effort run.
    ///
    /// Failing tasks do not stop the graph unless their own spec marks them
    /// critical. Every failure ends up in `err` under its task name and the
    /// task's result is `None`.
    pub async fn execute_multiple(
        &self,
        actions: &ActionMap<C::Action>,
    ) -> Result<Execution, ExecutorError> {
        let tasks = build_tasks(&self.context, actions, false);
        let outcome = self.executor.run(tasks).await?;
        let execution = promote_soft_failures(outcome);

        tracing::debug!(
            target: "flux.flow",
            tasks = execution.results.len(),
            failed = execution.failed_count(),
            "executeMultiple finished"
        );
        Ok(execution)
    }

    /// Fail-fast run.
    ///
    /// The first failing task halts the graph. `err` then holds that single
    /// task's error and `results` whatever completed before it.
    pub async fn execute_critical(
        &self,
        actions: &ActionMap<C::Action>,
    ) -> Result<Execution, ExecutorError> {
        let tasks = build_tasks(&self.context, actions, true);
        let outcome = self.executor.run(tasks).await?;
        let execution = Execution {
            err: outcome.error,
            results: outcome.results,
        };

        tracing::debug!(
            target: "flux.flow",
            tasks = execution.results.len(),
            halted = !execution.is_ok(),
            "executeCritical finished"
        );
        Ok(execution)
    }

    /// [`execute_multiple`](Self::execute_multiple) without waiting for the
    /// outcome, which is only logged.
    pub fn spawn_multiple(&self, actions: ActionMap<C::Action>) -> JoinHandle<()> {
        let runner = self.clone();
        tokio::spawn(async move {
            log_detached("executeMultiple", runner.execute_multiple(&actions).await);
        })
    }

    /// [`execute_critical`](Self::execute_critical) without waiting for the
    /// outcome, which is only logged.
    pub fn spawn_critical(&self, actions: ActionMap<C::Action>) -> JoinHandle<()> {
        let runner = self.clone();
        tokio::spawn(async move {
            log_detached("executeCritical", runner.execute_critical(&actions).await);
        })
    }
}

/// Move every soft failure out of `results` into the error map.
fn promote_soft_failures(outcome: AutoOutcome<Value, TaskErrors>) -> Execution {
    let continuation = ErrorContinuation::new();
    let mut err = outcome.error;
    let mut results = outcome.results;

    for (task_name, slot) in results.iter_mut() {
        let Some(soft) = slot.as_ref().and_then(|data| continuation.extract(data)) else {
            continue;
        };
        err.get_or_insert_with(TaskErrors::new)
            .insert(task_name.clone(), soft);
        *slot = None;
    }

    Execution { err, results }
}

fn log_detached(entry: &str, outcome: Result<Execution, ExecutorError>) {
    match outcome {
        Ok(execution) if execution.is_ok() => {
            tracing::debug!(target: "flux.flow", entry, "detached run finished");
        }
        Ok(execution) => {
            tracing::debug!(
                target: "flux.flow",
                entry,
                failed = execution.failed_count(),
                "detached run finished with failures"
            );
        }
        Err(error) => {
            tracing::warn!(target: "flux.flow", entry, error = %error, "detached run rejected");
        }
    }
}

/// Best-effort run of `actions` on the default scheduler.
pub async fn execute_multiple<C: ActionContext>(
    context: Arc<C>,
    actions: &ActionMap<C::Action>,
) -> Result<Execution, ExecutorError> {
    ActionRunner::new(context).execute_multiple(actions).await
}

/// Fail-fast run of `actions` on the default scheduler.
pub async fn execute_critical<C: ActionContext>(
    context: Arc<C>,
    actions: &ActionMap<C::Action>,
) -> Result<Execution, ExecutorError> {
    ActionRunner::new(context).execute_critical(actions).await
}

/// Fire-and-forget [`execute_multiple`]. Must be called within a tokio runtime.
pub fn spawn_multiple<C: ActionContext>(
    context: Arc<C>,
    actions: ActionMap<C::Action>,
) -> JoinHandle<()> {
    ActionRunner::new(context).spawn_multiple(actions)
}

/// Fire-and-forget [`execute_critical`]. Must be called within a tokio runtime.
pub fn spawn_critical<C: ActionContext>(
    context: Arc<C>,
    actions: ActionMap<C::Action>,
) -> JoinHandle<()> {
    ActionRunner::new(context).spawn_critical(actions)
}
