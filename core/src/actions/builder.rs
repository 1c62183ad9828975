use std::sync::Arc;

use futures::{FutureExt, TryFutureExt};
use serde_json::Value;

use crate::context::ActionContext;
use crate::error::{ExecutorError, TaskErrors};
use crate::executor::{TaskGraph, TaskMap, TaskSpec};

use super::descriptor::ActionMap;
use super::task::to_async_task;

/// Convert an action map into the scheduler's task map.
///
/// Each descriptor is normalized once; its prerequisite names are kept
/// verbatim and its action becomes a runnable via [`to_async_task`]. A task
/// is critical when `is_always_critical` is set or its own spec says so.
/// Critical failures are always attributed to the map key, even an empty
/// one; only [`to_async_task`] called directly treats an empty name as none.
///
/// Dependencies are not checked here; the scheduler rejects unknown names
/// and cycles before running anything.
pub fn build_tasks<C>(
    context: &Arc<C>,
    actions: &ActionMap<C::Action>,
    is_always_critical: bool,
) -> TaskMap<Value, TaskErrors>
where
    C: ActionContext,
{
    let mut tasks = TaskMap::new();

    for (name, descriptor) in actions.iter() {
        let task = descriptor.normalize();
        let is_critical = is_always_critical || task.is_critical;

        tracing::debug!(
            target: "flux.flow",
            task = name,
            dependencies = ?task.dependencies,
            is_critical,
            "task built"
        );

        let runnable = to_async_task(
            task.action,
            Arc::clone(context),
            task.params,
            is_critical,
            Some(name),
        );
        let task_name = name.to_string();
        tasks.insert(
            name.to_string(),
            TaskSpec::new(
                task.dependencies,
                Box::new(move || {
                    runnable()
                        .map_err(move |failure| failure.into_task_errors(&task_name))
                        .boxed()
                }),
            ),
        );
    }

    tasks
}

/// Execution stages of an action map: tasks in one stage only depend on
/// tasks of earlier stages.
pub fn plan<A>(actions: &ActionMap<A>) -> Result<Vec<Vec<String>>, ExecutorError> {
    let graph = TaskGraph::from_dependencies(
        actions
            .iter()
            .map(|(name, descriptor)| (name, descriptor.dependencies())),
    )?;
    graph.validate()?;
    graph.topological_sort()
}
