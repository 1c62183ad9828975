use std::collections::BTreeMap;

use futures::future::BoxFuture;

/// Deferred unit of work, started by the scheduler once its dependencies
/// have succeeded.
pub type Runnable<T, E> = Box<dyn FnOnce() -> BoxFuture<'static, Result<T, E>> + Send>;

/// One node of a scheduler task map.
pub struct TaskSpec<T, E> {
    /// Names of the tasks that must succeed before this one starts
    pub dependencies: Vec<String>,

    pub runnable: Runnable<T, E>,
}

impl<T, E> TaskSpec<T, E> {
    pub fn new(dependencies: Vec<String>, runnable: Runnable<T, E>) -> Self {
        Self {
            dependencies,
            runnable,
        }
    }

    /// Task without prerequisites.
    pub fn root(runnable: Runnable<T, E>) -> Self {
        Self::new(Vec::new(), runnable)
    }
}

impl<T, E> std::fmt::Debug for TaskSpec<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSpec")
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Task name -> task, the scheduler's input format.
pub type TaskMap<T, E> = BTreeMap<String, TaskSpec<T, E>>;
