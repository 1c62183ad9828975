use async_trait::async_trait;

use crate::error::ExecutorError;
use crate::executor::types::{AutoOutcome, TaskMap};

/// Dependency-graph scheduler plugged under the action entry points.
///
/// Implementations must honour the halting contract: no task starts before
/// all of its dependencies succeeded, the first task error stops further
/// scheduling and is reported together with the partial results, and every
/// task name of the input appears in the outcome's results.
#[async_trait]
pub trait GraphExecutor: Send + Sync {
    async fn run<T, E>(&self, tasks: TaskMap<T, E>) -> Result<AutoOutcome<T, E>, ExecutorError>
    where
        T: Send + 'static,
        E: Send + 'static;
}
