use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;

use crate::context::{ActionContext, ActionResult};
use crate::error::TaskFailure;
use crate::executor::Runnable;

use super::callbacks::{CriticalErrorTagger, ErrorContinuation};

/// How a task's outcome is reported to the scheduler.
#[derive(Debug, Clone)]
enum Completion {
    Critical(CriticalErrorTagger),
    Continue(ErrorContinuation),
}

impl Completion {
    fn for_task(is_critical: bool, task_name: Option<&str>) -> Self {
        if is_critical {
            Self::Critical(CriticalErrorTagger::new(task_name.map(str::to_string)))
        } else {
            Self::Continue(ErrorContinuation::new())
        }
    }

    fn complete(&self, result: ActionResult) -> Result<Value, TaskFailure> {
        match self {
            Self::Critical(tagger) => tagger.apply(result),
            Self::Continue(continuation) => Ok(continuation.apply(result)),
        }
    }
}

/// Adapt one action into a unit the graph scheduler can run.
///
/// A critical task fails with its error, tagged with `task_name` when one is
/// given. Any other task always succeeds and carries its error as
/// `{ "err": <error> }` instead.
///
/// Nothing runs until the returned runnable is invoked.
pub fn to_async_task<C>(
    action: C::Action,
    context: Arc<C>,
    params: Option<Value>,
    is_critical: bool,
    task_name: Option<&str>,
) -> Runnable<Value, TaskFailure>
where
    C: ActionContext,
{
    let completion = Completion::for_task(is_critical, task_name);

    Box::new(move || {
        async move {
            let result = context.execute_action(&action, params).await;
            completion.complete(result)
        }
        .boxed()
    })
}
