//! Execution context capability.
//!
//! An [`ActionContext`] knows how to run one of its actions. The executor
//! only ever hands it an action plus params and awaits the outcome; how the
//! action is dispatched (and what an action even is) belongs to the context.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

use crate::error::ActionError;

/// Outcome of a single action: its data, or the error it reported.
pub type ActionResult = Result<Value, ActionError>;

#[async_trait]
pub trait ActionContext: Send + Sync + 'static {
    /// Context-specific action representation.
    type Action: Clone + Send + Sync + 'static;

    /// Run `action` with `params`, resolving exactly once.
    async fn execute_action(&self, action: &Self::Action, params: Option<Value>) -> ActionResult;
}

type ActionHandler = dyn Fn(Option<Value>) -> BoxFuture<'static, ActionResult> + Send + Sync;

/// Named async closure usable as an action by [`LocalContext`].
#[derive(Clone)]
pub struct FnAction {
    name: Arc<str>,
    handler: Arc<ActionHandler>,
}

impl FnAction {
    pub fn new<F, Fut>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        let name: String = name.into();
        Self {
            name: Arc::from(name),
            handler: Arc::new(move |params| handler(params).boxed()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, params: Option<Value>) -> BoxFuture<'static, ActionResult> {
        (self.handler)(params)
    }
}

impl fmt::Debug for FnAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAction").field("name", &self.name).finish()
    }
}

/// Context that runs [`FnAction`]s in place.
#[derive(Debug, Clone, Default)]
pub struct LocalContext;

impl LocalContext {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ActionContext for LocalContext {
    type Action = FnAction;

    async fn execute_action(&self, action: &FnAction, params: Option<Value>) -> ActionResult {
        tracing::trace!(target: "flux.flow", action = action.name(), "dispatching action");
        action.call(params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn local_context_passes_params_through() {
        let echo = FnAction::new("echo", |params| async move { Ok(params.unwrap_or(Value::Null)) });
        let ctx = LocalContext::new();

        let out = ctx
            .execute_action(&echo, Some(json!({ "test": true })))
            .await
            .unwrap();
        assert_eq!(out, json!({ "test": true }));
    }

    #[tokio::test]
    async fn local_context_forwards_errors() {
        let failing = FnAction::new("failing", |_| async { Err(ActionError::from("nope")) });
        let err = LocalContext
            .execute_action(&failing, None)
            .await
            .unwrap_err();
        assert_eq!(err, ActionError::from("nope"));
        assert_eq!(format!("{failing:?}"), "FnAction { name: \"failing\" }");
    }
}
