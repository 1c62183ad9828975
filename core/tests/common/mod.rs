#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use flux_actions_core::{ActionContext, ActionError, ActionResult};
use serde_json::{json, Value};

/// Action that resolves with `err` when set, otherwise with `data`, after
/// checking it was handed `expected_params`.
#[derive(Debug, Clone)]
pub struct MockAction {
    pub err: Option<ActionError>,
    pub data: Value,
    pub expected_params: Option<Value>,
    pub delay: Duration,
}

pub fn mock_action(err: Option<ActionError>, data: Value, expected_params: Option<Value>) -> MockAction {
    MockAction {
        err,
        data,
        expected_params,
        delay: Duration::ZERO,
    }
}

pub fn ok_action(data: &str) -> MockAction {
    mock_action(None, json!(data), None)
}

pub fn failing_action(err: impl Into<ActionError>) -> MockAction {
    mock_action(Some(err.into()), Value::Null, None)
}

impl MockAction {
    pub fn with_params(mut self, params: Value) -> Self {
        self.expected_params = Some(params);
        self
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

pub fn mock_error() -> ActionError {
    ActionError::new(json!({ "status": 400, "message": "Bad Request" }))
}

#[derive(Debug, Default)]
pub struct MockContext {
    calls: AtomicUsize,
}

impl MockContext {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActionContext for MockContext {
    type Action = MockAction;

    async fn execute_action(&self, action: &MockAction, params: Option<Value>) -> ActionResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(params, action.expected_params, "unexpected params");

        if !action.delay.is_zero() {
            tokio::time::sleep(action.delay).await;
        }

        match &action.err {
            Some(err) => Err(err.clone()),
            None => Ok(action.data.clone()),
        }
    }
}
