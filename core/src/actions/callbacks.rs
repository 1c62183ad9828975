use serde_json::{Map, Value};

use crate::context::ActionResult;
use crate::error::{ActionError, TaskErrors, TaskFailure};

/// Property that receives a soft failure unless configured otherwise.
pub const DEFAULT_ERROR_FIELD: &str = "err";

/// Turns an action failure into ordinary result data.
///
/// A wrapped task can never halt the graph: its error is stored under
/// [`field`](Self::field) of the payload it resolves with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContinuation {
    field: String,
}

impl Default for ErrorContinuation {
    fn default() -> Self {
        Self {
            field: DEFAULT_ERROR_FIELD.to_string(),
        }
    }
}

impl ErrorContinuation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Resolve `result` into the payload handed to the scheduler.
    ///
    /// A falsy success payload becomes `{}`. A failure becomes
    /// `{ <field>: <error> }`.
    pub fn apply(&self, result: ActionResult) -> Value {
        match result {
            Ok(data) if is_truthy(&data) => data,
            Ok(_) => Value::Object(Map::new()),
            Err(err) => {
                let mut data = Map::new();
                data.insert(self.field.clone(), err.into_payload());
                Value::Object(data)
            }
        }
    }

    /// Recover the soft failure stored in `data`, if it holds one.
    ///
    /// Only a truthy value under the field counts, so `{ "err": null }` or
    /// `{ "err": false }` are plain data.
    pub fn extract(&self, data: &Value) -> Option<ActionError> {
        data.get(&self.field)
            .filter(|err| is_truthy(err))
            .cloned()
            .map(ActionError::new)
    }
}

/// Attributes the failure of a critical task to the task's name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriticalErrorTagger {
    task_name: Option<String>,
}

impl CriticalErrorTagger {
    pub fn new(task_name: Option<String>) -> Self {
        Self { task_name }
    }

    pub fn named(task_name: impl Into<String>) -> Self {
        Self::new(Some(task_name.into()))
    }

    /// Forwards errors untouched.
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn task_name(&self) -> Option<&str> {
        self.task_name.as_deref()
    }

    pub fn apply(&self, result: ActionResult) -> Result<Value, TaskFailure> {
        result.map_err(|err| match self.task_name.as_deref() {
            Some(name) if !name.is_empty() => TaskFailure::Tagged(TaskErrors::single(name, err)),
            _ => TaskFailure::Untagged(err),
        })
    }
}

/// Loose truthiness of a JSON value.
///
/// `null`, `false`, `0` and `""` are falsy. Empty arrays and objects are
/// truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
