use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Error reported by an action through its execution context.
///
/// The payload is opaque to the executor: it is forwarded, tagged with a
/// task name or stored as result data, but never inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionError(Value);

impl ActionError {
    pub fn new(payload: impl Into<Value>) -> Self {
        Self(payload.into())
    }

    /// Plain message payload.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self(Value::String(message.to_string()))
    }

    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        Self::msg(error)
    }

    pub fn payload(&self) -> &Value {
        &self.0
    }

    pub fn into_payload(self) -> Value {
        self.0
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            Value::Object(map) => match map.get("message") {
                Some(Value::String(message)) => f.write_str(message),
                _ => write!(f, "{}", self.0),
            },
            other => write!(f, "{other}"),
        }
    }
}

impl std::error::Error for ActionError {}

impl From<&str> for ActionError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for ActionError {
    fn from(value: String) -> Self {
        Self(Value::String(value))
    }
}

impl From<Value> for ActionError {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Errors keyed by the name of the task that produced them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskErrors(BTreeMap<String, ActionError>);

impl TaskErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-entry map attributing `error` to `task_name`.
    pub fn single(task_name: impl Into<String>, error: ActionError) -> Self {
        let mut errors = Self::new();
        errors.insert(task_name, error);
        errors
    }

    pub fn insert(&mut self, task_name: impl Into<String>, error: ActionError) -> Option<ActionError> {
        self.0.insert(task_name.into(), error)
    }

    pub fn get(&self, task_name: &str) -> Option<&ActionError> {
        self.0.get(task_name)
    }

    pub fn contains(&self, task_name: &str) -> bool {
        self.0.contains_key(task_name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ActionError)> {
        self.0.iter().map(|(name, err)| (name.as_str(), err))
    }

    /// Moves every entry of `other` into `self`; entries already present win.
    pub fn merge(&mut self, other: TaskErrors) {
        for (name, err) in other.0 {
            self.0.entry(name).or_insert(err);
        }
    }

    pub fn into_inner(self) -> BTreeMap<String, ActionError> {
        self.0
    }
}

impl fmt::Display for TaskErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, err) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "task '{name}' failed: {err}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for TaskErrors {}

impl<K: Into<String>> FromIterator<(K, ActionError)> for TaskErrors {
    fn from_iter<I: IntoIterator<Item = (K, ActionError)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, err)| (name.into(), err))
                .collect(),
        )
    }
}

impl IntoIterator for TaskErrors {
    type Item = (String, ActionError);
    type IntoIter = std::collections::btree_map::IntoIter<String, ActionError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Failure of a critical task.
///
/// Tagged with the failing task's name when one was supplied, so callers can
/// attribute a halted graph to the task that halted it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskFailure {
    #[error(transparent)]
    Tagged(TaskErrors),

    #[error(transparent)]
    Untagged(ActionError),
}

impl TaskFailure {
    /// Attribute the failure to `task_name` unless it already carries a tag.
    pub fn into_task_errors(self, task_name: &str) -> TaskErrors {
        match self {
            Self::Tagged(errors) => errors,
            Self::Untagged(err) => TaskErrors::single(task_name, err),
        }
    }
}
