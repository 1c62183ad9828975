use std::collections::BTreeMap;

/// Lifecycle of a task inside one scheduler run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Waiting on dependencies, or never started because the graph halted
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Result of a scheduler run
#[derive(Debug)]
pub struct AutoOutcome<T, E> {
    /// First task error; set means the graph halted
    pub error: Option<E>,

    /// Every task name; `None` for tasks that failed or never ran
    pub results: BTreeMap<String, Option<T>>,

    /// Final state of every task
    pub states: BTreeMap<String, TaskState>,
}

impl<T, E> AutoOutcome<T, E> {
    pub fn is_halted(&self) -> bool {
        self.error.is_some()
    }

    pub fn state(&self, task_id: &str) -> Option<TaskState> {
        self.states.get(task_id).copied()
    }
}
