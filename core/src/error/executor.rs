use thiserror::Error;

/// Executor-specific errors for task graph construction and execution
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Duplicate task ID: {0}")]
    DuplicateTaskId(String),

    #[error("Dependency not found: task '{task_id}' depends on '{missing_dep}'")]
    DependencyNotFound {
        task_id: String,
        missing_dep: String,
    },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("Task '{task_id}' panicked: {message}")]
    TaskPanicked { task_id: String, message: String },

    #[error("Runner error: {0}")]
    Runner(String),
}

impl ExecutorError {
    /// True when the graph was rejected before any task started.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateTaskId(_)
                | Self::DependencyNotFound { .. }
                | Self::CircularDependency(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_errors_are_classified() {
        assert!(ExecutorError::DuplicateTaskId("a".into()).is_construction_error());
        assert!(ExecutorError::CircularDependency("a -> a".into()).is_construction_error());
        assert!(!ExecutorError::TaskPanicked {
            task_id: "a".into(),
            message: "boom".into(),
        }
        .is_construction_error());
    }

    #[test]
    fn runner_error_is_not_a_construction_error() {
        let err = ExecutorError::Runner("semaphore closed unexpectedly".into());
        assert!(!err.is_construction_error());
        assert_eq!(err.to_string(), "Runner error: semaphore closed unexpectedly");
    }

    #[test]
    fn dependency_error_names_both_tasks() {
        let err = ExecutorError::DependencyNotFound {
            task_id: "bar".into(),
            missing_dep: "foo".into(),
        };
        assert_eq!(
            err.to_string(),
            "Dependency not found: task 'bar' depends on 'foo'"
        );
    }
}
