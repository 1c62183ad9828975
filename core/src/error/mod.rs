pub mod action;
pub mod executor;

pub use action::{ActionError, TaskErrors, TaskFailure};
pub use executor::ExecutorError;
