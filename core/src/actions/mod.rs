//! Declarative action maps on top of the graph scheduler
//!
//! # Architecture
//!
//! ```text
//! ActionMap<A>  (name -> Action | Spec | Sequence)
//!   ↓
//! ActionDescriptor::normalize()
//!   ↓
//! to_async_task() → CriticalErrorTagger | ErrorContinuation
//!   ↓
//! build_tasks() → TaskMap<Value, TaskErrors>
//!   ↓
//! GraphExecutor::run()
//!   ↓
//! execute_multiple() (promote soft failures) | execute_critical() (as is)
//!   ↓
//! Execution { err, results }
//! ```

mod builder;
mod callbacks;
mod descriptor;
mod execute;
mod task;

pub use builder::{build_tasks, plan};
pub use callbacks::{is_truthy, CriticalErrorTagger, ErrorContinuation, DEFAULT_ERROR_FIELD};
pub use descriptor::{ActionDescriptor, ActionMap, ActionSpec, NormalizedTask};
pub use execute::{
    execute_critical, execute_multiple, spawn_critical, spawn_multiple, ActionRunner, Execution,
    TaskResults,
};
pub use task::to_async_task;
