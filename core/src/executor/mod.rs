//! Dependency-graph task scheduler ("run-auto")
//!
//! Runs a map of named tasks, each with a list of prerequisite task names.
//! It provides:
//! - Task dependency graph construction and validation
//! - Circular dependency and unknown dependency detection
//! - Event-driven scheduling: a task starts as soon as its dependencies succeed
//! - Optional concurrency cap
//! - Fail-fast halting with partial results
//!
//! # Architecture
//!
//! ```text
//! TaskMap<T, E>
//!   ↓
//! TaskGraph::from_task_map()
//!   ↓
//! TaskGraph::validate() → detect_cycle(), unknown dependencies
//!   ↓
//! run_auto() → spawn ready tasks, release dependents on success, halt on error
//!   ↓
//! AutoOutcome { error, results, states }
//! ```

mod graph;
mod scheduler;
pub mod traits;
pub mod types;

pub use graph::TaskGraph;
pub use scheduler::{run_auto, AutoExecutor};
pub use traits::GraphExecutor;
pub use types::{AutoOutcome, Runnable, TaskMap, TaskSpec, TaskState};
