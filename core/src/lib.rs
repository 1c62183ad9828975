//! Declarative action orchestration over a dependency-graph scheduler.
//!
//! A caller describes named actions and the tasks each one waits for; the
//! crate turns that into a task graph, runs it with maximum concurrency and
//! reports results under one of two policies:
//!
//! - [`execute_multiple`]: best effort. Failures become per-task errors and
//!   never stop unrelated work.
//! - [`execute_critical`]: fail fast. The first failure halts the graph and
//!   is reported under the failing task's name.
//!
//! The [`periodic`] module runs actions on recurring, interval-batched timers.

pub mod actions;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod logging;
pub mod periodic;

pub use actions::{
    build_tasks, execute_critical, execute_multiple, spawn_critical, spawn_multiple,
    to_async_task, ActionDescriptor, ActionMap, ActionRunner, ActionSpec, Execution,
};
pub use context::{ActionContext, ActionResult, FnAction, LocalContext};
pub use error::{ActionError, ExecutorError, TaskErrors, TaskFailure};
pub use periodic::{PeriodicActionSpec, PeriodicRegistry, PeriodicScope};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
