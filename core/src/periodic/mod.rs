//! Recurring actions batched by interval
//!
//! A [`PeriodicRegistry`] owns one timer per distinct interval and the
//! actions registered on it. A [`PeriodicScope`] ties a set of those actions
//! to a component's mount/unmount lifecycle.

mod registry;
mod scope;

pub use registry::PeriodicRegistry;
pub use scope::{PeriodicActionSpec, PeriodicComponent, PeriodicScope};
