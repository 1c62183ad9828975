mod graph_executor;

pub use graph_executor::*;
