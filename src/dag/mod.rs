// src/dag/mod.rs

//! DAG representation and scheduling.
//!
//! - [`graph`] holds the node/edge sets, the predecessor and successor
//!   indices, and the incrementally maintained topological order.
//! - [`scheduler`] hands out ready batches of tasks and retires completed
//!   ones from the graph.

pub mod graph;
pub mod scheduler;

pub use graph::{Edge, Graph, Node, NodeId, SortState};
pub use scheduler::Scheduler;
