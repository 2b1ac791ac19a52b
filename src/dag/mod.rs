// src/dag/mod.rs

//! Task graph and per-instance readiness.
//!
//! - [`task`] holds the immutable task definitions.
//! - [`graph`] validates a task set and resolves dependency references into
//!   an acyclic graph.
//! - [`instance`] models runtime occurrences of tasks and their states.
//! - [`readiness`] tracks which instances have their dependencies satisfied.

pub mod graph;
pub mod instance;
pub mod readiness;
pub mod task;

pub use graph::TaskGraph;
pub use instance::{InstanceId, InstanceState, TaskInstance};
pub use readiness::ReadinessTracker;
pub use task::TaskSpec;
