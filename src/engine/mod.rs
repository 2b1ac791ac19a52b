// src/engine/mod.rs

//! Scheduling engine.
//!
//! - [`queue`] holds the ready-queue policies (FCFS, priority with aging).
//! - [`allocator`] holds the simulated cores and the allocation policies
//!   (static pinning, dynamic least-loaded).
//! - [`simulation`] is the discrete-event loop tying them together.
//! - [`result`] defines the schedule entries and run metrics it produces.

pub mod allocator;
pub mod queue;
pub mod result;
pub mod simulation;

pub use allocator::{CoreAllocator, CorePool, DynamicAllocator, StaticAllocator};
pub use queue::{Candidate, Fcfs, PriorityAging, ReadyQueuePolicy};
pub use result::{ScheduleEntry, SimulationResult};
pub use simulation::{simulate, simulate_named, Simulation, SimulationOptions};
