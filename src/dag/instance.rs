// src/dag/instance.rs

//! Runtime occurrences of task definitions.

use crate::types::{TaskKey, Tick};

/// Index of an instance inside the readiness tracker's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub usize);

/// Lifecycle of a task instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// At least one bound dependency instance has not completed.
    Blocked,
    /// All dependencies satisfied; waiting for a core.
    Eligible,
    /// Dispatched on a core.
    Running,
    Completed,
    /// Never ran before the simulation ended.
    NotExecuted,
}

impl InstanceState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, InstanceState::Completed | InstanceState::NotExecuted)
    }
}

/// One occurrence of a task: iteration `n` of a periodic task, or the single
/// run of an event task.
#[derive(Debug, Clone)]
pub struct TaskInstance {
    pub id: InstanceId,
    pub key: TaskKey,
    pub iteration: u64,
    pub release: Tick,
    pub state: InstanceState,
    pub eligible_time: Option<Tick>,
    pub start: Option<Tick>,
    pub finish: Option<Tick>,
    pub core: Option<usize>,
}

impl TaskInstance {
    pub(crate) fn new(id: InstanceId, key: TaskKey, iteration: u64, release: Tick) -> Self {
        Self {
            id,
            key,
            iteration,
            release,
            state: InstanceState::Blocked,
            eligible_time: None,
            start: None,
            finish: None,
            core: None,
        }
    }
}
