// src/dag/task.rs

//! Task definitions as consumed by the graph builder.

use crate::types::{TaskKey, TaskKind, Tick};

/// Immutable description of one task template.
///
/// Before [`TaskGraph::build`](crate::dag::TaskGraph::build) the `deps`
/// hold raw references (external IDs or keys); inside a built graph they are
/// resolved, de-duplicated task keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub key: TaskKey,
    /// Foreign identifier other tasks may use to reference this one.
    pub external_id: Option<String>,
    pub kind: TaskKind,
    pub execution_time: Tick,
    /// Release period; `0` for event tasks.
    pub period: Tick,
    pub deps: Vec<String>,
    /// Higher is more urgent.
    pub priority: i64,
    /// Core this task is pinned to under static allocation, if declared.
    pub affinity: Option<usize>,
}

impl TaskSpec {
    /// A one-shot task released at time 0.
    pub fn event(key: impl Into<TaskKey>, execution_time: Tick) -> Self {
        Self {
            key: key.into(),
            external_id: None,
            kind: TaskKind::Event,
            execution_time,
            period: 0,
            deps: Vec::new(),
            priority: 0,
            affinity: None,
        }
    }

    /// A task released at 0, `period`, `2 * period`, ...
    pub fn periodic(key: impl Into<TaskKey>, period: Tick, execution_time: Tick) -> Self {
        Self {
            kind: TaskKind::Periodic,
            period,
            ..Self::event(key, execution_time)
        }
    }

    pub fn with_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_external_id(mut self, id: impl Into<String>) -> Self {
        self.external_id = Some(id.into());
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_affinity(mut self, core: usize) -> Self {
        self.affinity = Some(core);
        self
    }

    pub fn is_periodic(&self) -> bool {
        self.kind == TaskKind::Periodic
    }

    /// Iteration of this task whose release is the latest at or before `at`.
    ///
    /// Event tasks only ever have iteration 0.
    pub fn iteration_at(&self, at: Tick) -> u64 {
        if self.is_periodic() && self.period > 0 {
            at / self.period
        } else {
            0
        }
    }

    /// Release time of the given iteration.
    pub fn release_of(&self, iteration: u64) -> Tick {
        if self.is_periodic() {
            iteration.saturating_mul(self.period)
        } else {
            0
        }
    }
}
