// src/engine/result.rs

//! Output records of a simulation run.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::types::{AllocationPolicy, SchedulingPolicy, TaskKey, Tick};

/// One executed instance. Produced exactly once per completed instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub task: TaskKey,
    #[serde(rename = "instance")]
    pub iteration: u64,
    pub eligible_time: Tick,
    pub start: Tick,
    #[serde(rename = "end")]
    pub finish: Tick,
    pub core: usize,
}

impl ScheduleEntry {
    /// Time the instance spent eligible before it started.
    pub fn wait(&self) -> Tick {
        self.start.saturating_sub(self.eligible_time)
    }

    pub fn duration(&self) -> Tick {
        self.finish.saturating_sub(self.start)
    }
}

/// Aggregate outcome of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub scheduling_policy: SchedulingPolicy,
    pub allocation_policy: AllocationPolicy,
    /// Number of simulated cores.
    pub cores: usize,
    /// Entries in dispatch order.
    #[serde(rename = "executionLog")]
    pub entries: Vec<ScheduleEntry>,
    /// Latest finish time over all entries, `0` when nothing ran.
    #[serde(rename = "totalExecutionTime")]
    pub finish_time: Tick,
    /// Sum of `start - eligible_time` over all entries.
    pub extra_wait: Tick,
    /// Keys of tasks with at least one instance that never ran.
    #[serde(rename = "nonExecutedTasks")]
    pub non_executed: BTreeSet<TaskKey>,
    pub all_tasks: BTreeSet<TaskKey>,
}

impl SimulationResult {
    pub fn new(
        scheduling_policy: SchedulingPolicy,
        allocation_policy: AllocationPolicy,
        cores: usize,
        entries: Vec<ScheduleEntry>,
        non_executed: BTreeSet<TaskKey>,
        all_tasks: BTreeSet<TaskKey>,
    ) -> Self {
        let finish_time = entries.iter().map(|e| e.finish).max().unwrap_or(0);
        let extra_wait = entries.iter().map(ScheduleEntry::wait).sum();

        Self {
            scheduling_policy,
            allocation_policy,
            cores,
            entries,
            finish_time,
            extra_wait,
            non_executed,
            all_tasks,
        }
    }

    /// Entries of one task, in dispatch order.
    pub fn entries_for<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a ScheduleEntry> + 'a {
        self.entries.iter().filter(move |e| e.task == key)
    }

    /// Entries executed on one core, in dispatch order.
    pub fn entries_on(&self, core: usize) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries.iter().filter(move |e| e.core == core)
    }
}
