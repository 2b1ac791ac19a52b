#![allow(dead_code)]

use schedsim::config::{LooseValue, RawTask, RawWorkload, Workload};
use schedsim::dag::{TaskGraph, TaskSpec};
use schedsim::errors::Result;

/// Build a graph that the test expects to be valid.
pub fn graph(specs: impl IntoIterator<Item = TaskSpec>) -> TaskGraph {
    TaskGraph::build(specs).expect("Failed to build task graph from specs")
}

/// Builder for `RawWorkload` to simplify config-level test setup.
pub struct WorkloadBuilder {
    raw: RawWorkload,
}

impl WorkloadBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawWorkload::default(),
        }
    }

    pub fn cores(mut self, cores: i64) -> Self {
        self.raw.config.cores = Some(LooseValue::Int(cores));
        self
    }

    pub fn horizon(mut self, horizon: i64) -> Self {
        self.raw.config.horizon = Some(LooseValue::Int(horizon));
        self
    }

    pub fn scheduling(mut self, policy: &str) -> Self {
        self.raw.config.scheduling_policy = Some(policy.to_string());
        self
    }

    pub fn allocation(mut self, policy: &str) -> Self {
        self.raw.config.allocation_policy = Some(policy.to_string());
        self
    }

    pub fn with_task(mut self, key: &str, task: RawTask) -> Self {
        self.raw.task.insert(key.to_string(), task);
        self
    }

    pub fn raw(self) -> RawWorkload {
        self.raw
    }

    pub fn try_build(self) -> Result<Workload> {
        Workload::try_from(self.raw)
    }

    pub fn build(self) -> Workload {
        self.try_build()
            .expect("Failed to build valid workload from builder")
    }
}

impl Default for WorkloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RawTask`.
pub struct RawTaskBuilder {
    task: RawTask,
}

impl RawTaskBuilder {
    pub fn event(execution_time: i64) -> Self {
        Self {
            task: RawTask {
                kind: Some("event".to_string()),
                execution_time: Some(LooseValue::Int(execution_time)),
                ..RawTask::default()
            },
        }
    }

    pub fn periodic(period: i64, execution_time: i64) -> Self {
        let mut builder = Self::event(execution_time);
        builder.task.kind = Some("periodic".to_string());
        builder.task.period = Some(LooseValue::Int(period));
        builder
    }

    pub fn id(mut self, id: &str) -> Self {
        self.task.id = Some(LooseValue::Text(id.to_string()));
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.deps.push(LooseValue::Text(dep.to_string()));
        self
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.task.priority = Some(LooseValue::Int(priority));
        self
    }

    pub fn affinity(mut self, core: i64) -> Self {
        self.task.affinity = Some(LooseValue::Int(core));
        self
    }

    pub fn build(self) -> RawTask {
        self.task
    }
}
