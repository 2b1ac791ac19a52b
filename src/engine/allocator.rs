// src/engine/allocator.rs

use std::collections::BTreeMap;

use tracing::debug;

use crate::dag::TaskGraph;
use crate::engine::queue::Candidate;
use crate::errors::{Result, SimError};
use crate::types::{AllocationPolicy, TaskKey, Tick};

/// Simulated cores: the time at which each one becomes free.
#[derive(Debug, Clone)]
pub struct CorePool {
    next_free: Vec<Tick>,
}

impl CorePool {
    pub fn new(cores: usize) -> Self {
        Self {
            next_free: vec![0; cores],
        }
    }

    pub fn len(&self) -> usize {
        self.next_free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.next_free.is_empty()
    }

    pub fn next_free(&self, core: usize) -> Option<Tick> {
        self.next_free.get(core).copied()
    }

    pub fn is_free(&self, core: usize, now: Tick) -> bool {
        self.next_free.get(core).is_some_and(|&t| t <= now)
    }

    /// Indices of cores whose occupant has finished by `now`.
    pub fn free_cores(&self, now: Tick) -> Vec<usize> {
        self.next_free
            .iter()
            .enumerate()
            .filter(|&(_, &t)| t <= now)
            .map(|(core, _)| core)
            .collect()
    }

    pub fn any_free(&self, now: Tick) -> bool {
        self.next_free.iter().any(|&t| t <= now)
    }

    /// Mark `core` busy until `until`.
    pub fn occupy(&mut self, core: usize, until: Tick) {
        if let Some(slot) = self.next_free.get_mut(core) {
            *slot = until;
        }
    }
}

/// Strategy choosing the core that runs a dispatch-ready instance.
///
/// Returning `None` leaves the instance pending for a later decision point.
pub trait CoreAllocator {
    fn policy(&self) -> AllocationPolicy;

    fn assign(&mut self, candidate: &Candidate, cores: &CorePool, now: Tick) -> Option<usize>;
}

/// Affinity pinning: every task key owns one core for the whole run.
///
/// Tasks with a declared `affinity` use it; the others are dealt round-robin
/// over the cores in key order. An instance whose core is busy waits instead
/// of migrating.
#[derive(Debug, Clone)]
pub struct StaticAllocator {
    pinned: BTreeMap<TaskKey, usize>,
}

impl StaticAllocator {
    pub fn new(graph: &TaskGraph, cores: usize) -> Result<Self> {
        if cores == 0 {
            return Err(SimError::Validation(
                "core count must be at least 1".to_string(),
            ));
        }

        let mut pinned = BTreeMap::new();
        let mut next_rr = 0usize;

        for spec in graph.tasks() {
            let core = match spec.affinity {
                Some(core) if core < cores => core,
                Some(core) => {
                    return Err(SimError::Validation(format!(
                        "task '{}' has affinity {} but only {} core(s) are simulated",
                        spec.key, core, cores
                    )));
                }
                None => {
                    let core = next_rr % cores;
                    next_rr += 1;
                    core
                }
            };
            debug!(task = %spec.key, core, "static core assignment");
            pinned.insert(spec.key.clone(), core);
        }

        Ok(Self { pinned })
    }

    /// Core assigned to `key`, if the task is known.
    pub fn core_of(&self, key: &str) -> Option<usize> {
        self.pinned.get(key).copied()
    }
}

impl CoreAllocator for StaticAllocator {
    fn policy(&self) -> AllocationPolicy {
        AllocationPolicy::Static
    }

    fn assign(&mut self, candidate: &Candidate, cores: &CorePool, now: Tick) -> Option<usize> {
        let core = self.core_of(&candidate.key)?;
        cores.is_free(core, now).then_some(core)
    }
}

/// Least-loaded selection: the free core that has been free the longest,
/// lowest index on ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicAllocator;

impl CoreAllocator for DynamicAllocator {
    fn policy(&self) -> AllocationPolicy {
        AllocationPolicy::Dynamic
    }

    fn assign(&mut self, _candidate: &Candidate, cores: &CorePool, now: Tick) -> Option<usize> {
        cores
            .free_cores(now)
            .into_iter()
            .min_by_key(|&core| (cores.next_free(core).unwrap_or(0), core))
    }
}
