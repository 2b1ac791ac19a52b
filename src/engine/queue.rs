// src/engine/queue.rs

use std::cmp::Ordering;

use crate::dag::{InstanceId, TaskInstance, TaskSpec};
use crate::types::{SchedulingPolicy, TaskKey, Tick};

/// Snapshot of an eligible, not yet dispatched instance as seen by a
/// ready-queue policy.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: InstanceId,
    pub key: TaskKey,
    pub iteration: u64,
    pub eligible_time: Tick,
    pub priority: i64,
}

impl Candidate {
    /// Build a candidate from an eligible instance and its task spec.
    ///
    /// Instances without a recorded eligible time fall back to their release.
    pub fn new(instance: &TaskInstance, spec: &TaskSpec) -> Self {
        Self {
            id: instance.id,
            key: instance.key.clone(),
            iteration: instance.iteration,
            eligible_time: instance.eligible_time.unwrap_or(instance.release),
            priority: spec.priority,
        }
    }

    /// Time spent eligible but undispatched as of `now`.
    pub fn waited(&self, now: Tick) -> Tick {
        now.saturating_sub(self.eligible_time)
    }

    fn arrival_cmp(&self, other: &Self) -> Ordering {
        self.eligible_time
            .cmp(&other.eligible_time)
            .then_with(|| self.key.cmp(&other.key))
            .then_with(|| self.iteration.cmp(&other.iteration))
    }
}

/// Strategy deciding the order in which eligible instances are offered to
/// the core allocator.
///
/// The returned list ranks *every* candidate; the engine walks it until no
/// free core is left, skipping candidates the allocator cannot place.
pub trait ReadyQueuePolicy {
    fn policy(&self) -> SchedulingPolicy;

    fn select_next(&self, eligible: &[Candidate], now: Tick) -> Vec<InstanceId>;
}

/// First come, first served: ascending eligible time, then task key, then
/// iteration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fcfs;

impl ReadyQueuePolicy for Fcfs {
    fn policy(&self) -> SchedulingPolicy {
        SchedulingPolicy::Fcfs
    }

    fn select_next(&self, eligible: &[Candidate], _now: Tick) -> Vec<InstanceId> {
        let mut ranked: Vec<&Candidate> = eligible.iter().collect();
        ranked.sort_by(|a, b| a.arrival_cmp(b));
        ranked.into_iter().map(|c| c.id).collect()
    }
}

/// Priority with aging.
///
/// Effective priority is `priority + aging_factor * waited`, highest first.
/// Ties fall back to FCFS order. A candidate that has waited longer than
/// `(high - low) / aging_factor` ticks outranks a fresh candidate of
/// priority `high`.
#[derive(Debug, Clone, Copy)]
pub struct PriorityAging {
    aging_factor: f64,
}

impl PriorityAging {
    pub const DEFAULT_AGING_FACTOR: f64 = 0.1;

    pub fn new(aging_factor: f64) -> Self {
        Self { aging_factor }
    }

    pub fn aging_factor(&self) -> f64 {
        self.aging_factor
    }

    pub fn effective_priority(&self, candidate: &Candidate, now: Tick) -> f64 {
        candidate.priority as f64 + self.aging_factor * candidate.waited(now) as f64
    }
}

impl Default for PriorityAging {
    fn default() -> Self {
        Self::new(Self::DEFAULT_AGING_FACTOR)
    }
}

impl ReadyQueuePolicy for PriorityAging {
    fn policy(&self) -> SchedulingPolicy {
        SchedulingPolicy::Pas
    }

    fn select_next(&self, eligible: &[Candidate], now: Tick) -> Vec<InstanceId> {
        let mut ranked: Vec<(f64, &Candidate)> = eligible
            .iter()
            .map(|c| (self.effective_priority(c, now), c))
            .collect();

        ranked.sort_by(|(pa, a), (pb, b)| pb.total_cmp(pa).then_with(|| a.arrival_cmp(b)));
        ranked.into_iter().map(|(_, c)| c.id).collect()
    }
}
