// src/dag/readiness.rs

//! Dependency readiness tracking for task instances.
//!
//! Every instance starts with the number of dependency instances it waits
//! for. Completing an instance decrements the count of each waiter; an
//! instance whose count reaches zero becomes `Eligible`.
//!
//! Binding rule: an instance released at `r` waits, for each dependency task
//! `S`, on the iteration of `S` released most recently at or before `r`
//! (`r / period(S)` for periodic `S`, `0` for event `S`). With equal periods
//! this is same-iteration matching.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::dag::graph::TaskGraph;
use crate::dag::instance::{InstanceId, InstanceState, TaskInstance};
use crate::dag::task::TaskSpec;
use crate::types::{TaskKey, Tick};

/// `(task key, iteration)`: identifies an instance before it exists.
type Slot = (TaskKey, u64);

pub struct ReadinessTracker<'g> {
    graph: &'g TaskGraph,
    instances: Vec<TaskInstance>,
    /// Unsatisfied dependency count per instance, indexed by `InstanceId`.
    pending: Vec<usize>,
    /// Finish time of every completed slot.
    completed: HashMap<Slot, Tick>,
    /// Instances waiting on a slot that has not completed yet.
    waiters: HashMap<Slot, Vec<InstanceId>>,
    /// Instances currently `Eligible`, in materialization order.
    eligible: BTreeSet<InstanceId>,
}

impl<'g> ReadinessTracker<'g> {
    pub fn new(graph: &'g TaskGraph) -> Self {
        Self {
            graph,
            instances: Vec::new(),
            pending: Vec::new(),
            completed: HashMap::new(),
            waiters: HashMap::new(),
            eligible: BTreeSet::new(),
        }
    }

    /// Create the instance for `iteration` of `spec` and bind its
    /// dependencies.
    ///
    /// The instance is `Eligible` straight away when every bound dependency
    /// instance has already completed, and `Blocked` otherwise. Dependency
    /// instances that do not exist yet are waited on all the same; if they
    /// are never created the instance stays `Blocked`.
    pub fn materialize(&mut self, spec: &TaskSpec, iteration: u64) -> InstanceId {
        let id = InstanceId(self.instances.len());
        let release = spec.release_of(iteration);
        let mut instance = TaskInstance::new(id, spec.key.clone(), iteration, release);

        let mut unsatisfied = 0;
        let mut ready_at = release;

        for dep_key in spec.deps.iter() {
            let Some(dep) = self.graph.get(dep_key) else {
                warn!(task = %spec.key, dep = %dep_key, "dependency missing from task graph");
                continue;
            };
            let slot: Slot = (dep_key.clone(), dep.iteration_at(release));

            match self.completed.get(&slot) {
                Some(&finish) => ready_at = ready_at.max(finish),
                None => {
                    unsatisfied += 1;
                    self.waiters.entry(slot).or_default().push(id);
                }
            }
        }

        if unsatisfied == 0 {
            instance.state = InstanceState::Eligible;
            instance.eligible_time = Some(ready_at);
            self.eligible.insert(id);
        }

        debug!(
            task = %instance.key,
            iteration,
            release,
            unsatisfied,
            "instance materialized"
        );

        self.instances.push(instance);
        self.pending.push(unsatisfied);
        id
    }

    /// Record that `id` finished at `at` and release its waiters.
    ///
    /// Returns the instances that became `Eligible`, in materialization
    /// order. Their eligible time is `max(at, release)`.
    pub fn mark_completed(&mut self, id: InstanceId, at: Tick) -> Vec<InstanceId> {
        let Some(instance) = self.instances.get_mut(id.0) else {
            warn!(instance = id.0, "completion for unknown instance; ignoring");
            return Vec::new();
        };

        if instance.state != InstanceState::Running {
            warn!(
                task = %instance.key,
                state = ?instance.state,
                "completion for instance that is not running; ignoring"
            );
            return Vec::new();
        }

        instance.state = InstanceState::Completed;
        instance.finish = Some(at);

        let slot: Slot = (instance.key.clone(), instance.iteration);
        self.completed.insert(slot.clone(), at);

        let mut newly_eligible = Vec::new();
        let Some(mut waiting) = self.waiters.remove(&slot) else {
            return newly_eligible;
        };
        waiting.sort();

        for waiter in waiting {
            let count = &mut self.pending[waiter.0];
            *count = count.saturating_sub(1);
            if *count > 0 {
                continue;
            }

            let dependent = &mut self.instances[waiter.0];
            if dependent.state == InstanceState::Blocked {
                dependent.state = InstanceState::Eligible;
                dependent.eligible_time = Some(at.max(dependent.release));
                self.eligible.insert(waiter);
                debug!(
                    task = %dependent.key,
                    iteration = dependent.iteration,
                    eligible_time = at.max(dependent.release),
                    "dependencies satisfied; instance eligible"
                );
                newly_eligible.push(waiter);
            }
        }

        newly_eligible
    }

    /// Mark an eligible instance as running on `core` from `start`.
    pub fn mark_running(&mut self, id: InstanceId, start: Tick, core: usize) {
        if let Some(instance) = self.instances.get_mut(id.0) {
            self.eligible.remove(&id);
            instance.state = InstanceState::Running;
            instance.start = Some(start);
            instance.core = Some(core);
        }
    }

    /// Instances that are `Eligible` (and so not yet running) with an
    /// eligible time at or before `at`.
    ///
    /// Walks only the eligible index, not every instance ever created.
    pub fn eligible_set(&self, at: Tick) -> Vec<&TaskInstance> {
        self.eligible
            .iter()
            .filter_map(|id| self.instances.get(id.0))
            .filter(|i| i.eligible_time.is_some_and(|t| t <= at))
            .collect()
    }

    /// Whether any instance is still `Blocked` or `Eligible`.
    pub fn has_unstarted(&self) -> bool {
        self.instances
            .iter()
            .any(|i| matches!(i.state, InstanceState::Blocked | InstanceState::Eligible))
    }

    /// Move every `Blocked` or `Eligible` instance to `NotExecuted`.
    ///
    /// Returns the affected instances in materialization order.
    pub fn expire_unstarted(&mut self) -> Vec<InstanceId> {
        let mut expired = Vec::new();
        for instance in self.instances.iter_mut() {
            if matches!(
                instance.state,
                InstanceState::Blocked | InstanceState::Eligible
            ) {
                instance.state = InstanceState::NotExecuted;
                expired.push(instance.id);
            }
        }
        self.eligible.clear();
        expired
    }

    pub fn get(&self, id: InstanceId) -> Option<&TaskInstance> {
        self.instances.get(id.0)
    }

    /// All instances in materialization order.
    pub fn instances(&self) -> &[TaskInstance] {
        &self.instances
    }

    /// Remaining unsatisfied dependency count of an instance.
    pub fn unsatisfied(&self, id: InstanceId) -> usize {
        self.pending.get(id.0).copied().unwrap_or(0)
    }
}
