// src/engine/simulation.rs

//! Discrete-event simulation loop.
//!
//! The clock jumps between decision points (periodic releases and core
//! completions) instead of ticking uniformly. At every decision point the
//! engine:
//! 1. materializes periodic instances released by now
//! 2. completes instances whose finish time has been reached
//! 3. offers eligible instances to the allocator in policy order
//!
//! A run is fully deterministic for a given graph and options.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, info, warn};

use crate::dag::{InstanceId, ReadinessTracker, TaskGraph, TaskInstance};
use crate::engine::allocator::{CoreAllocator, CorePool, DynamicAllocator, StaticAllocator};
use crate::engine::queue::{Candidate, Fcfs, PriorityAging, ReadyQueuePolicy};
use crate::engine::result::{ScheduleEntry, SimulationResult};
use crate::errors::{Result, SimError};
use crate::types::{AllocationPolicy, SchedulingPolicy, TaskKey, Tick};

/// Parameters of a single simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOptions {
    /// Number of simulated cores (at least 1).
    pub cores: usize,
    /// Periodic instances are released strictly before this time and may
    /// only start before it. Event instances are not bound by it.
    pub horizon: Tick,
    pub scheduling: SchedulingPolicy,
    pub allocation: AllocationPolicy,
    /// Priority gained per tick of waiting under PAS.
    pub aging_factor: f64,
    /// Upper bound on decision points before the run is cut short.
    pub max_iterations: u64,
}

impl SimulationOptions {
    pub const DEFAULT_MAX_ITERATIONS: u64 = 1_000_000;

    pub fn new(
        cores: usize,
        horizon: Tick,
        scheduling: SchedulingPolicy,
        allocation: AllocationPolicy,
    ) -> Self {
        Self {
            cores,
            horizon,
            scheduling,
            allocation,
            aging_factor: PriorityAging::DEFAULT_AGING_FACTOR,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_aging_factor(mut self, aging_factor: f64) -> Self {
        self.aging_factor = aging_factor;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Same options with a different policy pair.
    pub fn with_policies(mut self, scheduling: SchedulingPolicy, allocation: AllocationPolicy) -> Self {
        self.scheduling = scheduling;
        self.allocation = allocation;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.cores == 0 {
            return Err(SimError::Validation(
                "core count must be at least 1".to_string(),
            ));
        }
        if !self.aging_factor.is_finite() || self.aging_factor <= 0.0 {
            return Err(SimError::Validation(format!(
                "aging factor must be a positive number (got {})",
                self.aging_factor
            )));
        }
        if self.max_iterations == 0 {
            return Err(SimError::Validation(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Run one simulation of `graph` under the policy pair in `options`.
///
/// Fails before simulating anything if the options are invalid or a static
/// affinity names a core that does not exist.
pub fn simulate(graph: &TaskGraph, options: &SimulationOptions) -> Result<SimulationResult> {
    options.validate()?;

    match options.scheduling {
        SchedulingPolicy::Fcfs => run_with_queue(graph, options, Fcfs),
        SchedulingPolicy::Pas => {
            run_with_queue(graph, options, PriorityAging::new(options.aging_factor))
        }
    }
}

/// Like [`simulate`], with the policies given by name.
///
/// Unknown names fail with `UnknownPolicy` before any simulation starts.
pub fn simulate_named(
    graph: &TaskGraph,
    cores: usize,
    horizon: Tick,
    scheduling: &str,
    allocation: &str,
) -> Result<SimulationResult> {
    let scheduling: SchedulingPolicy = scheduling.parse()?;
    let allocation: AllocationPolicy = allocation.parse()?;
    simulate(graph, &SimulationOptions::new(cores, horizon, scheduling, allocation))
}

fn run_with_queue<Q: ReadyQueuePolicy>(
    graph: &TaskGraph,
    options: &SimulationOptions,
    queue: Q,
) -> Result<SimulationResult> {
    let result = match options.allocation {
        AllocationPolicy::Static => {
            let allocator = StaticAllocator::new(graph, options.cores)?;
            Simulation::new(graph, options, queue, allocator).run()
        }
        AllocationPolicy::Dynamic => {
            Simulation::new(graph, options, queue, DynamicAllocator).run()
        }
    };
    Ok(result)
}

/// An instance occupying a core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Running {
    finish: Tick,
    /// Dispatch sequence number; orders completions that share a finish time.
    seq: u64,
    id: InstanceId,
}

/// State of one run. Owns every instance state transition.
pub struct Simulation<'g, Q, A> {
    graph: &'g TaskGraph,
    horizon: Tick,
    max_iterations: u64,
    queue: Q,
    allocator: A,
    tracker: ReadinessTracker<'g>,
    cores: CorePool,
    now: Tick,
    /// Next iteration to release, per periodic task.
    next_iteration: BTreeMap<TaskKey, u64>,
    running: Vec<Running>,
    entries: Vec<ScheduleEntry>,
    dispatched: u64,
}

impl<'g, Q, A> Simulation<'g, Q, A>
where
    Q: ReadyQueuePolicy,
    A: CoreAllocator,
{
    pub fn new(graph: &'g TaskGraph, options: &SimulationOptions, queue: Q, allocator: A) -> Self {
        let next_iteration = graph
            .tasks()
            .filter(|t| t.is_periodic())
            .map(|t| (t.key.clone(), 0))
            .collect();

        Self {
            graph,
            horizon: options.horizon,
            max_iterations: options.max_iterations,
            queue,
            allocator,
            tracker: ReadinessTracker::new(graph),
            cores: CorePool::new(options.cores),
            now: 0,
            next_iteration,
            running: Vec::new(),
            entries: Vec::new(),
            dispatched: 0,
        }
    }

    pub fn run(mut self) -> SimulationResult {
        info!(
            scheduling = %self.queue.policy(),
            allocation = %self.allocator.policy(),
            cores = self.cores.len(),
            horizon = self.horizon,
            tasks = self.graph.len(),
            "simulation started"
        );

        for spec in self.graph.tasks().filter(|t| !t.is_periodic()) {
            self.tracker.materialize(spec, 0);
        }

        let mut iterations: u64 = 0;
        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                warn!(
                    now = self.now,
                    max_iterations = self.max_iterations,
                    "iteration limit reached; stopping simulation"
                );
                break;
            }

            self.release_due();
            self.complete_due();
            self.dispatch();

            // Zero-length instances finish at the instant they start.
            if self.running.iter().any(|r| r.finish <= self.now) {
                continue;
            }

            match self.next_event() {
                Some(t) => self.now = t,
                None => break,
            }
        }

        self.finish()
    }

    /// Materialize every periodic instance released at or before `now`.
    fn release_due(&mut self) {
        let graph = self.graph;
        for (key, next) in self.next_iteration.iter_mut() {
            let Some(spec) = graph.get(key) else {
                continue;
            };
            loop {
                let release = spec.release_of(*next);
                if release > self.now || release >= self.horizon {
                    break;
                }
                self.tracker.materialize(spec, *next);
                *next += 1;
            }
        }
    }

    /// Complete running instances whose finish time has been reached, in
    /// finish then dispatch order.
    fn complete_due(&mut self) {
        let now = self.now;
        let (mut due, still_running): (Vec<Running>, Vec<Running>) =
            std::mem::take(&mut self.running)
                .into_iter()
                .partition(|r| r.finish <= now);
        self.running = still_running;
        due.sort();

        for done in due {
            let released = self.tracker.mark_completed(done.id, done.finish);
            if let Some(instance) = self.tracker.get(done.id) {
                debug!(
                    task = %instance.key,
                    iteration = instance.iteration,
                    finish = done.finish,
                    released = released.len(),
                    "instance completed"
                );
            }
        }
    }

    /// Offer eligible instances to the allocator in policy order until no
    /// core is free.
    fn dispatch(&mut self) {
        let now = self.now;
        if !self.cores.any_free(now) {
            return;
        }

        let candidates: Vec<Candidate> = self
            .tracker
            .eligible_set(now)
            .into_iter()
            .filter(|instance| self.may_start(instance))
            .filter_map(|instance| {
                self.graph
                    .get(&instance.key)
                    .map(|spec| Candidate::new(instance, spec))
            })
            .collect();

        if candidates.is_empty() {
            return;
        }

        let by_id: HashMap<InstanceId, &Candidate> =
            candidates.iter().map(|c| (c.id, c)).collect();

        for id in self.queue.select_next(&candidates, now) {
            if !self.cores.any_free(now) {
                break;
            }
            let Some(candidate) = by_id.get(&id) else {
                continue;
            };

            match self.allocator.assign(candidate, &self.cores, now) {
                Some(core) if self.cores.is_free(core, now) => self.start(candidate, core),
                Some(core) => {
                    warn!(
                        task = %candidate.key,
                        core,
                        "allocator returned a busy core; leaving instance pending"
                    );
                }
                None => {
                    debug!(
                        task = %candidate.key,
                        iteration = candidate.iteration,
                        now,
                        "no usable core; instance stays pending"
                    );
                }
            }
        }
    }

    /// Periodic instances may only start before the horizon.
    fn may_start(&self, instance: &TaskInstance) -> bool {
        match self.graph.get(&instance.key) {
            Some(spec) if spec.is_periodic() => self.now < self.horizon,
            Some(_) => true,
            None => false,
        }
    }

    fn start(&mut self, candidate: &Candidate, core: usize) {
        let execution_time = self
            .graph
            .get(&candidate.key)
            .map(|spec| spec.execution_time)
            .unwrap_or(0);
        let start = self.now;
        let finish = start.saturating_add(execution_time);

        self.cores.occupy(core, finish);
        self.tracker.mark_running(candidate.id, start, core);
        self.running.push(Running {
            finish,
            seq: self.dispatched,
            id: candidate.id,
        });
        self.dispatched += 1;

        debug!(
            task = %candidate.key,
            iteration = candidate.iteration,
            core,
            eligible_time = candidate.eligible_time,
            start,
            finish,
            "instance dispatched"
        );

        self.entries.push(ScheduleEntry {
            task: candidate.key.clone(),
            iteration: candidate.iteration,
            eligible_time: candidate.eligible_time,
            start,
            finish,
            core,
        });
    }

    /// Earliest future release or core completion.
    fn next_event(&self) -> Option<Tick> {
        let next_release = self
            .next_iteration
            .iter()
            .filter_map(|(key, next)| {
                let release = self.graph.get(key)?.release_of(*next);
                (release < self.horizon).then_some(release)
            })
            .min();
        let next_finish = self.running.iter().map(|r| r.finish).min();

        match (next_release, next_finish) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn finish(mut self) -> SimulationResult {
        // Only non-empty when the iteration limit cut the run short.
        let mut leftover = std::mem::take(&mut self.running);
        leftover.sort();
        for running in leftover {
            self.tracker.mark_completed(running.id, running.finish);
        }

        let mut non_executed: BTreeSet<TaskKey> = BTreeSet::new();
        for id in self.tracker.expire_unstarted() {
            if let Some(instance) = self.tracker.get(id) {
                warn!(
                    task = %instance.key,
                    iteration = instance.iteration,
                    release = instance.release,
                    unsatisfied = self.tracker.unsatisfied(id),
                    "instance not executed"
                );
                non_executed.insert(instance.key.clone());
            }
        }

        let all_tasks: BTreeSet<TaskKey> = self.graph.keys().map(str::to_string).collect();

        let result = SimulationResult::new(
            self.queue.policy(),
            self.allocator.policy(),
            self.cores.len(),
            self.entries,
            non_executed,
            all_tasks,
        );

        info!(
            scheduling = %result.scheduling_policy,
            allocation = %result.allocation_policy,
            finish_time = result.finish_time,
            extra_wait = result.extra_wait,
            executed = result.entries.len(),
            not_executed = result.non_executed.len(),
            "simulation finished"
        );

        result
    }
}
