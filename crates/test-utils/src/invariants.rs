//! Structural checks every simulation result must satisfy.

use std::collections::{BTreeMap, HashSet};

use schedsim::dag::TaskGraph;
use schedsim::engine::{ScheduleEntry, SimulationOptions, SimulationResult};
use schedsim::types::AllocationPolicy;

/// Check `result` against the graph and options it was produced from.
///
/// Returns a description of the first violation found.
pub fn check_schedule(
    graph: &TaskGraph,
    options: &SimulationOptions,
    result: &SimulationResult,
) -> Result<(), String> {
    let mut seen = HashSet::new();
    let mut by_instance: BTreeMap<(&str, u64), &ScheduleEntry> = BTreeMap::new();

    for e in &result.entries {
        let spec = graph
            .get(&e.task)
            .ok_or_else(|| format!("entry for unknown task '{}'", e.task))?;

        if !seen.insert((e.task.as_str(), e.iteration)) {
            return Err(format!("{}#{} executed twice", e.task, e.iteration));
        }
        if e.finish != e.start + spec.execution_time {
            return Err(format!("{}#{} has the wrong duration", e.task, e.iteration));
        }
        if e.start < e.eligible_time {
            return Err(format!("{}#{} started before it was eligible", e.task, e.iteration));
        }
        if e.eligible_time < spec.release_of(e.iteration) {
            return Err(format!("{}#{} eligible before its release", e.task, e.iteration));
        }
        if e.core >= options.cores {
            return Err(format!("{}#{} ran on missing core {}", e.task, e.iteration, e.core));
        }
        if spec.is_periodic() && e.start >= options.horizon {
            return Err(format!("{}#{} started past the horizon", e.task, e.iteration));
        }
        by_instance.insert((e.task.as_str(), e.iteration), e);
    }

    for e in &result.entries {
        let Some(spec) = graph.get(&e.task) else {
            continue;
        };
        let release = spec.release_of(e.iteration);
        for dep in graph.dependencies_of(&e.task) {
            let Some(dep_spec) = graph.get(dep) else {
                return Err(format!("task '{}' depends on missing '{dep}'", e.task));
            };
            let bound = dep_spec.iteration_at(release);
            let dep_entry = by_instance.get(&(dep.as_str(), bound)).ok_or_else(|| {
                format!("{}#{} ran without {dep}#{bound}", e.task, e.iteration)
            })?;
            if dep_entry.finish > e.start {
                return Err(format!(
                    "{}#{} started at {} before {dep}#{bound} finished at {}",
                    e.task, e.iteration, e.start, dep_entry.finish
                ));
            }
        }
    }

    for core in 0..options.cores {
        let mut spans: Vec<_> = result.entries_on(core).map(|e| (e.start, e.finish)).collect();
        spans.sort();
        for pair in spans.windows(2) {
            if pair[1].0 < pair[0].1 {
                return Err(format!(
                    "core {core}: [{}, {}) overlaps [{}, {})",
                    pair[0].0, pair[0].1, pair[1].0, pair[1].1
                ));
            }
        }
    }

    if options.allocation == AllocationPolicy::Static {
        let mut pinned: BTreeMap<&str, usize> = BTreeMap::new();
        for e in &result.entries {
            let core = *pinned.entry(e.task.as_str()).or_insert(e.core);
            if core != e.core {
                return Err(format!("task '{}' moved between cores under static", e.task));
            }
        }
    }

    let finish = result.entries.iter().map(|e| e.finish).max().unwrap_or(0);
    if result.finish_time != finish {
        return Err(format!("finish time {} != {finish}", result.finish_time));
    }
    let wait: u64 = result.entries.iter().map(ScheduleEntry::wait).sum();
    if result.extra_wait != wait {
        return Err(format!("extra wait {} != {wait}", result.extra_wait));
    }
    if !result.non_executed.is_subset(&result.all_tasks) {
        return Err("non-executed tasks not a subset of all tasks".to_string());
    }

    Ok(())
}

/// Panicking form of [`check_schedule`].
pub fn assert_schedule(graph: &TaskGraph, options: &SimulationOptions, result: &SimulationResult) {
    if let Err(msg) = check_schedule(graph, options, result) {
        panic!("schedule invariant violated: {msg}");
    }
}
