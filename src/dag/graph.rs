// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::dag::task::TaskSpec;
use crate::errors::{Result, SimError};
use crate::types::TaskKey;

/// Validated dependency graph keyed by task key.
///
/// Every dependency is a resolved key of a task in the graph and the
/// relation is acyclic. Cloning is cheap enough to give each simulation run
/// its own copy, but runs normally share one behind an `Arc`.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    tasks: BTreeMap<TaskKey, TaskSpec>,
    dependents: BTreeMap<TaskKey, Vec<TaskKey>>,
    topo_order: Vec<TaskKey>,
}

impl TaskGraph {
    /// Validate a task set and resolve its dependency references.
    ///
    /// A reference naming a declared `external_id` resolves to the task that
    /// owns it; any other reference is taken as a task key.
    ///
    /// Fails with:
    /// - `Validation` for an empty set, duplicate keys or external IDs, and
    ///   periodic tasks without a positive period
    /// - `UnknownDependency` when a reference resolves to no task
    /// - `CyclicDependency` for self references and cycles
    pub fn build(specs: impl IntoIterator<Item = TaskSpec>) -> Result<Self> {
        let mut tasks: BTreeMap<TaskKey, TaskSpec> = BTreeMap::new();

        for spec in specs {
            if spec.is_periodic() && spec.period == 0 {
                return Err(SimError::Validation(format!(
                    "periodic task '{}' must have a positive period",
                    spec.key
                )));
            }
            if let Some(dup) = tasks.insert(spec.key.clone(), spec) {
                return Err(SimError::Validation(format!(
                    "duplicate task key '{}'",
                    dup.key
                )));
            }
        }

        if tasks.is_empty() {
            return Err(SimError::Validation(
                "workload must contain at least one task".to_string(),
            ));
        }

        let ids = build_id_index(&tasks)?;

        // Resolve references against the id index first, then as raw keys.
        let mut resolved: BTreeMap<TaskKey, Vec<TaskKey>> = BTreeMap::new();
        for (key, spec) in tasks.iter() {
            let mut seen = BTreeSet::new();
            let mut deps = Vec::with_capacity(spec.deps.len());

            for reference in spec.deps.iter() {
                let target = ids.get(reference).unwrap_or(reference);
                if !tasks.contains_key(target) {
                    return Err(SimError::UnknownDependency {
                        task: key.clone(),
                        reference: reference.clone(),
                    });
                }
                if target == key {
                    return Err(SimError::CyclicDependency(format!(
                        "task '{}' depends on itself",
                        key
                    )));
                }
                if seen.insert(target.clone()) {
                    deps.push(target.clone());
                }
            }

            resolved.insert(key.clone(), deps);
        }

        let topo_order = topological_order(&tasks, &resolved)?;

        let mut dependents: BTreeMap<TaskKey, Vec<TaskKey>> =
            tasks.keys().map(|k| (k.clone(), Vec::new())).collect();
        for (key, deps) in resolved.iter() {
            for dep in deps {
                if let Some(list) = dependents.get_mut(dep) {
                    list.push(key.clone());
                }
            }
        }

        for (key, deps) in resolved {
            if let Some(spec) = tasks.get_mut(&key) {
                spec.deps = deps;
            }
        }

        debug!(
            tasks = tasks.len(),
            order = ?topo_order,
            "task graph built"
        );

        Ok(Self {
            tasks,
            dependents,
            topo_order,
        })
    }

    /// Number of tasks in the graph.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// All task keys in lexical order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }

    /// All task specs in key order.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskSpec> {
        self.tasks.values()
    }

    pub fn get(&self, key: &str) -> Option<&TaskSpec> {
        self.tasks.get(key)
    }

    /// Resolved direct dependencies of a task.
    pub fn dependencies_of(&self, key: &str) -> &[TaskKey] {
        self.tasks
            .get(key)
            .map(|t| t.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Tasks that list `key` as a direct dependency.
    pub fn dependents_of(&self, key: &str) -> &[TaskKey] {
        self.dependents
            .get(key)
            .map(|d| d.as_slice())
            .unwrap_or(&[])
    }

    /// Keys ordered so every task comes after all of its dependencies.
    pub fn topological_order(&self) -> &[TaskKey] {
        &self.topo_order
    }
}

/// Map every declared external ID to the key that owns it.
fn build_id_index(tasks: &BTreeMap<TaskKey, TaskSpec>) -> Result<BTreeMap<String, TaskKey>> {
    let mut ids: BTreeMap<String, TaskKey> = BTreeMap::new();

    for (key, spec) in tasks.iter() {
        let Some(id) = spec.external_id.as_ref() else {
            continue;
        };
        if let Some(owner) = ids.insert(id.clone(), key.clone()) {
            return Err(SimError::Validation(format!(
                "external id '{}' is declared by both '{}' and '{}'",
                id, owner, key
            )));
        }
    }

    Ok(ids)
}

fn topological_order(
    tasks: &BTreeMap<TaskKey, TaskSpec>,
    resolved: &BTreeMap<TaskKey, Vec<TaskKey>>,
) -> Result<Vec<TaskKey>> {
    // Edge direction: dep -> task.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for key in tasks.keys() {
        graph.add_node(key.as_str());
    }

    for (key, deps) in resolved.iter() {
        for dep in deps {
            graph.add_edge(dep.as_str(), key.as_str(), ());
        }
    }

    // Depth-first topological sort; fails on the first back edge.
    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        Err(cycle) => Err(SimError::CyclicDependency(format!(
            "cycle detected in task graph involving task '{}'",
            cycle.node_id()
        ))),
    }
}
