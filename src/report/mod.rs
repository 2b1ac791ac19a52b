// src/report/mod.rs

//! Result aggregation across policy combinations.
//!
//! A request names one scheduling policy and one allocation policy, or
//! "all" for either. Each resulting pair is an independent simulation over a
//! shared, immutable task graph, so pairs run in parallel on the tokio
//! blocking pool. Results are keyed by policy, which keeps the output order
//! independent of which run finished first.

pub mod kpi;
pub mod response;

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::dag::TaskGraph;
use crate::engine::{simulate, SimulationOptions, SimulationResult};
use crate::errors::{Result, SimError};
use crate::types::{AllocationPolicy, PolicyChoice, SchedulingPolicy};

pub use kpi::{CoreKpi, KpiSummary};
pub use response::{ErrorResponse, Response, RunReport};

/// Which policy combinations a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicySelection {
    pub scheduling: PolicyChoice<SchedulingPolicy>,
    pub allocation: PolicyChoice<AllocationPolicy>,
}

impl PolicySelection {
    pub fn single(scheduling: SchedulingPolicy, allocation: AllocationPolicy) -> Self {
        Self {
            scheduling: PolicyChoice::Only(scheduling),
            allocation: PolicyChoice::Only(allocation),
        }
    }

    /// The full scheduling x allocation cross product.
    pub fn all() -> Self {
        Self {
            scheduling: PolicyChoice::All,
            allocation: PolicyChoice::All,
        }
    }

    /// `true` when exactly one policy pair is selected.
    pub fn is_single(&self) -> bool {
        !self.scheduling.is_all() && !self.allocation.is_all()
    }

    /// Concrete pairs to simulate, scheduling-major.
    pub fn pairs(&self) -> Vec<(SchedulingPolicy, AllocationPolicy)> {
        let allocations = self.allocation.expand(&AllocationPolicy::ALL);
        self.scheduling
            .expand(&SchedulingPolicy::ALL)
            .into_iter()
            .flat_map(|s| allocations.iter().map(move |&a| (s, a)))
            .collect()
    }
}

pub type ResultMatrix = BTreeMap<SchedulingPolicy, BTreeMap<AllocationPolicy, SimulationResult>>;

/// Results of one request: a single run, or a map keyed by scheduling then
/// allocation policy.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultSet {
    Single(SimulationResult),
    Matrix(ResultMatrix),
}

impl ResultSet {
    pub fn get(
        &self,
        scheduling: SchedulingPolicy,
        allocation: AllocationPolicy,
    ) -> Option<&SimulationResult> {
        match self {
            ResultSet::Single(r) => (r.scheduling_policy == scheduling
                && r.allocation_policy == allocation)
                .then_some(r),
            ResultSet::Matrix(m) => m.get(&scheduling)?.get(&allocation),
        }
    }

    /// Every result, scheduling-major.
    pub fn results(&self) -> Vec<&SimulationResult> {
        match self {
            ResultSet::Single(r) => vec![r],
            ResultSet::Matrix(m) => m.values().flat_map(|inner| inner.values()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.results().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn assemble(selection: PolicySelection, mut results: Vec<SimulationResult>) -> Result<Self> {
        if selection.is_single() {
            return results
                .pop()
                .map(ResultSet::Single)
                .ok_or_else(|| SimError::Worker("simulation produced no result".to_string()));
        }

        let mut matrix: ResultMatrix = BTreeMap::new();
        for result in results {
            matrix
                .entry(result.scheduling_policy)
                .or_default()
                .insert(result.allocation_policy, result);
        }
        Ok(ResultSet::Matrix(matrix))
    }
}

/// Run every selected policy pair in parallel.
///
/// Any failing run fails the whole request; no partial set is returned.
pub async fn run_selection(
    graph: Arc<TaskGraph>,
    base: SimulationOptions,
    selection: PolicySelection,
) -> Result<ResultSet> {
    base.validate()?;

    let pairs = selection.pairs();
    info!(runs = pairs.len(), "running policy combinations");

    let mut runs = JoinSet::new();
    for (scheduling, allocation) in pairs {
        let graph = Arc::clone(&graph);
        let options = base.clone().with_policies(scheduling, allocation);
        runs.spawn_blocking(move || simulate(&graph, &options));
    }

    let mut results = Vec::new();
    while let Some(joined) = runs.join_next().await {
        let result = joined.map_err(|e| SimError::Worker(e.to_string()))??;
        debug!(
            scheduling = %result.scheduling_policy,
            allocation = %result.allocation_policy,
            "policy combination finished"
        );
        results.push(result);
    }

    ResultSet::assemble(selection, results)
}

/// Sequential counterpart of [`run_selection`] for callers without a
/// runtime. Produces the same result set.
pub fn run_selection_blocking(
    graph: &TaskGraph,
    base: &SimulationOptions,
    selection: PolicySelection,
) -> Result<ResultSet> {
    base.validate()?;

    let results = selection
        .pairs()
        .into_iter()
        .map(|(s, a)| simulate(graph, &base.clone().with_policies(s, a)))
        .collect::<Result<Vec<_>>>()?;

    ResultSet::assemble(selection, results)
}
