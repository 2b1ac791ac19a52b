// src/config/model.rs

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::dag::TaskGraph;
use crate::engine::{PriorityAging, SimulationOptions};
use crate::types::{AllocationPolicy, PolicyChoice, SchedulingPolicy, Tick};

/// Workload file exactly as deserialized, before any validation.
///
/// ```toml
/// [config]
/// cores = 2
/// horizon = 100
/// scheduling_policy = "pas"
///
/// [task.A]
/// type = "periodic"
/// period = 10
/// execution_time = 2
///
/// [task.B]
/// execution_time = 3
/// deps = ["A"]
/// ```
///
/// JSON files use the same shape; `runnables` is accepted in place of
/// `task`, and the settings keys also accept their camelCase spellings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWorkload {
    #[serde(default)]
    pub config: RawSettings,

    #[serde(default, alias = "runnables", alias = "tasks")]
    pub task: BTreeMap<String, RawTask>,
}

/// `[config]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSettings {
    #[serde(default, alias = "numCores", alias = "num_cores")]
    pub cores: Option<LooseValue>,

    #[serde(default, alias = "simulationTime", alias = "simulation_time")]
    pub horizon: Option<LooseValue>,

    #[serde(default, alias = "schedulingPolicy")]
    pub scheduling_policy: Option<String>,

    #[serde(default, alias = "allocationPolicy")]
    pub allocation_policy: Option<String>,

    #[serde(default, alias = "agingFactor")]
    pub aging_factor: Option<LooseValue>,

    #[serde(default, alias = "maxIterations")]
    pub max_iterations: Option<LooseValue>,
}

/// `[task.<key>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTask {
    /// Identifier other tasks may reference instead of the key.
    #[serde(default)]
    pub id: Option<LooseValue>,

    /// Display name; informational only.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, rename = "type", alias = "kind")]
    pub kind: Option<String>,

    #[serde(default, alias = "executionTime")]
    pub execution_time: Option<LooseValue>,

    #[serde(default)]
    pub period: Option<LooseValue>,

    #[serde(default)]
    pub deps: Vec<LooseValue>,

    #[serde(default)]
    pub dependencies: Vec<LooseValue>,

    #[serde(default)]
    pub priority: Option<LooseValue>,

    #[serde(default)]
    pub criticality: Option<LooseValue>,

    #[serde(default)]
    pub affinity: Option<LooseValue>,
}

/// A scalar that may arrive as an integer, a float or a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LooseValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl LooseValue {
    /// `true` for the empty (or all-whitespace) string, which counts as absent.
    pub fn is_blank(&self) -> bool {
        matches!(self, LooseValue::Text(s) if s.trim().is_empty())
    }

    /// Interpret as an integer. Floats must be integral and fit in an `i64`;
    /// strings must parse.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            LooseValue::Int(n) => Some(*n),
            LooseValue::Float(f) => integral(*f),
            LooseValue::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(integral))
            }
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            LooseValue::Int(n) => Some(*n as f64),
            LooseValue::Float(f) => Some(*f),
            LooseValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

impl fmt::Display for LooseValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LooseValue::Int(n) => write!(f, "{n}"),
            LooseValue::Float(x) => match integral(*x) {
                Some(n) => write!(f, "{n}"),
                None => write!(f, "{x}"),
            },
            LooseValue::Text(s) => f.write_str(s.trim()),
        }
    }
}

/// `f` as an `i64` when it is a whole number inside the `i64` range.
fn integral(f: f64) -> Option<i64> {
    // 2^63 itself is one past `i64::MAX`.
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}

/// Validated run settings with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub cores: usize,
    pub horizon: Tick,
    pub scheduling: PolicyChoice<SchedulingPolicy>,
    pub allocation: PolicyChoice<AllocationPolicy>,
    pub aging_factor: f64,
    pub max_iterations: u64,
}

impl Settings {
    pub const DEFAULT_CORES: usize = 1;
    pub const DEFAULT_HORIZON: Tick = 400;

    /// Simulation options for a run; the policy pair is filled in per run.
    pub fn simulation_options(&self) -> SimulationOptions {
        SimulationOptions::new(
            self.cores,
            self.horizon,
            SchedulingPolicy::Fcfs,
            AllocationPolicy::Static,
        )
        .with_aging_factor(self.aging_factor)
        .with_max_iterations(self.max_iterations)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cores: Self::DEFAULT_CORES,
            horizon: Self::DEFAULT_HORIZON,
            scheduling: PolicyChoice::All,
            allocation: PolicyChoice::All,
            aging_factor: PriorityAging::DEFAULT_AGING_FACTOR,
            max_iterations: SimulationOptions::DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// A validated workload: settings plus a built task graph.
///
/// Only constructible through `TryFrom<RawWorkload>`.
#[derive(Debug, Clone)]
pub struct Workload {
    pub settings: Settings,
    pub graph: TaskGraph,
}

impl Workload {
    pub(crate) fn new_unchecked(settings: Settings, graph: TaskGraph) -> Self {
        Self { settings, graph }
    }
}
