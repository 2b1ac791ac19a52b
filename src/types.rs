use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::SimError;

/// Simulated time, in abstract ticks.
pub type Tick = u64;

/// Canonical task key used throughout the crate.
pub type TaskKey = String;

/// Whether a task runs once or recurs with a fixed period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Event,
    Periodic,
}

impl Default for TaskKind {
    fn default() -> Self {
        TaskKind::Event
    }
}

impl FromStr for TaskKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "event" => Ok(TaskKind::Event),
            "periodic" => Ok(TaskKind::Periodic),
            other => Err(SimError::Validation(format!(
                "invalid task type: {other} (expected \"event\" or \"periodic\")"
            ))),
        }
    }
}

/// Ordering policy for the ready queue.
///
/// - `Fcfs`: first come, first served (eligible time, then key).
/// - `Pas`: priority with aging; waiting instances gain priority over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulingPolicy {
    Fcfs,
    Pas,
}

impl SchedulingPolicy {
    pub const ALL: [SchedulingPolicy; 2] = [SchedulingPolicy::Fcfs, SchedulingPolicy::Pas];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulingPolicy::Fcfs => "fcfs",
            SchedulingPolicy::Pas => "pas",
        }
    }
}

impl fmt::Display for SchedulingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchedulingPolicy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fcfs" => Ok(SchedulingPolicy::Fcfs),
            "pas" => Ok(SchedulingPolicy::Pas),
            other => Err(SimError::UnknownPolicy(format!(
                "scheduling policy '{other}' (expected \"fcfs\" or \"pas\")"
            ))),
        }
    }
}

/// Core allocation policy.
///
/// - `Static`: each task key is pinned to one core for the whole run.
/// - `Dynamic`: each dispatch picks the least recently busy free core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationPolicy {
    Static,
    Dynamic,
}

impl AllocationPolicy {
    pub const ALL: [AllocationPolicy; 2] = [AllocationPolicy::Static, AllocationPolicy::Dynamic];

    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationPolicy::Static => "static",
            AllocationPolicy::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for AllocationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllocationPolicy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "static" => Ok(AllocationPolicy::Static),
            "dynamic" => Ok(AllocationPolicy::Dynamic),
            other => Err(SimError::UnknownPolicy(format!(
                "allocation policy '{other}' (expected \"static\" or \"dynamic\")"
            ))),
        }
    }
}

/// A single policy, or every variant of it ("all" / "both").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyChoice<P> {
    Only(P),
    All,
}

impl<P: Copy> PolicyChoice<P> {
    /// Expand into the concrete policies to run, given every known variant.
    pub fn expand(&self, all: &[P]) -> Vec<P> {
        match self {
            PolicyChoice::Only(p) => vec![*p],
            PolicyChoice::All => all.to_vec(),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, PolicyChoice::All)
    }
}

impl<P> FromStr for PolicyChoice<P>
where
    P: FromStr<Err = SimError>,
{
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "both" => Ok(PolicyChoice::All),
            _ => P::from_str(s).map(PolicyChoice::Only),
        }
    }
}

impl<P: fmt::Display> fmt::Display for PolicyChoice<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyChoice::Only(p) => p.fmt(f),
            PolicyChoice::All => f.write_str("all"),
        }
    }
}
