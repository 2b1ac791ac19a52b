// src/report/response.rs

//! JSON shapes handed back to callers.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{KpiSummary, ResultSet};
use crate::engine::SimulationResult;
use crate::errors::SimError;
use crate::types::{AllocationPolicy, SchedulingPolicy};

/// A simulation result with its KPIs inlined next to it.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    #[serde(flatten)]
    pub result: SimulationResult,
    pub kpis: KpiSummary,
}

impl From<SimulationResult> for RunReport {
    fn from(result: SimulationResult) -> Self {
        let kpis = KpiSummary::from_result(&result);
        Self { result, kpis }
    }
}

/// Successful response. A single pair is inlined at the top level; a cross
/// product goes under `results.<scheduling>.<allocation>`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Response {
    Single {
        success: bool,
        #[serde(flatten)]
        report: RunReport,
    },
    Matrix {
        success: bool,
        results: BTreeMap<SchedulingPolicy, BTreeMap<AllocationPolicy, RunReport>>,
    },
}

impl From<ResultSet> for Response {
    fn from(set: ResultSet) -> Self {
        match set {
            ResultSet::Single(result) => Response::Single {
                success: true,
                report: result.into(),
            },
            ResultSet::Matrix(matrix) => Response::Matrix {
                success: true,
                results: matrix
                    .into_iter()
                    .map(|(s, inner)| {
                        let inner = inner.into_iter().map(|(a, r)| (a, r.into())).collect();
                        (s, inner)
                    })
                    .collect(),
            },
        }
    }
}

/// Failure response. `status` is 400 for bad input, 500 otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub status: u16,
    pub error: String,
}

impl From<&SimError> for ErrorResponse {
    fn from(err: &SimError) -> Self {
        Self {
            success: false,
            status: err.status_code(),
            error: err.to_string(),
        }
    }
}
