// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("task '{task}' references unknown dependency '{reference}'")]
    UnknownDependency { task: String, reference: String },

    #[error("Cycle detected in dependency graph: {0}")]
    CyclicDependency(String),

    #[error("Unknown policy: {0}")]
    UnknownPolicy(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("simulation worker failed: {0}")]
    Worker(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    /// Status code the request/response boundary reports for this error.
    ///
    /// Anything caused by the submitted workload is a client error (400);
    /// the rest is an internal failure (500).
    pub fn status_code(&self) -> u16 {
        match self {
            SimError::Validation(_)
            | SimError::UnknownDependency { .. }
            | SimError::CyclicDependency(_)
            | SimError::UnknownPolicy(_)
            | SimError::Toml(_)
            | SimError::Json(_) => 400,
            SimError::Io(_)
            | SimError::Encode(_)
            | SimError::Worker(_)
            | SimError::Other(_) => 500,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SimError>;
