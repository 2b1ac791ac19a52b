// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{RawWorkload, Workload};
use crate::errors::Result;

/// Serialization format of a workload file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadFormat {
    Toml,
    Json,
}

impl WorkloadFormat {
    /// `.json` files are JSON; everything else is read as TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => WorkloadFormat::Json,
            _ => WorkloadFormat::Toml,
        }
    }
}

/// Parse workload text without semantic validation.
pub fn parse_str(contents: &str, format: WorkloadFormat) -> Result<RawWorkload> {
    let raw = match format {
        WorkloadFormat::Toml => toml::from_str(contents)?,
        WorkloadFormat::Json => serde_json::from_str(contents)?,
    };
    Ok(raw)
}

/// Load a workload file from `path` and return the raw [`RawWorkload`].
///
/// Only deserializes; use [`load_and_validate`] to also build the task graph.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawWorkload> {
    let path = path.as_ref();
    let format = WorkloadFormat::from_path(path);
    debug!(path = %path.display(), ?format, "loading workload");

    let contents = fs::read_to_string(path)?;
    parse_str(&contents, format)
}

/// Load a workload file, apply defaults and build its task graph.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Workload> {
    let raw = load_from_path(path)?;
    Workload::try_from(raw)
}
