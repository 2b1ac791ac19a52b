// src/config/mod.rs

//! Workload files.
//!
//! - `model.rs`: the serde data model, loose scalars included.
//! - `loader.rs`: reading TOML or JSON from disk.
//! - `validate.rs`: normalization into a [`Workload`] with a built graph.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_str, WorkloadFormat};
pub use model::{LooseValue, RawSettings, RawTask, RawWorkload, Settings, Workload};
