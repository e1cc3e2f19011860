// src/config/mod.rs

//! Configuration loading and validation for taskmaster.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Fill defaults and validate into `ProgramSpec`s (`validate.rs`).
//! - Map stop-signal names onto OS signals (`signal.rs`).

pub mod loader;
pub mod model;
pub mod signal;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_and_validate};
pub use model::{ConfigFile, ProgramSpec, RawConfigFile, RawProgramConfig};
pub use signal::StopSignal;
