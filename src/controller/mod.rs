// src/controller/mod.rs

//! Lifecycle controller.
//!
//! The controller is the single authority for "is this name running". It
//! owns the [`Registry`] and serializes every start/stop/kill-all request
//! through one dispatch loop:
//!
//! - [`core`] is the dispatch loop plus the completion listener.
//! - [`handle`] is the cloneable command surface other components use.
//! - [`registry`] is the mutex-guarded name -> cancellation token map.

use std::sync::Arc;

use crate::process::ProcessRecord;

/// Commands accepted by the dispatch loop, applied in the order received.
#[derive(Debug, Clone)]
pub enum ControllerCommand {
    /// Launch a run loop for this record unless its name is already running.
    Start(Arc<ProcessRecord>),
    /// Cancel the run loop registered under this name.
    Stop(String),
    /// Cancel everything, wait for every run loop, then shut down.
    KillAll,
}

pub mod core;
pub mod handle;
pub mod registry;

pub use self::core::{Controller, spawn_controller};
pub use handle::ControllerHandle;
pub use registry::{Refusal, Registry};
