// src/reconcile/mod.rs

//! Converging the running process set onto a new configuration.
//!
//! Planning is pure and synchronous ([`plan`]): it diffs the desired
//! programs against the previously known [`ProcessMap`](crate::process::ProcessMap)
//! and returns the ordered start/stop commands plus the new map. Applying
//! ([`apply`]) pushes those commands into a [`CommandSink`], which in
//! production is the controller handle.

use std::sync::Arc;

use crate::process::ProcessRecord;

/// A single convergence step.
#[derive(Debug, Clone)]
pub enum ReconcileCommand {
    Start(Arc<ProcessRecord>),
    Stop(Arc<ProcessRecord>),
}

impl ReconcileCommand {
    pub fn record(&self) -> &Arc<ProcessRecord> {
        match self {
            ReconcileCommand::Start(record) | ReconcileCommand::Stop(record) => record,
        }
    }

    pub fn is_start(&self) -> bool {
        matches!(self, ReconcileCommand::Start(_))
    }
}

pub mod apply;
pub mod plan;

pub use apply::{CommandSink, apply, reload};
pub use plan::{ReconcilePlan, plan};
