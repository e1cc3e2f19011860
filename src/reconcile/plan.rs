// src/reconcile/plan.rs

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::config::{ConfigFile, ProgramSpec};
use crate::process::{ProcessMap, ProcessRecord};
use crate::reconcile::ReconcileCommand;

/// Output of one planning pass.
#[derive(Debug, Clone, Default)]
pub struct ReconcilePlan {
    /// Commands to issue, in order. For a replaced program every stop comes
    /// before any start.
    pub commands: Vec<ReconcileCommand>,
    /// The known state once the commands have been issued.
    pub state: ProcessMap,
}

impl ReconcilePlan {
    pub fn is_noop(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn starts(&self) -> impl Iterator<Item = &Arc<ProcessRecord>> {
        self.commands.iter().filter(|c| c.is_start()).map(ReconcileCommand::record)
    }

    pub fn stops(&self) -> impl Iterator<Item = &Arc<ProcessRecord>> {
        self.commands.iter().filter(|c| !c.is_start()).map(ReconcileCommand::record)
    }
}

/// Diff `desired` against `previous`.
///
/// - new program: create its records, start those with `autostart`.
/// - unchanged program (deep-equal spec): keep the old records, no commands.
/// - changed program: stop every old record, then create fresh records and
///   start them if `autostart`.
/// - program gone from `desired`: stop every old record.
pub fn plan(previous: &ProcessMap, desired: &ConfigFile) -> ReconcilePlan {
    let mut commands = Vec::new();
    let mut state = ProcessMap::new();
    let mut visited: HashSet<&str> = HashSet::new();

    for (name, spec) in desired.programs() {
        visited.insert(name.as_str());

        match previous.get(name) {
            None => {
                debug!(program = %name, "new program");
                let records = fresh_records(spec, &mut commands);
                state.insert(name.clone(), records);
            }
            Some(old) if same_spec(old, spec) => {
                debug!(program = %name, "program unchanged");
                state.insert(name.clone(), old.to_vec());
            }
            Some(old) => {
                debug!(program = %name, "program changed; replacing");
                commands.extend(old.iter().cloned().map(ReconcileCommand::Stop));
                let records = fresh_records(spec, &mut commands);
                state.insert(name.clone(), records);
            }
        }
    }

    for (name, old) in previous.iter() {
        if !visited.contains(name.as_str()) {
            debug!(program = %name, "program removed");
            commands.extend(old.iter().cloned().map(ReconcileCommand::Stop));
        }
    }

    ReconcilePlan { commands, state }
}

fn same_spec(old: &[Arc<ProcessRecord>], spec: &ProgramSpec) -> bool {
    !old.is_empty() && old.iter().all(|record| record.spec() == spec)
}

fn fresh_records(
    spec: &ProgramSpec,
    commands: &mut Vec<ReconcileCommand>,
) -> Vec<Arc<ProcessRecord>> {
    let records = ProcessRecord::instances_of(&Arc::new(spec.clone()));
    if spec.autostart {
        commands.extend(records.iter().cloned().map(ReconcileCommand::Start));
    }
    records
}
