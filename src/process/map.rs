// src/process/map.rs

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::sync::Arc;

use crate::process::record::{ProcessRecord, ProcessState};

/// Program name -> its instance records, in index order.
///
/// This is the "known state" the reconciler diffs new configurations
/// against. Records are shared with the run loops that drive them, so a
/// map always reflects live status.
#[derive(Debug, Clone, Default)]
pub struct ProcessMap {
    programs: BTreeMap<String, Vec<Arc<ProcessRecord>>>,
}

/// Point-in-time copy of one record for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSnapshot {
    pub name: String,
    pub state: ProcessState,
}

impl ProcessMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, program: impl Into<String>, records: Vec<Arc<ProcessRecord>>) {
        self.programs.insert(program.into(), records);
    }

    pub fn get(&self, program: &str) -> Option<&[Arc<ProcessRecord>]> {
        self.programs.get(program).map(Vec::as_slice)
    }

    pub fn contains(&self, program: &str) -> bool {
        self.programs.contains_key(program)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Vec<Arc<ProcessRecord>>> {
        self.programs.iter()
    }

    pub fn program_names(&self) -> impl Iterator<Item = &str> {
        self.programs.keys().map(String::as_str)
    }

    /// Every record of every program.
    pub fn records(&self) -> impl Iterator<Item = &Arc<ProcessRecord>> {
        self.programs.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Read-only copy of every record's state, keyed by program.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<RecordSnapshot>> {
        self.programs
            .iter()
            .map(|(program, records)| {
                let snaps = records
                    .iter()
                    .map(|r| RecordSnapshot {
                        name: r.name().to_string(),
                        state: r.snapshot(),
                    })
                    .collect();
                (program.clone(), snaps)
            })
            .collect()
    }
}

impl fmt::Display for ProcessMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (program, records) in &self.programs {
            writeln!(f, "{program}:")?;
            for record in records {
                writeln!(f, "{record}")?;
            }
        }
        Ok(())
    }
}
