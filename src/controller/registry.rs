// src/controller/registry.rs

//! Name -> cancellation token table owned by the controller.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

use crate::process::ProcessRecord;

#[derive(Debug)]
struct RegistryEntry {
    generation: u64,
    token: CancellationToken,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, RegistryEntry>,
    /// Record id -> generation of its run loop that has not reported done
    /// yet, cancelled or not.
    busy: HashMap<u64, u64>,
    next_generation: u64,
}

/// Why a start was not registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    /// Another run loop is registered under the same name.
    NameTaken,
    /// This record's previous run loop is still winding down.
    RecordBusy,
}

impl fmt::Display for Refusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Refusal::NameTaken => f.write_str("already running"),
            Refusal::RecordBusy => f.write_str("previous run still stopping"),
        }
    }
}

/// Which names currently have a live, un-cancelled run loop.
///
/// Every registration gets its own generation; completion reports are
/// matched on it, never on the name or the record. The lock is only held to
/// read or mutate the map; tokens are cancelled after it has been released.
#[derive(Debug, Default)]
pub struct Registry {
    inner: Mutex<Inner>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `record` under its name and return the generation of the
    /// new registration.
    ///
    /// Refused when the name is taken or when a run loop for this very
    /// record has not finished yet; the map is left untouched either way.
    pub fn try_register(
        &self,
        record: &ProcessRecord,
        token: CancellationToken,
    ) -> Result<u64, Refusal> {
        let mut inner = self.lock();
        if inner.entries.contains_key(record.name()) {
            return Err(Refusal::NameTaken);
        }
        if inner.busy.contains_key(&record.id()) {
            return Err(Refusal::RecordBusy);
        }

        inner.next_generation += 1;
        let generation = inner.next_generation;
        inner.busy.insert(record.id(), generation);
        inner
            .entries
            .insert(record.name().to_string(), RegistryEntry { generation, token });
        Ok(generation)
    }

    /// Remove `name` and cancel its run loop. Returns `false` if absent.
    pub fn cancel(&self, name: &str) -> bool {
        let entry = self.lock().entries.remove(name);
        match entry {
            Some(entry) => {
                entry.token.cancel();
                true
            }
            None => false,
        }
    }

    /// The run loop of `record` started as `generation` has finished.
    ///
    /// Frees the record for a new start and removes its name entry if that
    /// entry still belongs to this generation. Returns whether an entry was
    /// removed.
    pub fn release(&self, record: &ProcessRecord, generation: u64) -> bool {
        let mut inner = self.lock();
        if inner.busy.get(&record.id()) == Some(&generation) {
            inner.busy.remove(&record.id());
        }
        match inner.entries.get(record.name()) {
            Some(entry) if entry.generation == generation => {
                inner.entries.remove(record.name());
                true
            }
            _ => false,
        }
    }

    /// Cancel and remove everything. Returns how many entries were cancelled.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<RegistryEntry> =
            self.lock().entries.drain().map(|(_, e)| e).collect();
        for entry in &drained {
            entry.token.cancel();
        }
        drained.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().entries.contains_key(name)
    }

    /// Whether a run loop for `record` is still alive, registered or not.
    pub fn is_busy(&self, record: &ProcessRecord) -> bool {
        self.lock().busy.contains_key(&record.id())
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
