// src/process/mod.rs

//! Supervised processes.
//!
//! - [`record`] holds the per-instance record and its status machine.
//! - [`policy`] classifies exits and decides whether to relaunch.
//! - [`spawn`] builds and stops the actual OS child.
//! - [`runner`] is the run loop tying the three together for one record.
//! - [`map`] is the program name -> records table the supervisor keeps.

pub mod map;
pub mod policy;
pub mod record;
pub mod runner;
pub mod spawn;

pub use map::{ProcessMap, RecordSnapshot};
pub use policy::{ExitOutcome, RestartDecision, RestartPolicy, classify_exit};
pub use record::{ProcessRecord, ProcessState, ProcessStatus};
pub use runner::{Completion, DoneReceiver, DoneSender, RETRY_DELAY, run_process};
pub use spawn::{SpawnError, SpawnLock, new_spawn_lock};
