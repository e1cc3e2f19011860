#![allow(dead_code)]

use std::io::Write;
use std::sync::Arc;

use tempfile::NamedTempFile;
use taskmaster::config::{ProgramSpec, RawProgramConfig};
use taskmaster::process::ProcessRecord;

/// Write `contents` to a fresh temporary `.toml` file.
pub fn config_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    write!(file, "{contents}").unwrap();
    file.flush().unwrap();
    file
}

/// A single record for `raw`, named `"<name> - 0"`.
pub fn record(name: &str, raw: RawProgramConfig) -> Arc<ProcessRecord> {
    let spec = Arc::new(ProgramSpec::from_raw(name, raw).unwrap());
    ProcessRecord::instances_of(&spec).remove(0)
}
