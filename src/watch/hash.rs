// src/watch/hash.rs

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

/// Compute the hash of a single file.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = File::open(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Last seen content hash of one file.
#[derive(Debug, Clone, Default)]
pub struct ContentFingerprint {
    last: Option<String>,
}

impl ContentFingerprint {
    /// Fingerprint `path` as it is now. An unreadable file starts empty.
    pub fn of(path: &Path) -> Self {
        Self {
            last: compute_file_hash(path).ok(),
        }
    }

    /// Re-hash `path` and report whether the content differs from the last
    /// time. The new hash is remembered either way.
    pub fn refresh(&mut self, path: &Path) -> Result<bool> {
        let hash = compute_file_hash(path)?;
        let changed = self.last.as_deref() != Some(hash.as_str());
        debug!(path = ?path, hash = %hash, changed, "config fingerprint refreshed");
        self.last = Some(hash);
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn only_content_changes_are_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[programs]\n").unwrap();
        let mut fp = ContentFingerprint::of(file.path());

        assert!(!fp.refresh(file.path()).unwrap());

        write!(file, "[programs.a]\ncmd = \"/bin/true\"\n").unwrap();
        file.flush().unwrap();
        assert!(fp.refresh(file.path()).unwrap());
        assert!(!fp.refresh(file.path()).unwrap());
    }

    #[test]
    fn missing_file_is_an_error() {
        let mut fp = ContentFingerprint::default();
        assert!(fp.refresh(Path::new("/definitely/not/here.toml")).is_err());
    }
}
