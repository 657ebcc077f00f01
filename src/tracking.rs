//! Resumability bookkeeping for assembly runs.
//!
//! Three append-only logs, one pid per line: `exists.txt` (a canonical
//! document was already there), `created.txt` (written this run) and
//! `incomplete.txt` (a partial document was missing).

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingKind {
    Exists,
    Created,
    Incomplete,
}

impl TrackingKind {
    pub const ALL: [TrackingKind; 3] = [
        TrackingKind::Exists,
        TrackingKind::Created,
        TrackingKind::Incomplete,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            TrackingKind::Exists => "exists.txt",
            TrackingKind::Created => "created.txt",
            TrackingKind::Incomplete => "incomplete.txt",
        }
    }
}

/// The three tracking logs under one directory.
#[derive(Debug, Clone)]
pub struct TrackingLogs {
    dir: PathBuf,
}

impl TrackingLogs {
    /// Create `dir` if needed and truncate all three logs.
    pub fn reset(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create tracking directory: {}", dir.display()))?;
        let logs = Self {
            dir: dir.to_path_buf(),
        };
        for kind in TrackingKind::ALL {
            let path = logs.path(kind);
            fs::write(&path, "").with_context(|| format!("Failed to reset {}", path.display()))?;
        }
        Ok(logs)
    }

    pub fn path(&self, kind: TrackingKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    pub fn record(&self, kind: TrackingKind, pid: &str) -> Result<()> {
        let path = self.path(kind);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        writeln!(file, "{}", pid).with_context(|| format!("Failed to append to {}", path.display()))
    }
}
