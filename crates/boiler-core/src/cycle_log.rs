//! Append-only JSONL cycle log.
//!
//! Recording is best-effort operator observability, not part of the safety
//! protocol: recorder errors are logged and never fail the cycle, and the log
//! is not controller state. A restarted supervisor begins at WAITING
//! regardless of what was recorded.

use crate::state::{Failure, OperatingMode};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One line of the cycle log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    /// 1-based cycle index since construction.
    pub cycle: u64,

    /// Mode when the cycle began.
    pub entered_mode: OperatingMode,

    /// Mode when the cycle ended.
    pub exited_mode: OperatingMode,

    /// Failure classification at cycle end, if any.
    pub failure: Option<Failure>,

    /// Water-level reading accepted this cycle.
    pub water_level: f64,

    /// Steam reading accepted this cycle.
    pub steam_level: f64,

    /// Intended open pumps at cycle end.
    pub active_pumps: usize,

    /// Whether the drain valve has been opened.
    pub valve_open: bool,

    /// Messages appended to the outbound batch this cycle.
    pub sent: usize,
}

/// Hook for recording completed cycles.
pub trait CycleRecorder {
    /// Called once at the end of every cycle.
    ///
    /// Implementations must be bounded; errors are treated as best-effort by
    /// the controller.
    fn record(&self, record: &CycleRecord) -> Result<()>;
}

/// File-backed recorder writing one JSON object per line.
pub struct JsonlCycleLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlCycleLog {
    /// Create (or append to) the log at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Path of the underlying log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CycleRecorder for JsonlCycleLog {
    fn record(&self, record: &CycleRecord) -> Result<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| crate::BoilerError::Encoding(e.to_string()))?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| crate::BoilerError::Encoding("cycle log mutex poisoned".into()))?;
        writeln!(file, "{line}")?;
        file.flush()?;
        Ok(())
    }
}
