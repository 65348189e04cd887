// Match logging module for per-decision JSONL records
//
// Each contender decision is written as one JSON line so a match can be
// replayed against the engine later. A disabled logger is a no-op.

use log::error;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::sync::{Arc, Mutex};

use crate::simulation::Policy;
use crate::types::{Coord, Direction};

/// Represents a single match log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub game: u32,
    pub seed: u64,
    pub tick: u32,
    pub contender: usize,
    pub policy: Policy,
    pub heading: Direction,
    pub body: Vec<Coord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent: Option<Vec<Coord>>,
    pub goal: Coord,
    pub chosen_move: Direction,
    pub timestamp: String,
}

/// Shared match logger state
/// Uses Arc<Mutex<..>> so matches running on different threads can append to one file
#[derive(Clone)]
pub struct MatchLogger {
    file: Arc<Mutex<Option<BufWriter<File>>>>,
    enabled: bool,
}

impl MatchLogger {
    /// Creates a new match logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return Self::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
        {
            Ok(file) => {
                log::info!("Match logging enabled: {}", log_file_path);
                MatchLogger {
                    file: Arc::new(Mutex::new(Some(BufWriter::new(file)))),
                    enabled: true,
                }
            }
            Err(e) => {
                error!("Failed to create match log file '{}': {}", log_file_path, e);
                Self::disabled()
            }
        }
    }

    /// Creates a disabled match logger (no-op)
    pub fn disabled() -> Self {
        MatchLogger {
            file: Arc::new(Mutex::new(None)),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Appends one decision. Write failures are logged, never propagated.
    pub fn log_decision(&self, record: &DecisionRecord) {
        if !self.enabled {
            return;
        }

        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize match log entry: {}", e);
                return;
            }
        };

        let mut guard = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(writer) = guard.as_mut() {
            if let Err(e) = writeln!(writer, "{}", line) {
                error!("Failed to write match log entry: {}", e);
            }
        }
    }

    /// Flushes buffered entries to disk
    pub fn flush(&self) {
        if !self.enabled {
            return;
        }

        let mut guard = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(writer) = guard.as_mut() {
            if let Err(e) = writer.flush() {
                error!("Failed to flush match log: {}", e);
            }
        }
    }
}

/// Current time as RFC 3339, used for record timestamps
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339()
}
