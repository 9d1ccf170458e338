//! Match records handed to persistence once a game ends

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::{Difficulty, Side, Turn};

/// How the game was won
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VictoryKind {
    /// Held every resource tile for the required streak
    Monopoly,
    /// Destroyed the opposing base
    Annihilation,
}

/// Finalized result of one match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub winner: Side,
    pub victory: VictoryKind,
    pub turns_played: Turn,
    /// Resource tiles the winner controlled at the end
    pub resource_tiles_held: usize,
    pub difficulty: Difficulty,
    pub map_size: u32,
}

/// Persistence seam for finished matches
pub trait MatchRecorder {
    fn record(&mut self, record: &MatchRecord) -> Result<()>;
}

/// Appends one JSON object per line
#[derive(Debug, Clone)]
pub struct JsonLinesRecorder {
    path: PathBuf,
}

impl JsonLinesRecorder {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MatchRecorder for JsonLinesRecorder {
    fn record(&mut self, record: &MatchRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

/// Keeps records in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryRecorder {
    pub records: Vec<MatchRecord>,
}

impl MatchRecorder for MemoryRecorder {
    fn record(&mut self, record: &MatchRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}
