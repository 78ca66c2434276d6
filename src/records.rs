//! Best-throw leaderboard
//!
//! Keeps the ten longest landed throws of a session, across archetypes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimResult;
use crate::sim::{Archetype, Stats};

/// Maximum number of records to keep
pub const MAX_RECORDS: usize = 10;

/// One landed throw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRecord {
    pub archetype: Archetype,
    /// Metres from the launch position
    pub distance: f32,
    pub max_height: f32,
    /// Seconds from fire to landing
    pub flight_time: f32,
}

/// Longest throws first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchRecords {
    pub entries: Vec<LaunchRecord>,
}

impl LaunchRecords {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a distance makes the board
    pub fn qualifies(&self, distance: f32) -> bool {
        if distance.is_nan() || distance <= 0.0 {
            return false;
        }
        if self.entries.len() < MAX_RECORDS {
            return true;
        }
        self.entries.last().map(|e| distance > e.distance).unwrap_or(true)
    }

    /// Record a landed throw. Returns the rank achieved (1-indexed) or None
    /// if it didn't qualify.
    pub fn record(&mut self, archetype: Archetype, stats: &Stats) -> Option<usize> {
        if !self.qualifies(stats.distance) {
            return None;
        }

        let entry = LaunchRecord {
            archetype,
            distance: stats.distance,
            max_height: stats.max_height,
            flight_time: stats.time,
        };

        // Sorted descending by distance
        let pos = self.entries.iter().position(|e| entry.distance > e.distance);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };
        self.entries.truncate(MAX_RECORDS);

        log::info!(
            "New record #{}: {:.2} m with {}",
            rank,
            stats.distance,
            archetype.label()
        );
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn best(&self) -> Option<&LaunchRecord> {
        self.entries.first()
    }

    /// Best throw for one archetype
    pub fn best_for(&self, archetype: Archetype) -> Option<&LaunchRecord> {
        self.entries.iter().find(|e| e.archetype == archetype)
    }

    pub fn load_from(path: impl AsRef<Path>) -> SimResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let records: LaunchRecords = serde_json::from_str(&json)?;
        log::info!("Loaded {} launch records", records.entries.len());
        Ok(records)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> SimResult<()> {
        std::fs::write(path.as_ref(), serde_json::to_string_pretty(self)?)?;
        log::info!("Launch records saved ({} entries)", self.entries.len());
        Ok(())
    }
}
