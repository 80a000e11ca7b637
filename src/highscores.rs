//! Per-game leaderboards
//!
//! Each game keeps its ten best runs under its own storage key.

use serde::{Deserialize, Serialize};

use crate::persistence::{self, KeyValueStore};

/// Rows kept per table
pub const TABLE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Score, or gold earned for economy games
    pub score: u64,
    pub wave: u32,
    /// Supplied by the host (Unix ms or sim seconds)
    pub timestamp: f64,
}

/// Best runs of one game, highest score first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn storage_key(game: &str) -> String {
        format!("arcade_sim.highscores.{}", game)
    }

    /// Insertion index for `score`; equal scores go after existing rows
    fn slot_for(&self, score: u64) -> Option<usize> {
        if score == 0 {
            return None;
        }
        let index = self.entries.partition_point(|e| e.score >= score);
        (index < TABLE_SIZE).then_some(index)
    }

    pub fn qualifies(&self, score: u64) -> bool {
        self.slot_for(score).is_some()
    }

    /// 1-based rank `score` would take, if it makes the table
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        self.slot_for(score).map(|index| index + 1)
    }

    /// Insert a run; returns its 1-based rank, or `None` if it missed the table
    pub fn add_score(&mut self, score: u64, wave: u32, timestamp: f64) -> Option<usize> {
        let index = self.slot_for(score)?;
        self.entries.insert(
            index,
            HighScoreEntry {
                score,
                wave,
                timestamp,
            },
        );
        self.entries.truncate(TABLE_SIZE);
        Some(index + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Load a game's table; missing or corrupt data yields an empty table
    pub fn load(store: &dyn KeyValueStore, game: &str) -> Self {
        persistence::load_or_default(store, &Self::storage_key(game))
    }

    pub fn save(&self, store: &mut dyn KeyValueStore, game: &str) -> Result<(), persistence::Error> {
        persistence::save(store, &Self::storage_key(game), self)?;
        log::info!("High scores saved for {} ({} entries)", game, self.entries.len());
        Ok(())
    }

    /// Load, insert and save in one go; returns the rank achieved
    pub fn record(
        store: &mut dyn KeyValueStore,
        game: &str,
        score: u64,
        wave: u32,
        timestamp: f64,
    ) -> Result<Option<usize>, persistence::Error> {
        let mut table = Self::load(store, game);
        let rank = table.add_score(score, wave, timestamp);
        if rank.is_some() {
            table.save(store, game)?;
        }
        Ok(rank)
    }
}
