//! Local leaderboard
//!
//! Offline stand-in for the leaderboard service. Keeps the top 10 scores,
//! persists them as JSON and pads short boards with bot rows.

use serde::{Deserialize, Serialize};

use crate::platform::{Leaderboard, LeaderboardRow, PlatformError, Storage};

/// Maximum number of scores to keep
pub const MAX_HIGH_SCORES: usize = 10;
/// Score gap between consecutive bot rows
const BOT_SCORE_STEP: u64 = 120;

pub const LEADERBOARD_STORAGE_KEY: &str = "triangle-arena-leaderboard-v1";

/// A single score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalLeaderboard {
    /// Sorted descending by score
    pub entries: Vec<ScoreEntry>,
    /// Display name for submitted scores
    pub player_name: String,
    /// When false every call fails, like an unreachable backend
    #[serde(skip, default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl Default for LocalLeaderboard {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            player_name: "You".to_string(),
            available: true,
        }
    }
}

impl LocalLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a score qualifies for the board
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Insert a score. Returns the rank achieved (1-indexed) or None if it didn't qualify.
    pub fn add_score(&mut self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let entry = ScoreEntry {
            name: self.player_name.clone(),
            score,
        };

        let pos = self.entries.iter().position(|e| score > e.score);
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
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Real entries first, then bots trailing the best score
    pub fn rows(&self, count: usize) -> Vec<LeaderboardRow> {
        let top = self.top_score().unwrap_or(0);
        let mut rows: Vec<LeaderboardRow> = self
            .entries
            .iter()
            .take(count)
            .enumerate()
            .map(|(i, e)| LeaderboardRow {
                rank: i as u32 + 1,
                name: e.name.clone(),
                score: e.score,
            })
            .collect();

        while rows.len() < count {
            let idx = rows.len() as u64 + 1;
            rows.push(LeaderboardRow {
                rank: idx as u32,
                name: format!("Bot {}", idx),
                score: top.saturating_sub(idx * BOT_SCORE_STEP),
            });
        }
        rows
    }

    pub fn load(storage: &mut dyn Storage) -> Self {
        let loaded = storage
            .load_json(LEADERBOARD_STORAGE_KEY)
            .map_err(|err| log::warn!("Leaderboard load failed: {}", err))
            .ok()
            .flatten()
            .and_then(|raw| serde_json::from_value::<LocalLeaderboard>(raw).ok());
        match loaded {
            Some(board) => {
                log::info!("Loaded {} leaderboard entries", board.entries.len());
                board
            }
            None => Self::new(),
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) -> Result<(), PlatformError> {
        let value = serde_json::to_value(self)?;
        storage.save_json(LEADERBOARD_STORAGE_KEY, &value)
    }
}

impl Leaderboard for LocalLeaderboard {
    fn submit_score(&mut self, score: u64) -> Result<(), PlatformError> {
        if !self.available {
            return Err(PlatformError::Unavailable("leaderboard".into()));
        }
        if let Some(rank) = self.add_score(score) {
            log::info!("Score {} entered the leaderboard at rank {}", score, rank);
        }
        Ok(())
    }

    fn top(&self, count: usize) -> Result<Vec<LeaderboardRow>, PlatformError> {
        if !self.available {
            return Err(PlatformError::Unavailable("leaderboard".into()));
        }
        Ok(self.rows(count))
    }
}
