//! Run tuning
//!
//! Data-driven knobs for a run, stored as JSON next to the progress record.
//! Every field has a default, so partial documents are fine.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::platform::{PlatformError, SceneKey, Storage};

/// Storage key of the tuning document
pub const TUNING_STORAGE_KEY: &str = "triangle-arena-tuning-v1";

/// Run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tuning {
    /// Kills needed to win (30 lets every enemy kind unlock)
    pub kills_to_win: u32,
    /// Score is this minus the elapsed run time in ms
    pub score_base_ms: f64,
    pub revive_enabled: bool,
    pub player_base_hp: u32,

    // === Collaborator timeouts ===
    pub rewarded_timeout_ms: f64,
    pub interstitial_timeout_ms: f64,
    /// How long a started scene may take to report active
    pub scene_watchdog_ms: f64,
    pub fallback_scene: SceneKey,

    // === World ===
    pub arena_width: f32,
    pub arena_height: f32,
    pub seed: u64,
    /// Rows requested from the leaderboard after a win
    pub leaderboard_rows: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            kills_to_win: 30,
            score_base_ms: 240_000.0,
            revive_enabled: true,
            player_base_hp: PLAYER_BASE_HP,

            rewarded_timeout_ms: 12_000.0,
            interstitial_timeout_ms: 3_500.0,
            scene_watchdog_ms: 1_500.0,
            fallback_scene: SceneKey::MainMenu,

            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,
            seed: 0x7A1A_2024,
            leaderboard_rows: 5,
        }
    }
}

impl Tuning {
    /// Parse a tuning document and clamp it to usable values
    pub fn from_json(json: &str) -> Result<Self, PlatformError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        Ok(tuning.normalized())
    }

    /// Clamp out-of-range values instead of rejecting them
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        self.kills_to_win = self.kills_to_win.max(1);
        self.player_base_hp = self.player_base_hp.max(1);
        for (value, fallback) in [
            (&mut self.score_base_ms, defaults.score_base_ms),
            (&mut self.rewarded_timeout_ms, defaults.rewarded_timeout_ms),
            (&mut self.interstitial_timeout_ms, defaults.interstitial_timeout_ms),
            (&mut self.scene_watchdog_ms, defaults.scene_watchdog_ms),
        ] {
            if !value.is_finite() || *value < 0.0 {
                *value = fallback;
            }
        }
        // Pickups need room for their margin on both sides
        if !(self.arena_width.is_finite() && self.arena_width >= MIN_ARENA_SIDE) {
            self.arena_width = defaults.arena_width;
        }
        if !(self.arena_height.is_finite() && self.arena_height >= MIN_ARENA_SIDE) {
            self.arena_height = defaults.arena_height;
        }
        self
    }

    /// Load from storage; anything missing or malformed falls back to defaults
    pub fn load(storage: &mut dyn Storage) -> Self {
        match storage.load_json(TUNING_STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_value::<Tuning>(raw) {
                Ok(tuning) => {
                    log::info!("Loaded tuning");
                    tuning.normalized()
                }
                Err(err) => {
                    log::warn!("Malformed tuning, using defaults: {}", err);
                    Self::default()
                }
            },
            Ok(None) => {
                log::info!("Using default tuning");
                Self::default()
            }
            Err(err) => {
                log::warn!("Tuning load failed, using defaults: {}", err);
                Self::default()
            }
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) -> Result<(), PlatformError> {
        let value = serde_json::to_value(self)?;
        storage.save_json(TUNING_STORAGE_KEY, &value)?;
        log::info!("Tuning saved");
        Ok(())
    }
}
