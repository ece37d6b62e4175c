//! Meta-progression ledger
//!
//! Credit rewards and the hull-upgrade economy, plus the persistent progress
//! record they mutate. Loaded records are hydrated field by field so a
//! partially broken save keeps whatever is still valid.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize_count;

/// Highest purchasable hull upgrade level
pub const MAX_HP_UPGRADE_CAP: u32 = 80;
pub const HP_UPGRADE_BASE_COST: u64 = 35;
pub const HP_UPGRADE_STEP_COST: u64 = 20;
pub const CREDITS_PER_KILL: u64 = 4;
pub const WIN_CREDITS_BONUS: u64 = 20;

/// Cost of the next hull upgrade from `level`
pub fn next_hp_upgrade_cost(level: u32) -> u64 {
    HP_UPGRADE_BASE_COST + level as u64 * HP_UPGRADE_STEP_COST
}

pub fn can_buy_upgrade(credits: u64, level: u32) -> bool {
    level < MAX_HP_UPGRADE_CAP && credits >= next_hp_upgrade_cost(level)
}

/// Credits earned by a finished run
pub fn run_credits_reward(kills: u32, did_win: bool) -> u64 {
    let base = kills as u64 * CREDITS_PER_KILL;
    if did_win { base + WIN_CREDITS_BONUS } else { base }
}

/// Persistent progress record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentProgress {
    pub best_score: u64,
    pub total_wins: u64,
    pub total_losses: u64,
    pub total_kills: u64,
    pub credits: u64,
    pub hp_upgrade_level: u32,
    pub sound_enabled: bool,
}

impl Default for PersistentProgress {
    fn default() -> Self {
        Self {
            best_score: 0,
            total_wins: 0,
            total_losses: 0,
            total_kills: 0,
            credits: 0,
            hp_upgrade_level: 0,
            sound_enabled: true,
        }
    }
}

impl PersistentProgress {
    /// Record a won run. Returns the credits awarded.
    pub fn record_win(&mut self, score: u64, kills: u32) -> u64 {
        self.total_wins += 1;
        self.total_kills += kills as u64;
        self.best_score = self.best_score.max(score);
        let reward = run_credits_reward(kills, true);
        self.credits += reward;
        reward
    }

    /// Record a lost run. Returns the credits awarded.
    pub fn record_loss(&mut self, kills: u32) -> u64 {
        self.total_losses += 1;
        self.total_kills += kills as u64;
        let reward = run_credits_reward(kills, false);
        self.credits += reward;
        reward
    }

    pub fn next_hp_upgrade_cost(&self) -> u64 {
        next_hp_upgrade_cost(self.hp_upgrade_level)
    }

    pub fn can_purchase_hp_upgrade(&self) -> bool {
        can_buy_upgrade(self.credits, self.hp_upgrade_level)
    }

    /// Debit the cost and raise the level, or change nothing
    pub fn purchase_hp_upgrade(&mut self) -> bool {
        if !self.can_purchase_hp_upgrade() {
            return false;
        }
        self.credits = self.credits.saturating_sub(self.next_hp_upgrade_cost());
        self.hp_upgrade_level += 1;
        true
    }

    /// Flip the sound preference and return the new value
    pub fn toggle_sound(&mut self) -> bool {
        self.sound_enabled = !self.sound_enabled;
        self.sound_enabled
    }

    pub fn player_max_hp(&self, base_hp: u32) -> u32 {
        base_hp + self.hp_upgrade_level
    }

    /// Rebuild a record from untrusted JSON, falling back per field
    pub fn hydrate(raw: &Value) -> Self {
        let defaults = Self::default();

        Self {
            best_score: safe_count(raw.get("bestScore"), defaults.best_score),
            total_wins: safe_count(raw.get("totalWins"), defaults.total_wins),
            total_losses: safe_count(raw.get("totalLosses"), defaults.total_losses),
            total_kills: safe_count(raw.get("totalKills"), defaults.total_kills),
            credits: safe_count(raw.get("credits"), defaults.credits),
            hp_upgrade_level: safe_count(raw.get("hpUpgradeLevel"), defaults.hp_upgrade_level as u64)
                .min(MAX_HP_UPGRADE_CAP as u64) as u32,
            sound_enabled: raw.get("soundEnabled")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.sound_enabled),
        }
    }
}

/// Numbers and numeric strings become non-negative integers; anything else falls back
fn safe_count(value: Option<&Value>, fallback: u64) -> u64 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    raw.map_or(fallback, |raw| normalize_count(raw, fallback))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_upgrade_costs() {
        assert_eq!(next_hp_upgrade_cost(0), 35);
        assert_eq!(next_hp_upgrade_cost(3), 95);
    }

    #[test]
    fn test_can_buy_upgrade() {
        assert!(!can_buy_upgrade(10, 0));
        assert!(!can_buy_upgrade(200, MAX_HP_UPGRADE_CAP));
        assert!(can_buy_upgrade(100, 1));
    }

    #[test]
    fn test_run_credits_reward() {
        assert_eq!(run_credits_reward(5, false), 20);
        assert!(run_credits_reward(5, true) > run_credits_reward(5, false));
        assert_eq!(run_credits_reward(0, true), WIN_CREDITS_BONUS);
    }

    #[test]
    fn test_purchase_is_all_or_nothing() {
        let mut progress = PersistentProgress {
            credits: 34,
            ..Default::default()
        };
        assert!(!progress.purchase_hp_upgrade());
        assert_eq!(progress.credits, 34);
        assert_eq!(progress.hp_upgrade_level, 0);

        progress.credits = 100;
        assert!(progress.purchase_hp_upgrade());
        assert_eq!(progress.credits, 65);
        assert_eq!(progress.hp_upgrade_level, 1);
        assert_eq!(progress.player_max_hp(3), 4);
    }

    #[test]
    fn test_record_win_and_loss() {
        let mut progress = PersistentProgress::default();
        assert_eq!(progress.record_win(1200, 30), 140);
        assert_eq!(progress.record_win(900, 30), 140);
        assert_eq!(progress.record_loss(5), 20);

        assert_eq!(progress.best_score, 1200);
        assert_eq!(progress.total_wins, 2);
        assert_eq!(progress.total_losses, 1);
        assert_eq!(progress.total_kills, 65);
        assert_eq!(progress.credits, 300);
    }

    #[test]
    fn test_toggle_sound() {
        let mut progress = PersistentProgress::default();
        assert!(!progress.toggle_sound());
        assert!(progress.toggle_sound());
    }

    #[test]
    fn test_hydrate_falls_back_per_field() {
        let raw = json!({
            "bestScore": 1500.7,
            "totalWins": -4,
            "totalLosses": "3",
            "totalKills": "lots",
            "credits": null,
            "hpUpgradeLevel": 500,
            "soundEnabled": "no"
        });
        let progress = PersistentProgress::hydrate(&raw);
        assert_eq!(progress.best_score, 1500);
        assert_eq!(progress.total_wins, 0);
        assert_eq!(progress.total_losses, 3);
        assert_eq!(progress.total_kills, 0);
        assert_eq!(progress.credits, 0);
        assert_eq!(progress.hp_upgrade_level, MAX_HP_UPGRADE_CAP);
        assert!(progress.sound_enabled);
    }

    #[test]
    fn test_hydrate_non_object_is_default() {
        assert_eq!(PersistentProgress::hydrate(&json!([1, 2])), PersistentProgress::default());
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(PersistentProgress::default()).unwrap();
        assert_eq!(value["hpUpgradeLevel"], 0);
        assert_eq!(value["soundEnabled"], true);
        assert_eq!(PersistentProgress::hydrate(&value), PersistentProgress::default());
    }

    proptest! {
        #[test]
        fn prop_win_pays_more(kills in 0u32..10_000) {
            prop_assert!(run_credits_reward(kills, true) > run_credits_reward(kills, false));
        }

        #[test]
        fn prop_purchase_never_overdraws(credits in 0u64..5_000, level in 0u32..100) {
            let mut progress = PersistentProgress {
                credits,
                hp_upgrade_level: level.min(MAX_HP_UPGRADE_CAP),
                ..Default::default()
            };
            let before = progress.clone();
            if progress.purchase_hp_upgrade() {
                prop_assert_eq!(progress.credits, before.credits - next_hp_upgrade_cost(before.hp_upgrade_level));
                prop_assert_eq!(progress.hp_upgrade_level, before.hp_upgrade_level + 1);
            } else {
                prop_assert_eq!(progress, before);
            }
        }
    }
}
