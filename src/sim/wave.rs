//! Wave director
//!
//! Difficulty parameters derived purely from the cumulative kill count. A new
//! wave starts every `KILLS_PER_WAVE` kills; everything else follows from
//! `wave - 1`.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Enemy movement/targeting behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyPattern {
    #[default]
    Chaser,
    Strafer,
    Dasher,
}

impl EnemyPattern {
    /// Declaration order, which is also the weighted-draw bucket order
    pub const ALL: [EnemyPattern; 3] = [EnemyPattern::Chaser, EnemyPattern::Strafer, EnemyPattern::Dasher];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyPattern::Chaser => "chaser",
            EnemyPattern::Strafer => "strafer",
            EnemyPattern::Dasher => "dasher",
        }
    }
}

/// Relative spawn weights per pattern
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PatternWeights {
    pub chaser: f32,
    pub strafer: f32,
    pub dasher: f32,
}

impl PatternWeights {
    pub fn get(&self, pattern: EnemyPattern) -> f32 {
        match pattern {
            EnemyPattern::Chaser => self.chaser,
            EnemyPattern::Strafer => self.strafer,
            EnemyPattern::Dasher => self.dasher,
        }
    }

    /// Sum of the non-negative weights
    pub fn total(&self) -> f32 {
        EnemyPattern::ALL.iter().map(|p| self.get(*p).max(0.0)).sum()
    }
}

/// Difficulty parameters for one wave
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveConfig {
    pub wave: u32,
    pub spawn_delay_ms: f64,
    pub max_enemies_on_field: u32,
    pub enemy_speed_multiplier: f32,
    pub enemy_fire_rate_multiplier: f32,
    pub pattern_weights: PatternWeights,
}

impl Default for WaveConfig {
    fn default() -> Self {
        wave_config(0)
    }
}

/// Enemy fire delay window in milliseconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireDelayRange {
    pub min_ms: f64,
    pub max_ms: f64,
}

/// Wave index (1-based) for a cumulative kill count
pub fn wave_for_kills(kills: u32) -> u32 {
    kills / KILLS_PER_WAVE + 1
}

/// Derive the full wave configuration for a cumulative kill count
pub fn wave_config(kills: u32) -> WaveConfig {
    let wave = wave_for_kills(kills);
    let progress = wave - 1;

    let dasher = if wave >= 2 { 1 + (wave - 2) / 2 } else { 0 };

    WaveConfig {
        wave,
        spawn_delay_ms: (BASE_SPAWN_DELAY_MS - progress as f64 * SPAWN_DELAY_STEP_MS)
            .max(MIN_SPAWN_DELAY_MS),
        max_enemies_on_field: (BASE_MAX_ENEMIES + progress / 2).min(MAX_ENEMIES_CAP),
        enemy_speed_multiplier: 1.0 + (progress as f32 * 0.08).min(0.55),
        enemy_fire_rate_multiplier: 1.0 + (progress as f32 * 0.07).min(0.50),
        pattern_weights: PatternWeights {
            chaser: 6u32.saturating_sub(progress).max(1) as f32,
            strafer: (2 + progress.min(4)) as f32,
            dasher: dasher as f32,
        },
    }
}

/// Base enemy fire delay window, shortened by the wave's fire-rate multiplier
pub fn fire_delay_range(config: &WaveConfig) -> FireDelayRange {
    let rate = config.enemy_fire_rate_multiplier as f64;
    let min_ms = (ENEMY_FIRE_MIN_MS / rate).round().max(320.0);
    let max_ms = (ENEMY_FIRE_MAX_MS / rate).round().max(min_ms + 120.0);
    FireDelayRange { min_ms, max_ms }
}

/// Weighted categorical draw of a pattern from a uniform value in `[0, 1)`
///
/// Buckets are walked in declaration order (chaser, strafer, dasher). A
/// config whose weights sum to zero yields `Chaser`.
pub fn pick_pattern(random_value: f32, config: &WaveConfig) -> EnemyPattern {
    let weights = &config.pattern_weights;
    let total = weights.total();
    if total <= 0.0 {
        return EnemyPattern::Chaser;
    }

    let draw = if random_value.is_finite() { random_value } else { 0.0 };
    let scaled = draw.clamp(0.0, 0.999_999) * total;

    let mut cursor = 0.0;
    for pattern in EnemyPattern::ALL {
        cursor += weights.get(pattern).max(0.0);
        if scaled < cursor {
            return pattern;
        }
    }

    EnemyPattern::Chaser
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_wave_for_kills() {
        assert_eq!(wave_for_kills(0), 1);
        assert_eq!(wave_for_kills(3), 1);
        assert_eq!(wave_for_kills(4), 2);
        assert_eq!(wave_for_kills(11), 3);
    }

    #[test]
    fn test_first_wave_values() {
        let config = wave_config(0);
        assert_eq!(config.wave, 1);
        assert_eq!(config.spawn_delay_ms, 1400.0);
        assert_eq!(config.max_enemies_on_field, 6);
        assert_eq!(config.enemy_speed_multiplier, 1.0);
        assert_eq!(config.pattern_weights.chaser, 6.0);
        assert_eq!(config.pattern_weights.strafer, 2.0);
        assert_eq!(config.pattern_weights.dasher, 0.0);
    }

    #[test]
    fn test_late_wave_values_are_capped() {
        let config = wave_config(400);
        assert_eq!(config.spawn_delay_ms, MIN_SPAWN_DELAY_MS);
        assert_eq!(config.max_enemies_on_field, MAX_ENEMIES_CAP);
        assert!((config.enemy_speed_multiplier - 1.55).abs() < 1e-6);
        assert!((config.enemy_fire_rate_multiplier - 1.5).abs() < 1e-6);
        assert_eq!(config.pattern_weights.chaser, 1.0);
        assert_eq!(config.pattern_weights.strafer, 6.0);
    }

    #[test]
    fn test_pressure_increases_by_wave() {
        let wave_one = wave_config(0);
        let wave_four = wave_config(13);

        assert!(wave_four.wave > wave_one.wave);
        assert!(wave_four.spawn_delay_ms < wave_one.spawn_delay_ms);
        assert!(wave_four.max_enemies_on_field >= wave_one.max_enemies_on_field);
        assert!(fire_delay_range(&wave_four).max_ms < fire_delay_range(&wave_one).max_ms);
    }

    #[test]
    fn test_fire_delay_range_wave_one() {
        let range = fire_delay_range(&wave_config(0));
        assert_eq!(range.min_ms, 1100.0);
        assert_eq!(range.max_ms, 1800.0);
    }

    #[test]
    fn test_pick_pattern_single_bucket() {
        let mut config = wave_config(10);
        config.pattern_weights = PatternWeights {
            chaser: 0.0,
            strafer: 100.0,
            dasher: 0.0,
        };
        assert_eq!(pick_pattern(0.5, &config), EnemyPattern::Strafer);
        assert_eq!(pick_pattern(0.0, &config), EnemyPattern::Strafer);
        assert_eq!(pick_pattern(0.999_999_9, &config), EnemyPattern::Strafer);
    }

    #[test]
    fn test_pick_pattern_bucket_order() {
        // wave 2: chaser 5, strafer 3, dasher 1 -> total 9
        let config = wave_config(4);
        assert_eq!(pick_pattern(0.0, &config), EnemyPattern::Chaser);
        assert_eq!(pick_pattern(4.9 / 9.0, &config), EnemyPattern::Chaser);
        assert_eq!(pick_pattern(5.1 / 9.0, &config), EnemyPattern::Strafer);
        assert_eq!(pick_pattern(8.5 / 9.0, &config), EnemyPattern::Dasher);
    }

    #[test]
    fn test_pick_pattern_zero_total_defaults_to_chaser() {
        let mut config = wave_config(0);
        config.pattern_weights = PatternWeights {
            chaser: 0.0,
            strafer: -1.0,
            dasher: 0.0,
        };
        assert_eq!(pick_pattern(0.7, &config), EnemyPattern::Chaser);
    }

    proptest! {
        #[test]
        fn prop_wave_for_kills_formula(kills in 0u32..100_000) {
            prop_assert_eq!(wave_for_kills(kills), kills / 4 + 1);
        }

        #[test]
        fn prop_difficulty_is_monotonic(k1 in 0u32..2_000, delta in 0u32..2_000) {
            let k2 = k1 + delta;
            let a = wave_config(k1);
            let b = wave_config(k2);
            prop_assert!(b.spawn_delay_ms <= a.spawn_delay_ms);
            prop_assert!(b.max_enemies_on_field >= a.max_enemies_on_field);
            prop_assert!(b.enemy_speed_multiplier >= a.enemy_speed_multiplier);
            prop_assert!(b.enemy_fire_rate_multiplier >= a.enemy_fire_rate_multiplier);
            prop_assert!(fire_delay_range(&b).max_ms <= fire_delay_range(&a).max_ms);
        }

        #[test]
        fn prop_pick_pattern_only_returns_weighted(kills in 0u32..200, draw in 0.0f32..1.0) {
            let config = wave_config(kills);
            let pattern = pick_pattern(draw, &config);
            prop_assert!(config.pattern_weights.get(pattern) > 0.0);
        }
    }
}
