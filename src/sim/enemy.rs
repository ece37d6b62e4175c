//! Enemy AI
//!
//! Per-enemy behaviour state and the per-tick steering and firing decisions.
//! Movement is driven by the enemy's pattern, projectiles by its kind.

use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::pool::Recycle;
use super::state::Tint;
use super::wave::{EnemyPattern, FireDelayRange, WaveConfig};
use crate::consts::*;
use crate::angle_between;

/// Strafers approach beyond this distance
pub const STRAFER_FAR: f32 = 220.0;
/// Strafers back off inside this distance
pub const STRAFER_NEAR: f32 = 140.0;
const STRAFER_APPROACH: f32 = 0.75;
const STRAFER_RETREAT: f32 = -0.6;
const STRAFER_DRIFT: f32 = 0.12;
const STRAFER_ORBIT: f32 = 0.95;

const DASHER_APPROACH: f32 = 0.6;
const DASHER_BURST: f32 = 2.4;
pub const DASH_DURATION_MS: f64 = 360.0;
const DASH_REARM_MS: (f64, f64) = (1300.0, 2300.0);
const FIRST_DASH_MS: (f64, f64) = (850.0, 1800.0);

const MIN_FIRE_DELAY_MS: f64 = 240.0;
const MIN_FIRE_SPREAD_MS: f64 = 90.0;

/// Blue shots travel slightly slower than standard ones
pub const BLUE_SHOT_SPEED: f32 = 0.94;
/// Green spread half-angle
pub const SPREAD_ANGLE_DEG: f32 = 16.0;
/// Lead prediction never looks further ahead than this
const MAX_LEAD_SECS: f32 = 0.6;

/// Visual/combat variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    #[default]
    Standard,
    Blue,
    Purple,
    Green,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 4] = [EnemyKind::Standard, EnemyKind::Blue, EnemyKind::Purple, EnemyKind::Green];

    /// First wave this kind may spawn in
    pub fn unlock_wave(&self) -> u32 {
        match self {
            EnemyKind::Standard => 1,
            EnemyKind::Blue => 2,
            EnemyKind::Purple => 3,
            EnemyKind::Green => 4,
        }
    }

    pub fn max_hp(&self) -> u32 {
        match self {
            EnemyKind::Blue => 3,
            _ => 1,
        }
    }

    pub fn hull_tint(&self) -> Tint {
        match self {
            EnemyKind::Standard => Tint::None,
            EnemyKind::Blue => Tint::BlueHull,
            EnemyKind::Purple => Tint::PurpleHull,
            EnemyKind::Green => Tint::GreenHull,
        }
    }

    pub fn shot_tint(&self) -> Tint {
        match self {
            EnemyKind::Standard => Tint::EnemyShot,
            EnemyKind::Blue => Tint::BlueShot,
            EnemyKind::Purple => Tint::PurpleShot,
            EnemyKind::Green => Tint::GreenShot,
        }
    }

    /// Kinds available in a wave, in declaration order
    pub fn unlocked(wave: u32) -> Vec<EnemyKind> {
        Self::ALL.into_iter().filter(|k| wave >= k.unlock_wave()).collect()
    }
}

/// Shuffled round-robin over the unlocked kinds
///
/// Every unlocked kind appears once per cycle. The cycle is reshuffled when
/// exhausted or when the unlocked set changes.
#[derive(Debug, Clone, Default)]
pub struct KindCycle {
    unlocked: Vec<EnemyKind>,
    queue: Vec<EnemyKind>,
}

impl KindCycle {
    pub fn next<R: Rng>(&mut self, wave: u32, rng: &mut R) -> EnemyKind {
        let unlocked = EnemyKind::unlocked(wave);
        if unlocked != self.unlocked {
            self.unlocked = unlocked;
            self.queue.clear();
        }
        if self.queue.is_empty() {
            self.queue = self.unlocked.clone();
            self.queue.shuffle(rng);
        }
        self.queue.pop().unwrap_or_default()
    }

    /// Kinds still due in the current cycle
    pub fn remaining(&self) -> &[EnemyKind] {
        &self.queue
    }
}

/// A pooled enemy
#[derive(Debug, Clone)]
pub struct Enemy {
    pub pos: Vec2,
    pub vel: Vec2,
    pub rotation: f32,
    pub radius: f32,
    pub kind: EnemyKind,
    pub pattern: EnemyPattern,
    pub hp: u32,
    pub max_hp: u32,
    pub next_shot_at: f64,
    pub dash_at: f64,
    pub dash_until: f64,
    pub dash_dir: Vec2,
    /// +1 or -1: which way strafers circle
    pub orbit_dir: f32,
    pub flash_until: f64,
    pub tint: Tint,
}

impl Default for Enemy {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            rotation: 0.0,
            radius: ENEMY_RADIUS,
            kind: EnemyKind::Standard,
            pattern: EnemyPattern::Chaser,
            hp: 1,
            max_hp: 1,
            next_shot_at: 0.0,
            dash_at: 0.0,
            dash_until: 0.0,
            dash_dir: Vec2::ZERO,
            orbit_dir: 1.0,
            flash_until: 0.0,
            tint: Tint::None,
        }
    }
}

impl Recycle for Enemy {
    fn recycle(&mut self) {
        *self = Enemy::default();
    }
}

impl Enemy {
    /// Initialise a freshly acquired slot
    pub fn activate<R: Rng>(
        &mut self,
        kind: EnemyKind,
        pattern: EnemyPattern,
        pos: Vec2,
        now: f64,
        fire_range: FireDelayRange,
        rng: &mut R,
    ) {
        self.pos = pos;
        self.kind = kind;
        self.pattern = pattern;
        self.max_hp = kind.max_hp();
        self.hp = self.max_hp;
        self.tint = kind.hull_tint();
        self.orbit_dir = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        self.next_shot_at = now + rearm_delay(kind, pattern, fire_range, rng);
        if pattern == EnemyPattern::Dasher {
            self.dash_at = now + rng.random_range(FIRST_DASH_MS.0..=FIRST_DASH_MS.1);
        }
    }

    /// Subtract damage. Returns true when the enemy is destroyed.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        self.hp = self.hp.saturating_sub(amount);
        self.hp == 0
    }

    pub fn flash(&mut self, now: f64) {
        self.flash_until = now + ENEMY_FLASH_MS;
        self.tint = Tint::HitFlash;
    }

    /// Restore the hull tint once a hit flash has run out
    pub fn update_flash(&mut self, now: f64) {
        if self.tint == Tint::HitFlash && now >= self.flash_until {
            self.tint = self.kind.hull_tint();
        }
    }

    pub fn is_dashing(&self, now: f64) -> bool {
        now < self.dash_until
    }

    /// Health bar fill, only for enemies with a multi-hit pool
    pub fn health_fraction(&self) -> Option<f32> {
        (self.max_hp > 1).then(|| self.hp as f32 / self.max_hp as f32)
    }
}

/// Set velocity and facing for this tick according to the enemy's pattern
pub fn steer<R: Rng>(enemy: &mut Enemy, player_pos: Vec2, now: f64, config: &WaveConfig, rng: &mut R) {
    let speed = ENEMY_SPEED * config.enemy_speed_multiplier;
    let to_player = player_pos - enemy.pos;
    let dir = to_player.normalize_or_zero();

    enemy.vel = match enemy.pattern {
        EnemyPattern::Chaser => dir * speed,
        EnemyPattern::Strafer => {
            let distance = to_player.length();
            let radial = if distance > STRAFER_FAR {
                STRAFER_APPROACH
            } else if distance < STRAFER_NEAR {
                STRAFER_RETREAT
            } else {
                STRAFER_DRIFT
            };
            let orbit = dir.perp() * enemy.orbit_dir;
            dir * (speed * radial) + orbit * (speed * STRAFER_ORBIT)
        }
        EnemyPattern::Dasher => {
            if now >= enemy.dash_at {
                enemy.dash_until = now + DASH_DURATION_MS;
                enemy.dash_at = now + rng.random_range(DASH_REARM_MS.0..=DASH_REARM_MS.1);
                enemy.dash_dir = dir;
            }
            if enemy.is_dashing(now) {
                enemy.dash_dir * (speed * DASHER_BURST)
            } else {
                dir * (speed * DASHER_APPROACH)
            }
        }
    };

    if enemy.vel.length_squared() > 0.0 {
        enemy.rotation = enemy.vel.to_angle() + std::f32::consts::FRAC_PI_2;
    }
}

/// What an enemy fires when its shot timer elapses
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShotPlan {
    /// One projectile straight at `target`
    Straight { target: Vec2, speed: f32 },
    /// Boomerang thrown at a lead-predicted target
    Boomerang { target: Vec2, speed: f32, range_multiplier: f32 },
    /// Simultaneous projectiles along each angle (radians)
    Spread { angles: [f32; 3], speed: f32 },
}

/// Predict where the player will be when a projectile of `speed` arrives
pub fn lead_target(origin: Vec2, player_pos: Vec2, player_vel: Vec2, speed: f32) -> Vec2 {
    if speed <= 0.0 {
        return player_pos;
    }
    let t = (origin.distance(player_pos) / speed).min(MAX_LEAD_SECS);
    player_pos + player_vel * t
}

/// Choose the shot an enemy fires at the player
pub fn plan_shot(enemy: &Enemy, player_pos: Vec2, player_vel: Vec2) -> ShotPlan {
    match enemy.kind {
        EnemyKind::Standard => ShotPlan::Straight {
            target: player_pos,
            speed: ENEMY_BULLET_SPEED,
        },
        EnemyKind::Blue => ShotPlan::Straight {
            target: player_pos,
            speed: ENEMY_BULLET_SPEED * BLUE_SHOT_SPEED,
        },
        EnemyKind::Purple => {
            let target = lead_target(enemy.pos, player_pos, player_vel, ENEMY_BULLET_SPEED);
            // Far targets get a longer straight leg before the curve
            let range_multiplier = (enemy.pos.distance(target) / 280.0).clamp(0.8, 1.4);
            ShotPlan::Boomerang {
                target,
                speed: ENEMY_BULLET_SPEED,
                range_multiplier,
            }
        }
        EnemyKind::Green => {
            let base = angle_between(enemy.pos, player_pos);
            let spread = SPREAD_ANGLE_DEG.to_radians();
            ShotPlan::Spread {
                angles: [base - spread, base, base + spread],
                speed: ENEMY_BULLET_SPEED,
            }
        }
    }
}

/// Delay until an enemy's next shot
///
/// The wave's base window is scaled per pattern and per kind, floored at
/// 240ms with at least 90ms between the window bounds.
pub fn rearm_delay<R: Rng>(kind: EnemyKind, pattern: EnemyPattern, range: FireDelayRange, rng: &mut R) -> f64 {
    let pattern_factor = match pattern {
        EnemyPattern::Chaser => 1.0,
        EnemyPattern::Strafer => 0.9,
        EnemyPattern::Dasher => 1.1,
    };
    let kind_factor = match kind {
        EnemyKind::Blue => rng.random_range(1.05..=1.1),
        EnemyKind::Purple => rng.random_range(1.2..=1.35),
        EnemyKind::Standard | EnemyKind::Green => 1.0,
    };
    let factor = pattern_factor * kind_factor;

    let min_ms = (range.min_ms * factor).round().max(MIN_FIRE_DELAY_MS);
    let max_ms = (range.max_ms * factor).round().max(min_ms + MIN_FIRE_SPREAD_MS);
    rng.random_range(min_ms..=max_ms)
}
