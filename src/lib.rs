//! Triangle Arena - a single-player arena shooter core
//!
//! Core modules:
//! - `sim`: Deterministic run simulation (waves, enemy AI, projectiles, collisions)
//! - `progress`: Meta-progression ledger (credits, hull upgrades)
//! - `persistence`: Progress record load/save with field-by-field fallback
//! - `platform`: Collaborator capabilities (storage, leaderboard, ads, scenes)
//! - `session`: Run state machine (pause/revive, finalisation, scene watchdog)
//! - `tuning`: Data-driven run configuration

pub mod leaderboard;
pub mod persistence;
pub mod platform;
pub mod progress;
pub mod session;
pub mod sim;
pub mod tuning;

pub use leaderboard::LocalLeaderboard;
pub use progress::PersistentProgress;
pub use session::{RunSession, RunSummary};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one tick per rendered frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Arena dimensions
    pub const ARENA_WIDTH: f32 = 960.0;
    pub const ARENA_HEIGHT: f32 = 540.0;
    /// Sprites wrap once they leave the arena by this much
    pub const WRAP_MARGIN: f32 = 28.0;
    /// Enemies spawn this far inside an arena edge
    pub const SPAWN_MARGIN: f32 = 24.0;
    /// Rocket pickups spawn at least this far from every edge
    pub const PICKUP_SPAWN_MARGIN: f32 = 60.0;
    /// Smallest usable arena side; leaves room inside the pickup margin
    pub const MIN_ARENA_SIDE: f32 = 160.0;

    /// Player defaults
    pub const PLAYER_SPEED: f32 = 260.0;
    pub const PLAYER_BULLET_SPEED: f32 = 560.0;
    pub const PLAYER_BASE_HP: u32 = 3;
    pub const PLAYER_SHOT_COOLDOWN_MS: f64 = 180.0;
    /// Physics body is 72% of a 40px sprite
    pub const PLAYER_RADIUS: f32 = 14.4;

    /// Enemy defaults
    pub const ENEMY_SPEED: f32 = 92.0;
    pub const ENEMY_BULLET_SPEED: f32 = 240.0;
    pub const ENEMY_RADIUS: f32 = 14.0;
    pub const BASE_SPAWN_DELAY_MS: f64 = 1400.0;
    pub const ENEMY_FIRE_MIN_MS: f64 = 1100.0;
    pub const ENEMY_FIRE_MAX_MS: f64 = 1800.0;
    pub const BASE_MAX_ENEMIES: u32 = 6;
    /// Enemy hit flash duration
    pub const ENEMY_FLASH_MS: f64 = 90.0;

    /// Wave scaling
    pub const KILLS_PER_WAVE: u32 = 4;
    pub const MIN_SPAWN_DELAY_MS: f64 = 560.0;
    pub const MAX_ENEMIES_CAP: u32 = 12;
    pub const SPAWN_DELAY_STEP_MS: f64 = 120.0;

    /// Bullets
    pub const BULLET_LIFETIME_MS: f64 = 1700.0;
    pub const BULLET_RADIUS: f32 = 4.0;

    /// Rockets and the pickup that grants them
    pub const ROCKET_PICKUP_INTERVAL_MS: f64 = 16_500.0;
    pub const ROCKET_PICKUP_LIFETIME_MS: f64 = 12_000.0;
    pub const ROCKET_PICKUP_CHARGES: u32 = 6;
    pub const ROCKET_PICKUP_RADIUS: f32 = 14.0;
    pub const ROCKET_SIDE_OFFSET: f32 = 8.0;
    pub const ROCKET_SPEED_MULT: f32 = 1.42;
    pub const ROCKET_DAMAGE: u32 = 2;
    pub const ROCKET_LIFETIME_MULT: f64 = 1.35;

    /// Pool capacities
    pub const PLAYER_BULLET_POOL: usize = 64;
    pub const ENEMY_BULLET_POOL: usize = 96;
    pub const ENEMY_POOL: usize = 16;
    pub const PICKUP_POOL: usize = 1;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Angle of the ray from `from` to `to`
#[inline]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Velocity vector of `speed` along `angle`
#[inline]
pub fn velocity_from_angle(angle: f32, speed: f32) -> Vec2 {
    Vec2::from_angle(angle) * speed
}

/// Floor an untrusted count to a non-negative integer (non-finite becomes `fallback`)
pub fn normalize_count(raw: f64, fallback: u64) -> u64 {
    if !raw.is_finite() {
        return fallback;
    }
    raw.max(0.0).floor() as u64
}
