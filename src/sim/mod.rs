//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by pool slot)
//! - No platform dependencies

pub mod collision;
pub mod enemy;
pub mod pool;
pub mod projectile;
pub mod state;
pub mod tick;
pub mod wave;

pub use enemy::{Enemy, EnemyKind, KindCycle, ShotPlan};
pub use pool::{Handle, Pool, PoolCategory, Recycle};
pub use projectile::{Bullet, Owner, Pickup, PlayerWeapon};
pub use state::{GameEvent, GameState, PauseState, RunOutcome, RunPhase, RunState, Tint, World};
pub use tick::{TickInput, tick};
pub use wave::{EnemyPattern, WaveConfig, pick_pattern, wave_config, wave_for_kills};
