//! Run and world state
//!
//! `RunState` holds the per-run counters and the pause/ending latches.
//! `World` owns the player and the entity pools. `GameState` ties both
//! together with the clock, timers and the seeded RNG.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::enemy::{Enemy, EnemyKind, KindCycle};
use super::pool::{Pool, PoolCategory};
use super::projectile::{Bullet, Pickup, PickupSpawner, PlayerWeapon};
use super::wave::{EnemyPattern, WaveConfig, wave_config};
use crate::consts::*;
use crate::tuning::Tuning;

/// Visual tint carried by pooled entities; cleared on recycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tint {
    #[default]
    None,
    PlayerShot,
    Rocket,
    EnemyShot,
    BlueShot,
    PurpleShot,
    GreenShot,
    BlueHull,
    PurpleHull,
    GreenHull,
    HitFlash,
}

/// Top-level run phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Waiting to start (e.g. behind a restart interstitial)
    Idle,
    /// Active gameplay
    Running,
}

/// Layered pause state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PauseState {
    #[default]
    None,
    /// Toggled by explicit pause input
    Manual,
    /// Lethal damage taken, waiting on the rewarded-ad outcome
    ReviveOffer,
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Win,
    Loss,
}

/// Result of crediting one kill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KillResult {
    /// New wave index if this kill crossed a wave boundary
    pub wave_advanced: Option<u32>,
    /// Kill threshold reached
    pub win: bool,
}

/// Result of applying damage to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageResult {
    Survived,
    ReviveOffered,
    Defeated,
}

/// Per-run counters and latches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub kills: u32,
    pub hp: u32,
    pub max_hp: u32,
    pub wave: u32,
    pub wave_config: WaveConfig,
    pub rocket_charges: u32,
    pub revive_used: bool,
    pub revive_enabled: bool,
    pub pause: PauseState,
    pub phase: RunPhase,
    pub kills_to_win: u32,
    /// Credits a loss would award right now
    pub credits_preview: u64,
    /// One-way terminal latch
    ending: Option<RunOutcome>,
}

impl RunState {
    pub fn new(max_hp: u32, kills_to_win: u32, revive_enabled: bool) -> Self {
        let max_hp = max_hp.max(1);
        let config = wave_config(0);
        Self {
            kills: 0,
            hp: max_hp,
            max_hp,
            wave: config.wave,
            wave_config: config,
            rocket_charges: 0,
            revive_used: false,
            revive_enabled,
            pause: PauseState::None,
            phase: RunPhase::Idle,
            kills_to_win: kills_to_win.max(1),
            credits_preview: 0,
            ending: None,
        }
    }

    pub fn is_ending(&self) -> bool {
        self.ending.is_some()
    }

    pub fn outcome(&self) -> Option<RunOutcome> {
        self.ending
    }

    /// Latch the run as ending. Returns false if it was already latched.
    pub fn begin_ending(&mut self, outcome: RunOutcome) -> bool {
        if self.ending.is_some() {
            return false;
        }
        self.ending = Some(outcome);
        true
    }

    /// A win or loss condition was reached and is waiting to be finalised
    pub fn is_decided(&self) -> bool {
        self.hp == 0 || self.kills >= self.kills_to_win
    }

    /// Whether the world should advance this tick
    pub fn is_simulating(&self) -> bool {
        self.phase == RunPhase::Running
            && self.pause == PauseState::None
            && self.ending.is_none()
            && !self.is_decided()
    }

    /// Toggle manual pause. Returns the new paused flag, or `None` if the toggle is not allowed.
    pub fn toggle_pause(&mut self) -> Option<bool> {
        if self.ending.is_some() || self.phase != RunPhase::Running || self.is_decided() {
            return None;
        }
        match self.pause {
            PauseState::None => {
                self.pause = PauseState::Manual;
                Some(true)
            }
            PauseState::Manual => {
                self.pause = PauseState::None;
                Some(false)
            }
            PauseState::ReviveOffer => None,
        }
    }

    pub fn register_kill(&mut self) -> KillResult {
        self.kills += 1;
        let config = wave_config(self.kills);
        let wave_advanced = (config.wave != self.wave).then_some(config.wave);
        self.wave = config.wave;
        self.wave_config = config;
        self.credits_preview = crate::progress::run_credits_reward(self.kills, false);
        KillResult {
            wave_advanced,
            win: self.kills >= self.kills_to_win,
        }
    }

    /// Apply damage. Revive eligibility is checked before a defeat is reported.
    pub fn apply_damage(&mut self, amount: u32) -> DamageResult {
        self.hp = self.hp.saturating_sub(amount);
        if self.hp > 0 {
            return DamageResult::Survived;
        }
        if self.revive_enabled && !self.revive_used && self.pause != PauseState::ReviveOffer {
            self.revive_used = true;
            self.pause = PauseState::ReviveOffer;
            return DamageResult::ReviveOffered;
        }
        DamageResult::Defeated
    }

    /// Restore at least half of max hp and resume
    pub fn grant_revive(&mut self) {
        self.hp = self.hp.max(self.max_hp.div_ceil(2)).max(1);
        self.pause = PauseState::None;
    }
}

/// Playable rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
        }
    }
}

impl Arena {
    /// Sides that are non-finite or smaller than `MIN_ARENA_SIDE` fall back to the defaults
    pub fn new(width: f32, height: f32) -> Self {
        let side = |value: f32, fallback: f32| {
            if value.is_finite() && value >= MIN_ARENA_SIDE {
                value
            } else {
                fallback
            }
        };
        Self {
            width: side(width, ARENA_WIDTH),
            height: side(height, ARENA_HEIGHT),
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Wrap a position that left the arena by more than the wrap margin
    pub fn wrap(&self, mut pos: Vec2) -> Vec2 {
        let m = WRAP_MARGIN;
        if pos.x < -m {
            pos.x = self.width + m;
        } else if pos.x > self.width + m {
            pos.x = -m;
        }
        if pos.y < -m {
            pos.y = self.height + m;
        } else if pos.y > self.height + m {
            pos.y = -m;
        }
        pos
    }

    pub fn contains(&self, pos: Vec2, margin: f32) -> bool {
        pos.x >= -margin && pos.x <= self.width + margin && pos.y >= -margin && pos.y <= self.height + margin
    }

    /// Random point just inside one of the four edges
    pub fn random_edge_point<R: Rng>(&self, rng: &mut R) -> Vec2 {
        let along_x = inset_draw(rng, self.width, SPAWN_MARGIN);
        let along_y = inset_draw(rng, self.height, SPAWN_MARGIN);
        let mx = SPAWN_MARGIN.min(self.width / 2.0);
        let my = SPAWN_MARGIN.min(self.height / 2.0);
        match rng.random_range(0..4) {
            0 => Vec2::new(mx, along_y),
            1 => Vec2::new(self.width - mx, along_y),
            2 => Vec2::new(along_x, my),
            _ => Vec2::new(along_x, self.height - my),
        }
    }

    /// Random point at least `margin` away from every edge, or the center line
    /// on a side too short for the margin
    pub fn random_inner_point<R: Rng>(&self, rng: &mut R, margin: f32) -> Vec2 {
        Vec2::new(
            inset_draw(rng, self.width, margin),
            inset_draw(rng, self.height, margin),
        )
    }
}

/// Uniform draw in `[margin, side - margin]`, clamped so the range is never empty
fn inset_draw<R: Rng>(rng: &mut R, side: f32, margin: f32) -> f32 {
    let side = side.max(0.0);
    let margin = margin.clamp(0.0, side / 2.0);
    let (low, high) = (margin, side - margin);
    if high > low { rng.random_range(low..=high) } else { side / 2.0 }
}

/// The player ship
#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Facing (aim angle + 90°)
    pub rotation: f32,
    pub radius: f32,
    pub active: bool,
}

impl Player {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            rotation: 0.0,
            radius: PLAYER_RADIUS,
            active: true,
        }
    }
}

/// Player plus every pooled entity category
#[derive(Debug, Clone)]
pub struct World {
    pub arena: Arena,
    pub player: Player,
    pub enemies: Pool<Enemy>,
    pub player_bullets: Pool<Bullet>,
    pub enemy_bullets: Pool<Bullet>,
    pub pickups: Pool<Pickup>,
}

impl World {
    pub fn new(arena: Arena) -> Self {
        Self {
            arena,
            player: Player::new(arena.center()),
            enemies: Pool::with_capacity(ENEMY_POOL),
            player_bullets: Pool::with_capacity(PLAYER_BULLET_POOL),
            enemy_bullets: Pool::with_capacity(ENEMY_BULLET_POOL),
            pickups: Pool::with_capacity(PICKUP_POOL),
        }
    }

    pub fn active_count(&self, category: PoolCategory) -> usize {
        match category {
            PoolCategory::PlayerBullet => self.player_bullets.active_count(),
            PoolCategory::EnemyBullet => self.enemy_bullets.active_count(),
            PoolCategory::Enemy => self.enemies.active_count(),
            PoolCategory::Pickup => self.pickups.active_count(),
        }
    }

    /// Recycle all enemies and enemy bullets (revive clears the field)
    pub fn clear_hostiles(&mut self) {
        self.enemies.release_all();
        self.enemy_bullets.release_all();
    }

    /// Zero all motion once the run is over
    pub fn freeze(&mut self) {
        self.player.vel = Vec2::ZERO;
        for (_, enemy) in self.enemies.iter_mut() {
            enemy.vel = Vec2::ZERO;
        }
    }
}

/// Things that happened during a tick, for the run state machine and presentation
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    EnemySpawned { kind: EnemyKind, pattern: EnemyPattern },
    EnemyHit { kind: EnemyKind, hp_left: u32 },
    EnemyDestroyed { kind: EnemyKind, kills: u32 },
    WaveAdvanced { wave: u32 },
    PlayerDamaged { hp: u32 },
    PickupSpawned,
    RocketsCollected { charges: u32 },
    Paused,
    Resumed,
    ReviveOffered,
    WinReached,
    Defeated,
}

/// Complete simulation state for one run
#[derive(Debug, Clone)]
pub struct GameState {
    pub seed: u64,
    pub run: RunState,
    pub world: World,
    pub rng: Pcg32,
    /// Simulation clock in ms; frozen while paused
    pub clock_ms: f64,
    pub started_at_ms: f64,
    pub next_spawn_at: f64,
    pub pickup_spawner: PickupSpawner,
    pub weapon: PlayerWeapon,
    pub kind_cycle: KindCycle,
}

impl GameState {
    pub fn new(seed: u64, max_hp: u32, tuning: &Tuning) -> Self {
        let arena = Arena::new(tuning.arena_width, tuning.arena_height);
        Self {
            seed,
            run: RunState::new(max_hp, tuning.kills_to_win, tuning.revive_enabled),
            world: World::new(arena),
            rng: Pcg32::seed_from_u64(seed),
            clock_ms: 0.0,
            started_at_ms: 0.0,
            next_spawn_at: 0.0,
            pickup_spawner: PickupSpawner::new(0.0),
            weapon: PlayerWeapon::default(),
            kind_cycle: KindCycle::default(),
        }
    }

    /// Leave idle and arm the spawn and pickup timers
    pub fn start(&mut self) {
        if self.run.phase == RunPhase::Running || self.run.is_ending() {
            return;
        }
        self.run.phase = RunPhase::Running;
        self.started_at_ms = self.clock_ms;
        self.next_spawn_at = self.clock_ms + self.run.wave_config.spawn_delay_ms;
        self.pickup_spawner = PickupSpawner::new(self.clock_ms);
    }

    /// Simulated time since gameplay started (paused time excluded)
    pub fn elapsed_ms(&self) -> f64 {
        (self.clock_ms - self.started_at_ms).max(0.0)
    }

    /// Apply a granted revive: restore hp, clear hostiles, resume
    pub fn revive(&mut self) {
        self.run.grant_revive();
        self.world.clear_hostiles();
        self.next_spawn_at = self.clock_ms + self.run.wave_config.spawn_delay_ms;
    }
}
