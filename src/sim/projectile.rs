//! Projectiles, the player weapon and the rocket pickup
//!
//! Bullets fly straight until they expire, hit something or leave the arena.
//! Boomerangs fly straight, curve, then home back to a point next to where
//! they were thrown.

use glam::Vec2;
use rand::Rng;

use super::enemy::ShotPlan;
use super::pool::{Handle, Pool, Recycle};
use super::state::{Arena, Tint};
use crate::consts::*;
use crate::{angle_between, normalize_angle, velocity_from_angle};

/// Straight leg before a boomerang starts to curve (scaled by range)
const BOOMERANG_STRAIGHT_MS: (f64, f64) = (260.0, 460.0);
/// Duration of the curving leg
const BOOMERANG_CURVE_MS: (f64, f64) = (180.0, 260.0);
/// Return leg speed relative to the throw
pub const BOOMERANG_RETURN_SPEED: f32 = 1.15;
/// A returning boomerang is caught within this distance of its return point
pub const BOOMERANG_CATCH_RADIUS: f32 = 18.0;
/// Boomerangs live longer than plain bullets
const BOOMERANG_LIFETIME_MULT: f64 = 2.4;
/// Max heading correction on the return leg (rad/s)
const BOOMERANG_TURN_RATE: f32 = 7.0;
/// Return point sits this far to the side of the thrower
const BOOMERANG_RETURN_OFFSET: f32 = 24.0;

/// Who fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Owner {
    #[default]
    Player,
    Enemy,
}

/// Flight phase of a boomerang
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoomerangPhase {
    Outbound,
    Curving,
    Returning,
}

/// Extra state carried by boomerang projectiles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoomerangState {
    /// +1 or -1: direction of the curve
    pub spin_dir: f32,
    pub return_point: Vec2,
    pub curve_at: f64,
    pub turn_at: f64,
    /// Throw speed
    pub speed: f32,
    /// Angular velocity while curving (rad/s)
    pub curve_rate: f32,
    pub phase: BoomerangPhase,
}

impl BoomerangState {
    pub fn phase_at(&self, now: f64) -> BoomerangPhase {
        if now >= self.turn_at {
            BoomerangPhase::Returning
        } else if now >= self.curve_at {
            BoomerangPhase::Curving
        } else {
            BoomerangPhase::Outbound
        }
    }
}

/// A pooled projectile
#[derive(Debug, Clone, Default)]
pub struct Bullet {
    pub pos: Vec2,
    pub vel: Vec2,
    pub rotation: f32,
    pub owner: Owner,
    pub damage: u32,
    pub expires_at: f64,
    pub tint: Tint,
    pub boomerang: Option<BoomerangState>,
}

impl Recycle for Bullet {
    fn recycle(&mut self) {
        *self = Bullet::default();
    }
}

impl Bullet {
    pub fn is_boomerang(&self) -> bool {
        self.boomerang.is_some()
    }
}

/// Parameters for one bullet
#[derive(Debug, Clone, Copy)]
pub struct Shot {
    pub owner: Owner,
    pub origin: Vec2,
    pub target: Vec2,
    pub speed: f32,
    pub damage: u32,
    pub lifetime_multiplier: f64,
    pub tint: Tint,
}

impl Shot {
    pub fn new(owner: Owner, origin: Vec2, target: Vec2, speed: f32) -> Self {
        Self {
            owner,
            origin,
            target,
            speed,
            damage: 1,
            lifetime_multiplier: 1.0,
            tint: match owner {
                Owner::Player => Tint::PlayerShot,
                Owner::Enemy => Tint::EnemyShot,
            },
        }
    }

    /// A shot fired along `angle` instead of at a point
    pub fn along(owner: Owner, origin: Vec2, angle: f32, speed: f32) -> Self {
        Self::new(owner, origin, origin + Vec2::from_angle(angle), speed)
    }

    pub fn damage(mut self, damage: u32) -> Self {
        self.damage = damage.max(1);
        self
    }

    pub fn lifetime(mut self, multiplier: f64) -> Self {
        self.lifetime_multiplier = multiplier;
        self
    }

    pub fn tint(mut self, tint: Tint) -> Self {
        self.tint = tint;
        self
    }
}

/// Spawn a bullet heading from origin to target. `None` when the pool is exhausted.
pub fn create_bullet(pool: &mut Pool<Bullet>, now: f64, shot: Shot) -> Option<Handle> {
    let Some((handle, bullet)) = pool.acquire() else {
        log::debug!("{:?} bullet pool exhausted", shot.owner);
        return None;
    };
    let angle = angle_between(shot.origin, shot.target);
    bullet.pos = shot.origin;
    bullet.vel = velocity_from_angle(angle, shot.speed);
    bullet.rotation = angle;
    bullet.owner = shot.owner;
    bullet.damage = shot.damage.max(1);
    bullet.expires_at = now + BULLET_LIFETIME_MS * shot.lifetime_multiplier;
    bullet.tint = shot.tint;
    Some(handle)
}

/// Throw a boomerang toward `target`
pub fn launch_boomerang<R: Rng>(
    pool: &mut Pool<Bullet>,
    now: f64,
    shot: Shot,
    range_multiplier: f32,
    rng: &mut R,
) -> Option<Handle> {
    let handle = create_bullet(pool, now, shot.lifetime(BOOMERANG_LIFETIME_MULT))?;

    let straight_ms = rng.random_range(BOOMERANG_STRAIGHT_MS.0..=BOOMERANG_STRAIGHT_MS.1) * range_multiplier as f64;
    let curve_ms = rng.random_range(BOOMERANG_CURVE_MS.0..=BOOMERANG_CURVE_MS.1);
    let spin_dir = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
    let heading = (shot.target - shot.origin).normalize_or_zero();
    let return_point = shot.origin + heading.perp() * (BOOMERANG_RETURN_OFFSET * spin_dir);

    if let Some(bullet) = pool.get_mut(handle) {
        bullet.boomerang = Some(BoomerangState {
            spin_dir,
            return_point,
            curve_at: now + straight_ms,
            turn_at: now + straight_ms + curve_ms,
            speed: shot.speed,
            // Quarter turn over the curving leg
            curve_rate: std::f32::consts::FRAC_PI_2 / (curve_ms as f32 / 1000.0),
            phase: BoomerangPhase::Outbound,
        });
    }
    Some(handle)
}

/// Fire whatever an enemy planned. Returns the number of bullets spawned.
pub fn fire_enemy_shot<R: Rng>(
    pool: &mut Pool<Bullet>,
    now: f64,
    origin: Vec2,
    plan: ShotPlan,
    tint: Tint,
    rng: &mut R,
) -> usize {
    match plan {
        ShotPlan::Straight { target, speed } => {
            let shot = Shot::new(Owner::Enemy, origin, target, speed).tint(tint);
            create_bullet(pool, now, shot).map_or(0, |_| 1)
        }
        ShotPlan::Boomerang {
            target,
            speed,
            range_multiplier,
        } => {
            let shot = Shot::new(Owner::Enemy, origin, target, speed).tint(tint);
            launch_boomerang(pool, now, shot, range_multiplier, rng).map_or(0, |_| 1)
        }
        ShotPlan::Spread { angles, speed } => angles
            .iter()
            .filter_map(|angle| {
                let shot = Shot::along(Owner::Enemy, origin, *angle, speed).tint(tint);
                create_bullet(pool, now, shot)
            })
            .count(),
    }
}

/// Whether a bullet is still in play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletStep {
    Flying,
    /// Lifetime ran out or a boomerang was caught
    Spent,
}

/// Move a bullet one tick, running the boomerang phases when present
pub fn move_bullet(bullet: &mut Bullet, now: f64, dt: f32) {
    if let Some(state) = bullet.boomerang.as_mut() {
        let phase = state.phase_at(now);
        match phase {
            BoomerangPhase::Outbound => {}
            BoomerangPhase::Curving => {
                let turned = bullet.vel.to_angle() + state.spin_dir * state.curve_rate * dt;
                bullet.vel = velocity_from_angle(turned, state.speed);
            }
            BoomerangPhase::Returning => {
                let return_speed = state.speed * BOOMERANG_RETURN_SPEED;
                if state.phase != BoomerangPhase::Returning {
                    // Flip around before homing
                    bullet.vel = -bullet.vel.normalize_or_zero() * return_speed;
                }
                let current = bullet.vel.to_angle();
                let desired = angle_between(bullet.pos, state.return_point);
                let max_turn = BOOMERANG_TURN_RATE * dt;
                let correction = normalize_angle(desired - current).clamp(-max_turn, max_turn);
                bullet.vel = velocity_from_angle(current + correction, return_speed);
            }
        }
        state.phase = phase;
    }

    bullet.pos += bullet.vel * dt;
    if bullet.vel.length_squared() > 0.0 {
        bullet.rotation = bullet.vel.to_angle();
    }
}

pub fn bullet_step(bullet: &Bullet, now: f64) -> BulletStep {
    if now >= bullet.expires_at {
        return BulletStep::Spent;
    }
    if let Some(state) = &bullet.boomerang {
        if state.phase == BoomerangPhase::Returning && bullet.pos.distance(state.return_point) <= BOOMERANG_CATCH_RADIUS
        {
            return BulletStep::Spent;
        }
    }
    BulletStep::Flying
}

/// Move every bullet in a pool
pub fn advance_bullets(pool: &mut Pool<Bullet>, now: f64, dt: f32) {
    for (_, bullet) in pool.iter_mut() {
        move_bullet(bullet, now, dt);
    }
}

/// Recycle spent or out-of-bounds bullets. Runs after collisions, so a bullet
/// still hits on the tick it expires.
pub fn sweep_bullets(pool: &mut Pool<Bullet>, arena: &Arena, now: f64) -> usize {
    let spent: Vec<Handle> = pool
        .iter()
        .filter(|(_, bullet)| {
            // Boomerangs may swing wide of the arena and come back
            let escaped = !bullet.is_boomerang() && !arena.contains(bullet.pos, WRAP_MARGIN);
            escaped || bullet_step(bullet, now) == BulletStep::Spent
        })
        .map(|(handle, _)| handle)
        .collect();
    for handle in &spent {
        pool.release(*handle);
    }
    spent.len()
}

/// The player's gun: cooldown-gated, with optional flanking rockets
#[derive(Debug, Clone, Default)]
pub struct PlayerWeapon {
    pub last_shot_at: Option<f64>,
}

impl PlayerWeapon {
    pub fn ready(&self, now: f64) -> bool {
        self.last_shot_at
            .is_none_or(|last| now - last >= PLAYER_SHOT_COOLDOWN_MS)
    }

    /// Fire at `target` if off cooldown. Consumes one rocket charge when any are held.
    /// Returns the number of bullets spawned.
    pub fn try_fire(
        &mut self,
        pool: &mut Pool<Bullet>,
        now: f64,
        origin: Vec2,
        target: Vec2,
        rocket_charges: &mut u32,
    ) -> usize {
        if !self.ready(now) {
            return 0;
        }
        self.last_shot_at = Some(now);

        let mut spawned = 0;
        let main = Shot::new(Owner::Player, origin, target, PLAYER_BULLET_SPEED);
        if create_bullet(pool, now, main).is_some() {
            spawned += 1;
        }

        if *rocket_charges > 0 {
            *rocket_charges -= 1;
            let side = (target - origin).normalize_or_zero().perp() * ROCKET_SIDE_OFFSET;
            for offset in [side, -side] {
                let rocket = Shot::new(
                    Owner::Player,
                    origin + offset,
                    target + offset,
                    PLAYER_BULLET_SPEED * ROCKET_SPEED_MULT,
                )
                .damage(ROCKET_DAMAGE)
                .lifetime(ROCKET_LIFETIME_MULT)
                .tint(Tint::Rocket);
                if create_bullet(pool, now, rocket).is_some() {
                    spawned += 1;
                }
            }
        }
        spawned
    }
}

/// Rocket pickup lying in the arena
#[derive(Debug, Clone, Default)]
pub struct Pickup {
    pub pos: Vec2,
    pub radius: f32,
    pub expires_at: f64,
    pub charges: u32,
}

impl Recycle for Pickup {
    fn recycle(&mut self) {
        *self = Pickup::default();
    }
}

/// Periodic spawner that keeps at most one pickup alive
#[derive(Debug, Clone)]
pub struct PickupSpawner {
    pub next_spawn_at: f64,
}

impl PickupSpawner {
    pub fn new(now: f64) -> Self {
        Self {
            next_spawn_at: now + ROCKET_PICKUP_INTERVAL_MS,
        }
    }

    /// Spawn a pickup when due and none is on the field
    pub fn update<R: Rng>(&mut self, pool: &mut Pool<Pickup>, arena: &Arena, now: f64, rng: &mut R) -> Option<Handle> {
        if now < self.next_spawn_at {
            return None;
        }
        self.next_spawn_at = now + ROCKET_PICKUP_INTERVAL_MS;
        if pool.active_count() > 0 {
            return None;
        }
        let (handle, pickup) = pool.acquire()?;
        pickup.pos = arena.random_inner_point(rng, PICKUP_SPAWN_MARGIN);
        pickup.radius = ROCKET_PICKUP_RADIUS;
        pickup.expires_at = now + ROCKET_PICKUP_LIFETIME_MS;
        pickup.charges = ROCKET_PICKUP_CHARGES;
        Some(handle)
    }
}

/// Recycle expired pickups
pub fn sweep_pickups(pool: &mut Pool<Pickup>, now: f64) -> usize {
    let expired: Vec<Handle> = pool
        .iter()
        .filter(|(_, p)| now >= p.expires_at)
        .map(|(h, _)| h)
        .collect();
    for handle in &expired {
        pool.release(*handle);
    }
    expired.len()
}
