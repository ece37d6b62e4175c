//! Fixed timestep simulation tick
//!
//! Advances the world deterministically in a fixed order: spawns, movement,
//! firing, projectiles, collision resolution, then expiry and cleanup.

use glam::Vec2;
use rand::Rng;

use super::collision;
use super::enemy::{lead_target, plan_shot, rearm_delay, steer};
use super::projectile::{advance_bullets, fire_enemy_shot, sweep_bullets, sweep_pickups};
use super::state::{GameEvent, GameState};
use super::wave::{fire_delay_range, pick_pattern};
use crate::angle_between;
use crate::consts::*;

/// Spawn points closer than this to the player are re-rolled
const SPAWN_SAFE_DISTANCE: f32 = 160.0;
const SPAWN_ATTEMPTS: usize = 4;
/// Autopilot backs away from enemies inside this distance
const AUTOPILOT_KEEP_AWAY: f32 = 180.0;
/// Autopilot sidesteps enemy bullets inside this distance
const AUTOPILOT_DODGE: f32 = 90.0;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Movement direction; normalised before use
    pub move_dir: Vec2,
    /// World-space aim point (mouse/touch)
    pub aim: Option<Vec2>,
    /// Fire held
    pub fire: bool,
    /// Pause toggle
    pub pause: bool,
    /// Idle/demo mode - autopilot plays the run
    pub idle_mode: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if state.run.is_ending() {
        return events;
    }

    if input.pause {
        match state.run.toggle_pause() {
            Some(true) => events.push(GameEvent::Paused),
            Some(false) => events.push(GameEvent::Resumed),
            None => {}
        }
    }

    if !state.run.is_simulating() {
        return events;
    }

    state.clock_ms += dt as f64 * 1000.0;

    let mut input = input.clone();
    if input.idle_mode {
        autopilot(state, &mut input);
    }

    spawn_enemies(state, &mut events);
    let now = state.clock_ms;
    if state
        .pickup_spawner
        .update(&mut state.world.pickups, &state.world.arena, now, &mut state.rng)
        .is_some()
    {
        events.push(GameEvent::PickupSpawned);
    }

    update_player(state, &input, dt);
    update_enemies(state, dt);

    advance_bullets(&mut state.world.player_bullets, now, dt);
    advance_bullets(&mut state.world.enemy_bullets, now, dt);

    collision::resolve(state, &mut events);

    let arena = state.world.arena;
    sweep_bullets(&mut state.world.player_bullets, &arena, now);
    sweep_bullets(&mut state.world.enemy_bullets, &arena, now);
    sweep_pickups(&mut state.world.pickups, now);

    events
}

fn spawn_enemies(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let config = state.run.wave_config;
    let now = state.clock_ms;
    if now < state.next_spawn_at {
        return;
    }
    state.next_spawn_at = now + config.spawn_delay_ms;
    if state.world.enemies.active_count() >= config.max_enemies_on_field as usize {
        return;
    }

    let kind = state.kind_cycle.next(config.wave, &mut state.rng);
    let pattern = pick_pattern(state.rng.random::<f32>(), &config);

    let arena = state.world.arena;
    let player_pos = state.world.player.pos;
    let mut pos = arena.random_edge_point(&mut state.rng);
    for _ in 1..SPAWN_ATTEMPTS {
        if pos.distance(player_pos) >= SPAWN_SAFE_DISTANCE {
            break;
        }
        pos = arena.random_edge_point(&mut state.rng);
    }

    let Some((_, enemy)) = state.world.enemies.acquire() else {
        log::debug!("Enemy pool exhausted");
        return;
    };
    enemy.activate(kind, pattern, pos, now, fire_delay_range(&config), &mut state.rng);
    events.push(GameEvent::EnemySpawned { kind, pattern });
}

fn update_player(state: &mut GameState, input: &TickInput, dt: f32) {
    let arena = state.world.arena;
    let player = &mut state.world.player;
    if !player.active {
        return;
    }

    player.vel = input.move_dir.normalize_or_zero() * PLAYER_SPEED;
    player.pos = arena.wrap(player.pos + player.vel * dt);

    let facing = match input.aim {
        Some(aim) => angle_between(player.pos, aim),
        None => player.rotation - std::f32::consts::FRAC_PI_2,
    };
    player.rotation = facing + std::f32::consts::FRAC_PI_2;

    if input.fire {
        let origin = player.pos;
        let target = input.aim.unwrap_or(origin + Vec2::from_angle(facing));
        state.weapon.try_fire(
            &mut state.world.player_bullets,
            state.clock_ms,
            origin,
            target,
            &mut state.run.rocket_charges,
        );
    }
}

fn update_enemies(state: &mut GameState, dt: f32) {
    let now = state.clock_ms;
    let config = state.run.wave_config;
    let fire_range = fire_delay_range(&config);
    let arena = state.world.arena;
    let player_pos = state.world.player.pos;
    let player_vel = state.world.player.vel;

    for (_, enemy) in state.world.enemies.iter_mut() {
        steer(enemy, player_pos, now, &config, &mut state.rng);
        enemy.pos = arena.wrap(enemy.pos + enemy.vel * dt);
        enemy.update_flash(now);

        if now >= enemy.next_shot_at {
            let plan = plan_shot(enemy, player_pos, player_vel);
            fire_enemy_shot(
                &mut state.world.enemy_bullets,
                now,
                enemy.pos,
                plan,
                enemy.kind.shot_tint(),
                &mut state.rng,
            );
            enemy.next_shot_at = now + rearm_delay(enemy.kind, enemy.pattern, fire_range, &mut state.rng);
        }
    }
}

/// Demo pilot: shoot the nearest enemy, keep distance, grab pickups, dodge
fn autopilot(state: &GameState, input: &mut TickInput) {
    let player = &state.world.player;

    let nearest = state
        .world
        .enemies
        .iter()
        .map(|(_, e)| e)
        .min_by(|a, b| {
            a.pos
                .distance_squared(player.pos)
                .total_cmp(&b.pos.distance_squared(player.pos))
        });
    let pickup = state.world.pickups.iter().map(|(_, p)| p.pos).next();
    let threat = state
        .world
        .enemy_bullets
        .iter()
        .map(|(_, b)| b)
        .find(|b| b.pos.distance(player.pos) < AUTOPILOT_DODGE);

    let mut move_dir = match (nearest, pickup) {
        (_, Some(pickup)) => pickup - player.pos,
        (Some(enemy), None) => {
            let away = (player.pos - enemy.pos).normalize_or_zero();
            if enemy.pos.distance(player.pos) < AUTOPILOT_KEEP_AWAY {
                away + away.perp() * 0.6
            } else {
                away.perp()
            }
        }
        (None, None) => state.world.arena.center() - player.pos,
    };
    if let Some(bullet) = threat {
        move_dir = bullet.vel.normalize_or_zero().perp();
    }
    input.move_dir = move_dir;

    match nearest {
        Some(enemy) => {
            input.aim = Some(lead_target(player.pos, enemy.pos, enemy.vel, PLAYER_BULLET_SPEED));
            input.fire = true;
        }
        None => input.fire = false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::EnemyKind;
    use crate::sim::projectile::{Owner, Shot, create_bullet};
    use crate::sim::state::{PauseState, RunPhase};
    use crate::sim::wave::EnemyPattern;
    use crate::tuning::Tuning;

    fn running_state(seed: u64) -> GameState {
        let mut state = GameState::new(seed, PLAYER_BASE_HP, &Tuning::default());
        state.start();
        state
    }

    fn run_ticks(state: &mut GameState, input: &TickInput, ticks: usize) -> Vec<GameEvent> {
        (0..ticks).flat_map(|_| tick(state, input, SIM_DT)).collect()
    }

    #[test]
    fn test_idle_run_does_not_advance() {
        let mut state = GameState::new(1, 3, &Tuning::default());
        assert_eq!(state.run.phase, RunPhase::Idle);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.clock_ms, 0.0);
    }

    #[test]
    fn test_tick_pause() {
        let mut state = running_state(12345);
        tick(&mut state, &TickInput::default(), SIM_DT);
        let clock = state.clock_ms;

        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        assert_eq!(tick(&mut state, &pause, SIM_DT), vec![GameEvent::Paused]);
        assert_eq!(state.run.pause, PauseState::Manual);
        run_ticks(&mut state, &TickInput::default(), 30);
        assert_eq!(state.clock_ms, clock);

        let events = tick(&mut state, &pause, SIM_DT);
        assert_eq!(events.first(), Some(&GameEvent::Resumed));
        assert!(state.clock_ms > clock);
    }

    #[test]
    fn test_first_spawn_after_delay() {
        let mut state = running_state(7);
        // ~1.3s: nothing yet
        run_ticks(&mut state, &TickInput::default(), 78);
        assert_eq!(state.world.enemies.active_count(), 0);

        let events = run_ticks(&mut state, &TickInput::default(), 6);
        // Only standard enemies are unlocked in wave 1
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::EnemySpawned { kind: EnemyKind::Standard, .. }))
        );
        assert_eq!(state.world.enemies.active_count(), 1);
    }

    #[test]
    fn test_enemy_count_never_exceeds_cap() {
        let mut state = running_state(3);
        state.world.player.active = false;
        for _ in 0..1200 {
            tick(&mut state, &TickInput::default(), SIM_DT);
            assert!(state.world.enemies.active_count() <= state.run.wave_config.max_enemies_on_field as usize);
        }
        assert!(state.world.enemies.active_count() > 0);
    }

    #[test]
    fn test_fire_respects_cooldown() {
        let mut state = running_state(5);
        let input = TickInput {
            aim: Some(state.world.player.pos + Vec2::new(100.0, 0.0)),
            fire: true,
            ..Default::default()
        };
        // 10 ticks is ~167ms, under the 180ms cooldown
        run_ticks(&mut state, &input, 10);
        assert_eq!(state.world.player_bullets.active_count(), 1);
    }

    #[test]
    fn test_player_moves_and_faces_aim() {
        let mut state = running_state(5);
        let start = state.world.player.pos;
        let step = PLAYER_SPEED * SIM_DT;
        // Aim straight down from where the player ends up
        let input = TickInput {
            move_dir: Vec2::new(3.0, 0.0),
            aim: Some(start + Vec2::new(step, 200.0)),
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        assert!((state.world.player.pos.x - start.x - step).abs() < 1e-3);
        assert!((state.world.player.rotation - std::f32::consts::PI).abs() < 1e-3);
    }

    #[test]
    fn test_bullet_hits_on_its_last_tick() {
        let mut state = running_state(11);
        let pos = state.world.player.pos + Vec2::new(200.0, 0.0);
        let range = fire_delay_range(&state.run.wave_config);
        let (_, enemy) = state.world.enemies.acquire().unwrap();
        enemy.activate(EnemyKind::Standard, EnemyPattern::Chaser, pos, 0.0, range, &mut state.rng);

        let shot = Shot::new(Owner::Player, pos, pos + Vec2::X, 1.0);
        let handle = create_bullet(&mut state.world.player_bullets, 0.0, shot).unwrap();
        // Expires exactly on the next tick
        state.world.player_bullets.get_mut(handle).unwrap().expires_at = SIM_DT as f64 * 1000.0;

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.run.kills, 1);
        assert_eq!(state.world.enemies.active_count(), 0);
        assert_eq!(state.world.player_bullets.active_count(), 0);
    }

    #[test]
    fn test_expired_bullet_is_swept_after_collisions() {
        let mut state = running_state(11);
        let pos = state.world.player.pos + Vec2::new(200.0, 0.0);
        let shot = Shot::new(Owner::Player, pos, pos + Vec2::X, 1.0);
        let handle = create_bullet(&mut state.world.player_bullets, 0.0, shot).unwrap();
        state.world.player_bullets.get_mut(handle).unwrap().expires_at = SIM_DT as f64 * 1000.0;

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.run.kills, 0);
        assert_eq!(state.world.player_bullets.active_count(), 0);
    }

    #[test]
    fn test_tiny_arena_tuning_ticks_safely() {
        let tuning = Tuning {
            arena_width: 100.0,
            arena_height: 100.0,
            ..Default::default()
        };
        let mut state = GameState::new(4, PLAYER_BASE_HP, &tuning);
        state.start();
        state.world.player.active = false;
        // Past the first pickup spawn
        let events = run_ticks(&mut state, &TickInput::default(), 1100);
        assert_eq!(state.world.arena.width, ARENA_WIDTH);
        assert!(events.contains(&GameEvent::PickupSpawned));
    }

    #[test]
    fn test_decided_run_stops_ticking() {
        let mut state = running_state(5);
        state.run.kills = state.run.kills_to_win;
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.clock_ms, 0.0);
    }

    #[test]
    fn test_determinism() {
        let mut state1 = running_state(99999);
        let mut state2 = running_state(99999);
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };

        let events1 = run_ticks(&mut state1, &input, 900);
        let events2 = run_ticks(&mut state2, &input, 900);

        assert_eq!(events1, events2);
        assert_eq!(state1.run.kills, state2.run.kills);
        assert_eq!(state1.run.hp, state2.run.hp);
        assert_eq!(state1.world.player.pos, state2.world.player.pos);
        let positions = |s: &GameState| s.world.enemies.iter().map(|(_, e)| e.pos).collect::<Vec<_>>();
        assert_eq!(positions(&state1), positions(&state2));
    }
}
