//! Collision and damage resolution
//!
//! Pairwise rules between the player, enemies and projectiles. Every rule
//! re-checks the run state before acting, so once a win, a defeat or a revive
//! offer is reached nothing else in the same tick can mutate the run.

use glam::Vec2;

use super::pool::Handle;
use super::state::{DamageResult, GameEvent, GameState};
use crate::consts::*;

/// Whether two circles overlap
pub fn circles_overlap(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    let reach = radius_a + radius_b;
    a.distance_squared(b) <= reach * reach
}

/// Run every interaction rule in fixed order
pub fn resolve(state: &mut GameState, events: &mut Vec<GameEvent>) {
    player_bullets_vs_enemies(state, events);
    enemy_bullets_vs_player(state, events);
    enemies_vs_player(state, events);
    pickups_vs_player(state, events);
}

/// Player bullets damage enemies; a destroyed enemy credits one kill
pub fn player_bullets_vs_enemies(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let bullets: Vec<Handle> = state.world.player_bullets.handles().collect();
    for bullet_handle in bullets {
        if !state.run.is_simulating() {
            return;
        }
        let Some(bullet) = state.world.player_bullets.get(bullet_handle) else {
            continue;
        };
        let (pos, damage) = (bullet.pos, bullet.damage);

        let target = state
            .world
            .enemies
            .iter()
            .find(|(_, enemy)| circles_overlap(pos, BULLET_RADIUS, enemy.pos, enemy.radius))
            .map(|(handle, _)| handle);
        let Some(enemy_handle) = target else {
            continue;
        };

        state.world.player_bullets.release(bullet_handle);
        let Some(enemy) = state.world.enemies.get_mut(enemy_handle) else {
            continue;
        };

        let kind = enemy.kind;
        if !enemy.take_damage(damage) {
            enemy.flash(state.clock_ms);
            events.push(GameEvent::EnemyHit {
                kind,
                hp_left: enemy.hp,
            });
            continue;
        }

        state.world.enemies.release(enemy_handle);
        let result = state.run.register_kill();
        events.push(GameEvent::EnemyDestroyed {
            kind,
            kills: state.run.kills,
        });
        if let Some(wave) = result.wave_advanced {
            log::info!("Wave {} reached at {} kills", wave, state.run.kills);
            events.push(GameEvent::WaveAdvanced { wave });
        }
        if result.win {
            state.world.freeze();
            events.push(GameEvent::WinReached);
            return;
        }
    }
}

/// Enemy bullets are consumed on contact and deal one damage
pub fn enemy_bullets_vs_player(state: &mut GameState, events: &mut Vec<GameEvent>) {
    if !state.world.player.active {
        return;
    }
    let bullets: Vec<Handle> = state.world.enemy_bullets.handles().collect();
    for handle in bullets {
        if !state.run.is_simulating() {
            return;
        }
        let player = &state.world.player;
        let hit = state
            .world
            .enemy_bullets
            .get(handle)
            .is_some_and(|b| circles_overlap(b.pos, BULLET_RADIUS, player.pos, player.radius));
        if !hit {
            continue;
        }
        state.world.enemy_bullets.release(handle);
        damage_player(state, events);
    }
}

/// Touching an enemy destroys it (no kill credit) and deals one damage
pub fn enemies_vs_player(state: &mut GameState, events: &mut Vec<GameEvent>) {
    if !state.world.player.active {
        return;
    }
    let enemies: Vec<Handle> = state.world.enemies.handles().collect();
    for handle in enemies {
        if !state.run.is_simulating() {
            return;
        }
        let player = &state.world.player;
        let hit = state
            .world
            .enemies
            .get(handle)
            .is_some_and(|e| circles_overlap(e.pos, e.radius, player.pos, player.radius));
        if !hit {
            continue;
        }
        state.world.enemies.release(handle);
        damage_player(state, events);
    }
}

/// Flying over a rocket pickup grants its charges
pub fn pickups_vs_player(state: &mut GameState, events: &mut Vec<GameEvent>) {
    if !state.run.is_simulating() || !state.world.player.active {
        return;
    }
    let player = &state.world.player;
    let collected: Vec<(Handle, u32)> = state
        .world
        .pickups
        .iter()
        .filter(|(_, p)| circles_overlap(p.pos, p.radius, player.pos, player.radius))
        .map(|(h, p)| (h, p.charges))
        .collect();
    for (handle, charges) in collected {
        state.world.pickups.release(handle);
        state.run.rocket_charges += charges;
        events.push(GameEvent::RocketsCollected {
            charges: state.run.rocket_charges,
        });
    }
}

fn damage_player(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let result = state.run.apply_damage(1);
    events.push(GameEvent::PlayerDamaged { hp: state.run.hp });
    match result {
        DamageResult::Survived => {}
        DamageResult::ReviveOffered => {
            state.world.freeze();
            events.push(GameEvent::ReviveOffered);
        }
        DamageResult::Defeated => {
            state.world.freeze();
            events.push(GameEvent::Defeated);
        }
    }
}
