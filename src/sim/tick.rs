//! Simulation tick
//!
//! Advances one frame of gameplay. Movement is integrated in reference
//! frames (`dt / FRAME_MS`) so speeds read as "pixels per 60 Hz frame";
//! gating (cooldowns, spawns, effect expiry) uses the session timestamp.

use glam::Vec2;
use rand::Rng;

use super::collision;
use super::flow;
use super::particles;
use super::spawner;
use super::state::{Bullet, GameEvent, GameMode, GameState, Owner, PowerUp, PowerUpKind};
use crate::consts::*;
use crate::{clamp_to_rect, direction, distance, heading};

/// Input for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Frame delta in milliseconds (clamped to the tuning's maximum)
    pub dt_ms: f32,
    /// Session time in milliseconds
    pub now_ms: f64,
}

/// Fan spacing for multi-shot
const MULTI_SHOT_SPREAD: f32 = 0.4;
/// Offset of the enemy gun below its center
const ENEMY_MUZZLE_OFFSET: f32 = 25.0;

/// Advance the game state by one frame. A no-op unless `Playing`.
pub fn tick(state: &mut GameState, input: &TickInput) {
    if state.mode != GameMode::Playing {
        return;
    }
    let dt = input.dt_ms.clamp(0.0, state.tuning.max_frame_dt_ms);
    let frames = dt / FRAME_MS;
    let now = input.now_ms;
    state.now_ms = now;

    // 1. Screen shake
    state.shake.decay(dt);

    // 2-4. Player
    move_player(state, dt, frames);
    state
        .player
        .add_energy(dt * state.tuning.energy_regen_per_ms);
    expire_effects(state, now);

    // 5. Enemies
    update_enemies(state, frames, now);

    // 6. Bullets
    for bullet in state.bullets.iter_mut() {
        bullet.record_trail();
        bullet.pos += bullet.vel * frames;
    }
    let viewport = state.viewport;
    state
        .bullets
        .retain(|b| viewport.contains_expanded(b.pos, CULL_MARGIN));

    // 7. Particles
    particles::update(&mut state.particles, &viewport, dt, frames);

    // 8. Power-ups
    update_power_ups(state, dt, frames, now);

    // 9. Firing
    if state.controls.fire {
        fire(state, now);
    }

    // 10. Collisions
    let report = collision::resolve(state);
    if report.player_destroyed {
        // Nothing else happens on the frame the player dies
        if let Err(e) = flow::game_over(state, now) {
            log::warn!("Lethal hit ignored: {}", e);
        }
        return;
    }

    // 11. Spawning
    spawner::run(state, now);

    // 12. Leveling
    level_up(state);
}

fn move_player(state: &mut GameState, dt: f32, frames: f32) {
    let controls = state.controls;
    let (min, max) = state.viewport.player_bounds();
    let player = &mut state.player;
    let step = player.speed * frames;
    player.prev = player.pos;

    if let Some(target) = controls.move_target {
        let gap = distance(player.pos, target);
        if gap > DRAG_DEAD_ZONE {
            let next = player.pos + direction(player.pos, target) * step.min(gap);
            player.pos = clamp_to_rect(next, min, max);
        }
    } else {
        let mut delta = Vec2::ZERO;
        if controls.left {
            delta.x -= step;
        }
        if controls.right {
            delta.x += step;
        }
        if controls.up {
            delta.y -= step;
        }
        if controls.down {
            delta.y += step;
        }
        player.pos = clamp_to_rect(player.pos + delta, min, max);
    }

    // A parked pointer or a key pushing into the edge leaves the ship still
    if player.pos != player.prev {
        player.thruster = (player.thruster + dt * state.tuning.thruster_ramp_per_ms).min(1.0);
        let ship = player.pos;
        particles::thruster(state, ship);
    } else {
        player.thruster = (player.thruster - dt * state.tuning.thruster_decay_per_ms).max(0.0);
    }
}

fn expire_effects(state: &mut GameState, now: f64) {
    let player = &mut state.player;
    if player.invincible && now >= player.invincible_until {
        player.invincible = false;
    }
    state.active_effects.retain(|e| now < e.expires_at);
}

fn update_enemies(state: &mut GameState, frames: f32, now: f64) {
    let target = state.player.pos;
    let limit = state.viewport.height + CULL_MARGIN;
    let tuning = &state.tuning;
    let mut shots = Vec::new();

    for enemy in state.enemies.iter_mut() {
        enemy.prev = enemy.pos;
        enemy.pos.y += enemy.speed * frames;
        enemy.rotation = heading(enemy.pos, target) + std::f32::consts::FRAC_PI_2;

        let delay = tuning.enemy_shot_delay_ms
            + state.rng.random::<f64>() * tuning.enemy_shot_variation_ms;
        if now - enemy.last_shot > delay {
            let muzzle = enemy.pos + Vec2::new(0.0, ENEMY_MUZZLE_OFFSET);
            let vel = direction(muzzle, target) * tuning.enemy_bullet_speed;
            shots.push(Bullet::new(Owner::Enemy, muzzle, vel, tuning.enemy_bullet_damage));
            enemy.last_shot = now;
        }
    }
    state.enemies.retain(|e| e.pos.y <= limit);
    state.bullets.extend(shots);
}

fn update_power_ups(state: &mut GameState, dt: f32, frames: f32, now: f64) {
    let fall = state.tuning.power_up_fall_speed * frames;
    let limit = state.viewport.height + CULL_MARGIN;
    let player = state.player.pos;

    for power_up in state.power_ups.iter_mut() {
        power_up.pos.y += fall;
        power_up.phase += dt * 0.005;
        power_up.float_offset = power_up.phase.sin() * 3.0;
        if distance(power_up.pos, player) < PICKUP_RADIUS {
            power_up.collected = true;
        }
    }

    let (collected, remaining): (Vec<PowerUp>, Vec<PowerUp>) = state
        .power_ups
        .drain(..)
        .partition(|p| p.collected);
    state.power_ups = remaining
        .into_iter()
        .filter(|p| p.pos.y <= limit)
        .collect();

    for power_up in collected {
        collect(state, &power_up, now);
    }
}

/// Apply a collected power-up
pub fn collect(state: &mut GameState, power_up: &PowerUp, now: f64) {
    let effect = power_up.effect;
    match effect.kind {
        PowerUpKind::HealthRestore => state.player.heal(effect.magnitude),
        PowerUpKind::EnergyBoost => state.player.add_energy(effect.magnitude),
        PowerUpKind::Shield => state.player.add_shield(effect.magnitude),
        PowerUpKind::Invincibility => {
            let until = now + effect.kind.duration_ms().unwrap_or(0.0);
            state.player.grant_invincibility(until);
            state.activate_effect(effect, until);
        }
        PowerUpKind::DamageBoost | PowerUpKind::MultiShot | PowerUpKind::RapidFire => {
            let until = now + effect.kind.duration_ms().unwrap_or(0.0);
            state.activate_effect(effect, until);
        }
    }
    state.stats.power_ups_collected += 1;
    state.events.push(GameEvent::PowerUpCollected(effect.kind));
    particles::pickup_burst(state, power_up.pos, effect.kind.color());
    log::debug!("Collected {:?}", effect.kind);
}

fn fire(state: &mut GameState, now: f64) {
    let rapid = state.effect(PowerUpKind::RapidFire).map(|e| e.magnitude);
    let cost = state.tuning.shot_energy_cost * rapid.unwrap_or(1.0);
    let cooldown = state.tuning.shot_cooldown_ms * if rapid.is_some() { 0.5 } else { 1.0 };

    let ready = state
        .player
        .last_shot
        .is_none_or(|last| now - last >= cooldown);
    if !ready || !state.player.spend_energy(cost) {
        return;
    }

    let origin = state.player.pos + Vec2::new(0.0, -20.0);
    let damage = state.tuning.player_bullet_damage * state.damage_multiplier();
    let speed = state.tuning.player_bullet_speed;
    let count = state
        .effect(PowerUpKind::MultiShot)
        .map(|e| e.magnitude.max(1.0) as usize)
        .unwrap_or(1);

    for i in 0..count {
        // Centered fan: 0, or -0.4/0/+0.4 for three
        let angle = (i as f32 - (count - 1) as f32 / 2.0) * MULTI_SHOT_SPREAD;
        let vel = Vec2::new(angle.sin(), -angle.cos()) * speed;
        state
            .bullets
            .push(Bullet::new(Owner::Player, origin, vel, damage));
    }
    state.player.last_shot = Some(now);
    state.stats.shots_fired += 1;
    let ship = state.player.pos;
    particles::muzzle_flash(state, ship);
}

/// One level per crossed threshold, healing each time
fn level_up(state: &mut GameState) {
    while state.player.score >= state.player.level as u64 * LEVEL_THRESHOLD {
        let player = &mut state.player;
        player.level += 1;
        player.max_health += state.tuning.max_health_per_level;
        player.health = player.max_health;
        state.events.push(GameEvent::LevelUp {
            level: state.player.level,
        });
        log::info!("Level {}! Health restored", state.player.level);
    }
}
