//! Enemy and power-up spawning with difficulty scaling
//!
//! Difficulty is driven by two numbers:
//! - `level`: shortens the enemy spawn interval
//! - score tier (`score / 1000`): tougher, faster and larger enemy clusters

use glam::Vec2;
use rand::Rng;

use super::state::{Enemy, GameState, PowerUp, PowerUpKind};
use crate::settings::Tuning;

/// Inset from the side edges for spawn positions
const SPAWN_INSET: f32 = 50.0;
/// Spawn height above the top edge
const SPAWN_Y: f32 = -40.0;
/// Vertical gap between enemies of one cluster
const CLUSTER_SPACING: f32 = 60.0;
/// Volley stagger between enemies of one cluster
const CLUSTER_SHOT_STAGGER_MS: f64 = 200.0;

/// Difficulty tier for a score
pub fn tier(tuning: &Tuning, score: u64) -> u64 {
    score / tuning.score_tier.max(1)
}

/// Milliseconds between enemy spawns, never below `spawn_min_ms`
pub fn spawn_interval(tuning: &Tuning, level: u32, score: u64) -> f64 {
    let interval = tuning.spawn_base_ms
        - level as f64 * tuning.spawn_level_step_ms
        - tier(tuning, score) as f64 * tuning.spawn_tier_step_ms;
    interval.max(tuning.spawn_min_ms)
}

/// Enemies per spawn
pub fn cluster_size(tuning: &Tuning, score: u64) -> usize {
    let extra = tier(tuning, score) / tuning.cluster_tier_step.max(1);
    (1 + extra as usize).min(tuning.max_cluster)
}

pub fn enemy_health(tuning: &Tuning, score: u64) -> f32 {
    tuning.enemy_base_health + tier(tuning, score) as f32 * tuning.enemy_health_per_tier
}

/// Speed before the random variation
pub fn enemy_speed(tuning: &Tuning, score: u64) -> f32 {
    let tier = tier(tuning, score) as f32;
    let base = tuning.enemy_base_speed.max(tier * tuning.enemy_base_speed_per_tier);
    base + tier * tuning.enemy_speed_per_tier
}

fn random_x(state: &mut GameState) -> f32 {
    let span = state.viewport.width - 2.0 * SPAWN_INSET;
    if span > 0.0 {
        SPAWN_INSET + state.rng.random::<f32>() * span
    } else {
        state.viewport.width / 2.0
    }
}

/// Spawn one enemy cluster at session time `now`
pub fn spawn_enemies(state: &mut GameState, now: f64) -> usize {
    let score = state.player.score;
    let count = cluster_size(&state.tuning, score);
    let health = enemy_health(&state.tuning, score);
    let speed = enemy_speed(&state.tuning, score);
    let variation = state.tuning.enemy_speed_variation;

    for i in 0..count {
        let x = random_x(state);
        let y = SPAWN_Y - i as f32 * CLUSTER_SPACING;
        let speed = speed + state.rng.random::<f32>() * variation;
        let last_shot = now + i as f64 * CLUSTER_SHOT_STAGGER_MS;
        state
            .enemies
            .push(Enemy::new(Vec2::new(x, y), health, speed, last_shot));
    }
    log::debug!("Spawned {} enemies (hp {}, score {})", count, health, score);
    count
}

/// Random catalog entry
pub fn random_power_up_kind(state: &mut GameState) -> PowerUpKind {
    let index = state.rng.random_range(0..PowerUpKind::ALL.len());
    PowerUpKind::ALL[index]
}

/// Drop a random power-up from the top edge
pub fn spawn_power_up(state: &mut GameState) {
    let kind = random_power_up_kind(state);
    let x = random_x(state);
    state.power_ups.push(PowerUp::new(Vec2::new(x, SPAWN_Y), kind));
    log::debug!("Spawned power-up {:?}", kind);
}

/// Next power-up gap, rolled once per spawn
fn roll_power_up_interval(state: &mut GameState) -> f64 {
    let jitter = state.tuning.power_up_jitter_ms;
    state.tuning.power_up_interval_ms + state.rng.random::<f64>() * jitter
}

/// Chance-based drop where an enemy died
pub fn maybe_drop(state: &mut GameState, pos: Vec2) -> bool {
    let chance = state.tuning.power_up_drop_chance.clamp(0.0, 1.0);
    if state.rng.random_bool(chance) {
        let kind = random_power_up_kind(state);
        state.power_ups.push(PowerUp::new(pos, kind));
        true
    } else {
        false
    }
}

/// Run both spawn timers at session time `now`
pub fn run(state: &mut GameState, now: f64) {
    let interval = spawn_interval(&state.tuning, state.player.level, state.player.score);
    if now - state.last_enemy_spawn > interval {
        spawn_enemies(state, now);
        state.last_enemy_spawn = now;
    }

    if now - state.last_power_up_spawn > state.next_power_up_interval {
        spawn_power_up(state);
        state.last_power_up_spawn = now;
        state.next_power_up_interval = roll_power_up_interval(state);
    }
}
