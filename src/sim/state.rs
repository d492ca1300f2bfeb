//! Game state and core simulation types
//!
//! Every entity is a plain record owned by `GameState` for one session.
//! Nothing holds a reference to another entity; collisions look entities up
//! by proximity each tick.

use std::collections::VecDeque;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::clamp_to_rect;
use crate::consts::*;
use crate::platform::input::Controls;
use crate::settings::Tuning;

/// Coarse mode of the game flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    /// Title screen with instructions
    Intro,
    /// Active gameplay (the only mode that simulates)
    Playing,
    /// Frozen, overlay shown
    Paused,
    /// Run ended, report shown
    GameOver,
    /// Share card shown over the report
    Share,
}

/// Drawing area size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    /// True if `pos` lies inside the viewport grown by `margin` on every side
    pub fn contains_expanded(&self, pos: Vec2, margin: f32) -> bool {
        pos.x >= -margin
            && pos.x <= self.width + margin
            && pos.y >= -margin
            && pos.y <= self.height + margin
    }

    /// Area the player ship may occupy
    pub fn player_bounds(&self) -> (Vec2, Vec2) {
        (
            Vec2::splat(PLAYER_MARGIN),
            Vec2::new(self.width - PLAYER_MARGIN, self.height - PLAYER_MARGIN),
        )
    }

    pub fn player_spawn(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height - PLAYER_SPAWN_OFFSET)
    }
}

/// The player's ship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    /// Position before this tick's move
    pub prev: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub energy: f32,
    pub max_energy: f32,
    pub score: u64,
    pub level: u32,
    /// Pixels per reference frame
    pub speed: f32,
    /// Absorption pool, 0..=MAX_SHIELD
    pub shield: f32,
    pub invincible: bool,
    /// Session time at which invincibility ends
    pub invincible_until: f64,
    /// Thruster glow intensity 0..=1
    pub thruster: f32,
    /// Session time of the last shot (None before the first)
    pub last_shot: Option<f64>,
}

impl Player {
    pub fn new(pos: Vec2, speed: f32) -> Self {
        Self {
            pos,
            prev: pos,
            health: 100.0,
            max_health: 100.0,
            energy: 100.0,
            max_energy: 100.0,
            score: 0,
            level: 1,
            speed,
            shield: 0.0,
            invincible: false,
            invincible_until: 0.0,
            thruster: 0.0,
            last_shot: None,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).clamp(0.0, self.max_health);
    }

    pub fn add_energy(&mut self, amount: f32) {
        self.energy = (self.energy + amount).clamp(0.0, self.max_energy);
    }

    /// Deduct `cost` if affordable
    pub fn spend_energy(&mut self, cost: f32) -> bool {
        if self.energy >= cost {
            self.energy = (self.energy - cost).max(0.0);
            true
        } else {
            false
        }
    }

    pub fn add_shield(&mut self, amount: f32) {
        self.shield = (self.shield + amount).clamp(0.0, MAX_SHIELD);
    }

    pub fn grant_invincibility(&mut self, until: f64) {
        self.invincible = true;
        self.invincible_until = self.invincible_until.max(until);
    }
}

/// Enemy type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnemyKind {
    #[default]
    Basic,
}

/// A descending enemy fighter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub pos: Vec2,
    /// Position before this tick's move
    pub prev: Vec2,
    pub health: f32,
    /// Pixels per reference frame (downward)
    pub speed: f32,
    /// Facing angle (radians), points at the player
    pub rotation: f32,
    /// Session time of the last shot; may lie in the future to stagger volleys
    pub last_shot: f64,
    pub kind: EnemyKind,
}

impl Enemy {
    pub fn new(pos: Vec2, health: f32, speed: f32, last_shot: f64) -> Self {
        Self {
            pos,
            prev: pos,
            health,
            speed,
            rotation: 0.0,
            last_shot,
            kind: EnemyKind::Basic,
        }
    }
}

/// Who fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Enemy,
}

/// Trail point for bullet rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub pos: Vec2,
    pub alpha: f32,
}

/// A projectile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub pos: Vec2,
    /// Position before this tick's move
    pub prev: Vec2,
    /// Pixels per reference frame
    pub vel: Vec2,
    pub damage: f32,
    pub owner: Owner,
    /// Recent positions, newest first
    pub trail: VecDeque<TrailPoint>,
    pub glow: f32,
}

impl Bullet {
    pub fn new(owner: Owner, pos: Vec2, vel: Vec2, damage: f32) -> Self {
        Self {
            pos,
            prev: pos,
            vel,
            damage,
            owner,
            trail: VecDeque::with_capacity(BULLET_TRAIL_LENGTH),
            glow: match owner {
                Owner::Player => 8.0,
                Owner::Enemy => 6.0,
            },
        }
    }

    /// Record current position to trail (call each tick before moving)
    pub fn record_trail(&mut self) {
        self.prev = self.pos;
        self.trail.push_front(TrailPoint {
            pos: self.pos,
            alpha: 1.0,
        });
        self.trail.truncate(BULLET_TRAIL_LENGTH);
        let len = self.trail.len() as f32;
        for (i, point) in self.trail.iter_mut().enumerate() {
            point.alpha = 1.0 - i as f32 / len;
        }
    }
}

/// Particle variant, selects the decay rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    Explosion,
    Thruster,
    Spark,
    Debris,
}

/// A cosmetic particle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    /// Pixels per reference frame
    pub vel: Vec2,
    /// Remaining life in seconds
    pub life: f32,
    /// Packed 0xRRGGBB
    pub color: u32,
    pub size: f32,
    pub kind: ParticleKind,
}

impl Particle {
    pub fn is_dead(&self) -> bool {
        self.life <= 0.0 || self.size < PARTICLE_MIN_SIZE
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    HealthRestore,
    EnergyBoost,
    Shield,
    DamageBoost,
    MultiShot,
    RapidFire,
    Invincibility,
}

impl PowerUpKind {
    /// Catalog power-ups are drawn from (uniformly)
    pub const ALL: [PowerUpKind; 7] = [
        PowerUpKind::HealthRestore,
        PowerUpKind::EnergyBoost,
        PowerUpKind::Shield,
        PowerUpKind::DamageBoost,
        PowerUpKind::MultiShot,
        PowerUpKind::RapidFire,
        PowerUpKind::Invincibility,
    ];

    /// Catalog magnitude for this kind
    pub fn effect(self) -> PowerUpEffect {
        let magnitude = match self {
            PowerUpKind::HealthRestore => 30.0,
            PowerUpKind::EnergyBoost => 50.0,
            PowerUpKind::Shield => 100.0,
            PowerUpKind::DamageBoost => 2.0,
            PowerUpKind::MultiShot => 3.0,
            PowerUpKind::RapidFire => 0.3,
            PowerUpKind::Invincibility => 1.0,
        };
        PowerUpEffect {
            kind: self,
            magnitude,
        }
    }

    /// How long a timed effect lasts (None for instant effects)
    pub fn duration_ms(self) -> Option<f64> {
        match self {
            PowerUpKind::HealthRestore | PowerUpKind::EnergyBoost | PowerUpKind::Shield => None,
            PowerUpKind::DamageBoost => Some(10_000.0),
            PowerUpKind::MultiShot | PowerUpKind::RapidFire => Some(8_000.0),
            PowerUpKind::Invincibility => Some(5_000.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PowerUpKind::HealthRestore => "HEALTH",
            PowerUpKind::EnergyBoost => "ENERGY",
            PowerUpKind::Shield => "SHIELD",
            PowerUpKind::DamageBoost => "DAMAGE x2",
            PowerUpKind::MultiShot => "MULTI-SHOT",
            PowerUpKind::RapidFire => "RAPID FIRE",
            PowerUpKind::Invincibility => "INVINCIBLE",
        }
    }

    /// Packed 0xRRGGBB
    pub fn color(self) -> u32 {
        match self {
            PowerUpKind::HealthRestore => 0xff0000,
            PowerUpKind::EnergyBoost => 0x00aaff,
            PowerUpKind::Shield => 0x4ecdc4,
            PowerUpKind::DamageBoost => 0xff6b35,
            PowerUpKind::MultiShot => 0xffd700,
            PowerUpKind::RapidFire => 0xff00ff,
            PowerUpKind::Invincibility => 0xffffff,
        }
    }
}

/// What a power-up does and how strongly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerUpEffect {
    pub kind: PowerUpKind,
    pub magnitude: f32,
}

/// A falling collectible
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub pos: Vec2,
    pub effect: PowerUpEffect,
    pub collected: bool,
    /// Pulse accumulator
    pub phase: f32,
    /// Vertical bob derived from `phase` (visual only)
    pub float_offset: f32,
}

impl PowerUp {
    pub fn new(pos: Vec2, kind: PowerUpKind) -> Self {
        Self {
            pos,
            effect: kind.effect(),
            collected: false,
            phase: 0.0,
            float_offset: 0.0,
        }
    }
}

/// A timed power-up currently in force
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub kind: PowerUpKind,
    pub magnitude: f32,
    /// Session time at which the effect lapses
    pub expires_at: f64,
}

/// Screen shake descriptor (milliseconds)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenShake {
    pub intensity: f32,
    pub duration: f32,
    pub remaining: f32,
}

impl ScreenShake {
    pub fn trigger(&mut self, intensity: f32, duration: f32) {
        *self = Self {
            intensity,
            duration,
            remaining: duration,
        };
    }

    /// Run down the remaining time, zeroing intensity on expiry
    pub fn decay(&mut self, dt_ms: f32) {
        if self.remaining > 0.0 {
            self.remaining -= dt_ms;
            if self.remaining <= 0.0 {
                self.remaining = 0.0;
                self.intensity = 0.0;
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_active(&self) -> bool {
        self.intensity > 0.0 && self.remaining > 0.0
    }
}

/// Notable moments of a tick, drained by the host (toasts, sounds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    LevelUp { level: u32 },
    PowerUpCollected(PowerUpKind),
    PlayerHit { hull_damage: f32 },
    GameOver { score: u64, new_high_score: bool },
}

/// Cumulative counters for one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub enemies_killed: u32,
    pub shots_fired: u32,
    pub power_ups_collected: u32,
    pub damage_dealt: f32,
    /// Session time the run started
    pub started_at: f64,
    /// Session time the run ended
    pub ended_at: Option<f64>,
}

impl SessionStats {
    /// Survived time in whole seconds, measured to `now` while still running
    pub fn survived_secs(&self, now: f64) -> u64 {
        let end = self.ended_at.unwrap_or(now);
        ((end - self.started_at).max(0.0) / 1000.0).floor() as u64
    }
}

/// Complete game state for one engine instance
#[derive(Debug, Clone)]
pub struct GameState {
    pub mode: GameMode,
    pub viewport: Viewport,
    pub tuning: Tuning,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub bullets: Vec<Bullet>,
    pub particles: Vec<Particle>,
    pub power_ups: Vec<PowerUp>,
    pub active_effects: Vec<ActiveEffect>,
    pub shake: ScreenShake,
    /// Latest control vector from the input adapter
    pub controls: Controls,
    pub last_enemy_spawn: f64,
    pub last_power_up_spawn: f64,
    /// Rolled once per power-up spawn
    pub next_power_up_interval: f64,
    pub stats: SessionStats,
    /// Session time of the latest tick
    pub now_ms: f64,
    /// Events since the host last drained them
    pub events: Vec<GameEvent>,
    /// Best score ever, persisted by the engine
    pub high_score: u64,
    /// Set when this session beat the previous high score
    pub new_high_score: bool,
    /// Particle budget from settings
    pub max_particles: usize,
    pub rng: Pcg32,
}

impl GameState {
    /// Create a fresh session in `Intro` mode
    pub fn new(viewport: Viewport, tuning: Tuning, high_score: u64, seed: u64) -> Self {
        let player = Player::new(viewport.player_spawn(), tuning.player_speed);
        let next_power_up_interval = tuning.power_up_interval_ms;
        Self {
            mode: GameMode::Intro,
            viewport,
            tuning,
            player,
            enemies: Vec::new(),
            bullets: Vec::new(),
            particles: Vec::new(),
            power_ups: Vec::new(),
            active_effects: Vec::new(),
            shake: ScreenShake::default(),
            controls: Controls::default(),
            last_enemy_spawn: 0.0,
            last_power_up_spawn: 0.0,
            next_power_up_interval,
            stats: SessionStats::default(),
            now_ms: 0.0,
            events: Vec::new(),
            high_score,
            new_high_score: false,
            max_particles: usize::MAX,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Throw away the session, keeping high score, viewport, tuning and RNG
    pub fn reset_session(&mut self, now: f64) {
        self.player = Player::new(self.viewport.player_spawn(), self.tuning.player_speed);
        self.enemies.clear();
        self.bullets.clear();
        self.particles.clear();
        self.power_ups.clear();
        self.active_effects.clear();
        self.shake.clear();
        self.controls = Controls::default();
        self.last_enemy_spawn = now;
        self.last_power_up_spawn = now;
        self.next_power_up_interval = self.tuning.power_up_interval_ms;
        self.stats = SessionStats {
            started_at: now,
            ..SessionStats::default()
        };
        self.now_ms = now;
        self.events.clear();
        self.new_high_score = false;
    }

    /// Active timed effect of a kind
    pub fn effect(&self, kind: PowerUpKind) -> Option<&ActiveEffect> {
        self.active_effects.iter().find(|e| e.kind == kind)
    }

    pub fn has_effect(&self, kind: PowerUpKind) -> bool {
        self.effect(kind).is_some()
    }

    /// Damage multiplier from a damage boost (1.0 without)
    pub fn damage_multiplier(&self) -> f32 {
        self.effect(PowerUpKind::DamageBoost)
            .map(|e| e.magnitude)
            .unwrap_or(1.0)
    }

    /// Start or refresh a timed effect
    pub fn activate_effect(&mut self, effect: PowerUpEffect, expires_at: f64) {
        if let Some(active) = self
            .active_effects
            .iter_mut()
            .find(|e| e.kind == effect.kind)
        {
            active.magnitude = effect.magnitude;
            active.expires_at = expires_at;
        } else {
            self.active_effects.push(ActiveEffect {
                kind: effect.kind,
                magnitude: effect.magnitude,
                expires_at,
            });
        }
    }

    /// Add a particle, dropping the oldest when over budget
    pub fn push_particle(&mut self, particle: Particle) {
        if self.max_particles == 0 {
            return;
        }
        if self.particles.len() >= self.max_particles {
            let excess = self.particles.len() + 1 - self.max_particles;
            self.particles.drain(..excess);
        }
        self.particles.push(particle);
    }

    /// Start shaking the screen; only meaningful while playing
    pub fn shake_screen(&mut self, intensity: f32, duration: f32) {
        if self.mode == GameMode::Playing {
            self.shake.trigger(intensity, duration);
        }
    }

    /// Total live entities (useful for culling checks)
    pub fn entity_count(&self) -> usize {
        self.enemies.len() + self.bullets.len() + self.particles.len() + self.power_ups.len()
    }

    /// Switch to a new play area, pulling the ship back inside it
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let (min, max) = viewport.player_bounds();
        self.player.pos = clamp_to_rect(self.player.pos, min, max);
        self.player.prev = self.player.pos;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> GameState {
        GameState::new(Viewport::new(800.0, 600.0), Tuning::desktop(), 0, 7)
    }

    #[test]
    fn test_new_state_starts_in_intro() {
        let s = state();
        assert_eq!(s.mode, GameMode::Intro);
        assert_eq!(s.player.pos, Vec2::new(400.0, 500.0));
        assert_eq!(s.player.level, 1);
        assert_eq!(s.entity_count(), 0);
    }

    #[test]
    fn test_shrinking_viewport_reclamps_player() {
        let mut s = state();
        s.player.pos = Vec2::new(700.0, 500.0);
        s.set_viewport(Viewport::new(400.0, 600.0));
        assert_eq!(s.player.pos, Vec2::new(400.0 - PLAYER_MARGIN, 500.0));
        assert_eq!(s.player.prev, s.player.pos);
    }

    #[test]
    fn test_trail_is_bounded_with_decaying_alpha() {
        let mut bullet = Bullet::new(Owner::Player, Vec2::ZERO, Vec2::new(0.0, -16.0), 25.0);
        for i in 0..10 {
            bullet.pos.y = -(i as f32);
            bullet.record_trail();
        }
        assert_eq!(bullet.trail.len(), BULLET_TRAIL_LENGTH);
        assert_eq!(bullet.trail[0].alpha, 1.0);
        assert!(bullet.trail.iter().zip(bullet.trail.iter().skip(1)).all(|(a, b)| a.alpha > b.alpha));
        assert_eq!(bullet.trail[0].pos.y, -9.0);
    }

    #[test]
    fn test_player_clamps() {
        let mut p = Player::new(Vec2::ZERO, 10.0);
        p.heal(500.0);
        assert_eq!(p.health, 100.0);
        p.add_shield(250.0);
        assert_eq!(p.shield, MAX_SHIELD);
        p.energy = 5.0;
        assert!(!p.spend_energy(8.0));
        assert_eq!(p.energy, 5.0);
    }

    #[test]
    fn test_particle_budget_drops_oldest() {
        let mut s = state();
        s.max_particles = 2;
        for i in 0..3 {
            s.push_particle(Particle {
                pos: Vec2::splat(i as f32),
                vel: Vec2::ZERO,
                life: 1.0,
                color: 0xffffff,
                size: 2.0,
                kind: ParticleKind::Spark,
            });
        }
        assert_eq!(s.particles.len(), 2);
        assert_eq!(s.particles[0].pos, Vec2::splat(1.0));
    }

    #[test]
    fn test_refreshing_effect_does_not_stack() {
        let mut s = state();
        s.activate_effect(PowerUpKind::DamageBoost.effect(), 1_000.0);
        s.activate_effect(PowerUpKind::DamageBoost.effect(), 5_000.0);
        assert_eq!(s.active_effects.len(), 1);
        assert_eq!(s.active_effects[0].expires_at, 5_000.0);
        assert_eq!(s.damage_multiplier(), 2.0);
    }

    #[test]
    fn test_reset_keeps_high_score() {
        let mut s = state();
        s.high_score = 4_200;
        s.player.score = 900;
        s.enemies.push(Enemy::new(Vec2::ZERO, 60.0, 6.0, 0.0));
        s.reset_session(250.0);
        assert_eq!(s.high_score, 4_200);
        assert_eq!(s.player.score, 0);
        assert!(s.enemies.is_empty());
        assert_eq!(s.stats.started_at, 250.0);
        assert_eq!(s.last_enemy_spawn, 250.0);
    }

    #[test]
    fn test_shake_only_while_playing() {
        let mut s = state();
        s.shake_screen(5.0, 200.0);
        assert!(!s.shake.is_active());
        s.mode = GameMode::Playing;
        s.shake_screen(5.0, 200.0);
        assert!(s.shake.is_active());
        s.shake.decay(250.0);
        assert_eq!(s.shake.intensity, 0.0);
    }
}
