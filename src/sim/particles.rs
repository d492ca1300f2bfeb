//! Particle emitters and per-kind decay
//!
//! Particles are cosmetic. They never affect gameplay, so the budget from
//! the quality preset may drop them freely (oldest first).

use glam::Vec2;
use rand::Rng;

use super::state::{GameState, Particle, ParticleKind, Viewport};
use crate::consts::CULL_MARGIN;

/// Explosion size class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blast {
    Medium,
    Large,
}

impl Blast {
    fn count(self) -> usize {
        match self {
            Blast::Medium => 12,
            Blast::Large => 20,
        }
    }

    fn max_size(self) -> f32 {
        match self {
            Blast::Medium => 5.0,
            Blast::Large => 8.0,
        }
    }
}

/// Symmetric random value in `[-half, half)`
fn spread(rng: &mut impl Rng, half: f32) -> f32 {
    (rng.random::<f32>() - 0.5) * 2.0 * half
}

/// Radial burst of explosion particles
pub fn explosion(state: &mut GameState, pos: Vec2, color: u32, blast: Blast) {
    for _ in 0..blast.count() {
        let rng = &mut state.rng;
        let particle = Particle {
            pos,
            vel: Vec2::new(spread(rng, 7.5), spread(rng, 7.5)),
            life: 0.8 + rng.random::<f32>() * 0.5,
            color,
            size: rng.random::<f32>() * blast.max_size() + 2.0,
            kind: ParticleKind::Explosion,
        };
        state.push_particle(particle);
    }
}

/// Exhaust behind the player ship
pub fn thruster(state: &mut GameState, ship: Vec2) {
    for _ in 0..3 {
        let rng = &mut state.rng;
        let particle = Particle {
            pos: ship + Vec2::new(spread(rng, 5.0), 15.0),
            vel: Vec2::new(spread(rng, 1.5), rng.random::<f32>() * 3.0 + 2.0),
            life: 0.5,
            color: 0x00aaff,
            size: rng.random::<f32>() * 3.0 + 1.0,
            kind: ParticleKind::Thruster,
        };
        state.push_particle(particle);
    }
}

/// Muzzle flash at the ship's nose
pub fn muzzle_flash(state: &mut GameState, ship: Vec2) {
    for _ in 0..5 {
        let rng = &mut state.rng;
        let particle = Particle {
            pos: ship + Vec2::new(spread(rng, 5.0), -20.0),
            vel: Vec2::new(spread(rng, 3.0), -rng.random::<f32>() * 4.0),
            life: 0.3,
            color: 0xffffff,
            size: rng.random::<f32>() * 3.0 + 1.0,
            kind: ParticleKind::Spark,
        };
        state.push_particle(particle);
    }
}

/// Ring of sparks when a power-up is collected
pub fn pickup_burst(state: &mut GameState, pos: Vec2, color: u32) {
    const RING: usize = 12;
    for i in 0..RING {
        let angle = std::f32::consts::TAU * (i as f32 / RING as f32);
        let speed = 3.0 + state.rng.random::<f32>();
        let particle = Particle {
            pos,
            vel: Vec2::from_angle(angle) * speed,
            life: 0.4,
            color,
            size: 2.5,
            kind: ParticleKind::Spark,
        };
        state.push_particle(particle);
    }
}

/// Hull fragments knocked off the player's ship
pub fn debris(state: &mut GameState, pos: Vec2) {
    for _ in 0..6 {
        let rng = &mut state.rng;
        let particle = Particle {
            pos,
            vel: Vec2::new(spread(rng, 4.0), spread(rng, 4.0)),
            life: 1.0 + rng.random::<f32>(),
            color: 0x888888,
            size: rng.random::<f32>() * 3.0 + 2.0,
            kind: ParticleKind::Debris,
        };
        state.push_particle(particle);
    }
}

/// Advance every particle by `dt_ms` and drop the dead ones, including
/// any that drifted past the cull margin.
///
/// Shrink and damping factors are per reference frame, so they are raised
/// to the power of `frames`.
pub fn update(particles: &mut Vec<Particle>, viewport: &Viewport, dt_ms: f32, frames: f32) {
    let shrink = 0.98_f32.powf(frames);
    let damping = 0.95_f32.powf(frames);
    for p in particles.iter_mut() {
        p.pos += p.vel * frames;
        p.life -= dt_ms * 0.001;
        match p.kind {
            ParticleKind::Thruster => {
                p.size *= shrink;
                p.vel.y += 0.1 * frames;
            }
            ParticleKind::Explosion => {
                p.size *= shrink;
                p.vel *= damping;
            }
            ParticleKind::Spark | ParticleKind::Debris => {}
        }
    }
    particles.retain(|p| !p.is_dead() && viewport.contains_expanded(p.pos, CULL_MARGIN));
}
