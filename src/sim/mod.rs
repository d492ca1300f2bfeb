//! Simulation module
//!
//! All gameplay logic lives here. It has no rendering or platform
//! dependencies:
//! - Seeded RNG only (same seed and inputs, same session)
//! - Time arrives as arguments, never read from a clock
//! - Only `Playing` mutates entities

pub mod collision;
pub mod flow;
pub mod particles;
pub mod spawner;
pub mod state;
pub mod tick;

pub use collision::{CollisionReport, absorb_damage};
pub use particles::Blast;
pub use state::{
    ActiveEffect, Bullet, Enemy, EnemyKind, GameEvent, GameMode, GameState, Owner, Particle,
    ParticleKind, Player, PowerUp, PowerUpEffect, PowerUpKind, ScreenShake, SessionStats,
    TrailPoint, Viewport,
};
pub use tick::{TickInput, tick};
