//! Space Shooter - an arcade shooter engine for a 2D canvas
//!
//! Core modules:
//! - `sim`: Simulation (entities, spawning, collisions, game flow)
//! - `renderer`: Pure state -> surface drawing
//! - `platform`: Browser/native platform abstraction (input, storage, time)
//! - `engine`: Top-level driver that owns the game state
//! - `share`: Game-over share card

pub mod engine;
pub mod error;
pub mod highscores;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod share;
pub mod sim;

pub use engine::{Engine, Snapshot};
pub use error::GameError;
pub use highscores::HighScore;
pub use settings::{DeviceProfile, QualityPreset, Settings, Tuning};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Duration of one reference frame (per-frame speeds are expressed in this unit)
    pub const FRAME_MS: f32 = 1000.0 / 60.0;

    /// Keep the player this far from every viewport edge
    pub const PLAYER_MARGIN: f32 = 30.0;
    /// Player spawns this far above the bottom edge
    pub const PLAYER_SPAWN_OFFSET: f32 = 100.0;
    /// Drag-to-move dead zone (stops jitter at the destination)
    pub const DRAG_DEAD_ZONE: f32 = 5.0;

    /// Entities this far beyond the viewport are culled
    pub const CULL_MARGIN: f32 = 50.0;

    /// Hit radius: player bullet vs enemy
    pub const ENEMY_HIT_RADIUS: f32 = 25.0;
    /// Hit radius: enemy bullet vs player
    pub const PLAYER_HIT_RADIUS: f32 = 20.0;
    /// Pickup radius: power-up vs player
    pub const PICKUP_RADIUS: f32 = 30.0;

    /// Shield pool cap
    pub const MAX_SHIELD: f32 = 100.0;
    /// Score needed per level (level N ends at N * LEVEL_THRESHOLD)
    pub const LEVEL_THRESHOLD: u64 = 1000;
    /// Score awarded per destroyed enemy
    pub const KILL_REWARD: u64 = 100;

    /// Trail samples kept per bullet
    pub const BULLET_TRAIL_LENGTH: usize = 6;
    /// Particles below this size are culled
    pub const PARTICLE_MIN_SIZE: f32 = 0.5;

    /// Viewports at or below this width use the mobile tuning profile
    pub const MOBILE_BREAKPOINT: f32 = 768.0;
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    let d = b - a;
    (d.x * d.x + d.y * d.y).sqrt()
}

/// Unit vector pointing from `from` to `to` (zero when they coincide)
#[inline]
pub fn direction(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Clamp a point into the rectangle `[min, max]`
#[inline]
pub fn clamp_to_rect(p: Vec2, min: Vec2, max: Vec2) -> Vec2 {
    Vec2::new(p.x.clamp(min.x, max.x.max(min.x)), p.y.clamp(min.y, max.y.max(min.y)))
}

/// Angle (radians) of the vector from `from` to `to`
#[inline]
pub fn heading(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_is_euclidean() {
        assert_eq!(distance(Vec2::new(0.0, 0.0), Vec2::new(3.0, 4.0)), 5.0);
        assert_eq!(distance(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0)), 0.0);
    }

    #[test]
    fn test_direction_handles_coincident_points() {
        assert_eq!(direction(Vec2::ONE, Vec2::ONE), Vec2::ZERO);
        let d = direction(Vec2::ZERO, Vec2::new(0.0, 10.0));
        assert!((d - Vec2::new(0.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn test_clamp_to_degenerate_rect() {
        // max below min (tiny viewport) collapses onto min instead of panicking
        let p = clamp_to_rect(Vec2::new(50.0, 50.0), Vec2::new(30.0, 30.0), Vec2::new(10.0, 10.0));
        assert_eq!(p, Vec2::new(30.0, 30.0));
    }
}
