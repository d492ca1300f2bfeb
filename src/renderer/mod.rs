//! Canvas rendering module
//!
//! `render` is a pure function of the game state and the frame time: it
//! reads `&GameState` and only writes to the surface. Screen-shake jitter
//! comes from a hash of the time, not from the simulation RNG.

pub mod hud;
pub mod scene;
pub mod surface;

use glam::Vec2;

pub use surface::{DrawCommand, RecordingSurface, Rgba, Surface, TextAlign};

use crate::settings::{QualityPreset, Settings};
use crate::sim::state::{GameMode, GameState};

/// Per-frame presentation options derived from settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub screen_shake: bool,
    pub star_count: usize,
    /// Shown bottom-right when set
    pub fps: Option<u32>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            screen_shake: true,
            star_count: QualityPreset::Medium.star_count(),
            fps: None,
        }
    }
}

impl RenderOptions {
    pub fn from_settings(settings: &Settings, fps: u32) -> Self {
        Self {
            screen_shake: settings.effective_screen_shake(),
            star_count: settings.quality.star_count(),
            fps: settings.show_fps.then_some(fps),
        }
    }
}

/// Shake offset for this frame (zero unless playing with an active shake)
pub fn shake_offset(state: &GameState, time_ms: f64) -> Vec2 {
    if state.mode != GameMode::Playing || !state.shake.is_active() {
        return Vec2::ZERO;
    }
    let seed = (time_ms as u64 as u32) ^ state.shake.remaining.to_bits();
    let jitter = Vec2::new(scene::hash01(seed) - 0.5, scene::hash01(seed ^ 0x9e37_79b9) - 0.5);
    jitter * state.shake.intensity * 2.0
}

/// Draw one frame with default options
pub fn render(state: &GameState, surface: &mut dyn Surface, time_ms: f64) {
    render_with(state, surface, time_ms, &RenderOptions::default());
}

/// Draw one frame
pub fn render_with(state: &GameState, surface: &mut dyn Surface, time_ms: f64, options: &RenderOptions) {
    scene::starfield(surface, options.star_count, time_ms);

    let offset = if options.screen_shake {
        shake_offset(state, time_ms)
    } else {
        Vec2::ZERO
    };
    surface.save();
    if offset != Vec2::ZERO {
        surface.translate(offset);
    }
    if state.mode != GameMode::Intro {
        scene::entities(surface, state, time_ms);
    }
    surface.restore();

    match state.mode {
        GameMode::Intro => hud::intro(surface, state, time_ms),
        GameMode::Playing => hud::hud(surface, state, options.fps),
        GameMode::Paused => {
            hud::hud(surface, state, options.fps);
            hud::paused(surface);
        }
        GameMode::GameOver => hud::game_over(surface, state),
        GameMode::Share => hud::share_preview(surface, state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Tuning;
    use crate::sim::flow;
    use crate::sim::state::{Enemy, Viewport};

    fn state() -> GameState {
        GameState::new(Viewport::new(800.0, 600.0), Tuning::desktop(), 1234, 8)
    }

    #[test]
    fn test_intro_shows_title_and_high_score() {
        let s = state();
        let mut surface = RecordingSurface::new(800.0, 600.0);
        render(&s, &mut surface, 0.0);
        assert!(surface.has_text("SPACE SHOOTER"));
        assert!(surface.has_text("HIGH SCORE: 1234"));
        assert!(!surface.has_text("SCORE: 0"));
    }

    #[test]
    fn test_shake_translates_only_while_playing() {
        let mut s = state();
        flow::start(&mut s, 0.0).unwrap();
        s.shake.trigger(8.0, 300.0);

        let mut surface = RecordingSurface::new(800.0, 600.0);
        render(&s, &mut surface, 1_000.0);
        let offsets = surface.translations();
        assert_eq!(offsets.len(), 1);
        assert!(offsets[0].x.abs() <= 8.0 && offsets[0].y.abs() <= 8.0);

        // Shake set directly (bypassing pause's clear) still must not move the view
        s.mode = GameMode::Paused;
        s.shake.trigger(8.0, 300.0);
        surface.reset();
        render(&s, &mut surface, 1_000.0);
        assert!(surface.translations().is_empty());
        assert!(surface.has_text("PAUSED"));
    }

    #[test]
    fn test_reduced_motion_disables_shake() {
        let mut s = state();
        flow::start(&mut s, 0.0).unwrap();
        s.shake.trigger(8.0, 300.0);
        let options = RenderOptions {
            screen_shake: false,
            ..RenderOptions::default()
        };
        let mut surface = RecordingSurface::new(800.0, 600.0);
        render_with(&s, &mut surface, 500.0, &options);
        assert!(surface.translations().is_empty());
    }

    #[test]
    fn test_render_is_deterministic_and_leaves_state_alone() {
        let mut s = state();
        flow::start(&mut s, 0.0).unwrap();
        s.enemies.push(Enemy::new(Vec2::new(100.0, 100.0), 60.0, 6.0, 0.0));
        s.shake.trigger(5.0, 200.0);
        let before = (s.enemies.clone(), s.player.clone(), s.shake);

        let mut a = RecordingSurface::new(800.0, 600.0);
        let mut b = RecordingSurface::new(800.0, 600.0);
        render(&s, &mut a, 777.0);
        render(&s, &mut b, 777.0);
        assert_eq!(a.commands, b.commands);
        assert_eq!((s.enemies.clone(), s.player.clone(), s.shake), before);
    }

    #[test]
    fn test_game_over_report() {
        let mut s = state();
        flow::start(&mut s, 0.0).unwrap();
        s.player.score = 2_000;
        s.stats.enemies_killed = 20;
        flow::game_over(&mut s, 65_000.0).unwrap();
        let mut surface = RecordingSurface::new(800.0, 600.0);
        render(&s, &mut surface, 0.0);
        assert!(surface.has_text("GAME OVER"));
        assert!(surface.has_text("NEW HIGH SCORE!"));
        assert!(surface.has_text("Enemies Destroyed: 20"));
        assert!(surface.has_text("Time Survived: 1:05"));
    }

    #[test]
    fn test_fps_only_when_enabled() {
        let mut s = state();
        flow::start(&mut s, 0.0).unwrap();
        let mut surface = RecordingSurface::new(800.0, 600.0);
        let options = RenderOptions {
            fps: Some(60),
            ..RenderOptions::default()
        };
        render_with(&s, &mut surface, 0.0, &options);
        assert!(surface.has_text("60 FPS"));
        surface.reset();
        render(&s, &mut surface, 0.0);
        assert!(!surface.has_text("FPS"));
    }
}
