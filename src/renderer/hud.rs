//! Heads-up display and mode overlays

use glam::Vec2;

use super::surface::{Rgba, Surface, TextAlign};
use crate::share::{self, ShareCard};
use crate::sim::state::GameState;

const HEALTH: Rgba = Rgba::hex(0xff4444);
const ENERGY: Rgba = Rgba::hex(0x00aaff);
const SHIELD: Rgba = Rgba::hex(0x4ecdc4);
const ACCENT: Rgba = Rgba::hex(0xffd700);
const DIM: Rgba = Rgba::hex(0xaaaaaa);

const BAR_WIDTH: f32 = 200.0;
const BAR_HEIGHT: f32 = 12.0;

fn bar(surface: &mut dyn Surface, pos: Vec2, label: &str, value: f32, max: f32, color: Rgba) {
    let fill = if max > 0.0 {
        (value / max).clamp(0.0, 1.0)
    } else {
        0.0
    };
    surface.text(label, pos + Vec2::new(0.0, -4.0), 12.0, DIM, TextAlign::Left);
    surface.fill_rect(pos, Vec2::new(BAR_WIDTH, BAR_HEIGHT), Rgba::hex(0x222233));
    surface.fill_rect(pos, Vec2::new(BAR_WIDTH * fill, BAR_HEIGHT), color);
    surface.stroke_rect(pos, Vec2::new(BAR_WIDTH, BAR_HEIGHT), Rgba::WHITE.alpha(0.4), 1.0);
}

/// Bars, score, level and active effects
pub fn hud(surface: &mut dyn Surface, state: &GameState, fps: Option<u32>) {
    let size = surface.size();
    let player = &state.player;

    bar(surface, Vec2::new(20.0, 30.0), "HEALTH", player.health, player.max_health, HEALTH);
    bar(surface, Vec2::new(20.0, 62.0), "ENERGY", player.energy, player.max_energy, ENERGY);
    if player.shield > 0.0 {
        bar(surface, Vec2::new(20.0, 94.0), "SHIELD", player.shield, crate::consts::MAX_SHIELD, SHIELD);
    }

    let right = Vec2::new(size.x - 20.0, 0.0);
    surface.text(
        &format!("SCORE: {}", player.score),
        right + Vec2::new(0.0, 36.0),
        20.0,
        Rgba::WHITE,
        TextAlign::Right,
    );
    surface.text(
        &format!("LEVEL: {}", player.level),
        right + Vec2::new(0.0, 60.0),
        16.0,
        ACCENT,
        TextAlign::Right,
    );
    surface.text(
        &format!("HIGH: {}", state.high_score.max(player.score)),
        right + Vec2::new(0.0, 82.0),
        14.0,
        DIM,
        TextAlign::Right,
    );

    let mut y = 130.0;
    for effect in &state.active_effects {
        let secs = ((effect.expires_at - state.now_ms).max(0.0) / 1000.0).ceil();
        surface.text(
            &format!("{} {}s", effect.kind.label(), secs),
            Vec2::new(20.0, y),
            14.0,
            Rgba::hex(effect.kind.color()),
            TextAlign::Left,
        );
        y += 20.0;
    }

    if let Some(fps) = fps {
        surface.text(
            &format!("{} FPS", fps),
            Vec2::new(size.x - 20.0, size.y - 12.0),
            12.0,
            DIM,
            TextAlign::Right,
        );
    }
}

fn dim(surface: &mut dyn Surface, alpha: f32) {
    let size = surface.size();
    surface.fill_rect(Vec2::ZERO, size, Rgba::BLACK.alpha(alpha));
}

fn centered(surface: &mut dyn Surface, text: &str, y: f32, size: f32, color: Rgba) {
    let x = surface.size().x / 2.0;
    surface.text(text, Vec2::new(x, y), size, color, TextAlign::Center);
}

pub fn intro(surface: &mut dyn Surface, state: &GameState, time_ms: f64) {
    let h = surface.size().y;
    dim(surface, 0.5);
    let top = (h * 0.2).max(100.0);

    surface.set_glow(ENERGY, 20.0);
    centered(surface, "SPACE SHOOTER", top, 56.0, Rgba::WHITE);
    surface.set_glow(ENERGY, 0.0);
    centered(surface, "Defend Earth from the Alien Invasion!", top + 60.0, 24.0, DIM);

    centered(surface, "HOW TO PLAY:", top + 120.0, 22.0, ACCENT);
    let lines = [
        "WASD / Arrow keys or drag - Move",
        "SPACE or hold touch - Shoot",
        "P / ESC - Pause",
        "Collect power-ups for health, energy, shields and more",
    ];
    for (i, line) in lines.iter().enumerate() {
        centered(surface, line, top + 150.0 + i as f32 * 26.0, 16.0, Rgba::WHITE);
    }

    if state.high_score > 0 {
        centered(
            surface,
            &format!("HIGH SCORE: {}", state.high_score),
            top + 270.0,
            18.0,
            ACCENT,
        );
    }

    let blink = 0.5 + 0.5 * (time_ms as f32 * 0.005).sin();
    centered(
        surface,
        "Press SPACE or click to start",
        top + 320.0,
        22.0,
        Rgba::WHITE.alpha(0.4 + 0.6 * blink),
    );
}

pub fn paused(surface: &mut dyn Surface) {
    let h = surface.size().y;
    dim(surface, 0.6);
    centered(surface, "PAUSED", h / 2.0 - 20.0, 48.0, Rgba::WHITE);
    centered(surface, "Press P or ESC to resume", h / 2.0 + 30.0, 18.0, DIM);
}

pub fn game_over(surface: &mut dyn Surface, state: &GameState) {
    let h = surface.size().y;
    dim(surface, 0.7);
    let card = ShareCard::from_state(state);
    let top = h / 2.0 - 150.0;

    centered(surface, "GAME OVER", top, 52.0, HEALTH);
    if card.new_high_score {
        centered(surface, "NEW HIGH SCORE!", top + 45.0, 22.0, ACCENT);
    }
    let lines = [
        format!("Final Score: {}", card.score),
        format!("Level Reached: {}", card.level),
        format!("Enemies Destroyed: {}", card.enemies_killed),
        format!("Power-ups Collected: {}", card.power_ups_collected),
        format!("Shots Fired: {}", card.shots_fired),
        format!("Time Survived: {}", share::format_duration(card.survived_secs)),
    ];
    for (i, line) in lines.iter().enumerate() {
        centered(surface, line, top + 90.0 + i as f32 * 26.0, 18.0, Rgba::WHITE);
    }
    centered(
        surface,
        "Press SPACE or R to play again - X to share",
        top + 270.0,
        18.0,
        DIM,
    );
}

/// Share card preview over the game-over report
pub fn share_preview(surface: &mut dyn Surface, state: &GameState) {
    let size = surface.size();
    game_over(surface, state);
    dim(surface, 0.5);

    let card = ShareCard::from_state(state);
    let scale = (size.x.min(size.y) * 0.8 / share::CARD_SIZE).min(1.0);
    let extent = share::CARD_SIZE * scale;
    let origin = (size - Vec2::splat(extent)) / 2.0;
    share::draw_card(surface, &card, origin, scale);
    centered(surface, "ESC to close - R to play again", origin.y + extent + 24.0, 16.0, DIM);
}
