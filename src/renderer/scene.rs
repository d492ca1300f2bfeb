//! World drawing: starfield and entities

use glam::Vec2;

use super::surface::{Rgba, Surface, TextAlign};
use crate::sim::state::{Bullet, Enemy, GameState, Owner, Particle, Player, PowerUp};

const BACKGROUND: Rgba = Rgba::hex(0x05050f);
const PLAYER_COLOR: Rgba = Rgba::hex(0x00aaff);
const ENEMY_COLOR: Rgba = Rgba::hex(0xff3333);
const SHIELD_COLOR: Rgba = Rgba::hex(0x4ecdc4);
const PLAYER_BULLET: Rgba = Rgba::hex(0x00aaff);
const ENEMY_BULLET: Rgba = Rgba::hex(0xff3333);

/// Deterministic 0..1 value for a seed (multiplicative hash)
pub fn hash01(seed: u32) -> f32 {
    let h = seed.wrapping_mul(2654435761);
    (h >> 8) as f32 / (1u32 << 24) as f32
}

/// Scrolling starfield, derived entirely from `time_ms`
pub fn starfield(surface: &mut dyn Surface, count: usize, time_ms: f64) {
    let size = surface.size();
    surface.clear(BACKGROUND);
    for i in 0..count as u32 {
        let x = hash01(i * 3 + 1) * size.x;
        let speed = 0.5 + hash01(i * 3 + 2) * 2.0;
        let base_y = hash01(i * 3 + 3) * size.y;
        let travel = (time_ms / 16.0) as f32 * speed;
        let y = (base_y + travel).rem_euclid(size.y.max(1.0));
        let radius = 0.5 + speed * 0.4;
        let twinkle = 0.5 + 0.5 * ((time_ms as f32 * 0.003) + i as f32).sin();
        surface.fill_circle(Vec2::new(x, y), radius, Rgba::WHITE.alpha(0.3 + 0.5 * twinkle));
    }
}

fn ship_points(pos: Vec2, rotation: f32, outline: &[Vec2]) -> Vec<Vec2> {
    let rot = Vec2::from_angle(rotation);
    outline.iter().map(|p| pos + rot.rotate(*p)).collect()
}

pub fn player(surface: &mut dyn Surface, player: &Player, time_ms: f64) {
    const HULL: [Vec2; 4] = [
        Vec2::new(0.0, -20.0),
        Vec2::new(15.0, 15.0),
        Vec2::new(0.0, 8.0),
        Vec2::new(-15.0, 15.0),
    ];

    // Invincibility blink
    let alpha = if player.invincible && ((time_ms / 100.0) as u64) % 2 == 0 {
        0.4
    } else {
        1.0
    };

    surface.save();
    surface.set_alpha(alpha);

    if player.thruster > 0.0 {
        let flame = 10.0 + player.thruster * 15.0;
        surface.fill_polygon(
            &[
                player.pos + Vec2::new(-6.0, 12.0),
                player.pos + Vec2::new(6.0, 12.0),
                player.pos + Vec2::new(0.0, 12.0 + flame),
            ],
            Rgba::hex(0xffaa00).alpha(player.thruster),
        );
    }

    surface.set_glow(PLAYER_COLOR, 15.0);
    surface.fill_polygon(&ship_points(player.pos, 0.0, &HULL), PLAYER_COLOR);
    surface.set_glow(PLAYER_COLOR, 0.0);

    if player.shield > 0.0 {
        let strength = player.shield / crate::consts::MAX_SHIELD;
        surface.stroke_circle(player.pos, 30.0, SHIELD_COLOR.alpha(0.3 + 0.5 * strength), 2.0);
    }
    surface.restore();
}

pub fn enemy(surface: &mut dyn Surface, enemy: &Enemy) {
    // Nose points up before rotation; rotation already includes the +90 degrees
    const HULL: [Vec2; 5] = [
        Vec2::new(0.0, -18.0),
        Vec2::new(14.0, 4.0),
        Vec2::new(8.0, 14.0),
        Vec2::new(-8.0, 14.0),
        Vec2::new(-14.0, 4.0),
    ];
    surface.set_glow(ENEMY_COLOR, 10.0);
    surface.fill_polygon(&ship_points(enemy.pos, enemy.rotation, &HULL), ENEMY_COLOR);
    surface.set_glow(ENEMY_COLOR, 0.0);
}

pub fn bullet(surface: &mut dyn Surface, bullet: &Bullet) {
    let (color, radius) = match bullet.owner {
        Owner::Player => (PLAYER_BULLET, 3.0),
        Owner::Enemy => (ENEMY_BULLET, 4.0),
    };
    for point in bullet.trail.iter() {
        surface.fill_circle(point.pos, radius * 0.6, color.alpha(point.alpha * 0.5));
    }
    surface.set_glow(color, bullet.glow);
    surface.fill_circle(bullet.pos, radius, color);
    surface.set_glow(color, 0.0);
}

pub fn particle(surface: &mut dyn Surface, particle: &Particle) {
    let color = Rgba::hex(particle.color).alpha(particle.life.min(1.0));
    surface.fill_circle(particle.pos, particle.size, color);
}

pub fn power_up(surface: &mut dyn Surface, power_up: &PowerUp) {
    let kind = power_up.effect.kind;
    let color = Rgba::hex(kind.color());
    let pos = power_up.pos + Vec2::new(0.0, power_up.float_offset);
    let pulse = 1.0 + power_up.phase.sin() * 0.1;

    surface.set_glow(color, 15.0);
    surface.stroke_circle(pos, 15.0 * pulse, color, 2.0);
    surface.set_glow(color, 0.0);
    surface.fill_circle(pos, 12.0 * pulse, color.alpha(0.25));
    let glyph = &kind.label()[..1];
    surface.text(glyph, pos + Vec2::new(0.0, 5.0), 14.0, Rgba::WHITE, TextAlign::Center);
}

/// All entities, back to front
pub fn entities(surface: &mut dyn Surface, state: &GameState, time_ms: f64) {
    for p in &state.particles {
        particle(surface, p);
    }
    for p in &state.power_ups {
        power_up(surface, p);
    }
    for b in &state.bullets {
        bullet(surface, b);
    }
    for e in &state.enemies {
        enemy(surface, e);
    }
    player(surface, &state.player, time_ms);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::surface::{DrawCommand, RecordingSurface};

    #[test]
    fn test_hash01_is_deterministic_and_in_range() {
        for seed in 0..1000 {
            let v = hash01(seed);
            assert!((0.0..1.0).contains(&v));
            assert_eq!(v, hash01(seed));
        }
    }

    #[test]
    fn test_starfield_wraps_inside_surface() {
        let mut surface = RecordingSurface::new(320.0, 240.0);
        starfield(&mut surface, 50, 123_456.0);
        let stars: Vec<_> = surface
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillCircle { center, .. } => Some(*center),
                _ => None,
            })
            .collect();
        assert_eq!(stars.len(), 50);
        assert!(stars.iter().all(|s| s.y >= 0.0 && s.y < 240.0));
    }

    #[test]
    fn test_enemy_hull_follows_rotation() {
        let mut surface = RecordingSurface::new(100.0, 100.0);
        let mut e = Enemy::new(Vec2::new(50.0, 50.0), 60.0, 6.0, 0.0);
        e.rotation = std::f32::consts::PI;
        enemy(&mut surface, &e);
        let nose = surface.commands.iter().find_map(|c| match c {
            DrawCommand::FillPolygon { points, .. } => Some(points[0]),
            _ => None,
        });
        // Flipped: nose now points down
        let nose = nose.unwrap();
        assert!((nose - Vec2::new(50.0, 68.0)).length() < 1e-3);
    }
}
