//! Collision detection and resolution
//!
//! Everything is a circle test against a fixed radius around the target's
//! center, swept along the bullet's path relative to the target so a long
//! frame cannot carry the two past each other. Bullets are removed on their
//! first hit.

use glam::Vec2;

use super::particles::{self, Blast};
use super::spawner;
use super::state::{Bullet, GameEvent, GameState, Owner};
use crate::consts::*;
use crate::distance;

/// True if `point` lies strictly within `radius` of `center`
pub fn hits(point: Vec2, center: Vec2, radius: f32) -> bool {
    distance(point, center) < radius
}

/// True if the segment `from..to` passes strictly within `radius` of `center`
pub fn sweep_hits(from: Vec2, to: Vec2, center: Vec2, radius: f32) -> bool {
    let path = to - from;
    let len_sq = path.length_squared();
    let t = if len_sq > 0.0 {
        ((center - from).dot(path) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    hits(from + path * t, center, radius)
}

/// Bullet path this tick as seen from a target that moved `target_prev -> target`
fn relative_hit(bullet: &Bullet, target_prev: Vec2, target: Vec2, radius: f32) -> bool {
    sweep_hits(bullet.prev + (target - target_prev), bullet.pos, target, radius)
}

/// Split incoming damage between shield and hull.
///
/// Returns `(shield_after, hull_damage)` with
/// `shield_after = max(0, shield - damage)` and
/// `hull_damage = max(0, damage - shield)`.
pub fn absorb_damage(shield: f32, damage: f32) -> (f32, f32) {
    let shield = shield.max(0.0);
    let damage = damage.max(0.0);
    ((shield - damage).max(0.0), (damage - shield).max(0.0))
}

/// What happened during one collision pass
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionReport {
    pub enemies_hit: u32,
    pub enemies_killed: u32,
    pub player_hits: u32,
    /// Player health reached zero
    pub player_destroyed: bool,
}

/// Player bullets against enemies
fn resolve_player_bullets(state: &mut GameState, report: &mut CollisionReport) {
    let mut i = 0;
    while i < state.bullets.len() {
        let bullet = &state.bullets[i];
        if bullet.owner != Owner::Player {
            i += 1;
            continue;
        }
        let Some(target) = state
            .enemies
            .iter()
            .position(|e| relative_hit(bullet, e.prev, e.pos, ENEMY_HIT_RADIUS))
        else {
            i += 1;
            continue;
        };

        let damage = state.bullets.remove(i).damage;
        let enemy = &mut state.enemies[target];
        enemy.health -= damage;
        let (enemy_pos, dead) = (enemy.pos, enemy.health <= 0.0);

        report.enemies_hit += 1;
        state.stats.damage_dealt += damage;
        particles::explosion(state, enemy_pos, 0xff6b6b, Blast::Medium);
        state.shake_screen(3.0, 150.0);

        if dead {
            state.enemies.remove(target);
            state.player.score += KILL_REWARD;
            state.stats.enemies_killed += 1;
            report.enemies_killed += 1;
            particles::explosion(state, enemy_pos, 0xffaa00, Blast::Large);
            state.shake_screen(5.0, 200.0);
            spawner::maybe_drop(state, enemy_pos);
        }
    }
}

/// Enemy bullets against the player; stops at the lethal hit
fn resolve_enemy_bullets(state: &mut GameState, report: &mut CollisionReport) {
    if state.player.invincible {
        return;
    }
    let (ship_prev, ship) = (state.player.prev, state.player.pos);
    let mut i = 0;
    while i < state.bullets.len() {
        let bullet = &state.bullets[i];
        if bullet.owner != Owner::Enemy || !relative_hit(bullet, ship_prev, ship, PLAYER_HIT_RADIUS) {
            i += 1;
            continue;
        }
        let damage = bullet.damage;
        state.bullets.remove(i);

        let (shield, hull_damage) = absorb_damage(state.player.shield, damage);
        state.player.shield = shield;
        report.player_hits += 1;
        if hull_damage > 0.0 {
            state.player.health = (state.player.health - hull_damage).max(0.0);
            state.shake_screen(8.0, 300.0);
            state.events.push(GameEvent::PlayerHit { hull_damage });
        }
        let player_pos = state.player.pos;
        particles::explosion(state, player_pos, 0xff4444, Blast::Medium);
        if hull_damage > 0.0 {
            particles::debris(state, player_pos);
        }

        if state.player.is_dead() {
            report.player_destroyed = true;
            return;
        }
    }
}

/// Resolve all bullet hits for this tick
pub fn resolve(state: &mut GameState) -> CollisionReport {
    let mut report = CollisionReport::default();
    resolve_player_bullets(state, &mut report);
    resolve_enemy_bullets(state, &mut report);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Tuning;
    use crate::sim::state::{Bullet, Enemy, GameMode, Viewport};
    use proptest::prelude::*;

    fn playing() -> GameState {
        let mut s = GameState::new(Viewport::new(800.0, 600.0), Tuning::desktop(), 0, 11);
        s.mode = GameMode::Playing;
        s.tuning.power_up_drop_chance = 0.0;
        s
    }

    #[test]
    fn test_bullet_hits_enemy() {
        let mut s = playing();
        s.enemies.push(Enemy::new(Vec2::new(100.0, 100.0), 60.0, 6.0, 0.0));
        s.bullets
            .push(Bullet::new(Owner::Player, Vec2::new(110.0, 100.0), Vec2::new(0.0, -16.0), 25.0));

        let report = resolve(&mut s);
        assert_eq!(report.enemies_hit, 1);
        assert_eq!(s.enemies[0].health, 35.0);
        assert!(s.bullets.is_empty());
        assert_eq!(s.player.score, 0);
        assert_eq!(s.stats.damage_dealt, 25.0);
    }

    #[test]
    fn test_radius_is_strict() {
        let mut s = playing();
        s.enemies.push(Enemy::new(Vec2::new(100.0, 100.0), 60.0, 6.0, 0.0));
        s.bullets
            .push(Bullet::new(Owner::Player, Vec2::new(125.0, 100.0), Vec2::ZERO, 25.0));
        assert_eq!(resolve(&mut s).enemies_hit, 0);
        assert_eq!(s.bullets.len(), 1);
    }

    #[test]
    fn test_sweep_hits_closest_point_on_path() {
        let center = Vec2::new(100.0, 100.0);
        assert!(sweep_hits(Vec2::new(100.0, 200.0), Vec2::new(100.0, 0.0), center, 25.0));
        assert!(!sweep_hits(Vec2::new(130.0, 200.0), Vec2::new(130.0, 0.0), center, 25.0));
        // Path ends short of the circle
        assert!(!sweep_hits(Vec2::new(100.0, 200.0), Vec2::new(100.0, 126.0), center, 25.0));
        // Degenerate path is a point test
        assert!(sweep_hits(center, center, center, 25.0));
    }

    #[test]
    fn test_bullet_and_enemy_crossing_in_one_tick_collide() {
        let mut s = playing();
        let mut enemy = Enemy::new(Vec2::new(100.0, 266.0), 60.0, 12.0, 0.0);
        enemy.prev = Vec2::new(100.0, 230.0);
        s.enemies.push(enemy);
        let mut bullet = Bullet::new(Owner::Player, Vec2::new(100.0, 212.0), Vec2::new(0.0, -16.0), 25.0);
        bullet.prev = Vec2::new(100.0, 260.0);
        s.bullets.push(bullet);

        assert_eq!(resolve(&mut s).enemies_hit, 1);
        assert_eq!(s.enemies[0].health, 35.0);
        assert!(s.bullets.is_empty());
    }

    #[test]
    fn test_bullet_passing_beside_enemy_misses() {
        let mut s = playing();
        s.enemies.push(Enemy::new(Vec2::new(100.0, 200.0), 60.0, 0.0, 0.0));
        let mut bullet = Bullet::new(Owner::Player, Vec2::new(130.0, 100.0), Vec2::new(0.0, -16.0), 25.0);
        bullet.prev = Vec2::new(130.0, 300.0);
        s.bullets.push(bullet);
        assert_eq!(resolve(&mut s).enemies_hit, 0);
        assert_eq!(s.bullets.len(), 1);
    }

    #[test]
    fn test_enemy_bullet_passing_through_player_hits() {
        let mut s = playing();
        let pos = s.player.pos;
        let mut bullet = Bullet::new(Owner::Enemy, pos + Vec2::new(0.0, 30.0), Vec2::new(0.0, 20.0), 20.0);
        bullet.prev = pos - Vec2::new(0.0, 30.0);
        s.bullets.push(bullet);
        assert_eq!(resolve(&mut s).player_hits, 1);
        assert_eq!(s.player.health, 80.0);
    }

    #[test]
    fn test_kill_awards_score_once() {
        let mut s = playing();
        s.enemies.push(Enemy::new(Vec2::new(100.0, 100.0), 20.0, 6.0, 0.0));
        for _ in 0..2 {
            s.bullets
                .push(Bullet::new(Owner::Player, Vec2::new(100.0, 105.0), Vec2::ZERO, 25.0));
        }
        let report = resolve(&mut s);
        assert_eq!(report.enemies_killed, 1);
        assert_eq!(s.player.score, KILL_REWARD);
        assert_eq!(s.stats.enemies_killed, 1);
        assert!(s.enemies.is_empty());
        // The second bullet had nothing left to hit
        assert_eq!(s.bullets.len(), 1);
        assert!(s.shake.is_active());
    }

    #[test]
    fn test_shield_absorbs_before_hull() {
        let mut s = playing();
        s.player.shield = 15.0;
        let pos = s.player.pos;
        s.bullets.push(Bullet::new(Owner::Enemy, pos, Vec2::ZERO, 20.0));
        let report = resolve(&mut s);
        assert_eq!(report.player_hits, 1);
        assert_eq!(s.player.shield, 0.0);
        assert_eq!(s.player.health, 95.0);
        assert!(s.bullets.is_empty());
    }

    #[test]
    fn test_fully_absorbed_hit_does_not_shake() {
        let mut s = playing();
        s.player.shield = 100.0;
        let pos = s.player.pos;
        s.bullets.push(Bullet::new(Owner::Enemy, pos, Vec2::ZERO, 20.0));
        resolve(&mut s);
        assert_eq!(s.player.shield, 80.0);
        assert_eq!(s.player.health, 100.0);
        assert!(!s.shake.is_active());
        assert!(s.events.is_empty());
    }

    #[test]
    fn test_invincible_player_ignores_bullets() {
        let mut s = playing();
        s.player.invincible = true;
        let pos = s.player.pos;
        s.bullets.push(Bullet::new(Owner::Enemy, pos, Vec2::ZERO, 20.0));
        resolve(&mut s);
        assert_eq!(s.player.health, 100.0);
        assert_eq!(s.bullets.len(), 1);
    }

    #[test]
    fn test_lethal_hit_clamps_and_stops() {
        let mut s = playing();
        s.player.health = 10.0;
        let pos = s.player.pos;
        for _ in 0..3 {
            s.bullets.push(Bullet::new(Owner::Enemy, pos, Vec2::ZERO, 20.0));
        }
        let report = resolve(&mut s);
        assert!(report.player_destroyed);
        assert_eq!(s.player.health, 0.0);
        assert_eq!(report.player_hits, 1);
        assert_eq!(s.bullets.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_absorb_damage_conserves(shield in 0.0f32..=100.0, damage in 0.0f32..500.0) {
            let (after, hull) = absorb_damage(shield, damage);
            prop_assert!(after >= 0.0 && hull >= 0.0);
            prop_assert!(after <= shield);
            prop_assert!(((shield - after) + hull - damage).abs() < 1e-3);
            prop_assert_eq!(after, (shield - damage).max(0.0));
            prop_assert_eq!(hull, (damage - shield).max(0.0));
        }
    }
}
