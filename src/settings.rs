//! Game settings, preferences and gameplay tuning
//!
//! Settings are persisted as JSON next to the high score. `Tuning` is not
//! persisted; it is derived from the device profile at session start.

use serde::{Deserialize, Serialize};

use crate::consts::MOBILE_BREAKPOINT;
use crate::platform::storage::KeyValueStore;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum live particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 150,
            QualityPreset::Medium => 500,
            QualityPreset::High => 2000,
        }
    }

    /// Number of background stars drawn
    pub fn star_count(&self) -> usize {
        match self {
            QualityPreset::Low => 60,
            QualityPreset::Medium => 120,
            QualityPreset::High => 200,
        }
    }
}

/// Which tuning table to play with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DeviceProfile {
    /// Pick from the viewport width at session start
    #[default]
    Auto,
    Desktop,
    Mobile,
}

impl DeviceProfile {
    /// Resolve `Auto` against a viewport width
    pub fn resolve(self, viewport_width: f32) -> DeviceProfile {
        match self {
            DeviceProfile::Auto if viewport_width <= MOBILE_BREAKPOINT => DeviceProfile::Mobile,
            DeviceProfile::Auto => DeviceProfile::Desktop,
            other => other,
        }
    }
}

/// Numeric gameplay constants for one device profile.
///
/// Speeds are px per reference frame, times are milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    /// Upper bound on a single tick's delta
    pub max_frame_dt_ms: f32,

    // === Player ===
    pub player_speed: f32,
    pub energy_regen_per_ms: f32,
    pub thruster_ramp_per_ms: f32,
    pub thruster_decay_per_ms: f32,
    pub shot_cooldown_ms: f64,
    pub shot_energy_cost: f32,
    pub player_bullet_speed: f32,
    pub player_bullet_damage: f32,
    /// Extra max health granted per level (0 = heal only)
    pub max_health_per_level: f32,

    // === Enemies ===
    pub enemy_base_health: f32,
    pub enemy_health_per_tier: f32,
    pub enemy_base_speed: f32,
    /// Tier-proportional floor for the base speed
    pub enemy_base_speed_per_tier: f32,
    pub enemy_speed_per_tier: f32,
    pub enemy_speed_variation: f32,
    pub enemy_shot_delay_ms: f64,
    pub enemy_shot_variation_ms: f64,
    pub enemy_bullet_speed: f32,
    pub enemy_bullet_damage: f32,

    // === Spawning ===
    pub spawn_base_ms: f64,
    pub spawn_level_step_ms: f64,
    pub spawn_tier_step_ms: f64,
    pub spawn_min_ms: f64,
    /// Score per difficulty tier
    pub score_tier: u64,
    /// Tiers per extra enemy in a spawn cluster
    pub cluster_tier_step: u64,
    pub max_cluster: usize,
    pub power_up_interval_ms: f64,
    pub power_up_jitter_ms: f64,
    pub power_up_drop_chance: f64,
    pub power_up_fall_speed: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self::desktop()
    }
}

impl Tuning {
    pub fn desktop() -> Self {
        Self {
            max_frame_dt_ms: 50.0,

            player_speed: 10.0,
            energy_regen_per_ms: 0.05,
            thruster_ramp_per_ms: 0.005,
            thruster_decay_per_ms: 0.003,
            shot_cooldown_ms: 150.0,
            shot_energy_cost: 8.0,
            player_bullet_speed: 16.0,
            player_bullet_damage: 25.0,
            max_health_per_level: 0.0,

            enemy_base_health: 60.0,
            enemy_health_per_tier: 10.0,
            enemy_base_speed: 6.0,
            enemy_base_speed_per_tier: 0.0,
            enemy_speed_per_tier: 0.5,
            enemy_speed_variation: 10.0,
            enemy_shot_delay_ms: 800.0,
            enemy_shot_variation_ms: 600.0,
            enemy_bullet_speed: 6.0,
            enemy_bullet_damage: 20.0,

            spawn_base_ms: 800.0,
            spawn_level_step_ms: 40.0,
            spawn_tier_step_ms: 50.0,
            spawn_min_ms: 200.0,
            score_tier: 1000,
            cluster_tier_step: 5,
            max_cluster: 5,
            power_up_interval_ms: 12_000.0,
            power_up_jitter_ms: 8_000.0,
            power_up_drop_chance: 0.2,
            power_up_fall_speed: 4.0,
        }
    }

    /// Gentler profile for small touch screens
    pub fn mobile() -> Self {
        Self {
            enemy_base_health: 40.0,
            enemy_base_speed: 4.0,
            enemy_base_speed_per_tier: 0.5,
            enemy_speed_variation: 5.0,
            enemy_shot_delay_ms: 1200.0,
            enemy_shot_variation_ms: 800.0,
            enemy_bullet_speed: 4.0,
            spawn_base_ms: 1200.0,
            spawn_level_step_ms: 30.0,
            ..Self::desktop()
        }
    }

    pub fn for_profile(profile: DeviceProfile) -> Self {
        match profile {
            DeviceProfile::Mobile => Self::mobile(),
            DeviceProfile::Desktop | DeviceProfile::Auto => Self::desktop(),
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Tuning profile selection
    pub profile: DeviceProfile,
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Visual Effects ===
    /// Screen shake on explosions/impacts
    pub screen_shake: bool,
    /// Particle effects (explosions, thrusters, sparks)
    pub particles: bool,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,

    // === Accessibility ===
    /// Reduced motion (no shake)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            profile: DeviceProfile::Auto,
            quality: QualityPreset::Medium,
            screen_shake: true,
            particles: true,
            show_fps: false,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "spaceShooter-settings";

    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Tuning table for a viewport width
    pub fn tuning_for(&self, viewport_width: f32) -> Tuning {
        Tuning::for_profile(self.profile.resolve(viewport_width))
    }

    /// Load settings, falling back to defaults on any storage problem
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from storage");
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring unreadable settings: {}", e);
                    Self::default()
                }
            },
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Settings unavailable ({}), using defaults", e);
                Self::default()
            }
        }
    }

    /// Save settings; failures are logged, never fatal
    pub fn save(&self, store: &mut dyn KeyValueStore) {
        let result = serde_json::to_string(self)
            .map_err(crate::GameError::from)
            .and_then(|json| store.set(Self::STORAGE_KEY, &json));
        match result {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Settings not saved: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::storage::MemoryStore;

    #[test]
    fn test_auto_profile_uses_breakpoint() {
        assert_eq!(DeviceProfile::Auto.resolve(768.0), DeviceProfile::Mobile);
        assert_eq!(DeviceProfile::Auto.resolve(1280.0), DeviceProfile::Desktop);
        assert_eq!(DeviceProfile::Desktop.resolve(320.0), DeviceProfile::Desktop);
    }

    #[test]
    fn test_mobile_tuning_is_gentler() {
        let desktop = Tuning::desktop();
        let mobile = Tuning::mobile();
        assert!(mobile.enemy_base_health < desktop.enemy_base_health);
        assert!(mobile.spawn_base_ms > desktop.spawn_base_ms);
        assert!(mobile.enemy_bullet_speed < desktop.enemy_bullet_speed);
        assert_eq!(mobile.player_bullet_damage, desktop.player_bullet_damage);
    }

    #[test]
    fn test_settings_round_trip_through_store() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::from_preset(QualityPreset::High);
        settings.reduced_motion = true;
        settings.save(&mut store);

        let loaded = Settings::load(&store);
        assert_eq!(loaded.quality, QualityPreset::High);
        assert!(!loaded.effective_screen_shake());
    }

    #[test]
    fn test_corrupt_settings_fall_back_to_default() {
        let mut store = MemoryStore::new();
        store.set(Settings::STORAGE_KEY, "{not json").unwrap();
        let loaded = Settings::load(&store);
        assert_eq!(loaded.quality, QualityPreset::Medium);
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let mut store = MemoryStore::new();
        store.set(Settings::STORAGE_KEY, r#"{"quality":"Low"}"#).unwrap();
        let loaded = Settings::load(&store);
        assert_eq!(loaded.quality, QualityPreset::Low);
        assert!(loaded.screen_shake);
    }

    #[test]
    fn test_particles_off_means_zero_budget() {
        let settings = Settings {
            particles: false,
            ..Settings::default()
        };
        assert_eq!(settings.max_particles(), 0);
    }
}
