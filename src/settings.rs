//! Physics tuning and preferences
//!
//! Persisted as JSON next to the runner. Every field has a default so older
//! or partial files still load.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bindings::ControlBindings;

/// Top speed, acceleration and deceleration for one movement regime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedProfile {
    pub top_speed: i32,
    pub acceleration: i32,
    pub deceleration: i32,
}

impl SpeedProfile {
    pub const NORMAL: SpeedProfile = SpeedProfile {
        top_speed: 0x600,
        acceleration: 0xC,
        deceleration: 0x80,
    };
    pub const UNDERWATER: SpeedProfile = SpeedProfile {
        top_speed: 0x300,
        acceleration: 0x6,
        deceleration: 0x40,
    };
    pub const SPEED_SHOES: SpeedProfile = SpeedProfile {
        top_speed: 0xC00,
        acceleration: 0x18,
        deceleration: 0x80,
    };
}

/// Movement constants that level content is tuned around
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    pub normal: SpeedProfile,
    pub underwater: SpeedProfile,
    pub speed_shoes: SpeedProfile,
    /// Added to y_vel every airborne tick
    pub gravity: i32,
    /// Subtracted from gravity below the water line
    pub water_gravity_cut: i32,
    pub jump_speed: i32,
    pub water_jump_speed: i32,
    /// Upward speed a released jump is cut to
    pub jump_release: i32,
    pub water_jump_release: i32,
    /// Braking while rolling against the direction of travel
    pub roll_deceleration: i32,
    /// Release speed indexed by `counter >> 8`
    pub spindash_speeds: [i32; 9],
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            normal: SpeedProfile::NORMAL,
            underwater: SpeedProfile::UNDERWATER,
            speed_shoes: SpeedProfile::SPEED_SHOES,
            gravity: 0x38,
            water_gravity_cut: 0x28,
            jump_speed: 0x680,
            water_jump_speed: 0x380,
            jump_release: 0x400,
            water_jump_release: 0x200,
            roll_deceleration: 0x20,
            spindash_speeds: [
                0x800, 0x880, 0x900, 0x980, 0xA00, 0xA80, 0xB00, 0xB80, 0xC00,
            ],
        }
    }
}

impl PhysicsTuning {
    /// Speed profile for the current regime; water wins over speed shoes
    pub fn profile(&self, underwater: bool, speed_shoes: bool) -> SpeedProfile {
        if underwater {
            self.underwater
        } else if speed_shoes {
            self.speed_shoes
        } else {
            self.normal
        }
    }

    pub fn jump_speed(&self, underwater: bool) -> i32 {
        if underwater { self.water_jump_speed } else { self.jump_speed }
    }

    pub fn jump_release(&self, underwater: bool) -> i32 {
        if underwater { self.water_jump_release } else { self.jump_release }
    }

    /// Release speed for a spin-dash counter
    pub fn spindash_speed(&self, counter: u16) -> i32 {
        let idx = ((counter >> 8) as usize).min(self.spindash_speeds.len() - 1);
        self.spindash_speeds[idx]
    }
}

/// Runner settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Allow the debug-mode hotkey
    pub debug_mode_enabled: bool,
    pub tuning: PhysicsTuning,
    pub bindings: ControlBindings,
}

impl Settings {
    /// Parse settings, surfacing the parse error
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load settings from disk, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring malformed settings {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_fill_defaults() {
        let s = Settings::from_json(r#"{ "debug_mode_enabled": true, "tuning": { "gravity": 64 } }"#)
            .expect("parses");
        assert!(s.debug_mode_enabled);
        assert_eq!(s.tuning.gravity, 64);
        assert_eq!(s.tuning.jump_speed, 0x680);
        assert_eq!(s.bindings, ControlBindings::default());
    }

    #[test]
    fn test_profile_selection() {
        let t = PhysicsTuning::default();
        assert_eq!(t.profile(false, false), SpeedProfile::NORMAL);
        assert_eq!(t.profile(true, true), SpeedProfile::UNDERWATER);
        assert_eq!(t.profile(false, true).top_speed, 0xC00);
    }

    #[test]
    fn test_spindash_table_saturates() {
        let t = PhysicsTuning::default();
        assert_eq!(t.spindash_speed(0), 0x800);
        assert_eq!(t.spindash_speed(0x800), 0xC00);
        assert_eq!(t.spindash_speed(0xFFFF), 0xC00);
    }

    #[test]
    fn test_load_missing_file_defaults() {
        let s = Settings::load(Path::new("/nonexistent/tilerun-settings.json"));
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("tilerun-settings-{}.json", std::process::id()));
        let mut s = Settings::default();
        s.debug_mode_enabled = true;
        s.tuning.roll_deceleration = 0x10;
        s.save(&path).expect("saves");
        let loaded = Settings::load(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, s);
    }
}
