//! Simulator settings
//!
//! Loaded from a JSON file on native, passed in as a JSON string on the web.
//! Missing fields take their defaults.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SimResult;

/// Which rule detaches the sling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseMode {
    /// Release when the projectile's flight angle drops through the release angle
    #[default]
    Angle,
    /// Release a fixed delay after firing
    Timed,
}

impl ReleaseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseMode::Angle => "angle",
            ReleaseMode::Timed => "timed",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "angle" => Some(ReleaseMode::Angle),
            "timed" | "time" => Some(ReleaseMode::Timed),
            _ => None,
        }
    }
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Engine ===
    /// Fixed tick length (seconds)
    pub sim_dt: f32,
    /// Gravity magnitude (m/s², pulls toward -Y)
    pub gravity: f32,
    /// Where the trebuchet stands; `base_y` is the ground surface
    pub base_x: f32,
    pub base_y: f32,

    // === Release ===
    pub release_mode: ReleaseMode,
    /// Delay for the timed release (seconds). `None` times each build to
    /// the moment the angle rule would let go.
    pub release_delay: Option<f32>,
    /// Minimum projectile speed for the angle release (m/s)
    pub min_release_speed: f32,

    // === Estimation ===
    /// Run the headless range estimate on every build
    pub estimate_on_build: bool,
    /// Simulated-time ceiling for the estimate (seconds)
    pub estimate_ceiling_secs: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sim_dt: SIM_DT,
            gravity: GRAVITY,
            base_x: 0.0,
            base_y: 0.0,

            release_mode: ReleaseMode::Angle,
            release_delay: None,
            min_release_speed: MIN_RELEASE_SPEED,

            estimate_on_build: true,
            estimate_ceiling_secs: ESTIMATE_CEILING_SECS,
        }
    }
}

impl Settings {
    /// Parse settings from JSON
    pub fn from_json(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file
    pub fn load_from(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load from `path`, falling back to defaults when it's missing or broken
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load_from(path.as_ref()) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Using default settings ({})", e);
                Self::default()
            }
        }
    }

    /// Save settings as pretty JSON
    pub fn save_to(&self, path: impl AsRef<Path>) -> SimResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Where the trebuchet's support stands
    pub fn base(&self) -> Vec2 {
        Vec2::new(self.base_x, self.base_y)
    }

    /// Ticks the estimation run may take
    pub fn estimate_tick_budget(&self) -> u32 {
        if self.sim_dt <= 0.0 {
            return 0;
        }
        (self.estimate_ceiling_secs / self.sim_dt).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_takes_defaults() {
        let settings = Settings::from_json(r#"{ "release_mode": "timed", "release_delay": 0.8 }"#).unwrap();
        assert_eq!(settings.release_mode, ReleaseMode::Timed);
        assert_eq!(settings.release_delay, Some(0.8));
        assert_eq!(Settings::default().release_delay, None);
        assert_eq!(settings.sim_dt, SIM_DT);
        assert!(settings.estimate_on_build);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(Settings::from_json("{ nope").is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("trebuchet_settings_{}.json", std::process::id()));
        let settings = Settings {
            gravity: 3.7,
            estimate_on_build: false,
            ..Default::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let settings = Settings::load_or_default("/definitely/not/here.json");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_tick_budget() {
        let settings = Settings::default();
        assert_eq!(settings.estimate_tick_budget(), 1800);
    }

    #[test]
    fn test_release_mode_names() {
        assert_eq!(ReleaseMode::from_name("TIMED"), Some(ReleaseMode::Timed));
        assert_eq!(ReleaseMode::from_name(ReleaseMode::Angle.as_str()), Some(ReleaseMode::Angle));
        assert_eq!(ReleaseMode::from_name("catapult"), None);
    }
}
