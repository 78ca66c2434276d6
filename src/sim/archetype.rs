//! Trebuchet archetypes
//!
//! A closed set of designs sharing one build contract. Each variant is a
//! combination of three structural choices (how the pivot is mounted, how the
//! counterweight hangs, whether a whip extends the arm); `build` turns that
//! combination into bodies and joints.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::build::{self, Trebuchet};
use super::estimate;
use super::tick::ReleasePolicy;
use crate::consts::DEFAULT_RELEASE_DELAY;
use crate::params::{self, ParamId, ParamSpec, ParameterSet};
use crate::physics::PhysicsWorld;
use crate::settings::{ReleaseMode, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Archetype {
    /// Counterweight welded to the arm
    Fixed,
    /// Counterweight swings from a hinge
    #[default]
    Hinged,
    /// Hinged, plus a sprung whip segment past the arm tip
    Whipper,
    /// Pivot rides a horizontal track
    #[serde(rename = "floating")]
    FloatingArm,
    /// Whole machine stands on a loose base
    #[serde(rename = "walking")]
    WalkingArm,
    /// Hinged mechanics, wide-open parameter ranges
    Sandbox,
}

/// How the arm's pivot is held
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotMount {
    /// Fixed tower
    Tower,
    /// Carriage on a prismatic track
    Track,
    /// Dynamic base sitting on the ground
    LooseBase,
}

/// How the counterweight attaches to the arm tip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coupling {
    Welded,
    Hinged,
}

impl Archetype {
    pub const ALL: [Archetype; 6] = [
        Archetype::Fixed,
        Archetype::Hinged,
        Archetype::Whipper,
        Archetype::FloatingArm,
        Archetype::WalkingArm,
        Archetype::Sandbox,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Archetype::Fixed => "fixed",
            Archetype::Hinged => "hinged",
            Archetype::Whipper => "whipper",
            Archetype::FloatingArm => "floating",
            Archetype::WalkingArm => "walking",
            Archetype::Sandbox => "sandbox",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fixed" | "fixed-counterweight" => Some(Archetype::Fixed),
            "hinged" | "hinged-counterweight" => Some(Archetype::Hinged),
            "whipper" => Some(Archetype::Whipper),
            "floating" | "floating-arm" => Some(Archetype::FloatingArm),
            "walking" | "walking-arm" => Some(Archetype::WalkingArm),
            "sandbox" => Some(Archetype::Sandbox),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Archetype::Fixed => "Fixed Counterweight",
            Archetype::Hinged => "Hinged Counterweight",
            Archetype::Whipper => "Whipper",
            Archetype::FloatingArm => "Floating Arm",
            Archetype::WalkingArm => "Walking Arm",
            Archetype::Sandbox => "Sandbox",
        }
    }

    pub fn pivot_mount(&self) -> PivotMount {
        match self {
            Archetype::FloatingArm => PivotMount::Track,
            Archetype::WalkingArm => PivotMount::LooseBase,
            _ => PivotMount::Tower,
        }
    }

    pub fn coupling(&self) -> Coupling {
        match self {
            Archetype::Fixed => Coupling::Welded,
            _ => Coupling::Hinged,
        }
    }

    pub fn has_whip(&self) -> bool {
        *self == Archetype::Whipper
    }

    /// Parameter form for this archetype
    pub fn schema(&self) -> Vec<ParamSpec> {
        params::default_parameters(*self)
    }

    pub fn default_parameters(&self) -> ParameterSet {
        ParameterSet::defaults_for(*self)
    }

    /// Release rule for one build. Settings pick the mode; the angle comes
    /// from the parameter set.
    pub fn release_policy(&self, params: &ParameterSet, settings: &Settings) -> ReleasePolicy {
        match settings.release_mode {
            ReleaseMode::Angle => ReleasePolicy::Angle {
                target: params.get(ParamId::ReleaseAngle).to_radians(),
                min_speed: settings.min_release_speed,
            },
            ReleaseMode::Timed => {
                let delay = settings.release_delay.unwrap_or_else(|| {
                    estimate::angle_release_time(*self, params, settings).unwrap_or_else(|| {
                        log::warn!(
                            "{} never reaches its release angle, timing the sling at {:.2}s",
                            self.label(),
                            DEFAULT_RELEASE_DELAY
                        );
                        DEFAULT_RELEASE_DELAY
                    })
                });
                ReleasePolicy::Timed { delay }
            }
        }
    }

    /// Assemble this archetype with its support standing at `base`
    /// (`base.y` is the ground surface)
    pub fn build(&self, world: &mut PhysicsWorld, base: Vec2, params: &ParameterSet) -> Trebuchet {
        build::build(*self, world, base, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for archetype in Archetype::ALL {
            assert_eq!(Archetype::from_name(archetype.as_str()), Some(archetype));
        }
        assert_eq!(Archetype::from_name("Floating-Arm"), Some(Archetype::FloatingArm));
        assert_eq!(Archetype::from_name("onager"), None);
    }

    #[test]
    fn test_serde_names_match_as_str() {
        for archetype in Archetype::ALL {
            let json = serde_json::to_string(&archetype).unwrap();
            assert_eq!(json, format!("\"{}\"", archetype.as_str()));
        }
    }

    #[test]
    fn test_structural_choices() {
        assert_eq!(Archetype::Fixed.coupling(), Coupling::Welded);
        assert_eq!(Archetype::Sandbox.coupling(), Coupling::Hinged);
        assert_eq!(Archetype::FloatingArm.pivot_mount(), PivotMount::Track);
        assert_eq!(Archetype::WalkingArm.pivot_mount(), PivotMount::LooseBase);
        assert_eq!(Archetype::Hinged.pivot_mount(), PivotMount::Tower);
        assert!(Archetype::Whipper.has_whip());
        assert!(!Archetype::Hinged.has_whip());
    }

    #[test]
    fn test_release_policy_follows_settings() {
        let params = ParameterSet::new().with(ParamId::ReleaseAngle, 30.0);
        let angle = Archetype::Hinged.release_policy(&params, &Settings::default());
        match angle {
            ReleasePolicy::Angle { target, min_speed } => {
                assert!((target - 30f32.to_radians()).abs() < 1e-6);
                assert_eq!(min_speed, crate::consts::MIN_RELEASE_SPEED);
            }
            other => panic!("expected angle policy, got {:?}", other),
        }

        let mut settings = Settings {
            release_mode: ReleaseMode::Timed,
            release_delay: Some(0.8),
            ..Default::default()
        };
        assert_eq!(
            Archetype::Hinged.release_policy(&params, &settings),
            ReleasePolicy::Timed { delay: 0.8 }
        );

        // Unset delay is timed to the angle release of the same design
        settings.release_delay = None;
        let params = ParameterSet::new();
        let derived = estimate::angle_release_time(Archetype::Hinged, &params, &settings);
        let Some(expected) = derived else {
            panic!("default hinged never released");
        };
        assert!(expected > 0.0);
        assert_eq!(
            Archetype::Hinged.release_policy(&params, &settings),
            ReleasePolicy::Timed { delay: expected }
        );
    }
}
