//! Launch state and derived statistics
//!
//! Everything the controller tracks between ticks, apart from the engine
//! world itself.

use serde::{Deserialize, Serialize};

use super::archetype::Archetype;
use super::tick::ReleasePolicy;
use crate::params::ParameterSet;

/// Launch lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LaunchPhase {
    /// Built and paused, not yet fired
    #[default]
    Idle,
    /// Running but not fired; the trigger still holds the arm
    Armed,
    /// Fired, projectile still in the sling
    Launched,
    /// Sling let go
    Released,
    /// Projectile hit the ground and is frozen
    Landed,
}

impl LaunchPhase {
    pub fn fired(&self) -> bool {
        matches!(
            self,
            LaunchPhase::Launched | LaunchPhase::Released | LaunchPhase::Landed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LaunchPhase::Idle => "idle",
            LaunchPhase::Armed => "armed",
            LaunchPhase::Launched => "launched",
            LaunchPhase::Released => "released",
            LaunchPhase::Landed => "landed",
        }
    }
}

/// Live and peak numbers for the current throw
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Horizontal travel from the launch position, never negative
    pub distance: f32,
    /// Height above the launch position
    pub height: f32,
    pub velocity: f32,
    pub max_distance: f32,
    pub max_height: f32,
    pub max_velocity: f32,
    /// Seconds since fire
    pub time: f32,
    /// Headless estimate for this build, 0 when disabled
    pub estimated_distance: f32,
}

impl Stats {
    pub fn formatted(&self) -> FormattedStats {
        let f = |v: f32| format!("{:.2}", v);
        FormattedStats {
            distance: f(self.distance),
            height: f(self.height),
            velocity: f(self.velocity),
            max_distance: f(self.max_distance),
            max_height: f(self.max_height),
            max_velocity: f(self.max_velocity),
            time: f(self.time),
            estimated_distance: f(self.estimated_distance),
        }
    }
}

/// Two-decimal strings for display
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedStats {
    pub distance: String,
    pub height: String,
    pub velocity: String,
    pub max_distance: String,
    pub max_height: String,
    pub max_velocity: String,
    pub time: String,
    pub estimated_distance: String,
}

/// Something notable that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum LaunchEvent {
    Fired,
    Released {
        time: f32,
        speed: f32,
        /// Velocity angle above horizontal at release
        angle_deg: f32,
    },
    Landed {
        time: f32,
        distance: f32,
        max_height: f32,
    },
}

/// Per-build launch bookkeeping
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimState {
    pub archetype: Archetype,
    pub params: ParameterSet,
    pub phase: LaunchPhase,
    pub paused: bool,
    /// Ticks since fire, including the landing tick
    pub ticks_since_fire: u64,
    pub stats: Stats,
    #[serde(skip)]
    pub release_policy: ReleasePolicy,
    /// Projectile flight angle seen on the previous tick
    #[serde(skip)]
    pub last_flight_angle: Option<f32>,
    /// Projectile has left the ground since fire
    #[serde(skip)]
    pub airborne: bool,
}

impl SimState {
    /// Fresh state for a new build: paused, idle, nothing measured
    pub fn new(archetype: Archetype, params: ParameterSet, release_policy: ReleasePolicy) -> Self {
        Self {
            archetype,
            params,
            phase: LaunchPhase::Idle,
            paused: true,
            ticks_since_fire: 0,
            stats: Stats::default(),
            release_policy,
            last_flight_angle: None,
            airborne: false,
        }
    }

    pub fn fired(&self) -> bool {
        self.phase.fired()
    }

    pub fn landed(&self) -> bool {
        self.phase == LaunchPhase::Landed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_paused_idle() {
        let state = SimState::new(
            Archetype::Hinged,
            ParameterSet::new(),
            ReleasePolicy::default(),
        );
        assert!(state.paused);
        assert_eq!(state.phase, LaunchPhase::Idle);
        assert!(!state.fired());
        assert_eq!(state.stats, Stats::default());
    }

    #[test]
    fn test_fired_phases() {
        assert!(!LaunchPhase::Idle.fired());
        assert!(!LaunchPhase::Armed.fired());
        assert!(LaunchPhase::Launched.fired());
        assert!(LaunchPhase::Released.fired());
        assert!(LaunchPhase::Landed.fired());
    }

    #[test]
    fn test_formatted_two_decimals() {
        let stats = Stats {
            distance: 123.456,
            velocity: 7.0,
            ..Default::default()
        };
        let formatted = stats.formatted();
        assert_eq!(formatted.distance, "123.46");
        assert_eq!(formatted.velocity, "7.00");
        let json = serde_json::to_string(&formatted).unwrap();
        assert!(json.contains("\"maxDistance\":\"0.00\""));
        assert!(json.contains("\"estimatedDistance\""));
    }
}
