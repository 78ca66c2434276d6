//! Trebuchet Sim - build a trebuchet from a few physical parameters and throw
//!
//! Core modules:
//! - `sim`: Construction geometry, archetype builders, launch control
//! - `physics`: Thin boundary over the rapier2d rigid-body engine
//! - `params`: Named launch parameters and per-archetype schema
//! - `settings`: Runtime configuration
//! - `records`: Best-throw leaderboard

pub mod error;
pub mod params;
pub mod physics;
pub mod records;
pub mod settings;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use error::SimError;
pub use params::{ParamId, ParamSpec, ParameterSet};
pub use records::LaunchRecords;
pub use settings::{ReleaseMode, Settings};
pub use sim::{Archetype, LaunchController, LaunchPhase, Stats};

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one tick per display frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Gravitational acceleration (m/s²), applied along -Y
    pub const GRAVITY: f32 = 9.81;

    /// Ground slab: top surface sits at the base height
    pub const GROUND_HALF_WIDTH: f32 = 5000.0;
    pub const GROUND_HALF_THICKNESS: f32 = 1.0;
    pub const GROUND_FRICTION: f32 = 0.6;

    /// Arm cross-section (m), used for the arm's area when deriving density
    pub const ARM_THICKNESS: f32 = 0.4;
    /// Frame tower width (m), visual only
    pub const FRAME_WIDTH: f32 = 0.6;

    /// Smallest dimension any collider gets (keeps zero-size inputs finite)
    pub const MIN_DIMENSION: f32 = 0.01;

    /// Projectile surface
    pub const PROJECTILE_FRICTION: f32 = 0.3;
    pub const PROJECTILE_RESTITUTION: f32 = 0.1;

    /// Default release window (angle policy)
    pub const DEFAULT_RELEASE_ANGLE_DEG: f32 = 45.0;
    pub const MIN_RELEASE_SPEED: f32 = 10.0;
    /// Timed sling delay for designs the angle rule never releases
    pub const DEFAULT_RELEASE_DELAY: f32 = 0.6;

    /// Estimation run ceiling (simulated seconds)
    pub const ESTIMATE_CEILING_SECS: f32 = 30.0;

    /// Whipper torsion joint
    pub const WHIP_JOINT_STIFFNESS: f32 = 40.0;
    pub const WHIP_JOINT_DAMPING: f32 = 2.0;

    /// Floating-arm carriage: mass fraction of the arm, travel as a fraction
    /// of the projectile arm length
    pub const CARRIAGE_MASS_RATIO: f32 = 0.25;
    pub const CARRIAGE_SIZE: f32 = 0.8;
    pub const CARRIAGE_TRAVEL_RATIO: f32 = 1.0;

    /// Walking-arm base: mass relative to the counterweight
    pub const WALKING_BASE_MASS_RATIO: f32 = 1.5;
    pub const WALKING_BASE_HEIGHT: f32 = 0.6;
    pub const WALKING_BASE_FRICTION: f32 = 0.8;

    /// Distances below this are treated as exact by the geometry solver
    pub const GEOMETRY_TOLERANCE: f32 = 1e-4;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit vector at `theta` radians from +X
#[inline]
pub fn vec_from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Angle of a vector from +X, in (-π, π]
#[inline]
pub fn angle_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}
