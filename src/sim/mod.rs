//! Trebuchet construction and launch control
//!
//! Everything above the physics engine lives here:
//! - Fixed timestep only; one tick advances the engine then evaluates
//!   release, impact and statistics
//! - Anchors placed in closed form so joints start satisfied
//! - No rendering or platform dependencies

pub mod archetype;
pub mod build;
pub mod controller;
pub mod estimate;
pub mod geometry;
pub mod state;
pub mod tick;

pub use archetype::{Archetype, Coupling, PivotMount};
pub use build::{JointRole, PartRole, PartSnapshot, Projectile, Trebuchet};
pub use controller::{LaunchController, Snapshot};
pub use estimate::{Estimate, estimate_range};
pub use geometry::{ArmLayout, Placement, hang_below, solve_offset};
pub use state::{FormattedStats, LaunchEvent, LaunchPhase, SimState, Stats};
pub use tick::{ReleasePolicy, fire, tick};
