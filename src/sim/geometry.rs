//! Closed-form construction geometry
//!
//! Every anchor is placed so the joints connecting it are already satisfied
//! at tick zero. The engine never has to drag parts into place, so the first
//! step carries no correction impulse.

use glam::Vec2;
use serde::Serialize;

use crate::consts::GEOMETRY_TOLERANCE;
use crate::vec_from_angle;

/// Result of placing a point at a required distance from an anchor
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub point: Vec2,
    /// Distance from the anchor matches the requested length
    pub exact: bool,
    /// How far the placement misses the requested length (0 when exact)
    pub discrepancy: f32,
}

/// Place a point on the line `y = target_y` at `length` from `anchor`.
///
/// Right-triangle decomposition: the vertical leg is fixed by the target line,
/// the horizontal leg follows from the hypotenuse. The rightward solution is
/// taken. When `length` cannot span the vertical gap the point lands directly
/// above/below the anchor and the shortfall is reported.
pub fn solve_offset(anchor: Vec2, length: f32, target_y: f32) -> Placement {
    let span = (anchor.y - target_y).abs();
    let length = length.max(0.0);

    if length > span {
        let dx = (length * length - span * span).sqrt();
        return Placement {
            point: Vec2::new(anchor.x + dx, target_y),
            exact: true,
            discrepancy: 0.0,
        };
    }

    let discrepancy = span - length;
    let exact = discrepancy <= GEOMETRY_TOLERANCE;
    if !exact {
        log::warn!(
            "Constraint length {:.3} can't span vertical gap {:.3}; placing {:.3} short",
            length,
            span,
            discrepancy
        );
    }
    Placement {
        point: Vec2::new(anchor.x, target_y),
        exact,
        discrepancy,
    }
}

/// Point hanging straight down from `anchor` at `length`
pub fn hang_below(anchor: Vec2, length: f32) -> Placement {
    solve_offset(anchor, length, anchor.y - length.max(0.0))
}

/// Arm elevation (radians above horizontal, counterweight side) that puts the
/// projectile-side tip `drop` below the pivot. Arms too short to reach stand
/// vertical.
pub fn arm_elevation(projectile_arm: f32, drop: f32) -> f32 {
    if projectile_arm <= 0.0 {
        return std::f32::consts::FRAC_PI_2;
    }
    (drop / projectile_arm).clamp(-1.0, 1.0).asin()
}

/// Pivot plus both arm tips for a cocked arm
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArmLayout {
    pub pivot: Vec2,
    /// Angle of the pivot → counterweight-tip direction
    pub elevation: f32,
    pub projectile_arm: f32,
    pub counterweight_arm: f32,
}

impl ArmLayout {
    /// Cock the arm so the projectile tip sits at `tip_y` (clamped to vertical)
    pub fn cocked(pivot: Vec2, projectile_arm: f32, counterweight_arm: f32, tip_y: f32) -> Self {
        let projectile_arm = projectile_arm.max(0.0);
        Self {
            pivot,
            elevation: arm_elevation(projectile_arm, pivot.y - tip_y),
            projectile_arm,
            counterweight_arm: counterweight_arm.max(0.0),
        }
    }

    pub fn direction(&self) -> Vec2 {
        vec_from_angle(self.elevation)
    }

    pub fn projectile_tip(&self) -> Vec2 {
        self.pivot - self.direction() * self.projectile_arm
    }

    pub fn counterweight_tip(&self) -> Vec2 {
        self.pivot + self.direction() * self.counterweight_arm
    }

    pub fn total_length(&self) -> f32 {
        self.projectile_arm + self.counterweight_arm
    }

    /// Arm-local x of the geometric centre (pivot at the local origin,
    /// counterweight side along +x)
    pub fn local_center(&self) -> f32 {
        (self.counterweight_arm - self.projectile_arm) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_offset_is_rightward_and_on_line() {
        let anchor = Vec2::new(-10.0, 0.25);
        let placed = solve_offset(anchor, 12.0, 0.25);
        assert!(placed.exact);
        assert!((placed.point.x - 2.0).abs() < 1e-5);
        assert_eq!(placed.point.y, 0.25);
    }

    #[test]
    fn test_three_four_five() {
        let placed = solve_offset(Vec2::new(1.0, 4.0), 5.0, 0.0);
        assert!((placed.point - Vec2::new(4.0, 0.0)).length() < 1e-5);
        assert_eq!(placed.discrepancy, 0.0);
    }

    #[test]
    fn test_too_short_goes_straight_down() {
        let placed = solve_offset(Vec2::new(2.0, 5.0), 3.0, 0.0);
        assert!(!placed.exact);
        assert_eq!(placed.point, Vec2::new(2.0, 0.0));
        assert!((placed.discrepancy - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_length_on_the_line_is_exact() {
        let placed = solve_offset(Vec2::new(3.0, 0.5), 0.0, 0.5);
        assert!(placed.exact);
        assert_eq!(placed.point, Vec2::new(3.0, 0.5));
    }

    #[test]
    fn test_hang_below() {
        let placed = hang_below(Vec2::new(1.0, 9.0), 2.5);
        assert!(placed.exact);
        assert_eq!(placed.point, Vec2::new(1.0, 6.5));
    }

    #[test]
    fn test_cocked_arm_reaches_tip_height() {
        let layout = ArmLayout::cocked(Vec2::new(0.0, 10.0), 14.0, 6.0, 0.25);
        assert!((layout.projectile_tip().y - 0.25).abs() < 1e-4);
        assert!(layout.projectile_tip().x < 0.0);
        assert!(layout.counterweight_tip().y > 10.0);
        assert!((layout.projectile_tip().distance(layout.pivot) - 14.0).abs() < 1e-4);
    }

    #[test]
    fn test_short_arm_stands_vertical() {
        let layout = ArmLayout::cocked(Vec2::new(0.0, 20.0), 5.0, 2.0, 0.0);
        assert!((layout.elevation - FRAC_PI_2).abs() < 1e-6);
        assert!((layout.projectile_tip() - Vec2::new(0.0, 15.0)).length() < 1e-4);
    }

    proptest! {
        #[test]
        fn prop_exact_distance_when_reachable(
            ax in -50.0f32..50.0,
            ay in 0.0f32..30.0,
            target_y in -5.0f32..5.0,
            extra in 0.01f32..30.0,
        ) {
            let anchor = Vec2::new(ax, ay);
            let length = (ay - target_y).abs() + extra;
            let placed = solve_offset(anchor, length, target_y);
            prop_assert!(placed.exact);
            prop_assert_eq!(placed.point.y, target_y);
            prop_assert!(placed.point.x >= anchor.x);
            prop_assert!((placed.point.distance(anchor) - length).abs() < 1e-3);
        }

        #[test]
        fn prop_discrepancy_bounded_by_span(
            ay in 0.0f32..30.0,
            fraction in 0.0f32..1.0,
        ) {
            let anchor = Vec2::new(0.0, ay);
            let length = ay * fraction;
            let placed = solve_offset(anchor, length, 0.0);
            prop_assert!(placed.discrepancy >= 0.0);
            prop_assert!(placed.discrepancy <= ay);
            prop_assert!((placed.point.distance(anchor) - length - placed.discrepancy).abs() < 1e-3);
        }
    }
}
