//! Collision filtering
//!
//! Every collider belongs to one layer. Only the ground interacts with
//! anything: the projectile, counterweight and walking base land on it, the
//! frame and arm pass through everything.

use rapier2d::prelude::{Group, InteractionGroups};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionLayer {
    Ground,
    /// Support tower, floating-arm carriage
    Frame,
    /// Arm and whip segments
    Arm,
    Counterweight,
    Projectile,
    /// Walking-arm base plate
    Base,
}

const GROUND: Group = Group::GROUP_1;
const FRAME: Group = Group::GROUP_2;
const ARM: Group = Group::GROUP_3;
const COUNTERWEIGHT: Group = Group::GROUP_4;
const PROJECTILE: Group = Group::GROUP_5;
const BASE: Group = Group::GROUP_6;

impl CollisionLayer {
    fn membership(&self) -> Group {
        match self {
            CollisionLayer::Ground => GROUND,
            CollisionLayer::Frame => FRAME,
            CollisionLayer::Arm => ARM,
            CollisionLayer::Counterweight => COUNTERWEIGHT,
            CollisionLayer::Projectile => PROJECTILE,
            CollisionLayer::Base => BASE,
        }
    }

    fn filter(&self) -> Group {
        match self {
            CollisionLayer::Ground => COUNTERWEIGHT | PROJECTILE | BASE,
            CollisionLayer::Frame | CollisionLayer::Arm => Group::NONE,
            CollisionLayer::Counterweight | CollisionLayer::Projectile | CollisionLayer::Base => GROUND,
        }
    }

    pub fn groups(&self) -> InteractionGroups {
        InteractionGroups::new(self.membership(), self.filter())
    }

    /// Whether two layers generate contacts (same rule rapier applies)
    #[cfg(test)]
    fn interacts_with(&self, other: CollisionLayer) -> bool {
        self.membership().intersects(other.filter()) && other.membership().intersects(self.filter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CollisionLayer::*;

    const LAYERS: [CollisionLayer; 6] = [Ground, Frame, Arm, Counterweight, Projectile, Base];

    #[test]
    fn test_projectile_only_hits_ground() {
        for layer in LAYERS {
            assert_eq!(Projectile.interacts_with(layer), layer == Ground, "{:?}", layer);
        }
    }

    #[test]
    fn test_counterweight_ignores_projectile_and_frame() {
        assert!(!Counterweight.interacts_with(Projectile));
        assert!(!Counterweight.interacts_with(Frame));
        assert!(Counterweight.interacts_with(Ground));
    }

    #[test]
    fn test_frame_and_arm_pass_through_everything() {
        for layer in LAYERS {
            assert!(!Frame.interacts_with(layer));
            assert!(!Arm.interacts_with(layer));
        }
    }

    #[test]
    fn test_symmetric() {
        for a in LAYERS {
            for b in LAYERS {
                assert_eq!(a.interacts_with(b), b.interacts_with(a));
            }
        }
    }
}
