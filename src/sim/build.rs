//! Trebuchet assembly
//!
//! Turns an archetype plus a parameter set into rapier bodies and joints.
//! All placement goes through the geometry solver so every joint starts
//! satisfied. The arm is latched to its support by a trigger joint until the
//! controller fires.

use glam::Vec2;
use serde::Serialize;

use super::archetype::{Archetype, Coupling, PivotMount};
use super::geometry::{self, ArmLayout, Placement};
use crate::consts::*;
use crate::params::{ParamId, ParameterSet};
use crate::physics::{
    AngularSpring, BodyDesc, ColliderDesc, ColliderHandle, CollisionLayer, ImpulseJointHandle,
    JointDesc, PhysicsWorld, RigidBodyHandle, Shape,
};
use crate::{angle_of, normalize_angle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PartRole {
    Frame,
    Carriage,
    Base,
    Arm,
    Whip,
    Counterweight,
    Projectile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum JointRole {
    /// Floating-arm carriage on its rail
    Track,
    Pivot,
    /// Holds the arm cocked until fire
    Trigger,
    CounterweightMount,
    WhipHinge,
    Sling,
}

/// One collider-bearing body of the machine
#[derive(Debug, Clone, Copy)]
pub struct Part {
    pub role: PartRole,
    pub body: RigidBodyHandle,
    pub shape: Shape,
    /// Shape offset from the body origin
    pub offset: Vec2,
}

#[derive(Debug, Clone, Copy)]
pub struct JointPart {
    pub role: JointRole,
    pub handle: ImpulseJointHandle,
}

#[derive(Debug, Clone, Copy)]
pub struct Projectile {
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
    pub radius: f32,
}

/// Render-side view of one part
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartSnapshot {
    pub role: PartRole,
    pub shape: Shape,
    pub offset: Vec2,
    pub position: Vec2,
    pub angle: f32,
}

/// Everything one build put into the world
#[derive(Debug)]
pub struct Trebuchet {
    pub archetype: Archetype,
    pub parts: Vec<Part>,
    pub joints: Vec<JointPart>,
    pub arm: RigidBodyHandle,
    pub counterweight: RigidBodyHandle,
    pub projectile: Option<Projectile>,
    /// The sling while it's still attached
    pub release_joint: Option<ImpulseJointHandle>,
    pub trigger: Option<ImpulseJointHandle>,
    pub sling_length: f32,
    /// How well the sling fit its geometry at build time
    pub sling_placement: Placement,
    /// Projectile centre before launch; distance and height are measured from here
    pub launch_position: Vec2,
}

impl Trebuchet {
    pub fn body(&self, role: PartRole) -> Option<RigidBodyHandle> {
        self.parts.iter().find(|p| p.role == role).map(|p| p.body)
    }

    pub fn joint(&self, role: JointRole) -> Option<ImpulseJointHandle> {
        self.joints.iter().find(|j| j.role == role).map(|j| j.handle)
    }

    /// Detach the sling handle; `None` once released
    pub fn take_release_joint(&mut self) -> Option<ImpulseJointHandle> {
        self.release_joint.take()
    }

    pub fn take_trigger(&mut self) -> Option<ImpulseJointHandle> {
        self.trigger.take()
    }

    /// World-space sling endpoints while the sling is attached
    pub fn sling_anchors(&self, world: &PhysicsWorld) -> Option<(Vec2, Vec2)> {
        self.release_joint.and_then(|joint| world.joint_anchors(joint))
    }

    /// Remove every body and joint this build created
    pub fn destroy(self, world: &mut PhysicsWorld) {
        let mut removed = 0;
        for part in &self.parts {
            if world.remove_body(part.body) {
                removed += 1;
            }
        }
        // Joints normally go with their bodies; catch any that didn't
        for joint in &self.joints {
            if world.has_joint(joint.handle) {
                world.remove_joint(joint.handle);
            }
        }
        log::debug!(
            "Destroyed {} ({} bodies), world now {} bodies / {} joints",
            self.archetype.label(),
            removed,
            world.body_count(),
            world.joint_count()
        );
    }

    pub fn snapshot(&self, world: &PhysicsWorld) -> Vec<PartSnapshot> {
        self.parts
            .iter()
            .filter_map(|part| {
                let state = world.body_state(part.body)?;
                Some(PartSnapshot {
                    role: part.role,
                    shape: part.shape,
                    offset: part.offset,
                    position: state.position,
                    angle: state.angle,
                })
            })
            .collect()
    }
}

/// Parameter values for one build, floored so the engine never sees
/// negative extents
struct Dims {
    projectile_arm: f32,
    counterweight_arm: f32,
    arm_mass: f32,
    counterweight_mass: f32,
    counterweight_size: f32,
    projectile_mass: f32,
    projectile_diameter: f32,
    sling_length: f32,
    pivot_height: f32,
    whip_length: f32,
}

impl Dims {
    fn read(params: &ParameterSet) -> Self {
        let get = |id: ParamId| params.get(id).max(0.0);
        Self {
            projectile_arm: get(ParamId::ProjectileArmLength),
            counterweight_arm: get(ParamId::CounterweightArmLength),
            arm_mass: get(ParamId::ArmMass),
            counterweight_mass: get(ParamId::CounterweightMass),
            counterweight_size: get(ParamId::CounterweightSize).max(MIN_DIMENSION),
            projectile_mass: get(ParamId::ProjectileMass),
            projectile_diameter: get(ParamId::ProjectileSize),
            sling_length: get(ParamId::SlingLength),
            pivot_height: get(ParamId::PivotHeight),
            whip_length: get(ParamId::WhipLength).max(MIN_DIMENSION),
        }
    }
}

/// Collects handles while bodies and joints go into the world
struct Assembly<'w> {
    world: &'w mut PhysicsWorld,
    parts: Vec<Part>,
    joints: Vec<JointPart>,
}

impl<'w> Assembly<'w> {
    fn new(world: &'w mut PhysicsWorld) -> Self {
        Self {
            world,
            parts: Vec::with_capacity(6),
            joints: Vec::with_capacity(6),
        }
    }

    fn body(&mut self, role: PartRole, desc: BodyDesc, collider: ColliderDesc) -> (RigidBodyHandle, ColliderHandle) {
        let body = self.world.add_body(desc);
        let handle = self.world.add_collider(body, collider);
        self.parts.push(Part {
            role,
            body,
            shape: collider.shape,
            offset: collider.offset,
        });
        (body, handle)
    }

    fn joint(
        &mut self,
        role: JointRole,
        body1: RigidBodyHandle,
        body2: RigidBodyHandle,
        desc: JointDesc,
    ) -> ImpulseJointHandle {
        let handle = self.world.add_joint(body1, body2, desc);
        self.joints.push(JointPart { role, handle });
        handle
    }

    /// Support structure; returns the body carrying the pivot and the pivot's
    /// local anchor on it
    fn support(&mut self, mount: PivotMount, base: Vec2, dims: &Dims) -> (RigidBodyHandle, Vec2) {
        let tower_top = Vec2::new(0.0, dims.pivot_height);
        match mount {
            PivotMount::Tower => (self.tower(base, dims), tower_top),
            PivotMount::Track => {
                let frame = self.tower(base, dims);
                let carriage_mass = dims.arm_mass * CARRIAGE_MASS_RATIO;
                let (carriage, _) = self.body(
                    PartRole::Carriage,
                    BodyDesc::dynamic(base + tower_top),
                    ColliderDesc::with_mass(
                        Shape::cuboid(CARRIAGE_SIZE, CARRIAGE_SIZE / 2.0),
                        carriage_mass,
                        CollisionLayer::Frame,
                    ),
                );
                let travel = dims.projectile_arm * CARRIAGE_TRAVEL_RATIO;
                self.joint(
                    JointRole::Track,
                    frame,
                    carriage,
                    JointDesc::Prismatic {
                        anchor1: tower_top,
                        anchor2: Vec2::ZERO,
                        axis: Vec2::X,
                        limits: Some([-travel, travel]),
                    },
                );
                (carriage, Vec2::ZERO)
            }
            PivotMount::LooseBase => {
                let width = ((dims.projectile_arm + dims.counterweight_arm) / 2.0).max(2.0 * FRAME_WIDTH);
                let half_height = WALKING_BASE_HEIGHT / 2.0;
                let (base_body, _) = self.body(
                    PartRole::Base,
                    BodyDesc::dynamic(base + Vec2::new(0.0, half_height)),
                    ColliderDesc::with_mass(
                        Shape::cuboid(width, WALKING_BASE_HEIGHT),
                        dims.counterweight_mass * WALKING_BASE_MASS_RATIO,
                        CollisionLayer::Base,
                    )
                    .friction(WALKING_BASE_FRICTION),
                );
                (base_body, Vec2::new(0.0, dims.pivot_height - half_height))
            }
        }
    }

    fn tower(&mut self, base: Vec2, dims: &Dims) -> RigidBodyHandle {
        let (frame, _) = self.body(
            PartRole::Frame,
            BodyDesc::fixed(base),
            ColliderDesc::with_mass(
                Shape::cuboid(FRAME_WIDTH, dims.pivot_height),
                0.0,
                CollisionLayer::Frame,
            )
            .offset(Vec2::new(0.0, dims.pivot_height / 2.0)),
        );
        frame
    }

    /// Arm body with its origin on the pivot, counterweight side along local +x
    fn arm(&mut self, layout: &ArmLayout, mass: f32) -> RigidBodyHandle {
        let (arm, _) = self.body(
            PartRole::Arm,
            BodyDesc::dynamic(layout.pivot).angle(layout.elevation),
            ColliderDesc::with_mass(
                Shape::cuboid(layout.total_length(), ARM_THICKNESS),
                mass,
                CollisionLayer::Arm,
            )
            .offset(Vec2::new(layout.local_center(), 0.0)),
        );
        arm
    }

    fn counterweight(&mut self, coupling: Coupling, arm: RigidBodyHandle, layout: &ArmLayout, dims: &Dims) -> RigidBodyHandle {
        let size = dims.counterweight_size;
        let tip_local = Vec2::new(layout.counterweight_arm, 0.0);
        // Welded: box top sits on the tip. Hinged: hangs one box-length below.
        let hang = match coupling {
            Coupling::Welded => size / 2.0,
            Coupling::Hinged => size,
        };
        let placement = geometry::hang_below(layout.counterweight_tip(), hang);
        let (counterweight, _) = self.body(
            PartRole::Counterweight,
            BodyDesc::dynamic(placement.point),
            ColliderDesc::with_mass(
                Shape::cuboid(size, size),
                dims.counterweight_mass,
                CollisionLayer::Counterweight,
            )
            .friction(0.8),
        );
        let mount = match coupling {
            Coupling::Welded => JointDesc::Fixed {
                anchor1: tip_local,
                anchor2: Vec2::new(0.0, hang),
                relative_angle: -layout.elevation,
            },
            Coupling::Hinged => JointDesc::Revolute {
                anchor1: tip_local,
                anchor2: Vec2::new(0.0, hang),
                spring: None,
            },
        };
        self.joint(JointRole::CounterweightMount, arm, counterweight, mount);
        counterweight
    }

    /// Whip segment hanging from the arm's projectile tip on a torsion spring.
    /// Returns the body and local point the sling hooks onto.
    fn whip(&mut self, arm: RigidBodyHandle, layout: &ArmLayout, length: f32, mass: f32) -> (RigidBodyHandle, Vec2) {
        let root = layout.projectile_tip();
        let tip = geometry::hang_below(root, length);
        let angle = angle_of(tip.point - root);
        let (whip, _) = self.body(
            PartRole::Whip,
            BodyDesc::dynamic(root).angle(angle),
            ColliderDesc::with_mass(
                Shape::cuboid(length, ARM_THICKNESS / 2.0),
                mass,
                CollisionLayer::Arm,
            )
            .offset(Vec2::new(length / 2.0, 0.0)),
        );
        self.joint(
            JointRole::WhipHinge,
            arm,
            whip,
            JointDesc::Revolute {
                anchor1: Vec2::new(-layout.projectile_arm, 0.0),
                anchor2: Vec2::ZERO,
                spring: Some(AngularSpring {
                    target: normalize_angle(angle - layout.elevation),
                    stiffness: WHIP_JOINT_STIFFNESS,
                    damping: WHIP_JOINT_DAMPING,
                }),
            },
        );
        (whip, Vec2::new(length, 0.0))
    }
}

/// Build `archetype` with its support at `base` (`base.y` = ground surface)
pub fn build(archetype: Archetype, world: &mut PhysicsWorld, base: Vec2, params: &ParameterSet) -> Trebuchet {
    let dims = Dims::read(params);
    let projectile_shape = Shape::ball(dims.projectile_diameter);
    let radius = match projectile_shape {
        Shape::Ball { radius } => radius,
        Shape::Cuboid { .. } => MIN_DIMENSION,
    };
    // Projectile centre when resting on the ground
    let rest_y = base.y + radius;

    let mut asm = Assembly::new(world);
    let (support, pivot_local) = asm.support(archetype.pivot_mount(), base, &dims);
    let pivot = base + Vec2::new(0.0, dims.pivot_height);

    // With a whip, the main tip rides one whip-length higher so the whip's
    // end reaches the projectile line
    let whip_length = if archetype.has_whip() { dims.whip_length } else { 0.0 };
    let layout = ArmLayout::cocked(pivot, dims.projectile_arm, dims.counterweight_arm, rest_y + whip_length);
    let main_share = layout.total_length() / (layout.total_length() + whip_length).max(MIN_DIMENSION);
    let arm_mass = dims.arm_mass * main_share;

    let arm = asm.arm(&layout, arm_mass);
    asm.joint(
        JointRole::Pivot,
        support,
        arm,
        JointDesc::Revolute {
            anchor1: pivot_local,
            anchor2: Vec2::ZERO,
            spring: None,
        },
    );
    let trigger = asm.joint(
        JointRole::Trigger,
        support,
        arm,
        JointDesc::Fixed {
            anchor1: pivot_local,
            anchor2: Vec2::ZERO,
            relative_angle: layout.elevation,
        },
    );

    let counterweight = asm.counterweight(archetype.coupling(), arm, &layout, &dims);

    let (sling_body, sling_local) = if archetype.has_whip() {
        asm.whip(arm, &layout, whip_length, dims.arm_mass - arm_mass)
    } else {
        (arm, Vec2::new(-layout.projectile_arm, 0.0))
    };
    let sling_anchor = asm
        .world
        .world_point(sling_body, sling_local)
        .unwrap_or_else(|| layout.projectile_tip());

    let placement = geometry::solve_offset(sling_anchor, dims.sling_length, rest_y);
    let (projectile_body, projectile_collider) = asm.body(
        PartRole::Projectile,
        BodyDesc::dynamic(placement.point).ccd(),
        ColliderDesc::with_mass(projectile_shape, dims.projectile_mass, CollisionLayer::Projectile)
            .friction(PROJECTILE_FRICTION)
            .restitution(PROJECTILE_RESTITUTION),
    );
    let sling = asm.joint(
        JointRole::Sling,
        sling_body,
        projectile_body,
        JointDesc::Rope {
            anchor1: sling_local,
            anchor2: Vec2::ZERO,
            max_length: dims.sling_length,
        },
    );

    log::info!(
        "Built {} trebuchet: {} bodies, {} joints, elevation {:.1}°",
        archetype.label(),
        asm.parts.len(),
        asm.joints.len(),
        layout.elevation.to_degrees()
    );
    log::debug!(
        "Sling anchor {:?}, projectile {:?}, fit discrepancy {:.4}",
        sling_anchor,
        placement.point,
        placement.discrepancy
    );

    Trebuchet {
        archetype,
        parts: asm.parts,
        joints: asm.joints,
        arm,
        counterweight,
        projectile: Some(Projectile {
            body: projectile_body,
            collider: projectile_collider,
            radius,
        }),
        release_joint: Some(sling),
        trigger: Some(trigger),
        sling_length: dims.sling_length,
        sling_placement: placement,
        launch_position: placement.point,
    }
}
