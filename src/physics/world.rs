//! rapier2d world wrapper
//!
//! Owns every rapier set for one simulation. The ground slab is created with
//! the world and survives every trebuchet rebuild; everything else is added
//! and removed by the builder and the launch controller.

use glam::Vec2;
use rapier2d::na::Unit;
use rapier2d::prelude::*;
use serde::Serialize;

use super::filter::CollisionLayer;
use crate::consts::*;

/// Collider shape, in body-local units
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Shape {
    Ball { radius: f32 },
    Cuboid { half_extents: Vec2 },
}

impl Shape {
    pub fn ball(diameter: f32) -> Self {
        Shape::Ball {
            radius: (diameter / 2.0).max(MIN_DIMENSION),
        }
    }

    pub fn cuboid(width: f32, height: f32) -> Self {
        Shape::Cuboid {
            half_extents: Vec2::new(width.max(MIN_DIMENSION), height.max(MIN_DIMENSION)) / 2.0,
        }
    }

    pub fn area(&self) -> f32 {
        match self {
            Shape::Ball { radius } => std::f32::consts::PI * radius * radius,
            Shape::Cuboid { half_extents } => 4.0 * half_extents.x * half_extents.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Fixed,
    Dynamic,
}

/// Rigid body placement
#[derive(Debug, Clone, Copy)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub position: Vec2,
    pub angle: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Continuous collision detection (fast projectiles)
    pub ccd: bool,
}

impl BodyDesc {
    pub fn fixed(position: Vec2) -> Self {
        Self {
            kind: BodyKind::Fixed,
            position,
            angle: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            ccd: false,
        }
    }

    pub fn dynamic(position: Vec2) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            ..Self::fixed(position)
        }
    }

    pub fn angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    pub fn ccd(mut self) -> Self {
        self.ccd = true;
        self
    }
}

/// Collider attached to a body
#[derive(Debug, Clone, Copy)]
pub struct ColliderDesc {
    pub shape: Shape,
    /// Offset of the shape from the body origin (body-local)
    pub offset: Vec2,
    /// Derived from the requested mass, never hardcoded
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub layer: CollisionLayer,
}

impl ColliderDesc {
    /// Collider whose density spreads `mass` evenly over the shape's area
    pub fn with_mass(shape: Shape, mass: f32, layer: CollisionLayer) -> Self {
        Self {
            shape,
            offset: Vec2::ZERO,
            density: mass.max(0.0) / shape.area(),
            friction: 0.5,
            restitution: 0.0,
            layer,
        }
    }

    pub fn offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }
}

/// Torsion spring driving a revolute joint toward a relative angle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngularSpring {
    pub target: f32,
    pub stiffness: f32,
    pub damping: f32,
}

/// Joint between two bodies; anchors are body-local
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JointDesc {
    /// Rotation only
    Revolute {
        anchor1: Vec2,
        anchor2: Vec2,
        spring: Option<AngularSpring>,
    },
    /// Rigid weld; keeps the relative angle the bodies were created with
    Fixed {
        anchor1: Vec2,
        anchor2: Vec2,
        relative_angle: f32,
    },
    /// One translational degree of freedom along `axis` (body 1 frame)
    Prismatic {
        anchor1: Vec2,
        anchor2: Vec2,
        axis: Vec2,
        limits: Option<[f32; 2]>,
    },
    /// Resists stretching past `max_length`, slack otherwise
    Rope {
        anchor1: Vec2,
        anchor2: Vec2,
        max_length: f32,
    },
}

/// Snapshot of one body's kinematic state
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodyState {
    pub position: Vec2,
    pub angle: f32,
    pub linvel: Vec2,
    pub angvel: f32,
    pub fixed: bool,
}

fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

fn to_point(v: Vec2) -> Point<Real> {
    point![v.x, v.y]
}

fn from_vector(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// One isolated rapier world plus its ground slab
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    ground: RigidBodyHandle,
    ground_collider: ColliderHandle,
}

impl PhysicsWorld {
    /// Fresh world with gravity along -Y and a ground surface at `ground_y`
    pub fn new(gravity: f32, ground_y: f32) -> Self {
        let mut rigid_body_set = RigidBodySet::new();
        let mut collider_set = ColliderSet::new();

        let ground = rigid_body_set.insert(
            RigidBodyBuilder::fixed()
                .translation(vector![0.0, ground_y - GROUND_HALF_THICKNESS])
                .build(),
        );
        let ground_collider = collider_set.insert_with_parent(
            ColliderBuilder::cuboid(GROUND_HALF_WIDTH, GROUND_HALF_THICKNESS)
                .friction(GROUND_FRICTION)
                .collision_groups(CollisionLayer::Ground.groups())
                .build(),
            ground,
            &mut rigid_body_set,
        );

        Self {
            gravity: vector![0.0, -gravity],
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set,
            collider_set,
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            ground,
            ground_collider,
        }
    }

    pub fn ground(&self) -> RigidBodyHandle {
        self.ground
    }

    pub fn ground_collider(&self) -> ColliderHandle {
        self.ground_collider
    }

    /// Advance the world by one fixed step
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }

    pub fn add_body(&mut self, desc: BodyDesc) -> RigidBodyHandle {
        let builder = match desc.kind {
            BodyKind::Fixed => RigidBodyBuilder::fixed(),
            // Trebuchet parts are always moving or about to; sleeping would
            // only freeze a paused build in place.
            BodyKind::Dynamic => RigidBodyBuilder::dynamic().can_sleep(false),
        };
        let body = builder
            .translation(to_vector(desc.position))
            .rotation(desc.angle)
            .linear_damping(desc.linear_damping)
            .angular_damping(desc.angular_damping)
            .ccd_enabled(desc.ccd)
            .build();
        self.rigid_body_set.insert(body)
    }

    pub fn add_collider(&mut self, body: RigidBodyHandle, desc: ColliderDesc) -> ColliderHandle {
        let builder = match desc.shape {
            Shape::Ball { radius } => ColliderBuilder::ball(radius),
            Shape::Cuboid { half_extents } => ColliderBuilder::cuboid(half_extents.x, half_extents.y),
        };
        let collider = builder
            .translation(to_vector(desc.offset))
            .density(desc.density)
            .friction(desc.friction)
            .restitution(desc.restitution)
            .collision_groups(desc.layer.groups())
            .build();
        self.collider_set
            .insert_with_parent(collider, body, &mut self.rigid_body_set)
    }

    pub fn add_joint(
        &mut self,
        body1: RigidBodyHandle,
        body2: RigidBodyHandle,
        desc: JointDesc,
    ) -> ImpulseJointHandle {
        let joint: GenericJoint = match desc {
            JointDesc::Revolute {
                anchor1,
                anchor2,
                spring,
            } => {
                let mut builder = RevoluteJointBuilder::new()
                    .local_anchor1(to_point(anchor1))
                    .local_anchor2(to_point(anchor2));
                if let Some(spring) = spring {
                    builder = builder.motor_position(spring.target, spring.stiffness, spring.damping);
                }
                builder.build().into()
            }
            JointDesc::Fixed {
                anchor1,
                anchor2,
                relative_angle,
            } => FixedJointBuilder::new()
                .local_frame1(Isometry::new(to_vector(anchor1), relative_angle))
                .local_frame2(Isometry::new(to_vector(anchor2), 0.0))
                .build()
                .into(),
            JointDesc::Prismatic {
                anchor1,
                anchor2,
                axis,
                limits,
            } => {
                let mut builder = PrismaticJointBuilder::new(Unit::new_normalize(to_vector(axis)))
                    .local_anchor1(to_point(anchor1))
                    .local_anchor2(to_point(anchor2));
                if let Some(limits) = limits {
                    builder = builder.limits(limits);
                }
                builder.build().into()
            }
            JointDesc::Rope {
                anchor1,
                anchor2,
                max_length,
            } => RopeJointBuilder::new(max_length.max(0.0))
                .local_anchor1(to_point(anchor1))
                .local_anchor2(to_point(anchor2))
                .build()
                .into(),
        };
        self.impulse_joint_set.insert(body1, body2, joint, true)
    }

    /// Destroy a joint; false if it was already gone
    pub fn remove_joint(&mut self, joint: ImpulseJointHandle) -> bool {
        self.impulse_joint_set.remove(joint, true).is_some()
    }

    /// Destroy a body together with its colliders and every joint touching it
    pub fn remove_body(&mut self, body: RigidBodyHandle) -> bool {
        self.rigid_body_set
            .remove(
                body,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            )
            .is_some()
    }

    pub fn body_state(&self, body: RigidBodyHandle) -> Option<BodyState> {
        self.rigid_body_set.get(body).map(|rb| BodyState {
            position: from_vector(rb.translation()),
            angle: rb.rotation().angle(),
            linvel: from_vector(rb.linvel()),
            angvel: rb.angvel(),
            fixed: rb.is_fixed(),
        })
    }

    pub fn position(&self, body: RigidBodyHandle) -> Option<Vec2> {
        self.rigid_body_set.get(body).map(|rb| from_vector(rb.translation()))
    }

    pub fn linvel(&self, body: RigidBodyHandle) -> Option<Vec2> {
        self.rigid_body_set.get(body).map(|rb| from_vector(rb.linvel()))
    }

    /// Body mass as computed by the engine from collider densities
    pub fn mass(&self, body: RigidBodyHandle) -> Option<f32> {
        self.rigid_body_set.get(body).map(|rb| rb.mass())
    }

    /// Body-local point in world space
    pub fn world_point(&self, body: RigidBodyHandle, local: Vec2) -> Option<Vec2> {
        self.rigid_body_set.get(body).map(|rb| {
            let p = rb.position().transform_point(&to_point(local));
            Vec2::new(p.x, p.y)
        })
    }

    /// Both anchors of a joint in world space
    pub fn joint_anchors(&self, joint: ImpulseJointHandle) -> Option<(Vec2, Vec2)> {
        let joint = self.impulse_joint_set.get(joint)?;
        let a1 = joint.data.local_anchor1();
        let a2 = joint.data.local_anchor2();
        Some((
            self.world_point(joint.body1, Vec2::new(a1.x, a1.y))?,
            self.world_point(joint.body2, Vec2::new(a2.x, a2.y))?,
        ))
    }

    pub fn has_joint(&self, joint: ImpulseJointHandle) -> bool {
        self.impulse_joint_set.get(joint).is_some()
    }

    pub fn set_velocity(&mut self, body: RigidBodyHandle, linvel: Vec2, angvel: f32) {
        if let Some(rb) = self.rigid_body_set.get_mut(body) {
            rb.set_linvel(to_vector(linvel), true);
            rb.set_angvel(angvel, true);
        }
    }

    /// Stop a body dead and take it out of the simulation
    pub fn freeze(&mut self, body: RigidBodyHandle) {
        if let Some(rb) = self.rigid_body_set.get_mut(body) {
            rb.set_linvel(Vector::zeros(), false);
            rb.set_angvel(0.0, false);
            rb.set_body_type(RigidBodyType::Fixed, false);
        }
    }

    /// Whether two colliders currently touch
    pub fn in_contact(&self, a: ColliderHandle, b: ColliderHandle) -> bool {
        self.narrow_phase
            .contact_pair(a, b)
            .is_some_and(|pair| pair.has_any_active_contact)
    }

    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    pub fn collider_count(&self) -> usize {
        self.collider_set.len()
    }

    pub fn joint_count(&self) -> usize {
        self.impulse_joint_set.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn ball_at(world: &mut PhysicsWorld, pos: Vec2) -> (RigidBodyHandle, ColliderHandle) {
        let body = world.add_body(BodyDesc::dynamic(pos));
        let collider = world.add_collider(
            body,
            ColliderDesc::with_mass(Shape::ball(0.5), 2.0, CollisionLayer::Projectile),
        );
        (body, collider)
    }

    #[test]
    fn test_new_world_has_only_ground() {
        let world = PhysicsWorld::new(GRAVITY, 0.0);
        assert_eq!(world.body_count(), 1);
        assert_eq!(world.collider_count(), 1);
        assert_eq!(world.joint_count(), 0);
    }

    #[test]
    fn test_mass_from_density() {
        let mut world = PhysicsWorld::new(GRAVITY, 0.0);
        let body = world.add_body(BodyDesc::dynamic(Vec2::new(0.0, 5.0)));
        world.add_collider(
            body,
            ColliderDesc::with_mass(Shape::cuboid(3.0, 0.4), 42.0, CollisionLayer::Arm),
        );
        let mass = world.mass(body).unwrap();
        assert!((mass - 42.0).abs() < 1e-2, "mass {}", mass);
    }

    #[test]
    fn test_ball_falls_and_touches_ground() {
        let mut world = PhysicsWorld::new(GRAVITY, 0.0);
        let (body, collider) = ball_at(&mut world, Vec2::new(0.0, 3.0));
        assert!(!world.in_contact(collider, world.ground_collider()));

        for _ in 0..240 {
            world.step(DT);
        }
        let pos = world.position(body).unwrap();
        assert!(pos.y < 0.5 && pos.y > 0.0, "resting at {}", pos.y);
        assert!(world.in_contact(collider, world.ground_collider()));
    }

    #[test]
    fn test_rope_holds_max_length() {
        let mut world = PhysicsWorld::new(GRAVITY, -100.0);
        let anchor = world.add_body(BodyDesc::fixed(Vec2::new(0.0, 10.0)));
        let (ball, _) = ball_at(&mut world, Vec2::new(3.0, 10.0));
        let rope = world.add_joint(
            anchor,
            ball,
            JointDesc::Rope {
                anchor1: Vec2::ZERO,
                anchor2: Vec2::ZERO,
                max_length: 3.0,
            },
        );
        for _ in 0..120 {
            world.step(DT);
        }
        let (a, b) = world.joint_anchors(rope).unwrap();
        assert!((a.distance(b) - 3.0).abs() < 0.1);
    }

    #[test]
    fn test_remove_body_takes_joints_with_it() {
        let mut world = PhysicsWorld::new(GRAVITY, 0.0);
        let anchor = world.add_body(BodyDesc::fixed(Vec2::new(0.0, 10.0)));
        let (ball, _) = ball_at(&mut world, Vec2::new(0.0, 8.0));
        let joint = world.add_joint(
            anchor,
            ball,
            JointDesc::Revolute {
                anchor1: Vec2::ZERO,
                anchor2: Vec2::new(0.0, 2.0),
                spring: None,
            },
        );
        assert_eq!(world.joint_count(), 1);
        assert!(world.remove_body(ball));
        assert!(!world.has_joint(joint));
        assert_eq!(world.joint_count(), 0);
        assert_eq!(world.collider_count(), 1);
        assert!(!world.remove_body(ball));
    }

    #[test]
    fn test_freeze_zeroes_velocity() {
        let mut world = PhysicsWorld::new(GRAVITY, 0.0);
        let (ball, _) = ball_at(&mut world, Vec2::new(0.0, 20.0));
        world.set_velocity(ball, Vec2::new(5.0, 3.0), 2.0);
        world.step(DT);
        world.freeze(ball);
        let before = world.position(ball).unwrap();
        for _ in 0..30 {
            world.step(DT);
        }
        let state = world.body_state(ball).unwrap();
        assert!(state.fixed);
        assert_eq!(state.linvel, Vec2::ZERO);
        assert_eq!(state.angvel, 0.0);
        assert_eq!(state.position, before);
    }
}
