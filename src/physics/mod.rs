//! Rigid-body engine boundary
//!
//! The simulator never integrates forces itself. It describes bodies,
//! colliders and joints, hands them to rapier2d through `PhysicsWorld`, and
//! reads positions and contacts back. Core code speaks `glam::Vec2`; rapier's
//! nalgebra types stay inside this module.

pub mod filter;
pub mod world;

pub use filter::CollisionLayer;
pub use world::{
    AngularSpring, BodyDesc, BodyKind, BodyState, ColliderDesc, JointDesc, PhysicsWorld, Shape,
};

pub use rapier2d::prelude::{ColliderHandle, ImpulseJointHandle, RigidBodyHandle};
