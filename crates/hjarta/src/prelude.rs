//! Convenience re-exports. `use hjarta::prelude::*` brings in the common items.

// Core
pub use crate::config::SimConfig;
pub use crate::ecs::{
    ComponentRegistry, Entity, Parent, Phase, Placement, Schedule, System, TransformPlugin, World,
    WorldTransform,
};
pub use crate::error::{BoxError, EcsError, StepError, SystemResult};
pub use crate::interpolation::{InterpolatedTransform, Interpolation, InterpolationPlugin};
pub use crate::math::{Quat, Transform, Vec3};
pub use crate::state::{Plugin, State};
pub use crate::time::Time;

// Physics (feature-gated)
#[cfg(feature = "physics3d")]
pub use crate::physics::{
    ApplyAngularImpulse, ApplyForce, ApplyImpulse, ApplyTorque, Body, BodyType,
    CharacterController, CharacterMovement, ClearCommands, Collider, ColliderShape,
    CollisionEvents, KinematicMove, KinematicRotate, PhysicsContext, PhysicsPlugin, PhysicsWorld,
    SetAngularVelocity, SetLinearVelocity, TouchEvent, TouchEvents,
};
