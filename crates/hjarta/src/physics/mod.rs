//! # 3D Physics via Rapier
//!
//! Attach a [`Body`] and a [`Collider`] to an entity and the bridge gives it
//! an engine body on the next fixed tick. From then on the engine owns the
//! pose: after every step it is written back into `Body` and mirrored into a
//! root entity's `Transform`.
//!
//! ```ignore
//! let mut state = State::with_defaults();
//! state.world_mut().spawn((
//!     Transform::from_xyz(0.0, 5.0, 0.0),
//!     Body::dynamic(),
//!     Collider::cuboid(0.5, 0.5, 0.5),
//!     InterpolatedTransform::default(),
//! ));
//! state.step(1.0 / 60.0)?;
//! ```
//!
//! ## Module Overview
//!
//! - [`components`] — Body, collider, world settings and character components
//! - [`commands`] — Forces, impulses, velocity overrides, kinematic targets
//! - [`context`] — The Rapier world and entity bindings
//! - [`character`] — Kinematic character controller solve
//! - [`events`] — Touch start/end reporting
//! - [`bridge`] — The fixed-tick system tying it together

pub mod bridge;
pub(crate) mod character;
pub mod commands;
pub mod components;
pub mod context;
pub mod events;

pub use bridge::physics_step;
pub use commands::{
    ApplyAngularImpulse, ApplyForce, ApplyImpulse, ApplyTorque, ClearCommands, KinematicMove,
    KinematicRotate, SetAngularVelocity, SetLinearVelocity,
};
pub use components::{
    Body, BodyType, CharacterController, CharacterMovement, Collider, ColliderShape,
    CollisionEvents, PhysicsWorld,
};
pub use context::PhysicsContext;
pub use events::{TouchEvent, TouchEvents};

use crate::ecs::Phase;
use crate::ecs::registry::ComponentRegistry;
use crate::state::{Plugin, State};

/// Register every physics component with the name-based registry.
pub(crate) fn register_components(registry: &mut ComponentRegistry) {
    registry.register::<Body>();
    registry.register::<Collider>();
    registry.register::<PhysicsWorld>();
    registry.register::<CollisionEvents>();
    registry.register::<CharacterController>();
    registry.register::<CharacterMovement>();
    registry.register::<ApplyForce>();
    registry.register::<ApplyImpulse>();
    registry.register::<ApplyTorque>();
    registry.register::<ApplyAngularImpulse>();
    registry.register::<SetLinearVelocity>();
    registry.register::<SetAngularVelocity>();
    registry.register::<KinematicMove>();
    registry.register::<KinematicRotate>();
    registry.register::<ClearCommands>();
}

// ── Plugin ──────────────────────────────────────────────────────────────

/// Inserts [`PhysicsContext`] and [`TouchEvents`] and runs [`physics_step`]
/// in the fixed phase.
///
/// Gravity and timestep come from the state's
/// [`SimConfig`](crate::config::SimConfig); a [`PhysicsWorld`] entity
/// overrides the gravity at runtime.
pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, state: &mut State) {
        let config = state.config();
        let ctx = PhysicsContext::new(config.gravity, config.fixed_timestep);
        state.world_mut().insert_resource(ctx);
        state.world_mut().insert_resource(TouchEvents::default());
        state.add_system(Phase::Fixed, physics_step);
    }
}
