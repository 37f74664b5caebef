//! One-shot and per-tick body commands.
//!
//! Gameplay code attaches a command component to a bound body; the bridge
//! applies it on the next fixed tick, before the engine steps. Commands stay
//! attached, and so repeat every tick, unless the entity also carries
//! [`ClearCommands`].
//!
//! Within a tick commands apply in this order: velocity overrides, forces and
//! torques, impulses, kinematic targets.

use serde::{Deserialize, Serialize};

use super::components::BodyType;
use super::context::PhysicsContext;
use crate::ecs::{Component, Entity, World};
use crate::math::{Quat, Vec3};

macro_rules! vector_command {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $name {
            pub x: f32,
            pub y: f32,
            pub z: f32,
        }

        impl $name {
            pub fn new(v: Vec3) -> Self {
                Self { x: v.x, y: v.y, z: v.z }
            }

            pub fn vector(&self) -> Vec3 {
                Vec3::new(self.x, self.y, self.z)
            }
        }
    };
}

vector_command!(
    /// Continuous force for this tick, in newtons.
    ApplyForce
);
vector_command!(
    /// Instantaneous change of momentum.
    ApplyImpulse
);
vector_command!(
    /// Continuous torque for this tick.
    ApplyTorque
);
vector_command!(
    /// Instantaneous change of angular momentum.
    ApplyAngularImpulse
);
vector_command!(
    /// Overwrite the linear velocity.
    SetLinearVelocity
);
vector_command!(
    /// Overwrite the angular velocity (radians per second).
    SetAngularVelocity
);
vector_command!(
    /// Next-tick position target for a position-based kinematic body.
    KinematicMove
);

/// Next-tick rotation target for a position-based kinematic body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinematicRotate {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl KinematicRotate {
    pub fn new(q: Quat) -> Self {
        Self {
            x: q.x,
            y: q.y,
            z: q.z,
            w: q.w,
        }
    }

    /// The target as a unit quaternion, or `None` for a zero or non-finite
    /// quaternion.
    pub fn rotation(&self) -> Option<Quat> {
        glam::Vec4::new(self.x, self.y, self.z, self.w)
            .try_normalize()
            .map(Quat::from_vec4)
    }
}

impl Default for KinematicRotate {
    fn default() -> Self {
        Self::new(Quat::IDENTITY)
    }
}

/// Marker: strip every command component after it has been applied.
///
/// Braced so that it deserializes from an empty field dictionary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearCommands {}

fn collect<C: Component + Copy>(world: &mut World) -> Vec<(Entity, C)> {
    let mut out = Vec::new();
    world.query::<(&C,)>(|entity, (command,)| out.push((entity, *command)));
    out
}

/// Apply every pending command to its bound body.
///
/// Forces and torques from the previous tick are cleared first, so an
/// `ApplyForce` that is removed stops pushing.
pub(crate) fn apply_commands(ctx: &mut PhysicsContext, world: &mut World) {
    let wake = true;
    for (_, body) in ctx.bodies.iter_mut() {
        body.reset_forces(false);
        body.reset_torques(false);
    }

    for (entity, cmd) in collect::<SetLinearVelocity>(world) {
        if let Some(body) = ctx.body_mut(entity) {
            body.set_linvel(cmd.vector(), wake);
        }
    }
    for (entity, cmd) in collect::<SetAngularVelocity>(world) {
        if let Some(body) = ctx.body_mut(entity) {
            body.set_angvel(cmd.vector(), wake);
        }
    }
    for (entity, cmd) in collect::<ApplyForce>(world) {
        if let Some(body) = ctx.body_mut(entity) {
            body.add_force(cmd.vector(), wake);
        }
    }
    for (entity, cmd) in collect::<ApplyTorque>(world) {
        if let Some(body) = ctx.body_mut(entity) {
            body.add_torque(cmd.vector(), wake);
        }
    }
    for (entity, cmd) in collect::<ApplyImpulse>(world) {
        if let Some(body) = ctx.body_mut(entity) {
            body.apply_impulse(cmd.vector(), wake);
        }
    }
    for (entity, cmd) in collect::<ApplyAngularImpulse>(world) {
        if let Some(body) = ctx.body_mut(entity) {
            body.apply_torque_impulse(cmd.vector(), wake);
        }
    }

    for (entity, cmd) in collect::<KinematicMove>(world) {
        if !ctx.has_body_type(entity, BodyType::KinematicPositionBased) {
            log::debug!("KinematicMove on entity {entity} ignored: not a position-based kinematic body");
            continue;
        }
        if let Some(body) = ctx.body_mut(entity) {
            body.set_next_kinematic_translation(cmd.vector());
        }
    }
    for (entity, cmd) in collect::<KinematicRotate>(world) {
        if !ctx.has_body_type(entity, BodyType::KinematicPositionBased) {
            log::debug!("KinematicRotate on entity {entity} ignored: not a position-based kinematic body");
            continue;
        }
        let Some(rotation) = cmd.rotation() else {
            log::debug!("KinematicRotate on entity {entity} ignored: not a valid rotation");
            continue;
        };
        if let Some(body) = ctx.body_mut(entity) {
            body.set_next_kinematic_rotation(rotation);
        }
    }

    for entity in world.entities_with::<ClearCommands>() {
        clear_commands(world, entity);
    }
}

fn clear_commands(world: &mut World, entity: Entity) {
    world.remove::<ApplyForce>(entity);
    world.remove::<ApplyImpulse>(entity);
    world.remove::<ApplyTorque>(entity);
    world.remove::<ApplyAngularImpulse>(entity);
    world.remove::<SetLinearVelocity>(entity);
    world.remove::<SetAngularVelocity>(entity);
    world.remove::<KinematicMove>(entity);
    world.remove::<KinematicRotate>(entity);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::components::{Body, Collider};
    use crate::physics::context::pose_of;

    #[test]
    fn vector_commands_round_out_missing_axes() {
        let cmd: ApplyImpulse = serde_json::from_str(r#"{ "x": 5.0 }"#).unwrap();
        assert_eq!(cmd.vector(), Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn kinematic_rotate_defaults_to_identity() {
        assert_eq!(KinematicRotate::default().rotation(), Some(Quat::IDENTITY));
    }

    #[test]
    fn zero_rotation_target_is_skipped() {
        let mut world = World::new();
        let e = world.spawn((KinematicRotate {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 0.0,
        },));
        let mut ctx = PhysicsContext::new(Vec3::ZERO, 1.0 / 60.0);
        ctx.bind(e, &Body::kinematic_position(), &Collider::default());
        apply_commands(&mut ctx, &mut world);
        ctx.step();

        let (position, rotation) = pose_of(ctx.body_mut(e).unwrap());
        assert!(rotation.is_finite() && position.is_finite());
        assert!(rotation.abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn clear_commands_strips_everything() {
        let mut world = World::new();
        let e = world.spawn((
            ApplyForce::new(Vec3::X),
            SetLinearVelocity::new(Vec3::Y),
            ClearCommands {},
        ));
        let mut ctx = PhysicsContext::new(Vec3::ZERO, 1.0 / 60.0);
        apply_commands(&mut ctx, &mut world);
        assert!(!world.has::<ApplyForce>(e));
        assert!(!world.has::<SetLinearVelocity>(e));
        assert!(world.has::<ClearCommands>(e));
    }
}
