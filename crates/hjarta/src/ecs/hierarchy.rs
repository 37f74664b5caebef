//! # Entity Hierarchies — Weak Parent Links
//!
//! A child points at its parent with [`Parent`]. The link is lookup-only: the
//! parent doesn't know its children, despawning the parent doesn't touch the
//! child, and a link to a dead entity is simply "not resolvable yet".
//!
//! ```ignore
//! let arm = world.spawn((Transform::from_xyz(0.0, 1.0, 0.0),));
//! let hand = world.spawn_child(arm, (Transform::from_xyz(0.5, 0.0, 0.0),));
//! resolve_transforms(&mut world)?;
//! // hand's WorldTransform is now arm ∘ hand.
//! ```
//!
//! ## Resolution order
//!
//! Children are processed by depth (distance to their root), so a grandchild
//! always sees its parent's pose from this pass, whatever order the entities
//! were created in.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::system::{Phase, Placement};
use super::world::World;
use crate::error::SystemResult;
use crate::interpolation::InterpolatedTransform;
use crate::math::{Quat, Transform, Vec3, euler_degrees_from_quat};
use crate::state::{Plugin, State};
use crate::time::Time;

/// Weak link from a child to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parent {
    pub entity: Entity,
}

/// Resolved world-space pose. Written only by [`resolve_transforms`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorldTransform {
    position: Vec3,
    rotation: Quat,
    euler: Vec3,
    scale: Vec3,
}

impl WorldTransform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        euler: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub(crate) fn from_parts(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            euler: euler_degrees_from_quat(rotation),
            scale,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Degrees, intrinsic XYZ.
    pub fn euler(&self) -> Vec3 {
        self.euler
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// `self ∘ local`: `local` expressed in the frame described by `self`.
    pub fn compose(&self, local: &Transform) -> Self {
        Self::from_parts(
            self.position + self.rotation * (self.scale * local.position),
            (self.rotation * local.rotation).normalize(),
            self.scale * local.scale,
        )
    }
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Number of links between `entity` and its root, or `None` on a cycle.
fn depth(world: &World, entity: Entity, limit: usize) -> Option<usize> {
    let mut depth = 0;
    let mut current = entity;
    while let Some(parent) = world.get::<Parent>(current) {
        depth += 1;
        if depth > limit {
            return None;
        }
        current = parent.entity;
    }
    Some(depth)
}

/// Bring every `WorldTransform` up to date.
///
/// - Euler and quaternion fields of every [`Transform`] are reconciled.
/// - Roots get `WorldTransform = Transform`, or the interpolated physics pose
///   when they carry an [`InterpolatedTransform`].
/// - Children get `parent world ∘ child local`. A child whose parent is dead
///   or has no `Transform` keeps its previous `WorldTransform`.
pub fn resolve_transforms(world: &mut World) -> SystemResult {
    world.query::<(&mut Transform,)>(|_, (transform,)| {
        transform.sync_rotation();
    });

    let alpha = world.get_resource::<Time>().map_or(1.0, Time::alpha);
    let mut resolved: HashMap<Entity, WorldTransform> = HashMap::new();

    let mut roots = Vec::new();
    world.query_without::<(&Transform,), Parent>(|entity, (transform,)| {
        roots.push((entity, *transform));
    });
    for (entity, local) in roots {
        let pose = match world.get::<InterpolatedTransform>(entity) {
            Some(interp) => {
                let (position, rotation) = interp.pose_at(alpha);
                WorldTransform::from_parts(position, rotation, local.scale)
            }
            None => WorldTransform::from_parts(local.position, local.rotation, local.scale),
        };
        world.insert(entity, pose)?;
        resolved.insert(entity, pose);
    }

    let mut children = Vec::new();
    world.query::<(&Transform, &Parent)>(|entity, (transform, parent)| {
        children.push((entity, *transform, parent.entity));
    });
    let limit = children.len();
    let mut ordered = Vec::with_capacity(children.len());
    for (entity, local, parent) in children {
        match depth(world, entity, limit) {
            Some(d) => ordered.push((d, entity, local, parent)),
            None => log::warn!("entity {entity} is part of a parent cycle, skipping"),
        }
    }
    ordered.sort_by_key(|(d, entity, _, _)| (*d, *entity));

    for (_, entity, local, parent) in ordered {
        let parent_pose = match resolved.get(&parent) {
            Some(pose) => Some(*pose),
            None if world.has::<Transform>(parent) => world.get::<WorldTransform>(parent).copied(),
            None => None,
        };
        match parent_pose {
            Some(parent_pose) => {
                let pose = parent_pose.compose(&local);
                world.insert(entity, pose)?;
                resolved.insert(entity, pose);
            }
            None => {
                if !world.has::<WorldTransform>(entity) {
                    world.insert(entity, WorldTransform::default())?;
                }
            }
        }
    }
    Ok(())
}

/// Resolves world transforms at the end of the simulation phase.
pub struct TransformPlugin;

impl Plugin for TransformPlugin {
    fn build(&self, state: &mut State) {
        state.add_system_at(Phase::Simulation, Placement::Last, resolve_transforms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    #[test]
    fn world_transform_appears_after_first_pass() {
        let mut world = World::new();
        let e = world.spawn((Transform::from_xyz(1.0, 2.0, 3.0),));
        assert!(world.get::<WorldTransform>(e).is_none());

        resolve_transforms(&mut world).unwrap();
        let wt = world.get::<WorldTransform>(e).unwrap();
        assert_eq!(wt.position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(wt.scale(), Vec3::ONE);
    }

    #[test]
    fn child_inherits_parent_transform() {
        let mut world = World::new();
        let parent = world.spawn((Transform::from_xyz(100.0, 0.0, 0.0),));
        let child = world.spawn_child(parent, (Transform::from_xyz(10.0, 0.0, 0.0),));

        resolve_transforms(&mut world).unwrap();
        let wt = world.get::<WorldTransform>(child).unwrap();
        assert!(close(wt.position(), Vec3::new(110.0, 0.0, 0.0)));
    }

    #[test]
    fn parent_rotation_turns_child_offset() {
        let mut world = World::new();
        let parent = world.spawn((Transform::IDENTITY.with_euler_degrees(Vec3::new(0.0, 0.0, 90.0)),));
        let child = world.spawn_child(parent, (Transform::from_xyz(1.0, 0.0, 0.0),));

        resolve_transforms(&mut world).unwrap();
        let wt = world.get::<WorldTransform>(child).unwrap();
        assert!(close(wt.position(), Vec3::new(0.0, 1.0, 0.0)));
        assert!(close(wt.euler(), Vec3::new(0.0, 0.0, 90.0)));
    }

    #[test]
    fn grandchild_resolves_regardless_of_creation_order() {
        let mut world = World::new();
        // Create the deepest entity first and wire the links afterwards.
        let grandchild = world.spawn((Transform::from_xyz(1.0, 0.0, 0.0),));
        let child = world.spawn((Transform::from_xyz(1.0, 0.0, 0.0),));
        let root = world.spawn((Transform::from_xyz(1.0, 0.0, 0.0),));
        world.insert(grandchild, Parent { entity: child }).unwrap();
        world.insert(child, Parent { entity: root }).unwrap();

        resolve_transforms(&mut world).unwrap();
        let wt = world.get::<WorldTransform>(grandchild).unwrap();
        assert!(close(wt.position(), Vec3::new(3.0, 0.0, 0.0)));
    }

    #[test]
    fn dangling_parent_leaves_world_transform_untouched() {
        let mut world = World::new();
        let parent = world.spawn((Transform::from_xyz(5.0, 0.0, 0.0),));
        let child = world.spawn_child(parent, (Transform::from_xyz(1.0, 0.0, 0.0),));
        resolve_transforms(&mut world).unwrap();
        let before = *world.get::<WorldTransform>(child).unwrap();

        world.despawn(parent);
        world.get_mut::<Transform>(child).unwrap().position = Vec3::new(50.0, 0.0, 0.0);
        resolve_transforms(&mut world).unwrap();
        assert_eq!(*world.get::<WorldTransform>(child).unwrap(), before);
    }

    #[test]
    fn parent_without_transform_defaults_child() {
        let mut world = World::new();
        let parent = world.spawn_empty();
        let child = world.spawn_child(parent, (Transform::from_xyz(1.0, 0.0, 0.0),));
        resolve_transforms(&mut world).unwrap();
        assert_eq!(*world.get::<WorldTransform>(child).unwrap(), WorldTransform::IDENTITY);
    }

    #[test]
    fn cycles_are_skipped() {
        let mut world = World::new();
        let a = world.spawn((Transform::IDENTITY,));
        let b = world.spawn((Transform::IDENTITY, Parent { entity: a }));
        world.insert(a, Parent { entity: b }).unwrap();
        resolve_transforms(&mut world).unwrap();
        assert!(world.get::<WorldTransform>(a).is_none());
        assert!(world.get::<WorldTransform>(b).is_none());
    }

    #[test]
    fn interpolated_root_uses_blended_pose() {
        let mut world = World::new();
        let mut time = Time::new(1.0 / 60.0);
        time.set_alpha(0.5);
        world.insert_resource(time);
        let e = world.spawn((
            Transform::from_xyz(10.0, 0.0, 0.0),
            InterpolatedTransform::between(
                Vec3::ZERO,
                Quat::IDENTITY,
                Vec3::new(10.0, 0.0, 0.0),
                Quat::IDENTITY,
            ),
        ));
        resolve_transforms(&mut world).unwrap();
        assert!(close(world.get::<WorldTransform>(e).unwrap().position(), Vec3::new(5.0, 0.0, 0.0)));
    }

    proptest! {
        #[test]
        fn unrotated_parent_scales_then_translates(
            p in (-50.0f32..50.0, -50.0f32..50.0, -50.0f32..50.0),
            s in (0.1f32..4.0, 0.1f32..4.0, 0.1f32..4.0),
            c in (-50.0f32..50.0, -50.0f32..50.0, -50.0f32..50.0),
        ) {
            let parent_pos = Vec3::new(p.0, p.1, p.2);
            let parent_scale = Vec3::new(s.0, s.1, s.2);
            let child_pos = Vec3::new(c.0, c.1, c.2);

            let mut world = World::new();
            let parent = world.spawn((Transform::from_position(parent_pos).with_scale(parent_scale),));
            let child = world.spawn_child(parent, (Transform::from_position(child_pos),));
            resolve_transforms(&mut world).unwrap();

            let got = world.get::<WorldTransform>(child).unwrap().position();
            let want = parent_pos + parent_scale * child_pos;
            prop_assert!((got - want).abs().max_element() < 1e-3);
        }
    }
}
