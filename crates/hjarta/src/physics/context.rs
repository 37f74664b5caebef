//! The engine-side physics state.
//!
//! [`PhysicsContext`] owns every Rapier set plus the entity ↔ handle
//! bindings. It lives in the world as a resource; the bridge system lifts it
//! out for the duration of a tick.

use std::collections::HashMap;

use rapier3d::prelude::*;

use super::components::{Body, BodyType, Collider, ColliderShape};
use super::events::EventCollector;
use crate::ecs::Entity;
use crate::math::{BVec3, Quat, Vec3};

// ── Conversion helpers ──────────────────────────────────────────────────

fn body_type_to_rapier(bt: BodyType) -> RigidBodyType {
    match bt {
        BodyType::Dynamic => RigidBodyType::Dynamic,
        BodyType::Fixed => RigidBodyType::Fixed,
        BodyType::KinematicPositionBased => RigidBodyType::KinematicPositionBased,
        BodyType::KinematicVelocityBased => RigidBodyType::KinematicVelocityBased,
    }
}

fn shape_to_collider_builder(shape: &ColliderShape) -> ColliderBuilder {
    match *shape {
        ColliderShape::Box { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
        ColliderShape::Sphere { radius } => ColliderBuilder::ball(radius),
        ColliderShape::Capsule {
            half_height,
            radius,
        } => ColliderBuilder::capsule_y(half_height, radius),
        ColliderShape::Cylinder {
            half_height,
            radius,
        } => ColliderBuilder::cylinder(half_height, radius),
        ColliderShape::Cone {
            half_height,
            radius,
        } => ColliderBuilder::cone(half_height, radius),
    }
}

/// Convert a glam Quat to a scaled-axis-angle Vec3 (for the builders' `rotation`).
fn quat_to_scaled_axis(q: Quat) -> Vec3 {
    let (axis, angle) = q.to_axis_angle();
    axis * angle
}

fn locked_axes(locks: BVec3) -> LockedAxes {
    let mut axes = LockedAxes::empty();
    if locks.x {
        axes |= LockedAxes::ROTATION_LOCKED_X;
    }
    if locks.y {
        axes |= LockedAxes::ROTATION_LOCKED_Y;
    }
    if locks.z {
        axes |= LockedAxes::ROTATION_LOCKED_Z;
    }
    axes
}

pub(crate) fn pose_of(body: &RigidBody) -> (Vec3, Quat) {
    let t = body.translation();
    let r = *body.rotation();
    (Vec3::new(t.x, t.y, t.z), r)
}

pub(crate) fn velocities_of(body: &RigidBody) -> (Vec3, Vec3) {
    let v = body.linvel();
    let w = body.angvel();
    (Vec3::new(v.x, v.y, v.z), Vec3::new(w.x, w.y, w.z))
}

fn build_collider(collider: &Collider, mass: f32) -> rapier3d::prelude::Collider {
    let groups = InteractionGroups {
        memberships: Group::from_bits_truncate(collider.memberships),
        filter: Group::from_bits_truncate(collider.filter),
        ..Default::default()
    };
    let mut builder = shape_to_collider_builder(&collider.shape)
        .translation(collider.offset_position)
        .rotation(quat_to_scaled_axis(collider.offset_rotation))
        .friction(collider.friction)
        .restitution(collider.restitution)
        .sensor(collider.sensor)
        .collision_groups(groups)
        .active_events(ActiveEvents::COLLISION_EVENTS);
    builder = if mass > 0.0 {
        builder.mass(mass)
    } else {
        builder.density(collider.density)
    };
    if collider.sensor {
        builder = builder.active_collision_types(ActiveCollisionTypes::all());
    }
    builder.build()
}

// ── Bindings ────────────────────────────────────────────────────────────

/// Body settings pushed to the engine whenever they change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BodyProps {
    pub(crate) body_type: BodyType,
    pub(crate) linear_damping: f32,
    pub(crate) angular_damping: f32,
    pub(crate) gravity_scale: f32,
    pub(crate) lock_rotations: BVec3,
    pub(crate) ccd: bool,
}

impl From<&Body> for BodyProps {
    fn from(body: &Body) -> Self {
        Self {
            body_type: body.body_type,
            linear_damping: body.linear_damping,
            angular_damping: body.angular_damping,
            gravity_scale: body.gravity_scale,
            lock_rotations: body.lock_rotations,
            ccd: body.ccd,
        }
    }
}

/// One entity's link to its engine body and collider.
#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub(crate) body: RigidBodyHandle,
    pub(crate) collider: ColliderHandle,
    pub(crate) props: BodyProps,
    pub(crate) mass: f32,
    pub(crate) collider_desc: Collider,
    /// Pose and velocities as last exchanged with the ECS. A component value
    /// that differs from these was written from outside.
    pub(crate) position: Vec3,
    pub(crate) rotation: Quat,
    pub(crate) linvel: Vec3,
    pub(crate) angvel: Vec3,
    /// The entity's `CollisionEvents` opt-in as of the last tick.
    pub(crate) reports_touches: bool,
}

impl Binding {
    pub(crate) fn body_type(&self) -> BodyType {
        self.props.body_type
    }

    pub(crate) fn record_pose(&mut self, position: Vec3, rotation: Quat) {
        self.position = position;
        self.rotation = rotation;
    }
}

// ── Resource ────────────────────────────────────────────────────────────

/// Rapier world plus the entity bindings. Inserted by
/// [`PhysicsPlugin`](super::PhysicsPlugin).
pub struct PhysicsContext {
    gravity: Vec3,
    pipeline: PhysicsPipeline,
    pub(crate) params: IntegrationParameters,
    pub(crate) islands: IslandManager,
    pub(crate) broad_phase: DefaultBroadPhase,
    pub(crate) narrow_phase: NarrowPhase,
    pub(crate) bodies: RigidBodySet,
    pub(crate) colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    pub(crate) bindings: HashMap<Entity, Binding>,
    collider_owners: HashMap<ColliderHandle, Entity>,
    /// Colliders released this tick. The engine reports their last touches
    /// during the next step, after the live mapping is gone.
    retired_owners: HashMap<ColliderHandle, (Entity, bool)>,
    pub(crate) events: EventCollector,
}

impl std::fmt::Debug for PhysicsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsContext")
            .field("gravity", &self.gravity)
            .field("dt", &self.params.dt)
            .field("bodies", &self.bodies.len())
            .field("colliders", &self.colliders.len())
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

impl PhysicsContext {
    /// An empty engine world stepping `dt` seconds per tick.
    pub fn new(gravity: Vec3, dt: f32) -> Self {
        let params = IntegrationParameters {
            dt,
            ..IntegrationParameters::default()
        };
        Self {
            gravity,
            pipeline: PhysicsPipeline::new(),
            params,
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            bindings: HashMap::new(),
            collider_owners: HashMap::new(),
            retired_owners: HashMap::new(),
            events: EventCollector::default(),
        }
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    pub fn timestep(&self) -> f32 {
        self.params.dt
    }

    pub(crate) fn set_timestep(&mut self, dt: f32) {
        self.params.dt = dt;
    }

    /// Engine bodies alive right now.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Whether `entity` currently has an engine body.
    pub fn is_bound(&self, entity: Entity) -> bool {
        self.bindings.contains_key(&entity)
    }

    pub fn bound_entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.bindings.keys().copied()
    }

    /// The entity owning `handle`, including colliders released this tick.
    pub(crate) fn collider_owner(&self, handle: ColliderHandle) -> Option<Entity> {
        self.collider_owners
            .get(&handle)
            .copied()
            .or_else(|| self.retired_owners.get(&handle).map(|&(entity, _)| entity))
    }

    /// The opt-in a released collider's entity had when it was released.
    pub(crate) fn retired_reports_touches(&self, handle: ColliderHandle) -> Option<bool> {
        self.retired_owners.get(&handle).map(|&(_, reports)| reports)
    }

    pub(crate) fn forget_retired(&mut self) {
        self.retired_owners.clear();
    }

    pub(crate) fn set_reports_touches(&mut self, entity: Entity, reports: bool) {
        if let Some(binding) = self.bindings.get_mut(&entity) {
            binding.reports_touches = reports;
        }
    }

    pub(crate) fn body_mut(&mut self, entity: Entity) -> Option<&mut RigidBody> {
        let handle = self.bindings.get(&entity)?.body;
        self.bodies.get_mut(handle)
    }

    pub(crate) fn has_body_type(&self, entity: Entity, body_type: BodyType) -> bool {
        self.bindings
            .get(&entity)
            .is_some_and(|b| b.body_type() == body_type)
    }

    /// Create the engine body and collider for `entity`.
    pub(crate) fn bind(&mut self, entity: Entity, body: &Body, collider: &Collider) {
        if self.is_bound(entity) {
            self.release(entity);
        }
        let rb = RigidBodyBuilder::new(body_type_to_rapier(body.body_type))
            .translation(body.position)
            .rotation(quat_to_scaled_axis(body.rotation))
            .linvel(body.linear_velocity)
            .angvel(body.angular_velocity)
            .gravity_scale(body.gravity_scale)
            .linear_damping(body.linear_damping)
            .angular_damping(body.angular_damping)
            .locked_axes(locked_axes(body.lock_rotations))
            .ccd_enabled(body.ccd)
            .build();
        let body_handle = self.bodies.insert(rb);
        let collider_handle = self.colliders.insert_with_parent(
            build_collider(collider, body.mass),
            body_handle,
            &mut self.bodies,
        );
        if let Some(rb) = self.bodies.get_mut(body_handle) {
            rb.recompute_mass_properties_from_colliders(&self.colliders);
        }
        self.collider_owners.insert(collider_handle, entity);
        self.bindings.insert(
            entity,
            Binding {
                body: body_handle,
                collider: collider_handle,
                props: BodyProps::from(body),
                mass: body.mass,
                collider_desc: *collider,
                position: body.position,
                rotation: body.rotation,
                linvel: body.linear_velocity,
                angvel: body.angular_velocity,
                reports_touches: false,
            },
        );
        log::debug!("bound entity {entity} as {:?} body", body.body_type);
    }

    /// Remove `entity`'s body and collider from the engine.
    pub(crate) fn release(&mut self, entity: Entity) -> bool {
        let Some(binding) = self.bindings.remove(&entity) else {
            return false;
        };
        self.collider_owners.remove(&binding.collider);
        self.retired_owners
            .insert(binding.collider, (entity, binding.reports_touches));
        self.bodies.remove(
            binding.body,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        log::debug!("released entity {entity}");
        true
    }

    /// Push changed body settings to the engine.
    pub(crate) fn update_body_props(&mut self, entity: Entity, props: BodyProps) {
        let Some(binding) = self.bindings.get_mut(&entity) else {
            return;
        };
        if binding.props == props {
            return;
        }
        binding.props = props;
        let Some(rb) = self.bodies.get_mut(binding.body) else {
            return;
        };
        rb.set_body_type(body_type_to_rapier(props.body_type), true);
        rb.set_linear_damping(props.linear_damping);
        rb.set_angular_damping(props.angular_damping);
        rb.set_gravity_scale(props.gravity_scale, true);
        rb.set_locked_axes(locked_axes(props.lock_rotations), true);
        rb.enable_ccd(props.ccd);
        log::debug!("updated body settings for entity {entity}");
    }

    /// Rebuild `entity`'s collider if its description or the body mass changed.
    pub(crate) fn update_collider(&mut self, entity: Entity, collider: &Collider, mass: f32) {
        let Some(binding) = self.bindings.get_mut(&entity) else {
            return;
        };
        if binding.collider_desc == *collider && binding.mass == mass {
            return;
        }
        self.colliders
            .remove(binding.collider, &mut self.islands, &mut self.bodies, true);
        self.collider_owners.remove(&binding.collider);

        let handle = self.colliders.insert_with_parent(
            build_collider(collider, mass),
            binding.body,
            &mut self.bodies,
        );
        if let Some(rb) = self.bodies.get_mut(binding.body) {
            rb.recompute_mass_properties_from_colliders(&self.colliders);
        }
        binding.collider = handle;
        binding.collider_desc = *collider;
        binding.mass = mass;
        self.collider_owners.insert(handle, entity);
        log::debug!("rebuilt collider for entity {entity}");
    }

    /// Advance the engine by one fixed timestep.
    pub(crate) fn step(&mut self) {
        self.pipeline.step(
            self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &self.events,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::World;

    fn entity() -> Entity {
        World::new().spawn_empty()
    }

    #[test]
    fn bind_and_release_track_counts() {
        let mut ctx = PhysicsContext::new(Vec3::ZERO, 1.0 / 60.0);
        let e = entity();
        ctx.bind(e, &Body::dynamic(), &Collider::sphere(0.5));
        assert!(ctx.is_bound(e));
        assert_eq!(ctx.body_count(), 1);
        assert_eq!(ctx.collider_count(), 1);

        assert!(ctx.release(e));
        assert!(!ctx.release(e));
        assert_eq!(ctx.body_count(), 0);
        assert_eq!(ctx.collider_count(), 0);
    }

    #[test]
    fn explicit_mass_overrides_density() {
        let mut ctx = PhysicsContext::new(Vec3::ZERO, 1.0 / 60.0);
        let e = entity();
        ctx.bind(e, &Body::dynamic().with_mass(3.0), &Collider::cuboid(1.0, 1.0, 1.0));
        ctx.step();
        let body = ctx.body_mut(e).unwrap();
        assert!((body.mass() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn collider_rebuild_keeps_owner_mapping() {
        let mut ctx = PhysicsContext::new(Vec3::ZERO, 1.0 / 60.0);
        let e = entity();
        ctx.bind(e, &Body::dynamic(), &Collider::sphere(0.5));
        let old = ctx.bindings[&e].collider;

        ctx.update_collider(e, &Collider::sphere(1.0), 1.0);
        let new = ctx.bindings[&e].collider;
        assert_ne!(old, new);
        assert_eq!(ctx.collider_owner(new), Some(e));
        assert_eq!(ctx.collider_owner(old), None);
        assert_eq!(ctx.collider_count(), 1);
    }

    #[test]
    fn rotation_locks_map_to_engine_flags() {
        let axes = locked_axes(BVec3::new(true, false, true));
        assert!(axes.contains(LockedAxes::ROTATION_LOCKED_X));
        assert!(!axes.contains(LockedAxes::ROTATION_LOCKED_Y));
        assert!(axes.contains(LockedAxes::ROTATION_LOCKED_Z));
    }
}
