//! The fixed-tick physics system.
//!
//! [`physics_step`] runs once per fixed tick and keeps the ECS and the engine
//! in agreement, in this order:
//!
//! 1. Release bodies whose entity died or lost its `Body`/`Collider`.
//! 2. Bind new `Body` + `Collider` entities.
//! 3. Apply the scene's [`PhysicsWorld`] gravity.
//! 4. Push external edits: body settings, collider changes, teleports and
//!    velocity overrides.
//! 5. Apply command components.
//! 6. Solve character controllers.
//! 7. Step the engine.
//! 8. Read poses and velocities back (never for fixed bodies).
//! 9. Publish touch events.
//! 10. Capture interpolation poses.

use rapier3d::prelude::Pose;

use super::character::move_characters;
use super::commands::apply_commands;
use super::components::{Body, BodyType, Collider, PhysicsWorld};
use super::context::{BodyProps, PhysicsContext, pose_of, velocities_of};
use super::events::{TouchEvents, publish_touch_events, reports_touches};
use crate::ecs::{Entity, Parent, World};
use crate::error::SystemResult;
use crate::interpolation::{InterpolatedTransform, Interpolation};
use crate::math::{Quat, Transform, Vec3};
use crate::time::Time;

const POSE_EPSILON: f32 = 1e-6;

/// Advance physics by one fixed tick.
///
/// Uses the extract/reinsert pattern to borrow the physics context and the
/// ECS world simultaneously. Without a [`PhysicsContext`] resource this logs
/// a warning and does nothing.
pub fn physics_step(world: &mut World) -> SystemResult {
    let Some(mut ctx) = world.resource_remove::<PhysicsContext>() else {
        log::warn!("physics step skipped: no PhysicsContext resource");
        return Ok(());
    };
    let result = run_tick(&mut ctx, world);
    world.insert_resource(ctx);
    result
}

fn run_tick(ctx: &mut PhysicsContext, world: &mut World) -> SystemResult {
    let dt = world
        .get_resource::<Time>()
        .map_or(ctx.timestep(), Time::fixed_timestep);
    ctx.set_timestep(dt);

    match world.get_resource_mut::<TouchEvents>() {
        Some(events) => events.clear(),
        None => world.insert_resource(TouchEvents::default()),
    }

    release_stale(ctx, world);
    bind_new(ctx, world)?;
    sync_gravity(ctx, world);
    push_external_changes(ctx, world)?;
    apply_commands(ctx, world);
    move_characters(ctx, world, dt);

    ctx.step();

    let moved = read_back(ctx, world, dt);
    publish_touch_events(ctx, world);
    capture_poses(ctx, world, &moved);
    Ok(())
}

/// The root `Transform` of `entity`, Euler edits folded in. Children are
/// skipped: their `Transform` is parent-relative.
fn root_transform(world: &World, entity: Entity) -> Option<Transform> {
    if world.has::<Parent>(entity) {
        return None;
    }
    let mut transform = *world.get::<Transform>(entity)?;
    transform.sync_rotation();
    Some(transform)
}

fn mirror_to_transform(world: &mut World, entity: Entity, position: Vec3, rotation: Quat) {
    if world.has::<Parent>(entity) {
        return;
    }
    if let Some(transform) = world.get_mut::<Transform>(entity) {
        transform.position = position;
        transform.rotation = rotation;
    }
}

fn release_stale(ctx: &mut PhysicsContext, world: &World) {
    let stale: Vec<Entity> = ctx
        .bound_entities()
        .filter(|&e| !world.is_alive(e) || !world.has::<Body>(e) || !world.has::<Collider>(e))
        .collect();
    for entity in stale {
        ctx.release(entity);
    }
}

fn bind_new(ctx: &mut PhysicsContext, world: &mut World) -> SystemResult {
    let mut pending = Vec::new();
    world.query::<(&Body, &Collider)>(|entity, (body, collider)| {
        if !ctx.is_bound(entity) {
            pending.push((entity, *body, *collider));
        }
    });
    // Archetype order varies between runs; engine handles must not.
    pending.sort_by_key(|&(entity, _, _)| entity);

    for (entity, mut body, collider) in pending {
        // A body left at the origin starts wherever its Transform puts it.
        let unplaced = body.position == Vec3::ZERO && body.rotation == Quat::IDENTITY;
        if unplaced && let Some(transform) = root_transform(world, entity) {
            body.position = transform.position;
            body.rotation = transform.rotation;
        }
        ctx.bind(entity, &body, &collider);
        *world.component_mut::<Body>(entity)? = body;
        mirror_to_transform(world, entity, body.position, body.rotation);
    }
    Ok(())
}

fn sync_gravity(ctx: &mut PhysicsContext, world: &mut World) {
    let mut gravity = None;
    world.query::<(&PhysicsWorld,)>(|_, (settings,)| {
        gravity.get_or_insert(settings.gravity);
    });
    if let Some(gravity) = gravity
        && gravity != ctx.gravity()
    {
        log::debug!("gravity set to {gravity}");
        ctx.set_gravity(gravity);
    }
}

/// Detect writes made outside the bridge since the last tick and push them.
///
/// A `Body` pose edit wins over a `Transform` edit when both happened.
fn push_external_changes(ctx: &mut PhysicsContext, world: &mut World) -> SystemResult {
    let entities: Vec<Entity> = ctx.bound_entities().collect();
    for entity in entities {
        let Some(mut body) = world.get::<Body>(entity).copied() else {
            continue;
        };
        ctx.update_body_props(entity, BodyProps::from(&body));
        ctx.set_reports_touches(entity, reports_touches(world, entity));
        if let Some(collider) = world.get::<Collider>(entity).copied() {
            ctx.update_collider(entity, &collider, body.mass);
        }

        let Some(binding) = ctx.bindings.get(&entity) else {
            continue;
        };
        let (known_position, known_rotation) = (binding.position, binding.rotation);
        let (known_linvel, known_angvel) = (binding.linvel, binding.angvel);

        let teleport = if body.position != known_position || body.rotation != known_rotation {
            Some((body.position, body.rotation))
        } else {
            root_transform(world, entity).and_then(|t| {
                let moved = !t.position.abs_diff_eq(known_position, POSE_EPSILON)
                    || !t.rotation.abs_diff_eq(known_rotation, POSE_EPSILON);
                moved.then_some((t.position, t.rotation))
            })
        };

        if let Some((position, rotation)) = teleport {
            let kinematic = ctx.has_body_type(entity, BodyType::KinematicPositionBased);
            if let Some(rb) = ctx.body_mut(entity) {
                let pose = Pose::from_parts(position, rotation);
                if kinematic {
                    rb.set_next_kinematic_position(pose);
                } else {
                    rb.set_position(pose, true);
                }
            }
            if let Some(binding) = ctx.bindings.get_mut(&entity) {
                binding.record_pose(position, rotation);
            }
            body.position = position;
            body.rotation = rotation;
            *world.component_mut::<Body>(entity)? = body;
            mirror_to_transform(world, entity, position, rotation);
            log::debug!("entity {entity} moved externally to {position}");
        }

        if body.body_type == BodyType::Fixed {
            continue;
        }
        let linvel_changed = body.linear_velocity != known_linvel;
        let angvel_changed = body.angular_velocity != known_angvel;
        if let Some(rb) = ctx.body_mut(entity) {
            if linvel_changed {
                rb.set_linvel(body.linear_velocity, true);
            }
            if angvel_changed {
                rb.set_angvel(body.angular_velocity, true);
            }
        }
        if let Some(binding) = ctx.bindings.get_mut(&entity) {
            binding.linvel = body.linear_velocity;
            binding.angvel = body.angular_velocity;
        }
    }
    Ok(())
}

/// A body pose read back after the step.
struct Moved {
    entity: Entity,
    position: Vec3,
    rotation: Quat,
    /// How far the body could have travelled on its own this tick.
    expected_travel: f32,
}

fn read_back(ctx: &mut PhysicsContext, world: &mut World, dt: f32) -> Vec<Moved> {
    let mut moved = Vec::with_capacity(ctx.bindings.len());
    let mut updates = Vec::with_capacity(ctx.bindings.len());
    for (&entity, binding) in ctx.bindings.iter_mut() {
        if binding.body_type() == BodyType::Fixed {
            continue;
        }
        let Some(rb) = ctx.bodies.get(binding.body) else {
            continue;
        };
        let (position, rotation) = pose_of(rb);
        let (linvel, angvel) = velocities_of(rb);
        let speed = binding.linvel.length().max(linvel.length());

        binding.record_pose(position, rotation);
        binding.linvel = linvel;
        binding.angvel = angvel;
        updates.push((entity, position, rotation, linvel, angvel));
        moved.push(Moved {
            entity,
            position,
            rotation,
            expected_travel: speed * dt,
        });
    }

    for (entity, position, rotation, linvel, angvel) in updates {
        if let Some(body) = world.get_mut::<Body>(entity) {
            body.position = position;
            body.rotation = rotation;
            body.linear_velocity = linvel;
            body.angular_velocity = angvel;
        }
        mirror_to_transform(world, entity, position, rotation);
    }
    moved
}

fn capture_poses(ctx: &PhysicsContext, world: &mut World, moved: &[Moved]) {
    let threshold = world
        .get_resource::<Interpolation>()
        .copied()
        .unwrap_or_default()
        .teleport_threshold;

    for m in moved {
        if let Some(interp) = world.get_mut::<InterpolatedTransform>(m.entity)
            && interp.capture(m.position, m.rotation, m.expected_travel, threshold)
        {
            log::debug!("entity {} teleported, interpolation snapped", m.entity);
        }
    }

    let mut fixed = Vec::new();
    world.query::<(&Body, &InterpolatedTransform)>(|entity, (body, _)| {
        if body.body_type == BodyType::Fixed && ctx.is_bound(entity) {
            fixed.push((entity, body.position, body.rotation));
        }
    });
    for (entity, position, rotation) in fixed {
        if let Some(interp) = world.get_mut::<InterpolatedTransform>(entity) {
            interp.hold(position, rotation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::components::CollisionEvents;

    fn world_with_physics() -> World {
        let mut world = World::new();
        world.insert_resource(Time::new(1.0 / 60.0));
        world.insert_resource(PhysicsContext::new(Vec3::new(0.0, -9.81, 0.0), 1.0 / 60.0));
        world
    }

    fn tick(world: &mut World) {
        physics_step(world).unwrap();
    }

    #[test]
    fn missing_context_is_not_an_error() {
        let mut world = World::new();
        world.spawn((Body::dynamic(), Collider::default()));
        assert!(physics_step(&mut world).is_ok());
    }

    #[test]
    fn unplaced_body_starts_at_its_transform() {
        let mut world = world_with_physics();
        let e = world.spawn((
            Transform::from_xyz(0.0, 10.0, 0.0),
            Body::dynamic(),
            Collider::sphere(0.5),
        ));
        tick(&mut world);
        let body = world.get::<Body>(e).unwrap();
        assert!(body.position.y < 10.0 && body.position.y > 9.9);
        assert_eq!(world.get::<Transform>(e).unwrap().position, body.position);
    }

    #[test]
    fn despawned_entity_releases_its_body() {
        let mut world = world_with_physics();
        let e = world.spawn((Body::dynamic(), Collider::default()));
        tick(&mut world);
        assert_eq!(world.resource::<PhysicsContext>().body_count(), 1);

        world.despawn(e);
        tick(&mut world);
        let ctx = world.resource::<PhysicsContext>();
        assert_eq!(ctx.body_count(), 0);
        assert!(!ctx.is_bound(e));
    }

    #[test]
    fn removing_the_collider_releases_the_body() {
        let mut world = world_with_physics();
        let e = world.spawn((Body::dynamic(), Collider::default()));
        tick(&mut world);
        world.remove::<Collider>(e);
        tick(&mut world);
        assert!(!world.resource::<PhysicsContext>().is_bound(e));
    }

    #[test]
    fn fixed_body_is_never_written_back() {
        let mut world = world_with_physics();
        let ground = world.spawn((
            Body::fixed().with_position(Vec3::new(0.0, -1.0, 0.0)),
            Collider::cuboid(10.0, 1.0, 10.0),
        ));
        let ball = world.spawn((
            Body::dynamic().with_position(Vec3::new(0.0, 0.6, 0.0)),
            Collider::sphere(0.5),
        ));
        for _ in 0..60 {
            tick(&mut world);
        }
        assert_eq!(world.get::<Body>(ground).unwrap().position, Vec3::new(0.0, -1.0, 0.0));
        assert!(world.get::<Body>(ball).unwrap().position.y > 0.0);
    }

    #[test]
    fn body_pose_edit_teleports_and_snaps_interpolation() {
        let mut world = world_with_physics();
        let e = world.spawn((
            Body::dynamic().with_gravity_scale(0.0),
            Collider::sphere(0.5),
            InterpolatedTransform::default(),
        ));
        tick(&mut world);
        tick(&mut world);

        world.get_mut::<Body>(e).unwrap().position = Vec3::new(100.0, 0.0, 0.0);
        tick(&mut world);

        let interp = world.get::<InterpolatedTransform>(e).unwrap();
        assert!((interp.position.x - 100.0).abs() < 1e-3);
        assert_eq!(interp.prev_position, interp.position);
    }

    #[test]
    fn transform_edit_teleports_root_body() {
        let mut world = world_with_physics();
        let e = world.spawn((
            Transform::IDENTITY,
            Body::dynamic().with_gravity_scale(0.0),
            Collider::sphere(0.5),
        ));
        tick(&mut world);
        world.get_mut::<Transform>(e).unwrap().position = Vec3::new(0.0, 0.0, 42.0);
        tick(&mut world);
        assert!((world.get::<Body>(e).unwrap().position.z - 42.0).abs() < 1e-3);
    }

    #[test]
    fn gravity_follows_the_physics_world_entity() {
        let mut world = world_with_physics();
        world.spawn((PhysicsWorld { gravity: Vec3::ZERO },));
        let e = world.spawn((Body::dynamic(), Collider::sphere(0.5)));
        for _ in 0..10 {
            tick(&mut world);
        }
        assert_eq!(world.resource::<PhysicsContext>().gravity(), Vec3::ZERO);
        assert!(world.get::<Body>(e).unwrap().position.y.abs() < 1e-5);
    }

    #[test]
    fn body_setting_edits_reach_the_engine() {
        let mut world = world_with_physics();
        let e = world.spawn((Body::dynamic(), Collider::sphere(0.5)));
        tick(&mut world);
        world.get_mut::<Body>(e).unwrap().gravity_scale = 0.0;
        world.get_mut::<Body>(e).unwrap().linear_velocity = Vec3::ZERO;
        tick(&mut world);
        let y = world.get::<Body>(e).unwrap().position.y;
        tick(&mut world);
        assert!((world.get::<Body>(e).unwrap().position.y - y).abs() < 1e-5);
    }

    fn sensor_pad_with_ball(world: &mut World, pad_reports: bool) -> (Entity, Entity) {
        world.spawn((PhysicsWorld { gravity: Vec3::ZERO },));
        let pad = world.spawn((
            Body::fixed(),
            Collider::cuboid(2.0, 0.5, 2.0).with_sensor(true),
            CollisionEvents {
                enabled: pad_reports,
            },
        ));
        let ball = world.spawn((
            Body::dynamic(),
            Collider::sphere(0.25),
            CollisionEvents {
                enabled: !pad_reports,
            },
        ));
        (pad, ball)
    }

    fn ticks_until(world: &mut World, mut seen: impl FnMut(&TouchEvents) -> bool) -> bool {
        (0..10).any(|_| {
            tick(world);
            seen(world.resource::<TouchEvents>())
        })
    }

    #[test]
    fn despawn_ends_touches_with_the_survivor() {
        let mut world = world_with_physics();
        let (pad, ball) = sensor_pad_with_ball(&mut world, true);
        assert!(ticks_until(&mut world, |ev| ev.touched.iter().any(|t| t.involves(ball))));

        world.despawn(ball);
        assert!(ticks_until(&mut world, |ev| {
            ev.ended.iter().any(|t| t.involves(ball) && t.other(ball) == Some(pad))
        }));
    }

    #[test]
    fn despawned_entity_that_opted_in_still_gets_its_ended_event() {
        let mut world = world_with_physics();
        let (pad, ball) = sensor_pad_with_ball(&mut world, false);
        assert!(ticks_until(&mut world, |ev| ev.touched.iter().any(|t| t.involves(pad))));

        world.despawn(ball);
        assert!(ticks_until(&mut world, |ev| ev.ended.iter().any(|t| t.involves(pad))));
    }

    #[test]
    fn losing_the_collider_ends_touches() {
        let mut world = world_with_physics();
        let (pad, ball) = sensor_pad_with_ball(&mut world, true);
        assert!(ticks_until(&mut world, |ev| !ev.touched.is_empty()));

        world.remove::<Collider>(ball);
        assert!(ticks_until(&mut world, |ev| ev.ended.iter().any(|t| t.involves(pad))));
        assert!(!world.resource::<PhysicsContext>().is_bound(ball));
    }

    #[test]
    fn bodies_bind_in_entity_order() {
        let mut world = world_with_physics();
        // Different archetypes, so query order need not match spawn order.
        let first = world.spawn((Body::dynamic(), Collider::sphere(0.5), CollisionEvents::default()));
        let second = world.spawn((Body::dynamic(), Collider::sphere(0.5)));
        let third = world.spawn((Body::dynamic(), Collider::sphere(0.5), Transform::IDENTITY));
        tick(&mut world);

        let ctx = world.resource::<PhysicsContext>();
        let index = |e: Entity| ctx.bindings[&e].body.into_raw_parts().0;
        assert!(index(first) < index(second));
        assert!(index(second) < index(third));
    }
}
