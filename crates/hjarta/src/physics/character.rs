//! Kinematic character movement.
//!
//! Characters are position-based kinematic bodies with a
//! [`CharacterController`] and a [`CharacterMovement`]. Each tick the desired
//! displacement is swept through the scene with Rapier's
//! `KinematicCharacterController`, which slides along walls, refuses slopes
//! steeper than `max_slope`, climbs small steps and sticks to the ground. The
//! corrected displacement becomes the body's next kinematic target.

use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::prelude::*;

use super::components::{BodyType, CharacterController, CharacterMovement};
use super::context::PhysicsContext;
use crate::ecs::{Entity, World};
use crate::math::Vec3;

fn kcc_from(settings: &CharacterController) -> KinematicCharacterController {
    let autostep = settings.auto_step.then(|| CharacterAutostep {
        max_height: CharacterLength::Absolute(settings.max_step_height),
        min_width: CharacterLength::Absolute(settings.min_step_width),
        include_dynamic_bodies: false,
    });
    let snap_to_ground =
        (settings.snap_distance > 0.0).then(|| CharacterLength::Absolute(settings.snap_distance));
    KinematicCharacterController {
        up: settings.up.normalize_or(Vec3::Y),
        offset: CharacterLength::Absolute(settings.offset),
        max_slope_climb_angle: settings.max_slope.to_radians(),
        min_slope_slide_angle: settings.max_slide.to_radians(),
        snap_to_ground,
        autostep,
        ..KinematicCharacterController::default()
    }
}

struct Solved {
    entity: Entity,
    translation: Vec3,
    grounded: bool,
}

/// Sweep every character's desired movement and queue the corrected
/// displacement as its next kinematic target.
pub(crate) fn move_characters(ctx: &mut PhysicsContext, world: &mut World, dt: f32) {
    let mut requests = Vec::new();
    world.query::<(&CharacterController, &CharacterMovement)>(|entity, (settings, movement)| {
        requests.push((entity, *settings, movement.desired_translation(dt)));
    });
    if requests.is_empty() {
        return;
    }

    let mut solved = Vec::with_capacity(requests.len());
    for (entity, settings, desired) in requests {
        let Some(binding) = ctx.bindings.get(&entity) else {
            continue;
        };
        if binding.body_type() != BodyType::KinematicPositionBased {
            log::debug!("character {entity} skipped: body is not position-based kinematic");
            continue;
        }
        let Some(collider) = ctx.colliders.get(binding.collider) else {
            continue;
        };

        let filter = QueryFilter::default()
            .exclude_rigid_body(binding.body)
            .exclude_sensors()
            .groups(collider.collision_groups());
        let query_pipeline = ctx.broad_phase.as_query_pipeline(
            ctx.narrow_phase.query_dispatcher(),
            &ctx.bodies,
            &ctx.colliders,
            filter,
        );
        let correction = kcc_from(&settings).move_shape(
            dt,
            &query_pipeline,
            collider.shape(),
            collider.position(),
            desired,
            |_| {},
        );
        let t = correction.translation;
        solved.push(Solved {
            entity,
            translation: Vec3::new(t.x, t.y, t.z),
            grounded: correction.grounded,
        });
    }

    for solve in solved {
        if let Some(body) = ctx.body_mut(solve.entity) {
            let current = body.translation();
            let current = Vec3::new(current.x, current.y, current.z);
            body.set_next_kinematic_translation(current + solve.translation);
        }
        if let Some(settings) = world.get_mut::<CharacterController>(solve.entity) {
            settings.grounded = solve.grounded;
            settings.resolved_move = solve.translation;
        }
        if let Some(movement) = world.get_mut::<CharacterMovement>(solve.entity) {
            movement.actual_move = solve.translation;
        }
    }
}
