//! # Interpolation — Smooth Poses Between Fixed Ticks
//!
//! The fixed phase moves things in discrete jumps. Entities that carry an
//! [`InterpolatedTransform`] remember the pose from the previous tick and the
//! current one, and the transform resolver draws them at
//!
//! ```text
//! position = lerp(prev, curr, alpha)
//! rotation = slerp(prev, curr, alpha)
//! ```
//!
//! where `alpha` is [`Time::alpha`]. Physics bodies are captured by the
//! physics bridge; [`capture_interpolation`] covers every other entity from
//! its `Transform`.
//!
//! ## Teleports
//!
//! When a pose jumps further than it could have moved on its own (plus
//! [`Interpolation::teleport_threshold`]), `prev` is reset to `curr` so the
//! entity doesn't visibly sweep across the map.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_TELEPORT_THRESHOLD;
use crate::ecs::system::{Phase, Placement};
use crate::ecs::world::World;
use crate::error::SystemResult;
use crate::math::{Quat, Transform, Vec3};
use crate::state::{Plugin, State};

/// Above this cosine the quaternions are close enough that slerp's
/// `1 / sin(theta)` blows up; a normalized linear blend is used instead.
pub const SLERP_DOT_THRESHOLD: f32 = 0.9995;

pub fn lerp(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t
}

/// Spherical interpolation along the shortest arc.
pub fn slerp(a: Quat, b: Quat, t: f32) -> Quat {
    let mut b = b;
    let mut dot = a.dot(b);
    if dot < 0.0 {
        b = -b;
        dot = -dot;
    }

    if dot > SLERP_DOT_THRESHOLD {
        return (a + (b - a) * t).normalize();
    }

    let theta_0 = dot.clamp(-1.0, 1.0).acos();
    let theta = theta_0 * t;
    let sin_theta_0 = theta_0.sin();
    let s0 = theta.cos() - dot * theta.sin() / sin_theta_0;
    let s1 = theta.sin() / sin_theta_0;
    (a * s0 + b * s1).normalize()
}

/// Previous and current fixed-tick pose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolatedTransform {
    pub prev_position: Vec3,
    pub prev_rotation: Quat,
    pub position: Vec3,
    pub rotation: Quat,
    /// False until the first capture, which seeds both poses.
    #[serde(skip)]
    pub(crate) primed: bool,
}

impl InterpolatedTransform {
    /// Both poses at the given pose.
    pub fn at(position: Vec3, rotation: Quat) -> Self {
        Self::between(position, rotation, position, rotation)
    }

    pub fn between(
        prev_position: Vec3,
        prev_rotation: Quat,
        position: Vec3,
        rotation: Quat,
    ) -> Self {
        Self {
            prev_position,
            prev_rotation,
            position,
            rotation,
            primed: true,
        }
    }

    /// Pose at `alpha` through the interval, `alpha` clamped to `[0, 1]`.
    pub fn pose_at(&self, alpha: f32) -> (Vec3, Quat) {
        let alpha = alpha.clamp(0.0, 1.0);
        (
            lerp(self.prev_position, self.position, alpha),
            slerp(self.prev_rotation, self.rotation, alpha),
        )
    }

    /// Shift `curr → prev` and record a new current pose.
    ///
    /// `expected_travel` is how far the entity could have moved this tick on
    /// its own. A larger jump (plus `threshold`) resets `prev` to the new
    /// pose. Returns `true` on a snap.
    pub fn capture(
        &mut self,
        position: Vec3,
        rotation: Quat,
        expected_travel: f32,
        threshold: f32,
    ) -> bool {
        if !self.primed {
            *self = Self::at(position, rotation);
            return false;
        }
        let jump = position.distance(self.position);
        if jump > expected_travel + threshold {
            *self = Self::at(position, rotation);
            return true;
        }
        self.prev_position = self.position;
        self.prev_rotation = self.rotation;
        self.position = position;
        self.rotation = rotation;
        false
    }

    /// Pin both poses, as for a body that never moves on its own.
    pub fn hold(&mut self, position: Vec3, rotation: Quat) {
        *self = Self::at(position, rotation);
    }
}

impl Default for InterpolatedTransform {
    fn default() -> Self {
        Self {
            prev_position: Vec3::ZERO,
            prev_rotation: Quat::IDENTITY,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            primed: false,
        }
    }
}

/// Interpolation tuning, shared with the physics bridge.
#[derive(Debug, Clone, Copy)]
pub struct Interpolation {
    pub teleport_threshold: f32,
}

impl Default for Interpolation {
    fn default() -> Self {
        Self {
            teleport_threshold: DEFAULT_TELEPORT_THRESHOLD,
        }
    }
}

#[cfg(feature = "physics3d")]
fn non_physics_sources(world: &mut World) -> Vec<(crate::ecs::Entity, Vec3, Quat)> {
    let mut sources = Vec::new();
    world.query_without::<(&Transform, &InterpolatedTransform), crate::physics::Body>(
        |entity, (transform, _)| sources.push((entity, transform.position, transform.rotation)),
    );
    sources
}

#[cfg(not(feature = "physics3d"))]
fn non_physics_sources(world: &mut World) -> Vec<(crate::ecs::Entity, Vec3, Quat)> {
    let mut sources = Vec::new();
    world.query::<(&Transform, &InterpolatedTransform)>(|entity, (transform, _)| {
        sources.push((entity, transform.position, transform.rotation))
    });
    sources
}

/// Capture the tick's pose for interpolated entities that aren't physics
/// bodies.
///
/// Without a velocity to go on, the expected travel is taken to be last
/// tick's displacement.
pub fn capture_interpolation(world: &mut World) -> SystemResult {
    let threshold = world
        .get_resource::<Interpolation>()
        .copied()
        .unwrap_or_default()
        .teleport_threshold;

    for (entity, position, rotation) in non_physics_sources(world) {
        let interp = world.component_mut::<InterpolatedTransform>(entity)?;
        let expected = interp.position.distance(interp.prev_position);
        if interp.capture(position, rotation, expected, threshold) {
            log::debug!("entity {entity} teleported, interpolation snapped");
        }
    }
    Ok(())
}

/// Inserts [`Interpolation`] and captures non-physics poses at the end of
/// every fixed tick.
pub struct InterpolationPlugin;

impl Plugin for InterpolationPlugin {
    fn build(&self, state: &mut State) {
        let threshold = state.config().teleport_threshold;
        state.world_mut().insert_resource(Interpolation {
            teleport_threshold: threshold,
        });
        state.add_system_at(Phase::Fixed, Placement::Last, capture_interpolation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unit_quat(x: f32, y: f32, z: f32, w: f32) -> Option<Quat> {
        let q = Quat::from_xyzw(x, y, z, w);
        (q.length() > 1e-3).then(|| q.normalize())
    }

    #[test]
    fn lerp_endpoints_and_midpoint() {
        let prev = Vec3::new(0.0, 2.0, -4.0);
        let curr = Vec3::new(10.0, 4.0, 4.0);
        let interp = InterpolatedTransform::between(prev, Quat::IDENTITY, curr, Quat::IDENTITY);
        assert_eq!(interp.pose_at(0.0).0, prev);
        assert_eq!(interp.pose_at(1.0).0, curr);
        let mid = interp.pose_at(0.5).0;
        assert!((mid - (prev + 0.5 * (curr - prev))).length() < 1e-5);
    }

    #[test]
    fn alpha_is_clamped() {
        let interp =
            InterpolatedTransform::between(Vec3::ZERO, Quat::IDENTITY, Vec3::X, Quat::IDENTITY);
        assert_eq!(interp.pose_at(-1.0).0, Vec3::ZERO);
        assert_eq!(interp.pose_at(3.0).0, Vec3::X);
    }

    #[test]
    fn slerp_takes_shortest_path() {
        let a = Quat::from_rotation_z(10f32.to_radians());
        let b = -Quat::from_rotation_z(30f32.to_radians());
        let mid = slerp(a, b, 0.5);
        let expected = Quat::from_rotation_z(20f32.to_radians());
        assert!(mid.abs_diff_eq(expected, 1e-4) || mid.abs_diff_eq(-expected, 1e-4));
    }

    #[test]
    fn slerp_matches_angle_fraction() {
        let a = Quat::IDENTITY;
        let b = Quat::from_rotation_y(90f32.to_radians());
        let q = slerp(a, b, 0.25);
        assert!(q.abs_diff_eq(Quat::from_rotation_y(22.5f32.to_radians()), 1e-4));
    }

    #[test]
    fn nearly_parallel_quaternions_blend_linearly() {
        let a = Quat::from_rotation_x(0.001);
        let b = Quat::from_rotation_x(0.002);
        let q = slerp(a, b, 0.5);
        assert!((q.length() - 1.0).abs() < 1e-5);
        assert!(q.abs_diff_eq(Quat::from_rotation_x(0.0015), 1e-5));
    }

    #[test]
    fn first_capture_seeds_both_poses() {
        let mut interp = InterpolatedTransform::default();
        assert!(!interp.capture(Vec3::new(100.0, 0.0, 0.0), Quat::IDENTITY, 0.0, 0.5));
        assert_eq!(interp.prev_position, interp.position);
    }

    #[test]
    fn small_moves_shift_and_large_jumps_snap() {
        let mut interp = InterpolatedTransform::at(Vec3::ZERO, Quat::IDENTITY);
        assert!(!interp.capture(Vec3::new(0.1, 0.0, 0.0), Quat::IDENTITY, 0.1, 0.5));
        assert_eq!(interp.prev_position, Vec3::ZERO);

        assert!(interp.capture(Vec3::new(50.0, 0.0, 0.0), Quat::IDENTITY, 0.1, 0.5));
        assert_eq!(interp.prev_position, Vec3::new(50.0, 0.0, 0.0));
        assert_eq!(interp.position, Vec3::new(50.0, 0.0, 0.0));
    }

    #[test]
    fn capture_system_tracks_plain_transforms() {
        let mut world = World::new();
        let e = world.spawn((Transform::from_xyz(1.0, 0.0, 0.0), InterpolatedTransform::default()));
        capture_interpolation(&mut world).unwrap();
        world.get_mut::<Transform>(e).unwrap().position.x = 1.2;
        capture_interpolation(&mut world).unwrap();

        let interp = world.get::<InterpolatedTransform>(e).unwrap();
        assert_eq!(interp.prev_position.x, 1.0);
        assert_eq!(interp.position.x, 1.2);
    }

    proptest! {
        #[test]
        fn slerp_stays_unit_length(
            a in (-1.0f32..1.0, -1.0f32..1.0, -1.0f32..1.0, -1.0f32..1.0),
            b in (-1.0f32..1.0, -1.0f32..1.0, -1.0f32..1.0, -1.0f32..1.0),
            t in 0.0f32..=1.0,
        ) {
            let (Some(a), Some(b)) = (unit_quat(a.0, a.1, a.2, a.3), unit_quat(b.0, b.1, b.2, b.3)) else {
                return Ok(());
            };
            let q = slerp(a, b, t);
            prop_assert!((q.length() - 1.0).abs() < 1e-4);
        }

        #[test]
        fn lerp_stays_between_endpoints(
            p in (-100.0f32..100.0, -100.0f32..100.0, -100.0f32..100.0),
            c in (-100.0f32..100.0, -100.0f32..100.0, -100.0f32..100.0),
            alpha in 0.0f32..=1.0,
        ) {
            let prev = Vec3::new(p.0, p.1, p.2);
            let curr = Vec3::new(c.0, c.1, c.2);
            let out = lerp(prev, curr, alpha);
            prop_assert!(out.distance(prev) <= prev.distance(curr) + 1e-3);
            prop_assert!(out.distance(curr) <= prev.distance(curr) + 1e-3);
        }
    }
}
