//! Physics-facing components.

use serde::{Deserialize, Serialize};

use crate::math::{BVec3, Quat, Vec3};

/// How a body moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BodyType {
    /// Never moves on its own and is never written back from the engine.
    Fixed,
    #[default]
    Dynamic,
    /// Moved by next-pose targets ([`KinematicMove`](super::KinematicMove)).
    KinematicPositionBased,
    /// Moved by its linear and angular velocity.
    KinematicVelocityBased,
}

/// A rigid body.
///
/// The pose here is the authoritative physics pose: the bridge writes it
/// after every step (except for [`BodyType::Fixed`]) and mirrors it into a
/// root entity's `Transform`. Writing a new pose from outside teleports the
/// body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Body {
    pub body_type: BodyType,
    pub position: Vec3,
    pub rotation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Mass in kilograms. Zero or less lets the collider density decide.
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub gravity_scale: f32,
    /// Per-axis rotation locks.
    pub lock_rotations: BVec3,
    pub ccd: bool,
}

impl Body {
    /// A dynamic body affected by gravity and forces.
    pub fn dynamic() -> Self {
        Self {
            body_type: BodyType::Dynamic,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            gravity_scale: 1.0,
            lock_rotations: BVec3::FALSE,
            ccd: false,
        }
    }

    pub fn fixed() -> Self {
        Self {
            body_type: BodyType::Fixed,
            ..Self::dynamic()
        }
    }

    pub fn kinematic_position() -> Self {
        Self {
            body_type: BodyType::KinematicPositionBased,
            ..Self::dynamic()
        }
    }

    pub fn kinematic_velocity() -> Self {
        Self {
            body_type: BodyType::KinematicVelocityBased,
            ..Self::dynamic()
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_linear_velocity(mut self, v: Vec3) -> Self {
        self.linear_velocity = v;
        self
    }

    pub fn with_angular_velocity(mut self, v: Vec3) -> Self {
        self.angular_velocity = v;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_gravity_scale(mut self, s: f32) -> Self {
        self.gravity_scale = s;
        self
    }

    pub fn with_linear_damping(mut self, d: f32) -> Self {
        self.linear_damping = d;
        self
    }

    pub fn with_angular_damping(mut self, d: f32) -> Self {
        self.angular_damping = d;
        self
    }

    pub fn with_locked_rotations(mut self, locks: BVec3) -> Self {
        self.lock_rotations = locks;
        self
    }

    pub fn with_ccd(mut self, enabled: bool) -> Self {
        self.ccd = enabled;
        self
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::dynamic()
    }
}

/// Collision geometry. All extents are halves, matching the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ColliderShape {
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
    /// Along the local Y axis.
    Capsule { half_height: f32, radius: f32 },
    Cylinder { half_height: f32, radius: f32 },
    Cone { half_height: f32, radius: f32 },
}

impl Default for ColliderShape {
    fn default() -> Self {
        Self::Box {
            half_extents: Vec3::splat(0.5),
        }
    }
}

/// Collision shape and surface properties, attached to the same entity as a
/// [`Body`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Collider {
    pub shape: ColliderShape,
    /// Offset of the shape from the body origin.
    pub offset_position: Vec3,
    pub offset_rotation: Quat,
    pub friction: f32,
    pub restitution: f32,
    /// Only used when [`Body::mass`] is not positive.
    pub density: f32,
    /// Sensors report touches but generate no contact response.
    pub sensor: bool,
    /// Collision groups this collider belongs to (bitmask).
    pub memberships: u32,
    /// Collision groups this collider interacts with (bitmask).
    pub filter: u32,
}

impl Collider {
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            offset_position: Vec3::ZERO,
            offset_rotation: Quat::IDENTITY,
            friction: 0.5,
            restitution: 0.0,
            density: 1.0,
            sensor: false,
            memberships: u32::MAX,
            filter: u32::MAX,
        }
    }

    /// A box collider (half-extents).
    pub fn cuboid(hx: f32, hy: f32, hz: f32) -> Self {
        Self::new(ColliderShape::Box {
            half_extents: Vec3::new(hx, hy, hz),
        })
    }

    pub fn sphere(radius: f32) -> Self {
        Self::new(ColliderShape::Sphere { radius })
    }

    /// A vertical capsule.
    pub fn capsule(half_height: f32, radius: f32) -> Self {
        Self::new(ColliderShape::Capsule {
            half_height,
            radius,
        })
    }

    pub fn cylinder(half_height: f32, radius: f32) -> Self {
        Self::new(ColliderShape::Cylinder {
            half_height,
            radius,
        })
    }

    pub fn cone(half_height: f32, radius: f32) -> Self {
        Self::new(ColliderShape::Cone {
            half_height,
            radius,
        })
    }

    pub fn with_offset(mut self, position: Vec3, rotation: Quat) -> Self {
        self.offset_position = position;
        self.offset_rotation = rotation;
        self
    }

    pub fn with_friction(mut self, f: f32) -> Self {
        self.friction = f;
        self
    }

    pub fn with_restitution(mut self, r: f32) -> Self {
        self.restitution = r;
        self
    }

    pub fn with_density(mut self, d: f32) -> Self {
        self.density = d;
        self
    }

    pub fn with_sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }

    pub fn with_groups(mut self, memberships: u32, filter: u32) -> Self {
        self.memberships = memberships;
        self.filter = filter;
        self
    }
}

impl Default for Collider {
    fn default() -> Self {
        Self::new(ColliderShape::default())
    }
}

/// Scene-wide physics settings. The first entity carrying one wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsWorld {
    pub gravity: Vec3,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
        }
    }
}

/// Opt-in for touch reporting. An entity whose collider should show up in
/// [`TouchEvents`](super::TouchEvents) carries this with `enabled = true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionEvents {
    pub enabled: bool,
}

impl Default for CollisionEvents {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Kinematic character settings plus the last solve's outputs.
///
/// Angles are in degrees, distances in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterController {
    /// Skin gap kept between the character and obstacles.
    pub offset: f32,
    /// Steepest slope the character can walk up.
    pub max_slope: f32,
    /// Slopes steeper than this make the character slide down.
    pub max_slide: f32,
    /// Distance to stick to the ground when walking off small ledges. Zero
    /// disables snapping.
    pub snap_distance: f32,
    pub auto_step: bool,
    pub max_step_height: f32,
    pub min_step_width: f32,
    pub up: Vec3,
    /// Output: touching walkable ground after the last solve.
    pub grounded: bool,
    /// Output: the movement actually applied in the last solve.
    pub resolved_move: Vec3,
}

impl Default for CharacterController {
    fn default() -> Self {
        Self {
            offset: 0.01,
            max_slope: 45.0,
            max_slide: 30.0,
            snap_distance: 0.2,
            auto_step: false,
            max_step_height: 0.3,
            min_step_width: 0.2,
            up: Vec3::Y,
            grounded: false,
            resolved_move: Vec3::ZERO,
        }
    }
}

/// What a character wants to do this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterMovement {
    /// Units per second.
    pub desired_velocity: Vec3,
    /// Vertical speed added on top of `desired_velocity.y` (gravity, jumps).
    pub velocity_y: f32,
    /// Output: displacement applied in the last solve.
    pub actual_move: Vec3,
}

impl CharacterMovement {
    /// Displacement requested over `dt` seconds.
    pub fn desired_translation(&self, dt: f32) -> Vec3 {
        (self.desired_velocity + Vec3::new(0.0, self.velocity_y, 0.0)) * dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_keep_dynamic_defaults() {
        let body = Body::fixed().with_position(Vec3::Y);
        assert_eq!(body.body_type, BodyType::Fixed);
        assert_eq!(body.mass, 1.0);
        assert_eq!(body.gravity_scale, 1.0);
        assert_eq!(body.position, Vec3::Y);
    }

    #[test]
    fn collider_deserializes_tagged_shape() {
        let collider: Collider = serde_json::from_str(
            r#"{ "shape": { "type": "Sphere", "radius": 2.0 }, "sensor": true }"#,
        )
        .unwrap();
        assert_eq!(collider.shape, ColliderShape::Sphere { radius: 2.0 });
        assert!(collider.sensor);
        assert_eq!(collider.friction, 0.5);
    }

    #[test]
    fn desired_translation_adds_vertical_speed() {
        let movement = CharacterMovement {
            desired_velocity: Vec3::new(2.0, 0.0, 0.0),
            velocity_y: -4.0,
            ..Default::default()
        };
        assert_eq!(movement.desired_translation(0.5), Vec3::new(1.0, -2.0, 0.0));
    }
}
