//! Math types and glam re-exports.
//!
//! [glam](https://docs.rs/glam) types are re-exported so users don't need to
//! depend on it directly. [`Transform`] is the local pose every scene entity
//! carries.

pub use glam::{BVec3, EulerRot, Mat4, Quat, Vec3};

use serde::{Deserialize, Serialize};

/// Rotation order used for every Euler mirror: intrinsic X, then Y, then Z.
pub const EULER_ORDER: EulerRot = EulerRot::XYZ;

/// Quaternion from Euler angles in degrees.
pub fn quat_from_euler_degrees(degrees: Vec3) -> Quat {
    Quat::from_euler(
        EULER_ORDER,
        degrees.x.to_radians(),
        degrees.y.to_radians(),
        degrees.z.to_radians(),
    )
}

/// Euler angles in degrees from a quaternion.
pub fn euler_degrees_from_quat(rotation: Quat) -> Vec3 {
    let (x, y, z) = rotation.normalize().to_euler(EULER_ORDER);
    Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
}

/// Local pose: position, rotation, and scale relative to the parent (or the
/// world, for roots).
///
/// The rotation is stored twice: as a quaternion and as Euler angles in
/// degrees for tooling. Either may be edited. The next resolver pass takes the
/// one that changed and rebuilds the other; if both changed, Euler wins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    /// Degrees, [`EULER_ORDER`].
    pub euler: Vec3,
    pub scale: Vec3,
    #[serde(skip)]
    synced_euler: Vec3,
    #[serde(skip)]
    synced_rotation: Quat,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        euler: Vec3::ZERO,
        scale: Vec3::ONE,
        synced_euler: Vec3::ZERO,
        synced_rotation: Quat::IDENTITY,
    };

    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self::from_position(Vec3::new(x, y, z))
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_uniform_scale(self, scale: f32) -> Self {
        self.with_scale(Vec3::splat(scale))
    }

    /// Set the quaternion and its Euler mirror together.
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.set_rotation(rotation);
        self
    }

    /// Set the rotation from Euler angles in degrees.
    pub fn with_euler_degrees(mut self, degrees: Vec3) -> Self {
        self.set_rotation(quat_from_euler_degrees(degrees));
        self.euler = degrees;
        self.synced_euler = degrees;
        self
    }

    /// Overwrite the rotation and its mirror in one go, so the resolver sees
    /// nothing to reconcile.
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.euler = euler_degrees_from_quat(rotation);
        self.synced_rotation = self.rotation;
        self.synced_euler = self.euler;
    }

    /// Reconcile the quaternion and Euler fields after outside edits.
    ///
    /// Returns `true` if either representation was rebuilt.
    pub fn sync_rotation(&mut self) -> bool {
        let rebuilt = if self.euler != self.synced_euler {
            self.rotation = quat_from_euler_degrees(self.euler);
            true
        } else if self.rotation != self.synced_rotation {
            self.rotation = self.rotation.normalize();
            self.euler = euler_degrees_from_quat(self.rotation);
            true
        } else {
            false
        };
        self.synced_euler = self.euler;
        self.synced_rotation = self.rotation;
        rebuilt
    }

    /// 4x4 model matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
