//! Math value types
//!
//! Position + rotation of a mesh, and the conversions the packet layer needs
//! to express them in protocol terms.

use glam::{DQuat, DVec3, EulerRot, Vec3};

/// Position and orientation of a mesh in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// World-space position
    pub translation: DVec3,
    /// World-space orientation
    pub rotation: DQuat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// Origin, no rotation
    pub const IDENTITY: Self = Self {
        translation: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
    };

    /// Create a transform from a translation and rotation
    pub fn new(translation: DVec3, rotation: DQuat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Create an unrotated transform at a position
    pub fn from_translation(translation: DVec3) -> Self {
        Self {
            translation,
            rotation: DQuat::IDENTITY,
        }
    }

    /// Replace the translation
    pub fn with_translation(mut self, translation: DVec3) -> Self {
        self.translation = translation;
        self
    }

    /// Replace the rotation
    pub fn with_rotation(mut self, rotation: DQuat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Position of the body entity's feet.
    ///
    /// The item is rendered on the body's head, so the entity is placed
    /// `y_offset` below the transform to put the item at `translation`.
    pub fn body_position(&self, y_offset: f64) -> DVec3 {
        DVec3::new(
            self.translation.x,
            self.translation.y - y_offset,
            self.translation.z,
        )
    }

    /// Head pose of the body entity, in degrees.
    ///
    /// ZYX Euler decomposition of the rotation with the X angle negated, as
    /// the client's head pitch runs opposite to a right-handed X rotation.
    pub fn head_rotation(&self) -> Vec3 {
        let (z, y, x) = self.rotation.to_euler(EulerRot::ZYX);
        Vec3::new(
            (-x).to_degrees() as f32,
            y.to_degrees() as f32,
            z.to_degrees() as f32,
        )
    }
}
