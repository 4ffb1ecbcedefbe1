//! Rigid-body poses as reported by the tracking engine.
//!
//! A [`Pose`] is a rotation quaternion plus a translation, expressed in the
//! tracking engine's right-handed world frame. The renderer uses the opposite
//! quaternion handedness; [`RendererPose`] is the same pose expressed in the
//! renderer's convention (see [`convert`]).

mod convert;

pub use convert::{from_renderer_rotation, to_renderer_rotation, RendererPose};

use glam::{Mat4, Quat, Vec3};

/// A rotation + translation in tracking-engine world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Unit rotation quaternion.
    pub rotation: Quat,
    /// Translation in meters.
    pub translation: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    /// The identity pose at the world origin.
    pub const IDENTITY: Pose = Pose {
        rotation: Quat::IDENTITY,
        translation: Vec3::ZERO,
    };

    /// Create a pose from a rotation and translation.
    pub fn new(rotation: Quat, translation: Vec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Create a pure translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            rotation: Quat::IDENTITY,
            translation,
        }
    }

    /// Create a pose from raw engine component arrays.
    ///
    /// Tracking engines hand out the quaternion as `[x, y, z, w]` and the
    /// translation as `[tx, ty, tz]`.
    pub fn from_components(rotation: [f32; 4], translation: [f32; 3]) -> Self {
        Self {
            rotation: Quat::from_array(rotation),
            translation: Vec3::from_array(translation),
        }
    }

    /// Rotation as `[x, y, z, w]`.
    pub fn rotation_components(&self) -> [f32; 4] {
        self.rotation.to_array()
    }

    /// Translation as `[tx, ty, tz]`.
    pub fn translation_components(&self) -> [f32; 3] {
        self.translation.to_array()
    }

    /// Column-major 4×4 transform matrix for this pose.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }

    /// Recover a pose from a rigid transform matrix.
    ///
    /// Any scale in the matrix is discarded.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (_scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            rotation,
            translation,
        }
    }

    /// This pose with the vertical (y) translation component replaced.
    pub fn with_height(self, y: f32) -> Self {
        Self {
            rotation: self.rotation,
            translation: Vec3::new(self.translation.x, y, self.translation.z),
        }
    }

    /// View matrix of a camera placed at this pose.
    pub fn view_matrix(&self) -> Mat4 {
        self.to_matrix().inverse()
    }
}

impl std::fmt::Display for Pose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let t = self.translation;
        let q = self.rotation;
        write!(
            f,
            "t=({:.3}, {:.3}, {:.3}) q=({:.3}, {:.3}, {:.3}, {:.3})",
            t.x, t.y, t.z, q.x, q.y, q.z, q.w
        )
    }
}
