//! Conversion between tracking-engine and renderer pose conventions.
//!
//! The tracking engine reports right-handed quaternions; the renderer expects
//! left-handed ones. Translations are shared as-is. The mapping for rotations
//! is the quaternion conjugate, which is its own inverse, so converting in
//! either direction uses the same operation.

use glam::{Quat, Vec3};

use super::Pose;

/// Convert a tracking-engine rotation into the renderer's handedness.
pub fn to_renderer_rotation(rotation: Quat) -> Quat {
    rotation.conjugate()
}

/// Convert a renderer rotation back into the tracking engine's handedness.
pub fn from_renderer_rotation(rotation: Quat) -> Quat {
    rotation.conjugate()
}

/// A pose expressed in the renderer's conventions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererPose {
    /// Rotation in the renderer's (left-handed) quaternion convention.
    pub rotation: Quat,
    /// Position in world units; identical to the tracking translation.
    pub position: Vec3,
}

impl RendererPose {
    /// Express a tracking pose in renderer conventions.
    pub fn from_tracking(pose: &Pose) -> Self {
        Self {
            rotation: to_renderer_rotation(pose.rotation),
            position: pose.translation,
        }
    }

    /// Convert back to the tracking engine's conventions.
    pub fn to_tracking(&self) -> Pose {
        Pose {
            rotation: from_renderer_rotation(self.rotation),
            translation: self.position,
        }
    }
}

impl From<Pose> for RendererPose {
    fn from(pose: Pose) -> Self {
        Self::from_tracking(&pose)
    }
}

impl From<RendererPose> for Pose {
    fn from(pose: RendererPose) -> Self {
        pose.to_tracking()
    }
}
