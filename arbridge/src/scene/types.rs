//! Value types exchanged with the renderer.

use glam::{Mat4, Quat, Vec3};
use thiserror::Error;

use crate::pose::{Pose, RendererPose};

/// Identifier of a renderable object in the scene graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ObjectId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// GPU texture name the camera feed is streamed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureId(pub u32);

impl std::fmt::Display for TextureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tex#{}", self.0)
    }
}

/// Texture coordinates of the full-screen background quad.
///
/// Four `(u, v)` pairs in triangle-strip order: bottom-left, top-left,
/// bottom-right, top-right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadUv(pub [f32; 8]);

impl QuadUv {
    /// Untransformed coordinates of the background quad.
    pub const DEFAULT: QuadUv = QuadUv([
        0.0, 1.0, //
        0.0, 0.0, //
        1.0, 1.0, //
        1.0, 0.0, //
    ]);

    /// Iterate over `(u, v)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.0.chunks_exact(2).map(|uv| (uv[0], uv[1]))
    }

    /// Build from `(u, v)` pairs.
    pub fn from_pairs(pairs: [(f32, f32); 4]) -> Self {
        let mut coords = [0.0; 8];
        for (i, (u, v)) in pairs.into_iter().enumerate() {
            coords[i * 2] = u;
            coords[i * 2 + 1] = v;
        }
        Self(coords)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

impl Default for QuadUv {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Everything the renderer's camera needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransform {
    /// Camera rotation in the renderer's quaternion handedness.
    pub rotation: Quat,
    /// Camera position in world space.
    pub position: Vec3,
    /// Projection matrix from the tracking session.
    pub projection: Mat4,
    /// View matrix from the frame.
    pub view: Mat4,
}

impl CameraTransform {
    /// Map a tracking-engine camera pose into the renderer's camera.
    ///
    /// Translation is copied; rotation is conjugated to flip handedness.
    pub fn from_tracking_pose(pose: &Pose, projection: Mat4, view: Mat4) -> Self {
        let renderer = RendererPose::from_tracking(pose);
        Self {
            rotation: renderer.rotation,
            position: renderer.position,
            projection,
            view,
        }
    }

    /// The camera pose back in tracking-engine conventions.
    pub fn tracking_pose(&self) -> Pose {
        RendererPose {
            rotation: self.rotation,
            position: self.position,
        }
        .to_tracking()
    }
}

/// Errors surfaced by the renderer.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SceneError {
    /// The object is not part of the scene graph.
    #[error("Unknown scene object: {0}")]
    UnknownObject(ObjectId),

    /// Renderer-side failure.
    #[error("Renderer error: {0}")]
    Renderer(String),
}
