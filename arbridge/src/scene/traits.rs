//! Renderer and UI collaborator interfaces.

use glam::Vec3;

use super::types::{CameraTransform, ObjectId, QuadUv, SceneError, TextureId};

/// The renderer's scene graph, as seen from the pose-sync loop.
///
/// Only touched from the render context, so methods take `&mut self` and
/// implementations need no internal locking.
pub trait SceneGraph {
    /// Texture the camera feed should be streamed into.
    fn camera_texture(&self) -> TextureId;

    /// Set the scene camera's rotation, position and projection.
    fn set_camera_transform(&mut self, camera: &CameraTransform) -> Result<(), SceneError>;

    /// Replace the background quad's texture coordinates.
    fn set_background_uv(&mut self, coords: &QuadUv) -> Result<(), SceneError>;

    /// Move a scene object. Rotation is left untouched.
    fn set_object_position(&mut self, object: &ObjectId, position: Vec3)
        -> Result<(), SceneError>;

    /// Feed the frame's ambient light estimate to the scene light.
    ///
    /// Renderers without dynamic lighting can keep the default no-op.
    fn set_light_intensity(&mut self, _intensity: f32) -> Result<(), SceneError> {
        Ok(())
    }
}

/// Receives the one-shot "a surface was found" transition.
///
/// Called from the render context; implementations typically hop to their
/// UI thread, so the trait is `Send + Sync`.
pub trait SurfaceSearchListener: Send + Sync {
    /// The first tracked plane of the searched-for type was observed.
    fn notify_first_plane_found(&self);
}
