//! Tracking-engine interfaces consumed by the pose-sync loop.

use glam::Mat4;

use super::types::{
    AnchorHandle, AnchorState, HitResult, Plane, PlaneHandle, TapEvent, TrackingError,
    TrackingState,
};
use crate::pose::Pose;
use crate::scene::{QuadUv, TextureId};

/// One tracking update: an immutable snapshot valid for a single render tick.
pub trait TrackingFrame {
    fn tracking_state(&self) -> TrackingState;

    /// True when the display rotation or viewport size changed since the
    /// previous frame, meaning background UVs must be recomputed.
    fn display_rotation_changed(&self) -> bool;

    /// Camera pose in world space.
    fn camera_pose(&self) -> Pose;

    /// View matrix for the camera.
    fn view_matrix(&self) -> Mat4 {
        self.camera_pose().view_matrix()
    }

    /// Average pixel intensity of the camera image, `0.0..=1.0`.
    fn light_intensity(&self) -> f32;

    /// Intersect a screen tap with the tracked world.
    ///
    /// Results are sorted by depth, closest first.
    fn hit_test(&self, tap: TapEvent) -> Result<Vec<HitResult>, TrackingError>;

    /// Map the background quad's UVs through the current display transform.
    fn transform_display_uv(&self, coords: &QuadUv) -> Result<QuadUv, TrackingError>;
}

/// The tracking session owned by the platform layer.
///
/// The pose-sync loop calls this from the render context only. Implementations
/// for a real engine are usually thin handles around the engine session.
pub trait TrackingSession {
    type Frame: TrackingFrame;

    /// Acquire the latest frame. May block until the next camera image when
    /// the engine is configured to throttle to the capture rate.
    fn current_frame(&mut self) -> Result<Self::Frame, TrackingError>;

    /// Tell the engine the size of the render surface.
    fn set_display_geometry(&mut self, width: u32, height: u32) -> Result<(), TrackingError>;

    /// Texture the engine should stream the camera image into.
    fn set_camera_texture(&mut self, texture: TextureId) -> Result<(), TrackingError>;

    /// Start tracking a fixed point in the world.
    fn create_anchor(&mut self, pose: Pose) -> Result<AnchorHandle, TrackingError>;

    /// Stop tracking the given anchors. Unknown handles are ignored.
    fn release_anchors(&mut self, anchors: &[AnchorHandle]) -> Result<(), TrackingError>;

    /// All planes detected so far, in any tracking state.
    fn all_planes(&self) -> Result<Vec<Plane>, TrackingError>;

    /// Camera projection matrix for the given clip distances.
    fn projection_matrix(&self, near: f32, far: f32) -> Result<Mat4, TrackingError>;

    /// Current state of a held anchor.
    fn anchor(&self, handle: AnchorHandle) -> Result<AnchorState, TrackingError>;

    /// Current state of a plane.
    fn plane(&self, handle: PlaneHandle) -> Result<Plane, TrackingError>;
}
