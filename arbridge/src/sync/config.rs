//! Tuning knobs for the pose-sync loop.

use crate::anchors::DEFAULT_MAX_ANCHORS;
use crate::scene::ObjectId;
use crate::taps::DEFAULT_TAP_QUEUE_CAPACITY;
use crate::tracking::PlaneType;

/// Default near clip distance for the camera projection, in meters.
pub const DEFAULT_NEAR_CLIP: f32 = 0.1;

/// Default far clip distance for the camera projection, in meters.
pub const DEFAULT_FAR_CLIP: f32 = 100.0;

/// Default scene object that follows the placed anchor.
pub const DEFAULT_TRACKED_OBJECT: &str = "earth";

/// Configuration for [`super::PoseSyncLoop`].
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Capacity of the pending tap queue.
    pub tap_queue_capacity: usize,

    /// Maximum number of simultaneous anchors. The oldest is evicted when a
    /// new placement would exceed it.
    pub max_anchors: usize,

    /// Scene object moved to each tracked anchor's position.
    pub tracked_object: ObjectId,

    /// Near clip distance for the projection matrix.
    pub near_clip: f32,

    /// Far clip distance for the projection matrix.
    pub far_clip: f32,

    /// Plane type whose first sighting dismisses the search indicator.
    pub search_plane_type: PlaneType,

    /// Forward the frame's light estimate to the scene light.
    pub apply_light_estimate: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tap_queue_capacity: DEFAULT_TAP_QUEUE_CAPACITY,
            max_anchors: DEFAULT_MAX_ANCHORS,
            tracked_object: ObjectId::new(DEFAULT_TRACKED_OBJECT),
            near_clip: DEFAULT_NEAR_CLIP,
            far_clip: DEFAULT_FAR_CLIP,
            search_plane_type: PlaneType::HorizontalUpward,
            apply_light_estimate: false,
        }
    }
}

impl SyncConfig {
    pub fn with_max_anchors(mut self, max_anchors: usize) -> Self {
        self.max_anchors = max_anchors;
        self
    }

    pub fn with_tap_queue_capacity(mut self, capacity: usize) -> Self {
        self.tap_queue_capacity = capacity;
        self
    }

    pub fn with_tracked_object(mut self, object: impl Into<ObjectId>) -> Self {
        self.tracked_object = object.into();
        self
    }

    pub fn with_clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near_clip = near;
        self.far_clip = far;
        self
    }

    pub fn with_search_plane_type(mut self, plane_type: PlaneType) -> Self {
        self.search_plane_type = plane_type;
        self
    }

    pub fn with_light_estimate(mut self, enabled: bool) -> Self {
        self.apply_light_estimate = enabled;
        self
    }
}
