//! Scripted tracking session for tests and simulation.
//!
//! `ScriptedSession` plays back queued frames and keeps an in-memory table of
//! planes and anchors, so the pose-sync loop can be driven without a camera or
//! GPU. Clones share state: tests keep one handle to script and inspect the
//! session while the loop owns another.
//!
//! # Example
//!
//! ```
//! use arbridge::pose::Pose;
//! use arbridge::tracking::{PlaneType, ScriptedFrame, ScriptedSession, TrackingSession};
//!
//! let session = ScriptedSession::new();
//! let floor = session.add_plane(PlaneType::HorizontalUpward, Pose::IDENTITY);
//! session.push_frame(ScriptedFrame::tracking(Pose::IDENTITY).with_plane_hit(
//!     Pose::IDENTITY,
//!     floor,
//!     true,
//! ));
//!
//! let mut handle = session.clone();
//! assert!(handle.current_frame().is_ok());
//! ```

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use glam::Mat4;
use parking_lot::Mutex;

use super::traits::{TrackingFrame, TrackingSession};
use super::types::{
    AnchorHandle, AnchorState, HitResult, Plane, PlaneHandle, PlaneHit, PlaneType, TapEvent,
    TrackingError, TrackingState,
};
use crate::pose::Pose;
use crate::scene::{QuadUv, TextureId};

/// Display size assumed until `set_display_geometry` is called.
pub const DEFAULT_DISPLAY_SIZE: (u32, u32) = (1080, 1920);

/// Vertical field of view of the scripted camera, in degrees.
const FIELD_OF_VIEW_DEG: f32 = 60.0;

/// Computes hit-test results for a tap against the session's current planes.
pub type HitResolver = Arc<dyn Fn(TapEvent, &[Plane]) -> Vec<HitResult> + Send + Sync>;

/// Session operations that can be scripted to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptedOp {
    CurrentFrame,
    DisplayGeometry,
    CameraTexture,
    CreateAnchor,
    ReleaseAnchors,
    AllPlanes,
    Projection,
    AnchorQuery,
    PlaneQuery,
}

/// A frame as played back by [`ScriptedSession`].
#[derive(Clone)]
pub struct ScriptedFrame {
    pub tracking_state: TrackingState,
    pub camera_pose: Pose,
    pub light_intensity: f32,
    pub display_rotation_changed: bool,
    /// Display rotation in quarter turns, applied to background UVs.
    pub quarter_turns: u8,
    /// Hits returned for every tap when no resolver is installed.
    pub hits: Vec<HitResult>,
    hit_error: Option<TrackingError>,
    resolver: Option<HitResolver>,
    planes: Vec<Plane>,
}

impl fmt::Debug for ScriptedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedFrame")
            .field("tracking_state", &self.tracking_state)
            .field("camera_pose", &self.camera_pose)
            .field("light_intensity", &self.light_intensity)
            .field("display_rotation_changed", &self.display_rotation_changed)
            .field("quarter_turns", &self.quarter_turns)
            .field("hits", &self.hits)
            .finish_non_exhaustive()
    }
}

impl Default for ScriptedFrame {
    fn default() -> Self {
        Self::tracking(Pose::IDENTITY)
    }
}

impl ScriptedFrame {
    /// A tracking frame with the camera at `camera_pose`.
    pub fn tracking(camera_pose: Pose) -> Self {
        Self {
            tracking_state: TrackingState::Tracking,
            camera_pose,
            light_intensity: 0.5,
            display_rotation_changed: false,
            quarter_turns: 0,
            hits: Vec::new(),
            hit_error: None,
            resolver: None,
            planes: Vec::new(),
        }
    }

    /// A frame where tracking is lost.
    pub fn not_tracking() -> Self {
        Self::tracking(Pose::IDENTITY).with_state(TrackingState::NotTracking)
    }

    pub fn with_state(mut self, state: TrackingState) -> Self {
        self.tracking_state = state;
        self
    }

    pub fn with_light(mut self, intensity: f32) -> Self {
        self.light_intensity = intensity;
        self
    }

    /// Report a display rotation change to `quarter_turns` × 90°.
    pub fn with_rotation_change(mut self, quarter_turns: u8) -> Self {
        self.display_rotation_changed = true;
        self.quarter_turns = quarter_turns % 4;
        self
    }

    /// Append a hit, keeping the list depth-ordered by insertion.
    pub fn with_hit(mut self, hit: HitResult) -> Self {
        self.hits.push(hit);
        self
    }

    /// Append a plane hit.
    pub fn with_plane_hit(self, pose: Pose, plane: PlaneHandle, in_polygon: bool) -> Self {
        self.with_hit(HitResult::Plane(PlaneHit {
            pose,
            plane,
            in_polygon,
        }))
    }

    /// Make `hit_test` fail on this frame.
    pub fn with_hit_error(mut self, err: TrackingError) -> Self {
        self.hit_error = Some(err);
        self
    }
}

impl TrackingFrame for ScriptedFrame {
    fn tracking_state(&self) -> TrackingState {
        self.tracking_state
    }

    fn display_rotation_changed(&self) -> bool {
        self.display_rotation_changed
    }

    fn camera_pose(&self) -> Pose {
        self.camera_pose
    }

    fn light_intensity(&self) -> f32 {
        self.light_intensity
    }

    fn hit_test(&self, tap: TapEvent) -> Result<Vec<HitResult>, TrackingError> {
        if let Some(err) = &self.hit_error {
            return Err(err.clone());
        }
        match &self.resolver {
            Some(resolve) => Ok(resolve(tap, &self.planes)),
            None => Ok(self.hits.clone()),
        }
    }

    fn transform_display_uv(&self, coords: &QuadUv) -> Result<QuadUv, TrackingError> {
        let mut pairs = [(0.0, 0.0); 4];
        for (slot, (u, v)) in pairs.iter_mut().zip(coords.pairs()) {
            let (mut u, mut v) = (u, v);
            for _ in 0..self.quarter_turns {
                (u, v) = (1.0 - v, u);
            }
            *slot = (u, v);
        }
        Ok(QuadUv::from_pairs(pairs))
    }
}

struct ScriptedInner {
    queued: VecDeque<Result<ScriptedFrame, TrackingError>>,
    last: ScriptedFrame,
    planes: BTreeMap<PlaneHandle, Plane>,
    anchors: BTreeMap<AnchorHandle, AnchorState>,
    next_plane: u64,
    next_anchor: u64,
    created: Vec<AnchorHandle>,
    released: Vec<AnchorHandle>,
    paused: bool,
    geometry_changed: bool,
    display_size: (u32, u32),
    camera_texture: Option<TextureId>,
    frames_served: u64,
    failures: HashMap<ScriptedOp, TrackingError>,
    resolver: Option<HitResolver>,
}

impl ScriptedInner {
    fn take_failure(&mut self, op: ScriptedOp) -> Result<(), TrackingError> {
        match self.failures.remove(&op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for ScriptedInner {
    fn default() -> Self {
        Self {
            queued: VecDeque::new(),
            last: ScriptedFrame::default(),
            planes: BTreeMap::new(),
            anchors: BTreeMap::new(),
            next_plane: 1,
            next_anchor: 1,
            created: Vec::new(),
            released: Vec::new(),
            paused: false,
            geometry_changed: false,
            display_size: DEFAULT_DISPLAY_SIZE,
            camera_texture: None,
            frames_served: 0,
            failures: HashMap::new(),
            resolver: None,
        }
    }
}

/// In-memory tracking session driven by scripted frames.
///
/// When the frame queue runs dry the most recent frame is replayed, with its
/// display-rotation flag cleared.
#[derive(Clone, Default)]
pub struct ScriptedSession {
    inner: Arc<Mutex<ScriptedInner>>,
}

impl fmt::Debug for ScriptedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ScriptedSession")
            .field("queued", &inner.queued.len())
            .field("planes", &inner.planes.len())
            .field("anchors", &inner.anchors.len())
            .field("paused", &inner.paused)
            .field("frames_served", &inner.frames_served)
            .finish_non_exhaustive()
    }
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a frame for a future `current_frame` call.
    pub fn push_frame(&self, frame: ScriptedFrame) {
        self.inner.lock().queued.push_back(Ok(frame));
    }

    /// Queue a frame acquisition failure.
    pub fn push_frame_error(&self, err: TrackingError) {
        self.inner.lock().queued.push_back(Err(err));
    }

    /// Make the next call of `op` fail with `err`.
    pub fn fail_next(&self, op: ScriptedOp, err: TrackingError) {
        self.inner.lock().failures.insert(op, err);
    }

    /// Resolve hit-tests with `resolver` instead of the frames' hit lists.
    pub fn set_hit_resolver(&self, resolver: HitResolver) {
        self.inner.lock().resolver = Some(resolver);
    }

    /// Register a tracking plane and return its handle.
    pub fn add_plane(&self, plane_type: PlaneType, center_pose: Pose) -> PlaneHandle {
        let mut inner = self.inner.lock();
        let handle = PlaneHandle(inner.next_plane);
        inner.next_plane += 1;
        inner
            .planes
            .insert(handle, Plane::new(handle, plane_type, center_pose));
        handle
    }

    pub fn set_plane_state(&self, handle: PlaneHandle, state: TrackingState) {
        if let Some(plane) = self.inner.lock().planes.get_mut(&handle) {
            plane.tracking_state = state;
        }
    }

    /// Move a plane's center, as the engine does while refining its estimate.
    pub fn set_plane_center(&self, handle: PlaneHandle, center_pose: Pose) {
        if let Some(plane) = self.inner.lock().planes.get_mut(&handle) {
            plane.center_pose = center_pose;
        }
    }

    pub fn set_anchor_state(&self, handle: AnchorHandle, state: TrackingState) {
        if let Some(anchor) = self.inner.lock().anchors.get_mut(&handle) {
            anchor.tracking_state = state;
        }
    }

    pub fn set_anchor_pose(&self, handle: AnchorHandle, pose: Pose) {
        if let Some(anchor) = self.inner.lock().anchors.get_mut(&handle) {
            anchor.pose = pose;
        }
    }

    /// Pause the session; frame requests fail until [`Self::resume`].
    pub fn pause(&self) {
        self.inner.lock().paused = true;
    }

    pub fn resume(&self) {
        self.inner.lock().paused = false;
    }

    /// Anchors currently alive in the session, oldest first.
    pub fn live_anchors(&self) -> Vec<AnchorHandle> {
        self.inner.lock().anchors.keys().copied().collect()
    }

    /// Every anchor ever created, in creation order.
    pub fn created_anchors(&self) -> Vec<AnchorHandle> {
        self.inner.lock().created.clone()
    }

    /// Every anchor released so far, in release order.
    pub fn released_anchors(&self) -> Vec<AnchorHandle> {
        self.inner.lock().released.clone()
    }

    pub fn display_size(&self) -> (u32, u32) {
        self.inner.lock().display_size
    }

    pub fn camera_texture(&self) -> Option<TextureId> {
        self.inner.lock().camera_texture
    }

    pub fn frames_served(&self) -> u64 {
        self.inner.lock().frames_served
    }

    pub fn queued_frames(&self) -> usize {
        self.inner.lock().queued.len()
    }
}

impl TrackingSession for ScriptedSession {
    type Frame = ScriptedFrame;

    fn current_frame(&mut self) -> Result<ScriptedFrame, TrackingError> {
        let mut inner = self.inner.lock();
        inner.take_failure(ScriptedOp::CurrentFrame)?;
        if inner.paused {
            return Err(TrackingError::SessionPaused);
        }

        let mut frame = match inner.queued.pop_front() {
            Some(Err(err)) => return Err(err),
            Some(Ok(frame)) => frame,
            None => {
                let mut replay = inner.last.clone();
                replay.display_rotation_changed = false;
                replay
            }
        };
        inner.last = frame.clone();

        if inner.geometry_changed {
            inner.geometry_changed = false;
            frame.display_rotation_changed = true;
        }
        frame.resolver = inner.resolver.clone();
        frame.planes = inner.planes.values().copied().collect();
        inner.frames_served += 1;
        Ok(frame)
    }

    fn set_display_geometry(&mut self, width: u32, height: u32) -> Result<(), TrackingError> {
        let mut inner = self.inner.lock();
        inner.take_failure(ScriptedOp::DisplayGeometry)?;
        if inner.display_size != (width, height) {
            inner.display_size = (width, height);
            inner.geometry_changed = true;
        }
        Ok(())
    }

    fn set_camera_texture(&mut self, texture: TextureId) -> Result<(), TrackingError> {
        let mut inner = self.inner.lock();
        inner.take_failure(ScriptedOp::CameraTexture)?;
        inner.camera_texture = Some(texture);
        Ok(())
    }

    fn create_anchor(&mut self, pose: Pose) -> Result<AnchorHandle, TrackingError> {
        let mut inner = self.inner.lock();
        inner.take_failure(ScriptedOp::CreateAnchor)?;
        let handle = AnchorHandle(inner.next_anchor);
        inner.next_anchor += 1;
        inner.anchors.insert(
            handle,
            AnchorState {
                handle,
                tracking_state: TrackingState::Tracking,
                pose,
            },
        );
        inner.created.push(handle);
        Ok(handle)
    }

    fn release_anchors(&mut self, anchors: &[AnchorHandle]) -> Result<(), TrackingError> {
        let mut inner = self.inner.lock();
        inner.take_failure(ScriptedOp::ReleaseAnchors)?;
        for handle in anchors {
            if inner.anchors.remove(handle).is_some() {
                inner.released.push(*handle);
            }
        }
        Ok(())
    }

    fn all_planes(&self) -> Result<Vec<Plane>, TrackingError> {
        let mut inner = self.inner.lock();
        inner.take_failure(ScriptedOp::AllPlanes)?;
        Ok(inner.planes.values().copied().collect())
    }

    fn projection_matrix(&self, near: f32, far: f32) -> Result<Mat4, TrackingError> {
        let mut inner = self.inner.lock();
        inner.take_failure(ScriptedOp::Projection)?;
        let (width, height) = inner.display_size;
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        Ok(Mat4::perspective_rh_gl(
            FIELD_OF_VIEW_DEG.to_radians(),
            aspect,
            near,
            far,
        ))
    }

    fn anchor(&self, handle: AnchorHandle) -> Result<AnchorState, TrackingError> {
        let mut inner = self.inner.lock();
        inner.take_failure(ScriptedOp::AnchorQuery)?;
        inner
            .anchors
            .get(&handle)
            .copied()
            .ok_or(TrackingError::UnknownAnchor(handle))
    }

    fn plane(&self, handle: PlaneHandle) -> Result<Plane, TrackingError> {
        let mut inner = self.inner.lock();
        inner.take_failure(ScriptedOp::PlaneQuery)?;
        inner
            .planes
            .get(&handle)
            .copied()
            .ok_or(TrackingError::UnknownPlane(handle))
    }
}
