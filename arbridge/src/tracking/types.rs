//! Value types produced by the tracking engine.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::pose::Pose;

/// Tracking confidence of a frame, plane or anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackingState {
    /// Actively tracked; poses are current.
    Tracking,
    /// Temporarily lost; may recover.
    Paused,
    /// Not tracked at all.
    NotTracking,
}

impl TrackingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingState::Tracking => "tracking",
            TrackingState::Paused => "paused",
            TrackingState::NotTracking => "not_tracking",
        }
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self, TrackingState::Tracking)
    }
}

impl fmt::Display for TrackingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orientation class of a detected plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaneType {
    /// Floors, tables: normal points up.
    HorizontalUpward,
    /// Ceilings: normal points down.
    HorizontalDownward,
    /// Walls.
    Vertical,
}

impl PlaneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaneType::HorizontalUpward => "horizontal_upward",
            PlaneType::HorizontalDownward => "horizontal_downward",
            PlaneType::Vertical => "vertical",
        }
    }
}

impl fmt::Display for PlaneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown plane type name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown plane type '{0}' (expected horizontal_upward, horizontal_downward or vertical)")]
pub struct ParsePlaneTypeError(pub String);

impl FromStr for PlaneType {
    type Err = ParsePlaneTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "horizontal_upward" | "horizontal_upward_facing" => Ok(PlaneType::HorizontalUpward),
            "horizontal_downward" | "horizontal_downward_facing" => {
                Ok(PlaneType::HorizontalDownward)
            }
            "vertical" => Ok(PlaneType::Vertical),
            other => Err(ParsePlaneTypeError(other.to_string())),
        }
    }
}

/// Session-owned reference to a detected plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaneHandle(pub u64);

impl fmt::Display for PlaneHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plane#{}", self.0)
    }
}

/// Session-owned reference to a world anchor.
///
/// Holding a handle does not keep the anchor alive; it must be released
/// explicitly through [`super::TrackingSession::release_anchors`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorHandle(pub u64);

impl fmt::Display for AnchorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "anchor#{}", self.0)
    }
}

/// Snapshot of a detected plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub handle: PlaneHandle,
    pub plane_type: PlaneType,
    pub tracking_state: TrackingState,
    /// Pose of the plane's center; its y is the surface height.
    pub center_pose: Pose,
}

impl Plane {
    pub fn new(handle: PlaneHandle, plane_type: PlaneType, center_pose: Pose) -> Self {
        Self {
            handle,
            plane_type,
            tracking_state: TrackingState::Tracking,
            center_pose,
        }
    }

    pub fn with_state(mut self, state: TrackingState) -> Self {
        self.tracking_state = state;
        self
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking_state.is_tracking()
    }
}

/// Snapshot of a world anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorState {
    pub handle: AnchorHandle,
    pub tracking_state: TrackingState,
    pub pose: Pose,
}

/// A raw screen tap in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapEvent {
    pub x: f32,
    pub y: f32,
}

impl TapEvent {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A plane intersection returned by a hit-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneHit {
    /// Intersection pose in world space.
    pub pose: Pose,
    /// The plane that was hit.
    pub plane: PlaneHandle,
    /// Whether the intersection lies inside the plane's detected polygon.
    pub in_polygon: bool,
}

/// One candidate intersection of a hit-test ray with the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitResult {
    /// Hit on a detected plane.
    Plane(PlaneHit),
    /// Hit on a feature point or other non-plane geometry.
    Point { pose: Pose },
}

impl HitResult {
    pub fn pose(&self) -> Pose {
        match self {
            HitResult::Plane(hit) => hit.pose,
            HitResult::Point { pose } => *pose,
        }
    }

    pub fn is_plane_hit(&self) -> bool {
        matches!(self, HitResult::Plane(_))
    }

    pub fn as_plane_hit(&self) -> Option<&PlaneHit> {
        match self {
            HitResult::Plane(hit) => Some(hit),
            HitResult::Point { .. } => None,
        }
    }
}

/// Errors surfaced by the tracking engine.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TrackingError {
    /// The session is paused; frames cannot be acquired.
    #[error("Tracking session is paused")]
    SessionPaused,

    /// No frame could be produced this cycle.
    #[error("Frame unavailable: {0}")]
    FrameUnavailable(String),

    /// The anchor handle is not (or no longer) known to the session.
    #[error("Unknown anchor: {0}")]
    UnknownAnchor(AnchorHandle),

    /// The plane handle is not known to the session.
    #[error("Unknown plane: {0}")]
    UnknownPlane(PlaneHandle),

    /// Any other engine fault.
    #[error("Tracking engine error: {0}")]
    Engine(String),
}
