//! Tracking-engine contract of the pose-sync loop.
//!
//! The tracking engine (camera pose estimation, plane detection, anchors) is an
//! external black box. This module defines the slice of it the loop consumes:
//!
//! - [`TrackingSession`] - long-lived session: frames, anchors, planes, projection
//! - [`TrackingFrame`] - per-tick snapshot: pose, tracking state, hit-tests
//!
//! [`ScriptedSession`] implements both from scripted data so the loop can run
//! in tests and in the CLI simulation.

mod scripted;
mod traits;
mod types;

pub use scripted::{
    HitResolver, ScriptedFrame, ScriptedOp, ScriptedSession, DEFAULT_DISPLAY_SIZE,
};
pub use traits::{TrackingFrame, TrackingSession};
pub use types::{
    AnchorHandle, AnchorState, HitResult, ParsePlaneTypeError, Plane, PlaneHandle, PlaneHit,
    PlaneType, TapEvent, TrackingError, TrackingState,
};
