//! Anchor placement and pose synchronization.
//!
//! [`PoseSyncLoop`] is the render-context half of the system. Hosts call
//! [`PoseSyncLoop::on_render_tick`] once per rendered frame and inspect the
//! returned [`TickOutcome`]; a fault in the tracking engine or renderer never
//! escapes a tick.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use arbridge::pose::Pose;
//! use arbridge::scene::{RecordingScene, SearchIndicator};
//! use arbridge::sync::{PoseSyncLoop, SyncConfig, TickOutcome};
//! use arbridge::taps::tap_queue;
//! use arbridge::tracking::{PlaneType, ScriptedFrame, ScriptedSession, TapEvent};
//!
//! let session = ScriptedSession::new();
//! let floor = session.add_plane(PlaneType::HorizontalUpward, Pose::IDENTITY);
//! session.push_frame(ScriptedFrame::tracking(Pose::IDENTITY).with_plane_hit(
//!     Pose::IDENTITY,
//!     floor,
//!     true,
//! ));
//!
//! let config = SyncConfig::default();
//! let (taps, tap_rx) = tap_queue(config.tap_queue_capacity);
//! let indicator = Arc::new(SearchIndicator::shown());
//! let mut sync = PoseSyncLoop::new(
//!     session.clone(),
//!     RecordingScene::new(),
//!     tap_rx,
//!     indicator.clone(),
//!     config,
//! );
//!
//! taps.offer(TapEvent::new(540.0, 960.0));
//! assert_eq!(sync.on_render_tick(), TickOutcome::Rendered);
//! assert_eq!(sync.anchor_count(), 1);
//! assert!(!indicator.is_shown());
//! ```

mod config;
mod outcome;
mod pose_sync;

pub use config::{
    SyncConfig, DEFAULT_FAR_CLIP, DEFAULT_NEAR_CLIP, DEFAULT_TRACKED_OBJECT,
};
pub use outcome::{StageExt, TickError, TickOutcome, TickStage};
pub use pose_sync::PoseSyncLoop;

#[cfg(test)]
mod tests;
