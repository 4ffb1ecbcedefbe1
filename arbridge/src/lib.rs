//! arbridge - Anchor placement and pose synchronization for AR scenes
//!
//! This library bridges an augmented-reality tracking engine (session, frame,
//! plane and anchor APIs) to a real-time scene-graph renderer. Both engines are
//! external black boxes, modelled here as traits:
//!
//! - [`tracking::TrackingSession`] / [`tracking::TrackingFrame`] - the tracking engine
//! - [`scene::SceneGraph`] - the renderer's scene graph
//! - [`scene::SurfaceSearchListener`] - the UI's "searching for surfaces" indicator
//!
//! The authored logic lives in [`sync::PoseSyncLoop`], which runs once per
//! render tick: it resolves at most one queued tap into a world anchor, keeps
//! the anchor set within its capacity bound and pushes the camera pose and
//! anchor positions into the scene graph.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use arbridge::scene::{RecordingScene, SearchIndicator};
//! use arbridge::sync::{PoseSyncLoop, SyncConfig};
//! use arbridge::taps::tap_queue;
//! use arbridge::tracking::{ScriptedSession, TapEvent};
//!
//! let config = SyncConfig::default();
//! let (taps, tap_rx) = tap_queue(config.tap_queue_capacity);
//! let indicator = Arc::new(SearchIndicator::shown());
//!
//! let mut sync = PoseSyncLoop::new(
//!     ScriptedSession::new(),
//!     RecordingScene::new(),
//!     tap_rx,
//!     indicator,
//!     config,
//! );
//!
//! // Input context
//! taps.offer(TapEvent::new(540.0, 1200.0));
//!
//! // Render context
//! let outcome = sync.on_render_tick();
//! assert!(outcome.is_rendered());
//!
//! // No plane has been detected yet, so the tap found nothing to anchor to.
//! assert_eq!(sync.anchor_count(), 0);
//! ```

pub mod anchors;
pub mod config;
pub mod logging;
pub mod pose;
pub mod scene;
pub mod sync;
pub mod taps;
pub mod telemetry;
pub mod tracking;

/// Crate version, as reported by the CLI banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
