//! Pose-sync loop telemetry.
//!
//! Lock-free atomic counters updated from the render and input contexts, and
//! point-in-time snapshots for display.
//!
//! # Architecture
//!
//! ```text
//! PoseSyncLoop ──┐
//!                ├──► SyncMetrics ──────► SyncSnapshot ──────► CLI summary / JSON
//! TapSender ─────┘    (atomic counters)   (point-in-time copy)
//! ```
//!
//! # Example
//!
//! ```
//! use arbridge::telemetry::SyncMetrics;
//!
//! let metrics = SyncMetrics::new();
//! metrics.tick_rendered();
//! metrics.anchor_placed(false);
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.ticks_rendered, 1);
//! assert_eq!(snapshot.anchors_created, 1);
//! ```

mod metrics;
mod snapshot;

pub use metrics::SyncMetrics;
pub use snapshot::SyncSnapshot;
