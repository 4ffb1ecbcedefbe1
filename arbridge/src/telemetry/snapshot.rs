//! Point-in-time copy of the pose-sync counters.

use std::fmt;

use serde::Serialize;

/// Snapshot of [`super::SyncMetrics`], suitable for display or JSON output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncSnapshot {
    /// Seconds since the metrics were created.
    pub uptime_secs: f64,
    pub ticks_rendered: u64,
    pub ticks_not_tracking: u64,
    pub ticks_abandoned: u64,
    /// Taps accepted into the queue.
    pub taps_enqueued: u64,
    /// Taps dropped because the queue was full.
    pub taps_dropped: u64,
    /// Taps taken off the queue by the render loop.
    pub taps_consumed: u64,
    /// Consumed taps ignored because tracking was unavailable.
    pub taps_discarded: u64,
    /// Consumed taps that hit no placeable plane.
    pub taps_missed: u64,
    pub anchors_created: u64,
    pub anchors_evicted: u64,
    pub anchors_rolled_back: u64,
    pub first_plane_notifications: u64,
}

impl SyncSnapshot {
    pub fn ticks_total(&self) -> u64 {
        self.ticks_rendered + self.ticks_not_tracking + self.ticks_abandoned
    }

    /// Effective tick rate over the snapshot's uptime.
    pub fn ticks_per_second(&self) -> f64 {
        if self.uptime_secs > 0.0 {
            self.ticks_total() as f64 / self.uptime_secs
        } else {
            0.0
        }
    }

    /// Fraction of ticks that were abandoned, `0.0..=1.0`.
    pub fn abandon_rate(&self) -> f64 {
        let total = self.ticks_total();
        if total == 0 {
            0.0
        } else {
            self.ticks_abandoned as f64 / total as f64
        }
    }
}

impl fmt::Display for SyncSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ticks {} ({} rendered, {} not tracking, {} abandoned) | taps {} queued, {} dropped | anchors {} placed, {} evicted",
            self.ticks_total(),
            self.ticks_rendered,
            self.ticks_not_tracking,
            self.ticks_abandoned,
            self.taps_enqueued,
            self.taps_dropped,
            self.anchors_created,
            self.anchors_evicted,
        )
    }
}
