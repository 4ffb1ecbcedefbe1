//! Atomic counters for the pose-sync loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::snapshot::SyncSnapshot;
use crate::taps::TapCounters;

/// Counters describing what the pose-sync loop has done so far.
///
/// All updates use relaxed atomics; snapshots are consistent per counter,
/// not across counters.
#[derive(Debug)]
pub struct SyncMetrics {
    started: Instant,
    ticks_rendered: AtomicU64,
    ticks_not_tracking: AtomicU64,
    ticks_abandoned: AtomicU64,
    taps_discarded: AtomicU64,
    taps_missed: AtomicU64,
    anchors_created: AtomicU64,
    anchors_evicted: AtomicU64,
    anchors_rolled_back: AtomicU64,
    first_plane_notifications: AtomicU64,
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            ticks_rendered: AtomicU64::new(0),
            ticks_not_tracking: AtomicU64::new(0),
            ticks_abandoned: AtomicU64::new(0),
            taps_discarded: AtomicU64::new(0),
            taps_missed: AtomicU64::new(0),
            anchors_created: AtomicU64::new(0),
            anchors_evicted: AtomicU64::new(0),
            anchors_rolled_back: AtomicU64::new(0),
            first_plane_notifications: AtomicU64::new(0),
        }
    }

    /// A tick completed with camera and anchor updates.
    pub fn tick_rendered(&self) {
        self.ticks_rendered.fetch_add(1, Ordering::Relaxed);
    }

    /// A tick completed but tracking was lost.
    pub fn tick_not_tracking(&self) {
        self.ticks_not_tracking.fetch_add(1, Ordering::Relaxed);
    }

    /// A tick was abandoned after a collaborator fault.
    pub fn tick_abandoned(&self) {
        self.ticks_abandoned.fetch_add(1, Ordering::Relaxed);
    }

    /// A tap was dequeued while tracking was unavailable.
    pub fn tap_discarded(&self) {
        self.taps_discarded.fetch_add(1, Ordering::Relaxed);
    }

    /// A tap was hit-tested but hit no placeable plane.
    pub fn tap_missed(&self) {
        self.taps_missed.fetch_add(1, Ordering::Relaxed);
    }

    /// An anchor was committed to the set, possibly evicting an older one.
    pub fn anchor_placed(&self, evicted: bool) {
        self.anchors_created.fetch_add(1, Ordering::Relaxed);
        if evicted {
            self.anchors_evicted.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// An anchor created during an abandoned tick was released again.
    pub fn anchor_rolled_back(&self) {
        self.anchors_rolled_back.fetch_add(1, Ordering::Relaxed);
    }

    pub fn first_plane_notified(&self) {
        self.first_plane_notifications.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot without tap queue counters.
    pub fn snapshot(&self) -> SyncSnapshot {
        SyncSnapshot {
            uptime_secs: self.started.elapsed().as_secs_f64(),
            ticks_rendered: self.ticks_rendered.load(Ordering::Relaxed),
            ticks_not_tracking: self.ticks_not_tracking.load(Ordering::Relaxed),
            ticks_abandoned: self.ticks_abandoned.load(Ordering::Relaxed),
            taps_enqueued: 0,
            taps_dropped: 0,
            taps_consumed: 0,
            taps_discarded: self.taps_discarded.load(Ordering::Relaxed),
            taps_missed: self.taps_missed.load(Ordering::Relaxed),
            anchors_created: self.anchors_created.load(Ordering::Relaxed),
            anchors_evicted: self.anchors_evicted.load(Ordering::Relaxed),
            anchors_rolled_back: self.anchors_rolled_back.load(Ordering::Relaxed),
            first_plane_notifications: self.first_plane_notifications.load(Ordering::Relaxed),
        }
    }

    /// Take a snapshot including the tap queue's counters.
    pub fn snapshot_with_taps(&self, taps: &TapCounters) -> SyncSnapshot {
        SyncSnapshot {
            taps_enqueued: taps.enqueued(),
            taps_dropped: taps.dropped(),
            taps_consumed: taps.consumed(),
            ..self.snapshot()
        }
    }
}
