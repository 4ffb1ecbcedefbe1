//! Bounded tap queue between the input and render contexts.
//!
//! Taps arrive from the input context at arbitrary times; the render loop
//! consumes at most one per tick. The queue is a bounded tokio mpsc channel
//! used only through its non-blocking `try_send` / `try_recv` halves, so it
//! works from plain threads as well as async tasks:
//!
//! - producers never block: when the queue is full the new tap is dropped
//! - the consumer never blocks: an empty queue just means "no tap this tick"
//!
//! ```text
//! input thread(s) ──offer()──► [ capacity N ] ──poll()──► render tick
//!                   (drop-new when full)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tracing::trace;

use crate::tracking::TapEvent;

/// Default number of taps that can wait for the render loop.
pub const DEFAULT_TAP_QUEUE_CAPACITY: usize = 16;

/// Counters shared by both halves of a tap queue.
#[derive(Debug, Default)]
pub struct TapCounters {
    enqueued: AtomicU64,
    dropped: AtomicU64,
    consumed: AtomicU64,
}

impl TapCounters {
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn consumed(&self) -> u64 {
        self.consumed.load(Ordering::Relaxed)
    }
}

/// Create a bounded tap queue.
///
/// A capacity of zero is treated as one.
pub fn tap_queue(capacity: usize) -> (TapSender, TapReceiver) {
    let capacity = capacity.max(1);
    let (tx, rx) = mpsc::channel(capacity);
    let counters = Arc::new(TapCounters::default());
    (
        TapSender {
            tx,
            counters: Arc::clone(&counters),
        },
        TapReceiver { rx, counters },
    )
}

/// Producer half. Cheap to clone; one clone per input source.
#[derive(Debug, Clone)]
pub struct TapSender {
    tx: mpsc::Sender<TapEvent>,
    counters: Arc<TapCounters>,
}

impl TapSender {
    /// Queue a tap if there is room.
    ///
    /// Returns `false` when the tap was dropped, either because the queue is
    /// full or because the render loop is gone. Never blocks.
    pub fn offer(&self, tap: TapEvent) -> bool {
        match self.tx.try_send(tap) {
            Ok(()) => {
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(tap)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                trace!(x = tap.x, y = tap.y, "Tap queue full, dropping tap");
                false
            }
            Err(TrySendError::Closed(_)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Number of taps currently waiting.
    pub fn pending(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    pub fn counters(&self) -> &TapCounters {
        &self.counters
    }
}

/// Consumer half, owned by the render loop.
#[derive(Debug)]
pub struct TapReceiver {
    rx: mpsc::Receiver<TapEvent>,
    counters: Arc<TapCounters>,
}

impl TapReceiver {
    /// Take the oldest waiting tap, if any. Never blocks.
    pub fn poll(&mut self) -> Option<TapEvent> {
        match self.rx.try_recv() {
            Ok(tap) => {
                self.counters.consumed.fetch_add(1, Ordering::Relaxed);
                Some(tap)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Drain all waiting taps, oldest first.
    pub fn drain(&mut self) -> Vec<TapEvent> {
        std::iter::from_fn(|| self.poll()).collect()
    }

    pub fn counters(&self) -> &TapCounters {
        &self.counters
    }
}
