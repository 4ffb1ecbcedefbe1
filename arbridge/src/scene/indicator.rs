//! Thread-safe "searching for surfaces" indicator.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tracing::debug;

use super::traits::SurfaceSearchListener;

/// Shared state of the "searching for surfaces" message.
///
/// The UI shows it on resume and the render loop dismisses it through
/// [`SurfaceSearchListener`]. Dismissals are counted so hosts (and tests) can
/// check that the notification arrived exactly once.
#[derive(Debug, Default)]
pub struct SearchIndicator {
    shown: AtomicBool,
    dismissals: AtomicUsize,
}

impl SearchIndicator {
    /// An indicator that is currently hidden.
    pub fn new() -> Self {
        Self::default()
    }

    /// An indicator that is currently shown.
    pub fn shown() -> Self {
        Self {
            shown: AtomicBool::new(true),
            dismissals: AtomicUsize::new(0),
        }
    }

    /// Show the message (e.g. when the session resumes).
    pub fn show(&self) {
        self.shown.store(true, Ordering::SeqCst);
    }

    pub fn is_shown(&self) -> bool {
        self.shown.load(Ordering::SeqCst)
    }

    /// Number of times the render loop reported a found plane.
    pub fn dismissals(&self) -> usize {
        self.dismissals.load(Ordering::SeqCst)
    }
}

impl SurfaceSearchListener for SearchIndicator {
    fn notify_first_plane_found(&self) {
        self.dismissals.fetch_add(1, Ordering::SeqCst);
        if self.shown.swap(false, Ordering::SeqCst) {
            debug!("Hiding surface search message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_new_indicator_is_hidden() {
        let indicator = SearchIndicator::new();
        assert!(!indicator.is_shown());
        assert_eq!(indicator.dismissals(), 0);
    }

    #[test]
    fn test_notify_hides_and_counts() {
        let indicator = SearchIndicator::shown();
        assert!(indicator.is_shown());

        indicator.notify_first_plane_found();
        assert!(!indicator.is_shown());
        assert_eq!(indicator.dismissals(), 1);
    }

    #[test]
    fn test_trait_object_usage() {
        let indicator = Arc::new(SearchIndicator::shown());
        let listener: Arc<dyn SurfaceSearchListener> = indicator.clone();

        listener.notify_first_plane_found();
        assert!(!indicator.is_shown());
    }
}
