//! Anchors placed by the user and the bounded set that holds them.
//!
//! A [`PlaneAttachment`] pins a scene object to an anchor lying on a detected
//! plane. The [`AnchorSet`] keeps attachments in creation order and never holds
//! more than its capacity; when full, the oldest attachment is the one to go.

use std::collections::VecDeque;

use crate::pose::Pose;
use crate::tracking::{AnchorHandle, PlaneHandle, TrackingError, TrackingSession};

/// Default maximum number of simultaneous anchors.
///
/// Only the most recent placement is kept.
pub const DEFAULT_MAX_ANCHORS: usize = 1;

/// An anchor on a plane, as placed by a tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaneAttachment {
    plane: PlaneHandle,
    anchor: AnchorHandle,
}

impl PlaneAttachment {
    pub fn new(plane: PlaneHandle, anchor: AnchorHandle) -> Self {
        Self { plane, anchor }
    }

    pub fn plane(&self) -> PlaneHandle {
        self.plane
    }

    pub fn anchor(&self) -> AnchorHandle {
        self.anchor
    }

    /// Resolve the attachment's current world pose.
    ///
    /// Returns `Ok(None)` when either the plane or the anchor is not currently
    /// tracking. Otherwise the pose is the anchor's pose with its height taken
    /// from the plane center, so the object stays on the surface as the plane
    /// estimate is refined.
    pub fn resolve<S>(&self, session: &S) -> Result<Option<Pose>, TrackingError>
    where
        S: TrackingSession + ?Sized,
    {
        let plane = session.plane(self.plane)?;
        let anchor = session.anchor(self.anchor)?;
        if !plane.is_tracking() || !anchor.tracking_state.is_tracking() {
            return Ok(None);
        }
        Ok(Some(anchor.pose.with_height(plane.center_pose.translation.y)))
    }
}

impl std::fmt::Display for PlaneAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} on {}", self.anchor, self.plane)
    }
}

/// Creation-ordered, capacity-bounded collection of attachments.
#[derive(Debug, Clone)]
pub struct AnchorSet {
    capacity: usize,
    attachments: VecDeque<PlaneAttachment>,
}

impl Default for AnchorSet {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ANCHORS)
    }
}

impl AnchorSet {
    /// Create an empty set. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            attachments: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.attachments.len() >= self.capacity
    }

    /// Oldest attachment.
    pub fn oldest(&self) -> Option<&PlaneAttachment> {
        self.attachments.front()
    }

    /// The attachment that inserting another one would evict.
    pub fn eviction_candidate(&self) -> Option<&PlaneAttachment> {
        if self.is_full() {
            self.oldest()
        } else {
            None
        }
    }

    /// Attachments, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &PlaneAttachment> {
        self.attachments.iter()
    }

    /// The attachments as they would be after inserting `attachment`.
    pub fn with_inserted(&self, attachment: PlaneAttachment) -> Vec<PlaneAttachment> {
        let skip = usize::from(self.is_full());
        self.attachments
            .iter()
            .skip(skip)
            .copied()
            .chain(std::iter::once(attachment))
            .collect()
    }

    /// Append an attachment, evicting and returning the oldest when full.
    ///
    /// The caller is responsible for releasing the evicted anchor.
    pub fn insert(&mut self, attachment: PlaneAttachment) -> Option<PlaneAttachment> {
        let evicted = if self.is_full() {
            self.attachments.pop_front()
        } else {
            None
        };
        self.attachments.push_back(attachment);
        evicted
    }

    /// Remove and return every attachment, oldest first.
    pub fn drain(&mut self) -> Vec<PlaneAttachment> {
        self.attachments.drain(..).collect()
    }
}
