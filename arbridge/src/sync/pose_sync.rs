//! The per-tick anchor placement and pose synchronization loop.

use std::sync::Arc;

use glam::Vec3;
use tracing::{debug, info, warn};

use super::config::SyncConfig;
use super::outcome::{StageExt, TickError, TickOutcome, TickStage};
use crate::anchors::{AnchorSet, PlaneAttachment};
use crate::scene::{CameraTransform, ObjectId, QuadUv, SceneGraph, SurfaceSearchListener};
use crate::taps::TapReceiver;
use crate::telemetry::{SyncMetrics, SyncSnapshot};
use crate::tracking::{TapEvent, TrackingFrame, TrackingSession, TrackingState};

/// How far a successful tick got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickStatus {
    Rendered,
    NotTracking,
}

/// A new anchor created this tick but not yet committed to the anchor set.
#[derive(Debug, Clone, Copy)]
struct Placement {
    attachment: PlaneAttachment,
    evicts: Option<PlaneAttachment>,
}

/// Scene writes gathered during a tick, applied only if every query succeeded.
#[derive(Debug, Default)]
struct StagedUpdate {
    background_uv: Option<QuadUv>,
    camera: Option<CameraTransform>,
    light_intensity: Option<f32>,
    object_positions: Vec<(ObjectId, Vec3)>,
    first_plane_found: bool,
}

/// Bridges the tracking engine to the scene graph, one render tick at a time.
///
/// The loop owns the anchor set and the consumer half of the tap queue. All
/// of its state is touched from the render context only; the tap queue is the
/// one thing shared with the input context.
///
/// Each call to [`Self::on_render_tick`]:
///
/// 1. binds the renderer's camera texture and acquires the current frame
/// 2. recomputes background UVs if the display rotation changed
/// 3. resolves at most one queued tap into a new anchor (closest plane hit
///    only, evicting the oldest anchor when the set is full)
/// 4. stops here if tracking is lost
/// 5. maps the camera pose into the renderer's convention
/// 6. dismisses the search indicator on the first tracked plane of the
///    configured type
/// 7. moves the tracked object to every tracking anchor
///
/// Scene writes and anchor-set changes are staged and committed at the end.
/// A tick that fails while querying leaves no state behind. Scene writes are
/// applied in order on a best-effort basis: if one fails, the writes before it
/// stay in the scene, the placement is rolled back and the tick is abandoned.
/// A display rotation change is remembered until its UVs reach the scene.
pub struct PoseSyncLoop<S, G>
where
    S: TrackingSession,
    G: SceneGraph,
{
    session: S,
    scene: G,
    taps: TapReceiver,
    listener: Arc<dyn SurfaceSearchListener>,
    config: SyncConfig,
    anchors: AnchorSet,
    background_uv: QuadUv,
    uv_refresh_pending: bool,
    first_plane_found: bool,
    metrics: Arc<SyncMetrics>,
}

impl<S, G> PoseSyncLoop<S, G>
where
    S: TrackingSession,
    G: SceneGraph,
{
    pub fn new(
        session: S,
        scene: G,
        taps: TapReceiver,
        listener: Arc<dyn SurfaceSearchListener>,
        config: SyncConfig,
    ) -> Self {
        let anchors = AnchorSet::new(config.max_anchors);
        Self {
            session,
            scene,
            taps,
            listener,
            config,
            anchors,
            background_uv: QuadUv::DEFAULT,
            uv_refresh_pending: false,
            first_plane_found: false,
            metrics: Arc::new(SyncMetrics::new()),
        }
    }

    /// Share an existing metrics instance instead of a private one.
    pub fn with_metrics(mut self, metrics: Arc<SyncMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Run one render tick.
    ///
    /// Never panics or propagates collaborator faults: a failing tick is
    /// logged and reported as [`TickOutcome::Abandoned`].
    pub fn on_render_tick(&mut self) -> TickOutcome {
        match self.run_tick() {
            Ok(TickStatus::Rendered) => {
                self.metrics.tick_rendered();
                TickOutcome::Rendered
            }
            Ok(TickStatus::NotTracking) => {
                self.metrics.tick_not_tracking();
                TickOutcome::NotTracking
            }
            Err(err) => {
                self.metrics.tick_abandoned();
                warn!(stage = %err.stage(), error = %err, "Render tick abandoned");
                TickOutcome::Abandoned(err)
            }
        }
    }

    /// Forward a render surface size change to the tracking session.
    pub fn on_surface_changed(&mut self, width: u32, height: u32) -> Result<(), TickError> {
        debug!(width, height, "Render surface changed");
        self.session
            .set_display_geometry(width, height)
            .at(TickStage::DisplayGeometry)
    }

    /// Release every held anchor and empty the anchor set.
    ///
    /// Returns the number of anchors released.
    pub fn clear_anchors(&mut self) -> Result<usize, TickError> {
        let handles: Vec<_> = self.anchors.iter().map(PlaneAttachment::anchor).collect();
        if handles.is_empty() {
            return Ok(0);
        }
        self.session
            .release_anchors(&handles)
            .at(TickStage::ReleaseAnchors)?;
        self.anchors.drain();
        info!(count = handles.len(), "Released all anchors");
        Ok(handles.len())
    }

    /// Attachments currently held, oldest first.
    pub fn attachments(&self) -> impl Iterator<Item = &PlaneAttachment> {
        self.anchors.iter()
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    /// Whether the search indicator has been dismissed.
    pub fn first_plane_found(&self) -> bool {
        self.first_plane_found
    }

    /// Background quad UVs last pushed to the scene.
    pub fn background_uv(&self) -> QuadUv {
        self.background_uv
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn scene(&self) -> &G {
        &self.scene
    }

    pub fn metrics(&self) -> Arc<SyncMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Metrics snapshot including tap queue counters.
    pub fn snapshot(&self) -> SyncSnapshot {
        self.metrics.snapshot_with_taps(self.taps.counters())
    }

    fn run_tick(&mut self) -> Result<TickStatus, TickError> {
        let texture = self.scene.camera_texture();
        self.session
            .set_camera_texture(texture)
            .at(TickStage::BindCameraTexture)?;

        let frame = self.session.current_frame().at(TickStage::AcquireFrame)?;
        let mut update = StagedUpdate::default();

        // The rotation flag is only raised once; keep it until the UVs land.
        if frame.display_rotation_changed() {
            self.uv_refresh_pending = true;
        }
        if self.uv_refresh_pending {
            let coords = frame
                .transform_display_uv(&QuadUv::DEFAULT)
                .at(TickStage::BackgroundUv)?;
            update.background_uv = Some(coords);
        }

        // One tap per tick; taps are rare compared to the frame rate.
        let placement = match self.taps.poll() {
            Some(tap) if frame.tracking_state() == TrackingState::Tracking => {
                self.place_anchor(&frame, tap)?
            }
            Some(tap) => {
                self.metrics.tap_discarded();
                debug!(x = tap.x, y = tap.y, state = %frame.tracking_state(), "Discarding tap, not tracking");
                None
            }
            None => None,
        };

        // From here on a failure must undo the anchor created above.
        let status = match self.resolve_poses(&frame, placement.as_ref(), &mut update) {
            Ok(status) => status,
            Err(err) => {
                self.roll_back(placement);
                return Err(err);
            }
        };

        self.commit(update, placement)?;
        Ok(status)
    }

    /// Hit-test a tap and create an anchor on the closest plane hit.
    fn place_anchor(
        &mut self,
        frame: &S::Frame,
        tap: TapEvent,
    ) -> Result<Option<Placement>, TickError> {
        let hits = frame.hit_test(tap).at(TickStage::HitTest)?;

        // Hits are depth-sorted; only the closest plane hit is considered.
        let Some(hit) = hits.iter().find_map(|hit| hit.as_plane_hit()) else {
            self.metrics.tap_missed();
            debug!(x = tap.x, y = tap.y, candidates = hits.len(), "Tap hit no plane");
            return Ok(None);
        };
        if !hit.in_polygon {
            self.metrics.tap_missed();
            debug!(plane = %hit.plane, "Closest plane hit is outside the plane polygon");
            return Ok(None);
        }

        let anchor = self
            .session
            .create_anchor(hit.pose)
            .at(TickStage::CreateAnchor)?;
        let attachment = PlaneAttachment::new(hit.plane, anchor);
        debug!(%attachment, pose = %hit.pose, "Created anchor");

        Ok(Some(Placement {
            attachment,
            evicts: self.anchors.eviction_candidate().copied(),
        }))
    }

    /// Gather camera, plane and anchor updates for a tracking frame.
    fn resolve_poses(
        &self,
        frame: &S::Frame,
        placement: Option<&Placement>,
        update: &mut StagedUpdate,
    ) -> Result<TickStatus, TickError> {
        if frame.tracking_state() == TrackingState::NotTracking {
            return Ok(TickStatus::NotTracking);
        }

        let projection = self
            .session
            .projection_matrix(self.config.near_clip, self.config.far_clip)
            .at(TickStage::Projection)?;
        update.camera = Some(CameraTransform::from_tracking_pose(
            &frame.camera_pose(),
            projection,
            frame.view_matrix(),
        ));

        if self.config.apply_light_estimate {
            update.light_intensity = Some(frame.light_intensity());
        }

        if !self.first_plane_found {
            let planes = self.session.all_planes().at(TickStage::PlaneScan)?;
            update.first_plane_found = planes
                .iter()
                .any(|plane| plane.plane_type == self.config.search_plane_type && plane.is_tracking());
        }

        let held = match placement {
            Some(placement) => self.anchors.with_inserted(placement.attachment),
            None => self.anchors.iter().copied().collect(),
        };
        for attachment in held {
            let Some(pose) = attachment.resolve(&self.session).at(TickStage::AnchorPose)? else {
                continue;
            };
            // Position-only follow: the object keeps its own rotation.
            let position = pose.to_matrix().w_axis.truncate();
            update
                .object_positions
                .push((self.config.tracked_object.clone(), position));
        }

        Ok(TickStatus::Rendered)
    }

    /// Apply staged scene writes, then commit the placement and indicator latch.
    fn commit(
        &mut self,
        update: StagedUpdate,
        placement: Option<Placement>,
    ) -> Result<(), TickError> {
        if let Err(err) = self.apply_scene(&update) {
            self.roll_back(placement);
            return Err(err);
        }

        if let Some(placement) = placement {
            self.commit_placement(placement);
        }

        if update.first_plane_found && !self.first_plane_found {
            self.first_plane_found = true;
            self.metrics.first_plane_notified();
            info!("First tracked plane found, hiding search indicator");
            self.listener.notify_first_plane_found();
        }
        Ok(())
    }

    fn apply_scene(&mut self, update: &StagedUpdate) -> Result<(), TickError> {
        if let Some(coords) = update.background_uv {
            self.scene
                .set_background_uv(&coords)
                .at(TickStage::SceneCommit)?;
            self.background_uv = coords;
            self.uv_refresh_pending = false;
        }
        if let Some(camera) = &update.camera {
            self.scene
                .set_camera_transform(camera)
                .at(TickStage::SceneCommit)?;
        }
        if let Some(intensity) = update.light_intensity {
            self.scene
                .set_light_intensity(intensity)
                .at(TickStage::SceneCommit)?;
        }
        for (object, position) in &update.object_positions {
            self.scene
                .set_object_position(object, *position)
                .at(TickStage::SceneCommit)?;
        }
        Ok(())
    }

    fn commit_placement(&mut self, placement: Placement) {
        if let Some(evicted) = placement.evicts {
            // The evicted attachment leaves the set regardless; a failed
            // release only leaks the engine-side anchor.
            if let Err(err) = self.session.release_anchors(&[evicted.anchor()]) {
                warn!(anchor = %evicted.anchor(), error = %err, "Failed to release evicted anchor");
            }
        }
        let evicted = self.anchors.insert(placement.attachment);
        debug_assert_eq!(evicted, placement.evicts);
        self.metrics.anchor_placed(evicted.is_some());
        info!(
            attachment = %placement.attachment,
            evicted = evicted.map(|a| a.anchor().to_string()),
            anchors = self.anchors.len(),
            "Placed anchor"
        );
    }

    /// Release an anchor created during a tick that is being abandoned.
    fn roll_back(&mut self, placement: Option<Placement>) {
        let Some(placement) = placement else {
            return;
        };
        let anchor = placement.attachment.anchor();
        match self.session.release_anchors(&[anchor]) {
            Ok(()) => debug!(%anchor, "Rolled back anchor from abandoned tick"),
            Err(err) => warn!(%anchor, error = %err, "Failed to roll back anchor"),
        }
        self.metrics.anchor_rolled_back();
    }
}

impl<S, G> std::fmt::Debug for PoseSyncLoop<S, G>
where
    S: TrackingSession,
    G: SceneGraph,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoseSyncLoop")
            .field("config", &self.config)
            .field("anchors", &self.anchors)
            .field("uv_refresh_pending", &self.uv_refresh_pending)
            .field("first_plane_found", &self.first_plane_found)
            .finish_non_exhaustive()
    }
}
