//! Behavioural tests for the pose-sync loop, driven by scripted collaborators.

use std::sync::Arc;

use glam::{Quat, Vec3};

use super::*;
use crate::pose::Pose;
use crate::scene::{
    ObjectId, QuadUv, RecordingScene, SceneError, SceneOp, SearchIndicator, DEFAULT_CAMERA_TEXTURE,
};
use crate::taps::{tap_queue, TapSender};
use crate::tracking::{
    HitResult, PlaneHandle, PlaneType, ScriptedFrame, ScriptedOp, ScriptedSession, TapEvent,
    TrackingError, TrackingSession, TrackingState,
};

struct Harness {
    session: ScriptedSession,
    scene: RecordingScene,
    taps: TapSender,
    indicator: Arc<SearchIndicator>,
    floor: PlaneHandle,
    sync: PoseSyncLoop<ScriptedSession, RecordingScene>,
}

/// Floor plane 1m below the origin, search indicator shown.
fn harness(config: SyncConfig) -> Harness {
    let session = ScriptedSession::new();
    let floor = session.add_plane(
        PlaneType::HorizontalUpward,
        Pose::from_translation(Vec3::new(0.0, -1.0, -1.5)),
    );
    let scene = RecordingScene::new();
    let (taps, tap_rx) = tap_queue(config.tap_queue_capacity);
    let indicator = Arc::new(SearchIndicator::shown());
    let sync = PoseSyncLoop::new(
        session.clone(),
        scene.clone(),
        tap_rx,
        indicator.clone(),
        config,
    );
    Harness {
        session,
        scene,
        taps,
        indicator,
        floor,
        sync,
    }
}

fn earth() -> ObjectId {
    ObjectId::from("earth")
}

fn tap() -> TapEvent {
    TapEvent::new(540.0, 1200.0)
}

fn floor_hit_frame(h: &Harness, x: f32, z: f32) -> ScriptedFrame {
    ScriptedFrame::tracking(Pose::IDENTITY).with_plane_hit(
        Pose::from_translation(Vec3::new(x, -1.0, z)),
        h.floor,
        true,
    )
}

/// Queue a tap over a frame that hits the floor at `(x, z)` and run a tick.
fn place(h: &mut Harness, x: f32, z: f32) -> TickOutcome {
    h.session.push_frame(floor_hit_frame(h, x, z));
    assert!(h.taps.offer(tap()));
    h.sync.on_render_tick()
}

// ============================================================================
// Tap-to-anchor placement
// ============================================================================

#[test]
fn test_tap_places_anchor_and_moves_object() {
    let mut h = harness(SyncConfig::default());

    assert_eq!(place(&mut h, 0.5, -2.0), TickOutcome::Rendered);

    assert_eq!(h.sync.anchor_count(), 1);
    assert_eq!(h.session.live_anchors().len(), 1);
    assert_eq!(
        h.scene.object_position(&earth()),
        Some(Vec3::new(0.5, -1.0, -2.0))
    );
}

#[test]
fn test_second_placement_evicts_first() {
    let mut h = harness(SyncConfig::default());

    place(&mut h, 0.0, -1.0);
    let first = h.sync.attachments().next().copied().unwrap();

    place(&mut h, 1.0, -3.0);
    let held: Vec<_> = h.sync.attachments().copied().collect();

    assert_eq!(held.len(), 1);
    assert_ne!(held[0], first);
    assert_eq!(h.session.released_anchors(), vec![first.anchor()]);
    assert_eq!(h.session.live_anchors(), vec![held[0].anchor()]);
    assert_eq!(
        h.scene.object_position(&earth()),
        Some(Vec3::new(1.0, -1.0, -3.0))
    );

    let snapshot = h.sync.snapshot();
    assert_eq!(snapshot.anchors_created, 2);
    assert_eq!(snapshot.anchors_evicted, 1);
}

#[test]
fn test_anchor_set_never_exceeds_capacity() {
    let mut h = harness(SyncConfig::default().with_max_anchors(3));

    for i in 0..10 {
        place(&mut h, i as f32, -1.0);
        assert!(h.sync.anchor_count() <= 3);
        let held: Vec<_> = h.sync.attachments().map(|a| a.anchor()).collect();
        assert_eq!(h.session.live_anchors(), held);
    }

    // The three most recent placements survive, in creation order.
    let created = h.session.created_anchors();
    let held: Vec<_> = h.sync.attachments().map(|a| a.anchor()).collect();
    assert_eq!(held, created[7..].to_vec());
}

#[test]
fn test_closest_plane_hit_outside_polygon_blocks_placement() {
    let mut h = harness(SyncConfig::default());
    let far_plane = h.session.add_plane(PlaneType::HorizontalUpward, Pose::IDENTITY);

    h.session.push_frame(
        ScriptedFrame::tracking(Pose::IDENTITY)
            .with_plane_hit(Pose::from_translation(Vec3::new(0.0, -1.0, -1.0)), h.floor, false)
            .with_plane_hit(Pose::from_translation(Vec3::new(0.0, -1.0, -4.0)), far_plane, true),
    );
    h.taps.offer(tap());

    assert_eq!(h.sync.on_render_tick(), TickOutcome::Rendered);
    assert_eq!(h.sync.anchor_count(), 0);
    assert!(h.session.created_anchors().is_empty());
    assert_eq!(h.sync.snapshot().taps_missed, 1);
}

#[test]
fn test_point_hits_are_skipped() {
    let mut h = harness(SyncConfig::default());

    h.session.push_frame(
        ScriptedFrame::tracking(Pose::IDENTITY)
            .with_hit(HitResult::Point {
                pose: Pose::from_translation(Vec3::new(0.0, 0.0, -0.5)),
            })
            .with_plane_hit(Pose::from_translation(Vec3::new(0.2, -1.0, -2.0)), h.floor, true),
    );
    h.taps.offer(tap());

    h.sync.on_render_tick();
    let held: Vec<_> = h.sync.attachments().copied().collect();
    assert_eq!(held.len(), 1);
    assert_eq!(held[0].plane(), h.floor);
}

#[test]
fn test_no_hits_creates_nothing() {
    let mut h = harness(SyncConfig::default());
    h.session.push_frame(ScriptedFrame::tracking(Pose::IDENTITY));
    h.taps.offer(tap());

    assert_eq!(h.sync.on_render_tick(), TickOutcome::Rendered);
    assert_eq!(h.sync.anchor_count(), 0);
}

#[test]
fn test_one_tap_per_tick() {
    let mut h = harness(SyncConfig::default().with_max_anchors(4));
    h.session.push_frame(floor_hit_frame(&h, 0.0, -1.0));
    h.taps.offer(tap());
    h.taps.offer(tap());

    h.sync.on_render_tick();
    assert_eq!(h.sync.anchor_count(), 1);
    assert_eq!(h.taps.pending(), 1);

    // The replayed frame still hits the floor.
    h.sync.on_render_tick();
    assert_eq!(h.sync.anchor_count(), 2);
    assert_eq!(h.taps.pending(), 0);
}

#[test]
fn test_tap_while_not_tracking_is_discarded() {
    let mut h = harness(SyncConfig::default());
    h.session.push_frame(
        floor_hit_frame(&h, 0.0, -1.0).with_state(TrackingState::NotTracking),
    );
    h.taps.offer(tap());

    assert_eq!(h.sync.on_render_tick(), TickOutcome::NotTracking);
    assert_eq!(h.sync.anchor_count(), 0);
    assert_eq!(h.taps.pending(), 0);

    // Tracking resumes; the discarded tap does not come back.
    h.session.push_frame(floor_hit_frame(&h, 0.0, -1.0));
    assert_eq!(h.sync.on_render_tick(), TickOutcome::Rendered);
    assert_eq!(h.sync.anchor_count(), 0);
    assert_eq!(h.sync.snapshot().taps_discarded, 1);
}

#[test]
fn test_paused_frame_ignores_taps_but_updates_camera() {
    let mut h = harness(SyncConfig::default());
    h.session
        .push_frame(floor_hit_frame(&h, 0.0, -1.0).with_state(TrackingState::Paused));
    h.taps.offer(tap());

    assert_eq!(h.sync.on_render_tick(), TickOutcome::Rendered);
    assert_eq!(h.sync.anchor_count(), 0);
    assert_eq!(h.scene.camera_updates().len(), 1);
}

// ============================================================================
// Tracking loss
// ============================================================================

#[test]
fn test_not_tracking_skips_camera_and_object_updates() {
    let mut h = harness(SyncConfig::default());
    place(&mut h, 0.5, -2.0);
    let cameras = h.scene.camera_updates().len();
    let positions = h.scene.position_updates().len();

    // Tick N: tracking lost, but the display rotated.
    h.session
        .push_frame(ScriptedFrame::not_tracking().with_rotation_change(1));
    assert_eq!(h.sync.on_render_tick(), TickOutcome::NotTracking);
    assert_eq!(h.scene.camera_updates().len(), cameras);
    assert_eq!(h.scene.position_updates().len(), positions);
    assert_eq!(h.scene.background_updates().len(), 1);

    // Tick N+1: tracking restored.
    h.session.push_frame(ScriptedFrame::tracking(Pose::IDENTITY));
    assert_eq!(h.sync.on_render_tick(), TickOutcome::Rendered);
    assert_eq!(h.scene.camera_updates().len(), cameras + 1);
    assert_eq!(h.scene.position_updates().len(), positions + 1);
}

#[test]
fn test_untracked_anchor_is_not_moved() {
    let mut h = harness(SyncConfig::default());
    place(&mut h, 0.5, -2.0);
    let anchor = h.sync.attachments().next().unwrap().anchor();
    let positions = h.scene.position_updates().len();

    h.session.set_anchor_state(anchor, TrackingState::Paused);
    h.sync.on_render_tick();
    assert_eq!(h.scene.position_updates().len(), positions);

    h.session.set_anchor_state(anchor, TrackingState::Tracking);
    h.session.set_plane_state(h.floor, TrackingState::Paused);
    h.sync.on_render_tick();
    assert_eq!(h.scene.position_updates().len(), positions);
}

#[test]
fn test_object_follows_refined_plane_height() {
    let mut h = harness(SyncConfig::default());
    place(&mut h, 0.5, -2.0);

    h.session.set_plane_center(
        h.floor,
        Pose::from_translation(Vec3::new(0.0, -1.1, -1.5)),
    );
    h.sync.on_render_tick();
    assert_eq!(
        h.scene.object_position(&earth()),
        Some(Vec3::new(0.5, -1.1, -2.0))
    );
}

// ============================================================================
// Camera, background and lighting
// ============================================================================

#[test]
fn test_camera_rotation_is_conjugated() {
    let mut h = harness(SyncConfig::default());
    let pose = Pose::new(
        Quat::from_rotation_y(0.6) * Quat::from_rotation_x(-0.2),
        Vec3::new(0.1, 1.4, 0.3),
    );
    h.session.push_frame(ScriptedFrame::tracking(pose));

    h.sync.on_render_tick();
    let camera = h.scene.last_camera().unwrap();
    assert_eq!(camera.position, pose.translation);
    assert_eq!(camera.rotation, pose.rotation.conjugate());
    assert_eq!(
        camera.projection,
        h.session.projection_matrix(0.1, 100.0).unwrap()
    );
}

#[test]
fn test_camera_texture_is_bound_each_tick() {
    let mut h = harness(SyncConfig::default());
    h.sync.on_render_tick();
    assert_eq!(h.session.camera_texture(), Some(DEFAULT_CAMERA_TEXTURE));
}

#[test]
fn test_background_uv_only_on_rotation_change() {
    let mut h = harness(SyncConfig::default());
    h.sync.on_render_tick();
    assert!(h.scene.background_updates().is_empty());

    h.session
        .push_frame(ScriptedFrame::tracking(Pose::IDENTITY).with_rotation_change(1));
    h.sync.on_render_tick();
    let updates = h.scene.background_updates();
    assert_eq!(updates.len(), 1);
    assert_ne!(updates[0], QuadUv::DEFAULT);
    assert_eq!(h.sync.background_uv(), updates[0]);
}

#[test]
fn test_surface_change_refreshes_background() {
    let mut h = harness(SyncConfig::default());
    h.sync.on_surface_changed(1920, 1080).unwrap();
    assert_eq!(h.session.display_size(), (1920, 1080));

    h.sync.on_render_tick();
    assert_eq!(h.scene.background_updates().len(), 1);
}

#[test]
fn test_rotation_change_survives_failed_background_write() {
    let mut h = harness(SyncConfig::default());
    h.session
        .push_frame(ScriptedFrame::tracking(Pose::IDENTITY).with_rotation_change(1));
    h.scene
        .fail_next(SceneOp::BackgroundUv, SceneError::Renderer("context lost".into()));

    assert!(h.sync.on_render_tick().is_abandoned());
    assert!(h.scene.background_updates().is_empty());
    assert_eq!(h.sync.background_uv(), QuadUv::DEFAULT);

    // The replayed frame no longer reports the rotation.
    assert_eq!(h.sync.on_render_tick(), TickOutcome::Rendered);
    let updates = h.scene.background_updates();
    assert_eq!(updates.len(), 1);
    assert_ne!(updates[0], QuadUv::DEFAULT);
    assert_eq!(h.sync.background_uv(), updates[0]);

    h.sync.on_render_tick();
    assert_eq!(h.scene.background_updates().len(), 1);
}

#[test]
fn test_rotation_change_survives_failed_query() {
    let mut h = harness(SyncConfig::default());
    h.session
        .push_frame(ScriptedFrame::tracking(Pose::IDENTITY).with_rotation_change(2));
    h.session
        .fail_next(ScriptedOp::Projection, TrackingError::Engine("no intrinsics".into()));

    let outcome = h.sync.on_render_tick();
    assert_eq!(outcome.error().map(TickError::stage), Some(TickStage::Projection));
    assert!(h.scene.background_updates().is_empty());

    assert_eq!(h.sync.on_render_tick(), TickOutcome::Rendered);
    assert_eq!(h.scene.background_updates().len(), 1);
    assert_ne!(h.sync.background_uv(), QuadUv::DEFAULT);
}

#[test]
fn test_failed_camera_write_keeps_applied_background() {
    let mut h = harness(SyncConfig::default());
    let earth_before = h.scene.object_position(&earth());
    h.session
        .push_frame(floor_hit_frame(&h, 0.5, -2.0).with_rotation_change(1));
    h.taps.offer(tap());
    h.scene
        .fail_next(SceneOp::CameraTransform, SceneError::Renderer("context lost".into()));

    let outcome = h.sync.on_render_tick();
    assert_eq!(outcome.error().map(TickError::stage), Some(TickStage::SceneCommit));

    // Writes are applied in order: the background landed before the camera failed.
    let updates = h.scene.background_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(h.sync.background_uv(), updates[0]);
    assert!(h.scene.camera_updates().is_empty());

    // The placement is rolled back and the object never moved.
    assert_eq!(h.sync.anchor_count(), 0);
    assert!(h.session.live_anchors().is_empty());
    assert_eq!(h.scene.object_position(&earth()), earth_before);

    // Nothing is left pending for the next tick.
    assert_eq!(h.sync.on_render_tick(), TickOutcome::Rendered);
    assert_eq!(h.scene.background_updates().len(), 1);
    assert_eq!(h.scene.camera_updates().len(), 1);
}

#[test]
fn test_light_estimate_forwarding() {
    let mut h = harness(SyncConfig::default());
    h.session
        .push_frame(ScriptedFrame::tracking(Pose::IDENTITY).with_light(0.8));
    h.sync.on_render_tick();
    assert!(h.scene.light_updates().is_empty());

    let mut h = harness(SyncConfig::default().with_light_estimate(true));
    h.session
        .push_frame(ScriptedFrame::tracking(Pose::IDENTITY).with_light(0.8));
    h.sync.on_render_tick();
    assert_eq!(h.scene.light_updates(), vec![0.8]);
}

// ============================================================================
// First plane notification
// ============================================================================

#[test]
fn test_first_plane_notification_fires_once() {
    let mut h = harness(SyncConfig::default());

    for _ in 0..10 {
        h.sync.on_render_tick();
    }

    assert!(h.sync.first_plane_found());
    assert!(!h.indicator.is_shown());
    assert_eq!(h.indicator.dismissals(), 1);
    assert_eq!(h.sync.snapshot().first_plane_notifications, 1);

    // Showing the message again does not re-arm the latch.
    h.indicator.show();
    h.sync.on_render_tick();
    assert_eq!(h.indicator.dismissals(), 1);
}

#[test]
fn test_first_plane_requires_type_and_tracking() {
    let session = ScriptedSession::new();
    let wall = session.add_plane(PlaneType::Vertical, Pose::IDENTITY);
    let floor = session.add_plane(PlaneType::HorizontalUpward, Pose::IDENTITY);
    session.set_plane_state(floor, TrackingState::Paused);

    let (_taps, tap_rx) = tap_queue(4);
    let indicator = Arc::new(SearchIndicator::shown());
    let mut sync = PoseSyncLoop::new(
        session.clone(),
        RecordingScene::new(),
        tap_rx,
        indicator.clone(),
        SyncConfig::default(),
    );

    sync.on_render_tick();
    assert!(!sync.first_plane_found());
    assert!(indicator.is_shown());

    session.set_plane_state(floor, TrackingState::Tracking);
    sync.on_render_tick();
    assert!(sync.first_plane_found());
    assert_eq!(indicator.dismissals(), 1);

    // The wall was never a candidate
    session.set_plane_state(wall, TrackingState::Paused);
    sync.on_render_tick();
    assert_eq!(indicator.dismissals(), 1);
}

#[test]
fn test_not_tracking_does_not_notify() {
    let mut h = harness(SyncConfig::default());
    h.session.push_frame(ScriptedFrame::not_tracking());
    h.sync.on_render_tick();
    assert!(!h.sync.first_plane_found());
    assert!(h.indicator.is_shown());
}

// ============================================================================
// Fault isolation
// ============================================================================

#[test]
fn test_frame_failure_abandons_tick_and_keeps_tap() {
    let mut h = harness(SyncConfig::default());
    h.session
        .push_frame_error(TrackingError::FrameUnavailable("camera busy".into()));
    h.taps.offer(tap());

    let outcome = h.sync.on_render_tick();
    assert_eq!(outcome.error().map(TickError::stage), Some(TickStage::AcquireFrame));
    assert_eq!(h.scene.write_count(), 0);
    assert_eq!(h.taps.pending(), 1);

    // The next tick picks the tap up.
    h.session.push_frame(floor_hit_frame(&h, 0.0, -1.0));
    assert_eq!(h.sync.on_render_tick(), TickOutcome::Rendered);
    assert_eq!(h.sync.anchor_count(), 1);
}

#[test]
fn test_paused_session_abandons_tick() {
    let mut h = harness(SyncConfig::default());
    h.session.pause();

    let outcome = h.sync.on_render_tick();
    assert_eq!(
        outcome,
        TickOutcome::Abandoned(TickError::Tracking {
            stage: TickStage::AcquireFrame,
            source: TrackingError::SessionPaused,
        })
    );

    h.session.resume();
    assert!(h.sync.on_render_tick().is_rendered());
    assert_eq!(h.sync.snapshot().ticks_abandoned, 1);
}

#[test]
fn test_failed_tick_rolls_back_new_anchor() {
    let mut h = harness(SyncConfig::default());
    h.session
        .fail_next(ScriptedOp::Projection, TrackingError::Engine("no intrinsics".into()));

    let outcome = place(&mut h, 0.5, -2.0);
    assert_eq!(outcome.error().map(TickError::stage), Some(TickStage::Projection));

    assert_eq!(h.sync.anchor_count(), 0);
    assert_eq!(h.session.created_anchors().len(), 1);
    assert!(h.session.live_anchors().is_empty());
    assert_eq!(h.scene.write_count(), 0);
    assert_eq!(h.sync.snapshot().anchors_rolled_back, 1);
}

#[test]
fn test_failed_tick_keeps_previous_anchor() {
    let mut h = harness(SyncConfig::default());
    place(&mut h, 0.5, -2.0);
    let original = *h.sync.attachments().next().unwrap();

    h.session
        .fail_next(ScriptedOp::AnchorQuery, TrackingError::Engine("stale".into()));
    let outcome = place(&mut h, 1.0, -1.0);
    assert_eq!(outcome.error().map(TickError::stage), Some(TickStage::AnchorPose));

    let held: Vec<_> = h.sync.attachments().copied().collect();
    assert_eq!(held, vec![original]);
    assert_eq!(h.session.live_anchors(), vec![original.anchor()]);
    assert!(!h.session.released_anchors().contains(&original.anchor()));
}

#[test]
fn test_scene_failure_rolls_back() {
    let mut h = harness(SyncConfig::default());
    h.scene
        .fail_next_write(SceneError::Renderer("context lost".into()));

    let outcome = place(&mut h, 0.5, -2.0);
    assert_eq!(outcome.error().map(TickError::stage), Some(TickStage::SceneCommit));
    assert_eq!(h.sync.anchor_count(), 0);
    assert!(h.session.live_anchors().is_empty());
    assert!(!h.sync.first_plane_found());
}

#[test]
fn test_create_anchor_failure_leaves_set_untouched() {
    let mut h = harness(SyncConfig::default());
    place(&mut h, 0.5, -2.0);
    let original = *h.sync.attachments().next().unwrap();

    h.session
        .fail_next(ScriptedOp::CreateAnchor, TrackingError::Engine("limit".into()));
    let outcome = place(&mut h, 1.0, -1.0);
    assert_eq!(outcome.error().map(TickError::stage), Some(TickStage::CreateAnchor));
    assert_eq!(h.sync.attachments().copied().collect::<Vec<_>>(), vec![original]);
    assert!(h.session.released_anchors().is_empty());
}

#[test]
fn test_evicted_release_failure_still_commits() {
    let mut h = harness(SyncConfig::default());
    place(&mut h, 0.5, -2.0);

    h.session
        .fail_next(ScriptedOp::ReleaseAnchors, TrackingError::Engine("busy".into()));
    assert_eq!(place(&mut h, 1.0, -1.0), TickOutcome::Rendered);
    assert_eq!(h.sync.anchor_count(), 1);
    assert_eq!(h.session.live_anchors().len(), 2);
}

#[test]
fn test_hit_test_failure_abandons_tick() {
    let mut h = harness(SyncConfig::default());
    h.session.push_frame(
        ScriptedFrame::tracking(Pose::IDENTITY)
            .with_hit_error(TrackingError::Engine("ray cast".into())),
    );
    h.taps.offer(tap());

    let outcome = h.sync.on_render_tick();
    assert_eq!(outcome.error().map(TickError::stage), Some(TickStage::HitTest));
    assert_eq!(h.scene.write_count(), 0);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_clear_anchors_releases_everything() {
    let mut h = harness(SyncConfig::default().with_max_anchors(2));
    place(&mut h, 0.0, -1.0);
    place(&mut h, 1.0, -1.0);

    assert_eq!(h.sync.clear_anchors(), Ok(2));
    assert_eq!(h.sync.anchor_count(), 0);
    assert!(h.session.live_anchors().is_empty());
    assert_eq!(h.sync.clear_anchors(), Ok(0));
}

#[test]
fn test_clear_anchors_failure_keeps_set() {
    let mut h = harness(SyncConfig::default());
    place(&mut h, 0.0, -1.0);

    h.session
        .fail_next(ScriptedOp::ReleaseAnchors, TrackingError::Engine("busy".into()));
    let err = h.sync.clear_anchors().unwrap_err();
    assert_eq!(err.stage(), TickStage::ReleaseAnchors);
    assert_eq!(h.sync.anchor_count(), 1);
}

#[test]
fn test_surface_change_failure_is_reported() {
    let mut h = harness(SyncConfig::default());
    h.session
        .fail_next(ScriptedOp::DisplayGeometry, TrackingError::Engine("gone".into()));
    let err = h.sync.on_surface_changed(10, 10).unwrap_err();
    assert_eq!(err.stage(), TickStage::DisplayGeometry);
}
