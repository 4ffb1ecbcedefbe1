//! Scripted AR world for the `run` command.
//!
//! A single floor plane is detected shortly after start. The camera sways
//! gently, tracking drops out for half a second every ten seconds and the
//! display rotates now and then, so every branch of the render tick gets
//! exercised. Taps are mapped onto the floor by a hit resolver.

use std::sync::Arc;

use glam::{Quat, Vec3};

use arbridge::pose::Pose;
use arbridge::scene::{ObjectId, RecordingScene};
use arbridge::tracking::{
    HitResult, Plane, PlaneHandle, PlaneHit, PlaneType, ScriptedFrame, ScriptedSession, TapEvent,
    TrackingState, DEFAULT_DISPLAY_SIZE,
};

/// Tick at which the floor plane starts tracking.
pub const PLANE_DETECTED_TICK: u64 = 45;

/// Tracking is lost for `TRACKING_LOSS_TICKS` ticks, starting at
/// `TRACKING_LOSS_START`, once every period.
pub const TRACKING_LOSS_PERIOD: u64 = 600;
pub const TRACKING_LOSS_START: u64 = 420;
pub const TRACKING_LOSS_TICKS: u64 = 30;

/// The display rotates once every period.
pub const ROTATION_PERIOD: u64 = 900;

/// Floor center, 1.2m below the camera and 1.5m ahead.
const FLOOR_CENTER: Vec3 = Vec3::new(0.0, -1.2, -1.5);

/// Half extents of the floor polygon along x and z.
const FLOOR_HALF_EXTENTS: (f32, f32) = (1.2, 1.5);

/// The simulated session and scene, plus the floor they share.
pub struct SimulatedWorld {
    pub session: ScriptedSession,
    pub scene: RecordingScene,
    pub floor: PlaneHandle,
}

impl SimulatedWorld {
    /// Build the world; `tracked` is added to the scene if it is not there yet.
    pub fn new(tracked: &ObjectId) -> Self {
        let session = ScriptedSession::new();
        let floor = session.add_plane(
            PlaneType::HorizontalUpward,
            Pose::from_translation(FLOOR_CENTER),
        );
        session.set_plane_state(floor, TrackingState::NotTracking);
        session.set_hit_resolver(Arc::new(resolve_floor_hits));

        let mut scene = RecordingScene::new();
        if scene.object_position(tracked).is_none() {
            scene = scene.with_object(tracked.clone(), Vec3::new(0.0, 0.0, -3.0));
        }

        Self {
            session,
            scene,
            floor,
        }
    }

    /// Script the session for render tick `tick`.
    pub fn advance(&self, tick: u64) {
        if tick == PLANE_DETECTED_TICK {
            self.session
                .set_plane_state(self.floor, TrackingState::Tracking);
        }
        self.session.push_frame(frame_for(tick));
    }
}

/// The frame served on render tick `tick`.
pub fn frame_for(tick: u64) -> ScriptedFrame {
    let t = tick as f32 / 60.0;
    let camera = Pose::new(
        Quat::from_rotation_y((t * 0.5).sin() * 0.25),
        Vec3::new((t * 0.3).sin() * 0.1, 0.0, 0.0),
    );
    let mut frame = ScriptedFrame::tracking(camera).with_light(0.6 + 0.2 * (t * 0.2).sin());

    let cycle = tick % TRACKING_LOSS_PERIOD;
    if (TRACKING_LOSS_START..TRACKING_LOSS_START + TRACKING_LOSS_TICKS).contains(&cycle) {
        frame = frame.with_state(TrackingState::NotTracking);
    }

    if tick % ROTATION_PERIOD == ROTATION_PERIOD / 2 {
        let quarter_turns = if (tick / ROTATION_PERIOD) % 2 == 0 { 1 } else { 0 };
        frame = frame.with_rotation_change(quarter_turns);
    }
    frame
}

/// Project a tap onto every tracking upward-facing plane.
///
/// The lower on screen, the closer to the camera.
pub fn resolve_floor_hits(tap: TapEvent, planes: &[Plane]) -> Vec<HitResult> {
    let (width, height) = DEFAULT_DISPLAY_SIZE;
    let nx = (tap.x / width as f32).clamp(0.0, 1.0) - 0.5;
    let ny = (tap.y / height as f32).clamp(0.0, 1.0);

    planes
        .iter()
        .filter(|plane| plane.plane_type == PlaneType::HorizontalUpward && plane.is_tracking())
        .map(|plane| {
            let center = plane.center_pose.translation;
            let point = Vec3::new(nx * 3.5, center.y, -0.3 - (1.0 - ny) * 3.5);
            let in_polygon = (point.x - center.x).abs() <= FLOOR_HALF_EXTENTS.0
                && (point.z - center.z).abs() <= FLOOR_HALF_EXTENTS.1;
            HitResult::Plane(PlaneHit {
                pose: Pose::from_translation(point),
                plane: plane.handle,
                in_polygon,
            })
        })
        .collect()
}

/// The `n`th synthetic tap, spread over the lower part of the display.
pub fn synthetic_tap(n: u64) -> TapEvent {
    const GOLDEN: f64 = 0.618_033_988_75;
    const SQRT2_FRAC: f64 = 0.414_213_562_37;
    let (width, height) = DEFAULT_DISPLAY_SIZE;
    let u = (n as f64 * GOLDEN).fract();
    let v = (n as f64 * SQRT2_FRAC).fract();
    TapEvent::new(
        (width as f64 * (0.1 + 0.8 * u)) as f32,
        (height as f64 * (0.45 + 0.5 * v)) as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbridge::tracking::{TrackingFrame, TrackingSession};

    #[test]
    fn test_floor_detected_after_delay() {
        let world = SimulatedWorld::new(&ObjectId::from("earth"));
        let plane = |w: &SimulatedWorld| w.session.plane(w.floor).unwrap();

        world.advance(0);
        assert!(!plane(&world).is_tracking());

        world.advance(PLANE_DETECTED_TICK);
        assert!(plane(&world).is_tracking());
    }

    #[test]
    fn test_custom_tracked_object_is_added() {
        let id = ObjectId::from("satellite");
        let world = SimulatedWorld::new(&id);
        assert!(world.scene.object_position(&id).is_some());
    }

    #[test]
    fn test_tracking_loss_window() {
        let lost: Vec<u64> = (0..TRACKING_LOSS_PERIOD)
            .filter(|tick| frame_for(*tick).tracking_state() == TrackingState::NotTracking)
            .collect();
        assert_eq!(lost.len() as u64, TRACKING_LOSS_TICKS);
    }

    #[test]
    fn test_rotation_changes_once_per_period() {
        let rotations = (0..ROTATION_PERIOD * 2)
            .filter(|tick| frame_for(*tick).display_rotation_changed())
            .count();
        assert_eq!(rotations, 2);
    }

    #[test]
    fn test_taps_stay_on_screen() {
        let (width, height) = DEFAULT_DISPLAY_SIZE;
        for n in 0..500 {
            let tap = synthetic_tap(n);
            assert!(tap.x >= 0.0 && tap.x <= width as f32);
            assert!(tap.y >= 0.0 && tap.y <= height as f32);
        }
    }

    #[test]
    fn test_center_tap_hits_inside_floor() {
        let floor = Plane::new(
            PlaneHandle(1),
            PlaneType::HorizontalUpward,
            Pose::from_translation(FLOOR_CENTER),
        );
        let (width, height) = DEFAULT_DISPLAY_SIZE;
        let hits = resolve_floor_hits(
            TapEvent::new(width as f32 / 2.0, height as f32 * 0.75),
            &[floor],
        );
        assert_eq!(hits.len(), 1);
        let hit = hits[0].as_plane_hit().unwrap();
        assert!(hit.in_polygon);
        assert_eq!(hit.pose.translation.y, FLOOR_CENTER.y);
    }

    #[test]
    fn test_untracked_or_vertical_planes_are_not_hit() {
        let paused = Plane::new(PlaneHandle(1), PlaneType::HorizontalUpward, Pose::IDENTITY)
            .with_state(TrackingState::Paused);
        let wall = Plane::new(PlaneHandle(2), PlaneType::Vertical, Pose::IDENTITY);
        assert!(resolve_floor_hits(TapEvent::new(500.0, 1500.0), &[paused, wall]).is_empty());
    }
}
