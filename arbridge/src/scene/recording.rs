//! In-memory scene graph that records every write.
//!
//! Used as a test double for the pose-sync loop and as the render target of
//! the CLI simulation. Clones share state, so a test can keep a handle while
//! the loop owns another.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;
use parking_lot::Mutex;

use super::traits::SceneGraph;
use super::types::{CameraTransform, ObjectId, QuadUv, SceneError, TextureId};

/// Camera texture name used by [`RecordingScene::new`].
pub const DEFAULT_CAMERA_TEXTURE: TextureId = TextureId(1);

/// Scene writes that can be scripted to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneOp {
    CameraTransform,
    BackgroundUv,
    ObjectPosition,
    LightIntensity,
}

#[derive(Debug, Default)]
struct RecordingInner {
    texture: TextureId,
    objects: HashMap<ObjectId, Vec3>,
    camera_updates: Vec<CameraTransform>,
    background_updates: Vec<QuadUv>,
    position_updates: Vec<(ObjectId, Vec3)>,
    light_updates: Vec<f32>,
    fail_next: Option<SceneError>,
    failures: HashMap<SceneOp, SceneError>,
}

impl RecordingInner {
    fn take_failure(&mut self, op: SceneOp) -> Result<(), SceneError> {
        if let Some(err) = self.fail_next.take() {
            return Err(err);
        }
        match self.failures.remove(&op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Scene graph double that records camera, background and object writes.
#[derive(Debug, Clone, Default)]
pub struct RecordingScene {
    inner: Arc<Mutex<RecordingInner>>,
}

impl RecordingScene {
    /// A scene with an `earth` object 3m ahead and a `moon` 1m ahead.
    pub fn new() -> Self {
        Self::empty()
            .with_object("earth", Vec3::new(0.0, 0.0, -3.0))
            .with_object("moon", Vec3::new(0.0, 0.0, -1.0))
    }

    /// A scene with no objects.
    pub fn empty() -> Self {
        let scene = Self::default();
        scene.inner.lock().texture = DEFAULT_CAMERA_TEXTURE;
        scene
    }

    /// Add an object at an initial position.
    pub fn with_object(self, id: impl Into<ObjectId>, position: Vec3) -> Self {
        self.inner.lock().objects.insert(id.into(), position);
        self
    }

    /// Use a different camera texture name.
    pub fn with_texture(self, texture: TextureId) -> Self {
        self.inner.lock().texture = texture;
        self
    }

    /// Make the next scene write fail with `err`.
    pub fn fail_next_write(&self, err: SceneError) {
        self.inner.lock().fail_next = Some(err);
    }

    /// Make the next write of kind `op` fail with `err`. Other writes succeed.
    pub fn fail_next(&self, op: SceneOp, err: SceneError) {
        self.inner.lock().failures.insert(op, err);
    }

    /// Current position of an object.
    pub fn object_position(&self, id: &ObjectId) -> Option<Vec3> {
        self.inner.lock().objects.get(id).copied()
    }

    pub fn camera_updates(&self) -> Vec<CameraTransform> {
        self.inner.lock().camera_updates.clone()
    }

    pub fn last_camera(&self) -> Option<CameraTransform> {
        self.inner.lock().camera_updates.last().copied()
    }

    pub fn background_updates(&self) -> Vec<QuadUv> {
        self.inner.lock().background_updates.clone()
    }

    pub fn position_updates(&self) -> Vec<(ObjectId, Vec3)> {
        self.inner.lock().position_updates.clone()
    }

    pub fn light_updates(&self) -> Vec<f32> {
        self.inner.lock().light_updates.clone()
    }

    /// Total number of successful writes of any kind.
    pub fn write_count(&self) -> usize {
        let inner = self.inner.lock();
        inner.camera_updates.len()
            + inner.background_updates.len()
            + inner.position_updates.len()
            + inner.light_updates.len()
    }
}

impl SceneGraph for RecordingScene {
    fn camera_texture(&self) -> TextureId {
        self.inner.lock().texture
    }

    fn set_camera_transform(&mut self, camera: &CameraTransform) -> Result<(), SceneError> {
        let mut inner = self.inner.lock();
        inner.take_failure(SceneOp::CameraTransform)?;
        inner.camera_updates.push(*camera);
        Ok(())
    }

    fn set_background_uv(&mut self, coords: &QuadUv) -> Result<(), SceneError> {
        let mut inner = self.inner.lock();
        inner.take_failure(SceneOp::BackgroundUv)?;
        inner.background_updates.push(*coords);
        Ok(())
    }

    fn set_object_position(
        &mut self,
        object: &ObjectId,
        position: Vec3,
    ) -> Result<(), SceneError> {
        let mut inner = self.inner.lock();
        inner.take_failure(SceneOp::ObjectPosition)?;
        match inner.objects.get_mut(object) {
            Some(current) => *current = position,
            None => return Err(SceneError::UnknownObject(object.clone())),
        }
        inner.position_updates.push((object.clone(), position));
        Ok(())
    }

    fn set_light_intensity(&mut self, intensity: f32) -> Result<(), SceneError> {
        let mut inner = self.inner.lock();
        inner.take_failure(SceneOp::LightIntensity)?;
        inner.light_updates.push(intensity);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    #[test]
    fn test_default_scene_objects() {
        let scene = RecordingScene::new();
        assert_eq!(
            scene.object_position(&ObjectId::from("earth")),
            Some(Vec3::new(0.0, 0.0, -3.0))
        );
        assert_eq!(scene.camera_texture(), DEFAULT_CAMERA_TEXTURE);
    }

    #[test]
    fn test_records_object_moves() {
        let mut scene = RecordingScene::new();
        let earth = ObjectId::from("earth");

        scene
            .set_object_position(&earth, Vec3::new(1.0, 0.0, -1.0))
            .unwrap();

        assert_eq!(scene.object_position(&earth), Some(Vec3::new(1.0, 0.0, -1.0)));
        assert_eq!(scene.position_updates().len(), 1);
    }

    #[test]
    fn test_unknown_object_is_rejected() {
        let mut scene = RecordingScene::empty();
        let err = scene
            .set_object_position(&ObjectId::from("ghost"), Vec3::ZERO)
            .unwrap_err();
        assert_eq!(err, SceneError::UnknownObject(ObjectId::from("ghost")));
        assert_eq!(scene.write_count(), 0);
    }

    #[test]
    fn test_fail_next_write_is_one_shot() {
        let mut scene = RecordingScene::new();
        scene.fail_next_write(SceneError::Renderer("context lost".into()));

        let camera = CameraTransform {
            rotation: glam::Quat::IDENTITY,
            position: Vec3::ZERO,
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
        };
        assert!(scene.set_camera_transform(&camera).is_err());
        assert!(scene.set_camera_transform(&camera).is_ok());
        assert_eq!(scene.camera_updates().len(), 1);
    }

    #[test]
    fn test_fail_next_targets_one_kind_of_write() {
        let mut scene = RecordingScene::new();
        scene.fail_next(SceneOp::CameraTransform, SceneError::Renderer("lost".into()));

        scene.set_background_uv(&QuadUv::DEFAULT).unwrap();
        scene
            .set_object_position(&ObjectId::from("moon"), Vec3::ONE)
            .unwrap();

        let camera = CameraTransform {
            rotation: glam::Quat::IDENTITY,
            position: Vec3::ZERO,
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
        };
        assert!(scene.set_camera_transform(&camera).is_err());
        assert!(scene.set_camera_transform(&camera).is_ok());
        assert_eq!(scene.write_count(), 3);
    }

    #[test]
    fn test_clones_share_state() {
        let scene = RecordingScene::new();
        let mut handle = scene.clone();
        handle.set_background_uv(&QuadUv::DEFAULT).unwrap();
        assert_eq!(scene.background_updates(), vec![QuadUv::DEFAULT]);
    }
}
