//! Renderer-side contract of the pose-sync loop.
//!
//! The scene graph is an external rendering engine. The loop only needs to
//! move the camera, retexture the background quad and reposition the object
//! pinned to the current anchor, so that is all [`SceneGraph`] exposes.
//!
//! [`RecordingScene`] is an in-memory implementation for tests and the CLI
//! simulation. [`SearchIndicator`] is a ready-made [`SurfaceSearchListener`].

mod indicator;
mod recording;
mod traits;
mod types;

pub use indicator::SearchIndicator;
pub use recording::{RecordingScene, SceneOp, DEFAULT_CAMERA_TEXTURE};
pub use traits::{SceneGraph, SurfaceSearchListener};
pub use types::{CameraTransform, ObjectId, QuadUv, SceneError, TextureId};
