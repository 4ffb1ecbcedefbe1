//! Per-tick result types.
//!
//! Every collaborator call inside a render tick goes through [`StageExt::at`],
//! which tags its error with the [`TickStage`] it happened in. The tick then
//! either completes ([`TickOutcome::Rendered`] / [`TickOutcome::NotTracking`])
//! or is abandoned as a whole ([`TickOutcome::Abandoned`]).

use std::fmt;

use thiserror::Error;

use crate::scene::SceneError;
use crate::tracking::TrackingError;

/// The step of a render tick a collaborator call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickStage {
    BindCameraTexture,
    AcquireFrame,
    BackgroundUv,
    HitTest,
    CreateAnchor,
    Projection,
    PlaneScan,
    AnchorPose,
    SceneCommit,
    DisplayGeometry,
    ReleaseAnchors,
}

impl TickStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TickStage::BindCameraTexture => "bind camera texture",
            TickStage::AcquireFrame => "acquire frame",
            TickStage::BackgroundUv => "background uv",
            TickStage::HitTest => "hit test",
            TickStage::CreateAnchor => "create anchor",
            TickStage::Projection => "projection",
            TickStage::PlaneScan => "plane scan",
            TickStage::AnchorPose => "anchor pose",
            TickStage::SceneCommit => "scene commit",
            TickStage::DisplayGeometry => "display geometry",
            TickStage::ReleaseAnchors => "release anchors",
        }
    }
}

impl fmt::Display for TickStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A collaborator fault, tagged with the stage it occurred in.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TickError {
    #[error("{stage} failed: {source}")]
    Tracking {
        stage: TickStage,
        #[source]
        source: TrackingError,
    },

    #[error("{stage} failed: {source}")]
    Scene {
        stage: TickStage,
        #[source]
        source: SceneError,
    },
}

impl TickError {
    pub fn stage(&self) -> TickStage {
        match self {
            TickError::Tracking { stage, .. } | TickError::Scene { stage, .. } => *stage,
        }
    }
}

/// Attach a [`TickStage`] to a collaborator result.
pub trait StageExt<T> {
    fn at(self, stage: TickStage) -> Result<T, TickError>;
}

impl<T> StageExt<T> for Result<T, TrackingError> {
    fn at(self, stage: TickStage) -> Result<T, TickError> {
        self.map_err(|source| TickError::Tracking { stage, source })
    }
}

impl<T> StageExt<T> for Result<T, SceneError> {
    fn at(self, stage: TickStage) -> Result<T, TickError> {
        self.map_err(|source| TickError::Scene { stage, source })
    }
}

/// What a single render tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Camera and anchors were pushed to the scene.
    Rendered,
    /// Tracking was lost; only tap handling and background UVs ran.
    NotTracking,
    /// A collaborator failed. Anchor changes were rolled back; scene writes
    /// applied before a failing scene write remain.
    Abandoned(TickError),
}

impl TickOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, TickOutcome::Rendered)
    }

    pub fn is_abandoned(&self) -> bool {
        matches!(self, TickOutcome::Abandoned(_))
    }

    pub fn error(&self) -> Option<&TickError> {
        match self {
            TickOutcome::Abandoned(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_tagging() {
        let result: Result<(), TrackingError> = Err(TrackingError::SessionPaused);
        let err = result.at(TickStage::AcquireFrame).unwrap_err();
        assert_eq!(err.stage(), TickStage::AcquireFrame);
        assert_eq!(
            err.to_string(),
            "acquire frame failed: Tracking session is paused"
        );
    }

    #[test]
    fn test_scene_error_tagging() {
        let result: Result<(), SceneError> = Err(SceneError::Renderer("lost context".into()));
        let err = result.at(TickStage::SceneCommit).unwrap_err();
        assert!(matches!(err, TickError::Scene { .. }));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_outcome_helpers() {
        assert!(TickOutcome::Rendered.is_rendered());
        assert!(!TickOutcome::NotTracking.is_rendered());

        let abandoned = TickOutcome::Abandoned(TickError::Tracking {
            stage: TickStage::HitTest,
            source: TrackingError::Engine("boom".into()),
        });
        assert!(abandoned.is_abandoned());
        assert_eq!(abandoned.error().map(TickError::stage), Some(TickStage::HitTest));
    }
}
