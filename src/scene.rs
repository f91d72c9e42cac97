//! Joint scene files
//!
//! A scene is the declarative input of the joint layer: a list of descriptors and an
//! optional uniform scale. Scenes are read from RON (`.ron`, `.scn`) or JSON (`.json`).
//! Options a descriptor does not recognize are ignored.
//!
//! ```ron
//! (
//!     scale: Some(2.0),
//!     joints: [
//!         (
//!             id: "rope",
//!             body_id1: "ceiling",
//!             body_id2: "bob",
//!             body_point1: Some((x: 0.0, y: -10.0)),
//!             attributes: {"stiffness": 50.0},
//!             joint: Distance((body_point2: None)),
//!         ),
//!     ],
//! )
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::joints::{JointDescriptor, JointId, ScaleFactor, ScaleOutcome};

/// Scene loading errors
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("File error: {0}")]
    FileError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Unsupported scene format: {0:?}")]
    UnsupportedFormat(PathBuf),
    #[error("Duplicate joint id: {0}")]
    DuplicateJointId(JointId),
}

/// A set of joint descriptors destined for one simulation world
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JointScene {
    /// Scale authored into the scene itself
    #[serde(default)]
    pub scale: Option<f32>,
    #[serde(default)]
    pub joints: Vec<JointDescriptor>,
}

impl JointScene {
    pub fn new(joints: Vec<JointDescriptor>) -> Self {
        Self { scale: None, joints }
    }

    pub fn from_ron_str(source: &str) -> Result<Self, SceneError> {
        let scene: Self =
            ron::from_str(source).map_err(|e| SceneError::SerializationError(e.to_string()))?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn from_json_str(source: &str) -> Result<Self, SceneError> {
        let scene: Self = serde_json::from_str(source)
            .map_err(|e| SceneError::SerializationError(e.to_string()))?;
        scene.validate()?;
        Ok(scene)
    }

    /// Load a scene, picking the format from the file extension
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let source =
            std::fs::read_to_string(path).map_err(|e| SceneError::FileError(e.to_string()))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("ron" | "scn") => Self::from_ron_str(&source),
            Some("json") => Self::from_json_str(&source),
            _ => Err(SceneError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    pub fn to_ron_string(&self) -> Result<String, SceneError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SceneError::SerializationError(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<(), SceneError> {
        let data = match path.extension().and_then(|ext| ext.to_str()) {
            Some("ron" | "scn") => self.to_ron_string()?,
            Some("json") => serde_json::to_string_pretty(self)
                .map_err(|e| SceneError::SerializationError(e.to_string()))?,
            _ => return Err(SceneError::UnsupportedFormat(path.to_path_buf())),
        };
        std::fs::write(path, data).map_err(|e| SceneError::FileError(e.to_string()))
    }

    /// Joint ids must be unique within a scene
    pub fn validate(&self) -> Result<(), SceneError> {
        let mut seen = HashSet::new();
        for joint in &self.joints {
            if !seen.insert(joint.id()) {
                return Err(SceneError::DuplicateJointId(joint.id().clone()));
            }
        }
        Ok(())
    }

    /// Combined factor of the scene's own scale and an externally supplied one.
    ///
    /// Each side is validated on its own; an invalid factor counts as absent.
    pub fn effective_scale(&self, external: Option<f32>) -> Option<f32> {
        let own = self.scale.and_then(ScaleFactor::new);
        let external = external.and_then(ScaleFactor::new);
        match (own, external) {
            (Some(own), Some(external)) => Some(own.get() * external.get()),
            (own, external) => own.or(external).map(ScaleFactor::get),
        }
    }

    /// Scale every descriptor once. Returns how many descriptors were scaled.
    pub fn apply_scale(&mut self, external: Option<f32>) -> usize {
        let Some(factor) = self.effective_scale(external) else {
            return 0;
        };

        self.joints
            .iter_mut()
            .map(|joint| joint.scale(factor))
            .filter(|outcome| *outcome == ScaleOutcome::Applied)
            .count()
    }
}
