//! Joint layer configuration

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::scene::SceneError;

/// What to do with a descriptor whose bodies are not registered yet
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub enum UnresolvedBodyPolicy {
    /// Keep the descriptor pending and try again next frame
    #[default]
    Retry,
    /// Report the failure and drop the descriptor
    Discard,
}

/// Settings for loading and materializing joint scenes
#[derive(Resource, Clone, Debug, Reflect, Serialize, Deserialize)]
#[reflect(Resource, Default)]
#[serde(default)]
pub struct JointLayerSettings {
    /// Uniform factor applied to every loaded scene's anchors, e.g. a pixel density
    pub scale_factor: Option<f32>,
    pub unresolved_body_policy: UnresolvedBodyPolicy,
    /// Upper bound on creation attempts per frame, `None` for no limit
    pub max_joints_per_frame: Option<usize>,
}

impl Default for JointLayerSettings {
    fn default() -> Self {
        Self {
            scale_factor: None,
            unresolved_body_policy: UnresolvedBodyPolicy::Retry,
            max_joints_per_frame: None,
        }
    }
}

impl JointLayerSettings {
    pub fn with_scale_factor(mut self, factor: f32) -> Self {
        self.scale_factor = Some(factor);
        self
    }

    pub fn with_policy(mut self, policy: UnresolvedBodyPolicy) -> Self {
        self.unresolved_body_policy = policy;
        self
    }

    pub fn from_ron_str(source: &str) -> Result<Self, SceneError> {
        ron::from_str(source).map_err(|e| SceneError::SerializationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_partial_ron() {
        let settings = JointLayerSettings::from_ron_str("(scale_factor: Some(2.0))").unwrap();

        assert_eq!(settings.scale_factor, Some(2.0));
        assert_eq!(settings.unresolved_body_policy, UnresolvedBodyPolicy::Retry);
        assert!(settings.max_joints_per_frame.is_none());
    }
}
