//! Joint descriptors
//!
//! A [`JointDescriptor`] is the declarative form of one constraint between two bodies.
//! It names its bodies by [`BodyId`] and stores anchors in body-local space. Nothing in
//! a descriptor points at live simulation state; bodies are only resolved when the
//! descriptor is materialized through [`create_constraint`](super::create_constraint).
//!
//! ## Lifecycle
//! - **Defined**: freshly constructed or loaded from a scene.
//! - **Scaled**: every local anchor has been multiplied by one uniform factor.
//! - **Materialized**: a live constraint exists in a simulation world under [`JointDescriptor::id`].
//!
//! Retiring the live constraint belongs to the adapter. A retired descriptor can be
//! materialized again under a fresh id with [`JointDescriptor::reissued`].

use std::fmt;

use bevy::math::Vec2;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::definition::NativeDefinition;
use super::point::{Point, ScaleFactor};
use super::variants::JointKind;
use crate::adapter::BodyFrame;

/// Stable identifier of a joint, unique within one simulation world.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JointId(String);

impl JointId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a random id, used when a descriptor is reissued after a world rebuild
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JointId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for JointId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Stable identifier of a body in the simulation world's body registry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BodyId(String);

impl BodyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BodyId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for BodyId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Engine-specific constraint parameters merged over a definition at creation time.
///
/// The merge is shallow: each top-level key replaces the whole field of the same name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JointAttributes(Map<String, Value>);

impl JointAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for JointAttributes {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

/// Where a descriptor is in its lifecycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JointState {
    #[default]
    Defined,
    Scaled,
    /// A live constraint was created from this descriptor
    Materialized {
        /// Whether the anchors had been scaled before materializing
        scaled: bool,
    },
}

impl JointState {
    pub fn is_scaled(self) -> bool {
        matches!(self, Self::Scaled | Self::Materialized { scaled: true })
    }

    pub fn is_materialized(self) -> bool {
        matches!(self, Self::Materialized { .. })
    }
}

/// Result of a [`JointDescriptor::scale`] request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleOutcome {
    /// Every local anchor was multiplied by the factor
    Applied,
    /// The descriptor was already scaled, geometry unchanged
    AlreadyScaled,
    /// The factor was zero, negative or non-finite, geometry unchanged
    NoFactor,
    /// The descriptor already backs a live constraint, geometry unchanged
    Materialized,
}

/// Capability set every joint kind provides.
///
/// New joint kinds implement this trait (and the adapter implements
/// [`JointBuilder`](crate::adapter::JointBuilder) for their definition); the shared
/// guard and attribute merge in [`create_constraint`](super::create_constraint) stay as they are.
pub trait JointVariant {
    /// The native-shaped definition this kind builds
    type Definition: NativeDefinition;

    /// Short human readable kind name, used in logs
    fn kind(&self) -> &'static str;

    /// Scale the local anchors owned by this variant.
    ///
    /// Called at most once per descriptor, before the shared first anchor is scaled.
    fn scale_anchors(&mut self, _factor: ScaleFactor) {}

    /// Build the definition from resolved bodies.
    ///
    /// `anchor1` is the world-space first anchor, already resolved from
    /// [`JointDescriptor::body_point1`] or body 1's world center.
    fn build_definition<B: BodyFrame>(&self, anchor1: Vec2, body1: &B, body2: &B)
    -> Self::Definition;
}

/// Declarative joint between two bodies
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointDescriptor<V = JointKind> {
    id: JointId,
    /// First body, resolved only at creation time
    #[serde(alias = "bodyId1")]
    pub body_id1: BodyId,
    /// Second body, resolved only at creation time
    #[serde(alias = "bodyId2")]
    pub body_id2: BodyId,
    /// Anchor on body 1 in its local space, `None` means body 1's world center
    #[serde(default, alias = "bodyPoint1")]
    pub body_point1: Option<Point>,
    #[serde(default, alias = "jointAttributes")]
    pub attributes: JointAttributes,
    /// Kind-specific payload
    pub joint: V,
    /// Persisted as `scaled: true` so a saved scaled descriptor is not scaled again on load
    #[serde(
        default,
        rename = "scaled",
        with = "scaled_flag",
        skip_serializing_if = "is_unscaled"
    )]
    state: JointState,
}

fn is_unscaled(state: &JointState) -> bool {
    !state.is_scaled()
}

/// `JointState` on disk: only whether the anchors were scaled survives a save
mod scaled_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::JointState;

    pub fn serialize<S: Serializer>(state: &JointState, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(state.is_scaled())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<JointState, D::Error> {
        Ok(if bool::deserialize(deserializer)? {
            JointState::Scaled
        } else {
            JointState::Defined
        })
    }
}

impl<V: JointVariant> JointDescriptor<V> {
    pub fn new(
        id: impl Into<JointId>,
        body_id1: impl Into<BodyId>,
        body_id2: impl Into<BodyId>,
        joint: V,
    ) -> Self {
        Self {
            id: id.into(),
            body_id1: body_id1.into(),
            body_id2: body_id2.into(),
            body_point1: None,
            attributes: JointAttributes::default(),
            joint,
            state: JointState::Defined,
        }
    }

    pub fn with_body_point1(mut self, point: impl Into<Point>) -> Self {
        self.body_point1 = Some(point.into());
        self
    }

    pub fn with_attributes(mut self, attributes: JointAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key, value);
        self
    }

    pub fn id(&self) -> &JointId {
        &self.id
    }

    pub fn state(&self) -> JointState {
        self.state
    }

    pub fn kind(&self) -> &'static str {
        self.joint.kind()
    }

    /// Multiply every local anchor by `factor`, at most once.
    ///
    /// Variant anchors are scaled first, then the shared first anchor. Missing anchors are
    /// skipped. Ids, body ids and attributes are never touched.
    pub fn scale(&mut self, factor: f32) -> ScaleOutcome {
        let Some(factor) = ScaleFactor::new(factor) else {
            debug!("Joint {}: ignoring scale factor {}", self.id, factor);
            return ScaleOutcome::NoFactor;
        };

        match self.state {
            JointState::Defined => {
                self.joint.scale_anchors(factor);
                if let Some(point) = self.body_point1.as_mut() {
                    point.scale(factor);
                }
                self.state = JointState::Scaled;
                ScaleOutcome::Applied
            }
            JointState::Scaled => {
                debug!("Joint {} is already scaled", self.id);
                ScaleOutcome::AlreadyScaled
            }
            JointState::Materialized { .. } => {
                debug!("Joint {} is materialized, not scaling", self.id);
                ScaleOutcome::Materialized
            }
        }
    }

    /// World-space first anchor against a resolved body 1
    pub fn world_anchor1<B: BodyFrame>(&self, body1: &B) -> Vec2 {
        resolve_anchor(self.body_point1, body1)
    }

    /// Copy of this descriptor under a freshly generated id, ready to be materialized
    /// into a rebuilt world. Scaled geometry is kept.
    pub fn reissued(&self) -> Self
    where
        V: Clone,
    {
        Self {
            id: JointId::generate(),
            state: if self.state.is_scaled() {
                JointState::Scaled
            } else {
                JointState::Defined
            },
            ..self.clone()
        }
    }

    pub(crate) fn mark_materialized(&mut self) {
        self.state = JointState::Materialized {
            scaled: self.state.is_scaled(),
        };
    }
}

/// Local anchor to world space, or the body's world center when there is no anchor
pub fn resolve_anchor<B: BodyFrame>(point: Option<Point>, body: &B) -> Vec2 {
    match point {
        Some(point) => body.local_to_world(point.to_vec2()),
        None => body.world_center(),
    }
}
