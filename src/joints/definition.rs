//! Native joint definitions
//!
//! Each joint kind builds a definition shaped like a physics engine's joint definition:
//! body-local anchors, a reference rest configuration and tuning fields. Definitions are
//! initialized the way Box2D's `Initialize` does it, from two resolved bodies and
//! world-space anchors. Descriptor attributes are then merged over the fields by name.

use bevy::math::Vec2;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::descriptor::JointAttributes;
use crate::adapter::BodyFrame;

/// A definition that descriptor attributes can override
pub trait NativeDefinition {
    /// Shallow-merge `attributes` over this definition's fields.
    ///
    /// Returns the attribute keys that name no field of this definition; those are ignored.
    fn apply_attributes(
        &mut self,
        attributes: &JointAttributes,
    ) -> Result<Vec<String>, serde_json::Error>;
}

/// Replace whole top-level fields of `target` with same-named attribute values.
///
/// Only serialized fields can be overridden; `#[serde(skip)]` fields come back as their
/// defaults and must be restored by the caller.
pub fn merge_attributes<T>(
    target: &mut T,
    attributes: &JointAttributes,
) -> Result<Vec<String>, serde_json::Error>
where
    T: Serialize + DeserializeOwned,
{
    if attributes.is_empty() {
        return Ok(Vec::new());
    }

    let Value::Object(mut fields) = serde_json::to_value(&*target)? else {
        return Err(serde::de::Error::custom("definition is not a record"));
    };

    let mut ignored = Vec::new();
    for (key, value) in attributes.iter() {
        if fields.contains_key(key) {
            fields.insert(key.clone(), value.clone());
        } else {
            ignored.push(key.clone());
        }
    }

    *target = serde_json::from_value(Value::Object(fields))?;
    Ok(ignored)
}

/// Keeps two anchors at a fixed distance, like a rope or a rod
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistanceJointDef {
    /// Anchor on body 1, relative to its origin
    pub local_anchor1: Vec2,
    /// Anchor on body 2, relative to its origin
    pub local_anchor2: Vec2,
    /// Resolved at creation, not overridable by attributes
    #[serde(skip)]
    pub world_anchor1: Vec2,
    #[serde(skip)]
    pub world_anchor2: Vec2,
    /// Rest length between the anchors
    pub length: f32,
    pub min_length: Option<f32>,
    pub max_length: Option<f32>,
    /// Spring stiffness (N/m), `None` keeps the distance rigid
    pub stiffness: Option<f32>,
    pub damping_linear: f32,
    pub damping_angular: f32,
    /// Whether the two bodies keep colliding with each other
    pub collide_connected: bool,
}

impl DistanceJointDef {
    pub fn initialize<B: BodyFrame>(body1: &B, body2: &B, anchor1: Vec2, anchor2: Vec2) -> Self {
        Self {
            local_anchor1: body1.world_to_local(anchor1),
            local_anchor2: body2.world_to_local(anchor2),
            world_anchor1: anchor1,
            world_anchor2: anchor2,
            length: anchor1.distance(anchor2),
            min_length: None,
            max_length: None,
            stiffness: None,
            damping_linear: 0.0,
            damping_angular: 0.0,
            collide_connected: false,
        }
    }

    /// Compliance (inverse stiffness, m/N)
    pub fn compliance(&self) -> f32 {
        match self.stiffness {
            Some(stiffness) if stiffness > 0.0 => 1.0 / stiffness,
            _ => 0.0,
        }
    }

    /// Effective `(min, max)` length limits, defaulting to the rest length
    pub fn limits(&self) -> (f32, f32) {
        (
            self.min_length.unwrap_or(self.length),
            self.max_length.unwrap_or(self.length),
        )
    }
}

/// Pins two bodies at a shared anchor, allowing relative rotation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevoluteJointDef {
    pub local_anchor1: Vec2,
    pub local_anchor2: Vec2,
    #[serde(skip)]
    pub world_anchor: Vec2,
    /// Body 2 angle minus body 1 angle at creation (radians)
    pub reference_angle: f32,
    pub min_angle: Option<f32>,
    pub max_angle: Option<f32>,
    /// Point constraint compliance (m/N)
    pub point_compliance: f32,
    /// Limit compliance (N*m/rad)
    pub limit_compliance: f32,
    pub damping_linear: f32,
    pub damping_angular: f32,
    pub collide_connected: bool,
}

impl RevoluteJointDef {
    pub fn initialize<B: BodyFrame>(body1: &B, body2: &B, anchor: Vec2) -> Self {
        Self {
            local_anchor1: body1.world_to_local(anchor),
            local_anchor2: body2.world_to_local(anchor),
            world_anchor: anchor,
            reference_angle: body2.angle() - body1.angle(),
            min_angle: None,
            max_angle: None,
            point_compliance: 0.0,
            limit_compliance: 0.0,
            damping_linear: 0.0,
            damping_angular: 0.0,
            collide_connected: false,
        }
    }
}

/// Lets body 2 slide along an axis fixed in body 1
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrismaticJointDef {
    pub local_anchor1: Vec2,
    pub local_anchor2: Vec2,
    #[serde(skip)]
    pub world_anchor: Vec2,
    /// Unit slide axis in body 1's local space
    pub local_axis1: Vec2,
    pub reference_angle: f32,
    pub min_translation: Option<f32>,
    pub max_translation: Option<f32>,
    pub axis_compliance: f32,
    pub limit_compliance: f32,
    pub angle_compliance: f32,
    pub damping_linear: f32,
    pub damping_angular: f32,
    pub collide_connected: bool,
}

impl PrismaticJointDef {
    pub fn initialize<B: BodyFrame>(body1: &B, body2: &B, anchor: Vec2, axis: Vec2) -> Self {
        Self {
            local_anchor1: body1.world_to_local(anchor),
            local_anchor2: body2.world_to_local(anchor),
            world_anchor: anchor,
            local_axis1: body1.direction_to_local(axis).normalize_or(Vec2::X),
            reference_angle: body2.angle() - body1.angle(),
            min_translation: None,
            max_translation: None,
            axis_compliance: 0.0,
            limit_compliance: 0.0,
            angle_compliance: 0.0,
            damping_linear: 0.0,
            damping_angular: 0.0,
            collide_connected: false,
        }
    }
}

/// Welds two bodies together at an anchor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixedJointDef {
    pub local_anchor1: Vec2,
    pub local_anchor2: Vec2,
    #[serde(skip)]
    pub world_anchor: Vec2,
    pub reference_angle: f32,
    pub point_compliance: f32,
    pub angle_compliance: f32,
    pub damping_linear: f32,
    pub damping_angular: f32,
    pub collide_connected: bool,
}

impl FixedJointDef {
    pub fn initialize<B: BodyFrame>(body1: &B, body2: &B, anchor: Vec2) -> Self {
        Self {
            local_anchor1: body1.world_to_local(anchor),
            local_anchor2: body2.world_to_local(anchor),
            world_anchor: anchor,
            reference_angle: body2.angle() - body1.angle(),
            point_compliance: 0.0,
            angle_compliance: 0.0,
            damping_linear: 0.0,
            damping_angular: 0.0,
            collide_connected: false,
        }
    }
}

impl NativeDefinition for DistanceJointDef {
    fn apply_attributes(
        &mut self,
        attributes: &JointAttributes,
    ) -> Result<Vec<String>, serde_json::Error> {
        let anchors = (self.world_anchor1, self.world_anchor2);
        let ignored = merge_attributes(self, attributes)?;
        (self.world_anchor1, self.world_anchor2) = anchors;
        Ok(ignored)
    }
}

impl NativeDefinition for RevoluteJointDef {
    fn apply_attributes(
        &mut self,
        attributes: &JointAttributes,
    ) -> Result<Vec<String>, serde_json::Error> {
        let world_anchor = self.world_anchor;
        let ignored = merge_attributes(self, attributes)?;
        self.world_anchor = world_anchor;
        Ok(ignored)
    }
}

impl NativeDefinition for PrismaticJointDef {
    fn apply_attributes(
        &mut self,
        attributes: &JointAttributes,
    ) -> Result<Vec<String>, serde_json::Error> {
        let world_anchor = self.world_anchor;
        let ignored = merge_attributes(self, attributes)?;
        self.world_anchor = world_anchor;
        Ok(ignored)
    }
}

impl NativeDefinition for FixedJointDef {
    fn apply_attributes(
        &mut self,
        attributes: &JointAttributes,
    ) -> Result<Vec<String>, serde_json::Error> {
        let world_anchor = self.world_anchor;
        let ignored = merge_attributes(self, attributes)?;
        self.world_anchor = world_anchor;
        Ok(ignored)
    }
}

/// Definition of any built-in joint kind
#[derive(Clone, Debug, PartialEq)]
pub enum JointDefinition {
    Distance(DistanceJointDef),
    Revolute(RevoluteJointDef),
    Prismatic(PrismaticJointDef),
    Fixed(FixedJointDef),
}

impl NativeDefinition for JointDefinition {
    fn apply_attributes(
        &mut self,
        attributes: &JointAttributes,
    ) -> Result<Vec<String>, serde_json::Error> {
        match self {
            JointDefinition::Distance(def) => def.apply_attributes(attributes),
            JointDefinition::Revolute(def) => def.apply_attributes(attributes),
            JointDefinition::Prismatic(def) => def.apply_attributes(attributes),
            JointDefinition::Fixed(def) => def.apply_attributes(attributes),
        }
    }
}

/// Attribute presets for common connections
impl JointAttributes {
    /// Springy distance joint
    pub fn spring(stiffness: f32, damping: f32) -> Self {
        let mut attributes = Self::new();
        attributes.insert("stiffness", stiffness);
        attributes.insert("damping_linear", damping);
        attributes.insert("damping_angular", damping);
        attributes
    }

    /// Revolute joint limited to `[min, max]` radians
    pub fn hinge(min_angle: f32, max_angle: f32) -> Self {
        let mut attributes = Self::new();
        attributes.insert("min_angle", min_angle);
        attributes.insert("max_angle", max_angle);
        attributes
    }

    /// Prismatic joint limited to `[min, max]` along its axis
    pub fn sliding_door(min_translation: f32, max_translation: f32) -> Self {
        let mut attributes = Self::new();
        attributes.insert("min_translation", min_translation);
        attributes.insert("max_translation", max_translation);
        attributes
    }
}

impl From<DistanceJointDef> for JointDefinition {
    fn from(value: DistanceJointDef) -> Self {
        Self::Distance(value)
    }
}

impl From<RevoluteJointDef> for JointDefinition {
    fn from(value: RevoluteJointDef) -> Self {
        Self::Revolute(value)
    }
}

impl From<PrismaticJointDef> for JointDefinition {
    fn from(value: PrismaticJointDef) -> Self {
        Self::Prismatic(value)
    }
}

impl From<FixedJointDef> for JointDefinition {
    fn from(value: FixedJointDef) -> Self {
        Self::Fixed(value)
    }
}
