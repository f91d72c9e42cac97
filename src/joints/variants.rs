//! Built-in joint kinds

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use super::definition::{
    DistanceJointDef, FixedJointDef, JointDefinition, PrismaticJointDef, RevoluteJointDef,
};
use super::descriptor::{JointVariant, resolve_anchor};
use super::point::{Point, ScaleFactor};
use crate::adapter::BodyFrame;

/// Distance joint payload
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceJointDesc {
    /// Anchor on body 2 in its local space, `None` means body 2's world center
    #[serde(default, alias = "bodyPoint2")]
    pub body_point2: Option<Point>,
}

impl DistanceJointDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body_point2(mut self, point: impl Into<Point>) -> Self {
        self.body_point2 = Some(point.into());
        self
    }
}

impl JointVariant for DistanceJointDesc {
    type Definition = DistanceJointDef;

    fn kind(&self) -> &'static str {
        "Distance Joint"
    }

    fn scale_anchors(&mut self, factor: ScaleFactor) {
        if let Some(point) = self.body_point2.as_mut() {
            point.scale(factor);
        }
    }

    fn build_definition<B: BodyFrame>(
        &self,
        anchor1: Vec2,
        body1: &B,
        body2: &B,
    ) -> DistanceJointDef {
        let anchor2 = resolve_anchor(self.body_point2, body2);
        DistanceJointDef::initialize(body1, body2, anchor1, anchor2)
    }
}

/// Revolute joint payload. The pivot is the shared first anchor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RevoluteJointDesc {}

impl JointVariant for RevoluteJointDesc {
    type Definition = RevoluteJointDef;

    fn kind(&self) -> &'static str {
        "Revolute Joint"
    }

    fn build_definition<B: BodyFrame>(
        &self,
        anchor1: Vec2,
        body1: &B,
        body2: &B,
    ) -> RevoluteJointDef {
        RevoluteJointDef::initialize(body1, body2, anchor1)
    }
}

/// Prismatic joint payload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrismaticJointDesc {
    /// Slide direction in world space. A direction, so it is never scaled.
    #[serde(default = "default_axis")]
    pub axis: Point,
}

fn default_axis() -> Point {
    Point::new(1.0, 0.0)
}

impl Default for PrismaticJointDesc {
    fn default() -> Self {
        Self {
            axis: default_axis(),
        }
    }
}

impl JointVariant for PrismaticJointDesc {
    type Definition = PrismaticJointDef;

    fn kind(&self) -> &'static str {
        "Prismatic Joint"
    }

    fn build_definition<B: BodyFrame>(
        &self,
        anchor1: Vec2,
        body1: &B,
        body2: &B,
    ) -> PrismaticJointDef {
        PrismaticJointDef::initialize(body1, body2, anchor1, self.axis.to_vec2())
    }
}

/// Fixed (weld) joint payload
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FixedJointDesc {}

impl JointVariant for FixedJointDesc {
    type Definition = FixedJointDef;

    fn kind(&self) -> &'static str {
        "Fixed Joint"
    }

    fn build_definition<B: BodyFrame>(&self, anchor1: Vec2, body1: &B, body2: &B) -> FixedJointDef {
        FixedJointDef::initialize(body1, body2, anchor1)
    }
}

/// Any built-in joint kind, as written in scene files
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum JointKind {
    Distance(DistanceJointDesc),
    Revolute(RevoluteJointDesc),
    Prismatic(PrismaticJointDesc),
    Fixed(FixedJointDesc),
}

impl Default for JointKind {
    fn default() -> Self {
        Self::Distance(DistanceJointDesc::default())
    }
}

impl JointVariant for JointKind {
    type Definition = JointDefinition;

    fn kind(&self) -> &'static str {
        match self {
            JointKind::Distance(joint) => joint.kind(),
            JointKind::Revolute(joint) => joint.kind(),
            JointKind::Prismatic(joint) => joint.kind(),
            JointKind::Fixed(joint) => joint.kind(),
        }
    }

    fn scale_anchors(&mut self, factor: ScaleFactor) {
        match self {
            JointKind::Distance(joint) => joint.scale_anchors(factor),
            JointKind::Revolute(joint) => joint.scale_anchors(factor),
            JointKind::Prismatic(joint) => joint.scale_anchors(factor),
            JointKind::Fixed(joint) => joint.scale_anchors(factor),
        }
    }

    fn build_definition<B: BodyFrame>(
        &self,
        anchor1: Vec2,
        body1: &B,
        body2: &B,
    ) -> JointDefinition {
        match self {
            JointKind::Distance(joint) => {
                JointDefinition::Distance(joint.build_definition(anchor1, body1, body2))
            }
            JointKind::Revolute(joint) => {
                JointDefinition::Revolute(joint.build_definition(anchor1, body1, body2))
            }
            JointKind::Prismatic(joint) => {
                JointDefinition::Prismatic(joint.build_definition(anchor1, body1, body2))
            }
            JointKind::Fixed(joint) => {
                JointDefinition::Fixed(joint.build_definition(anchor1, body1, body2))
            }
        }
    }
}

impl From<DistanceJointDesc> for JointKind {
    fn from(value: DistanceJointDesc) -> Self {
        Self::Distance(value)
    }
}

impl From<RevoluteJointDesc> for JointKind {
    fn from(value: RevoluteJointDesc) -> Self {
        Self::Revolute(value)
    }
}

impl From<PrismaticJointDesc> for JointKind {
    fn from(value: PrismaticJointDesc) -> Self {
        Self::Prismatic(value)
    }
}

impl From<FixedJointDesc> for JointKind {
    fn from(value: FixedJointDesc) -> Self {
        Self::Fixed(value)
    }
}
