//! Simulation world adapter
//!
//! The joint core never names a physics engine. It talks to the simulation through the
//! traits in this module:
//! - [`SimulationWorld`] resolves bodies and answers whether a joint id already exists.
//! - [`JointBuilder`] turns one kind of definition into a live constraint and records it
//!   in the world's joint registry.
//! - [`BodyFrame`] is the minimal view of a resolved body needed to place anchors.
//!
//! [`avian`] implements the adapter for a Bevy world running avian2d.

use bevy::math::Vec2;
use thiserror::Error;

use crate::joints::{BodyId, JointId};

pub mod avian;

/// Adapter failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    /// The world is missing a collection or entry point the joint layer needs.
    /// This is an integration error, not a data error.
    #[error("Simulation world is missing {0}")]
    MissingResource(&'static str),
    #[error("Constraint build failed: {0}")]
    Build(String),
}

/// Pose of a resolved body
pub trait BodyFrame {
    /// Position of the body's transform origin in world space
    fn origin(&self) -> Vec2;

    /// Rotation of the body in radians
    fn angle(&self) -> f32;

    /// Center of mass in world space
    fn world_center(&self) -> Vec2;

    fn local_to_world(&self, local: Vec2) -> Vec2 {
        self.origin() + Vec2::from_angle(self.angle()).rotate(local)
    }

    fn world_to_local(&self, world: Vec2) -> Vec2 {
        Vec2::from_angle(-self.angle()).rotate(world - self.origin())
    }

    /// Rotate a world-space direction into the body's local space
    fn direction_to_local(&self, direction: Vec2) -> Vec2 {
        Vec2::from_angle(-self.angle()).rotate(direction)
    }
}

/// Body lookup and joint registry of a simulation world
pub trait SimulationWorld {
    type Body: BodyFrame;
    /// Live constraint handle returned to callers
    type Joint;

    /// Check that the world exposes everything the joint layer needs
    fn validate(&self) -> Result<(), AdapterError>;

    /// Resolve a body id, `None` if it is not registered
    fn body(&self, id: &BodyId) -> Option<Self::Body>;

    /// Whether a constraint is already registered under `id`
    fn contains_joint(&self, id: &JointId) -> bool;
}

/// Constraint builder for one definition type
pub trait JointBuilder<D>: SimulationWorld {
    /// Instantiate the constraint and register it under `id`
    fn build_joint(
        &mut self,
        id: &JointId,
        body1: &Self::Body,
        body2: &Self::Body,
        definition: D,
    ) -> Result<Self::Joint, AdapterError>;
}
