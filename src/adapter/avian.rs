//! avian2d adapter
//!
//! Bodies are entities carrying a [`SceneBody`] id. The [`BodyRegistry`] maps those ids to
//! entities and the [`JointRegistry`] maps joint ids to the joint entities created here.
//! Joints are spawned as avian joint components on their own entity, the same way the
//! editor tools spawn them.
//!
//! ## Anchors
//! Definitions carry anchors relative to each body's transform origin, which is what
//! avian's `with_local_anchor*` expects. Avian handles the center of mass offset itself.

use std::collections::HashMap;

use avian2d::prelude::*;
use bevy::math::EulerRot;
use bevy::prelude::*;

use super::{AdapterError, BodyFrame, JointBuilder, SimulationWorld};
use crate::joints::{
    BodyId, DistanceJointDef, FixedJointDef, JointDefinition, JointId, PrismaticJointDef,
    RevoluteJointDef,
};

/// Marks an entity as a body that joint descriptors can reference
#[derive(Component, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SceneBody(pub BodyId);

/// Marks a joint entity created from a descriptor
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct SceneJoint {
    pub id: JointId,
    pub kind: &'static str,
}

/// Body id to entity lookup
#[derive(Resource, Debug, Default)]
pub struct BodyRegistry {
    bodies: HashMap<BodyId, Entity>,
}

impl BodyRegistry {
    pub fn insert(&mut self, id: BodyId, entity: Entity) -> Option<Entity> {
        self.bodies.insert(id, entity)
    }

    pub fn get(&self, id: &BodyId) -> Option<Entity> {
        self.bodies.get(id).copied()
    }

    pub fn remove(&mut self, id: &BodyId) -> Option<Entity> {
        self.bodies.remove(id)
    }

    /// Drop every id pointing at `entity`
    pub fn remove_entity(&mut self, entity: Entity) {
        self.bodies.retain(|_, registered| *registered != entity);
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

/// Joint id to joint entity record. Source of truth for "already created".
#[derive(Resource, Debug, Default)]
pub struct JointRegistry {
    joints: HashMap<JointId, Entity>,
}

impl JointRegistry {
    pub fn get(&self, id: &JointId) -> Option<Entity> {
        self.joints.get(id).copied()
    }

    pub fn contains(&self, id: &JointId) -> bool {
        self.joints.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&JointId, &Entity)> {
        self.joints.iter()
    }

    pub(crate) fn insert(&mut self, id: JointId, entity: Entity) {
        self.joints.insert(id, entity);
    }

    pub(crate) fn remove_entity(&mut self, entity: Entity) {
        self.joints.retain(|_, registered| *registered != entity);
    }
}

/// Remove a materialized joint from the world. Returns whether it existed.
pub fn retire_joint(world: &mut World, id: &JointId) -> bool {
    let Some(entity) = world
        .get_resource_mut::<JointRegistry>()
        .and_then(|mut registry| registry.joints.remove(id))
    else {
        return false;
    };

    if !world.despawn(entity) {
        warn!("Joint {} entity {:?} was already despawned", id, entity);
    }
    info!("Retired joint {}", id);
    true
}

/// Pose of a body entity, captured when the joint is created
#[derive(Debug, Clone, Copy)]
pub struct AvianBody {
    pub entity: Entity,
    origin: Vec2,
    angle: f32,
    center: Vec2,
}

impl AvianBody {
    fn from_entity(entity: EntityRef) -> Option<Self> {
        let transform = entity
            .get::<GlobalTransform>()
            .copied()
            .or_else(|| entity.get::<Transform>().copied().map(GlobalTransform::from))?;

        let origin = transform.translation().truncate();
        let angle = transform.rotation().to_euler(EulerRot::ZYX).0;
        let local_center = entity
            .get::<ComputedCenterOfMass>()
            .map(|center| center.0)
            .unwrap_or(Vec2::ZERO);

        Some(Self {
            entity: entity.id(),
            origin,
            angle,
            center: origin + Vec2::from_angle(angle).rotate(local_center),
        })
    }
}

impl BodyFrame for AvianBody {
    fn origin(&self) -> Vec2 {
        self.origin
    }

    fn angle(&self) -> f32 {
        self.angle
    }

    fn world_center(&self) -> Vec2 {
        self.center
    }
}

/// [`SimulationWorld`] over a Bevy world running avian2d
pub struct AvianWorld<'w> {
    world: &'w mut World,
}

impl<'w> AvianWorld<'w> {
    pub fn new(world: &'w mut World) -> Self {
        Self { world }
    }

    /// Spawn the joint entity and record it in the joint registry
    fn spawn_joint<J: Component>(
        &mut self,
        id: &JointId,
        kind: &'static str,
        joint: J,
        damping: (f32, f32),
        collide_connected: bool,
    ) -> Result<Entity, AdapterError> {
        if !self.world.contains_resource::<JointRegistry>() {
            return Err(AdapterError::MissingResource("JointRegistry"));
        }

        let mut entity = self.world.spawn((
            joint,
            SceneJoint {
                id: id.clone(),
                kind,
            },
        ));

        let (linear, angular) = damping;
        if linear > 0.0 || angular > 0.0 {
            entity.insert(JointDamping { linear, angular });
        }
        if !collide_connected {
            entity.insert(JointCollisionDisabled);
        }

        let entity = entity.id();
        self.world
            .resource_mut::<JointRegistry>()
            .insert(id.clone(), entity);
        Ok(entity)
    }
}

impl SimulationWorld for AvianWorld<'_> {
    type Body = AvianBody;
    type Joint = Entity;

    fn validate(&self) -> Result<(), AdapterError> {
        if !self.world.contains_resource::<BodyRegistry>() {
            return Err(AdapterError::MissingResource("BodyRegistry"));
        }
        if !self.world.contains_resource::<JointRegistry>() {
            return Err(AdapterError::MissingResource("JointRegistry"));
        }
        Ok(())
    }

    fn body(&self, id: &BodyId) -> Option<AvianBody> {
        let entity = self.world.get_resource::<BodyRegistry>()?.get(id)?;
        let entity = self.world.get_entity(entity).ok()?;
        AvianBody::from_entity(entity)
    }

    fn contains_joint(&self, id: &JointId) -> bool {
        self.world
            .get_resource::<JointRegistry>()
            .is_some_and(|registry| registry.contains(id))
    }
}

impl JointBuilder<DistanceJointDef> for AvianWorld<'_> {
    fn build_joint(
        &mut self,
        id: &JointId,
        body1: &AvianBody,
        body2: &AvianBody,
        def: DistanceJointDef,
    ) -> Result<Entity, AdapterError> {
        let (min, max) = def.limits();
        if min > max {
            return Err(AdapterError::Build(format!("distance limits {min} > {max}")));
        }

        let mut joint = DistanceJoint::new(body1.entity, body2.entity)
            .with_local_anchor1(def.local_anchor1)
            .with_local_anchor2(def.local_anchor2)
            .with_limits(min, max);

        let compliance = def.compliance();
        if compliance != 0.0 {
            joint = joint.with_compliance(compliance);
        }

        self.spawn_joint(
            id,
            "Distance Joint",
            joint,
            (def.damping_linear, def.damping_angular),
            def.collide_connected,
        )
    }
}

impl JointBuilder<RevoluteJointDef> for AvianWorld<'_> {
    fn build_joint(
        &mut self,
        id: &JointId,
        body1: &AvianBody,
        body2: &AvianBody,
        def: RevoluteJointDef,
    ) -> Result<Entity, AdapterError> {
        let mut joint = RevoluteJoint::new(body1.entity, body2.entity)
            .with_local_anchor1(def.local_anchor1)
            .with_local_anchor2(def.local_anchor2);

        if def.reference_angle != 0.0 {
            joint = joint.with_basis(def.reference_angle);
        }
        if def.point_compliance != 0.0 {
            joint = joint.with_point_compliance(def.point_compliance);
        }
        if def.limit_compliance != 0.0 {
            joint = joint.with_limit_compliance(def.limit_compliance);
        }
        match (def.min_angle, def.max_angle) {
            (Some(min), Some(max)) => joint = joint.with_angle_limits(min, max),
            (None, None) => {}
            _ => {
                return Err(AdapterError::Build(
                    "revolute limits need both min_angle and max_angle".to_string(),
                ));
            }
        }

        self.spawn_joint(
            id,
            "Revolute Joint",
            joint,
            (def.damping_linear, def.damping_angular),
            def.collide_connected,
        )
    }
}

impl JointBuilder<PrismaticJointDef> for AvianWorld<'_> {
    fn build_joint(
        &mut self,
        id: &JointId,
        body1: &AvianBody,
        body2: &AvianBody,
        def: PrismaticJointDef,
    ) -> Result<Entity, AdapterError> {
        let mut joint = PrismaticJoint::new(body1.entity, body2.entity)
            .with_local_anchor1(def.local_anchor1)
            .with_local_anchor2(def.local_anchor2);

        if def.local_axis1 != Vec2::X {
            joint = joint.with_slider_axis(def.local_axis1);
        }
        if def.axis_compliance != 0.0 {
            joint = joint.with_align_compliance(def.axis_compliance);
        }
        if def.limit_compliance != 0.0 {
            joint = joint.with_limit_compliance(def.limit_compliance);
        }
        if def.angle_compliance != 0.0 {
            joint = joint.with_angle_compliance(def.angle_compliance);
        }
        match (def.min_translation, def.max_translation) {
            (Some(min), Some(max)) => joint = joint.with_limits(min, max),
            (None, None) => {}
            _ => {
                return Err(AdapterError::Build(
                    "prismatic limits need both min_translation and max_translation".to_string(),
                ));
            }
        }

        self.spawn_joint(
            id,
            "Prismatic Joint",
            joint,
            (def.damping_linear, def.damping_angular),
            def.collide_connected,
        )
    }
}

impl JointBuilder<FixedJointDef> for AvianWorld<'_> {
    fn build_joint(
        &mut self,
        id: &JointId,
        body1: &AvianBody,
        body2: &AvianBody,
        def: FixedJointDef,
    ) -> Result<Entity, AdapterError> {
        let mut joint = FixedJoint::new(body1.entity, body2.entity)
            .with_local_anchor1(def.local_anchor1)
            .with_local_anchor2(def.local_anchor2);

        if def.point_compliance != 0.0 {
            joint = joint.with_point_compliance(def.point_compliance);
        }
        if def.angle_compliance != 0.0 {
            joint = joint.with_angle_compliance(def.angle_compliance);
        }

        self.spawn_joint(
            id,
            "Fixed Joint",
            joint,
            (def.damping_linear, def.damping_angular),
            def.collide_connected,
        )
    }
}

impl JointBuilder<JointDefinition> for AvianWorld<'_> {
    fn build_joint(
        &mut self,
        id: &JointId,
        body1: &AvianBody,
        body2: &AvianBody,
        definition: JointDefinition,
    ) -> Result<Entity, AdapterError> {
        match definition {
            JointDefinition::Distance(def) => self.build_joint(id, body1, body2, def),
            JointDefinition::Revolute(def) => self.build_joint(id, body1, body2, def),
            JointDefinition::Prismatic(def) => self.build_joint(id, body1, body2, def),
            JointDefinition::Fixed(def) => self.build_joint(id, body1, body2, def),
        }
    }
}
