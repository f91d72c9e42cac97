//! Bevy integration
//!
//! Scenes arrive through [`LoadJointSceneEvent`], are scaled once with
//! [`JointLayerSettings::scale_factor`] and queued in [`PendingJoints`]. Every frame the
//! queue is materialized against the avian world in `PostUpdate`, once transforms have been
//! propagated. That is outside the physics step; new joints are simulated from the next one.

use std::collections::HashSet;
use std::path::PathBuf;

use bevy::prelude::*;
use bevy::transform::TransformSystem;

use crate::adapter::avian::{AvianWorld, BodyRegistry, JointRegistry, SceneBody, SceneJoint};
use crate::joints::{
    CreationOutcome, JointDescriptor, JointError, JointId, ScaleFactor, create_constraint,
};
use crate::scene::JointScene;
use crate::settings::{JointLayerSettings, UnresolvedBodyPolicy};

/// Joint scene plugin
///
/// Registers the body and joint registries, the settings resource and the systems that
/// turn loaded scenes into avian joints. Requires avian's `PhysicsPlugins` for the joints
/// to be simulated.
#[derive(Default)]
pub struct JointScenePlugin;

impl Plugin for JointScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BodyRegistry>()
            .init_resource::<JointRegistry>()
            .init_resource::<JointLayerSettings>()
            .init_resource::<PendingJoints>()
            .init_resource::<JointOutcomes>()
            .register_type::<JointLayerSettings>()
            .add_event::<LoadJointSceneEvent>()
            .add_event::<JointCreatedEvent>()
            .add_event::<JointFailedEvent>()
            .add_systems(
                PreUpdate,
                (register_scene_bodies, forget_despawned_entities),
            )
            .add_systems(Update, handle_scene_load)
            .add_systems(
                PostUpdate,
                (materialize_pending_joints, send_joint_outcome_events)
                    .chain()
                    .after(TransformSystem::TransformPropagate),
            );
    }
}

/// Joint scene load event
#[derive(Event, Debug, Clone)]
pub enum LoadJointSceneEvent {
    /// Read a scene file (`.ron`, `.scn` or `.json`)
    FromPath(PathBuf),
    /// Use an already built scene
    Scene(JointScene),
}

/// Sent for every constraint created from a pending descriptor
#[derive(Event, Debug, Clone)]
pub struct JointCreatedEvent {
    pub id: JointId,
    pub entity: Entity,
}

/// Sent when a pending descriptor is dropped without creating a constraint
#[derive(Event, Debug, Clone)]
pub struct JointFailedEvent {
    pub id: JointId,
    pub error: JointError,
}

/// Descriptors waiting to be materialized
#[derive(Resource, Debug, Default)]
pub struct PendingJoints {
    joints: Vec<JointDescriptor>,
    /// Ids already reported as waiting for a body, to warn only once
    waiting: HashSet<JointId>,
}

impl PendingJoints {
    pub fn push(&mut self, joint: JointDescriptor) {
        self.joints.push(joint);
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JointDescriptor> {
        self.joints.iter()
    }
}

impl Extend<JointDescriptor> for PendingJoints {
    fn extend<T: IntoIterator<Item = JointDescriptor>>(&mut self, iter: T) {
        self.joints.extend(iter);
    }
}

/// Results of the last materialization pass, drained into events
#[derive(Resource, Debug, Default)]
struct JointOutcomes {
    created: Vec<JointCreatedEvent>,
    failed: Vec<JointFailedEvent>,
}

fn register_scene_bodies(
    mut registry: ResMut<BodyRegistry>,
    bodies: Query<(Entity, &SceneBody), Changed<SceneBody>>,
) {
    for (entity, body) in bodies.iter() {
        if let Some(previous) = registry.insert(body.0.clone(), entity) {
            if previous != entity {
                warn!(
                    "Body id {} moved from {:?} to {:?}",
                    body.0, previous, entity
                );
            }
        }
        debug!("Registered body {} as {:?}", body.0, entity);
    }
}

fn forget_despawned_entities(
    mut bodies: ResMut<BodyRegistry>,
    mut joints: ResMut<JointRegistry>,
    mut removed_bodies: RemovedComponents<SceneBody>,
    mut removed_joints: RemovedComponents<SceneJoint>,
) {
    for entity in removed_bodies.read() {
        bodies.remove_entity(entity);
    }
    for entity in removed_joints.read() {
        joints.remove_entity(entity);
    }
}

fn handle_scene_load(
    mut events: EventReader<LoadJointSceneEvent>,
    settings: Res<JointLayerSettings>,
    mut pending: ResMut<PendingJoints>,
) {
    for event in events.read() {
        let mut scene = match event {
            LoadJointSceneEvent::FromPath(path) => match JointScene::load(path) {
                Ok(scene) => scene,
                Err(e) => {
                    error!("Joint scene load from {:?} failed: {}", path, e);
                    continue;
                }
            },
            LoadJointSceneEvent::Scene(scene) => match scene.validate() {
                Ok(()) => scene.clone(),
                Err(e) => {
                    error!("Joint scene rejected: {}", e);
                    continue;
                }
            },
        };

        if settings
            .scale_factor
            .is_some_and(|factor| ScaleFactor::new(factor).is_none())
        {
            warn!(
                "Ignoring scale factor {:?} from settings",
                settings.scale_factor
            );
        }
        let scaled = scene.apply_scale(settings.scale_factor);

        info!(
            "Joint scene loaded with {} joints ({} scaled)",
            scene.joints.len(),
            scaled
        );
        pending.extend(scene.joints);
    }
}

/// Try to create every pending joint. Exclusive because the adapter needs the world.
fn materialize_pending_joints(world: &mut World) {
    let Some(mut pending) = world.remove_resource::<PendingJoints>() else {
        error!("PendingJoints resource is missing");
        return;
    };
    if pending.is_empty() {
        world.insert_resource(pending);
        return;
    }

    let settings = world
        .get_resource::<JointLayerSettings>()
        .cloned()
        .unwrap_or_default();
    let budget = settings.max_joints_per_frame.unwrap_or(usize::MAX);

    let mut outcomes = JointOutcomes::default();
    let mut remaining = Vec::new();
    // Joints attempted this frame go behind the ones the budget deferred
    let mut retry = Vec::new();

    for (attempt, mut joint) in pending.joints.drain(..).enumerate() {
        if attempt >= budget {
            remaining.push(joint);
            continue;
        }

        let id = joint.id().clone();
        match create_constraint(&mut joint, &mut AvianWorld::new(world)) {
            Ok(CreationOutcome::Created(entity)) => {
                pending.waiting.remove(&id);
                outcomes.created.push(JointCreatedEvent { id, entity });
            }
            Ok(CreationOutcome::AlreadyExists) => {
                pending.waiting.remove(&id);
            }
            Err(error)
                if error.is_retryable()
                    && settings.unresolved_body_policy == UnresolvedBodyPolicy::Retry =>
            {
                if pending.waiting.insert(id) {
                    warn!("{}, will retry", error);
                }
                retry.push(joint);
            }
            Err(error) => {
                error!("Joint creation failed: {}", error);
                pending.waiting.remove(&id);
                outcomes.failed.push(JointFailedEvent { id, error });
            }
        }
    }

    remaining.append(&mut retry);
    pending.joints = remaining;
    world.insert_resource(pending);

    if let Some(mut stored) = world.get_resource_mut::<JointOutcomes>() {
        stored.created.append(&mut outcomes.created);
        stored.failed.append(&mut outcomes.failed);
    }
}

fn send_joint_outcome_events(
    mut outcomes: ResMut<JointOutcomes>,
    mut created_events: EventWriter<JointCreatedEvent>,
    mut failed_events: EventWriter<JointFailedEvent>,
) {
    for event in outcomes.created.drain(..) {
        created_events.write(event);
    }
    for event in outcomes.failed.drain(..) {
        failed_events.write(event);
    }
}
