pub mod adapter;
pub mod joints;
pub mod plugin;
pub mod scene;
pub mod settings;

pub use adapter::avian::{
    AvianBody, AvianWorld, BodyRegistry, JointRegistry, SceneBody, SceneJoint, retire_joint,
};
pub use adapter::{AdapterError, BodyFrame, JointBuilder, SimulationWorld};
pub use joints::*;
pub use plugin::*;
pub use scene::*;
pub use settings::*;

/// Prelude module for convenient imports
///
/// # Example
///
/// ```rust,no_run
/// use avian2d::prelude::*;
/// use bevy::prelude::*;
/// use joint_scene::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(PhysicsPlugins::default())
///     .add_plugins(JointScenePlugin)
///     .insert_resource(JointLayerSettings::default().with_scale_factor(2.0))
///     .run();
/// ```
pub mod prelude {
    pub use crate::adapter::avian::{BodyRegistry, JointRegistry, SceneBody, SceneJoint};
    pub use crate::joints::{
        BodyId, CreationOutcome, DistanceJointDesc, FixedJointDesc, JointAttributes,
        JointDescriptor, JointError, JointId, JointKind, Point, PrismaticJointDesc,
        RevoluteJointDesc, create_constraint,
    };
    pub use crate::{
        JointCreatedEvent, JointFailedEvent, JointLayerSettings, JointScene, JointScenePlugin,
        LoadJointSceneEvent, PendingJoints, UnresolvedBodyPolicy,
    };
}
