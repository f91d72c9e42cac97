//! Materializing descriptors into live constraints

use log::{debug, info, warn};

use super::definition::NativeDefinition;
use super::descriptor::{JointDescriptor, JointVariant};
use super::error::JointError;
use crate::adapter::JointBuilder;

/// Successful result of [`create_constraint`]
#[derive(Debug, Clone, PartialEq)]
pub enum CreationOutcome<J> {
    /// A new constraint was created; the handle is for the caller's optional use
    Created(J),
    /// A constraint with this id is already registered, nothing was created or changed
    AlreadyExists,
}

impl<J> CreationOutcome<J> {
    pub fn created(self) -> Option<J> {
        match self {
            CreationOutcome::Created(joint) => Some(joint),
            CreationOutcome::AlreadyExists => None,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, CreationOutcome::Created(_))
    }
}

/// Create the live constraint for `descriptor` inside `world`.
///
/// Shared by every joint kind:
/// 1. The world must expose its body registry, joint registry and builder.
/// 2. An id already present in the joint registry is skipped.
/// 3. Both body ids must resolve.
/// 4. The variant builds its definition, then `attributes` are merged over it.
/// 5. The world's builder instantiates and registers the constraint.
///
/// The returned handle is not retained; the world's joint registry is the record.
/// Must not be called while the world is stepping.
pub fn create_constraint<V, W>(
    descriptor: &mut JointDescriptor<V>,
    world: &mut W,
) -> Result<CreationOutcome<W::Joint>, JointError>
where
    V: JointVariant,
    W: JointBuilder<V::Definition>,
{
    world.validate()?;

    let id = descriptor.id().clone();
    if world.contains_joint(&id) {
        debug!("Joint {} already exists, skipping", id);
        return Ok(CreationOutcome::AlreadyExists);
    }

    let body1 = world
        .body(&descriptor.body_id1)
        .ok_or_else(|| JointError::UnresolvedBody {
            joint: id.clone(),
            body: descriptor.body_id1.clone(),
        })?;
    let body2 = world
        .body(&descriptor.body_id2)
        .ok_or_else(|| JointError::UnresolvedBody {
            joint: id.clone(),
            body: descriptor.body_id2.clone(),
        })?;

    let anchor1 = descriptor.world_anchor1(&body1);
    let mut definition = descriptor.joint.build_definition(anchor1, &body1, &body2);

    let ignored = definition
        .apply_attributes(&descriptor.attributes)
        .map_err(|e| JointError::InvalidAttribute {
            joint: id.clone(),
            reason: e.to_string(),
        })?;
    if !ignored.is_empty() {
        warn!(
            "Joint {}: {} has no attributes named {:?}, ignoring them",
            id,
            descriptor.kind(),
            ignored
        );
    }

    let joint = world.build_joint(&id, &body1, &body2, definition)?;
    descriptor.mark_materialized();

    info!(
        "Created {} {} between {} and {}",
        descriptor.kind(),
        id,
        descriptor.body_id1,
        descriptor.body_id2
    );
    Ok(CreationOutcome::Created(joint))
}
