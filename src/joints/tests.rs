//! Tests for the joint layer against an in-memory adapter

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use bevy::math::Vec2;

    use crate::adapter::{AdapterError, BodyFrame, JointBuilder, SimulationWorld};
    use crate::joints::*;

    #[derive(Clone, Copy, Debug)]
    struct MockBody {
        origin: Vec2,
        angle: f32,
        center: Vec2,
    }

    impl MockBody {
        fn at(x: f32, y: f32) -> Self {
            Self {
                origin: Vec2::new(x, y),
                angle: 0.0,
                center: Vec2::new(x, y),
            }
        }
    }

    impl BodyFrame for MockBody {
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

    #[derive(Default)]
    struct MockWorld {
        bodies: HashMap<BodyId, MockBody>,
        joints: HashMap<JointId, JointDefinition>,
        builds: usize,
        broken: bool,
    }

    impl MockWorld {
        fn with_bodies(bodies: &[(&str, MockBody)]) -> Self {
            Self {
                bodies: bodies
                    .iter()
                    .map(|(id, body)| (BodyId::from(*id), *body))
                    .collect(),
                ..Default::default()
            }
        }
    }

    impl SimulationWorld for MockWorld {
        type Body = MockBody;
        type Joint = usize;

        fn validate(&self) -> Result<(), AdapterError> {
            if self.broken {
                Err(AdapterError::MissingResource("JointRegistry"))
            } else {
                Ok(())
            }
        }

        fn body(&self, id: &BodyId) -> Option<MockBody> {
            self.bodies.get(id).copied()
        }

        fn contains_joint(&self, id: &JointId) -> bool {
            self.joints.contains_key(id)
        }
    }

    impl<D: Into<JointDefinition>> JointBuilder<D> for MockWorld {
        fn build_joint(
            &mut self,
            id: &JointId,
            _body1: &MockBody,
            _body2: &MockBody,
            definition: D,
        ) -> Result<usize, AdapterError> {
            self.joints.insert(id.clone(), definition.into());
            self.builds += 1;
            Ok(self.builds)
        }
    }

    fn distance(id: &str) -> JointDescriptor<DistanceJointDesc> {
        JointDescriptor::new(id, "a", "b", DistanceJointDesc::new())
    }

    fn two_bodies() -> MockWorld {
        MockWorld::with_bodies(&[("a", MockBody::at(0.0, 0.0)), ("b", MockBody::at(7.0, 9.0))])
    }

    fn created_distance(world: &MockWorld, id: &str) -> DistanceJointDef {
        match world.joints.get(&JointId::from(id)) {
            Some(JointDefinition::Distance(def)) => def.clone(),
            other => panic!("expected a distance joint, got {:?}", other),
        }
    }

    #[test]
    fn test_scale_applies_to_every_anchor() {
        let mut joint = distance("j")
            .with_body_point1((2.0, 3.0))
            .joint_with_point2((4.0, 5.0));

        assert_eq!(joint.scale(10.0), ScaleOutcome::Applied);
        assert_eq!(joint.body_point1, Some(Point::new(20.0, 30.0)));
        assert_eq!(joint.joint.body_point2, Some(Point::new(40.0, 50.0)));
        assert_eq!(joint.state(), JointState::Scaled);
    }

    #[test]
    fn test_scale_twice_is_idempotent() {
        let mut once = distance("j")
            .with_body_point1((2.0, 3.0))
            .joint_with_point2((4.0, 5.0));
        let mut twice = once.clone();

        once.scale(3.0);
        twice.scale(3.0);
        assert_eq!(twice.scale(3.0), ScaleOutcome::AlreadyScaled);

        assert_eq!(once.body_point1, twice.body_point1);
        assert_eq!(once.joint.body_point2, twice.joint.body_point2);
    }

    #[test]
    fn test_scale_by_zero_leaves_anchors_untouched() {
        let mut joint = distance("j")
            .with_body_point1((2.0, 3.0))
            .joint_with_point2((4.0, 5.0));
        let before = joint.clone();

        assert_eq!(joint.scale(0.0), ScaleOutcome::NoFactor);
        assert_eq!(joint.scale(f32::NAN), ScaleOutcome::NoFactor);
        assert_eq!(joint, before);
        assert_eq!(joint.state(), JointState::Defined);

        // A later real factor still applies
        assert_eq!(joint.scale(2.0), ScaleOutcome::Applied);
    }

    #[test]
    fn test_scale_skips_missing_anchors_and_leaves_other_fields() {
        let mut joint = distance("j").with_attribute("length", 12.0);
        let attributes = joint.attributes.clone();

        assert_eq!(joint.scale(4.0), ScaleOutcome::Applied);
        assert!(joint.body_point1.is_none());
        assert!(joint.joint.body_point2.is_none());
        assert_eq!(joint.attributes, attributes);
        assert_eq!(joint.id(), &JointId::from("j"));
        assert_eq!(joint.body_id1, BodyId::from("a"));
    }

    #[test]
    fn test_prismatic_axis_is_not_scaled() {
        let mut joint = JointDescriptor::new(
            "slider",
            "a",
            "b",
            PrismaticJointDesc {
                axis: Point::new(0.0, 1.0),
            },
        )
        .with_body_point1((1.0, 1.0));

        joint.scale(5.0);
        assert_eq!(joint.joint.axis, Point::new(0.0, 1.0));
        assert_eq!(joint.body_point1, Some(Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_missing_second_anchor_uses_body_center() {
        let mut world = two_bodies();
        let mut joint = distance("j");

        let outcome = create_constraint(&mut joint, &mut world).unwrap();
        assert!(outcome.is_created());

        let def = created_distance(&world, "j");
        assert_eq!(def.world_anchor2, Vec2::new(7.0, 9.0));
        assert_eq!(def.world_anchor1, Vec2::ZERO);
        assert!((def.length - Vec2::new(7.0, 9.0).length()).abs() < 1e-5);
    }

    #[test]
    fn test_local_anchors_follow_body_pose() {
        let rotated = MockBody {
            origin: Vec2::new(10.0, 0.0),
            angle: std::f32::consts::FRAC_PI_2,
            center: Vec2::new(10.0, 0.0),
        };
        let mut world = MockWorld::with_bodies(&[("a", rotated), ("b", MockBody::at(0.0, 0.0))]);
        let mut joint = distance("j").with_body_point1((1.0, 0.0));

        create_constraint(&mut joint, &mut world).unwrap();

        let def = created_distance(&world, "j");
        assert!((def.world_anchor1 - Vec2::new(10.0, 1.0)).length() < 1e-5);
        assert!((def.local_anchor1 - Vec2::new(1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_creation_is_idempotent_per_id() {
        let mut world = two_bodies();
        let mut joint = distance("j");

        let first = create_constraint(&mut joint, &mut world).unwrap();
        let before = created_distance(&world, "j");

        let mut again = distance("j").with_attribute("length", 99.0);
        let second = create_constraint(&mut again, &mut world).unwrap();

        assert_eq!(first, CreationOutcome::Created(1));
        assert_eq!(second, CreationOutcome::AlreadyExists);
        assert!(second.created().is_none());
        assert_eq!(world.builds, 1);
        assert_eq!(world.joints.len(), 1);
        assert_eq!(created_distance(&world, "j"), before);
    }

    #[test]
    fn test_unresolved_body_creates_nothing() {
        let mut world = MockWorld::with_bodies(&[("b", MockBody::at(0.0, 0.0))]);
        let mut joint = distance("j");

        let result = create_constraint(&mut joint, &mut world);

        assert_eq!(
            result,
            Err(JointError::UnresolvedBody {
                joint: JointId::from("j"),
                body: BodyId::from("a"),
            })
        );
        assert!(result.unwrap_err().is_retryable());
        assert!(world.joints.is_empty());
        assert_eq!(joint.state(), JointState::Defined);
    }

    #[test]
    fn test_broken_world_fails_loudly() {
        let mut world = two_bodies();
        world.broken = true;

        let result = create_constraint(&mut distance("j"), &mut world);

        assert!(matches!(
            result,
            Err(JointError::Adapter(AdapterError::MissingResource(_)))
        ));
        assert!(world.joints.is_empty());
    }

    #[test]
    fn test_attributes_override_definition_defaults() {
        let mut world = two_bodies();
        let mut joint = distance("j")
            .with_attribute("stiffness", 5)
            .with_attribute("collide_connected", true)
            .with_attribute("frequency_hz", 4.0);

        create_constraint(&mut joint, &mut world).unwrap();

        let def = created_distance(&world, "j");
        assert_eq!(def.stiffness, Some(5.0));
        assert!(def.collide_connected);
        assert!((def.compliance() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_world_anchor_attributes_are_ignored() {
        let body_a = MockBody::at(0.0, 0.0);
        let body_b = MockBody::at(7.0, 9.0);
        let mut def = DistanceJointDef::initialize(&body_a, &body_b, Vec2::ZERO, Vec2::new(7.0, 9.0));

        let mut attributes = JointAttributes::new();
        attributes.insert("world_anchor2", serde_json::json!({"x": 1.0, "y": 2.0}));
        attributes.insert("length", 3.0);

        let ignored = def.apply_attributes(&attributes).unwrap();

        assert_eq!(ignored, ["world_anchor2"]);
        assert_eq!(def.world_anchor2, Vec2::new(7.0, 9.0));
        assert_eq!(def.world_anchor1, Vec2::ZERO);
        assert_eq!(def.length, 3.0);
    }

    #[test]
    fn test_revolute_world_anchor_survives_merge() {
        let mut world = two_bodies();
        let mut hinge = JointDescriptor::new("hinge", "a", "b", RevoluteJointDesc {})
            .with_body_point1((0.5, 0.0))
            .with_attribute("world_anchor", serde_json::json!([3.0, 3.0]))
            .with_attribute("collide_connected", true);

        create_constraint(&mut hinge, &mut world).unwrap();

        match world.joints.get(&JointId::from("hinge")) {
            Some(JointDefinition::Revolute(def)) => {
                assert_eq!(def.world_anchor, Vec2::new(0.5, 0.0));
                assert!(def.collide_connected);
            }
            other => panic!("expected a revolute joint, got {:?}", other),
        }
    }

    #[test]
    fn test_attribute_with_wrong_type_is_rejected() {
        let mut world = two_bodies();
        let mut joint = distance("j").with_attribute("length", "long");

        let result = create_constraint(&mut joint, &mut world);

        assert!(matches!(result, Err(JointError::InvalidAttribute { .. })));
        assert!(world.joints.is_empty());
    }

    #[test]
    fn test_attribute_presets() {
        let mut world = two_bodies();
        let mut hinge = JointDescriptor::new("hinge", "a", "b", JointKind::from(RevoluteJointDesc {}))
            .with_body_point1((0.5, 0.0))
            .with_attributes(JointAttributes::hinge(-1.0, 1.0));

        create_constraint(&mut hinge, &mut world).unwrap();

        match world.joints.get(&JointId::from("hinge")) {
            Some(JointDefinition::Revolute(def)) => {
                assert_eq!(def.min_angle, Some(-1.0));
                assert_eq!(def.max_angle, Some(1.0));
                assert_eq!(def.world_anchor, Vec2::new(0.5, 0.0));
                assert_eq!(def.local_anchor2, Vec2::new(-6.5, -9.0));
            }
            other => panic!("expected a revolute joint, got {:?}", other),
        }
    }

    #[test]
    fn test_materialized_descriptor_is_not_rescaled() {
        let mut world = two_bodies();
        let mut joint = distance("j").with_body_point1((1.0, 1.0));

        create_constraint(&mut joint, &mut world).unwrap();

        assert_eq!(joint.state(), JointState::Materialized { scaled: false });
        assert_eq!(joint.scale(2.0), ScaleOutcome::Materialized);
        assert_eq!(joint.body_point1, Some(Point::new(1.0, 1.0)));
    }

    #[test]
    fn test_reissued_descriptor_gets_fresh_id_and_keeps_scale() {
        let mut world = two_bodies();
        let mut joint = distance("j").with_body_point1((1.0, 1.0));
        joint.scale(2.0);
        create_constraint(&mut joint, &mut world).unwrap();

        let mut reissued = joint.reissued();
        assert_ne!(reissued.id(), joint.id());
        assert_eq!(reissued.state(), JointState::Scaled);
        assert_eq!(reissued.scale(2.0), ScaleOutcome::AlreadyScaled);
        assert_eq!(reissued.body_point1, Some(Point::new(2.0, 2.0)));

        assert!(create_constraint(&mut reissued, &mut world).unwrap().is_created());
        assert_eq!(world.joints.len(), 2);
    }

    trait WithPoint2 {
        fn joint_with_point2(self, point: (f32, f32)) -> Self;
    }

    impl WithPoint2 for JointDescriptor<DistanceJointDesc> {
        fn joint_with_point2(mut self, point: (f32, f32)) -> Self {
            self.joint = self.joint.with_body_point2(point);
            self
        }
    }
}
