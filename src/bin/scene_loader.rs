use std::path::PathBuf;

use avian2d::prelude::*;
use bevy::prelude::*;
use joint_scene::prelude::*;

const DEFAULT_SCENE: &str = "assets/scenes/contraption.ron";

/// Usage: `scene_loader [SCENE] [--scale FACTOR]`
fn main() {
    let (scene_path, scale) = parse_args();

    let mut settings = JointLayerSettings::default();
    if let Some(scale) = scale {
        settings = settings.with_scale_factor(scale);
    }

    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins((PhysicsPlugins::default(), PhysicsDebugPlugin::default()))
        .add_plugins(JointScenePlugin)
        .insert_resource(settings)
        .insert_resource(ScenePath(scene_path))
        .add_systems(Startup, setup)
        .add_systems(Update, (log_created_joints, log_failed_joints))
        .run();
}

#[derive(Resource)]
struct ScenePath(PathBuf);

fn parse_args() -> (PathBuf, Option<f32>) {
    let mut scene_path = PathBuf::from(DEFAULT_SCENE);
    let mut scale = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--scale" {
            match args.next().map(|value| value.parse::<f32>()) {
                Some(Ok(value)) => scale = Some(value),
                _ => eprintln!("--scale expects a number, ignoring it"),
            }
        } else {
            scene_path = PathBuf::from(arg);
        }
    }

    (scene_path, scale)
}

fn setup(
    mut commands: Commands,
    scene_path: Res<ScenePath>,
    mut load_events: EventWriter<LoadJointSceneEvent>,
) {
    commands.spawn(Camera2d);

    // Bodies referenced by the demo scene
    spawn_body(
        &mut commands,
        "ceiling",
        Vec2::new(0.0, 200.0),
        RigidBody::Static,
        Vec2::new(400.0, 20.0),
    );
    spawn_body(
        &mut commands,
        "bob",
        Vec2::new(60.0, 40.0),
        RigidBody::Dynamic,
        Vec2::new(30.0, 30.0),
    );
    spawn_body(
        &mut commands,
        "door",
        Vec2::new(-150.0, 120.0),
        RigidBody::Dynamic,
        Vec2::new(80.0, 10.0),
    );
    spawn_body(
        &mut commands,
        "rail",
        Vec2::new(0.0, -150.0),
        RigidBody::Static,
        Vec2::new(300.0, 10.0),
    );
    spawn_body(
        &mut commands,
        "cart",
        Vec2::new(0.0, -130.0),
        RigidBody::Dynamic,
        Vec2::new(40.0, 20.0),
    );
    spawn_body(
        &mut commands,
        "cargo",
        Vec2::new(0.0, -105.0),
        RigidBody::Dynamic,
        Vec2::new(20.0, 20.0),
    );

    info!("Loading joint scene {:?}", scene_path.0);
    load_events.write(LoadJointSceneEvent::FromPath(scene_path.0.clone()));
}

fn spawn_body(commands: &mut Commands, id: &str, position: Vec2, body: RigidBody, size: Vec2) {
    commands.spawn((
        SceneBody(BodyId::from(id)),
        Transform::from_xyz(position.x, position.y, 0.0),
        body,
        Collider::rectangle(size.x, size.y),
        DebugRender::default(),
    ));
}

fn log_created_joints(mut events: EventReader<JointCreatedEvent>) {
    for event in events.read() {
        info!("Joint {} is live as {:?}", event.id, event.entity);
    }
}

fn log_failed_joints(mut events: EventReader<JointFailedEvent>) {
    for event in events.read() {
        error!("Joint {} was dropped: {}", event.id, event.error);
    }
}
