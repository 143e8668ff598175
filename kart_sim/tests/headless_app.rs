// kart_sim/tests/headless_app.rs

use std::{path::PathBuf, time::Duration};

use approx::assert_abs_diff_eq;
use avian3d::prelude::{LinearVelocity, PhysicsPlugins};
use bevy::{
    asset::AssetPlugin, ecs::system::RunSystemOnce, prelude::*, render::mesh::MeshPlugin,
    scene::ScenePlugin, state::app::StatesPlugin, time::TimeUpdateStrategy,
};
use clap::Parser;
use figment::{
    providers::{Format, Toml},
    Figment,
};
use kart_sim::{
    cli::Cli,
    prelude::*,
    simulation::config::load_scenario,
    simulation::plugins::track::TrackLayout,
    KartSimulationPlugin,
};
use nalgebra::{Point3, Unit, Vector3};

/// Two gates with a wall across the road behind the second one.
const WALLED_STRAIGHT: &str = r#"
    [simulation]
    seed = 3

    [agent]
    ground_cast_distance = 2.0

    [[track.checkpoints]]
    position = [0.0, 0.0, 0.5]
    half_extents = [0.5, 4.0, 1.5]

    [[track.checkpoints]]
    position = [5.0, 0.0, 0.5]
    half_extents = [0.5, 4.0, 1.5]

    [[track.walls]]
    position = [12.0, 0.0, 0.5]
    half_extents = [0.25, 6.0, 1.0]

    [[track.ground]]
    position = [5.0, 0.0, -0.25]
    half_extents = [20.0, 6.0, 0.25]
"#;

fn oval_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/scenarios/oval.toml")
}

fn walled_straight() -> ScenarioConfig {
    let config: ScenarioConfig = Figment::new()
        .merge(Toml::string(WALLED_STRAIGHT))
        .extract()
        .unwrap();
    config.validate().unwrap();
    config
}

fn headless_app(config: ScenarioConfig) -> App {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins,
        StatesPlugin,
        TransformPlugin,
        AssetPlugin::default(),
        ScenePlugin,
        MeshPlugin,
    ))
    .add_plugins(PhysicsPlugins::default())
    .insert_resource(Scenario(config));
    app
}

/// Every `update` advances exactly one 50 Hz fixed step.
fn stepped_app(config: ScenarioConfig, cli: Option<Cli>) -> App {
    let mut app = headless_app(config);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(20)))
        .init_resource::<FinishedEpisodes>()
        .add_systems(Update, record_finished_episodes);
    if let Some(cli) = cli {
        app.insert_resource(cli);
    }
    app.add_plugins(KartSimulationPlugin);
    app.finish();
    app.cleanup();
    app
}

#[derive(Resource, Default)]
struct FinishedEpisodes(Vec<EpisodeSummary>);

fn record_finished_episodes(
    mut events: EventReader<EpisodeFinished>,
    mut finished: ResMut<FinishedEpisodes>,
) {
    finished.0.extend(events.read().map(|event| event.summary.clone()));
}

fn progress(app: &mut App) -> usize {
    let world = app.world_mut();
    let mut agents = world.query::<&DrivingAgent>();
    agents.single(world).unwrap().0.current_checkpoint()
}

#[test]
fn bundled_oval_is_a_valid_circuit() {
    let config = load_scenario(&oval_path()).unwrap();
    assert_eq!(config.track.checkpoints.len(), 8);
    assert_eq!(config.agent.mode, AgentMode::Inferencing);
    assert!(config.track.ground.iter().any(|tile| tile.out_of_bounds));

    // The same circuit drives in the headless world without a renderer.
    let mut env = KartEnv::new(&config, Box::new(NullTrainer)).unwrap();
    let first = env.reset();
    assert_eq!(first.to_vector().len(), env.observation_size());
    let result = env.step(DiscreteAction::STRAIGHT);
    assert!(result.reward.is_finite());
}

#[test]
fn scene_building_spawns_one_scored_kart() {
    let config = load_scenario(&oval_path()).unwrap();
    let mut app = headless_app(config);
    app.add_plugins(KartSimulationPlugin);

    for _ in 0..3 {
        app.update();
    }

    assert_eq!(
        *app.world().resource::<State<AppState>>().get(),
        AppState::Running
    );
    assert_eq!(app.world().resource::<TrackLayout>().0.len(), 8);

    let world = app.world_mut();
    let mut karts = world.query::<(&DrivingAgent, &KartModel, &ActiveCommand, Has<Decider>)>();
    let karts: Vec<_> = karts.iter(world).collect();
    assert_eq!(karts.len(), 1);
    let (agent, _, _, has_decider) = karts[0];
    assert!(has_decider);
    assert_eq!(agent.0.current_checkpoint(), 0);
    assert_eq!(agent.0.episode(), 0);

    // Spawn requests are gone once the scene is built.
    let mut requests = world.query::<&SpawnKartRequest>();
    assert_eq!(requests.iter(world).count(), 0);
}

#[test]
fn checkpoint_triggers_are_sensors_on_their_own_layer() {
    let config = load_scenario(&oval_path()).unwrap();
    let mut app = headless_app(config);
    app.add_plugins(KartSimulationPlugin);
    app.update();

    let world = app.world_mut();
    let mut surfaces = world.query::<(&SurfaceTag, Has<avian3d::prelude::Sensor>)>();
    let tagged: Vec<_> = surfaces.iter(world).collect();
    // 8 gates, 8 walls and 9 ground tiles.
    assert_eq!(tagged.len(), 25);
    for (tag, is_sensor) in tagged {
        assert_eq!(tag.0 == SurfaceLayer::Checkpoint, is_sensor);
    }
}

#[test]
fn policy_drives_the_oval_through_the_next_gate() {
    let config = load_scenario(&oval_path()).unwrap();
    let mut app = stepped_app(config, None);

    // 20 m to the next gate is well under 10 s of driving.
    for _ in 0..500 {
        app.update();
        if progress(&mut app) >= 1 {
            break;
        }
    }
    assert!(progress(&mut app) >= 1);

    let world = app.world_mut();
    let mut karts = world.query::<(&ActiveCommand, &LinearVelocity)>();
    let (command, velocity) = karts.single(world).unwrap();
    assert!(command.0.accelerate);
    assert!(velocity.0.length() > 1.0);
}

#[test]
fn driving_at_a_wall_ends_the_episode_on_a_sensor_hit() {
    let mut app = stepped_app(walled_straight(), None);

    for _ in 0..500 {
        app.update();
        if !app.world().resource::<FinishedEpisodes>().0.is_empty() {
            break;
        }
    }

    let finished = &app.world().resource::<FinishedEpisodes>().0;
    assert!(!finished.is_empty());
    assert_eq!(finished[0].reason, EpisodeEndReason::SensorHit);
    assert_eq!(finished[0].episode, 0);
    // Passing gate 1 on the way in counts.
    assert_eq!(finished[0].checkpoints_passed, 1);
    assert_eq!(progress(&mut app), 1);

    let world = app.world_mut();
    let mut agents = world.query::<&DrivingAgent>();
    let agent = &agents.single(world).unwrap().0;
    assert_eq!(agent.latch(), TerminationLatch::Clear);
    assert!(agent.episode() >= 1);
}

fn casts_from_the_kart(
    mut karts: Query<(Entity, &mut Transform, &mut LinearVelocity), With<DrivingAgent>>,
    queries: TrackQueries,
) -> Vec<Option<RayHit>> {
    let Ok((entity, mut transform, mut velocity)) = karts.single_mut() else {
        return Vec::new();
    };
    let body = KartBody {
        entity,
        transform: &mut *transform,
        velocity: &mut *velocity,
        queries: &queries,
    };
    let position = Point3::from(body.pose().translation.vector);
    let forward = Unit::new_normalize(Vector3::x());
    let down = -Vector3::z_axis();

    vec![
        body.cast_ray(&position, &forward, 20.0, LayerMask::DETECTION),
        body.cast_ray(
            &position,
            &forward,
            20.0,
            LayerMask::DETECTION.with(SurfaceLayer::Checkpoint),
        ),
        body.cast_ray(&(position + Vector3::z()), &down, 2.0, LayerMask::GROUND),
    ]
}

#[test]
fn ray_casts_skip_checkpoint_triggers_and_report_surfaces() {
    // Hand-driven with no keys held, so the kart stays on gate 0.
    let cli = Cli::parse_from(["kart_sim", "--manual"]);
    let mut app = stepped_app(walled_straight(), Some(cli));
    for _ in 0..5 {
        app.update();
    }

    let hits = app.world_mut().run_system_once(casts_from_the_kart).unwrap();
    assert_eq!(hits.len(), 3);

    // Gate 1 at x = 5 lies on the way; both casts go through it to the wall.
    for hit in hits[..2].iter().copied() {
        let hit = hit.expect("the wall is in range");
        assert_eq!(hit.layer, SurfaceLayer::Obstacle);
        assert_abs_diff_eq!(hit.distance, 11.75, epsilon = 1e-3);
    }

    let ground = hits[2].expect("the road is under the kart");
    assert_eq!(ground.layer, SurfaceLayer::Track);
    assert_abs_diff_eq!(ground.distance, 1.5, epsilon = 1e-3);
}
