// kart_sim/src/simulation/core/simulation_setup.rs

use rand::{rngs::OsRng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::prelude::*;
use crate::simulation::config::Scenario;
use crate::simulation::core::events::EpisodeFinished;
use crate::simulation::core::prng::SimulationRng;
use crate::simulation::core::transforms::enu_iso_to_bevy_transform;

pub struct SimulationSetupPlugin;

impl Plugin for SimulationSetupPlugin {
    fn build(&self, app: &mut App) {
        // This plugin's job is to read the config and add resources and startup systems.
        let Some(scenario) = app.world().get_resource::<Scenario>() else {
            error!("SimulationSetupPlugin needs the Scenario resource; nothing will be spawned.");
            return;
        };
        let seed = scenario.0.simulation.seed;
        let physics_hz = scenario.0.simulation.physics_hz;
        let duration = scenario.0.simulation.duration_seconds;

        // --- 1. Add the Deterministic PRNG Resource ---
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::seed_from_u64(OsRng.next_u64()),
        };
        app.insert_resource(SimulationRng(rng))
            .add_event::<EpisodeFinished>()
            // One physics tick per fixed step.
            .insert_resource(Time::<Fixed>::from_hz(physics_hz));

        // --- CONFIGURE THE SPAWNING PIPELINE ---
        // This chain of SystemSets guarantees the correct spawning order.
        app.configure_sets(
            OnEnter(AppState::SceneBuilding),
            (
                SceneBuildSet::CreateRequests,
                SceneBuildSet::BuildTrack,
                SceneBuildSet::ProcessVehicle,
                SceneBuildSet::ProcessAgent,
                SceneBuildSet::Physics,
                SceneBuildSet::Cleanup,
            )
                .chain(),
        );

        app.add_systems(
            OnEnter(AppState::SceneBuilding),
            (
                spawn_kart_shells.in_set(SceneBuildSet::CreateRequests),
                cleanup_spawn_requests.in_set(SceneBuildSet::Cleanup),
                transition_to_running
                    .in_set(SceneBuildSet::Cleanup)
                    .after(cleanup_spawn_requests),
            ),
        );

        // Configure the runtime schedule graph. Avian steps in FixedPostUpdate,
        // right after Actuation.
        app.configure_sets(
            FixedUpdate,
            (
                SimulationSet::Triggers,
                SimulationSet::Decision,
                SimulationSet::Actuation,
            )
                .chain()
                .run_if(in_state(AppState::Running)),
        );

        app.add_systems(Update, log_episode_summaries);
        if let Some(seconds) = duration {
            app.insert_resource(RunDuration(seconds)).add_systems(
                Update,
                exit_after_duration.run_if(in_state(AppState::Running)),
            );
        }
    }
}

#[derive(Resource)]
struct RunDuration(f64);

/// Posts one spawn request. The kart starts on the agent's initial checkpoint.
fn spawn_kart_shells(mut commands: Commands, scenario: Res<Scenario>) {
    let config = &scenario.0;
    let Some(start) = config
        .track
        .checkpoints
        .get(config.agent.initial_checkpoint_index)
    else {
        error!("[SPAWN] initial checkpoint is missing; no kart spawned");
        return;
    };

    info!(
        "[SPAWN] Posting spawn request for a {:?} kart at checkpoint {}",
        config.agent.mode, config.agent.initial_checkpoint_index
    );
    let start_pose = start.pose();
    commands.spawn((
        Name::new("Kart"),
        enu_iso_to_bevy_transform(&start_pose),
        SpawnKartRequest {
            start_pose,
            kart: config.kart.clone(),
            agent: config.agent.clone(),
        },
    ));
}

fn cleanup_spawn_requests(mut commands: Commands, query: Query<Entity, With<SpawnKartRequest>>) {
    info!("[CLEANUP] Removing spawn request components.");
    for entity in &query {
        commands.entity(entity).remove::<SpawnKartRequest>();
    }
}

/// This simple system runs once at the end of the `OnEnter(SceneBuilding)` chain.
/// Its only job is to move the app into the main `Running` state.
fn transition_to_running(mut next_state: ResMut<NextState<AppState>>) {
    info!("Scene building complete. Transitioning to Running state.");
    next_state.set(AppState::Running);
}

fn log_episode_summaries(mut events: EventReader<EpisodeFinished>) {
    for EpisodeFinished { kart, summary } in events.read() {
        info!(
            "[EPISODE] {kart}: episode {} ended ({:?}) reward {:.3}, {} decisions, {} checkpoints, {} laps",
            summary.episode,
            summary.reason,
            summary.cumulative_reward,
            summary.decisions,
            summary.checkpoints_passed,
            summary.laps
        );
    }
}

fn exit_after_duration(
    time: Res<Time<Fixed>>,
    duration: Res<RunDuration>,
    mut exit: EventWriter<AppExit>,
) {
    if time.elapsed_secs_f64() >= duration.0 {
        info!("Configured duration of {:.1}s reached. Exiting.", duration.0);
        exit.write(AppExit::Success);
    }
}
